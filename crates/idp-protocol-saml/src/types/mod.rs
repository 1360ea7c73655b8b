//! SAML message types and builders.

mod assertion;
mod constants;
mod logout;
mod request;
mod response;

pub use assertion::*;
pub use constants::*;
pub use logout::*;
pub use request::*;
pub use response::*;

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats an instant as `xs:dateTime` in UTC with millisecond precision.
#[must_use]
pub fn saml_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn instant_format() {
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(saml_instant(instant), "2024-05-01T12:30:00.000Z");
    }
}

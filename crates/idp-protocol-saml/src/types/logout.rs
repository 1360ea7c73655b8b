//! `samlp:LogoutResponse`.
//!
//! Logout responses are sent unsigned.

use chrono::Utc;
use idp_crypto::random::generate_message_id;

use super::constants::{status_codes, SAMLP_NS, SAML_NS};
use super::saml_instant;
use crate::error::SamlResult;
use crate::xml::XmlBuilder;

/// A serialized `samlp:LogoutResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutResponse {
    /// Response `ID`.
    pub id: String,
    /// `Destination`, the SP callback.
    pub destination: Option<String>,
    /// XML document.
    pub xml: String,
}

/// Builds a `Success` logout response.
pub fn build_logout_response(issuer: &str, destination: Option<&str>) -> SamlResult<LogoutResponse> {
    let id = generate_message_id();
    let instant = saml_instant(Utc::now());

    let mut attributes = vec![
        ("xmlns:samlp", SAMLP_NS),
        ("xmlns:saml", SAML_NS),
        ("ID", id.as_str()),
        ("Version", "2.0"),
        ("IssueInstant", instant.as_str()),
    ];
    if let Some(destination) = destination {
        attributes.push(("Destination", destination));
    }

    let mut xml = XmlBuilder::new();
    xml.start("samlp:LogoutResponse", &attributes)?;
    xml.text_element("saml:Issuer", &[], issuer)?;
    xml.start("samlp:Status", &[])?;
    xml.empty("samlp:StatusCode", &[("Value", status_codes::SUCCESS)])?;
    xml.end("samlp:Status")?;
    xml.end("samlp:LogoutResponse")?;

    Ok(LogoutResponse {
        id,
        destination: destination.map(str::to_string),
        xml: xml.finish()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::Element;

    #[test]
    fn success_response_without_signature() {
        let response = build_logout_response("https://idp.sso.tools/acme", Some("https://sp/slo")).unwrap();
        let root = Element::parse(&response.xml).unwrap();

        assert_eq!(root.name, "samlp:LogoutResponse");
        assert_eq!(root.attribute("Destination"), Some("https://sp/slo"));
        assert_eq!(root.child("Issuer").unwrap().text(), "https://idp.sso.tools/acme");
        assert_eq!(
            root.child("Status").unwrap().child("StatusCode").unwrap().attribute("Value"),
            Some(status_codes::SUCCESS)
        );
        assert!(root.locate("Signature").is_none());
    }
}

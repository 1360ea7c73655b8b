//! Cryptographically secure random identifiers.
//!
//! Identifier shapes are fixed by what relying parties already see on the
//! wire:
//!
//! - SAML message ids: `_` followed by 21 random bytes, hex-encoded
//! - Authorization codes: 16 random bytes, hex-encoded
//! - Access tokens: 40 random bytes, hex-encoded
//! - Browser sessions and correlation ids: UUID v4

use rand::Rng;

/// Generates `len` cryptographically secure random bytes.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Generates `len` random bytes and hex-encodes them (`2 * len` characters).
#[must_use]
pub fn random_hex(len: usize) -> String {
    hex::encode(random_bytes(len))
}

/// Generates a random number in `[min, max)`.
///
/// # Panics
///
/// Panics if `min >= max`.
#[must_use]
pub fn random_range(min: u64, max: u64) -> u64 {
    assert!(min < max, "min must be less than max");
    rand::rng().random_range(min..max)
}

/// Generates a SAML message identifier (`_` + 42 hex characters).
#[must_use]
pub fn generate_message_id() -> String {
    format!("_{}", random_hex(21))
}

/// Generates an OAuth2 authorization code.
#[must_use]
pub fn generate_auth_code() -> String {
    random_hex(16)
}

/// Generates an OAuth2 access token.
#[must_use]
pub fn generate_access_token() -> String {
    random_hex(40)
}

/// Generates a browser session identifier.
#[must_use]
pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn random_hex_length() {
        assert_eq!(random_hex(16).len(), 32);
        assert!(random_hex(8).chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn message_id_format() {
        let id = generate_message_id();
        assert!(id.starts_with('_'));
        assert_eq!(id.len(), 43);
    }

    #[test]
    fn code_and_token_lengths() {
        assert_eq!(generate_auth_code().len(), 32);
        assert_eq!(generate_access_token().len(), 80);
    }

    #[test]
    fn auth_codes_are_unique() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_auth_code()).collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn session_id_is_uuid() {
        let id = generate_session_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn random_range_within_bounds() {
        for _ in 0..1000 {
            let val = random_range(10, 100);
            assert!((10..100).contains(&val));
        }
    }

    #[test]
    #[should_panic(expected = "min must be less than max")]
    fn random_range_panics_on_invalid_range() {
        let _ = random_range(100, 10);
    }
}

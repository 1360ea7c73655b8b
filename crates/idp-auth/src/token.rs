//! ID-token signing.
//!
//! Tokens are compact HS256 JWTs keyed by a shared secret. An `iat` claim is
//! added when the caller did not supply one.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;

use crate::error::{AuthError, AuthResult};

/// Claim set carried by a token.
pub type Claims = serde_json::Map<String, Value>;

/// Produces a signed token from a claim set.
pub trait ClaimsSigner: Send + Sync {
    /// Signs the claims.
    ///
    /// ## Errors
    ///
    /// Returns [`AuthError::Signing`] if encoding fails.
    fn sign(&self, claims: &Claims) -> AuthResult<String>;
}

/// HMAC-SHA256 JWT signer.
#[derive(Clone)]
pub struct Hs256ClaimsSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Hs256ClaimsSigner {
    /// Creates a signer from a shared secret.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Verifies a token produced by this signer and returns its claims.
    ///
    /// Expiry and audience are not checked.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] on a bad signature or encoding.
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

impl std::fmt::Debug for Hs256ClaimsSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hs256ClaimsSigner").finish_non_exhaustive()
    }
}

impl ClaimsSigner for Hs256ClaimsSigner {
    fn sign(&self, claims: &Claims) -> AuthResult<String> {
        let mut claims = claims.clone();
        claims
            .entry("iat")
            .or_insert_with(|| Value::from(Utc::now().timestamp()));

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims() -> Claims {
        let Value::Object(map) = json!({"sub": "abc", "email": "a@example.com"}) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn sign_then_verify() {
        let signer = Hs256ClaimsSigner::new(b"secret");
        let token = signer.sign(&claims()).unwrap();

        assert_eq!(token.split('.').count(), 3);
        let decoded = signer.verify(&token).unwrap();
        assert_eq!(decoded["sub"], "abc");
        assert_eq!(decoded["email"], "a@example.com");
        assert!(decoded["iat"].is_i64());
    }

    #[test]
    fn other_secret_rejects() {
        let token = Hs256ClaimsSigner::new(b"one").sign(&claims()).unwrap();
        assert!(matches!(
            Hs256ClaimsSigner::new(b"two").verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn caller_iat_is_kept() {
        let signer = Hs256ClaimsSigner::new(b"secret");
        let mut input = claims();
        input.insert("iat".into(), json!(1_000));
        let decoded = signer.verify(&signer.sign(&input).unwrap()).unwrap();
        assert_eq!(decoded["iat"], 1_000);
    }
}

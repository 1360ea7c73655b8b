//! Authentication error types.

use std::fmt;

/// Authentication operation errors.
#[derive(Debug)]
pub enum AuthError {
    /// Password does not match the stored hash.
    InvalidCredentials,
    /// Stored hash is not a valid PHC string.
    MalformedHash(String),
    /// Token signing failed.
    Signing(String),
    /// Token is invalid or was signed with another key.
    InvalidToken(String),
    /// Internal error.
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::MalformedHash(msg) => write!(f, "malformed password hash: {msg}"),
            Self::Signing(msg) => write!(f, "token signing failed: {msg}"),
            Self::InvalidToken(msg) => write!(f, "invalid token: {msg}"),
            Self::Internal(msg) => write!(f, "internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "invalid credentials");
        assert!(AuthError::Signing("bad key".into()).to_string().contains("bad key"));
    }
}

//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised by key handling and signature operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// PEM block missing or malformed.
    #[error("invalid PEM: {0}")]
    Pem(String),

    /// Private or public key could not be decoded.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// X.509 certificate could not be decoded.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Signature creation failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Signature did not verify.
    #[error("signature verification failed")]
    Verification,
}

//! Error taxonomy.
//!
//! Every failure a protocol flow can produce falls into one of the
//! [`ErrorKind`] classes. Storage and other infrastructure failures are kept
//! apart as [`ErrorKind::Internal`] so they never masquerade as a client
//! mistake.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using the shared error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a failure, independent of the protocol that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown IdP, service provider, user, session or code.
    NotFound,
    /// No session, or an invalid bearer token.
    Unauthorized,
    /// Authenticated subject does not match the request.
    Forbidden,
    /// Missing or invalid field, redirect URI mismatch, wrong grant or response type.
    BadRequest,
    /// Authorization code already redeemed.
    Conflict,
    /// Malformed SAML wire payload.
    ProtocolParseFailure,
    /// Storage, signing or rendering failure.
    Internal,
}

impl ErrorKind {
    /// Returns the HTTP status code for this kind.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::BadRequest | Self::ProtocolParseFailure => 400,
            Self::Conflict => 409,
            Self::Internal => 500,
        }
    }

    /// Returns whether this kind should be logged at error level.
    #[must_use]
    pub const fn is_server_error(self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Implemented by every crate-level error enum so it can be mapped onto the
/// shared taxonomy.
pub trait Classify: std::error::Error {
    /// The taxonomy class of this error.
    fn kind(&self) -> ErrorKind;

    /// Message safe to show to the end user.
    ///
    /// Internal failures never expose their details.
    fn public_message(&self) -> String {
        if self.kind().is_server_error() {
            "An internal error occurred while processing your request.".to_string()
        } else {
            self.to_string()
        }
    }
}

/// A classified, user-presentable error.
///
/// This is what the HTTP layer renders; protocol errors convert into it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    /// Creates a new error of the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates a `BadRequest` error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    /// Creates an `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Classifies any crate error, keeping only its public message.
    #[must_use]
    pub fn from_classified<E: Classify>(err: &E) -> Self {
        Self::new(err.kind(), err.public_message())
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the user-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.kind.http_status()
    }
}

impl Classify for Error {
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    fn public_message(&self) -> String {
        self.message.clone()
    }
}

//! OAuth2 error types.
//!
//! Messages are shown verbatim to the browser (HTML) or returned in the JSON
//! body of API calls.

use idp_core::{Classify, ErrorKind};
use idp_storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OAuth2 flow errors.
#[derive(Debug, Error)]
pub enum OAuth2Error {
    /// `client_id` missing on authorize.
    #[error("No client ID was provided")]
    MissingClientId,

    /// `client_id` missing on token.
    #[error("Client ID is required")]
    ClientIdRequired,

    /// `client_secret` missing.
    #[error("Client secret is required")]
    ClientSecretRequired,

    /// `redirect_uri` missing.
    #[error("Redirect URI is required")]
    RedirectUriRequired,

    /// `code` missing.
    #[error("Authorization code is required")]
    CodeRequired,

    /// `response_type` other than `code`.
    #[error("Response type must equal \"code\"")]
    UnsupportedResponseType,

    /// `grant_type` other than `authorization_code`.
    #[error("Grant type must equal \"authorization_code\"")]
    UnsupportedGrantType,

    /// No IdP under the requested code.
    #[error("There is no IDP service available at this URL.")]
    IdentityProviderNotFound,

    /// No SP registered with the client id.
    #[error("The client ID you provided is invalid")]
    InvalidClientId,

    /// `redirect_uri` differs from the registered one.
    #[error("The Redirect URI specified doesn't match what is registered for this service provider")]
    RedirectUriMismatch,

    /// The SP behind a pending request no longer exists.
    #[error(
        "The Service Provider requesting authentication is not currently registered with the IDP {idp}. \
         If you think you are seeing this message in error, please check your Service Provider configuration."
    )]
    UnknownServiceProvider {
        /// IdP display name.
        idp: String,
    },

    /// No session for the code.
    #[error("No valid OAuth2 session is available with these details.")]
    SessionNotFound,

    /// Code already exchanged.
    #[error("This session code has already been redeemed. Please repeat the authorization process to obtain a new code.")]
    CodeAlreadyRedeemed,

    /// Client id and secret do not match the session's SP.
    #[error("A service provider matching your information could not be found. Please check your client ID and secret")]
    InvalidClientCredentials,

    /// The session's subject is gone.
    #[error("Could not find the user associated with this session")]
    SubjectNotFound,

    /// No Authorization header.
    #[error("This resource requires authorization")]
    MissingAuthorization,

    /// Unknown access token.
    #[error("The access token provided is not valid.")]
    InvalidAccessToken,

    /// ID token signing failed.
    #[error("token signing failed: {0}")]
    TokenSigning(String),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl OAuth2Error {
    /// Classifies this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingClientId
            | Self::ClientIdRequired
            | Self::ClientSecretRequired
            | Self::RedirectUriRequired
            | Self::CodeRequired
            | Self::UnsupportedResponseType
            | Self::UnsupportedGrantType
            | Self::InvalidClientId
            | Self::RedirectUriMismatch
            | Self::InvalidClientCredentials => ErrorKind::BadRequest,
            Self::IdentityProviderNotFound
            | Self::UnknownServiceProvider { .. }
            | Self::SessionNotFound
            | Self::SubjectNotFound => ErrorKind::NotFound,
            Self::CodeAlreadyRedeemed => ErrorKind::Conflict,
            Self::MissingAuthorization | Self::InvalidAccessToken => ErrorKind::Unauthorized,
            Self::TokenSigning(_) | Self::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Returns the OAuth 2.0 error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingClientId
            | Self::ClientIdRequired
            | Self::ClientSecretRequired
            | Self::RedirectUriRequired
            | Self::CodeRequired
            | Self::RedirectUriMismatch
            | Self::IdentityProviderNotFound
            | Self::UnknownServiceProvider { .. } => "invalid_request",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidClientId | Self::InvalidClientCredentials => "invalid_client",
            Self::SessionNotFound | Self::CodeAlreadyRedeemed | Self::SubjectNotFound => "invalid_grant",
            Self::MissingAuthorization | Self::InvalidAccessToken => "invalid_token",
            Self::TokenSigning(_) | Self::Storage(_) => "server_error",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.kind().http_status()
    }

    /// JSON body for API endpoints.
    #[must_use]
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            success: false,
            message: self.public_message(),
        }
    }
}

impl Classify for OAuth2Error {
    fn kind(&self) -> ErrorKind {
        Self::kind(self)
    }
}

/// JSON error body: `{"success": false, "message": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// User-facing message.
    pub message: String,
}

/// Result type for OAuth2 operations.
pub type OAuth2Result<T> = Result<T, OAuth2Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(OAuth2Error::MissingClientId.http_status(), 400);
        assert_eq!(OAuth2Error::SessionNotFound.http_status(), 404);
        assert_eq!(OAuth2Error::CodeAlreadyRedeemed.http_status(), 409);
        assert_eq!(OAuth2Error::InvalidAccessToken.http_status(), 401);
        assert_eq!(OAuth2Error::TokenSigning("x".into()).http_status(), 500);
    }

    #[test]
    fn error_body_shape() {
        let body = serde_json::to_value(OAuth2Error::UnsupportedGrantType.to_error_response()).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Grant type must equal \"authorization_code\"");
    }

    #[test]
    fn internal_detail_hidden() {
        let err = OAuth2Error::TokenSigning("key too short".into());
        assert!(!err.to_error_response().message.contains("key too short"));
        assert_eq!(err.error_code(), "server_error");
    }
}

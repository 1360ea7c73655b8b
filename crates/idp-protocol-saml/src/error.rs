//! SAML error types.
//!
//! Covers wire decoding, XML construction, signing and the login/logout
//! orchestration failures surfaced to the browser.

use idp_core::{Classify, ErrorKind};
use idp_storage::StorageError;
use thiserror::Error;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// Shown to the user for any undecodable request.
pub const PROTOCOL_PARSE_MESSAGE: &str = "The request from your service provider could not be understood.";

/// SAML protocol errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// The inbound message could not be decoded or is not a supported request.
    #[error("could not parse SAML request: {0}")]
    ProtocolParse(String),

    /// XML could not be read.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// XML could not be written.
    #[error("XML writing error: {0}")]
    XmlWrite(String),

    /// Signing requested without a private key.
    #[error("expecting a private key in PEM format")]
    MissingPrivateKey,

    /// Signing requested without a certificate.
    #[error("expecting a public key certificate in PEM format")]
    MissingCertificate,

    /// The element to sign could not be located.
    #[error("unresolvable signature reference: {0}")]
    UnresolvableReference(String),

    /// Key or certificate material is unusable, or the RSA operation failed.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Signature validation failed.
    #[error("signature validation failed: {0}")]
    SignatureInvalid(String),

    /// No IdP is registered under the requested code.
    #[error("There is no IDP service available at this URL.")]
    IdentityProviderNotFound,

    /// A LogoutRequest arrived on the login endpoint.
    #[error("This endpoint cannot be used to handle logout requests. Please use /logout/request instead.")]
    LogoutOnLoginEndpoint,

    /// An AuthnRequest arrived on the logout endpoint.
    #[error("This endpoint cannot be used to handle login requests. Please use /login/request instead.")]
    LoginOnLogoutEndpoint,

    /// The request issuer matches no registered service provider.
    #[error(
        "The Service Provider requesting authentication is not currently registered with the IDP {idp}. \
         If you think you are seeing this message in error, please check your Service Provider configuration. \
         For reference, the issuer of the authentication request is \"{issuer}\""
    )]
    UnknownServiceProvider {
        /// IdP display name.
        idp: String,
        /// Issuer sent by the SP.
        issuer: String,
    },

    /// IdP-initiated login without an entity id.
    #[error("No entityId was provided")]
    MissingEntityId,

    /// IdP-initiated login for an unknown entity id.
    #[error("There is no SP with the given EntityID")]
    ServiceProviderNotFound,

    /// IdP-initiated login without a session.
    #[error("You aren't currently logged-in.")]
    NotLoggedIn,

    /// LogoutRequest without a NameID.
    #[error("No NameID was included in the logout request.")]
    MissingNameId,

    /// LogoutRequest without an active session.
    #[error("The user is not currently logged-in with this IDP.")]
    NoActiveSession,

    /// LogoutRequest NameID does not match the session subject.
    #[error("The currently logged-in user does not match the user making the logout request.")]
    SubjectMismatch,

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SamlError {
    /// Classifies this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ProtocolParse(_) => ErrorKind::ProtocolParseFailure,
            Self::IdentityProviderNotFound
            | Self::UnknownServiceProvider { .. }
            | Self::ServiceProviderNotFound => ErrorKind::NotFound,
            Self::LogoutOnLoginEndpoint
            | Self::LoginOnLogoutEndpoint
            | Self::MissingEntityId
            | Self::MissingNameId => ErrorKind::BadRequest,
            Self::NotLoggedIn | Self::NoActiveSession => ErrorKind::Unauthorized,
            Self::SubjectMismatch => ErrorKind::Forbidden,
            Self::XmlParse(_)
            | Self::XmlWrite(_)
            | Self::MissingPrivateKey
            | Self::MissingCertificate
            | Self::UnresolvableReference(_)
            | Self::Crypto(_)
            | Self::SignatureInvalid(_)
            | Self::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.kind().http_status()
    }
}

impl Classify for SamlError {
    fn kind(&self) -> ErrorKind {
        Self::kind(self)
    }

    fn public_message(&self) -> String {
        match self {
            Self::ProtocolParse(_) => PROTOCOL_PARSE_MESSAGE.to_string(),
            Self::Storage(_) | Self::XmlParse(_) | Self::XmlWrite(_) | Self::Crypto(_) => {
                "An internal error occurred while processing your request.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<quick_xml::Error> for SamlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for SamlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<std::io::Error> for SamlError {
    fn from(err: std::io::Error) -> Self {
        Self::XmlWrite(err.to_string())
    }
}

impl From<idp_crypto::CryptoError> for SamlError {
    fn from(err: idp_crypto::CryptoError) -> Self {
        Self::Crypto(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        assert_eq!(SamlError::ProtocolParse("bad".into()).http_status(), 400);
        assert_eq!(SamlError::MissingNameId.http_status(), 400);
        assert_eq!(SamlError::NoActiveSession.http_status(), 401);
        assert_eq!(SamlError::SubjectMismatch.http_status(), 403);
        assert_eq!(SamlError::ServiceProviderNotFound.http_status(), 404);
        assert_eq!(SamlError::MissingPrivateKey.http_status(), 500);
    }

    #[test]
    fn parse_failure_hides_detail() {
        let err = SamlError::ProtocolParse("invalid deflate stream".into());
        assert_eq!(err.public_message(), PROTOCOL_PARSE_MESSAGE);
    }

    #[test]
    fn unknown_sp_names_issuer() {
        let err = SamlError::UnknownServiceProvider {
            idp: "Acme".into(),
            issuer: "urn:other".into(),
        };
        let message = err.public_message();
        assert!(message.contains("registered with the IDP Acme"));
        assert!(message.contains("\"urn:other\""));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}

//! Protocol transaction records.
//!
//! Every leg of a protocol exchange is recorded once and never mutated. The
//! records serve two purposes: recovering request context on the next leg of
//! a redirect round-trip, and an audit trail of what was exchanged with each
//! relying party.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::oauth::OAuthAuthorization;

/// Type tag of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionKind {
    /// Inbound SAML AuthnRequest.
    LoginRequest,
    /// Outbound SAML Response.
    LoginResponse,
    /// Inbound SAML LogoutRequest.
    LogoutRequest,
    /// OAuth2 authorize call.
    AuthorizeRequest,
    /// Consent given, code issued.
    AuthorizedScope,
    /// OAuth2 token call.
    TokenRequest,
    /// Tokens issued.
    TokenResponse,
}

impl TransactionKind {
    /// Wire name of the tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoginRequest => "loginRequest",
            Self::LoginResponse => "loginResponse",
            Self::LogoutRequest => "logoutRequest",
            Self::AuthorizeRequest => "authorizeRequest",
            Self::AuthorizedScope => "authorizedScope",
            Self::TokenRequest => "tokenRequest",
            Self::TokenResponse => "tokenResponse",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a transaction, one variant per [`TransactionKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransactionData {
    /// Fields parsed from an AuthnRequest.
    #[serde(rename_all = "camelCase")]
    LoginRequest {
        /// Request `ID`.
        id: Option<String>,
        /// `Issuer` text (the SP entity ID).
        issuer: Option<String>,
        /// `AssertionConsumerServiceURL`.
        callback_url: Option<String>,
        /// `Destination`.
        destination: Option<String>,
        /// `ForceAuthn`.
        force_authn: bool,
        /// `NameIDPolicy/@Format`.
        name_identifier_format: Option<String>,
        /// Requested `AuthnContextClassRef`.
        authn_context_class_ref: Option<String>,
    },
    /// The SAML Response sent to the SP.
    #[serde(rename_all = "camelCase")]
    LoginResponse {
        /// Response `ID`.
        response_id: String,
        /// Assertion `ID`.
        assertion_id: String,
        /// `InResponseTo`, absent for IdP-initiated login.
        in_response_to: Option<String>,
        /// `Destination`.
        destination: String,
        /// Response issuer.
        issuer: String,
        /// Status code URI.
        status_code: String,
        /// Status message.
        status_message: Option<String>,
    },
    /// Fields parsed from a LogoutRequest.
    #[serde(rename_all = "camelCase")]
    LogoutRequest {
        /// Request `ID`.
        id: Option<String>,
        /// `Issuer` text.
        issuer: Option<String>,
        /// `Destination`.
        destination: Option<String>,
        /// `NameID` text.
        name_id: Option<String>,
    },
    /// OAuth2 authorize parameters.
    #[serde(rename_all = "camelCase")]
    AuthorizeRequest {
        /// `client_id`.
        client_id: String,
        /// Space-split `scope`.
        scope: Vec<String>,
        /// `redirect_uri`.
        redirect_uri: String,
        /// `response_type`.
        response_type: String,
    },
    /// Consent given and code issued.
    AuthorizedScope(OAuthAuthorization),
    /// OAuth2 token parameters; the client secret is never recorded.
    #[serde(rename_all = "camelCase")]
    TokenRequest {
        /// `client_id`.
        client_id: String,
        /// Always `"REDACTED"`.
        client_secret: String,
        /// `redirect_uri`.
        redirect_uri: String,
        /// `grant_type`.
        grant_type: String,
        /// Redeemed code.
        code: String,
        /// Granted scopes.
        scope: Vec<String>,
    },
    /// Tokens issued.
    #[serde(rename_all = "camelCase")]
    TokenResponse {
        /// Issued ID token, if `openid` was granted.
        id_token: Option<String>,
        /// Issued access token.
        access_token: String,
        /// Granted scopes.
        scope: Vec<String>,
    },
}

impl TransactionData {
    /// Type tag of this payload.
    #[must_use]
    pub const fn kind(&self) -> TransactionKind {
        match self {
            Self::LoginRequest { .. } => TransactionKind::LoginRequest,
            Self::LoginResponse { .. } => TransactionKind::LoginResponse,
            Self::LogoutRequest { .. } => TransactionKind::LogoutRequest,
            Self::AuthorizeRequest { .. } => TransactionKind::AuthorizeRequest,
            Self::AuthorizedScope(_) => TransactionKind::AuthorizedScope,
            Self::TokenRequest { .. } => TransactionKind::TokenRequest,
            Self::TokenResponse { .. } => TransactionKind::TokenResponse,
        }
    }
}

/// One recorded protocol leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolTransaction {
    /// Correlation identifier (SAML request `ID`, OAuth2 request id, code...).
    pub id: String,
    /// Owning IdP.
    pub idp_id: Uuid,
    /// Service provider involved.
    pub sp_id: Uuid,
    /// Recording time.
    pub created_at: DateTime<Utc>,
    /// Typed payload.
    pub data: TransactionData,
}

impl ProtocolTransaction {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, idp_id: Uuid, sp_id: Uuid, data: TransactionData) -> Self {
        Self {
            id: id.into(),
            idp_id,
            sp_id,
            created_at: Utc::now(),
            data,
        }
    }

    /// Type tag of this record.
    #[must_use]
    pub const fn kind(&self) -> TransactionKind {
        self.data.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_serializes_with_type_tag() {
        let data = TransactionData::AuthorizeRequest {
            client_id: "client".to_string(),
            scope: vec!["openid".to_string()],
            redirect_uri: "https://app/cb".to_string(),
            response_type: "code".to_string(),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "authorizeRequest");
        assert_eq!(json["clientId"], "client");
        assert_eq!(data.kind().as_str(), "authorizeRequest");
    }

    #[test]
    fn kind_display_matches_tag() {
        let tx = ProtocolTransaction::new(
            "req-1",
            Uuid::new_v4(),
            Uuid::new_v4(),
            TransactionData::LogoutRequest {
                id: Some("req-1".to_string()),
                issuer: None,
                destination: None,
                name_id: None,
            },
        );
        assert_eq!(tx.kind().to_string(), "logoutRequest");
    }
}

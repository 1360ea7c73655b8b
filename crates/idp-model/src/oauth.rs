//! OAuth2 authorization records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scope grant produced when the subject confirms consent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthAuthorization {
    /// Authorize request this grant answers.
    pub request_id: String,
    /// Requesting client.
    pub client_id: String,
    /// Redirect URI the code is delivered to.
    pub redirect_uri: String,
    /// Granted scopes.
    pub scope: Vec<String>,
    /// Single-use authorization code.
    pub code: String,
}

/// Server-side state behind an authorization code.
///
/// `consumed` flips from `false` to `true` exactly once, when the code is
/// redeemed at the token endpoint; the access token is recorded in the same
/// step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthSession {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning IdP.
    pub idp_id: Uuid,
    /// Client the code was issued to.
    pub sp_id: Uuid,
    /// Authenticated subject.
    pub subject_id: Uuid,
    /// Granted scopes.
    pub scope: Vec<String>,
    /// Authorization code.
    pub code: String,
    /// Whether the code has been redeemed.
    #[serde(default)]
    pub consumed: bool,
    /// Access token issued on redemption.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl OAuthSession {
    /// Creates an unredeemed session for `code`.
    #[must_use]
    pub fn new(idp_id: Uuid, sp_id: Uuid, subject_id: Uuid, scope: Vec<String>, code: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            idp_id,
            sp_id,
            subject_id,
            scope,
            code: code.into(),
            consumed: false,
            access_token: None,
            created_at: Utc::now(),
        }
    }

    /// Whether `scope` was granted.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.iter().any(|s| s == scope)
    }
}

//! Service provider (relying party) registration.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A relying party registered with one IdP.
///
/// SAML flows address it by `entity_id`; OAuth2 flows by `oauth2_client_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceProvider {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning IdP.
    pub idp_id: Uuid,
    /// Display name.
    pub name: String,
    /// SAML entity ID (the `Issuer` of its requests).
    pub entity_id: String,
    /// Assertion consumer service URL.
    pub callback_url: String,
    /// Explicit `Recipient` for subject confirmation, if different from the callback.
    #[serde(default)]
    pub recipient: Option<String>,
    /// Landing URL of the service; logout responses are delivered here.
    #[serde(default)]
    pub service_url: Option<String>,
    /// OAuth2 client identifier.
    #[serde(default)]
    pub oauth2_client_id: Option<String>,
    /// OAuth2 client secret.
    #[serde(default)]
    pub oauth2_client_secret: Option<String>,
    /// Registered OAuth2 redirect URI.
    #[serde(default)]
    pub oauth2_redirect_uri: Option<String>,
}

impl ServiceProvider {
    /// Creates a SAML-only service provider.
    #[must_use]
    pub fn new(
        idp_id: Uuid,
        name: impl Into<String>,
        entity_id: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            idp_id,
            name: name.into(),
            entity_id: entity_id.into(),
            callback_url: callback_url.into(),
            recipient: None,
            service_url: None,
            oauth2_client_id: None,
            oauth2_client_secret: None,
            oauth2_redirect_uri: None,
        }
    }

    /// Sets the OAuth2 client registration.
    #[must_use]
    pub fn with_oauth2(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        self.oauth2_client_id = Some(client_id.into());
        self.oauth2_client_secret = Some(client_secret.into());
        self.oauth2_redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Sets the service URL.
    #[must_use]
    pub fn with_service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = Some(url.into());
        self
    }

    /// Sets an explicit recipient.
    #[must_use]
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    /// `Recipient` for subject confirmation: the explicit recipient, else the callback URL.
    #[must_use]
    pub fn effective_recipient(&self) -> &str {
        self.recipient.as_deref().unwrap_or(&self.callback_url)
    }
}

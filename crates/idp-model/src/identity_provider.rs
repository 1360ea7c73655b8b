//! Identity provider (tenant) configuration.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default base for IdP issuer URIs.
pub const DEFAULT_ISSUER_BASE: &str = "https://idp.sso.tools";

/// A simulated identity provider.
///
/// Addressed by its `code`, which is the first path segment of every
/// protocol endpoint. Codes are stored lower-case and matched
/// case-insensitively.
#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityProvider {
    /// Unique identifier.
    pub id: Uuid,
    /// URL slug, lower-case.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Issuer URI placed in assertions and responses.
    pub issuer: String,
    /// SAML signing key (PEM).
    pub private_key: String,
    /// SAML signing certificate (PEM).
    pub certificate: String,
}

impl IdentityProvider {
    /// Creates a new IdP with the default issuer `https://idp.sso.tools/{code}`.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        private_key: impl Into<String>,
        certificate: impl Into<String>,
    ) -> Self {
        let code = code.into().to_lowercase();
        Self {
            id: Uuid::new_v4(),
            issuer: format!("{DEFAULT_ISSUER_BASE}/{code}"),
            code,
            name: name.into(),
            private_key: private_key.into(),
            certificate: certificate.into(),
        }
    }

    /// Rebases the issuer URI onto `base`.
    #[must_use]
    pub fn with_issuer_base(mut self, base: &str) -> Self {
        self.issuer = format!("{}/{}", base.trim_end_matches('/'), self.code);
        self
    }
}

impl std::fmt::Debug for IdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityProvider")
            .field("id", &self.id)
            .field("code", &self.code)
            .field("name", &self.name)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

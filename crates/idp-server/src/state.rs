//! Application state management.
//!
//! This module defines the shared context that is passed to all request handlers.

use std::sync::Arc;

use idp_auth::{Hs256ClaimsSigner, PasswordHasherService};
use idp_protocol_oauth2::OAuth2Flow;
use idp_protocol_saml::SamlFlow;
use idp_storage_memory::MemoryStore;

use crate::config::ServerConfig;

/// Context shared across all request handlers.
///
/// Built once at startup; there is no other global state.
#[derive(Clone)]
pub struct AppContext {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Backing store.
    pub store: Arc<MemoryStore>,

    /// Password hasher and verifier.
    pub hasher: Arc<PasswordHasherService>,

    /// ID token signer.
    pub signer: Arc<Hs256ClaimsSigner>,
}

impl AppContext {
    /// Creates a new application context.
    pub fn new(config: ServerConfig, store: Arc<MemoryStore>) -> Self {
        let signer = Hs256ClaimsSigner::new(config.jwt_secret.as_bytes());
        Self {
            config: Arc::new(config),
            store,
            hasher: Arc::new(PasswordHasherService::default()),
            signer: Arc::new(signer),
        }
    }

    /// SAML orchestrator borrowing this context.
    pub fn saml(&self) -> SamlFlow<'_, MemoryStore> {
        SamlFlow::new(self.store.as_ref(), self.hasher.as_ref(), self.config.saml_settings())
    }

    /// OAuth2 state machine borrowing this context.
    pub fn oauth2(&self) -> OAuth2Flow<'_, MemoryStore> {
        OAuth2Flow::new(self.store.as_ref(), self.hasher.as_ref(), self.signer.as_ref())
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

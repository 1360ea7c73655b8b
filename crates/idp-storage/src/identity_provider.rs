//! Identity provider storage trait.

use async_trait::async_trait;
use idp_model::IdentityProvider;
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for identity provider (tenant) records.
#[async_trait]
pub trait IdentityProviderStore: Send + Sync {
    /// Registers an identity provider.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the code is taken.
    async fn create_identity_provider(&self, idp: &IdentityProvider) -> StorageResult<()>;

    /// Looks up an identity provider by code, case-insensitively.
    async fn get_identity_provider(&self, code: &str) -> StorageResult<Option<IdentityProvider>>;

    /// Looks up an identity provider by ID.
    async fn get_identity_provider_by_id(&self, id: Uuid) -> StorageResult<Option<IdentityProvider>>;
}

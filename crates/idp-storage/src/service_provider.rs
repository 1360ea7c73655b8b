//! Service provider storage trait.

use async_trait::async_trait;
use idp_model::ServiceProvider;
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for service provider registrations.
///
/// Every lookup is scoped by the owning IdP.
#[async_trait]
pub trait ServiceProviderStore: Send + Sync {
    /// Registers a service provider.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the entity ID or OAuth2 client ID
    /// is already registered with the same IdP.
    async fn create_service_provider(&self, sp: &ServiceProvider) -> StorageResult<()>;

    /// Gets a service provider by ID.
    async fn get_service_provider(&self, idp_id: Uuid, id: Uuid) -> StorageResult<Option<ServiceProvider>>;

    /// Gets a service provider by SAML entity ID.
    async fn get_service_provider_by_entity_id(
        &self,
        idp_id: Uuid,
        entity_id: &str,
    ) -> StorageResult<Option<ServiceProvider>>;

    /// Gets a service provider by OAuth2 client ID.
    async fn get_service_provider_by_client_id(
        &self,
        idp_id: Uuid,
        client_id: &str,
    ) -> StorageResult<Option<ServiceProvider>>;

    /// Gets the service provider matching `id`, `client_id` and `client_secret` together.
    ///
    /// The secret is part of the lookup predicate; a wrong secret yields `None`.
    async fn get_service_provider_by_credentials(
        &self,
        idp_id: Uuid,
        id: Uuid,
        client_id: &str,
        client_secret: &str,
    ) -> StorageResult<Option<ServiceProvider>>;

    /// Lists an IdP's service providers in registration order.
    async fn list_service_providers(&self, idp_id: Uuid) -> StorageResult<Vec<ServiceProvider>>;
}

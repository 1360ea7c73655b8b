//! Custom attribute storage trait.

use async_trait::async_trait;
use idp_model::CustomAttribute;
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for custom attribute definitions.
#[async_trait]
pub trait AttributeStore: Send + Sync {
    /// Creates an attribute definition.
    async fn create_attribute(&self, attribute: &CustomAttribute) -> StorageResult<()>;

    /// Lists an IdP's attribute definitions in creation order.
    async fn list_attributes(&self, idp_id: Uuid) -> StorageResult<Vec<CustomAttribute>>;
}

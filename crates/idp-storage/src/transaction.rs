//! Protocol transaction storage trait.

use async_trait::async_trait;
use idp_model::{ProtocolTransaction, TransactionKind};
use uuid::Uuid;

use crate::error::StorageResult;

/// Append-only log of protocol transactions.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Appends a record. Records are never updated afterwards.
    async fn record_transaction(&self, transaction: &ProtocolTransaction) -> StorageResult<()>;

    /// Finds the most recent record of `kind` with correlation id `id`.
    async fn find_transaction(
        &self,
        idp_id: Uuid,
        kind: TransactionKind,
        id: &str,
    ) -> StorageResult<Option<ProtocolTransaction>>;

    /// Lists an IdP's records, oldest first.
    async fn list_transactions(&self, idp_id: Uuid) -> StorageResult<Vec<ProtocolTransaction>>;
}

//! Subject storage trait.

use async_trait::async_trait;
use idp_model::Subject;
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for subjects and their session-id sets.
#[async_trait]
pub trait SubjectStore: Send + Sync {
    /// Creates a subject.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the email is taken within the IdP.
    async fn create_subject(&self, subject: &Subject) -> StorageResult<()>;

    /// Gets a subject by ID.
    async fn get_subject(&self, idp_id: Uuid, id: Uuid) -> StorageResult<Option<Subject>>;

    /// Gets a subject by email, case-insensitively.
    async fn get_subject_by_email(&self, idp_id: Uuid, email: &str) -> StorageResult<Option<Subject>>;

    /// Gets the subject holding `session_id`.
    async fn get_subject_by_session(&self, idp_id: Uuid, session_id: &str) -> StorageResult<Option<Subject>>;

    /// Atomically adds `session_id` to the subject's session set.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the subject doesn't exist.
    async fn add_session(&self, idp_id: Uuid, subject_id: Uuid, session_id: &str) -> StorageResult<()>;

    /// Atomically clears the subject's whole session set.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the subject doesn't exist.
    async fn clear_sessions(&self, idp_id: Uuid, subject_id: Uuid) -> StorageResult<()>;
}

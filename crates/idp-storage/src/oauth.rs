//! OAuth session storage trait.

use async_trait::async_trait;
use idp_model::OAuthSession;
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for OAuth2 code/token sessions.
#[async_trait]
pub trait OAuthSessionStore: Send + Sync {
    /// Creates a session for a freshly issued code.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the code already exists within the IdP.
    async fn create_oauth_session(&self, session: &OAuthSession) -> StorageResult<()>;

    /// Gets a session by authorization code.
    async fn get_oauth_session_by_code(&self, idp_id: Uuid, code: &str) -> StorageResult<Option<OAuthSession>>;

    /// Gets a redeemed session by its access token.
    async fn get_oauth_session_by_access_token(
        &self,
        idp_id: Uuid,
        access_token: &str,
    ) -> StorageResult<Option<OAuthSession>>;

    /// Atomically marks the session consumed and stores `access_token`.
    ///
    /// Returns `false` without changing anything if the session was already
    /// consumed; exactly one concurrent caller observes `true`.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the session doesn't exist.
    async fn redeem_oauth_session(&self, idp_id: Uuid, id: Uuid, access_token: &str) -> StorageResult<bool>;
}

//! OAuth2 orchestration.
//!
//! [`OAuth2Flow`] borrows the store, the password verifier and the claims
//! signer from the application context for the duration of one request.

mod authorize;
mod token;

pub use authorize::{AuthorizeParams, ConsentPrompt, Interaction, LoginForm, LoginPrompt};
pub use token::{TokenParams, TokenResponse};

use idp_auth::{AuthError, ClaimsSigner, PasswordVerifier};
use idp_model::{IdentityProvider, Subject};
use idp_storage::IdpStore;

use crate::error::{OAuth2Error, OAuth2Result};

/// A non-blank parameter, or `err`.
fn required(value: Option<&String>, err: OAuth2Error) -> OAuth2Result<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty()).ok_or(err)
}

/// OAuth2 orchestrator over an [`IdpStore`].
pub struct OAuth2Flow<'a, S: IdpStore> {
    store: &'a S,
    verifier: &'a dyn PasswordVerifier,
    signer: &'a dyn ClaimsSigner,
}

impl<'a, S: IdpStore> OAuth2Flow<'a, S> {
    /// Creates an orchestrator.
    pub fn new(store: &'a S, verifier: &'a dyn PasswordVerifier, signer: &'a dyn ClaimsSigner) -> Self {
        Self {
            store,
            verifier,
            signer,
        }
    }

    async fn identity_provider(&self, code: &str) -> OAuth2Result<IdentityProvider> {
        self.store
            .get_identity_provider(code)
            .await?
            .ok_or(OAuth2Error::IdentityProviderNotFound)
    }

    async fn session_subject(&self, idp: &IdentityProvider, session_id: Option<&str>) -> OAuth2Result<Option<Subject>> {
        match session_id.filter(|s| !s.is_empty()) {
            Some(session_id) => Ok(self.store.get_subject_by_session(idp.id, session_id).await?),
            None => Ok(None),
        }
    }

    async fn authenticate(&self, idp: &IdentityProvider, email: &str, password: &str) -> OAuth2Result<Option<Subject>> {
        let Some(subject) = self.store.get_subject_by_email(idp.id, email).await? else {
            return Ok(None);
        };
        match self.verifier.verify(password, &subject.password_hash) {
            Ok(()) => Ok(Some(subject)),
            Err(AuthError::InvalidCredentials) => Ok(None),
            Err(e) => {
                tracing::warn!(idp = %idp.code, subject = %subject.id, error = %e, "Password verification failed");
                Ok(None)
            }
        }
    }
}

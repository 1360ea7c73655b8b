//! Login and logout orchestration.
//!
//! [`SamlFlow`] drives every SAML exchange for one request. It borrows the
//! store and the password verifier from the caller's application context
//! and returns an outcome describing what the browser should see next; it
//! never touches HTTP itself.

mod sls;
mod sso;

pub use sls::LogoutRedirect;
pub use sso::{CredentialPrompt, CredentialSubmission, LoginOutcome, SamlPostback};

use idp_auth::{AuthError, PasswordVerifier};
use idp_crypto::random::generate_session_id;
use idp_model::{IdentityProvider, Subject};
use idp_storage::IdpStore;

use crate::error::{SamlError, SamlResult};
use crate::signature::SignatureConfig;

/// Tunables applied to every issued assertion.
#[derive(Debug, Clone, Copy)]
pub struct SamlSettings {
    /// `SessionNotOnOrAfter` offset from now.
    pub session_expiration_minutes: i64,
    /// Assertion validity window.
    pub assertion_lifetime_seconds: i64,
    /// Signature and digest algorithms.
    pub signature: SignatureConfig,
}

impl Default for SamlSettings {
    fn default() -> Self {
        Self {
            session_expiration_minutes: 10_000,
            assertion_lifetime_seconds: 600,
            signature: SignatureConfig::default(),
        }
    }
}

/// SAML orchestrator over an [`IdpStore`].
pub struct SamlFlow<'a, S: IdpStore> {
    store: &'a S,
    verifier: &'a dyn PasswordVerifier,
    settings: SamlSettings,
}

impl<'a, S: IdpStore> SamlFlow<'a, S> {
    /// Creates an orchestrator.
    pub fn new(store: &'a S, verifier: &'a dyn PasswordVerifier, settings: SamlSettings) -> Self {
        Self {
            store,
            verifier,
            settings,
        }
    }

    /// Resolves the IdP served at `code`.
    pub async fn identity_provider(&self, code: &str) -> SamlResult<IdentityProvider> {
        self.store
            .get_identity_provider(code)
            .await?
            .ok_or(SamlError::IdentityProviderNotFound)
    }

    /// Resolves the subject behind a session cookie, if any.
    pub async fn session_subject(&self, idp: &IdentityProvider, session_id: Option<&str>) -> SamlResult<Option<Subject>> {
        match session_id.filter(|s| !s.is_empty()) {
            Some(session_id) => Ok(self.store.get_subject_by_session(idp.id, session_id).await?),
            None => Ok(None),
        }
    }

    /// Checks an email/password pair against the IdP's subjects.
    ///
    /// Returns `None` for any credential failure; the caller re-prompts.
    pub(crate) async fn authenticate(
        &self,
        idp: &IdentityProvider,
        email: &str,
        password: &str,
    ) -> SamlResult<Option<Subject>> {
        let Some(subject) = self.store.get_subject_by_email(idp.id, email).await? else {
            tracing::debug!(idp = %idp.code, "Login for unknown email");
            return Ok(None);
        };

        match self.verifier.verify(password, &subject.password_hash) {
            Ok(()) => Ok(Some(subject)),
            Err(AuthError::InvalidCredentials) => {
                tracing::debug!(idp = %idp.code, subject = %subject.id, "Password mismatch");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(idp = %idp.code, subject = %subject.id, error = %e, "Password verification failed");
                Ok(None)
            }
        }
    }

    /// Logs into the IdP itself, outside any SP exchange.
    ///
    /// Returns the new session id, or `None` on bad credentials.
    pub async fn sign_in(&self, idp: &IdentityProvider, email: &str, password: &str) -> SamlResult<Option<String>> {
        let Some(subject) = self.authenticate(idp, email, password).await? else {
            return Ok(None);
        };
        let session_id = generate_session_id();
        self.store.add_session(idp.id, subject.id, &session_id).await?;
        tracing::info!(idp = %idp.code, subject = %subject.id, "IdP login");
        Ok(Some(session_id))
    }

    /// Ends every session of the subject behind `session_id`.
    ///
    /// Returns whether a subject was logged in.
    pub async fn sign_out(&self, idp: &IdentityProvider, session_id: Option<&str>) -> SamlResult<bool> {
        let Some(subject) = self.session_subject(idp, session_id).await? else {
            return Ok(false);
        };
        self.store.clear_sessions(idp.id, subject.id).await?;
        tracing::info!(idp = %idp.code, subject = %subject.id, "IdP logout");
        Ok(true)
    }
}

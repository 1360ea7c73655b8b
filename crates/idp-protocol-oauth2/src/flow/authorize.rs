//! Browser legs: authorize, login, confirm.

use idp_core::messages;
use idp_crypto::random::{generate_auth_code, generate_session_id};
use idp_model::{
    IdentityProvider, OAuthAuthorization, OAuthSession, ProtocolTransaction, ServiceProvider, Subject,
    TransactionData, TransactionKind,
};
use idp_storage::IdpStore;
use uuid::Uuid;

use super::{required, OAuth2Flow};
use crate::error::{OAuth2Error, OAuth2Result};
use crate::scope;

/// Query of `GET /oauth2/authorize`.
#[derive(Debug, Clone, Default)]
pub struct AuthorizeParams {
    /// `client_id`.
    pub client_id: Option<String>,
    /// Space-separated `scope`.
    pub scope: Option<String>,
    /// `redirect_uri`.
    pub redirect_uri: Option<String>,
    /// `response_type`, must be `code`.
    pub response_type: Option<String>,
}

/// Login form post.
#[derive(Debug, Clone)]
pub struct LoginForm {
    /// Pending authorize request.
    pub request_id: String,
    /// Submitted email.
    pub email: String,
    /// Submitted password.
    pub password: String,
}

/// Next browser step.
#[derive(Debug)]
pub enum Interaction {
    /// Show the login form.
    Login(LoginPrompt),
    /// Show the consent screen.
    Consent(ConsentPrompt),
    /// Redirect to the client with a code.
    Redirect(String),
}

/// Login form state.
#[derive(Debug, Clone)]
pub struct LoginPrompt {
    /// Pending authorize request.
    pub request_id: String,
    /// IdP being logged into.
    pub idp: IdentityProvider,
    /// Requesting client, if the request is known.
    pub sp: Option<ServiceProvider>,
    /// Informational text.
    pub notice: Option<String>,
    /// Failure from a previous attempt.
    pub error: Option<String>,
}

/// Consent screen state.
#[derive(Debug, Clone)]
pub struct ConsentPrompt {
    /// Pending authorize request.
    pub request_id: String,
    /// IdP being logged into.
    pub idp: IdentityProvider,
    /// Requesting client.
    pub sp: ServiceProvider,
    /// Logged-in subject.
    pub subject: Subject,
    /// Requested scopes.
    pub scopes: Vec<String>,
    /// Session minted by this step, to be set as the cookie.
    pub session_id: Option<String>,
}

impl ConsentPrompt {
    /// Consent texts for the requested scopes.
    #[must_use]
    pub fn descriptions(&self) -> Vec<&'static str> {
        scope::describe_all(&self.scopes)
    }
}

struct PendingRequest {
    sp_id: Uuid,
    client_id: String,
    scope: Vec<String>,
    redirect_uri: String,
}

fn with_code(redirect_uri: &str, code: &str) -> String {
    let separator = if redirect_uri.contains('?') { '&' } else { '?' };
    format!("{redirect_uri}{separator}code={code}")
}

impl<S: IdpStore> OAuth2Flow<'_, S> {
    /// Validates an authorize request and records it.
    ///
    /// Nothing is recorded unless the client and redirect URI check out.
    pub async fn authorize(
        &self,
        code: &str,
        params: &AuthorizeParams,
        session_id: Option<&str>,
    ) -> OAuth2Result<Interaction> {
        let client_id = required(params.client_id.as_ref(), OAuth2Error::MissingClientId)?;
        let redirect_uri = required(params.redirect_uri.as_ref(), OAuth2Error::RedirectUriRequired)?;
        if params.response_type.as_deref() != Some("code") {
            return Err(OAuth2Error::UnsupportedResponseType);
        }

        let idp = self.identity_provider(code).await?;
        let sp = self
            .store
            .get_service_provider_by_client_id(idp.id, client_id)
            .await?
            .ok_or(OAuth2Error::InvalidClientId)?;
        if sp.oauth2_redirect_uri.as_deref() != Some(redirect_uri) {
            tracing::warn!(idp = %idp.code, client = %client_id, "Redirect URI mismatch on authorize");
            return Err(OAuth2Error::RedirectUriMismatch);
        }

        let scopes = scope::parse(params.scope.as_deref());
        let request_id = Uuid::new_v4().to_string();
        self.store
            .record_transaction(&ProtocolTransaction::new(
                request_id.clone(),
                idp.id,
                sp.id,
                TransactionData::AuthorizeRequest {
                    client_id: client_id.to_string(),
                    scope: scopes.clone(),
                    redirect_uri: redirect_uri.to_string(),
                    response_type: "code".to_string(),
                },
            ))
            .await?;
        tracing::info!(idp = %idp.code, client = %client_id, request = %request_id, "OAuth2 authorize request");

        match self.session_subject(&idp, session_id).await? {
            Some(subject) => Ok(Interaction::Consent(ConsentPrompt {
                request_id,
                idp,
                sp,
                subject,
                scopes,
                session_id: None,
            })),
            None => {
                let notice = format!("Please login to {} in order to continue to {}", idp.name, sp.name);
                Ok(Interaction::Login(LoginPrompt {
                    request_id,
                    idp,
                    sp: Some(sp),
                    notice: Some(notice),
                    error: None,
                }))
            }
        }
    }

    /// Handles the login form of a pending authorize request.
    pub async fn login(&self, code: &str, form: &LoginForm) -> OAuth2Result<Interaction> {
        let idp = self.identity_provider(code).await?;
        let Some(pending) = self.pending_request(&idp, &form.request_id).await? else {
            return Ok(invalid_request(idp, &form.request_id));
        };
        let sp = self.pending_service_provider(&idp, &pending).await?;

        let Some(subject) = self.authenticate(&idp, &form.email, &form.password).await? else {
            return Ok(Interaction::Login(LoginPrompt {
                request_id: form.request_id.clone(),
                idp,
                sp: Some(sp),
                notice: None,
                error: Some(messages::INCORRECT_CREDENTIALS.to_string()),
            }));
        };

        let session_id = generate_session_id();
        self.store.add_session(idp.id, subject.id, &session_id).await?;
        tracing::info!(idp = %idp.code, subject = %subject.id, "OAuth2 login");

        Ok(Interaction::Consent(ConsentPrompt {
            request_id: form.request_id.clone(),
            idp,
            sp,
            subject,
            scopes: pending.scope,
            session_id: Some(session_id),
        }))
    }

    /// Records consent, issues a code and redirects back to the client.
    pub async fn confirm(&self, code: &str, request_id: &str, session_id: Option<&str>) -> OAuth2Result<Interaction> {
        let idp = self.identity_provider(code).await?;
        let Some(pending) = self.pending_request(&idp, request_id).await? else {
            return Ok(invalid_request(idp, request_id));
        };
        let sp = self.pending_service_provider(&idp, &pending).await?;

        let Some(subject) = self.session_subject(&idp, session_id).await? else {
            return Ok(Interaction::Login(LoginPrompt {
                request_id: request_id.to_string(),
                idp,
                sp: Some(sp),
                notice: None,
                error: Some(messages::LOGIN_REQUIRED.to_string()),
            }));
        };

        let auth_code = generate_auth_code();
        self.store
            .record_transaction(&ProtocolTransaction::new(
                request_id,
                idp.id,
                sp.id,
                TransactionData::AuthorizedScope(OAuthAuthorization {
                    request_id: request_id.to_string(),
                    client_id: pending.client_id.clone(),
                    redirect_uri: pending.redirect_uri.clone(),
                    scope: pending.scope.clone(),
                    code: auth_code.clone(),
                }),
            ))
            .await?;
        self.store
            .create_oauth_session(&OAuthSession::new(idp.id, sp.id, subject.id, pending.scope, auth_code.clone()))
            .await?;
        tracing::info!(idp = %idp.code, client = %pending.client_id, subject = %subject.id, "Authorization code issued");

        Ok(Interaction::Redirect(with_code(&pending.redirect_uri, &auth_code)))
    }

    async fn pending_request(&self, idp: &IdentityProvider, request_id: &str) -> OAuth2Result<Option<PendingRequest>> {
        let transaction = self
            .store
            .find_transaction(idp.id, TransactionKind::AuthorizeRequest, request_id)
            .await?;
        Ok(transaction.and_then(|t| match t.data {
            TransactionData::AuthorizeRequest {
                client_id,
                scope,
                redirect_uri,
                ..
            } => Some(PendingRequest {
                sp_id: t.sp_id,
                client_id,
                scope,
                redirect_uri,
            }),
            _ => None,
        }))
    }

    async fn pending_service_provider(&self, idp: &IdentityProvider, pending: &PendingRequest) -> OAuth2Result<ServiceProvider> {
        self.store
            .get_service_provider(idp.id, pending.sp_id)
            .await?
            .ok_or_else(|| OAuth2Error::UnknownServiceProvider { idp: idp.name.clone() })
    }
}

fn invalid_request(idp: IdentityProvider, request_id: &str) -> Interaction {
    Interaction::Login(LoginPrompt {
        request_id: request_id.to_string(),
        idp,
        sp: None,
        notice: None,
        error: Some(messages::INVALID_LOGIN_REQUEST.to_string()),
    })
}

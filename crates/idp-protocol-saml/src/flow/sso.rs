//! Single sign-on: SP-initiated and IdP-initiated login.

use chrono::{Duration, Utc};
use idp_core::messages;
use idp_crypto::random::{generate_session_id, random_range};
use idp_model::{
    resolve_attributes, IdentityProvider, ProtocolTransaction, ServiceProvider, Subject, TransactionData,
    TransactionKind,
};
use idp_storage::IdpStore;
use uuid::Uuid;

use super::SamlFlow;
use crate::bindings::HttpPostBinding;
use crate::error::{SamlError, SamlResult};
use crate::types::{
    build_assertion, build_response, name_id_formats, parse_request, AssertionOptions, LoginRequest,
    ParseOptions, ParsedRequest, ResponseOptions,
};

const LOGIN_SUCCESSFUL: &str = "Login successful";

/// What the browser sees after a login step.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Ask for credentials.
    Prompt(CredentialPrompt),
    /// Auto-post a response to the SP.
    Postback(SamlPostback),
}

/// Login form for a pending request.
#[derive(Debug, Clone)]
pub struct CredentialPrompt {
    /// Correlation id to send back with the credentials.
    pub request_id: String,
    /// IdP being logged into.
    pub idp: IdentityProvider,
    /// Requesting SP, unknown when the request id itself was invalid.
    pub sp: Option<ServiceProvider>,
    /// Error from a previous attempt.
    pub error: Option<String>,
}

/// Signed response ready for the HTTP-POST binding.
#[derive(Debug, Clone)]
pub struct SamlPostback {
    /// ACS URL the form posts to.
    pub destination: String,
    /// Base64 `SAMLResponse` value.
    pub saml_response: String,
    /// Newly minted session, to be set as the cookie.
    pub session_id: String,
}

/// Credentials posted from the login form.
#[derive(Debug, Clone)]
pub struct CredentialSubmission {
    /// Correlation id from the prompt.
    pub request_id: String,
    /// Submitted email.
    pub email: String,
    /// Submitted password.
    pub password: String,
}

fn login_request_data(request: &LoginRequest) -> TransactionData {
    TransactionData::LoginRequest {
        id: request.id.clone(),
        issuer: request.issuer.clone(),
        callback_url: request.callback_url.clone(),
        destination: request.destination.clone(),
        force_authn: request.force_authn,
        name_identifier_format: request.name_identifier_format.clone(),
        authn_context_class_ref: request.authn_context_class_ref.clone(),
    }
}

fn session_index() -> String {
    format!(
        "sso_tools_session{}_{}",
        random_range(0, 10_000_000),
        random_range(0, 10_000_000)
    )
}

impl<S: IdpStore> SamlFlow<'_, S> {
    /// Handles an inbound `SAMLRequest` on the login endpoint.
    ///
    /// Skips the credential prompt when the session cookie already belongs
    /// to one of this IdP's subjects and the SP did not force
    /// re-authentication.
    pub async fn login_request(
        &self,
        code: &str,
        saml_request: &str,
        session_id: Option<&str>,
    ) -> SamlResult<LoginOutcome> {
        let idp = self.identity_provider(code).await?;

        let request = match parse_request(saml_request, &ParseOptions::with_issuer(&idp.issuer))? {
            ParsedRequest::Login(request) => request,
            ParsedRequest::Logout(_) => return Err(SamlError::LogoutOnLoginEndpoint),
        };

        let issuer = request.issuer.clone().unwrap_or_default();
        let sp = self
            .store
            .get_service_provider_by_entity_id(idp.id, &issuer)
            .await?
            .ok_or_else(|| SamlError::UnknownServiceProvider {
                idp: idp.name.clone(),
                issuer: issuer.clone(),
            })?;

        let request_id = request.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        self.store
            .record_transaction(&ProtocolTransaction::new(
                request_id.clone(),
                idp.id,
                sp.id,
                login_request_data(&request),
            ))
            .await?;
        tracing::info!(idp = %idp.code, sp = %sp.entity_id, request = %request_id, "SAML login request");

        if !request.force_authn {
            if let Some(subject) = self.session_subject(&idp, session_id).await? {
                tracing::debug!(idp = %idp.code, subject = %subject.id, "Existing session, skipping prompt");
                let postback = self.emit(&idp, &sp, &subject, request.id.clone()).await?;
                return Ok(LoginOutcome::Postback(postback));
            }
        }

        Ok(LoginOutcome::Prompt(CredentialPrompt {
            request_id,
            idp,
            sp: Some(sp),
            error: None,
        }))
    }

    /// Handles the login form for a pending SAML request.
    pub async fn submit_credentials(&self, code: &str, submission: &CredentialSubmission) -> SamlResult<LoginOutcome> {
        let idp = self.identity_provider(code).await?;

        let transaction = self
            .store
            .find_transaction(idp.id, TransactionKind::LoginRequest, &submission.request_id)
            .await?;
        let Some(ProtocolTransaction {
            data: TransactionData::LoginRequest { id, issuer, .. },
            ..
        }) = transaction
        else {
            return Ok(LoginOutcome::Prompt(CredentialPrompt {
                request_id: submission.request_id.clone(),
                idp,
                sp: None,
                error: Some(messages::INVALID_LOGIN_REQUEST.to_string()),
            }));
        };

        let issuer = issuer.unwrap_or_default();
        let sp = self
            .store
            .get_service_provider_by_entity_id(idp.id, &issuer)
            .await?
            .ok_or_else(|| SamlError::UnknownServiceProvider {
                idp: idp.name.clone(),
                issuer,
            })?;

        let Some(subject) = self.authenticate(&idp, &submission.email, &submission.password).await? else {
            return Ok(LoginOutcome::Prompt(CredentialPrompt {
                request_id: submission.request_id.clone(),
                idp,
                sp: Some(sp),
                error: Some(messages::INCORRECT_CREDENTIALS.to_string()),
            }));
        };

        let postback = self.emit(&idp, &sp, &subject, id).await?;
        Ok(LoginOutcome::Postback(postback))
    }

    /// IdP-initiated login to the SP registered as `entity_id`.
    pub async fn initiate_login(
        &self,
        code: &str,
        entity_id: Option<&str>,
        session_id: Option<&str>,
    ) -> SamlResult<SamlPostback> {
        let idp = self.identity_provider(code).await?;
        let entity_id = entity_id.filter(|e| !e.is_empty()).ok_or(SamlError::MissingEntityId)?;
        let subject = self
            .session_subject(&idp, session_id)
            .await?
            .ok_or(SamlError::NotLoggedIn)?;
        let sp = self
            .store
            .get_service_provider_by_entity_id(idp.id, entity_id)
            .await?
            .ok_or(SamlError::ServiceProviderNotFound)?;

        tracing::info!(idp = %idp.code, sp = %sp.entity_id, "IdP-initiated login");
        self.emit(&idp, &sp, &subject, None).await
    }

    /// Signs a response for `subject`, then mints the session and records it.
    ///
    /// Nothing is persisted unless signing succeeds.
    async fn emit(
        &self,
        idp: &IdentityProvider,
        sp: &ServiceProvider,
        subject: &Subject,
        in_response_to: Option<String>,
    ) -> SamlResult<SamlPostback> {
        let definitions = self.store.list_attributes(idp.id).await?;
        let mut attributes = vec![
            ("firstName".to_string(), vec![subject.first_name.clone()]),
            ("lastName".to_string(), vec![subject.last_name.clone()]),
            ("email".to_string(), vec![subject.email.clone()]),
        ];
        attributes.extend(
            resolve_attributes(&definitions, subject)
                .into_iter()
                .map(|(key, value)| (key, vec![value])),
        );

        let now = Utc::now();
        let assertion = build_assertion(&AssertionOptions {
            issuer: idp.issuer.clone(),
            lifetime_in_seconds: Some(self.settings.assertion_lifetime_seconds),
            audiences: vec![sp.entity_id.clone()],
            recipient: Some(sp.effective_recipient().to_string()),
            in_response_to: in_response_to.clone(),
            attributes,
            session_expiration: Some(now + Duration::minutes(self.settings.session_expiration_minutes)),
            session_index: Some(session_index()),
            name_identifier: subject.email.clone(),
            name_identifier_format: Some(name_id_formats::EMAIL.to_string()),
            key: Some(idp.private_key.clone()),
            cert: Some(idp.certificate.clone()),
            signature: self.settings.signature,
            ..AssertionOptions::default()
        })?;

        let response = build_response(&ResponseOptions {
            instant: now,
            in_response_to: in_response_to.clone(),
            destination: Some(sp.callback_url.clone()),
            status_message: Some(LOGIN_SUCCESSFUL.to_string()),
            ..ResponseOptions::success(idp.issuer.clone(), assertion.xml)
        })?;

        let session_id = generate_session_id();
        self.store.add_session(idp.id, subject.id, &session_id).await?;

        self.store
            .record_transaction(&ProtocolTransaction::new(
                response.id.clone(),
                idp.id,
                sp.id,
                TransactionData::LoginResponse {
                    response_id: response.id.clone(),
                    assertion_id: assertion.id,
                    in_response_to,
                    destination: sp.callback_url.clone(),
                    issuer: idp.issuer.clone(),
                    status_code: crate::types::status_codes::SUCCESS.to_string(),
                    status_message: Some(LOGIN_SUCCESSFUL.to_string()),
                },
            ))
            .await?;
        tracing::info!(idp = %idp.code, sp = %sp.entity_id, subject = %subject.id, "SAML response issued");

        Ok(SamlPostback {
            destination: sp.callback_url.clone(),
            saml_response: HttpPostBinding::encode(&response.xml),
            session_id,
        })
    }
}

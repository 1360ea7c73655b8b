//! Single logout: SP-initiated.

use idp_model::{ProtocolTransaction, TransactionData};
use idp_storage::IdpStore;
use uuid::Uuid;

use super::SamlFlow;
use crate::bindings::{HttpRedirectBinding, SamlMessageType};
use crate::error::{SamlError, SamlResult};
use crate::types::{decode_request, parse_request_xml, LogoutRequest, ParseOptions, ParsedRequest};

/// Where to send the browser once the sessions are cleared.
///
/// The session cookie must be expired alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutRedirect {
    /// Redirect target.
    pub location: String,
}

impl<S: IdpStore> SamlFlow<'_, S> {
    /// Handles an inbound `SAMLRequest` on the logout endpoint.
    ///
    /// The returned LogoutResponse is unsigned.
    pub async fn logout_request(
        &self,
        code: &str,
        saml_request: &str,
        session_id: Option<&str>,
    ) -> SamlResult<LogoutRedirect> {
        let idp = self.identity_provider(code).await?;

        let xml = decode_request(saml_request)?;
        let request = logout_only(parse_request_xml(&xml, &ParseOptions::with_issuer(&idp.issuer))?)?;

        let issuer = request.issuer.clone().unwrap_or_default();
        let sp = self
            .store
            .get_service_provider_by_entity_id(idp.id, &issuer)
            .await?
            .ok_or_else(|| SamlError::UnknownServiceProvider {
                idp: idp.name.clone(),
                issuer: issuer.clone(),
            })?;
        // Parsed again now that the SP is known so the response is addressed to its callback.
        let request = logout_only(parse_request_xml(
            &xml,
            &ParseOptions {
                issuer: idp.issuer.clone(),
                callback_url: Some(sp.callback_url.clone()),
            },
        )?)?;

        let request_id = request.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        self.store
            .record_transaction(&ProtocolTransaction::new(
                request_id.clone(),
                idp.id,
                sp.id,
                TransactionData::LogoutRequest {
                    id: request.id.clone(),
                    issuer: request.issuer.clone(),
                    destination: request.destination.clone(),
                    name_id: request.name_id.clone(),
                },
            ))
            .await?;
        tracing::info!(idp = %idp.code, sp = %sp.entity_id, request = %request_id, "SAML logout request");

        let name_id = request
            .name_id
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or(SamlError::MissingNameId)?;
        let subject = self
            .session_subject(&idp, session_id)
            .await?
            .ok_or(SamlError::NoActiveSession)?;
        if !subject.email_matches(name_id) {
            tracing::warn!(idp = %idp.code, subject = %subject.id, "Logout NameID does not match session");
            return Err(SamlError::SubjectMismatch);
        }

        self.store.clear_sessions(idp.id, subject.id).await?;
        tracing::info!(idp = %idp.code, subject = %subject.id, "Sessions cleared by SP logout");

        let location = match sp.service_url.as_deref().filter(|u| !u.is_empty()) {
            Some(service_url) => HttpRedirectBinding::redirect_url(service_url, SamlMessageType::Response, &request.response.xml),
            None => format!("/{}", idp.code),
        };
        Ok(LogoutRedirect { location })
    }
}

fn logout_only(parsed: ParsedRequest) -> SamlResult<LogoutRequest> {
    match parsed {
        ParsedRequest::Logout(request) => Ok(request),
        ParsedRequest::Login(_) => Err(SamlError::LoginOnLogoutEndpoint),
    }
}

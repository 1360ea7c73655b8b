//! API legs: token exchange and userinfo.

use idp_crypto::random::generate_access_token;
use idp_model::{ProtocolTransaction, TransactionData};
use idp_storage::IdpStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{required, OAuth2Flow};
use crate::claims;
use crate::error::{OAuth2Error, OAuth2Result};

/// Form of `POST /oauth2/token`.
#[derive(Debug, Clone, Default)]
pub struct TokenParams {
    /// `client_id`.
    pub client_id: Option<String>,
    /// `client_secret`.
    pub client_secret: Option<String>,
    /// `redirect_uri`.
    pub redirect_uri: Option<String>,
    /// `code`.
    pub code: Option<String>,
    /// `grant_type`, must be `authorization_code`.
    pub grant_type: Option<String>,
}

/// Successful token exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed claims, present when `openid` was granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Bearer token for the userinfo endpoint.
    pub access_token: String,
}

impl<S: IdpStore> OAuth2Flow<'_, S> {
    /// Exchanges an authorization code for tokens.
    ///
    /// The code is consumed by a single compare-and-set; of two concurrent
    /// exchanges exactly one succeeds.
    pub async fn token(&self, code: &str, params: &TokenParams) -> OAuth2Result<TokenResponse> {
        let client_id = required(params.client_id.as_ref(), OAuth2Error::ClientIdRequired)?;
        let client_secret = required(params.client_secret.as_ref(), OAuth2Error::ClientSecretRequired)?;
        let redirect_uri = required(params.redirect_uri.as_ref(), OAuth2Error::RedirectUriRequired)?;
        let auth_code = required(params.code.as_ref(), OAuth2Error::CodeRequired)?;
        if params.grant_type.as_deref() != Some("authorization_code") {
            return Err(OAuth2Error::UnsupportedGrantType);
        }

        let idp = self.identity_provider(code).await?;
        let session = self
            .store
            .get_oauth_session_by_code(idp.id, auth_code)
            .await?
            .ok_or(OAuth2Error::SessionNotFound)?;
        if session.consumed {
            return Err(OAuth2Error::CodeAlreadyRedeemed);
        }

        let sp = self
            .store
            .get_service_provider_by_credentials(idp.id, session.sp_id, client_id, client_secret)
            .await?
            .ok_or(OAuth2Error::InvalidClientCredentials)?;
        if sp.oauth2_redirect_uri.as_deref() != Some(redirect_uri) {
            return Err(OAuth2Error::RedirectUriMismatch);
        }

        let subject = self
            .store
            .get_subject(idp.id, session.subject_id)
            .await?
            .ok_or(OAuth2Error::SubjectNotFound)?;

        let definitions = self.store.list_attributes(idp.id).await?;
        let id_token = claims::id_token_claims(&subject, &session.scope, &definitions)
            .map(|set| self.signer.sign(&set))
            .transpose()
            .map_err(|e| OAuth2Error::TokenSigning(e.to_string()))?;
        let access_token = generate_access_token();

        if !self.store.redeem_oauth_session(idp.id, session.id, &access_token).await? {
            tracing::warn!(idp = %idp.code, client = %client_id, "Concurrent redemption lost");
            return Err(OAuth2Error::CodeAlreadyRedeemed);
        }

        self.store
            .record_transaction(&ProtocolTransaction::new(
                auth_code,
                idp.id,
                sp.id,
                TransactionData::TokenRequest {
                    client_id: client_id.to_string(),
                    client_secret: "REDACTED".to_string(),
                    redirect_uri: redirect_uri.to_string(),
                    grant_type: "authorization_code".to_string(),
                    code: auth_code.to_string(),
                    scope: session.scope.clone(),
                },
            ))
            .await?;
        self.store
            .record_transaction(&ProtocolTransaction::new(
                auth_code,
                idp.id,
                sp.id,
                TransactionData::TokenResponse {
                    id_token: id_token.clone(),
                    access_token: access_token.clone(),
                    scope: session.scope.clone(),
                },
            ))
            .await?;
        tracing::info!(idp = %idp.code, client = %client_id, subject = %subject.id, "Tokens issued");

        Ok(TokenResponse { id_token, access_token })
    }

    /// Returns the profile behind an access token.
    ///
    /// `authorization` is the raw header; the `Bearer` scheme is optional
    /// and matched case-insensitively.
    pub async fn userinfo(&self, code: &str, authorization: Option<&str>) -> OAuth2Result<Map<String, Value>> {
        let header = authorization
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(OAuth2Error::MissingAuthorization)?;
        let token = bearer_token(header);

        let idp = self.identity_provider(code).await?;
        let session = self
            .store
            .get_oauth_session_by_access_token(idp.id, token)
            .await?
            .ok_or(OAuth2Error::InvalidAccessToken)?;
        let subject = self
            .store
            .get_subject(idp.id, session.subject_id)
            .await?
            .ok_or(OAuth2Error::SubjectNotFound)?;

        let definitions = self.store.list_attributes(idp.id).await?;
        Ok(claims::userinfo(&subject, &session.scope, &definitions))
    }
}

fn bearer_token(header: &str) -> &str {
    match header.split_once(char::is_whitespace) {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => header,
    }
}

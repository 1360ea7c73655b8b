//! SAML 2.0 endpoints.
//!
//! `SAMLRequest` is read straight from the raw query string: the binding
//! decoder does its own URL decoding, and form-style decoding would turn a
//! literal `+` in the base64 payload into a space.

use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use idp_protocol_saml::{CredentialPrompt, CredentialSubmission, LoginOutcome, SamlPostback};

use crate::cookies;
use crate::error::PageResult;
use crate::state::AppContext;
use crate::ui::{render, LoginTemplate, SamlPostTemplate};

const POST_PATH: &str = "saml/login";

/// Query of the IdP-initiated login.
#[derive(Debug, Deserialize)]
pub struct InitiateQuery {
    /// Target SP.
    #[serde(rename = "entityId")]
    pub entity_id: Option<String>,
}

/// Form data for SAML login submission.
#[derive(Debug, Deserialize)]
pub struct SamlLoginForm {
    /// Email.
    pub email: String,
    /// Password.
    pub password: String,
    /// Pending AuthnRequest id.
    #[serde(rename = "requestId")]
    pub request_id: String,
}

/// Returns the still URL-encoded value of `name` in a raw query string.
fn raw_param<'q>(query: Option<&'q str>, name: &str) -> Option<&'q str> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn prompt_page(prompt: CredentialPrompt) -> Response {
    LoginTemplate::new(&prompt.idp, prompt.sp.as_ref(), POST_PATH, &prompt.request_id)
        .with_error(prompt.error)
        .into_page()
}

fn postback_page(postback: SamlPostback) -> Response {
    let template = SamlPostTemplate {
        destination: postback.destination,
        saml_response: postback.saml_response,
    };
    (
        [(header::SET_COOKIE, cookies::set_session_cookie(&postback.session_id))],
        render(&template, StatusCode::OK),
    )
        .into_response()
}

fn outcome_page(outcome: LoginOutcome) -> Response {
    match outcome {
        LoginOutcome::Prompt(prompt) => prompt_page(prompt),
        LoginOutcome::Postback(postback) => postback_page(postback),
    }
}

/// `GET /{code}/saml/login/request`
pub async fn login_request(
    State(ctx): State<AppContext>,
    Path(code): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> PageResult<Response> {
    let saml_request = raw_param(query.as_deref(), "SAMLRequest").unwrap_or_default();
    let session_id = cookies::session_id(&headers);

    let outcome = ctx
        .saml()
        .login_request(&code, saml_request, session_id.as_deref())
        .await?;
    Ok(outcome_page(outcome))
}

/// `GET /{code}/saml/logout/request`
pub async fn logout_request(
    State(ctx): State<AppContext>,
    Path(code): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> PageResult<Response> {
    let saml_request = raw_param(query.as_deref(), "SAMLRequest").unwrap_or_default();
    let session_id = cookies::session_id(&headers);

    let redirect = ctx
        .saml()
        .logout_request(&code, saml_request, session_id.as_deref())
        .await?;
    Ok((
        [(header::SET_COOKIE, cookies::CLEAR_SESSION_COOKIE)],
        Redirect::to(&redirect.location),
    )
        .into_response())
}

/// `GET /{code}/saml/login/initiate?entityId=`
pub async fn initiate_login(
    State(ctx): State<AppContext>,
    Path(code): Path<String>,
    Query(query): Query<InitiateQuery>,
    headers: HeaderMap,
) -> PageResult<Response> {
    let session_id = cookies::session_id(&headers);
    let postback = ctx
        .saml()
        .initiate_login(&code, query.entity_id.as_deref(), session_id.as_deref())
        .await?;
    Ok(postback_page(postback))
}

/// `POST /{code}/saml/login`
pub async fn submit_credentials(
    State(ctx): State<AppContext>,
    Path(code): Path<String>,
    Form(form): Form<SamlLoginForm>,
) -> PageResult<Response> {
    let submission = CredentialSubmission {
        request_id: form.request_id,
        email: form.email,
        password: form.password,
    };
    let outcome = ctx.saml().submit_credentials(&code, &submission).await?;
    Ok(outcome_page(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_param_keeps_encoding() {
        let query = Some("RelayState=x&SAMLRequest=ab%2Bc+d%3D&Signature=s");
        assert_eq!(raw_param(query, "SAMLRequest"), Some("ab%2Bc+d%3D"));
        assert_eq!(raw_param(query, "Missing"), None);
        assert_eq!(raw_param(None, "SAMLRequest"), None);
    }
}

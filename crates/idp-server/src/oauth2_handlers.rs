//! OAuth2 endpoints.
//!
//! The browser legs (`authorize`, `login`, `confirm`) render HTML; `token`
//! and the profile API answer in JSON.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use idp_protocol_oauth2::{AuthorizeParams, ConsentPrompt, Interaction, LoginForm, LoginPrompt, TokenParams, TokenResponse};

use crate::cookies;
use crate::error::{ApiResult, PageResult};
use crate::state::AppContext;
use crate::ui::{render, ConsentTemplate, LoginTemplate};

const POST_PATH: &str = "oauth2/login";

/// Query of `GET /{code}/oauth2/authorize`.
#[derive(Debug, Default, Deserialize)]
pub struct AuthorizeQuery {
    /// Client identifier.
    pub client_id: Option<String>,
    /// Space-separated scopes.
    pub scope: Option<String>,
    /// Redirect URI.
    pub redirect_uri: Option<String>,
    /// Response type.
    pub response_type: Option<String>,
}

impl From<AuthorizeQuery> for AuthorizeParams {
    fn from(query: AuthorizeQuery) -> Self {
        Self {
            client_id: query.client_id,
            scope: query.scope,
            redirect_uri: query.redirect_uri,
            response_type: query.response_type,
        }
    }
}

/// Form data for OAuth2 login submission.
#[derive(Debug, Deserialize)]
pub struct OAuth2LoginForm {
    /// Email.
    pub email: String,
    /// Password.
    pub password: String,
    /// Pending authorize request.
    #[serde(rename = "requestId")]
    pub request_id: String,
}

/// Form data for the consent confirmation.
#[derive(Debug, Deserialize)]
pub struct ConfirmForm {
    /// Pending authorize request.
    #[serde(rename = "requestId")]
    pub request_id: String,
}

/// Form of `POST /{code}/oauth2/token`.
#[derive(Debug, Default, Deserialize)]
pub struct TokenForm {
    /// Client identifier.
    pub client_id: Option<String>,
    /// Client secret.
    pub client_secret: Option<String>,
    /// Redirect URI used at authorization.
    pub redirect_uri: Option<String>,
    /// Authorization code.
    pub code: Option<String>,
    /// Grant type.
    pub grant_type: Option<String>,
}

impl From<TokenForm> for TokenParams {
    fn from(form: TokenForm) -> Self {
        Self {
            client_id: form.client_id,
            client_secret: form.client_secret,
            redirect_uri: form.redirect_uri,
            code: form.code,
            grant_type: form.grant_type,
        }
    }
}

fn login_page(prompt: LoginPrompt) -> Response {
    LoginTemplate::new(&prompt.idp, prompt.sp.as_ref(), POST_PATH, &prompt.request_id)
        .with_notice(prompt.notice)
        .with_error(prompt.error)
        .into_page()
}

fn consent_page(prompt: ConsentPrompt) -> Response {
    let template = ConsentTemplate {
        descriptions: prompt.descriptions(),
        sp_name: prompt.sp.name,
        idp_name: prompt.idp.name,
        user_name: prompt.subject.display_name(),
        action_url: format!("/{}/oauth2/confirm", prompt.idp.code),
        request_id: prompt.request_id,
    };
    let page = render(&template, StatusCode::OK);
    match prompt.session_id {
        Some(session_id) => ([(header::SET_COOKIE, cookies::set_session_cookie(&session_id))], page).into_response(),
        None => page,
    }
}

fn interaction_page(interaction: Interaction) -> Response {
    match interaction {
        Interaction::Login(prompt) => login_page(prompt),
        Interaction::Consent(prompt) => consent_page(prompt),
        Interaction::Redirect(location) => Redirect::to(&location).into_response(),
    }
}

/// `GET /{code}/oauth2/authorize`
pub async fn authorize(
    State(ctx): State<AppContext>,
    Path(code): Path<String>,
    Query(query): Query<AuthorizeQuery>,
    headers: HeaderMap,
) -> PageResult<Response> {
    let session_id = cookies::session_id(&headers);
    let interaction = ctx
        .oauth2()
        .authorize(&code, &query.into(), session_id.as_deref())
        .await?;
    Ok(interaction_page(interaction))
}

/// `POST /{code}/oauth2/login`
pub async fn login(
    State(ctx): State<AppContext>,
    Path(code): Path<String>,
    Form(form): Form<OAuth2LoginForm>,
) -> PageResult<Response> {
    let form = LoginForm {
        request_id: form.request_id,
        email: form.email,
        password: form.password,
    };
    let interaction = ctx.oauth2().login(&code, &form).await?;
    Ok(interaction_page(interaction))
}

/// `POST /{code}/oauth2/confirm`
pub async fn confirm(
    State(ctx): State<AppContext>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Form(form): Form<ConfirmForm>,
) -> PageResult<Response> {
    let session_id = cookies::session_id(&headers);
    let interaction = ctx
        .oauth2()
        .confirm(&code, &form.request_id, session_id.as_deref())
        .await?;
    Ok(interaction_page(interaction))
}

/// `POST /{code}/oauth2/token`
pub async fn token(
    State(ctx): State<AppContext>,
    Path(code): Path<String>,
    Form(form): Form<TokenForm>,
) -> ApiResult<Json<TokenResponse>> {
    let response = ctx.oauth2().token(&code, &form.into()).await?;
    Ok(Json(response))
}

/// `GET /{code}/api/users/me`
pub async fn userinfo(
    State(ctx): State<AppContext>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Map<String, Value>>> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let profile = ctx.oauth2().userinfo(&code, authorization).await?;
    Ok(Json(profile))
}

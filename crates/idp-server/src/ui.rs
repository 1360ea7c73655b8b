//! HTML pages.
//!
//! Askama templates for every browser-facing page plus the IdP landing
//! page handlers (`/{code}`, `/{code}/login`, `/{code}/logout`).

use askama::Template;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use idp_core::messages;
use idp_model::{IdentityProvider, ServiceProvider, Subject};
use idp_storage::ServiceProviderStore;

use crate::cookies;
use crate::error::PageResult;
use crate::state::AppContext;

/// Credential prompt.
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    /// Page heading.
    pub heading: String,
    /// IdP display name.
    pub idp_name: String,
    /// Form action URL.
    pub action_url: String,
    /// Pending request, echoed back on submit.
    pub request_id: Option<String>,
    /// Informational message.
    pub notice: Option<String>,
    /// Error message to display.
    pub error: Option<String>,
}

impl LoginTemplate {
    /// Prompt for a protocol leg posting to `/{code}/{post_path}`.
    ///
    /// Without a known SP the form falls back to the IdP-local login.
    pub fn new(idp: &IdentityProvider, sp: Option<&ServiceProvider>, post_path: &str, request_id: &str) -> Self {
        let (heading, action_url) = match sp {
            Some(sp) => (format!("Login to access {}", sp.name), format!("/{}/{post_path}", idp.code)),
            None => ("Login".to_string(), format!("/{}/login", idp.code)),
        };
        Self {
            heading,
            idp_name: idp.name.clone(),
            action_url,
            request_id: Some(request_id.to_string()),
            notice: None,
            error: None,
        }
    }

    /// Sets the informational message.
    #[must_use]
    pub fn with_notice(mut self, notice: Option<String>) -> Self {
        self.notice = notice;
        self
    }

    /// Sets the error message.
    #[must_use]
    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }

    /// Renders with 401 when an error is shown, 200 otherwise.
    pub fn into_page(self) -> Response {
        let status = if self.error.is_some() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::OK
        };
        render(&self, status)
    }
}

/// OAuth2 consent screen.
#[derive(Template)]
#[template(path = "consent.html")]
pub struct ConsentTemplate {
    /// Requesting client name.
    pub sp_name: String,
    /// IdP display name.
    pub idp_name: String,
    /// Logged-in user's full name.
    pub user_name: String,
    /// One line per requested scope.
    pub descriptions: Vec<&'static str>,
    /// Form action URL.
    pub action_url: String,
    /// Pending request.
    pub request_id: String,
}

/// Error page.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    /// Fixed heading.
    pub heading: &'static str,
    /// What went wrong.
    pub message: String,
}

/// Auto-submitting HTTP-POST binding form.
#[derive(Template)]
#[template(path = "saml_post.html")]
pub struct SamlPostTemplate {
    /// ACS URL.
    pub destination: String,
    /// Base64 `SAMLResponse`.
    pub saml_response: String,
}

/// Link row on the landing page.
pub struct ServiceLink {
    /// SP display name.
    pub name: String,
    /// "Visit Service" target.
    pub service_url: Option<String>,
    /// IdP-initiated login URL.
    pub initiate_url: String,
}

/// IdP landing page.
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// IdP code.
    pub idp_code: String,
    /// IdP display name.
    pub idp_name: String,
    /// Logged-in user's full name.
    pub user_name: Option<String>,
    /// Registered SPs, listed only when logged in.
    pub services: Vec<ServiceLink>,
}

impl HomeTemplate {
    fn new(idp: &IdentityProvider, user: Option<&Subject>, services: Vec<ServiceLink>) -> Self {
        Self {
            idp_code: idp.code.clone(),
            idp_name: idp.name.clone(),
            user_name: user.map(Subject::display_name),
            services,
        }
    }
}

/// Renders a template with the given status.
pub fn render<T: Template>(template: &T, status: StatusCode) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Template render error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

/// Form data for the IdP-local login.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    /// Email.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Shows the IdP landing page.
pub async fn home(State(ctx): State<AppContext>, Path(code): Path<String>, headers: HeaderMap) -> PageResult<Response> {
    let saml = ctx.saml();
    let idp = saml.identity_provider(&code).await?;
    let session_id = cookies::session_id(&headers);
    let user = saml.session_subject(&idp, session_id.as_deref()).await?;

    let services = match &user {
        Some(_) => ctx
            .store
            .list_service_providers(idp.id)
            .await?
            .into_iter()
            .map(|sp| ServiceLink {
                initiate_url: format!(
                    "/{}/saml/login/initiate?entityId={}",
                    idp.code,
                    urlencoding::encode(&sp.entity_id)
                ),
                name: sp.name,
                service_url: sp.service_url,
            })
            .collect(),
        None => Vec::new(),
    };

    Ok(render(&HomeTemplate::new(&idp, user.as_ref(), services), StatusCode::OK))
}

/// Handles the IdP-local login form.
pub async fn sign_in(
    State(ctx): State<AppContext>,
    Path(code): Path<String>,
    Form(form): Form<SignInForm>,
) -> PageResult<Response> {
    let saml = ctx.saml();
    let idp = saml.identity_provider(&code).await?;

    let Some(session_id) = saml.sign_in(&idp, &form.email, &form.password).await? else {
        let mut page = LoginTemplate::new(&idp, None, "login", "");
        page.request_id = None;
        page.error = Some(messages::INCORRECT_CREDENTIALS.to_string());
        return Ok(page.into_page());
    };

    Ok((
        [(header::SET_COOKIE, cookies::set_session_cookie(&session_id))],
        Redirect::to(&format!("/{}", idp.code)),
    )
        .into_response())
}

/// Logs out of the IdP and returns to its landing page.
pub async fn sign_out(State(ctx): State<AppContext>, Path(code): Path<String>, headers: HeaderMap) -> PageResult<Response> {
    let saml = ctx.saml();
    let idp = saml.identity_provider(&code).await?;
    let session_id = cookies::session_id(&headers);
    saml.sign_out(&idp, session_id.as_deref()).await?;

    Ok((
        [(header::SET_COOKIE, cookies::CLEAR_SESSION_COOKIE)],
        Redirect::to(&format!("/{}", idp.code)),
    )
        .into_response())
}

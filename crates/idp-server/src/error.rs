//! HTTP rendering of protocol failures.
//!
//! Browser legs answer with the HTML error page, API legs with the JSON
//! `{success, message}` body. Both take their status from the error kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use idp_core::{messages, Classify, Error};
use idp_protocol_oauth2::{ErrorResponse, OAuth2Error};

use crate::ui::{render, ErrorTemplate};

fn status_of(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn log_failure<E: Classify>(err: &E) {
    let kind = err.kind();
    if kind.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    } else {
        tracing::debug!(error = %err, ?kind, "Request rejected");
    }
}

/// Failure shown as the HTML error page.
#[derive(Debug)]
pub struct PageError(Error);

impl PageError {
    /// The classified error behind this page.
    #[must_use]
    pub const fn error(&self) -> &Error {
        &self.0
    }
}

impl<E: Classify> From<E> for PageError {
    fn from(err: E) -> Self {
        log_failure(&err);
        Self(Error::from_classified(&err))
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let template = ErrorTemplate {
            heading: messages::ERROR_PAGE_HEADING,
            message: self.0.message().to_string(),
        };
        render(&template, status_of(self.0.http_status()))
    }
}

/// Failure returned as a JSON body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl From<OAuth2Error> for ApiError {
    fn from(err: OAuth2Error) -> Self {
        log_failure(&err);
        tracing::debug!(code = err.error_code(), "OAuth2 API error");
        Self {
            status: status_of(err.http_status()),
            body: err.to_error_response(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Result of a browser-facing handler.
pub type PageResult<T> = Result<T, PageError>;

/// Result of a JSON API handler.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use idp_protocol_saml::SamlError;

    #[test]
    fn page_error_keeps_public_message_and_status() {
        let err = PageError::from(SamlError::SubjectMismatch);
        assert_eq!(err.error().http_status(), 403);
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn parse_failure_uses_fixed_message() {
        let err = PageError::from(SamlError::ProtocolParse("inflate error".into()));
        assert_eq!(err.error().message(), "The request from your service provider could not be understood.");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_status() {
        let response = ApiError::from(OAuth2Error::CodeAlreadyRedeemed).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}

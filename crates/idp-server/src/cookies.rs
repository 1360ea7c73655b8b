//! The `sessionId` browser cookie.

use axum::http::{header, HeaderMap};

/// Cookie name.
pub const SESSION_COOKIE: &str = "sessionId";

/// `Set-Cookie` value that expires the session cookie.
pub const CLEAR_SESSION_COOKIE: &str = "sessionId=deleted; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT";

/// Reads the session id from the request's `Cookie` headers.
#[must_use]
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty() && value != "deleted")
}

/// `Set-Cookie` value for a freshly minted session.
#[must_use]
pub fn set_session_cookie(session_id: &str) -> String {
    format!("{SESSION_COOKIE}={session_id}; Path=/")
}

//! SAML bindings.
//!
//! - **HTTP-Redirect** - inbound requests arrive deflated, base64-encoded and
//!   URL-encoded in the `SAMLRequest` query parameter
//! - **HTTP-POST** - outbound responses leave as plain base64 in the
//!   `SAMLResponse` form field; the HTML form itself is rendered by the server
//!
//! The two legs are deliberately asymmetric: responses are never deflated.

mod post;
mod redirect;

pub use post::*;
pub use redirect::*;

/// SAML message parameter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamlMessageType {
    /// Request message.
    Request,
    /// Response message.
    Response,
}

impl SamlMessageType {
    /// Returns the query or form parameter name for this message type.
    #[must_use]
    pub const fn form_param(&self) -> &'static str {
        match self {
            Self::Request => "SAMLRequest",
            Self::Response => "SAMLResponse",
        }
    }
}

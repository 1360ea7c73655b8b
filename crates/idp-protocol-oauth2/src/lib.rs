//! # idp-protocol-oauth2
//!
//! OAuth2 authorization-code flow of the IdP simulator.
//!
//! ## Flow
//!
//! `authorize` → (`login`) → `confirm` → `token` → `userinfo`
//!
//! Each browser step returns an [`Interaction`] telling the HTTP layer what
//! to show next. Code redemption is a single compare-and-set in the store,
//! so a code yields tokens at most once.
//!
//! ## Modules
//!
//! - [`claims`] - scope-gated ID token and userinfo assembly
//! - [`error`] - [`OAuth2Error`] and its JSON body
//! - [`flow`] - [`OAuth2Flow`] over an [`idp_storage::IdpStore`]
//! - [`scope`] - known scopes and their consent descriptions

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod claims;
pub mod error;
pub mod flow;
pub mod scope;

pub use error::{ErrorResponse, OAuth2Error, OAuth2Result};
pub use flow::{
    AuthorizeParams, ConsentPrompt, Interaction, LoginForm, LoginPrompt, OAuth2Flow, TokenParams, TokenResponse,
};

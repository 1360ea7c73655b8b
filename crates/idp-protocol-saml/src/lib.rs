//! SAML 2.0 identity-provider side of the simulator.
//!
//! This crate provides:
//!
//! - **Request parsing** - HTTP-Redirect decoding of AuthnRequest and LogoutRequest
//! - **Assertion and Response building** - structured XML output, never string templating
//! - **XML signature** - enveloped XML-DSig with exclusive canonicalization
//! - **Bindings** - Redirect decoding and POST encoding
//! - **Orchestration** - SP-initiated and IdP-initiated login, SP-initiated logout
//!
//! # Architecture
//!
//! - [`xml`] - XML writer, element tree and exclusive C14N
//! - [`signature`] - signing and validation of enveloped signatures
//! - [`types`] - assertion, response and request message types
//! - [`bindings`] - wire encodings
//! - [`flow`] - login and logout orchestrators over an [`idp_storage::IdpStore`]
//! - [`error`] - [`SamlError`]
//!
//! # Example
//!
//! ```rust,ignore
//! use idp_protocol_saml::{parse_request, ParseOptions, ParsedRequest};
//!
//! match parse_request(saml_request, &ParseOptions::default())? {
//!     ParsedRequest::Login(login) => println!("login from {:?}", login.issuer),
//!     ParsedRequest::Logout(logout) => println!("logout for {:?}", logout.name_id),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod error;
pub mod flow;
pub mod signature;
pub mod types;
pub mod xml;

pub use error::{SamlError, SamlResult};
pub use flow::{
    CredentialPrompt, CredentialSubmission, LoginOutcome, LogoutRedirect, SamlFlow, SamlPostback, SamlSettings,
};
pub use types::*;

//! # idp-model
//!
//! Domain entities for the IdP simulator.
//!
//! Every entity is owned by exactly one [`IdentityProvider`] (the tenant) and
//! carries its `idp_id`; storage lookups are always scoped by it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attribute;
pub mod identity_provider;
pub mod oauth;
pub mod service_provider;
pub mod subject;
pub mod transaction;

pub use attribute::{resolve_attributes, CustomAttribute};
pub use identity_provider::IdentityProvider;
pub use oauth::{OAuthAuthorization, OAuthSession};
pub use service_provider::ServiceProvider;
pub use subject::Subject;
pub use transaction::{ProtocolTransaction, TransactionData, TransactionKind};

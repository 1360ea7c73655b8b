//! # idp-storage
//!
//! Storage abstraction traits for the IdP simulator.
//!
//! Concrete backends implement every provider trait; protocol code depends
//! only on the [`IdpStore`] bundle.
//!
//! ## Provider Traits
//!
//! - [`IdentityProviderStore`] - tenant lookup by code
//! - [`ServiceProviderStore`] - relying parties, scoped by tenant
//! - [`SubjectStore`] - users and their session-id sets
//! - [`AttributeStore`] - custom attribute definitions
//! - [`TransactionStore`] - write-once protocol transaction records
//! - [`OAuthSessionStore`] - authorization codes and access tokens
//!
//! ## Atomicity
//!
//! [`SubjectStore::add_session`], [`SubjectStore::clear_sessions`] and
//! [`OAuthSessionStore::redeem_oauth_session`] must be atomic with respect to
//! concurrent callers. Callers never read-modify-write these fields.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attribute;
pub mod error;
pub mod identity_provider;
pub mod oauth;
pub mod service_provider;
pub mod subject;
pub mod transaction;

pub use attribute::AttributeStore;
pub use error::{StorageError, StorageResult};
pub use identity_provider::IdentityProviderStore;
pub use oauth::OAuthSessionStore;
pub use service_provider::ServiceProviderStore;
pub use subject::SubjectStore;
pub use transaction::TransactionStore;

/// Every provider trait, implemented by a single backend.
pub trait IdpStore:
    IdentityProviderStore
    + ServiceProviderStore
    + SubjectStore
    + AttributeStore
    + TransactionStore
    + OAuthSessionStore
    + 'static
{
}

impl<T> IdpStore for T where
    T: IdentityProviderStore
        + ServiceProviderStore
        + SubjectStore
        + AttributeStore
        + TransactionStore
        + OAuthSessionStore
        + 'static
{
}

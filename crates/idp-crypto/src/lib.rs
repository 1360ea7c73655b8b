//! # idp-crypto
//!
//! Cryptographic primitives used by the protocol crates.
//!
//! - [`random`] - hex identifiers, session ids, authorization codes and access tokens
//! - [`hash`] - SHA-1 / SHA-256 digests used by XML-DSig references
//! - [`signature`] - RSA PKCS#1 v1.5 signing and verification (SHA-1 and SHA-256)
//! - [`pem`] - PEM body extraction and DER decoding
//!
//! SAML relying parties in the wild still negotiate `rsa-sha1`, so both SHA-1
//! and SHA-256 variants are supported here. SHA-256 is the default everywhere
//! an algorithm is not chosen explicitly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod hash;
pub mod pem;
pub mod random;
pub mod signature;

pub use error::{CryptoError, CryptoResult};
pub use hash::DigestAlgorithm;
pub use signature::{RsaAlgorithm, RsaSigner, RsaVerifier};

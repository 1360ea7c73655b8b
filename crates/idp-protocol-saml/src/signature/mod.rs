//! Enveloped XML-DSig for SAML assertions.
//!
//! Two signature methods are supported, both RSA PKCS#1 v1.5:
//! - RSA-SHA256 (default)
//! - RSA-SHA1, for service providers that still require it
//!
//! The reference always uses the enveloped-signature transform followed by
//! exclusive canonicalization.

mod signer;
mod validator;

pub use signer::*;
pub use validator::*;

use idp_crypto::{DigestAlgorithm, RsaAlgorithm};

use crate::types::{digest_algorithms, signature_algorithms};

/// Signature method selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignatureAlgorithm {
    /// RSA with SHA-256.
    #[default]
    RsaSha256,
    /// RSA with SHA-1.
    RsaSha1,
}

impl SignatureAlgorithm {
    /// Returns the URI for this signature algorithm.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::RsaSha256 => signature_algorithms::RSA_SHA256,
            Self::RsaSha1 => signature_algorithms::RSA_SHA1,
        }
    }

    /// Parses a signature algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            signature_algorithms::RSA_SHA256 => Some(Self::RsaSha256),
            signature_algorithms::RSA_SHA1 => Some(Self::RsaSha1),
            _ => None,
        }
    }

    /// Parses the short names `rsa-sha256` / `rsa-sha1`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rsa-sha256" => Some(Self::RsaSha256),
            "rsa-sha1" => Some(Self::RsaSha1),
            _ => None,
        }
    }

    pub(crate) const fn rsa(self) -> RsaAlgorithm {
        match self {
            Self::RsaSha256 => RsaAlgorithm::RsaSha256,
            Self::RsaSha1 => RsaAlgorithm::RsaSha1,
        }
    }
}

/// Digest method URI.
#[must_use]
pub const fn digest_uri(algorithm: DigestAlgorithm) -> &'static str {
    match algorithm {
        DigestAlgorithm::Sha256 => digest_algorithms::SHA256,
        DigestAlgorithm::Sha1 => digest_algorithms::SHA1,
    }
}

/// Parses a digest method URI.
#[must_use]
pub fn digest_from_uri(uri: &str) -> Option<DigestAlgorithm> {
    match uri {
        digest_algorithms::SHA256 => Some(DigestAlgorithm::Sha256),
        digest_algorithms::SHA1 => Some(DigestAlgorithm::Sha1),
        _ => None,
    }
}

/// Configuration for signature creation.
///
/// The signature and digest algorithms are chosen independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignatureConfig {
    /// Signature method, default RSA-SHA256.
    pub signature_algorithm: SignatureAlgorithm,
    /// Reference digest, default SHA-256.
    pub digest_algorithm: DigestAlgorithm,
}

impl SignatureConfig {
    /// RSA-SHA1 with a SHA-1 digest.
    #[must_use]
    pub const fn sha1() -> Self {
        Self {
            signature_algorithm: SignatureAlgorithm::RsaSha1,
            digest_algorithm: DigestAlgorithm::Sha1,
        }
    }
}

//! RSA PKCS#1 v1.5 signatures.
//!
//! XML-DSig `rsa-sha1` and `rsa-sha256` are both PKCS#1 v1.5 schemes; the
//! only difference is the digest. Keys are accepted as PKCS#8 or PKCS#1 PEM.

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};
use crate::pem::pem_to_der;

/// RSA signature schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RsaAlgorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-1.
    RsaSha1,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    #[default]
    RsaSha256,
}

/// Signs data with an RSA private key.
#[derive(Clone)]
pub struct RsaSigner {
    key: RsaPrivateKey,
}

impl std::fmt::Debug for RsaSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaSigner").finish_non_exhaustive()
    }
}

impl RsaSigner {
    /// Loads a private key from PEM (`PRIVATE KEY` or `RSA PRIVATE KEY`).
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        let key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { key })
    }

    /// Signs `data`.
    pub fn sign(&self, algorithm: RsaAlgorithm, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let signature = match algorithm {
            RsaAlgorithm::RsaSha1 => SigningKey::<Sha1>::new(self.key.clone())
                .try_sign(data)
                .map(|s| s.to_vec()),
            RsaAlgorithm::RsaSha256 => SigningKey::<Sha256>::new(self.key.clone())
                .try_sign(data)
                .map(|s| s.to_vec()),
        };
        signature.map_err(|e| CryptoError::Signing(e.to_string()))
    }

    /// Returns the matching public key.
    #[must_use]
    pub fn public_key(&self) -> RsaPublicKey {
        self.key.to_public_key()
    }
}

/// Verifies RSA signatures against a public key.
#[derive(Debug, Clone)]
pub struct RsaVerifier {
    key: RsaPublicKey,
}

impl RsaVerifier {
    /// Wraps an existing public key.
    #[must_use]
    pub const fn new(key: RsaPublicKey) -> Self {
        Self { key }
    }

    /// Extracts the public key from a DER-encoded X.509 certificate.
    pub fn from_certificate_der(der: &[u8]) -> CryptoResult<Self> {
        let (_, cert) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;

        let key = RsaPublicKey::from_public_key_der(cert.public_key().raw)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        Ok(Self { key })
    }

    /// Extracts the public key from a PEM-encoded X.509 certificate.
    pub fn from_certificate_pem(pem: &str) -> CryptoResult<Self> {
        let der = pem_to_der(pem, "CERTIFICATE")?;
        Self::from_certificate_der(&der)
    }

    /// Verifies `signature` over `data`.
    pub fn verify(&self, algorithm: RsaAlgorithm, data: &[u8], signature: &[u8]) -> CryptoResult<()> {
        let signature = Signature::try_from(signature).map_err(|_| CryptoError::Verification)?;

        let result = match algorithm {
            RsaAlgorithm::RsaSha1 => {
                VerifyingKey::<Sha1>::new(self.key.clone()).verify(data, &signature)
            }
            RsaAlgorithm::RsaSha256 => {
                VerifyingKey::<Sha256>::new(self.key.clone()).verify(data, &signature)
            }
        };
        result.map_err(|_| CryptoError::Verification)
    }
}

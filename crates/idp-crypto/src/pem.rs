//! PEM helpers.
//!
//! Keys and certificates arrive as PEM text from configuration. XML-DSig
//! embeds the certificate as the bare base64 body, so the body extraction is
//! exposed separately from DER decoding.

use base64::Engine;

use crate::error::{CryptoError, CryptoResult};

/// Returns the base64 body of the first `label` block, with all whitespace removed.
///
/// `label` is the text between `BEGIN ` and the trailing dashes, e.g. `CERTIFICATE`.
#[must_use]
pub fn pem_body(pem: &str, label: &str) -> Option<String> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");

    let start = pem.find(&begin)? + begin.len();
    let stop = start + pem[start..].find(&end)?;

    let body: String = pem[start..stop]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    (!body.is_empty()).then_some(body)
}

/// Decodes the first `label` block to DER bytes.
pub fn pem_to_der(pem: &str, label: &str) -> CryptoResult<Vec<u8>> {
    let body = pem_body(pem, label)
        .ok_or_else(|| CryptoError::Pem(format!("no {label} block found")))?;

    base64::engine::general_purpose::STANDARD
        .decode(body)
        .map_err(|e| CryptoError::Pem(e.to_string()))
}

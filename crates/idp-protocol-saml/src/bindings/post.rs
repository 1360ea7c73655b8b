//! HTTP-POST binding.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{SamlError, SamlResult};

/// HTTP-POST encoder/decoder.
pub struct HttpPostBinding;

impl HttpPostBinding {
    /// Encodes a message for the `SAMLResponse` form field.
    #[must_use]
    pub fn encode(xml: &str) -> String {
        BASE64.encode(xml)
    }

    /// Decodes a form field value back to XML.
    pub fn decode(encoded: &str) -> SamlResult<String> {
        let decoded = BASE64
            .decode(encoded.trim())
            .map_err(|e| SamlError::ProtocolParse(format!("base64 decode error: {e}")))?;
        String::from_utf8(decoded).map_err(|e| SamlError::ProtocolParse(format!("invalid UTF-8 in message: {e}")))
    }
}

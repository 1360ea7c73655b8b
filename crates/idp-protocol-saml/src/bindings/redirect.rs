//! HTTP-Redirect binding.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use super::SamlMessageType;
use crate::error::{SamlError, SamlResult};

/// HTTP-Redirect encoder/decoder.
pub struct HttpRedirectBinding;

impl HttpRedirectBinding {
    /// Decodes a `SAMLRequest` value: URL-decode, base64-decode, raw inflate.
    ///
    /// Values already URL-decoded by the web framework decode the same way,
    /// since base64 text contains no escapes.
    ///
    /// # Errors
    ///
    /// [`SamlError::ProtocolParse`] for any stage that fails.
    pub fn decode(encoded: &str) -> SamlResult<String> {
        let url_decoded = urlencoding::decode(encoded)
            .map_err(|e| SamlError::ProtocolParse(format!("URL decode error: {e}")))?;
        let compact: String = url_decoded.chars().filter(|c| !c.is_whitespace()).collect();
        let compressed = BASE64
            .decode(compact)
            .map_err(|e| SamlError::ProtocolParse(format!("base64 decode error: {e}")))?;

        let mut xml = Vec::new();
        DeflateDecoder::new(compressed.as_slice())
            .read_to_end(&mut xml)
            .map_err(|e| SamlError::ProtocolParse(format!("inflate error: {e}")))?;

        String::from_utf8(xml).map_err(|e| SamlError::ProtocolParse(format!("invalid UTF-8 in message: {e}")))
    }

    /// Encodes a message: raw deflate, base64, URL-encode.
    pub fn encode(xml: &str) -> SamlResult<String> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(xml.as_bytes())?;
        let compressed = encoder.finish()?;
        Ok(urlencoding::encode(&BASE64.encode(compressed)).into_owned())
    }

    /// Appends `SAMLRequest`/`SAMLResponse` to `destination`.
    ///
    /// The value is base64 of the uncompressed XML, URL-encoded.
    #[must_use]
    pub fn redirect_url(destination: &str, message_type: SamlMessageType, xml: &str) -> String {
        let separator = if destination.contains('?') { '&' } else { '?' };
        format!(
            "{destination}{separator}{}={}",
            message_type.form_param(),
            urlencoding::encode(&BASE64.encode(xml))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_and_decode() {
        let xml = r#"<samlp:AuthnRequest ID="req-1">test content here</samlp:AuthnRequest>"#;
        let encoded = HttpRedirectBinding::encode(xml).unwrap();
        assert!(!encoded.contains('+') && !encoded.contains('/'));
        assert_eq!(HttpRedirectBinding::decode(&encoded).unwrap(), xml);
    }

    #[test]
    fn decode_rejects_garbage() {
        for input in ["%%%", "not base64!", "aGVsbG8=" /* "hello", not deflated */] {
            assert!(matches!(
                HttpRedirectBinding::decode(input),
                Err(SamlError::ProtocolParse(_))
            ));
        }
    }

    #[test]
    fn redirect_url_appends_parameter() {
        let url = HttpRedirectBinding::redirect_url("https://sp.example.com/slo", SamlMessageType::Response, "<x/>");
        assert_eq!(url, "https://sp.example.com/slo?SAMLResponse=PHgvPg%3D%3D");

        let url = HttpRedirectBinding::redirect_url("https://sp.example.com/slo?a=1", SamlMessageType::Response, "<x/>");
        assert!(url.starts_with("https://sp.example.com/slo?a=1&SAMLResponse="));
    }
}

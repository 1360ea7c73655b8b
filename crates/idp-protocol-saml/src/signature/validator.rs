//! XML Signature validation.
//!
//! Verifies an enveloped signature produced by [`super::XmlSigner`]: the
//! reference digest over the signed element (minus the signature) and the
//! RSA signature over the canonical `SignedInfo`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use idp_crypto::{DigestAlgorithm, RsaVerifier};

use super::{digest_from_uri, SignatureAlgorithm};
use crate::error::{SamlError, SamlResult};
use crate::types::transforms;
use crate::xml::{canonicalize, Element, NamespaceScope};

/// What a successful validation established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSignature {
    /// `ID` of the signed element.
    pub reference_id: String,
    /// Signature method used.
    pub signature_algorithm: SignatureAlgorithm,
    /// Digest method used.
    pub digest_algorithm: DigestAlgorithm,
}

/// Enveloped signature checker.
#[derive(Debug, Clone, Default)]
pub struct XmlSignatureValidator {
    trusted: Option<RsaVerifier>,
}

impl XmlSignatureValidator {
    /// Validates against the certificate embedded in `KeyInfo`.
    #[must_use]
    pub fn embedded() -> Self {
        Self::default()
    }

    /// Validates against a known certificate, ignoring `KeyInfo`.
    pub fn with_certificate_pem(pem: &str) -> SamlResult<Self> {
        Ok(Self {
            trusted: Some(RsaVerifier::from_certificate_pem(pem)?),
        })
    }

    /// Validates the first `Signature` element in `xml`.
    ///
    /// # Errors
    ///
    /// [`SamlError::SignatureInvalid`] on any structural or cryptographic mismatch.
    pub fn validate(&self, xml: &str) -> SamlResult<ValidatedSignature> {
        let document = Element::parse(xml)?;
        let signature_path = document
            .locate("Signature")
            .ok_or_else(|| invalid("no Signature element"))?;
        let Some((_, parent_path)) = signature_path.split_last() else {
            return Err(invalid("Signature is the document element"));
        };

        let signature = document
            .at_path(&signature_path)
            .ok_or_else(|| invalid("no Signature element"))?;
        let signed_info_position = signature
            .child_position("SignedInfo")
            .ok_or_else(|| invalid("no SignedInfo"))?;
        let signed_info = signature.child("SignedInfo").ok_or_else(|| invalid("no SignedInfo"))?;

        let c14n_method = algorithm_of(signed_info, "CanonicalizationMethod")?;
        if c14n_method != transforms::EXCLUSIVE_C14N {
            return Err(invalid(&format!("unsupported canonicalization {c14n_method}")));
        }
        let signature_algorithm = SignatureAlgorithm::from_uri(algorithm_of(signed_info, "SignatureMethod")?)
            .ok_or_else(|| invalid("unsupported signature method"))?;

        let reference = signed_info.child("Reference").ok_or_else(|| invalid("no Reference"))?;
        let digest_algorithm = digest_from_uri(algorithm_of(reference, "DigestMethod")?)
            .ok_or_else(|| invalid("unsupported digest method"))?;
        let reference_id = reference
            .attribute("URI")
            .and_then(|uri| uri.strip_prefix('#'))
            .ok_or_else(|| invalid("Reference URI is not a fragment"))?
            .to_string();
        let expected_digest = decode(&reference.child("DigestValue").ok_or_else(|| invalid("no DigestValue"))?.text())?;

        // Enveloped transform: the signed element is the signature's parent.
        let parent = document
            .at_path(parent_path)
            .ok_or_else(|| invalid("signature has no parent"))?;
        if parent.attribute("ID") != Some(reference_id.as_str()) {
            return Err(invalid("Reference URI does not match the enveloping element"));
        }
        let mut enveloping = parent.clone();
        if let Some(position) = enveloping.child_position("Signature") {
            enveloping.children.remove(position);
        }
        let parent_scope = NamespaceScope::along(&document, parent_path);
        let actual_digest = digest_algorithm.digest(canonicalize(&enveloping, &parent_scope).as_bytes());
        if actual_digest != expected_digest {
            return Err(invalid("digest mismatch"));
        }

        let mut signed_info_path = signature_path.clone();
        signed_info_path.push(signed_info_position);
        let signed_info_scope = NamespaceScope::along(&document, &signed_info_path);
        let signature_value = decode(
            &signature
                .child("SignatureValue")
                .ok_or_else(|| invalid("no SignatureValue"))?
                .text(),
        )?;

        let verifier = match &self.trusted {
            Some(verifier) => verifier.clone(),
            None => embedded_verifier(signature)?,
        };
        verifier
            .verify(
                signature_algorithm.rsa(),
                canonicalize(signed_info, &signed_info_scope).as_bytes(),
                &signature_value,
            )
            .map_err(|_| invalid("signature value does not verify"))?;

        Ok(ValidatedSignature {
            reference_id,
            signature_algorithm,
            digest_algorithm,
        })
    }
}

fn embedded_verifier(signature: &Element) -> SamlResult<RsaVerifier> {
    let certificate = signature
        .child("KeyInfo")
        .and_then(|info| info.child("X509Data"))
        .and_then(|data| data.child("X509Certificate"))
        .ok_or_else(|| invalid("no embedded certificate"))?;
    let der = decode(&certificate.text())?;
    Ok(RsaVerifier::from_certificate_der(&der)?)
}

fn algorithm_of<'a>(parent: &'a Element, child: &str) -> SamlResult<&'a str> {
    parent
        .child(child)
        .and_then(|element| element.attribute("Algorithm"))
        .ok_or_else(|| invalid(&format!("no {child} algorithm")))
}

fn decode(text: &str) -> SamlResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(compact)
        .map_err(|e| invalid(&format!("invalid base64: {e}")))
}

fn invalid(reason: &str) -> SamlError {
    SamlError::SignatureInvalid(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{SignatureConfig, XmlSigner};

    const KEY: &str = include_str!("../../tests/fixtures/idp-key.pem");
    const CERT: &str = include_str!("../../tests/fixtures/idp-cert.pem");

    const DOC: &str = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_abc"><saml:Issuer>https://idp.example.com</saml:Issuer><saml:Subject><saml:NameID>a@b.c</saml:NameID></saml:Subject></saml:Assertion>"#;

    fn sign(config: SignatureConfig) -> String {
        XmlSigner::new(Some(KEY), Some(CERT))
            .unwrap()
            .with_config(config)
            .sign(DOC, "Assertion")
            .unwrap()
    }

    #[test]
    fn validates_default_configuration() {
        let validated = XmlSignatureValidator::embedded().validate(&sign(SignatureConfig::default())).unwrap();
        assert_eq!(validated.reference_id, "_abc");
        assert_eq!(validated.signature_algorithm, SignatureAlgorithm::RsaSha256);
        assert_eq!(validated.digest_algorithm, DigestAlgorithm::Sha256);
    }

    #[test]
    fn validates_sha1_configuration() {
        let validated = XmlSignatureValidator::with_certificate_pem(CERT)
            .unwrap()
            .validate(&sign(SignatureConfig::sha1()))
            .unwrap();
        assert_eq!(validated.signature_algorithm, SignatureAlgorithm::RsaSha1);
        assert_eq!(validated.digest_algorithm, DigestAlgorithm::Sha1);
    }

    #[test]
    fn tampered_content_fails_digest() {
        let tampered = sign(SignatureConfig::default()).replace("a@b.c", "evil@b.c");
        assert!(matches!(
            XmlSignatureValidator::embedded().validate(&tampered),
            Err(SamlError::SignatureInvalid(reason)) if reason == "digest mismatch"
        ));
    }

    #[test]
    fn tampered_signed_info_fails_signature() {
        let signed = sign(SignatureConfig::default());
        let tampered = signed.replace("URI=\"#_abc\"", "URI=\"#_abd\"").replace("ID=\"_abc\"", "ID=\"_abd\"");
        assert!(XmlSignatureValidator::embedded().validate(&tampered).is_err());
    }

    #[test]
    fn unsigned_document_is_rejected() {
        assert!(XmlSignatureValidator::embedded().validate(DOC).is_err());
    }
}

//! XML Signature creation.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use idp_crypto::pem::pem_body;
use idp_crypto::RsaSigner;

use super::{digest_uri, SignatureConfig};
use crate::error::{SamlError, SamlResult};
use crate::types::{transforms, XMLDSIG_NS};
use crate::xml::{canonicalize, Element, NamespaceScope, Node};

/// Enveloped signature producer.
///
/// The `<ds:Signature>` element is inserted right after the `Issuer` child of
/// the signed element and carries the signing certificate in `KeyInfo`.
pub struct XmlSigner {
    key: RsaSigner,
    certificate: String,
    config: SignatureConfig,
}

impl std::fmt::Debug for XmlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlSigner").field("config", &self.config).finish_non_exhaustive()
    }
}

impl XmlSigner {
    /// Creates a signer from PEM key material.
    ///
    /// # Errors
    ///
    /// [`SamlError::MissingPrivateKey`] / [`SamlError::MissingCertificate`]
    /// when either is absent or blank, [`SamlError::Crypto`] when unparsable.
    pub fn new(private_key: Option<&str>, certificate: Option<&str>) -> SamlResult<Self> {
        let key_pem = private_key
            .filter(|pem| !pem.trim().is_empty())
            .ok_or(SamlError::MissingPrivateKey)?;
        let certificate_pem = certificate
            .filter(|pem| !pem.trim().is_empty())
            .ok_or(SamlError::MissingCertificate)?;

        let key = RsaSigner::from_pem(key_pem)?;
        let certificate = pem_body(certificate_pem, "CERTIFICATE")
            .ok_or_else(|| SamlError::Crypto("certificate has no CERTIFICATE block".to_string()))?;

        Ok(Self {
            key,
            certificate,
            config: SignatureConfig::default(),
        })
    }

    /// Sets the signature configuration.
    #[must_use]
    pub const fn with_config(mut self, config: SignatureConfig) -> Self {
        self.config = config;
        self
    }

    /// Signs the first element named `reference` (local name) in `xml`.
    ///
    /// Whitespace-only text is removed from the whole document first; the
    /// returned document is the stripped one with the signature inserted.
    ///
    /// # Errors
    ///
    /// [`SamlError::UnresolvableReference`] when the element, its `ID` or its
    /// `Issuer` child is missing.
    pub fn sign(&self, xml: &str, reference: &str) -> SamlResult<String> {
        let mut document = Element::parse(xml)?;
        document.strip_whitespace();

        let path = document
            .locate(reference)
            .ok_or_else(|| SamlError::UnresolvableReference(format!("no <{reference}> element")))?;
        let scope = NamespaceScope::along(&document, &path);
        let target = document
            .at_path(&path)
            .ok_or_else(|| SamlError::UnresolvableReference(format!("no <{reference}> element")))?;
        let id = target
            .attribute("ID")
            .ok_or_else(|| SamlError::UnresolvableReference(format!("<{reference}> has no ID")))?
            .to_string();
        let issuer_position = target
            .child_position("Issuer")
            .ok_or_else(|| SamlError::UnresolvableReference(format!("<{reference}> has no Issuer")))?;

        let digest = self
            .config
            .digest_algorithm
            .digest(canonicalize(target, &scope).as_bytes());
        let signed_info = self.signed_info(&id, &BASE64.encode(digest));

        let mut signed_info_scope = scope.clone();
        signed_info_scope.declare_from(target);
        signed_info_scope.bind("ds", XMLDSIG_NS);
        let signature_value = self.key.sign(
            self.config.signature_algorithm.rsa(),
            canonicalize(&signed_info, &signed_info_scope).as_bytes(),
        )?;

        let signature = Element::new("ds:Signature")
            .with_attribute("xmlns:ds", XMLDSIG_NS)
            .with_child(signed_info)
            .with_child(Element::new("ds:SignatureValue").with_text(BASE64.encode(signature_value)))
            .with_child(
                Element::new("ds:KeyInfo").with_child(
                    Element::new("ds:X509Data")
                        .with_child(Element::new("ds:X509Certificate").with_text(self.certificate.clone())),
                ),
            );

        let target = document
            .at_path_mut(&path)
            .ok_or_else(|| SamlError::UnresolvableReference(format!("no <{reference}> element")))?;
        target.children.insert(issuer_position + 1, Node::Element(signature));

        document.to_xml()
    }

    fn signed_info(&self, id: &str, digest_value: &str) -> Element {
        let algorithm = |name: &str, uri: &str| Element::new(name).with_attribute("Algorithm", uri);

        Element::new("ds:SignedInfo")
            .with_child(algorithm("ds:CanonicalizationMethod", transforms::EXCLUSIVE_C14N))
            .with_child(algorithm("ds:SignatureMethod", self.config.signature_algorithm.uri()))
            .with_child(
                Element::new("ds:Reference")
                    .with_attribute("URI", format!("#{id}"))
                    .with_child(
                        Element::new("ds:Transforms")
                            .with_child(algorithm("ds:Transform", transforms::ENVELOPED_SIGNATURE))
                            .with_child(algorithm("ds:Transform", transforms::EXCLUSIVE_C14N)),
                    )
                    .with_child(algorithm("ds:DigestMethod", digest_uri(self.config.digest_algorithm)))
                    .with_child(Element::new("ds:DigestValue").with_text(digest_value)),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = include_str!("../../tests/fixtures/idp-key.pem");
    const CERT: &str = include_str!("../../tests/fixtures/idp-cert.pem");

    const DOC: &str = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_abc">
        <saml:Issuer>https://idp.example.com</saml:Issuer>
        <saml:Subject/>
    </saml:Assertion>"#;

    #[test]
    fn missing_key_material_is_distinct() {
        assert!(matches!(XmlSigner::new(None, Some(CERT)), Err(SamlError::MissingPrivateKey)));
        assert!(matches!(XmlSigner::new(Some(KEY), None), Err(SamlError::MissingCertificate)));
        assert!(matches!(XmlSigner::new(Some("  "), Some(CERT)), Err(SamlError::MissingPrivateKey)));
    }

    #[test]
    fn signature_follows_issuer() {
        let signed = XmlSigner::new(Some(KEY), Some(CERT)).unwrap().sign(DOC, "Assertion").unwrap();
        let root = Element::parse(&signed).unwrap();
        let names: Vec<&str> = root.child_elements().map(|e| e.local_name()).collect();
        assert_eq!(names, ["Issuer", "Signature", "Subject"]);

        let reference = root.child("Signature").unwrap().child("SignedInfo").unwrap().child("Reference").unwrap();
        assert_eq!(reference.attribute("URI"), Some("#_abc"));
        assert!(!signed.contains("\n"));
    }

    #[test]
    fn key_info_carries_bare_certificate() {
        let signed = XmlSigner::new(Some(KEY), Some(CERT)).unwrap().sign(DOC, "Assertion").unwrap();
        let root = Element::parse(&signed).unwrap();
        let cert = root
            .child("Signature")
            .and_then(|s| s.child("KeyInfo"))
            .and_then(|k| k.child("X509Data"))
            .and_then(|d| d.child("X509Certificate"))
            .unwrap()
            .text();
        assert!(!cert.contains("BEGIN"));
        assert!(!cert.contains('\n'));
        assert_eq!(cert, pem_body(CERT, "CERTIFICATE").unwrap());
    }

    #[test]
    fn unresolvable_references() {
        let signer = XmlSigner::new(Some(KEY), Some(CERT)).unwrap();
        assert!(matches!(
            signer.sign("<Response ID=\"x\"><Issuer/></Response>", "Assertion"),
            Err(SamlError::UnresolvableReference(_))
        ));
        assert!(matches!(
            signer.sign("<Assertion><Issuer/></Assertion>", "Assertion"),
            Err(SamlError::UnresolvableReference(_))
        ));
        assert!(matches!(
            signer.sign("<Assertion ID=\"x\"><Subject/></Assertion>", "Assertion"),
            Err(SamlError::UnresolvableReference(_))
        ));
    }
}

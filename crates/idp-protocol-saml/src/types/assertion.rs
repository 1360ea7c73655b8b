//! Signed assertion construction.

use chrono::{DateTime, Duration, Utc};
use idp_crypto::random::generate_message_id;

use super::constants::{authn_context_classes, name_id_formats, CM_BEARER, SAML_NS, XSI_NS, XS_NS};
use super::saml_instant;
use crate::error::SamlResult;
use crate::signature::{SignatureConfig, XmlSigner};
use crate::xml::XmlBuilder;

/// Inputs for [`build_assertion`].
///
/// Optional fields are omitted from the output when `None` or empty.
#[derive(Debug, Clone, Default)]
pub struct AssertionOptions {
    /// Assertion ID suffix; the ID is `_` + uid, or `_` + 42 random hex chars.
    pub uid: Option<String>,
    /// `Issuer` text.
    pub issuer: String,
    /// Validity window starting now; sets `NotBefore`/`NotOnOrAfter`.
    pub lifetime_in_seconds: Option<i64>,
    /// `Audience` values, in order, under a single `AudienceRestriction`.
    pub audiences: Vec<String>,
    /// `SubjectConfirmationData/@Recipient`.
    pub recipient: Option<String>,
    /// `SubjectConfirmationData/@InResponseTo`.
    pub in_response_to: Option<String>,
    /// Attribute name to values, in emission order.
    pub attributes: Vec<(String, Vec<String>)>,
    /// `AuthnStatement/@SessionNotOnOrAfter`.
    pub session_expiration: Option<DateTime<Utc>>,
    /// `AuthnStatement/@SessionIndex`.
    pub session_index: Option<String>,
    /// `NameID` text.
    pub name_identifier: String,
    /// `NameID/@Format`, default unspecified.
    pub name_identifier_format: Option<String>,
    /// `AuthnContextClassRef`, default unspecified.
    pub authn_context_class_ref: Option<String>,
    /// Signing key, PEM.
    pub key: Option<String>,
    /// Signing certificate, PEM.
    pub cert: Option<String>,
    /// Signature and digest algorithms.
    pub signature: SignatureConfig,
}

/// A signed `saml:Assertion`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAssertion {
    /// Assertion `ID`.
    pub id: String,
    /// Signed XML, to be embedded verbatim.
    pub xml: String,
}

/// Builds and signs an assertion.
///
/// Key material is checked before any XML is produced.
///
/// # Errors
///
/// Missing or invalid key material, or a signing failure.
pub fn build_assertion(options: &AssertionOptions) -> SamlResult<SignedAssertion> {
    let signer = XmlSigner::new(options.key.as_deref(), options.cert.as_deref())?.with_config(options.signature);

    let id = options
        .uid
        .as_ref()
        .map_or_else(generate_message_id, |uid| format!("_{uid}"));
    let now = Utc::now();
    let instant = saml_instant(now);
    let expires = options
        .lifetime_in_seconds
        .map(|seconds| saml_instant(now + Duration::seconds(seconds)));

    let mut xml = XmlBuilder::new();
    xml.start(
        "saml:Assertion",
        &[("xmlns:saml", SAML_NS), ("Version", "2.0"), ("ID", id.as_str()), ("IssueInstant", instant.as_str())],
    )?;
    xml.text_element("saml:Issuer", &[], &options.issuer)?;

    xml.start("saml:Subject", &[])?;
    xml.text_element(
        "saml:NameID",
        &[(
            "Format",
            options
                .name_identifier_format
                .as_deref()
                .unwrap_or(name_id_formats::UNSPECIFIED),
        )],
        &options.name_identifier,
    )?;
    xml.start("saml:SubjectConfirmation", &[("Method", CM_BEARER)])?;
    let mut confirmation = Vec::new();
    if let Some(expires) = &expires {
        confirmation.push(("NotOnOrAfter", expires.as_str()));
    }
    if let Some(recipient) = &options.recipient {
        confirmation.push(("Recipient", recipient.as_str()));
    }
    if let Some(in_response_to) = &options.in_response_to {
        confirmation.push(("InResponseTo", in_response_to.as_str()));
    }
    xml.empty("saml:SubjectConfirmationData", &confirmation)?;
    xml.end("saml:SubjectConfirmation")?;
    xml.end("saml:Subject")?;

    let mut conditions = Vec::new();
    if let Some(expires) = &expires {
        conditions.push(("NotBefore", instant.as_str()));
        conditions.push(("NotOnOrAfter", expires.as_str()));
    }
    xml.start("saml:Conditions", &conditions)?;
    if !options.audiences.is_empty() {
        xml.start("saml:AudienceRestriction", &[])?;
        for audience in &options.audiences {
            xml.text_element("saml:Audience", &[], audience)?;
        }
        xml.end("saml:AudienceRestriction")?;
    }
    xml.end("saml:Conditions")?;

    let session_expiration = options.session_expiration.map(saml_instant);
    let mut statement = vec![("AuthnInstant", instant.as_str())];
    if let Some(expiration) = &session_expiration {
        statement.push(("SessionNotOnOrAfter", expiration.as_str()));
    }
    if let Some(index) = &options.session_index {
        statement.push(("SessionIndex", index.as_str()));
    }
    xml.start("saml:AuthnStatement", &statement)?;
    xml.start("saml:AuthnContext", &[])?;
    xml.text_element(
        "saml:AuthnContextClassRef",
        &[],
        options
            .authn_context_class_ref
            .as_deref()
            .unwrap_or(authn_context_classes::UNSPECIFIED),
    )?;
    xml.end("saml:AuthnContext")?;
    xml.end("saml:AuthnStatement")?;

    write_attribute_statement(&mut xml, &options.attributes)?;
    xml.end("saml:Assertion")?;

    let signed = signer.sign(&xml.finish()?, "Assertion")?;
    Ok(SignedAssertion { id, xml: signed })
}

/// Writes the statement only if at least one attribute has a non-empty value.
fn write_attribute_statement(xml: &mut XmlBuilder, attributes: &[(String, Vec<String>)]) -> SamlResult<()> {
    let emitted: Vec<(&str, Vec<&str>)> = attributes
        .iter()
        .map(|(name, values)| {
            let values = values
                .iter()
                .map(String::as_str)
                .filter(|value| !value.is_empty())
                .collect::<Vec<_>>();
            (name.as_str(), values)
        })
        .filter(|(_, values)| !values.is_empty())
        .collect();

    if emitted.is_empty() {
        return Ok(());
    }

    xml.start("saml:AttributeStatement", &[("xmlns:xs", XS_NS), ("xmlns:xsi", XSI_NS)])?;
    for (name, values) in emitted {
        xml.start("saml:Attribute", &[("Name", name)])?;
        for value in values {
            xml.text_element("saml:AttributeValue", &[("xsi:type", "xs:anyType")], value)?;
        }
        xml.end("saml:Attribute")?;
    }
    xml.end("saml:AttributeStatement")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SamlError;
    use crate::xml::Element;

    const KEY: &str = include_str!("../../tests/fixtures/idp-key.pem");
    const CERT: &str = include_str!("../../tests/fixtures/idp-cert.pem");

    fn options() -> AssertionOptions {
        AssertionOptions {
            issuer: "https://idp.sso.tools/acme".into(),
            name_identifier: "jane@example.com".into(),
            key: Some(KEY.into()),
            cert: Some(CERT.into()),
            ..AssertionOptions::default()
        }
    }

    fn build(options: &AssertionOptions) -> Element {
        Element::parse(&build_assertion(options).unwrap().xml).unwrap()
    }

    #[test]
    fn uid_controls_id() {
        let mut opts = options();
        opts.uid = Some("fixed".into());
        let assertion = build_assertion(&opts).unwrap();
        assert_eq!(assertion.id, "_fixed");

        let random = build_assertion(&options()).unwrap();
        assert_eq!(random.id.len(), 43);
        assert!(random.id.starts_with('_'));
    }

    #[test]
    fn element_order_and_defaults() {
        let root = build(&options());
        let names: Vec<&str> = root.child_elements().map(Element::local_name).collect();
        assert_eq!(names, ["Issuer", "Signature", "Subject", "Conditions", "AuthnStatement"]);

        let name_id = root.child("Subject").unwrap().child("NameID").unwrap();
        assert_eq!(name_id.attribute("Format"), Some(name_id_formats::UNSPECIFIED));
        assert_eq!(name_id.text(), "jane@example.com");

        let class_ref = root.child("AuthnStatement").unwrap().child("AuthnContext").unwrap().child("AuthnContextClassRef").unwrap();
        assert_eq!(class_ref.text(), authn_context_classes::UNSPECIFIED);
        assert_eq!(root.attribute("IssueInstant"), root.child("AuthnStatement").unwrap().attribute("AuthnInstant"));
    }

    #[test]
    fn audiences_in_one_restriction() {
        let mut opts = options();
        opts.audiences = vec!["a".into(), "b".into()];
        let root = build(&opts);
        let conditions = root.child("Conditions").unwrap();
        let restrictions: Vec<&Element> = conditions.child_elements().collect();
        assert_eq!(restrictions.len(), 1);
        let audiences: Vec<String> = restrictions[0].child_elements().map(Element::text).collect();
        assert_eq!(audiences, ["a", "b"]);
    }

    #[test]
    fn lifetime_sets_validity_window() {
        let mut opts = options();
        opts.lifetime_in_seconds = Some(600);
        opts.recipient = Some("https://sp/acs".into());
        opts.in_response_to = Some("req-1".into());
        let root = build(&opts);

        let conditions = root.child("Conditions").unwrap();
        assert_eq!(conditions.attribute("NotBefore"), root.attribute("IssueInstant"));
        let data = root.child("Subject").unwrap().child("SubjectConfirmation").unwrap().child("SubjectConfirmationData").unwrap();
        assert_eq!(data.attribute("NotOnOrAfter"), conditions.attribute("NotOnOrAfter"));
        assert_eq!(data.attribute("Recipient"), Some("https://sp/acs"));
        assert_eq!(data.attribute("InResponseTo"), Some("req-1"));
    }

    #[test]
    fn attributes_without_values_are_dropped() {
        let mut opts = options();
        opts.attributes = vec![
            ("firstName".into(), vec!["Jane".into()]),
            ("empty".into(), vec![String::new()]),
            ("none".into(), vec![]),
            ("groups".into(), vec!["a".into(), String::new(), "b".into()]),
        ];
        let root = build(&opts);

        let names: Vec<&str> = root.child_elements().map(Element::local_name).collect();
        assert_eq!(names.last(), Some(&"AttributeStatement"));

        let statement = root.child("AttributeStatement").unwrap();
        assert_eq!(statement.attribute("xmlns:xs"), Some(XS_NS));
        assert_eq!(statement.attribute("xmlns:xsi"), Some(XSI_NS));
        let attributes: Vec<&Element> = statement.child_elements().collect();
        assert_eq!(attributes.len(), 2);
        for attribute in &attributes {
            assert!(attribute.child("AttributeValue").is_some());
        }
        let groups: Vec<String> = attributes[1].child_elements().map(Element::text).collect();
        assert_eq!(groups, ["a", "b"]);
        assert_eq!(attributes[1].child("AttributeValue").unwrap().attribute("xsi:type"), Some("xs:anyType"));
    }

    #[test]
    fn no_statement_when_all_attributes_empty() {
        let mut opts = options();
        opts.attributes = vec![("blank".into(), vec![String::new()])];
        assert!(build(&opts).child("AttributeStatement").is_none());
    }

    #[test]
    fn missing_key_fails_first() {
        let mut opts = options();
        opts.key = None;
        assert!(matches!(build_assertion(&opts), Err(SamlError::MissingPrivateKey)));
        let mut opts = options();
        opts.cert = None;
        assert!(matches!(build_assertion(&opts), Err(SamlError::MissingCertificate)));
    }
}

//! Protocol `samlp:Response` envelope.

use chrono::{DateTime, Utc};
use idp_crypto::random::generate_message_id;

use super::constants::{status_codes, SAMLP_NS, SAML_NS};
use super::saml_instant;
use crate::error::SamlResult;
use crate::xml::XmlBuilder;

/// Inputs for [`build_response`].
#[derive(Debug, Clone)]
pub struct ResponseOptions {
    /// `IssueInstant`.
    pub instant: DateTime<Utc>,
    /// `Issuer` text.
    pub issuer: String,
    /// `InResponseTo`, absent for IdP-initiated login.
    pub in_response_to: Option<String>,
    /// `Destination`.
    pub destination: Option<String>,
    /// Pre-signed assertion, embedded byte for byte.
    pub assertion: String,
    /// `StatusCode/@Value`.
    pub status_code: String,
    /// `StatusMessage` text.
    pub status_message: Option<String>,
}

impl ResponseOptions {
    /// A `Success` response issued now.
    #[must_use]
    pub fn success(issuer: impl Into<String>, assertion: impl Into<String>) -> Self {
        Self {
            instant: Utc::now(),
            issuer: issuer.into(),
            in_response_to: None,
            destination: None,
            assertion: assertion.into(),
            status_code: status_codes::SUCCESS.to_string(),
            status_message: None,
        }
    }
}

/// A serialized `samlp:Response`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamlResponse {
    /// Response `ID`.
    pub id: String,
    /// XML document.
    pub xml: String,
}

/// Wraps a signed assertion in an unsigned protocol envelope.
pub fn build_response(options: &ResponseOptions) -> SamlResult<SamlResponse> {
    let id = generate_message_id();
    let instant = saml_instant(options.instant);

    let mut attributes = vec![
        ("xmlns:samlp", SAMLP_NS),
        ("xmlns:saml", SAML_NS),
        ("Version", "2.0"),
        ("ID", id.as_str()),
        ("IssueInstant", instant.as_str()),
    ];
    if let Some(in_response_to) = &options.in_response_to {
        attributes.push(("InResponseTo", in_response_to.as_str()));
    }
    if let Some(destination) = &options.destination {
        attributes.push(("Destination", destination.as_str()));
    }

    let mut xml = XmlBuilder::new();
    xml.start("samlp:Response", &attributes)?;
    xml.text_element("saml:Issuer", &[], &options.issuer)?;
    xml.start("samlp:Status", &[])?;
    xml.empty("samlp:StatusCode", &[("Value", options.status_code.as_str())])?;
    if let Some(message) = &options.status_message {
        xml.text_element("samlp:StatusMessage", &[], message)?;
    }
    xml.end("samlp:Status")?;
    xml.raw(&options.assertion);
    xml.end("samlp:Response")?;

    Ok(SamlResponse { id, xml: xml.finish()? })
}

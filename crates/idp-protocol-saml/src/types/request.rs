//! Inbound AuthnRequest and LogoutRequest parsing.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use super::constants::{DEFAULT_ISSUER, SAMLP_NS, SAML_NS};
use super::logout::{build_logout_response, LogoutResponse};
use crate::bindings::HttpRedirectBinding;
use crate::error::{SamlError, SamlResult};

/// Options for [`parse_request`].
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Issuer of any synthesized LogoutResponse.
    pub issuer: String,
    /// Destination of any synthesized LogoutResponse.
    pub callback_url: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            callback_url: None,
        }
    }
}

impl ParseOptions {
    /// Options with the given response issuer and no callback.
    #[must_use]
    pub fn with_issuer(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            callback_url: None,
        }
    }
}

/// A decoded inbound request.
#[derive(Debug, Clone)]
pub enum ParsedRequest {
    /// `samlp:AuthnRequest`.
    Login(LoginRequest),
    /// `samlp:LogoutRequest`.
    Logout(LogoutRequest),
}

/// Fields of an AuthnRequest. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginRequest {
    /// `ID`.
    pub id: Option<String>,
    /// `AssertionConsumerServiceURL`.
    pub callback_url: Option<String>,
    /// `Destination`.
    pub destination: Option<String>,
    /// `ForceAuthn="true"`.
    pub force_authn: bool,
    /// `Issuer` text.
    pub issuer: Option<String>,
    /// `NameIDPolicy/@Format`.
    pub name_identifier_format: Option<String>,
    /// `RequestedAuthnContext/AuthnContextClassRef` text.
    pub authn_context_class_ref: Option<String>,
}

/// Fields of a LogoutRequest, with the response to send back.
#[derive(Debug, Clone)]
pub struct LogoutRequest {
    /// `ID`.
    pub id: Option<String>,
    /// `Destination`.
    pub destination: Option<String>,
    /// `Issuer` text.
    pub issuer: Option<String>,
    /// `NameID` text.
    pub name_id: Option<String>,
    /// Success response addressed per the parse options.
    pub response: LogoutResponse,
}

/// Decodes and parses a `SAMLRequest` query value.
///
/// # Errors
///
/// Every failure, including an unsupported root element, is reported as
/// [`SamlError::ProtocolParse`].
pub fn parse_request(wire: &str, options: &ParseOptions) -> SamlResult<ParsedRequest> {
    parse_request_xml(&decode_request(wire)?, options)
}

/// Undoes the redirect-binding encoding of a `SAMLRequest` query value.
///
/// # Errors
///
/// Returns [`SamlError::ProtocolParse`] when the value is not valid
/// URL-encoded, base64, deflated UTF-8.
pub fn decode_request(wire: &str) -> SamlResult<String> {
    HttpRedirectBinding::decode(wire).inspect_err(|e| tracing::warn!(error = %e, "undecodable SAML request"))
}

/// Parses an already-decoded request document.
///
/// # Errors
///
/// See [`parse_request`].
pub fn parse_request_xml(xml: &str, options: &ParseOptions) -> SamlResult<ParsedRequest> {
    read_request(xml, options)
        .map_err(|e| match e {
            SamlError::ProtocolParse(_) => e,
            other => SamlError::ProtocolParse(other.to_string()),
        })
        .inspect_err(|e| tracing::warn!(error = %e, "unparseable SAML request"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    Authn,
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Issuer,
    NameId,
    ClassRef,
}

#[derive(Debug, Default)]
struct Fields {
    id: Option<String>,
    destination: Option<String>,
    callback_url: Option<String>,
    force_authn: bool,
    issuer: Option<String>,
    name_id: Option<String>,
    name_identifier_format: Option<String>,
    authn_context_class_ref: Option<String>,
}

fn in_namespace(ns: &ResolveResult<'_>, uri: &str) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(bound)) if *bound == uri.as_bytes())
}

fn attribute(element: &BytesStart<'_>, name: &str) -> SamlResult<Option<String>> {
    match element.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn read_request(xml: &str, options: &ParseOptions) -> SamlResult<ParsedRequest> {
    let mut reader = NsReader::from_str(xml);
    let mut root = None;
    let mut fields = Fields::default();
    // (local name, in protocol namespace) of each open element
    let mut stack: Vec<(Vec<u8>, bool)> = Vec::new();
    let mut capture: Option<(Capture, usize, String)> = None;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let local = e.local_name().as_ref().to_vec();
                let protocol = in_namespace(&ns, SAMLP_NS);
                let assertion = in_namespace(&ns, SAML_NS);

                if root.is_none() {
                    if !stack.is_empty() {
                        return Err(SamlError::ProtocolParse("unexpected element nesting".into()));
                    }
                    // Recognized by local name whatever the namespace.
                    root = Some(match local.as_slice() {
                        b"AuthnRequest" => Root::Authn,
                        b"LogoutRequest" => Root::Logout,
                        other => {
                            return Err(SamlError::ProtocolParse(format!(
                                "unsupported root element {}",
                                String::from_utf8_lossy(other)
                            )))
                        }
                    });
                    fields.id = attribute(e, "ID")?;
                    fields.destination = attribute(e, "Destination")?;
                    fields.callback_url = attribute(e, "AssertionConsumerServiceURL")?;
                    fields.force_authn = attribute(e, "ForceAuthn")?.as_deref() == Some("true");
                } else {
                    let parent_is_context = stack
                        .last()
                        .is_some_and(|(name, protocol)| *protocol && name == b"RequestedAuthnContext");
                    let target = match local.as_slice() {
                        b"Issuer" if assertion && fields.issuer.is_none() => Some(Capture::Issuer),
                        b"NameID" if assertion && fields.name_id.is_none() => Some(Capture::NameId),
                        b"AuthnContextClassRef"
                            if assertion && parent_is_context && fields.authn_context_class_ref.is_none() =>
                        {
                            Some(Capture::ClassRef)
                        }
                        b"NameIDPolicy" if protocol => {
                            fields.name_identifier_format = attribute(e, "Format")?;
                            None
                        }
                        _ => None,
                    };
                    if capture.is_none() {
                        if let Some(target) = target {
                            if is_empty {
                                store(&mut fields, target, String::new());
                            } else {
                                capture = Some((target, stack.len(), String::new()));
                            }
                        }
                    }
                }

                if !is_empty {
                    stack.push((local, protocol));
                }
            }
            Event::Text(ref t) => {
                if let Some((_, _, buffer)) = capture.as_mut() {
                    buffer.push_str(&t.unescape()?);
                }
            }
            Event::CData(ref c) => {
                if let Some((_, _, buffer)) = capture.as_mut() {
                    buffer.push_str(&String::from_utf8_lossy(c.as_ref()));
                }
            }
            Event::End(_) => {
                stack.pop();
                if capture.as_ref().is_some_and(|(_, depth, _)| *depth == stack.len()) {
                    if let Some((target, _, buffer)) = capture.take() {
                        store(&mut fields, target, buffer.trim().to_string());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let root = root.ok_or_else(|| SamlError::ProtocolParse("empty document".into()))?;
    if !stack.is_empty() {
        return Err(SamlError::ProtocolParse("unclosed element".into()));
    }

    Ok(match root {
        Root::Authn => ParsedRequest::Login(LoginRequest {
            id: fields.id,
            callback_url: fields.callback_url,
            destination: fields.destination,
            force_authn: fields.force_authn,
            issuer: fields.issuer,
            name_identifier_format: fields.name_identifier_format,
            authn_context_class_ref: fields.authn_context_class_ref,
        }),
        Root::Logout => ParsedRequest::Logout(LogoutRequest {
            id: fields.id,
            destination: fields.destination,
            issuer: fields.issuer,
            name_id: fields.name_id,
            response: build_logout_response(&options.issuer, options.callback_url.as_deref())?,
        }),
    })
}

fn store(fields: &mut Fields, target: Capture, value: String) {
    match target {
        Capture::Issuer => fields.issuer = Some(value),
        Capture::NameId => fields.name_id = Some(value),
        Capture::ClassRef => fields.authn_context_class_ref = Some(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::constants::{authn_context_classes, name_id_formats};

    const AUTHN: &str = r#"<samlp:AuthnRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="req-1" Version="2.0" Destination="https://idp.sso.tools/acme/saml/login/request" AssertionConsumerServiceURL="https://sp.example.com/acs" ForceAuthn="true">
  <saml:Issuer>urn:test:sp</saml:Issuer>
  <samlp:NameIDPolicy Format="urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress" AllowCreate="true"/>
  <samlp:RequestedAuthnContext Comparison="exact">
    <saml:AuthnContextClassRef>urn:oasis:names:tc:SAML:2.0:ac:classes:unspecified</saml:AuthnContextClassRef>
  </samlp:RequestedAuthnContext>
</samlp:AuthnRequest>"#;

    const LOGOUT: &str = r#"<samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="lo-1" Version="2.0" Destination="https://idp.sso.tools/acme/saml/logout/request"><saml:Issuer xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion">urn:test:sp</saml:Issuer><saml:NameID xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion">jane@example.com</saml:NameID></samlp:LogoutRequest>"#;

    fn login(xml: &str) -> LoginRequest {
        match parse_request_xml(xml, &ParseOptions::default()).unwrap() {
            ParsedRequest::Login(login) => login,
            ParsedRequest::Logout(_) => panic!("expected login"),
        }
    }

    #[test]
    fn authn_request_fields() {
        let request = login(AUTHN);
        assert_eq!(request.id.as_deref(), Some("req-1"));
        assert_eq!(request.issuer.as_deref(), Some("urn:test:sp"));
        assert_eq!(request.callback_url.as_deref(), Some("https://sp.example.com/acs"));
        assert_eq!(
            request.destination.as_deref(),
            Some("https://idp.sso.tools/acme/saml/login/request")
        );
        assert!(request.force_authn);
        assert_eq!(request.name_identifier_format.as_deref(), Some(name_id_formats::EMAIL));
        assert_eq!(
            request.authn_context_class_ref.as_deref(),
            Some(authn_context_classes::UNSPECIFIED)
        );
    }

    #[test]
    fn force_authn_requires_exact_true() {
        let request = login(&AUTHN.replace(r#"ForceAuthn="true""#, r#"ForceAuthn="TRUE""#));
        assert!(!request.force_authn);
    }

    #[test]
    fn minimal_request_has_no_fields() {
        let request = login(r#"<AuthnRequest xmlns="urn:oasis:names:tc:SAML:2.0:protocol"/>"#);
        assert_eq!(request, LoginRequest::default());
    }

    #[test]
    fn issuer_in_wrong_namespace_is_ignored() {
        let request = login(
            r#"<samlp:AuthnRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="x"><samlp:Issuer>urn:wrong</samlp:Issuer></samlp:AuthnRequest>"#,
        );
        assert!(request.issuer.is_none());
    }

    #[test]
    fn default_namespace_prefixes_resolve() {
        let request = login(
            r#"<AuthnRequest xmlns="urn:oasis:names:tc:SAML:2.0:protocol" ID="y"><Issuer xmlns="urn:oasis:names:tc:SAML:2.0:assertion">urn:default</Issuer></AuthnRequest>"#,
        );
        assert_eq!(request.issuer.as_deref(), Some("urn:default"));
    }

    #[test]
    fn logout_request_synthesizes_response() {
        let options = ParseOptions {
            issuer: "https://idp.sso.tools/acme".into(),
            callback_url: Some("https://sp.example.com/slo".into()),
        };
        let ParsedRequest::Logout(request) = parse_request_xml(LOGOUT, &options).unwrap() else {
            panic!("expected logout");
        };
        assert_eq!(request.id.as_deref(), Some("lo-1"));
        assert_eq!(request.issuer.as_deref(), Some("urn:test:sp"));
        assert_eq!(request.name_id.as_deref(), Some("jane@example.com"));
        assert_eq!(request.response.destination.as_deref(), Some("https://sp.example.com/slo"));
        assert!(request.response.xml.contains("<saml:Issuer>https://idp.sso.tools/acme</saml:Issuer>"));
    }

    #[test]
    fn root_recognized_without_protocol_namespace() {
        let request = login(
            r#"<AuthnRequest ID="req-9"><saml:Issuer xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion">urn:test:sp</saml:Issuer></AuthnRequest>"#,
        );
        assert_eq!(request.id.as_deref(), Some("req-9"));
        assert_eq!(request.issuer.as_deref(), Some("urn:test:sp"));

        let ParsedRequest::Logout(request) = parse_request_xml(
            r#"<LogoutRequest ID="lo-9" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"><saml:Issuer>urn:test:sp</saml:Issuer><saml:NameID>jane@example.com</saml:NameID></LogoutRequest>"#,
            &ParseOptions::default(),
        )
        .unwrap() else {
            panic!("expected logout");
        };
        assert_eq!(request.id.as_deref(), Some("lo-9"));
        assert_eq!(request.name_id.as_deref(), Some("jane@example.com"));

        let other_ns = login(r#"<x:AuthnRequest xmlns:x="urn:example:other" ID="req-10"/>"#);
        assert_eq!(other_ns.id.as_deref(), Some("req-10"));
    }

    #[test]
    fn unsupported_root_is_parse_failure() {
        let err = parse_request_xml(
            r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"/>"#,
            &ParseOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SamlError::ProtocolParse(_)));
    }

    #[test]
    fn broken_xml_is_parse_failure() {
        for xml in ["", "<samlp:AuthnRequest", "<a><b></a>", "not xml at all"] {
            let err = parse_request_xml(xml, &ParseOptions::default()).unwrap_err();
            assert!(matches!(err, SamlError::ProtocolParse(_)), "{xml:?} gave {err:?}");
        }
    }

    #[test]
    fn wire_roundtrip() {
        let wire = HttpRedirectBinding::encode(AUTHN).unwrap();
        let ParsedRequest::Login(request) = parse_request(&wire, &ParseOptions::default()).unwrap() else {
            panic!("expected login");
        };
        assert_eq!(request.issuer.as_deref(), Some("urn:test:sp"));
        assert_eq!(request.id.as_deref(), Some("req-1"));
    }

    #[test]
    fn undecodable_wire_is_parse_failure() {
        let err = parse_request("%%%not-base64%%%", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, SamlError::ProtocolParse(_)));
    }
}

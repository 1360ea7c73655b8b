//! Structured XML output.

use std::borrow::Cow;

use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::Writer;

use crate::error::{SamlError, SamlResult};

/// Thin wrapper over `quick_xml::Writer` producing a UTF-8 string.
///
/// Attribute values and text are escaped by quick-xml, plus character
/// references for the whitespace a parser would otherwise normalize (CR in
/// text, TAB/LF/CR in attribute values). Emitted bytes then parse back to
/// exactly the values that were canonicalized for a digest.
pub struct XmlBuilder {
    writer: Writer<Vec<u8>>,
}

impl Default for XmlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    /// Opens an element.
    pub fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> SamlResult<()> {
        self.writer.write_event(Event::Start(element(name, attributes)))?;
        Ok(())
    }

    /// Closes an element.
    pub fn end(&mut self, name: &str) -> SamlResult<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Writes a self-closing element.
    pub fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> SamlResult<()> {
        self.writer.write_event(Event::Empty(element(name, attributes)))?;
        Ok(())
    }

    /// Writes escaped character data.
    pub fn text(&mut self, text: &str) -> SamlResult<()> {
        let escaped = escape(text).replace('\r', "&#xD;");
        self.writer.write_event(Event::Text(BytesText::from_escaped(escaped)))?;
        Ok(())
    }

    /// Writes `<name attrs>text</name>`.
    pub fn text_element(&mut self, name: &str, attributes: &[(&str, &str)], text: &str) -> SamlResult<()> {
        self.start(name, attributes)?;
        self.text(text)?;
        self.end(name)
    }

    /// Appends an already serialized fragment unchanged.
    ///
    /// Used to embed signed content whose bytes must not be touched.
    pub fn raw(&mut self, fragment: &str) {
        self.writer.get_mut().extend_from_slice(fragment.as_bytes());
    }

    /// Returns the document.
    pub fn finish(self) -> SamlResult<String> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| SamlError::XmlWrite(e.to_string()))
    }
}

fn element<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for (key, value) in attributes {
        let escaped = escape(*value)
            .replace('\t', "&#x9;")
            .replace('\n', "&#xA;")
            .replace('\r', "&#xD;");
        start.push_attribute(Attribute {
            key: QName(key.as_bytes()),
            value: Cow::Owned(escaped.into_bytes()),
        });
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{canonicalize, Element, NamespaceScope};

    #[test]
    fn writes_nested_elements() {
        let mut xml = XmlBuilder::new();
        xml.start("saml:Conditions", &[("NotBefore", "now")]).unwrap();
        xml.text_element("saml:Audience", &[], "urn:a&b").unwrap();
        xml.empty("saml:OneTimeUse", &[]).unwrap();
        xml.end("saml:Conditions").unwrap();

        assert_eq!(
            xml.finish().unwrap(),
            r#"<saml:Conditions NotBefore="now"><saml:Audience>urn:a&amp;b</saml:Audience><saml:OneTimeUse/></saml:Conditions>"#
        );
    }

    #[test]
    fn escapes_attribute_values() {
        let mut xml = XmlBuilder::new();
        xml.empty("x", &[("v", "a\"<b")]).unwrap();
        assert_eq!(xml.finish().unwrap(), r#"<x v="a&quot;&lt;b"/>"#);
    }

    #[test]
    fn whitespace_that_parsers_normalize_is_written_as_references() {
        let mut xml = XmlBuilder::new();
        xml.text_element("v", &[("a", "x\ty\nz\r")], "line\r\nnext").unwrap();
        assert_eq!(
            xml.finish().unwrap(),
            "<v a=\"x&#x9;y&#xA;z&#xD;\">line&#xD;\nnext</v>"
        );
    }

    #[test]
    fn carriage_return_survives_into_canonical_form() {
        let mut xml = XmlBuilder::new();
        xml.text_element("v", &[], "a\rb").unwrap();
        let written = xml.finish().unwrap();

        let parsed = Element::parse(&written).unwrap();
        assert_eq!(parsed.text(), "a\rb");
        assert_eq!(canonicalize(&parsed, &NamespaceScope::new()), written);
    }

    #[test]
    fn raw_fragment_is_verbatim() {
        let mut xml = XmlBuilder::new();
        xml.start("outer", &[]).unwrap();
        xml.raw("<inner a='1'/>");
        xml.end("outer").unwrap();
        assert_eq!(xml.finish().unwrap(), "<outer><inner a='1'/></outer>");
    }
}

//! Owned element tree.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::writer::XmlBuilder;
use crate::error::{SamlError, SamlResult};

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Nested element.
    Element(Element),
    /// Unescaped character data.
    Text(String),
}

/// An XML element with qualified names kept exactly as written.
///
/// Namespace declarations stay in `attributes`; resolution happens in
/// [`super::NamespaceScope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name, e.g. `saml:Assertion`.
    pub name: String,
    /// Attributes in document order, values unescaped.
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an element without attributes or children.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Appends a child element.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Appends character data.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Parses a document and returns its root element.
    ///
    /// Comments, processing instructions and the XML declaration are dropped.
    pub fn parse(xml: &str) -> SamlResult<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Self> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| SamlError::XmlParse("unexpected closing tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(text.unescape()?.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8(data.into_inner().into_owned())
                            .map_err(|e| SamlError::XmlParse(e.to_string()))?;
                        parent.children.push(Node::Text(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(SamlError::XmlParse("unclosed element".to_string()));
        }
        root.ok_or_else(|| SamlError::XmlParse("document has no root element".to_string()))
    }

    fn from_start(start: &BytesStart<'_>) -> SamlResult<Self> {
        let name = utf8(start.name().as_ref())?;
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = utf8(attribute.key.as_ref())?;
            let value = attribute.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    /// Namespace prefix, if the name is qualified.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Name without prefix.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name.split_once(':').map_or(self.name.as_str(), |(_, local)| local)
    }

    /// Looks up an attribute by qualified name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First child element with the given local name.
    #[must_use]
    pub fn child(&self, local_name: &str) -> Option<&Self> {
        self.child_elements().find(|child| child.local_name() == local_name)
    }

    /// Index in `children` of the first child element with the given local name.
    #[must_use]
    pub fn child_position(&self, local_name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, Node::Element(child) if child.local_name() == local_name))
    }

    /// Concatenated character data of this element and its descendants.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Path of child indices to the first element, in document order, with
    /// the given local name. The empty path is `self`.
    #[must_use]
    pub fn locate(&self, local_name: &str) -> Option<Vec<usize>> {
        if self.local_name() == local_name {
            return Some(Vec::new());
        }
        for (index, node) in self.children.iter().enumerate() {
            if let Node::Element(child) = node {
                if let Some(mut path) = child.locate(local_name) {
                    path.insert(0, index);
                    return Some(path);
                }
            }
        }
        None
    }

    /// Element at a path returned by [`Self::locate`].
    #[must_use]
    pub fn at_path(&self, path: &[usize]) -> Option<&Self> {
        match path.split_first() {
            None => Some(self),
            Some((index, rest)) => match self.children.get(*index)? {
                Node::Element(child) => child.at_path(rest),
                Node::Text(_) => None,
            },
        }
    }

    /// Mutable element at a path returned by [`Self::locate`].
    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Self> {
        match path.split_first() {
            None => Some(self),
            Some((index, rest)) => match self.children.get_mut(*index)? {
                Node::Element(child) => child.at_path_mut(rest),
                Node::Text(_) => None,
            },
        }
    }

    /// Removes whitespace-only text nodes throughout the tree.
    pub fn strip_whitespace(&mut self) {
        self.children.retain(|node| match node {
            Node::Text(text) => !text.trim().is_empty(),
            Node::Element(_) => true,
        });
        for node in &mut self.children {
            if let Node::Element(child) = node {
                child.strip_whitespace();
            }
        }
    }

    /// Serializes the tree.
    pub fn to_xml(&self) -> SamlResult<String> {
        let mut xml = XmlBuilder::new();
        write_element(self, &mut xml)?;
        xml.finish()
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> SamlResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(SamlError::XmlParse("multiple root elements".to_string()))
    }
}

fn utf8(bytes: &[u8]) -> SamlResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| SamlError::XmlParse(e.to_string()))
}

fn collect_text(element: &Element, out: &mut String) {
    for node in &element.children {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(child) => collect_text(child, out),
        }
    }
}

fn write_element(element: &Element, xml: &mut XmlBuilder) -> SamlResult<()> {
    let attributes: Vec<(&str, &str)> = element
        .attributes
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();

    if element.children.is_empty() {
        return xml.empty(&element.name, &attributes);
    }

    xml.start(&element.name, &attributes)?;
    for node in &element.children {
        match node {
            Node::Element(child) => write_element(child, xml)?,
            Node::Text(text) => xml.text(text)?,
        }
    }
    xml.end(&element.name)
}

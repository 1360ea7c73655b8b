//! Exclusive XML Canonicalization 1.0 (without comments).
//!
//! Output rules:
//!
//! - a namespace declaration is emitted on an element only when the element
//!   or one of its attributes visibly uses the prefix and no output ancestor
//!   already rendered the same binding
//! - declarations are sorted by prefix, attributes by (namespace URI, local name)
//! - empty elements become start/end pairs
//! - text escapes `& < > CR`, attribute values escape `& < " TAB LF CR`

use std::collections::BTreeSet;

use super::tree::{Element, Node};

const XML_PREFIX: &str = "xml";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// In-scope namespace bindings. The default namespace uses the empty prefix.
#[derive(Debug, Clone, Default)]
pub struct NamespaceScope {
    bindings: Vec<(String, String)>,
}

impl NamespaceScope {
    /// An empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings in effect at `path` inside `root`, excluding the declarations
    /// on the target element itself.
    #[must_use]
    pub fn along(root: &Element, path: &[usize]) -> Self {
        let mut scope = Self::new();
        let mut current = root;
        for index in path {
            scope.declare_from(current);
            match current.children.get(*index) {
                Some(Node::Element(child)) => current = child,
                _ => break,
            }
        }
        scope
    }

    /// Adds a binding.
    pub fn bind(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.bindings.push((prefix.into(), uri.into()));
    }

    /// Adds every `xmlns` / `xmlns:p` declaration found on `element`.
    pub fn declare_from(&mut self, element: &Element) {
        for (name, value) in &element.attributes {
            if let Some(prefix) = declared_prefix(name) {
                self.bind(prefix, value.clone());
            }
        }
    }

    /// Resolves a prefix; the latest binding wins.
    #[must_use]
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        if prefix == XML_PREFIX {
            return Some(XML_NS);
        }
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == prefix)
            .map(|(_, uri)| uri.as_str())
    }
}

/// Canonicalizes `element` as the apex of a document subset.
///
/// `scope` holds the bindings inherited from ancestors that are not part of
/// the output; they are only used to resolve prefixes.
#[must_use]
pub fn canonicalize(element: &Element, scope: &NamespaceScope) -> String {
    let mut out = String::new();
    write_element(element, scope, &NamespaceScope::new(), &mut out);
    out
}

fn write_element(element: &Element, inherited: &NamespaceScope, rendered: &NamespaceScope, out: &mut String) {
    let mut scope = inherited.clone();
    scope.declare_from(element);

    let mut utilized = BTreeSet::new();
    utilized.insert(element.prefix().unwrap_or(""));
    for (name, _) in &element.attributes {
        if declared_prefix(name).is_some() {
            continue;
        }
        if let Some((prefix, _)) = name.split_once(':') {
            if prefix != XML_PREFIX {
                utilized.insert(prefix);
            }
        }
    }

    let mut now_rendered = rendered.clone();
    out.push('<');
    out.push_str(&element.name);

    for prefix in utilized {
        let uri = scope.resolve(prefix).unwrap_or("");
        let already = rendered.resolve(prefix);
        let needed = if prefix.is_empty() {
            already.unwrap_or("") != uri
        } else {
            already != Some(uri)
        };
        if !needed {
            continue;
        }
        if prefix.is_empty() {
            out.push_str(" xmlns=\"");
        } else {
            out.push_str(" xmlns:");
            out.push_str(prefix);
            out.push_str("=\"");
        }
        escape_attribute(uri, out);
        out.push('"');
        now_rendered.bind(prefix, uri);
    }

    let mut attributes: Vec<(&str, &str, &str, &str)> = element
        .attributes
        .iter()
        .filter(|(name, _)| declared_prefix(name).is_none())
        .map(|(name, value)| {
            let (uri, local) = match name.split_once(':') {
                Some((prefix, local)) => (scope.resolve(prefix).unwrap_or(""), local),
                None => ("", name.as_str()),
            };
            (uri, local, name.as_str(), value.as_str())
        })
        .collect();
    attributes.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    for (_, _, name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attribute(value, out);
        out.push('"');
    }
    out.push('>');

    for node in &element.children {
        match node {
            Node::Element(child) => write_element(child, &scope, &now_rendered, out),
            Node::Text(text) => escape_text(text, out),
        }
    }

    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

/// Prefix declared by an attribute name, `""` for the default namespace.
fn declared_prefix(name: &str) -> Option<&str> {
    if name == "xmlns" {
        Some("")
    } else {
        name.strip_prefix("xmlns:")
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}

//! XML plumbing for SAML messages.
//!
//! - [`XmlBuilder`] writes documents through `quick_xml::Writer`
//! - [`Element`] is a small owned tree used wherever a document has to be
//!   edited after it was written (signature insertion) or re-read (validation)
//! - [`canonicalize`] implements Exclusive XML Canonicalization 1.0 without
//!   comments over that tree

mod c14n;
mod tree;
mod writer;

pub use c14n::{canonicalize, NamespaceScope};
pub use tree::{Element, Node};
pub use writer::XmlBuilder;

//! Node type definitions.
//!
//! `NodeKind` is the tagged variant carried by every arena slot. Navigation
//! links (parent, children, siblings) and source positions live in
//! `NodeData`, not here.

use super::Attribute;

/// The kind of a markup node and its associated data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node; there is exactly one per `Document`.
    Document,

    /// An element node, e.g., `<File Source="a.txt">`.
    Element {
        /// The element's local name.
        name: String,
        /// Namespace prefix as written in the source (e.g., `"util"`).
        prefix: Option<String>,
        /// Namespace URI the element resolves to, if any.
        namespace: Option<String>,
        /// Attributes in source order, namespace declarations included.
        attributes: Vec<Attribute>,
    },

    /// Character data. Whitespace-only runs between elements are kept as
    /// text nodes until the formatter decides how to lay them out.
    Text {
        /// The decoded text content.
        content: String,
    },

    /// A CDATA section, e.g., `<![CDATA[1<2]]>`.
    CData {
        /// The section payload, unescaped.
        content: String,
    },

    /// A comment, e.g., `<!-- ... -->`.
    Comment {
        /// The comment text without delimiters.
        content: String,
    },

    /// A processing instruction, e.g., `<?define Version = "1.0"?>`.
    ProcessingInstruction {
        /// The PI target (e.g., `"define"`, `"include"`).
        target: String,
        /// Everything after the target, verbatim.
        data: Option<String>,
    },

    /// A reference to an entity the loader does not know how to expand.
    EntityRef {
        /// The entity name (without `&` and `;`).
        name: String,
    },

    /// A document type declaration, kept verbatim.
    DocumentType {
        /// The full `<!DOCTYPE ...>` text.
        content: String,
    },
}

impl NodeKind {
    /// Returns `true` for text nodes that contain only XML whitespace.
    #[must_use]
    pub fn is_whitespace_text(&self) -> bool {
        matches!(self, NodeKind::Text { content } if content.chars().all(is_xml_whitespace))
    }

    /// Returns `true` for element nodes.
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, NodeKind::Element { .. })
    }
}

/// XML whitespace per XML 1.0 §2.3 `[3]`.
pub(crate) fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

//! Arena-based document tree.
//!
//! All nodes live in a contiguous `Vec<NodeData>` owned by the `Document`
//! and are referenced by `NodeId`, a newtype over `NonZeroU32`. Children are
//! owned exclusively through the arena; the `parent` link is a plain index
//! used for lookup and diagnostics, never for ownership.
//!
//! Every node remembers where it started in the source, and every element
//! remembers the byte span of its full markup so that pass-through subtrees
//! can be emitted exactly as they were written.

pub(crate) mod node;

pub use node::NodeKind;
pub(crate) use node::is_xml_whitespace;

use std::num::NonZeroU32;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::error::{ParseError, SourceLocation};

/// A typed index into the document's node arena.
///
/// `Option<NodeId>` has the same size as `NodeId` (niche optimization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw arena index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// Storage for a single node in the document arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Parent node. The document node has none.
    pub parent: Option<NodeId>,
    /// First child node.
    pub first_child: Option<NodeId>,
    /// Last child node (for O(1) append).
    pub last_child: Option<NodeId>,
    /// Next sibling.
    pub next_sibling: Option<NodeId>,
    /// Previous sibling.
    pub prev_sibling: Option<NodeId>,
    /// Where the node starts in the source text.
    pub location: SourceLocation,
    /// Byte range of the node's complete markup in the source text.
    /// Only recorded for elements produced by the parser.
    pub span: Option<Range<usize>>,
}

impl NodeData {
    fn new(kind: NodeKind, location: SourceLocation) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
            location,
            span: None,
        }
    }
}

/// An attribute on an element, namespace declarations included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The local part of the attribute name.
    pub name: String,
    /// The attribute value, with references expanded.
    pub value: String,
    /// Namespace prefix as written (`"xmlns"` for `xmlns:util`).
    pub prefix: Option<String>,
    /// Namespace URI the prefix resolves to, if any.
    pub namespace: Option<String>,
}

impl Attribute {
    /// Creates an unprefixed attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            prefix: None,
            namespace: None,
        }
    }

    /// Returns `true` for `xmlns="..."` and `xmlns:p="..."`.
    #[must_use]
    pub fn is_namespace_declaration(&self) -> bool {
        match self.prefix.as_deref() {
            Some(prefix) => prefix == "xmlns",
            None => self.name == "xmlns",
        }
    }

    /// For a namespace declaration, the prefix it binds (`None` for the
    /// default namespace). Returns `None` for ordinary attributes too; check
    /// [`is_namespace_declaration`](Self::is_namespace_declaration) first.
    #[must_use]
    pub fn declared_prefix(&self) -> Option<&str> {
        if self.prefix.as_deref() == Some("xmlns") {
            Some(&self.name)
        } else {
            None
        }
    }

    /// The attribute name as written, `prefix:name` or `name`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// The `<?xml ...?>` declaration of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Version as written (e.g., `"1.0"`).
    pub version: String,
    /// Encoding label, if the declaration names one.
    pub encoding: Option<String>,
    /// Standalone flag, if present.
    pub standalone: Option<bool>,
}

/// A parsed markup document.
///
/// The `Document` owns all nodes in an arena. Navigation goes through
/// `&Document`, mutation through `&mut Document`.
///
/// # Examples
///
/// ```
/// use wixcop::Document;
///
/// let doc = Document::parse_str("<Wix><Fragment/></Wix>").unwrap();
/// let root = doc.root_element().unwrap();
/// assert_eq!(doc.node_name(root), Some("Wix"));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    /// The node arena. Index 0 is unused (placeholder for `NonZeroU32`).
    nodes: Vec<NodeData>,
    /// The document node id (not the root element).
    root: NodeId,
    /// The XML declaration, if the source had one.
    pub declaration: Option<Declaration>,
    /// The text the document was parsed from.
    source: String,
    /// Identity of the file the document came from, for diagnostics.
    path: Option<PathBuf>,
}

impl Document {
    /// Creates a new empty document containing only the document node.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        // Index 0: placeholder (NodeId uses NonZeroU32)
        nodes.push(NodeData::new(NodeKind::Document, SourceLocation::default()));
        nodes.push(NodeData::new(NodeKind::Document, SourceLocation::default()));
        Self {
            nodes,
            root: NodeId::from_index(1),
            declaration: None,
            source: String::new(),
            path: None,
        }
    }

    /// Parses markup text into a `Document`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input is not well-formed.
    pub fn parse_str(input: &str) -> Result<Self, ParseError> {
        let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
        crate::parser::parse_str(input)
    }

    /// Parses raw file bytes, detecting the encoding from the byte order
    /// mark or the declaration. See [`crate::encoding::decode`].
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the bytes cannot be decoded or the text is
    /// not well-formed.
    pub fn parse_bytes(input: &[u8]) -> Result<Self, ParseError> {
        let text = crate::encoding::decode(input)
            .map_err(|e| ParseError::new(e.message, SourceLocation::default()))?;
        crate::parser::parse_str(&text)
    }

    /// Attaches the identity of the source file, used in diagnostics.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// The source file this document was loaded from, if known.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn set_source(&mut self, source: &str) {
        self.source = source.to_string();
    }

    /// Returns the document node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the single top-level element, if any.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| self.node(id).kind.is_element())
    }

    /// Returns the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the local name of an element or the target of a PI.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. }
            | NodeKind::ProcessingInstruction { target: name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the namespace prefix an element was written with.
    #[must_use]
    pub fn node_prefix(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { prefix, .. } => prefix.as_deref(),
            _ => None,
        }
    }

    /// Returns the namespace URI of an element node, if any.
    #[must_use]
    pub fn node_namespace(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn set_node_namespace(&mut self, id: NodeId, uri: Option<String>) {
        if let NodeKind::Element { namespace, .. } = &mut self.node_mut(id).kind {
            *namespace = uri;
        }
    }

    /// Returns the text of a text, comment, or CDATA node (or PI data).
    #[must_use]
    pub fn node_text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text { content }
            | NodeKind::Comment { content }
            | NodeKind::CData { content } => Some(content),
            NodeKind::ProcessingInstruction { data, .. } => data.as_deref(),
            _ => None,
        }
    }

    /// Replaces the payload of a text or CDATA node.
    pub(crate) fn set_node_text(&mut self, id: NodeId, text: String) {
        match &mut self.node_mut(id).kind {
            NodeKind::Text { content } | NodeKind::CData { content } => *content = text,
            _ => {}
        }
    }

    /// Returns where the node starts in the source.
    #[must_use]
    pub fn location(&self, id: NodeId) -> SourceLocation {
        self.node(id).location
    }

    /// Returns the exact source markup of a parsed element.
    #[must_use]
    pub fn source_text(&self, id: NodeId) -> Option<&str> {
        let span = self.node(id).span.clone()?;
        self.source.get(span)
    }

    /// Returns the concatenated text content of a node and its descendants.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text(id, &mut result);
        result
    }

    fn collect_text(&self, id: NodeId, buf: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text { content } | NodeKind::CData { content } => {
                buf.push_str(content);
            }
            _ => {
                for child in self.children(id) {
                    self.collect_text(child, buf);
                }
            }
        }
    }

    // --- Attributes ---

    /// Returns the attributes of an element node, or an empty slice.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub(crate) fn attributes_mut(&mut self, id: NodeId) -> Option<&mut Vec<Attribute>> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    /// Returns the value of an unprefixed attribute.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.prefix.is_none() && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Position of an unprefixed attribute in the element's attribute list.
    #[must_use]
    pub fn attribute_index(&self, id: NodeId, name: &str) -> Option<usize> {
        self.attributes(id)
            .iter()
            .position(|a| a.prefix.is_none() && a.name == name)
    }

    /// Inserts an attribute at `index`, shifting later attributes right.
    pub fn insert_attribute(&mut self, id: NodeId, index: usize, attribute: Attribute) {
        if let Some(attributes) = self.attributes_mut(id) {
            let index = index.min(attributes.len());
            attributes.insert(index, attribute);
        }
    }

    /// Removes an unprefixed attribute, returning it if it existed.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<Attribute> {
        let index = self.attribute_index(id, name)?;
        self.attributes_mut(id).map(|attributes| attributes.remove(index))
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns an iterator over all descendants of a node (depth-first).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    /// Collects the elements under the document node in document
    /// (pre-)order. Subtrees of elements for which `prune` returns `true`
    /// are skipped entirely, the pruned element included.
    pub fn elements_in_order(&self, prune: impl Fn(&Self, NodeId) -> bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(self.root).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            if !self.node(id).kind.is_element() || prune(self, id) {
                continue;
            }
            out.push(id);
            let first = stack.len();
            stack.extend(self.children(id));
            stack[first..].reverse();
        }
        out
    }

    // --- Mutation ---

    /// Allocates a new node in the arena and returns its `NodeId`.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        self.create_node_at(kind, SourceLocation::default())
    }

    /// Allocates a new node that remembers its source location.
    pub fn create_node_at(&mut self, kind: NodeKind, location: SourceLocation) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind, location));
        NodeId::from_index(index)
    }

    /// Appends a child node to the end of a parent's child list.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `child` already has a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(
            self.node(child).parent.is_none(),
            "child already has a parent; detach it first"
        );

        self.node_mut(child).parent = Some(parent);

        if let Some(last) = self.node(parent).last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
            self.node_mut(parent).last_child = Some(child);
        } else {
            self.node_mut(parent).first_child = Some(child);
            self.node_mut(parent).last_child = Some(child);
        }
    }

    /// Detaches a node from its parent. The node stays allocated in the
    /// arena but is unreachable from the root.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };

        let prev = self.node(id).prev_sibling;
        let next = self.node(id).next_sibling;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }

        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        let node = self.node_mut(id);
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Detaches every child of `id`.
    pub fn remove_children(&mut self, id: NodeId) {
        while let Some(child) = self.first_child(id) {
            self.detach(child);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

/// Depth-first iterator over all descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        if let Some(child) = self.doc.first_child(current) {
            self.next = Some(child);
            return Some(current);
        }

        if let Some(sibling) = self.doc.next_sibling(current) {
            self.next = Some(sibling);
            return Some(current);
        }

        let mut ancestor = self.doc.parent(current);
        while let Some(anc) = ancestor {
            if anc == self.root {
                break;
            }
            if let Some(sibling) = self.doc.next_sibling(anc) {
                self.next = Some(sibling);
                return Some(current);
            }
            ancestor = self.doc.parent(anc);
        }

        self.next = None;
        Some(current)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn element(name: &str, attributes: Vec<Attribute>) -> NodeKind {
        NodeKind::Element {
            name: name.to_string(),
            prefix: None,
            namespace: None,
            attributes,
        }
    }

    fn text(content: &str) -> NodeKind {
        NodeKind::Text {
            content: content.to_string(),
        }
    }

    #[test]
    fn test_new_document_has_root() {
        let doc = Document::new();
        assert!(matches!(doc.node(doc.root()).kind, NodeKind::Document));
        assert_eq!(doc.first_child(doc.root()), None);
        assert!(doc.declaration.is_none());
    }

    #[test]
    fn test_create_and_append_element() {
        let mut doc = Document::new();
        let root = doc.root();
        let wix = doc.create_node(element("Wix", vec![]));
        doc.append_child(root, wix);

        assert_eq!(doc.first_child(root), Some(wix));
        assert_eq!(doc.last_child(root), Some(wix));
        assert_eq!(doc.parent(wix), Some(root));
        assert_eq!(doc.node_name(wix), Some("Wix"));
        assert_eq!(doc.root_element(), Some(wix));
    }

    #[test]
    fn test_sibling_links() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_node(text("A"));
        let b = doc.create_node(text("B"));
        let c = doc.create_node(text("C"));
        doc.append_child(root, a);
        doc.append_child(root, b);
        doc.append_child(root, c);

        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.next_sibling(c), None);
        assert_eq!(doc.prev_sibling(c), Some(b));
        assert_eq!(doc.prev_sibling(a), None);
        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![a, b, c]);
    }

    #[test]
    fn test_detach_middle_and_ends() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_node(text("A"));
        let b = doc.create_node(text("B"));
        let c = doc.create_node(text("C"));
        doc.append_child(root, a);
        doc.append_child(root, b);
        doc.append_child(root, c);

        doc.detach(b);
        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(doc.parent(b), None);

        doc.detach(a);
        assert_eq!(doc.first_child(root), Some(c));
        assert_eq!(doc.prev_sibling(c), None);

        doc.detach(c);
        assert_eq!(doc.first_child(root), None);
        assert_eq!(doc.last_child(root), None);
    }

    #[test]
    fn test_remove_children() {
        let mut doc = Document::new();
        let root = doc.root();
        let property = doc.create_node(element("Property", vec![]));
        doc.append_child(root, property);
        let ws = doc.create_node(text("\n    "));
        doc.append_child(property, ws);

        doc.remove_children(property);
        assert_eq!(doc.first_child(property), None);
    }

    #[test]
    fn test_parent_and_descendants() {
        let mut doc = Document::new();
        let root = doc.root();
        let wix = doc.create_node(element("Wix", vec![]));
        let fragment = doc.create_node(element("Fragment", vec![]));
        let property = doc.create_node(element("Property", vec![]));
        doc.append_child(root, wix);
        doc.append_child(wix, fragment);
        doc.append_child(fragment, property);

        assert_eq!(doc.parent(property), Some(fragment));
        assert_eq!(
            doc.descendants(root).collect::<Vec<_>>(),
            vec![wix, fragment, property]
        );
    }

    #[test]
    fn test_descendants_stops_at_subtree_root() {
        let mut doc = Document::new();
        let root = doc.root();
        let wix = doc.create_node(element("Wix", vec![]));
        let first = doc.create_node(element("Fragment", vec![]));
        let inner = doc.create_node(element("Property", vec![]));
        let second = doc.create_node(element("Fragment", vec![]));
        doc.append_child(root, wix);
        doc.append_child(wix, first);
        doc.append_child(first, inner);
        doc.append_child(wix, second);

        assert_eq!(doc.descendants(first).collect::<Vec<_>>(), vec![inner]);
    }

    #[test]
    fn test_elements_in_order_prunes_subtrees() {
        let doc = Document::parse_str(
            "<Wix><Fragment><CustomTable><Row/></CustomTable><Property/></Fragment></Wix>",
        )
        .unwrap();
        let names: Vec<&str> = doc
            .elements_in_order(|d, id| d.node_name(id) == Some("CustomTable"))
            .into_iter()
            .filter_map(|id| doc.node_name(id))
            .collect();
        assert_eq!(names, vec!["Wix", "Fragment", "Property"]);
    }

    #[test]
    fn test_attribute_editing_preserves_order() {
        let mut doc = Document::new();
        let root = doc.root();
        let file = doc.create_node(element(
            "File",
            vec![Attribute::new("Source", "a.txt"), Attribute::new("KeyPath", "yes")],
        ));
        doc.append_child(root, file);

        assert_eq!(doc.attribute(file, "Source"), Some("a.txt"));
        assert_eq!(doc.attribute_index(file, "Source"), Some(0));

        doc.insert_attribute(file, 0, Attribute::new("Id", "a.txt"));
        let names: Vec<&str> = doc.attributes(file).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Source", "KeyPath"]);

        let removed = doc.remove_attribute(file, "Source").unwrap();
        assert_eq!(removed.value, "a.txt");
        assert_eq!(doc.attribute(file, "Source"), None);
        assert_eq!(doc.remove_attribute(file, "Source"), None);
    }

    #[test]
    fn test_attribute_lookup_ignores_prefixed() {
        let mut doc = Document::new();
        let wix = doc.create_node(element(
            "Wix",
            vec![Attribute {
                name: "util".to_string(),
                value: "urn:util".to_string(),
                prefix: Some("xmlns".to_string()),
                namespace: None,
            }],
        ));
        assert_eq!(doc.attribute(wix, "util"), None);
        let decl = &doc.attributes(wix)[0];
        assert!(decl.is_namespace_declaration());
        assert_eq!(decl.declared_prefix(), Some("util"));
        assert_eq!(decl.qualified_name(), "xmlns:util");
    }

    #[test]
    fn test_default_namespace_declaration() {
        let attr = Attribute::new("xmlns", "urn:x");
        assert!(attr.is_namespace_declaration());
        assert_eq!(attr.declared_prefix(), None);
        assert!(!Attribute::new("Id", "x").is_namespace_declaration());
    }

    #[test]
    fn test_text_content_and_node_text() {
        let mut doc = Document::new();
        let root = doc.root();
        let condition = doc.create_node(element("Condition", vec![]));
        let t = doc.create_node(text("VersionNT"));
        let c = doc.create_node(NodeKind::CData {
            content: " >= 600".to_string(),
        });
        doc.append_child(root, condition);
        doc.append_child(condition, t);
        doc.append_child(condition, c);

        assert_eq!(doc.text_content(condition), "VersionNT >= 600");
        assert_eq!(doc.node_text(t), Some("VersionNT"));
        assert_eq!(doc.node_text(condition), None);

        doc.set_node_text(c, ">=600".to_string());
        assert_eq!(doc.node_text(c), Some(">=600"));
    }

    #[test]
    fn test_whitespace_text_detection() {
        assert!(text("\n    ").is_whitespace_text());
        assert!(text("").is_whitespace_text());
        assert!(!text(" x ").is_whitespace_text());
        assert!(!element("Wix", vec![]).is_whitespace_text());
    }

    #[test]
    fn test_source_text_of_parsed_element() {
        let input = "<Wix>\n  <Custom a='1' >x</Custom>\n</Wix>";
        let doc = Document::parse_str(input).unwrap();
        let wix = doc.root_element().unwrap();
        let custom = doc.children(wix).find(|&id| doc.node(id).kind.is_element()).unwrap();
        assert_eq!(doc.source_text(custom), Some("<Custom a='1' >x</Custom>"));
        assert_eq!(doc.location(custom).line, 2);
        assert_eq!(doc.location(custom).column, 3);
    }

    #[test]
    fn test_with_path() {
        let doc = Document::new().with_path("Product.wxs");
        assert_eq!(doc.path(), Some(Path::new("Product.wxs")));
    }
}

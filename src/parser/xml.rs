//! Recursive descent tree builder.
//!
//! Builds a [`Document`] from well-formed markup, keeping everything the
//! formatter needs to reproduce the file: whitespace runs between elements,
//! comments, CDATA sections, processing instructions, unexpanded entity
//! references, and the byte span of every element.

use crate::error::{ParseError, SourceLocation};
use crate::tree::{Attribute, Declaration, Document, NodeId, NodeKind};

use super::input::{
    parse_cdata_content, parse_comment_content, parse_doctype_raw, parse_pi_content,
    parse_xml_decl, split_name, split_owned_name, NamespaceResolver, ParserInput, Reference,
};
use super::ParseOptions;

/// The core tree-building parser.
pub(crate) struct XmlParser<'a> {
    /// Low-level input state.
    input: ParserInput<'a>,
    /// The source text, retained by the finished document.
    source: &'a str,
    /// The document being built.
    doc: Document,
    /// Parser options.
    options: ParseOptions,
    /// Namespace scope stack.
    ns: NamespaceResolver,
}

impl<'a> XmlParser<'a> {
    pub fn new(input: &'a str, options: &ParseOptions) -> Self {
        let mut pi = ParserInput::new(input);
        pi.set_max_depth(options.max_depth);
        pi.set_max_name_length(options.max_name_length);
        pi.set_max_references(options.max_references);

        Self {
            input: pi,
            source: input,
            doc: Document::new(),
            options: options.clone(),
            ns: NamespaceResolver::new(),
        }
    }

    /// Parses the entire document.
    pub fn parse(mut self) -> Result<Document, ParseError> {
        if self.looking_at_xml_decl() {
            let decl = parse_xml_decl(&mut self.input)?;
            self.doc.declaration = Some(Declaration {
                version: decl.version,
                encoding: decl.encoding,
                standalone: decl.standalone,
            });
        } else if self.input.skip_whitespace() && self.looking_at_xml_decl() {
            return Err(self
                .input
                .fatal("XML declaration must be at the start of the document"));
        }

        let root = self.doc.root();
        self.parse_misc(root)?;

        if self.input.looking_at(b"<!DOCTYPE") {
            let location = self.input.location();
            let content = parse_doctype_raw(&mut self.input)?;
            let id = self
                .doc
                .create_node_at(NodeKind::DocumentType { content }, location);
            self.doc.append_child(root, id);
            self.parse_misc(root)?;
        }

        if self.input.peek() == Some(b'<')
            && self.input.peek_at(1).is_some_and(|b| b != b'!' && b != b'?')
        {
            self.parse_element(root)?;
        } else {
            return Err(self.input.fatal("missing root element"));
        }

        self.parse_misc(root)?;
        if !self.input.at_end() {
            return Err(self.input.fatal("content after document element"));
        }

        self.doc.set_source(self.source);
        Ok(self.doc)
    }

    fn looking_at_xml_decl(&self) -> bool {
        self.input.looking_at(b"<?xml ")
            || self.input.looking_at(b"<?xml\t")
            || self.input.looking_at(b"<?xml\r")
            || self.input.looking_at(b"<?xml\n")
    }

    // --- Misc (comments, PIs, whitespace) ---
    // Whitespace outside the root element carries no layout the formatter
    // keeps, so it is dropped here.

    fn parse_misc(&mut self, parent: NodeId) -> Result<(), ParseError> {
        loop {
            self.input.skip_whitespace();
            if self.input.looking_at(b"<!--") {
                self.parse_comment(parent)?;
            } else if self.input.looking_at(b"<?") {
                self.parse_processing_instruction(parent)?;
            } else {
                break;
            }
        }
        Ok(())
    }

    // --- Elements ---
    // See XML 1.0 §3.1: [39] element

    fn parse_element(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        let location = self.input.location();
        let start = self.input.pos();
        self.input.increment_depth()?;
        self.input.expect_byte(b'<')?;
        let name = self.input.parse_name()?;
        let mut attributes: Vec<Attribute> = Vec::new();

        loop {
            let had_ws = self.input.skip_whitespace();
            if self.input.peek() == Some(b'>') || self.input.looking_at(b"/>") {
                break;
            }
            if !had_ws {
                return Err(self.input.fatal("whitespace required between attributes"));
            }
            let attr_location = self.input.location();
            let attr = self.parse_attribute()?;
            if attributes
                .iter()
                .any(|a| a.name == attr.name && a.prefix == attr.prefix)
            {
                return Err(ParseError::new(
                    format!("duplicate attribute: '{}'", attr.qualified_name()),
                    attr_location,
                ));
            }
            if attributes.len() >= self.options.max_attributes as usize {
                return Err(ParseError::new(
                    format!(
                        "too many attributes on <{name}> (maximum {})",
                        self.options.max_attributes
                    ),
                    attr_location,
                ));
            }
            attributes.push(attr);
        }

        // --- Namespace processing (Namespaces in XML 1.0 §3) ---

        let has_ns_decls = attributes.iter().any(Attribute::is_namespace_declaration);
        if has_ns_decls {
            self.ns.push_scope();
            for attr in &attributes {
                if !attr.is_namespace_declaration() {
                    continue;
                }
                match attr.declared_prefix() {
                    Some("") => {
                        return Err(ParseError::new("namespace prefix must not be empty", location));
                    }
                    Some(prefix) => {
                        if attr.value.is_empty() {
                            return Err(ParseError::new(
                                format!("namespace prefix '{prefix}' cannot be undeclared"),
                                location,
                            ));
                        }
                        self.ns.bind(Some(prefix.to_string()), attr.value.clone());
                    }
                    None => self.ns.bind(None, attr.value.clone()),
                }
            }
        }

        let (prefix, _) = split_name(&name);
        let elem_ns = self.ns.resolve(prefix).map(String::from);
        if let Some(pfx) = prefix {
            if elem_ns.is_none() {
                return Err(ParseError::new(
                    format!("unbound namespace prefix '{pfx}'"),
                    location,
                ));
            }
        }

        // Unprefixed attributes do not inherit the default namespace.
        for attr in &mut attributes {
            let Some(pfx) = attr.prefix.as_deref() else {
                continue;
            };
            if pfx == "xmlns" {
                continue;
            }
            let resolved = self.ns.resolve(Some(pfx)).map(String::from);
            if resolved.is_none() {
                return Err(ParseError::new(
                    format!("unbound namespace prefix '{pfx}' on attribute"),
                    location,
                ));
            }
            attr.namespace = resolved;
        }

        let (elem_prefix, elem_local) = split_owned_name(name);
        let elem_id = self.doc.create_node_at(
            NodeKind::Element {
                name: elem_local,
                prefix: elem_prefix,
                namespace: elem_ns,
                attributes,
            },
            location,
        );
        self.doc.append_child(parent, elem_id);

        if self.input.looking_at(b"/>") {
            self.input.advance(2);
        } else {
            self.input.expect_byte(b'>')?;
            self.parse_content(elem_id)?;

            self.input.expect_str(b"</")?;
            let end_name = self.input.parse_name()?;
            let expected = match &self.doc.node(elem_id).kind {
                NodeKind::Element {
                    name,
                    prefix: Some(pfx),
                    ..
                } => format!("{pfx}:{name}"),
                NodeKind::Element { name, .. } => name.clone(),
                _ => String::new(),
            };
            if end_name != expected {
                return Err(self.input.fatal(format!(
                    "mismatched end tag: expected </{expected}>, found </{end_name}>"
                )));
            }
            self.input.skip_whitespace();
            self.input.expect_byte(b'>')?;
        }

        if has_ns_decls {
            self.ns.pop_scope();
        }
        self.input.decrement_depth();
        self.doc.node_mut(elem_id).span = Some(start..self.input.pos());

        Ok(elem_id)
    }

    // --- Content ---
    // See XML 1.0 §3.1: [43] content

    fn parse_content(&mut self, parent: NodeId) -> Result<(), ParseError> {
        loop {
            if self.input.at_end() {
                return Err(self
                    .input
                    .fatal("unexpected end of input in element content"));
            }

            if self.input.looking_at(b"</") {
                break;
            }

            if self.input.looking_at(b"<![CDATA[") {
                self.parse_cdata(parent)?;
            } else if self.input.looking_at(b"<!--") {
                self.parse_comment(parent)?;
            } else if self.input.looking_at(b"<?") {
                self.parse_processing_instruction(parent)?;
            } else if self.input.peek() == Some(b'<') {
                self.parse_element(parent)?;
            } else {
                self.parse_char_data(parent)?;
            }
        }
        Ok(())
    }

    // --- Character Data ---
    // See XML 1.0 §2.4: [14] CharData

    fn parse_char_data(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let mut location = self.input.location();
        let mut text = String::new();

        while let Some(b) = self.input.peek() {
            match b {
                b'<' => break,
                b'&' => {
                    let ref_location = self.input.location();
                    match self.input.parse_reference()? {
                        Reference::Text(expanded) => text.push_str(&expanded),
                        Reference::Unknown(name) => {
                            self.flush_text(parent, &mut text, location);
                            let id = self
                                .doc
                                .create_node_at(NodeKind::EntityRef { name }, ref_location);
                            self.doc.append_child(parent, id);
                            location = self.input.location();
                        }
                    }
                }
                b']' if self.input.looking_at(b"]]>") => {
                    return Err(self.input.fatal("']]>' not allowed in character data"));
                }
                _ => text.push(self.input.next_char()?),
            }
        }

        self.flush_text(parent, &mut text, location);
        Ok(())
    }

    fn flush_text(
        &mut self,
        parent: NodeId,
        text: &mut String,
        location: SourceLocation,
    ) {
        if text.is_empty() {
            return;
        }
        let id = self.doc.create_node_at(
            NodeKind::Text {
                content: std::mem::take(text),
            },
            location,
        );
        self.doc.append_child(parent, id);
    }

    // --- Attributes ---
    // See XML 1.0 §3.1: [41] Attribute

    fn parse_attribute(&mut self) -> Result<Attribute, ParseError> {
        let name = self.input.parse_name()?;
        self.input.skip_whitespace();
        self.input.expect_byte(b'=')?;
        self.input.skip_whitespace();
        let value = self.input.parse_attribute_value()?;
        let (prefix, local_name) = split_owned_name(name);

        Ok(Attribute {
            name: local_name,
            value,
            prefix,
            namespace: None,
        })
    }

    fn parse_comment(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let location = self.input.location();
        let content = parse_comment_content(&mut self.input)?;
        let id = self
            .doc
            .create_node_at(NodeKind::Comment { content }, location);
        self.doc.append_child(parent, id);
        Ok(())
    }

    fn parse_cdata(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let location = self.input.location();
        let content = parse_cdata_content(&mut self.input)?;
        let id = self.doc.create_node_at(NodeKind::CData { content }, location);
        self.doc.append_child(parent, id);
        Ok(())
    }

    fn parse_processing_instruction(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let location = self.input.location();
        let (target, data) = parse_pi_content(&mut self.input)?;
        let id = self
            .doc
            .create_node_at(NodeKind::ProcessingInstruction { target, data }, location);
        self.doc.append_child(parent, id);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::tree::{Document, NodeKind};
    use pretty_assertions::assert_eq;

    const WIX3: &str = "http://schemas.microsoft.com/wix/2006/wi";

    fn parse(input: &str) -> Document {
        Document::parse_str(input).unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    #[test]
    fn test_parse_empty_element() {
        let doc = parse("<Wix/>");
        let root = doc.root_element().unwrap();
        assert_eq!(doc.node_name(root), Some("Wix"));
        assert_eq!(doc.first_child(root), None);
    }

    #[test]
    fn test_parse_keeps_whitespace_between_elements() {
        let doc = parse("<Wix>\n  <Fragment />\n</Wix>");
        let wix = doc.root_element().unwrap();
        let kinds: Vec<bool> = doc
            .children(wix)
            .map(|id| doc.node(id).kind.is_whitespace_text())
            .collect();
        assert_eq!(kinds, vec![true, false, true]);
        assert_eq!(doc.node_text(doc.first_child(wix).unwrap()), Some("\n  "));
    }

    #[test]
    fn test_parse_drops_document_level_whitespace() {
        let doc = parse("<?xml version='1.0'?>\n\n<!-- c -->\n<Wix/>\n");
        let children: Vec<_> = doc.children(doc.root()).collect();
        assert_eq!(children.len(), 2);
        assert!(matches!(doc.node(children[0]).kind, NodeKind::Comment { .. }));
    }

    #[test]
    fn test_parse_crlf_is_normalized() {
        let doc = parse("<Wix>\r\n  <Fragment/>\r\n</Wix>");
        let wix = doc.root_element().unwrap();
        assert_eq!(doc.node_text(doc.first_child(wix).unwrap()), Some("\n  "));
    }

    #[test]
    fn test_parse_declaration() {
        let doc = parse("<?xml version=\"1.0\" encoding=\"utf-8\"?><Wix/>");
        let decl = doc.declaration.as_ref().unwrap();
        assert_eq!(decl.version, "1.0");
        assert_eq!(decl.encoding.as_deref(), Some("utf-8"));

        let doc = parse("<Wix/>");
        assert!(doc.declaration.is_none());
    }

    #[test]
    fn test_parse_attributes_in_order() {
        let doc = parse("<File Source='a.txt' Id=\"a\" KeyPath=\"yes\"/>");
        let root = doc.root_element().unwrap();
        let names: Vec<&str> = doc.attributes(root).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Source", "Id", "KeyPath"]);
        assert_eq!(doc.attribute(root, "Source"), Some("a.txt"));
    }

    #[test]
    fn test_parse_default_namespace() {
        let doc = parse(&format!("<Wix xmlns=\"{WIX3}\"><Fragment/></Wix>"));
        let wix = doc.root_element().unwrap();
        let fragment = doc.first_child(wix).unwrap();
        assert_eq!(doc.node_namespace(wix), Some(WIX3));
        assert_eq!(doc.node_namespace(fragment), Some(WIX3));
    }

    #[test]
    fn test_parse_prefixed_namespace() {
        let doc = parse(&format!(
            "<w:Wix xmlns:w=\"{WIX3}\" xmlns:util=\"urn:util\"><util:Group util:Id='x'/></w:Wix>"
        ));
        let wix = doc.root_element().unwrap();
        assert_eq!(doc.node_prefix(wix), Some("w"));
        assert_eq!(doc.node_namespace(wix), Some(WIX3));
        let group = doc.first_child(wix).unwrap();
        assert_eq!(doc.node_namespace(group), Some("urn:util"));
        assert_eq!(doc.attributes(group)[0].namespace.as_deref(), Some("urn:util"));
    }

    #[test]
    fn test_parse_unprefixed_attribute_has_no_namespace() {
        let doc = parse(&format!("<Wix xmlns=\"{WIX3}\" Id=\"x\"/>"));
        let wix = doc.root_element().unwrap();
        assert_eq!(doc.attributes(wix)[1].namespace, None);
    }

    #[test]
    fn test_parse_cdata_and_comment() {
        let doc = parse("<Property Id='P'><!-- note --><![CDATA[1<2]]></Property>");
        let property = doc.root_element().unwrap();
        let children: Vec<_> = doc.children(property).collect();
        assert_eq!(doc.node_text(children[0]), Some(" note "));
        assert!(matches!(doc.node(children[1]).kind, NodeKind::CData { .. }));
        assert_eq!(doc.node_text(children[1]), Some("1<2"));
    }

    #[test]
    fn test_parse_preprocessor_instructions() {
        let doc = parse("<Wix><?if $(var.X) = 1?><Fragment/><?endif?></Wix>");
        let wix = doc.root_element().unwrap();
        let first = doc.first_child(wix).unwrap();
        assert_eq!(doc.node_name(first), Some("if"));
        assert_eq!(doc.node_text(first), Some(" $(var.X) = 1"));
    }

    #[test]
    fn test_parse_unknown_entity_becomes_entity_ref() {
        let doc = parse("<!DOCTYPE Wix [<!ENTITY Name 'x'>]><Wix>a &Name; b</Wix>");
        let wix = doc.root_element().unwrap();
        let children: Vec<_> = doc.children(wix).collect();
        assert_eq!(children.len(), 3);
        assert_eq!(
            doc.node(children[1]).kind,
            NodeKind::EntityRef {
                name: "Name".to_string()
            }
        );
        assert_eq!(doc.node_text(children[2]), Some(" b"));
    }

    #[test]
    fn test_parse_doctype_kept_verbatim() {
        let doc = parse("<!DOCTYPE Wix SYSTEM \"wix.dtd\">\n<Wix/>");
        let first = doc.first_child(doc.root()).unwrap();
        assert_eq!(
            doc.node(first).kind,
            NodeKind::DocumentType {
                content: "<!DOCTYPE Wix SYSTEM \"wix.dtd\">".to_string()
            }
        );
    }

    #[test]
    fn test_parse_builtin_references_in_text() {
        let doc = parse("<Condition>A &lt; B &amp;&#65;</Condition>");
        let root = doc.root_element().unwrap();
        assert_eq!(doc.text_content(root), "A < B &A");
    }

    #[test]
    fn test_parse_records_locations() {
        let doc = parse("<Wix>\n  <Fragment>\n    <Property Id='x'/>\n  </Fragment>\n</Wix>");
        let property = doc
            .descendants(doc.root())
            .find(|&id| doc.node_name(id) == Some("Property"))
            .unwrap();
        assert_eq!(doc.location(property).line, 3);
        assert_eq!(doc.location(property).column, 5);
    }

    #[test]
    fn test_parse_error_unbound_prefix() {
        let err = Document::parse_str("<Wix><util:Group/></Wix>").unwrap_err();
        assert!(err.message.contains("unbound namespace prefix 'util'"));
    }

    #[test]
    fn test_parse_error_duplicate_attribute() {
        let err = Document::parse_str("<File Id='a' Id='b'/>").unwrap_err();
        assert!(err.message.contains("duplicate attribute"));
    }

    #[test]
    fn test_parse_error_mismatched_tags() {
        let err = Document::parse_str("<Wix>\n</Fragment>").unwrap_err();
        assert!(err.message.contains("mismatched end tag"));
        assert_eq!(err.location.line, 2);
    }

    #[test]
    fn test_parse_error_unexpected_eof() {
        assert!(Document::parse_str("<Wix>").is_err());
    }

    #[test]
    fn test_parse_error_no_root() {
        assert!(Document::parse_str("").is_err());
        assert!(Document::parse_str("<!-- only -->").is_err());
    }

    #[test]
    fn test_parse_error_trailing_content() {
        assert!(Document::parse_str("<Wix/><Wix/>").is_err());
    }

    #[test]
    fn test_parse_error_unknown_entity_in_attribute() {
        assert!(Document::parse_str("<Wix Name='&Unknown;'/>").is_err());
    }
}

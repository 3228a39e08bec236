//! Canonical layout.
//!
//! Rewrites the declaration and the whitespace of a document in place so
//! that [`serial::serialize`](crate::serial::serialize) produces canonical
//! text. Every corrected construct is one diagnostic:
//!
//! - a missing declaration, or one without an encoding;
//! - a whitespace run between element-only children that is not
//!   `N` newlines followed by `depth * indent` spaces;
//! - an element whose only content is whitespace (emitted self-closing);
//! - whitespace around a CDATA section, whose payload is then trimmed.
//!
//! Mixed content is never reflowed, and missing whitespace is not added.
//! Pass-through subtrees are skipped.

use crate::diagnostics::{Diagnostics, TestType};
use crate::error::SourceLocation;
use crate::tree::is_xml_whitespace;
use crate::tree::{Declaration, Document, NodeId, NodeKind};

/// Default number of spaces per nesting level.
pub const DEFAULT_INDENT: usize = 4;

/// Encoding given to a document that had no declaration.
pub const MISSING_DECLARATION_ENCODING: &str = "utf-16";

/// Encoding given to a declaration that names none.
pub const DEFAULT_DECLARATION_ENCODING: &str = "utf-8";

/// Canonicalizes the declaration and whitespace layout of `doc`.
///
/// Returns the number of diagnostics recorded.
pub fn canonicalize(doc: &mut Document, indent: usize, diagnostics: &mut Diagnostics<'_>) -> usize {
    let before = diagnostics.count();
    fix_declaration(doc, diagnostics);

    if let Some(root) = doc.root_element() {
        let mut formatter = Formatter {
            indent,
            diagnostics: &mut *diagnostics,
        };
        if !formatter.is_pass_through(doc, root) {
            formatter.walk(doc, root, 0);
        }
    }

    diagnostics.count() - before
}

fn fix_declaration(doc: &mut Document, diagnostics: &mut Diagnostics<'_>) {
    if doc.declaration.is_none() {
        if diagnostics.report(
            TestType::DeclarationMissing,
            SourceLocation::new(1, 1),
            format!(
                "The XML declaration is missing. Adding one with encoding '{MISSING_DECLARATION_ENCODING}'."
            ),
        ) {
            doc.declaration = Some(Declaration {
                version: "1.0".to_string(),
                encoding: Some(MISSING_DECLARATION_ENCODING.to_string()),
                standalone: None,
            });
        }
        return;
    }
    if let Some(declaration) = doc.declaration.as_mut().filter(|d| d.encoding.is_none()) {
        if diagnostics.report(
            TestType::DeclarationEncodingMissing,
            SourceLocation::new(1, 1),
            format!("The XML declaration has no encoding. Using '{DEFAULT_DECLARATION_ENCODING}'."),
        ) {
            declaration.encoding = Some(DEFAULT_DECLARATION_ENCODING.to_string());
        }
    }
}

/// The whitespace that should stand where `ws` does, or `None` if `ws` is
/// already canonical. Blank lines are kept.
fn canonical_whitespace(ws: &str, depth: usize, indent: usize) -> Option<String> {
    let newlines = ws.bytes().filter(|&b| b == b'\n').count().max(1);
    let mut expected = "\n".repeat(newlines);
    expected.push_str(&" ".repeat(depth * indent));
    (ws != expected).then_some(expected)
}

struct Formatter<'d, 's> {
    indent: usize,
    diagnostics: &'d mut Diagnostics<'s>,
}

impl Formatter<'_, '_> {
    fn is_pass_through(&self, doc: &Document, id: NodeId) -> bool {
        doc.node_name(id)
            .is_some_and(|n| self.diagnostics.settings().is_pass_through(n))
    }

    fn walk(&mut self, doc: &mut Document, id: NodeId, depth: usize) {
        let children: Vec<NodeId> = doc.children(id).collect();
        if children.is_empty() {
            return;
        }

        if children.iter().all(|&c| doc.node(c).kind.is_whitespace_text()) {
            let name = doc.node_name(id).unwrap_or_default().to_string();
            if self.diagnostics.report(
                TestType::NotEmptyElement,
                doc.location(id),
                format!("The {name} element contains only whitespace. It should be empty."),
            ) {
                doc.remove_children(id);
            }
            return;
        }

        let mixed = children.iter().any(|&c| match &doc.node(c).kind {
            NodeKind::Text { .. } => !doc.node(c).kind.is_whitespace_text(),
            NodeKind::EntityRef { .. } => true,
            _ => false,
        });
        if mixed {
            for child in children {
                if doc.node(child).kind.is_element() && !self.is_pass_through(doc, child) {
                    self.walk(doc, child, depth + 1);
                }
            }
            return;
        }

        for &child in &children {
            if matches!(doc.node(child).kind, NodeKind::CData { .. }) {
                self.fix_cdata(doc, child);
            }
        }

        let children: Vec<NodeId> = doc.children(id).collect();
        for (i, &child) in children.iter().enumerate() {
            let kind = &doc.node(child).kind;
            if kind.is_whitespace_text() {
                // whitespace still next to a CDATA section was kept by a
                // suppressed CDATA fix
                let beside_cdata = [i.checked_sub(1), Some(i + 1)]
                    .into_iter()
                    .flatten()
                    .filter_map(|j| children.get(j))
                    .any(|&n| matches!(doc.node(n).kind, NodeKind::CData { .. }));
                if beside_cdata {
                    continue;
                }
                match children.get(i + 1) {
                    Some(&next) if is_multiline_comment(doc, next) => {}
                    Some(&next) => {
                        let location = doc.location(next);
                        self.fix_whitespace(
                            doc,
                            child,
                            depth + 1,
                            TestType::WhitespacePrecedingNodeWrong,
                            location,
                        );
                    }
                    None => {
                        let location = doc.location(child);
                        self.fix_whitespace(
                            doc,
                            child,
                            depth,
                            TestType::WhitespacePrecedingEndElementWrong,
                            location,
                        );
                    }
                }
            } else if kind.is_element() && !self.is_pass_through(doc, child) {
                self.walk(doc, child, depth + 1);
            }
        }
    }

    fn fix_whitespace(
        &mut self,
        doc: &mut Document,
        ws: NodeId,
        depth: usize,
        test: TestType,
        location: SourceLocation,
    ) {
        let current = doc.node_text(ws).unwrap_or_default();
        let Some(expected) = canonical_whitespace(current, depth, self.indent) else {
            return;
        };
        let message = match test {
            TestType::WhitespacePrecedingEndElementWrong => format!(
                "The whitespace before the end element is incorrect. It should be indented {} spaces.",
                depth * self.indent
            ),
            _ => format!(
                "The whitespace before this node is incorrect. It should be indented {} spaces.",
                depth * self.indent
            ),
        };
        if self.diagnostics.report(test, location, message) {
            doc.set_node_text(ws, expected);
        }
    }

    fn fix_cdata(&mut self, doc: &mut Document, cdata: NodeId) {
        let location = doc.location(cdata);
        let mut fixed = false;

        if let Some(prev) = doc
            .prev_sibling(cdata)
            .filter(|&p| doc.node(p).kind.is_whitespace_text())
        {
            if self.diagnostics.report(
                TestType::WhitespacePrecedingCDATAWrong,
                location,
                "There should be no whitespace before a CDATA section.",
            ) {
                doc.detach(prev);
                fixed = true;
            }
        }

        if let Some(next) = doc
            .next_sibling(cdata)
            .filter(|&n| doc.node(n).kind.is_whitespace_text())
        {
            if self.diagnostics.report(
                TestType::WhitespaceFollowingCDATAWrong,
                doc.location(next),
                "There should be no whitespace after a CDATA section.",
            ) {
                doc.detach(next);
                fixed = true;
            }
        }

        let content = doc.node_text(cdata).unwrap_or_default();
        let trimmed = content.trim_matches(is_xml_whitespace);
        if trimmed.len() == content.len() {
            return;
        }
        let trimmed = trimmed.to_string();
        if fixed
            || self.diagnostics.report(
                TestType::CDATAContentWhitespace,
                location,
                "The CDATA content should not start or end with whitespace.",
            )
        {
            doc.set_node_text(cdata, trimmed);
        }
    }
}

fn is_multiline_comment(doc: &Document, id: NodeId) -> bool {
    matches!(&doc.node(id).kind, NodeKind::Comment { content } if content.contains('\n'))
}

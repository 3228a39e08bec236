//! Markup serializer.
//!
//! Writes a `Document` back to text. Layout is taken from the tree as is:
//! whitespace text nodes are emitted verbatim, so the formatter decides
//! indentation before this runs. Elements without children use the
//! `<Name />` form, attributes are always double-quoted, and pass-through
//! elements are copied from the source byte for byte.

use crate::settings::Settings;
use crate::tree::{Document, NodeId, NodeKind};

/// Serializes a document to text.
///
/// # Examples
///
/// ```
/// use wixcop::{Document, Settings};
/// use wixcop::serial::serialize;
///
/// let doc = Document::parse_str("<?xml version='1.0' encoding='utf-8'?><Wix><Fragment></Fragment></Wix>").unwrap();
/// let text = serialize(&doc, &Settings::default());
/// assert_eq!(text, "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Wix><Fragment /></Wix>\n");
/// ```
#[must_use]
pub fn serialize(doc: &Document, settings: &Settings) -> String {
    let mut output = String::new();

    if let Some(declaration) = &doc.declaration {
        output.push_str("<?xml version=\"1.0\"");
        if let Some(encoding) = &declaration.encoding {
            output.push_str(" encoding=\"");
            output.push_str(encoding);
            output.push('"');
        }
        if let Some(standalone) = declaration.standalone {
            output.push_str(" standalone=\"");
            output.push_str(if standalone { "yes" } else { "no" });
            output.push('"');
        }
        output.push_str("?>\n");
    }

    let mut first = true;
    for child in doc.children(doc.root()) {
        if !first {
            output.push('\n');
        }
        first = false;
        serialize_node(doc, child, settings, &mut output);
    }
    output.push('\n');

    output
}

fn serialize_node(doc: &Document, id: NodeId, settings: &Settings, out: &mut String) {
    match &doc.node(id).kind {
        NodeKind::Element {
            name,
            prefix,
            attributes,
            ..
        } => {
            if settings.is_pass_through(name) {
                if let Some(source) = doc.source_text(id) {
                    out.push_str(source);
                    return;
                }
            }

            out.push('<');
            write_qualified(out, prefix.as_deref(), name);
            for attr in attributes {
                out.push(' ');
                write_qualified(out, attr.prefix.as_deref(), &attr.name);
                out.push_str("=\"");
                write_escaped_attr(out, &attr.value);
                out.push('"');
            }

            if doc.first_child(id).is_none() {
                out.push_str(" />");
                return;
            }
            out.push('>');
            for child in doc.children(id) {
                serialize_node(doc, child, settings, out);
            }
            out.push_str("</");
            write_qualified(out, prefix.as_deref(), name);
            out.push('>');
        }
        NodeKind::Text { content } => write_escaped_text(out, content),
        NodeKind::CData { content } => {
            out.push_str("<![CDATA[");
            out.push_str(content);
            out.push_str("]]>");
        }
        NodeKind::Comment { content } => {
            out.push_str("<!--");
            out.push_str(content);
            out.push_str("-->");
        }
        NodeKind::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            if let Some(d) = data {
                out.push_str(d);
            }
            out.push_str("?>");
        }
        NodeKind::EntityRef { name } => {
            out.push('&');
            out.push_str(name);
            out.push(';');
        }
        NodeKind::DocumentType { content } => out.push_str(content),
        NodeKind::Document => {}
    }
}

fn write_qualified(out: &mut String, prefix: Option<&str>, name: &str) {
    if let Some(prefix) = prefix {
        out.push_str(prefix);
        out.push(':');
    }
    out.push_str(name);
}

/// Writes a hexadecimal character reference (`&#xHH;`).
fn write_hex_char_ref(out: &mut String, ch: char) {
    use std::fmt::Write;
    let _ = write!(out, "&#x{:X};", ch as u32);
}

/// Escapes character data: `<`, `>`, `&` by name, `\r` and other control
/// characters (except tab and newline) as character references.
fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\t' | '\n' => out.push(ch),
            c if (c as u32) < 0x20 => write_hex_char_ref(out, c),
            _ => out.push(ch),
        }
    }
}

/// Escapes an attribute value for a double-quoted attribute. Whitespace
/// characters other than space are written as references so they survive
/// attribute-value normalization on the next load.
fn write_escaped_attr(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c if (c as u32) < 0x20 => write_hex_char_ref(out, c),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn round(source: &str) -> String {
        let doc = Document::parse_str(source).unwrap();
        serialize(&doc, &Settings::default())
    }

    #[test]
    fn test_no_declaration_written_when_absent() {
        assert_eq!(round("<Wix/>"), "<Wix />\n");
    }

    #[test]
    fn test_declaration_fields() {
        assert_eq!(
            round("<?xml version='1.0' encoding='utf-8' standalone='yes'?><Wix/>"),
            "<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"yes\"?>\n<Wix />\n"
        );
    }

    #[test]
    fn test_attributes_double_quoted_in_order() {
        assert_eq!(
            round("<Property Value='a \"b\"' Id='P'/>"),
            "<Property Value=\"a &quot;b&quot;\" Id=\"P\" />\n"
        );
    }

    #[test]
    fn test_attribute_escapes() {
        assert_eq!(
            round("<Condition Message='a&amp;b &lt; c&#10;d'/>"),
            "<Condition Message=\"a&amp;b &lt; c&#10;d\" />\n"
        );
    }

    #[test]
    fn test_text_and_cdata() {
        assert_eq!(
            round("<Property>1 &lt; 2<![CDATA[a<b]]></Property>"),
            "<Property>1 &lt; 2<![CDATA[a<b]]></Property>\n"
        );
    }

    #[test]
    fn test_prefixed_names() {
        assert_eq!(
            round("<w:Wix xmlns:w='urn:w' w:a='1'><w:Fragment/></w:Wix>"),
            "<w:Wix xmlns:w=\"urn:w\" w:a=\"1\"><w:Fragment /></w:Wix>\n"
        );
    }

    #[test]
    fn test_comments_pis_and_entity_refs() {
        assert_eq!(
            round("<?define X = 1?><!--top--><Wix><?include a.wxi?>&custom;</Wix>"),
            "<?define X = 1?>\n<!--top-->\n<Wix><?include a.wxi?>&custom;</Wix>\n"
        );
    }

    #[test]
    fn test_doctype_verbatim() {
        assert_eq!(
            round("<!DOCTYPE Wix [ <!ENTITY e 'x'> ]><Wix/>"),
            "<!DOCTYPE Wix [ <!ENTITY e 'x'> ]>\n<Wix />\n"
        );
    }

    #[test]
    fn test_pass_through_copied_from_source() {
        let source = "<Wix>\n  <Custom  a = 'x' >\n<Row/>\n\t</Custom>\n</Wix>";
        let doc = Document::parse_str(source).unwrap();
        let settings = Settings::default().pass_through("Custom");
        assert_eq!(
            serialize(&doc, &settings),
            "<Wix>\n  <Custom  a = 'x' >\n<Row/>\n\t</Custom>\n</Wix>\n"
        );
    }
}

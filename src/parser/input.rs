//! Low-level input handling for the markup loader.
//!
//! [`ParserInput`] encapsulates the raw byte stream, position tracking
//! (line, column, byte offset), and the parsing primitives shared by the
//! tree builder: peeking, advancing, name parsing, and reference resolution.
//!
//! # Limits
//!
//! `ParserInput` tracks nesting depth, name length, and reference count so
//! that a hostile file cannot exhaust the stack or memory of a batch run.
//! No external entity loading is ever performed.

use crate::error::{ParseError, SourceLocation};

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 256;

/// Default maximum number of attributes on a single element.
pub(crate) const DEFAULT_MAX_ATTRIBUTES: u32 = 256;

/// Default maximum length (in bytes) of an element or attribute name.
pub(crate) const DEFAULT_MAX_NAME_LENGTH: usize = 50_000;

/// Default maximum number of references resolved per document.
pub(crate) const DEFAULT_MAX_REFERENCES: u32 = 1_000_000;

// -------------------------------------------------------------------------
// Name character classes (XML 1.0 §2.3)
// -------------------------------------------------------------------------

/// Returns `true` if `c` is a valid `Char` per XML 1.0 §2.2 `[2]`.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x0001_0000..=0x0010_FFFF
    )
}

/// Returns `true` if `c` is a valid `NameStartChar` per XML 1.0 §2.3 `[4]`.
pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// Returns `true` if `c` is a valid `NameChar` per XML 1.0 §2.3 [4a].
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// Splits a qualified name into optional prefix and local part.
///
/// `"util:XmlFile"` → `(Some("util"), "XmlFile")`
/// `"File"` → `(None, "File")`
pub(crate) fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.find(':') {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

/// Owned variant of [`split_name`]; unprefixed names are moved, not copied.
pub(crate) fn split_owned_name(name: String) -> (Option<String>, String) {
    match name.find(':') {
        Some(pos) => (Some(name[..pos].to_string()), name[pos + 1..].to_string()),
        None => (None, name),
    }
}

/// The result of resolving `&...;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reference {
    /// A character reference or one of the five predefined entities,
    /// already expanded.
    Text(String),
    /// A named entity the loader has no replacement text for.
    Unknown(String),
}

// -------------------------------------------------------------------------
// ParserInput
// -------------------------------------------------------------------------

/// Shared low-level input state.
///
/// Tracks the byte stream, position (line/column/offset), nesting depth,
/// and reference count.
pub(crate) struct ParserInput<'a> {
    /// The input bytes (valid UTF-8).
    input: &'a [u8],

    /// Current byte offset in `input`.
    pos: usize,

    /// Current line number (1-based).
    line: u32,

    /// Current column number (1-based).
    column: u32,

    /// Current element nesting depth.
    depth: u32,

    /// Maximum allowed nesting depth.
    max_depth: u32,

    /// Maximum allowed name length in bytes.
    max_name_length: usize,

    /// Number of references resolved so far.
    references: u32,

    /// Maximum allowed references.
    max_references: u32,
}

impl<'a> ParserInput<'a> {
    /// Creates a new `ParserInput` from a UTF-8 string with default limits.
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            references: 0,
            max_references: DEFAULT_MAX_REFERENCES,
        }
    }

    /// Sets the maximum nesting depth.
    pub fn set_max_depth(&mut self, max: u32) {
        self.max_depth = max;
    }

    /// Sets the maximum name length.
    pub fn set_max_name_length(&mut self, max: usize) {
        self.max_name_length = max;
    }

    /// Sets the maximum reference count.
    pub fn set_max_references(&mut self, max: u32) {
        self.max_references = max;
    }

    // -- Depth tracking --

    /// Increments the nesting depth. Returns an error if the limit is exceeded.
    pub fn increment_depth(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.fatal(format!(
                "maximum nesting depth exceeded ({})",
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Decrements the nesting depth (saturating at 0).
    pub fn decrement_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // -- Position queries --

    /// Returns the current source location.
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    /// Returns `true` if all input has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    // -- Peek operations --

    /// Returns the byte at the current position without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Returns the byte at `current_position + offset` without consuming.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Returns the character at the current position without consuming it.
    pub fn peek_char(&self) -> Option<char> {
        if self.at_end() {
            return None;
        }
        // A char is at most 4 bytes; decoding a short window keeps this O(1).
        let end = (self.pos + 4).min(self.input.len());
        let window = &self.input[self.pos..end];
        match std::str::from_utf8(window) {
            Ok(s) => s.chars().next(),
            Err(e) => std::str::from_utf8(&window[..e.valid_up_to()])
                .ok()
                .and_then(|s| s.chars().next()),
        }
    }

    // -- Advance operations --

    /// Advances the position by `count` bytes, updating line/column.
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            if self.pos < self.input.len() {
                if self.input[self.pos] == b'\n' {
                    self.line += 1;
                    self.column = 1;
                } else if self.input[self.pos] & 0xC0 != 0x80 {
                    self.column += 1;
                }
                self.pos += 1;
            }
        }
    }

    /// Advances by one UTF-8 character, updating line/column.
    pub fn advance_char(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += ch.len_utf8();
    }

    /// Consumes and returns the next byte, or returns an error at EOF.
    pub fn next_byte(&mut self) -> Result<u8, ParseError> {
        if self.at_end() {
            return Err(self.fatal("unexpected end of input"));
        }
        let b = self.input[self.pos];
        self.advance(1);
        Ok(b)
    }

    /// Consumes and returns the next character with `\r\n` normalization
    /// (XML 1.0 §2.11) and character validation (XML 1.0 §2.2).
    pub fn next_char(&mut self) -> Result<char, ParseError> {
        let ch = self
            .peek_char()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        if !is_xml_char(ch) {
            return Err(self.fatal(format!("invalid XML character: U+{:04X}", ch as u32)));
        }
        self.advance_char(ch);
        if ch == '\r' {
            if self.peek() == Some(b'\n') {
                self.advance(1);
            }
            return Ok('\n');
        }
        Ok(ch)
    }

    // -- Expect operations --

    /// Consumes the next byte and asserts it matches `expected`.
    pub fn expect_byte(&mut self, expected: u8) -> Result<(), ParseError> {
        let location = self.location();
        let b = self.next_byte()?;
        if b != expected {
            return Err(ParseError::new(
                format!("expected '{}', found '{}'", expected as char, b as char),
                location,
            ));
        }
        Ok(())
    }

    /// Consumes bytes and asserts they match the `expected` sequence.
    pub fn expect_str(&mut self, expected: &[u8]) -> Result<(), ParseError> {
        for &b in expected {
            self.expect_byte(b)?;
        }
        Ok(())
    }

    // -- Lookahead --

    /// Returns `true` if the remaining input starts with `s`.
    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.input[self.pos.min(self.input.len())..].starts_with(s)
    }

    // -- Whitespace --

    /// Skips whitespace characters. Returns `true` if any were consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b' ' || b == b'\t' || b == b'\r' || b == b'\n' {
                self.advance(1);
            } else {
                break;
            }
        }
        self.pos > start
    }

    /// Skips whitespace, returning an error if none is found.
    pub fn skip_whitespace_required(&mut self) -> Result<(), ParseError> {
        if !self.skip_whitespace() {
            return Err(self.fatal("whitespace required"));
        }
        Ok(())
    }

    // -- Take while --

    /// Consumes bytes while `pred` returns `true` and returns the string.
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if pred(b) {
                self.advance(1);
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).to_string()
    }

    // -- Name parsing (XML 1.0 §2.3) --

    /// Parses a `Name` per XML 1.0 §2.3 production `[5]`.
    pub fn parse_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let first = self
            .peek_char()
            .ok_or_else(|| self.fatal("expected name, found end of input"))?;
        if !is_name_start_char(first) {
            return Err(self.fatal(format!("invalid name start character: '{first}'")));
        }
        self.advance_char(first);

        while let Some(ch) = self.peek_char() {
            if is_name_char(ch) {
                self.advance_char(ch);
            } else {
                break;
            }
        }

        let len = self.pos - start;
        if len > self.max_name_length {
            return Err(self.fatal(format!(
                "name length ({len}) exceeds maximum ({})",
                self.max_name_length
            )));
        }

        let name = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.fatal("invalid UTF-8 in name"))?;
        Ok(name.to_string())
    }

    // -- Reference parsing (XML 1.0 §4.1) --

    /// Parses an entity or character reference (`&...;`).
    ///
    /// Character references and the five predefined entities are expanded.
    /// Any other named entity is returned as [`Reference::Unknown`]; the
    /// caller decides whether that is acceptable in its context.
    pub fn parse_reference(&mut self) -> Result<Reference, ParseError> {
        self.references += 1;
        if self.references > self.max_references {
            return Err(self.fatal(format!(
                "reference limit exceeded ({})",
                self.max_references
            )));
        }

        self.expect_byte(b'&')?;

        if self.peek() == Some(b'#') {
            self.advance(1);
            let value = if self.peek() == Some(b'x') {
                self.advance(1);
                let hex = self.take_while(|b| b.is_ascii_hexdigit());
                if hex.is_empty() {
                    return Err(self.fatal("empty hex character reference"));
                }
                u32::from_str_radix(&hex, 16)
                    .map_err(|_| self.fatal("invalid hex character reference"))?
            } else {
                let dec = self.take_while(|b| b.is_ascii_digit());
                if dec.is_empty() {
                    return Err(self.fatal("empty decimal character reference"));
                }
                dec.parse::<u32>()
                    .map_err(|_| self.fatal("invalid decimal character reference"))?
            };
            self.expect_byte(b';')?;

            let ch = char::from_u32(value)
                .filter(|&c| is_xml_char(c))
                .ok_or_else(|| {
                    self.fatal(format!(
                        "character reference &#x{value:X}; does not refer to a valid XML character"
                    ))
                })?;
            return Ok(Reference::Text(ch.to_string()));
        }

        let name = self.parse_name()?;
        self.expect_byte(b';')?;

        let text = match name.as_str() {
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            "apos" => "'",
            "quot" => "\"",
            _ => return Ok(Reference::Unknown(name)),
        };
        Ok(Reference::Text(text.to_string()))
    }

    // -- Attribute value parsing (XML 1.0 §3.3.3) --

    /// Parses a quoted attribute value with reference resolution and
    /// whitespace normalization.
    pub fn parse_attribute_value(&mut self) -> Result<String, ParseError> {
        let quote = self.next_byte()?;
        if quote != b'"' && quote != b'\'' {
            return Err(self.fatal("attribute value must be quoted"));
        }

        let mut value = String::new();
        loop {
            let b = self
                .peek()
                .ok_or_else(|| self.fatal("unexpected end of input in attribute value"))?;
            if b == quote {
                self.advance(1);
                break;
            }
            if b == b'&' {
                let location = self.location();
                match self.parse_reference()? {
                    Reference::Text(text) => value.push_str(&text),
                    Reference::Unknown(name) => {
                        return Err(ParseError::new(
                            format!("unknown entity reference in attribute value: &{name};"),
                            location,
                        ));
                    }
                }
            } else if b == b'<' {
                return Err(self.fatal("'<' not allowed in attribute values"));
            } else {
                let ch = self.next_char()?;
                if ch == '\n' || ch == '\t' {
                    value.push(' ');
                } else {
                    value.push(ch);
                }
            }
        }

        Ok(value)
    }

    /// Parses a simple quoted value (single or double quotes, no reference
    /// resolution).
    pub fn parse_quoted_value(&mut self) -> Result<String, ParseError> {
        let quote = self.next_byte()?;
        if quote != b'"' && quote != b'\'' {
            return Err(self.fatal("expected quoted value"));
        }
        let start = self.pos;
        while !self.at_end() && self.peek() != Some(quote) {
            self.advance(1);
        }
        let value = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.fatal("invalid UTF-8 in quoted value"))?
            .to_string();
        self.expect_byte(quote)?;
        Ok(value)
    }

    /// Returns the source text between two byte offsets.
    pub fn text_between(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.input[start..end.min(self.input.len())]).into_owned()
    }

    // -- Error helpers --

    /// Creates a fatal `ParseError` at the current location.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.location())
    }
}

// -------------------------------------------------------------------------
// Namespace resolver
// -------------------------------------------------------------------------

/// Manages namespace scope while loading.
///
/// Maintains a stack of binding frames mirroring element nesting. Each frame
/// holds the `xmlns` declarations introduced on that element; resolution
/// walks the stack from the top down.
pub(crate) struct NamespaceResolver {
    /// Stack of `(prefix, uri)` frames. A `None` prefix is the default
    /// namespace.
    stack: Vec<Vec<(Option<String>, String)>>,
}

/// The well-known XML namespace URI, pre-bound to the `xml` prefix.
pub(crate) const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

impl NamespaceResolver {
    /// Creates a new resolver with the `xml` prefix pre-bound.
    pub fn new() -> Self {
        let initial = vec![(Some("xml".to_string()), XML_NAMESPACE.to_string())];
        Self {
            stack: vec![initial],
        }
    }

    /// Pushes a new (empty) namespace scope for an element.
    pub fn push_scope(&mut self) {
        self.stack.push(Vec::new());
    }

    /// Pops the current namespace scope.
    pub fn pop_scope(&mut self) {
        self.stack.pop();
    }

    /// Binds a namespace prefix to a URI in the current scope.
    pub fn bind(&mut self, prefix: Option<String>, uri: String) {
        if let Some(frame) = self.stack.last_mut() {
            frame.push((prefix, uri));
        }
    }

    /// Resolves a namespace prefix to its URI. `None` resolves the default
    /// namespace.
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        for frame in self.stack.iter().rev() {
            for (p, uri) in frame.iter().rev() {
                if p.as_deref() == prefix {
                    if uri.is_empty() {
                        // xmlns="" undeclares the default namespace
                        return None;
                    }
                    return Some(uri.as_str());
                }
            }
        }
        None
    }
}

// -------------------------------------------------------------------------
// Markup helpers
// -------------------------------------------------------------------------

/// Parses a comment (`<!-- ... -->`), returning the content text.
///
/// See XML 1.0 §2.5 production `[15]`.
pub(crate) fn parse_comment_content(input: &mut ParserInput<'_>) -> Result<String, ParseError> {
    input.expect_str(b"<!--")?;
    let mut content = String::new();

    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in comment"));
        }
        if input.looking_at(b"-->") {
            input.advance(3);
            break;
        }
        if input.looking_at(b"--") {
            return Err(input.fatal("'--' not allowed inside comments"));
        }
        content.push(input.next_char()?);
    }

    Ok(content)
}

/// Parses a CDATA section (`<![CDATA[ ... ]]>`), returning the payload.
///
/// See XML 1.0 §2.7 production `[18]`.
pub(crate) fn parse_cdata_content(input: &mut ParserInput<'_>) -> Result<String, ParseError> {
    input.expect_str(b"<![CDATA[")?;
    let mut content = String::new();

    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in CDATA section"));
        }
        if input.looking_at(b"]]>") {
            input.advance(3);
            break;
        }
        content.push(input.next_char()?);
    }

    Ok(content)
}

/// Parses a processing instruction (`<?target data?>`), returning
/// `(target, optional_data)`. The data is the raw text after the target,
/// so `<?define   X = 1 ?>` keeps its spacing.
///
/// See XML 1.0 §2.6 production `[16]`.
pub(crate) fn parse_pi_content(
    input: &mut ParserInput<'_>,
) -> Result<(String, Option<String>), ParseError> {
    input.expect_str(b"<?")?;
    let target = input.parse_name()?;

    if target.eq_ignore_ascii_case("xml") {
        return Err(input.fatal("PI target 'xml' is reserved"));
    }

    // data is everything between the target and `?>`, leading whitespace
    // included
    let data = if input.peek().is_some_and(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n')) {
        let mut data = String::new();
        loop {
            if input.at_end() {
                return Err(input.fatal("unexpected end of input in processing instruction"));
            }
            if input.looking_at(b"?>") {
                input.advance(2);
                break;
            }
            data.push(input.next_char()?);
        }
        Some(data)
    } else {
        input.expect_str(b"?>")?;
        None
    };

    Ok((target, data))
}

/// Consumes a `<!DOCTYPE ...>` declaration and returns it verbatim.
///
/// Quoted literals and a bracketed internal subset are skipped as opaque
/// text; nothing inside is interpreted.
pub(crate) fn parse_doctype_raw(input: &mut ParserInput<'_>) -> Result<String, ParseError> {
    let start = input.pos();
    input.expect_str(b"<!DOCTYPE")?;
    let mut bracket_depth = 0u32;
    let mut quote: Option<u8> = None;

    loop {
        let b = input
            .peek()
            .ok_or_else(|| input.fatal("unexpected end of input in DOCTYPE"))?;
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'[' => bracket_depth += 1,
                b']' => bracket_depth = bracket_depth.saturating_sub(1),
                b'>' if bracket_depth == 0 => {
                    input.advance(1);
                    break;
                }
                _ => {}
            },
        }
        input.advance(1);
    }

    Ok(input.text_between(start, input.pos()))
}

/// Parsed declaration data.
#[derive(Debug, Clone)]
pub(crate) struct XmlDeclaration {
    /// Version (e.g. `"1.0"`).
    pub version: String,
    /// Optional encoding label.
    pub encoding: Option<String>,
    /// Optional standalone flag.
    pub standalone: Option<bool>,
}

/// Parses an XML declaration (`<?xml version="1.0" ...?>`).
///
/// See XML 1.0 §2.8 production `[23]`.
pub(crate) fn parse_xml_decl(input: &mut ParserInput<'_>) -> Result<XmlDeclaration, ParseError> {
    input.expect_str(b"<?xml")?;
    input.skip_whitespace_required()?;

    input.expect_str(b"version")?;
    input.skip_whitespace();
    input.expect_byte(b'=')?;
    input.skip_whitespace();
    let version = input.parse_quoted_value()?;

    if !is_valid_version_num(&version) {
        return Err(input.fatal(format!("invalid version number: '{version}'")));
    }

    let had_ws = input.skip_whitespace();
    let encoding = if input.looking_at(b"encoding") {
        if !had_ws {
            return Err(input.fatal("whitespace required before encoding"));
        }
        input.expect_str(b"encoding")?;
        input.skip_whitespace();
        input.expect_byte(b'=')?;
        input.skip_whitespace();
        let enc = input.parse_quoted_value()?;

        if !is_valid_encoding_name(&enc) {
            return Err(input.fatal(format!("invalid encoding name: '{enc}'")));
        }

        Some(enc)
    } else {
        None
    };

    // Without an encoding, the whitespace consumed above already separates
    // version from standalone.
    let had_ws2 = input.skip_whitespace() || (encoding.is_none() && had_ws);
    let standalone = if input.looking_at(b"standalone") {
        if !had_ws2 {
            return Err(input.fatal("whitespace required before standalone"));
        }
        input.expect_str(b"standalone")?;
        input.skip_whitespace();
        input.expect_byte(b'=')?;
        input.skip_whitespace();
        match input.parse_quoted_value()?.as_str() {
            "yes" => Some(true),
            "no" => Some(false),
            _ => return Err(input.fatal("standalone must be 'yes' or 'no'")),
        }
    } else {
        None
    };

    input.skip_whitespace();
    input.expect_str(b"?>")?;

    Ok(XmlDeclaration {
        version,
        encoding,
        standalone,
    })
}

/// `VersionNum ::= '1.' [0-9]+`
fn is_valid_version_num(s: &str) -> bool {
    s.strip_prefix("1.")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// `EncName ::= [A-Za-z] ([A-Za-z0-9._] | '-')*`
pub(crate) fn is_valid_encoding_name(s: &str) -> bool {
    let bytes = s.as_bytes();
    let Some((first, rest)) = bytes.split_first() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && rest
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-')
}

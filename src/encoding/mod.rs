//! Encoding detection and transcoding at the file boundary.
//!
//! Installer sources arrive as UTF-8 or UTF-16 (with or without a byte order
//! mark), occasionally in a legacy code page named by the declaration.
//! [`decode`] turns file bytes into text; [`encode`] turns canonical output
//! back into bytes in the encoding the declaration names, so a file written
//! by the converter reads back to the same text.
//!
//! # Detection order
//!
//! 1. A byte order mark wins.
//! 2. Without one, the first bytes are sniffed for BOM-less UTF-16 `<?`.
//! 3. Otherwise the declaration's `encoding=` label is consulted.
//! 4. The default is UTF-8.

use std::fmt;

/// An error that occurs during encoding detection or transcoding.
#[derive(Debug, Clone)]
pub struct EncodingError {
    /// A human-readable description of the encoding error.
    pub message: String,
}

impl EncodingError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encoding error: {}", self.message)
    }
}

impl std::error::Error for EncodingError {}

/// Detects the encoding of a byte stream from its byte order mark, or from
/// the byte pattern of a BOM-less UTF-16 `<?` (XML 1.0 Appendix F).
///
/// Returns the encoding name and the number of BOM bytes to skip.
///
/// # Examples
///
/// ```
/// use wixcop::encoding::detect_encoding;
///
/// assert_eq!(detect_encoding(b"\xEF\xBB\xBF<Wix/>"), ("UTF-8", 3));
/// assert_eq!(detect_encoding(b"\xFF\xFE<\x00"), ("UTF-16LE", 2));
/// assert_eq!(detect_encoding(b"<Wix/>"), ("UTF-8", 0));
/// ```
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> (&'static str, usize) {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => ("UTF-8", 3),
        [0xFE, 0xFF, ..] => ("UTF-16BE", 2),
        [0xFF, 0xFE, ..] => ("UTF-16LE", 2),
        [0x3C, 0x00, 0x3F, 0x00, ..] => ("UTF-16LE", 0),
        [0x00, 0x3C, 0x00, 0x3F, ..] => ("UTF-16BE", 0),
        _ => ("UTF-8", 0),
    }
}

/// Transcodes a byte slice from the named encoding into a UTF-8 `String`.
///
/// # Errors
///
/// Returns `EncodingError` if the encoding name is not recognized or the
/// input contains malformed byte sequences.
pub fn transcode(bytes: &[u8], encoding_name: &str) -> Result<String, EncodingError> {
    let encoding = encoding_rs::Encoding::for_label(encoding_name.as_bytes())
        .ok_or_else(|| EncodingError::new(format!("unsupported encoding: {encoding_name}")))?;

    let (result, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(EncodingError::new(format!(
            "malformed byte sequence for encoding {encoding_name}"
        )));
    }
    Ok(result.into_owned())
}

/// Decodes raw file bytes into text, detecting the encoding.
///
/// A declaration naming UTF-16 on a file that carries neither a BOM nor
/// UTF-16 byte patterns is taken to be mislabelled UTF-8, which is how
/// such files are commonly saved by editors.
///
/// # Errors
///
/// Returns `EncodingError` if the bytes are invalid for the detected
/// encoding or the declared encoding is unsupported.
///
/// # Examples
///
/// ```
/// use wixcop::encoding::decode;
///
/// let text = decode(b"<?xml version=\"1.0\"?><Wix/>").unwrap();
/// assert!(text.ends_with("<Wix/>"));
/// ```
pub fn decode(bytes: &[u8]) -> Result<String, EncodingError> {
    let (detected, skip) = detect_encoding(bytes);
    let content = &bytes[skip..];

    if detected != "UTF-8" {
        return transcode(content, detected);
    }

    if let Ok(text) = std::str::from_utf8(content) {
        if let Some(declared) = extract_xml_decl_encoding(text) {
            if !is_utf8_label(&declared) && !is_utf16_label(&declared) && skip == 0 {
                return transcode(content, &declared);
            }
        }
        return Ok(text.to_string());
    }

    // Not valid UTF-8. The declaration is ASCII-compatible in every
    // single-byte code page, so scan it directly.
    if let Some(declared) = extract_encoding_from_ascii_bytes(content) {
        return transcode(content, &declared);
    }
    Err(EncodingError::new("input is not valid UTF-8"))
}

/// Encodes text for writing in the encoding named by `label`.
///
/// UTF-16 labels produce little-endian output with a byte order mark, UTF-8
/// labels produce UTF-8 without a BOM, and any other label goes through
/// `encoding_rs`.
///
/// # Errors
///
/// Returns `EncodingError` if the label is unknown or the text contains
/// characters the target encoding cannot represent.
///
/// # Examples
///
/// ```
/// use wixcop::encoding::encode;
///
/// assert_eq!(encode("<A />", "utf-8").unwrap(), b"<A />");
/// assert_eq!(&encode("<", "utf-16").unwrap()[..], b"\xFF\xFE<\x00");
/// ```
pub fn encode(text: &str, label: &str) -> Result<Vec<u8>, EncodingError> {
    if is_utf8_label(label) {
        return Ok(text.as_bytes().to_vec());
    }
    if is_utf16_label(label) {
        // encoding_rs never encodes to UTF-16; write the code units directly.
        let big_endian = label.eq_ignore_ascii_case("utf-16be");
        let mut out = Vec::with_capacity(2 + text.len() * 2);
        for unit in std::iter::once(0xFEFF_u16).chain(text.encode_utf16()) {
            let bytes = if big_endian {
                unit.to_be_bytes()
            } else {
                unit.to_le_bytes()
            };
            out.extend_from_slice(&bytes);
        }
        return Ok(out);
    }

    let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
        .ok_or_else(|| EncodingError::new(format!("unsupported encoding: {label}")))?;
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(EncodingError::new(format!(
            "text contains characters not representable in {label}"
        )));
    }
    Ok(bytes.into_owned())
}

/// Extracts the `encoding` value from a leading declaration without running
/// the full parser.
fn extract_xml_decl_encoding(text: &str) -> Option<String> {
    let decl_end = text.find("?>")?;
    let decl = &text[..decl_end];
    if !decl.starts_with("<?xml") {
        return None;
    }

    let enc_pos = decl.find("encoding")?;
    let after_enc = decl[enc_pos + "encoding".len()..].trim_start();
    let after_enc = after_enc.strip_prefix('=')?.trim_start();

    let quote = after_enc.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let after_quote = &after_enc[1..];
    let end = after_quote.find(quote)?;
    Some(after_quote[..end].to_string())
}

/// Byte-level variant of [`extract_xml_decl_encoding`] for input that is
/// not valid UTF-8.
fn extract_encoding_from_ascii_bytes(bytes: &[u8]) -> Option<String> {
    let scan = &bytes[..bytes.len().min(200)];
    if !scan.starts_with(b"<?xml") {
        return None;
    }
    let decl_end = scan.windows(2).position(|w| w == b"?>")?;
    let decl = &scan[..decl_end];
    let needle = b"encoding";
    let enc_pos = decl.windows(needle.len()).position(|w| w == needle)?;

    let after_enc = skip_ascii_whitespace(&decl[enc_pos + needle.len()..]);
    let after_eq = skip_ascii_whitespace(after_enc.strip_prefix(b"=")?);
    let (&quote, after_quote) = after_eq.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let end = after_quote.iter().position(|&b| b == quote)?;
    let label = &after_quote[..end];
    label
        .is_ascii()
        .then(|| String::from_utf8_lossy(label).into_owned())
}

fn skip_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t' || b == b'\r' || b == b'\n')
        .count();
    &bytes[skip..]
}

/// Returns `true` if the label is a recognized alias for UTF-8.
pub(crate) fn is_utf8_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("utf-8") || label.eq_ignore_ascii_case("utf8")
}

/// Returns `true` if the label names UTF-16 in either byte order.
pub(crate) fn is_utf16_label(label: &str) -> bool {
    ["utf-16", "utf-16le", "utf-16be", "unicode"]
        .iter()
        .any(|l| label.eq_ignore_ascii_case(l))
}

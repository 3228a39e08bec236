//! Markup loader.
//!
//! A hand-rolled recursive descent parser for the XML 1.0 subset used by
//! installer sources. Unlike a general-purpose loader it preserves layout:
//! whitespace between elements, unexpanded entity references, the DOCTYPE
//! text, and each element's source span all survive into the tree so the
//! formatter can judge and reproduce them.
//!
//! Loading is all-or-nothing: a malformed file yields a single
//! [`ParseError`] and no tree.

pub(crate) mod input;
mod xml;

use crate::error::ParseError;
use crate::tree::Document;

use input::{
    DEFAULT_MAX_ATTRIBUTES, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NAME_LENGTH, DEFAULT_MAX_REFERENCES,
};

/// Limits applied while loading.
///
/// ```
/// use wixcop::parser::ParseOptions;
///
/// let opts = ParseOptions::default().max_depth(128);
/// assert_eq!(opts.max_depth, 128);
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Maximum element nesting depth (default: 256).
    pub max_depth: u32,
    /// Maximum number of attributes on a single element (default: 256).
    pub max_attributes: u32,
    /// Maximum length in bytes of an element or attribute name (default: 50,000).
    pub max_name_length: usize,
    /// Maximum number of references resolved per document (default: 1,000,000).
    pub max_references: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_attributes: DEFAULT_MAX_ATTRIBUTES,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            max_references: DEFAULT_MAX_REFERENCES,
        }
    }
}

impl ParseOptions {
    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    /// Sets the maximum number of attributes per element.
    #[must_use]
    pub fn max_attributes(mut self, max: u32) -> Self {
        self.max_attributes = max;
        self
    }

    /// Sets the maximum element/attribute name length in bytes.
    #[must_use]
    pub fn max_name_length(mut self, max: usize) -> Self {
        self.max_name_length = max;
        self
    }

    /// Sets the maximum number of references resolved per document.
    #[must_use]
    pub fn max_references(mut self, max: u32) -> Self {
        self.max_references = max;
        self
    }
}

/// Parses markup text with default options.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed.
pub fn parse_str(input: &str) -> Result<Document, ParseError> {
    parse_str_with_options(input, &ParseOptions::default())
}

/// Parses markup text with the given options.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed or exceeds a limit.
pub fn parse_str_with_options(input: &str, options: &ParseOptions) -> Result<Document, ParseError> {
    xml::XmlParser::new(input, options).parse()
}

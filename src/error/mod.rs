//! Error types shared by the loader and the conversion pipeline.
//!
//! Parse failures carry a [`SourceLocation`] (line, column, byte offset) so
//! that every report can point at the offending markup. Failures that are
//! scoped to a whole run (settings) or to one file (I/O) live next to the
//! code that raises them: see [`crate::settings::SettingsError`] and
//! [`crate::convert::ConvertError`].

use std::fmt;

/// Source location within a markup document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl SourceLocation {
    /// Creates a location from a line and column, with no byte offset.
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            line,
            column,
            byte_offset: 0,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error type returned when markup cannot be loaded.
///
/// Fatal to the file being loaded, never to a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the error occurred.
    pub location: SourceLocation,
}

impl ParseError {
    /// Creates a parse error at the given location.
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.location, self.message)
    }
}

impl std::error::Error for ParseError {}

//! # wixcop
//!
//! Migrates WiX installer sources from earlier schema generations to the
//! current one and enforces a single canonical layout. Legacy namespaces
//! are rewritten, deprecated attributes are renamed or recomputed, and
//! whitespace and declarations are normalized. Every fix is reported as a
//! [`Diagnostic`] with a stable [`TestType`] id.
//!
//! ## Quick Start
//!
//! ```
//! use wixcop::{convert, Document, Settings};
//!
//! let mut doc = Document::parse_str(
//!     "<?xml version='1.0' encoding='utf-8'?>\n<Wix xmlns='http://schemas.microsoft.com/wix/2006/wi' />",
//! )
//! .unwrap();
//! assert_eq!(convert(&mut doc, &Settings::default()), 1);
//! ```
//!
//! Running the pipeline over its own output yields no further fixes.

pub mod batch;
pub mod convert;
pub mod diagnostics;
pub mod encoding;
pub mod error;
pub mod format;
pub mod namespace;
pub mod parser;
pub mod rules;
pub mod serial;
pub mod settings;
pub mod tree;

// Re-export primary types at the crate root for convenience.
pub use convert::{convert, Conversion, ConvertError, Converter};
pub use diagnostics::{Diagnostic, Severity, TestType};
pub use error::{ParseError, SourceLocation};
pub use settings::{Settings, SettingsError};
pub use tree::{Attribute, Document, NodeId};

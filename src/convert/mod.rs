//! The conversion pipeline.
//!
//! One document goes through namespace normalization, rule application,
//! layout canonicalization and serialization, strictly in that order. Each
//! call owns its document and its diagnostics, so independent files can be
//! converted on separate threads with a shared [`Settings`].

use std::fmt;
use std::path::{Path, PathBuf};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::encoding::{self, EncodingError};
use crate::error::{ParseError, SourceLocation};
use crate::format::{self, DEFAULT_INDENT};
use crate::namespace;
use crate::rules;
use crate::serial;
use crate::settings::Settings;
use crate::tree::Document;

/// A file-scoped failure. The batch driver reports it and moves on to the
/// next file.
#[derive(Debug)]
pub enum ConvertError {
    /// The file is not well-formed markup, or its bytes cannot be decoded.
    Parse {
        /// The offending file.
        path: PathBuf,
        /// What went wrong and where.
        error: ParseError,
    },
    /// The file could not be read or written.
    Io {
        /// The offending file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The converted text cannot be written in the declared encoding.
    Encoding {
        /// The offending file.
        path: PathBuf,
        /// The underlying encoding error.
        error: EncodingError,
    },
}

impl ConvertError {
    /// The file the error belongs to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConvertError::Parse { path, .. }
            | ConvertError::Io { path, .. }
            | ConvertError::Encoding { path, .. } => path,
        }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Parse { path, error } => {
                let SourceLocation { line, column, .. } = error.location;
                write!(f, "{}({line},{column}): {}", path.display(), error.message)
            }
            ConvertError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            ConvertError::Encoding { path, error } => write!(f, "{}: {error}", path.display()),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Parse { error, .. } => Some(error),
            ConvertError::Io { source, .. } => Some(source),
            ConvertError::Encoding { error, .. } => Some(error),
        }
    }
}

/// The result of converting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// The canonical text.
    pub output: String,
    /// Every fix recorded, in pipeline order.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether `output` differs from the input text.
    pub changed: bool,
}

impl Conversion {
    /// Number of diagnostics recorded.
    #[must_use]
    pub fn count(&self) -> usize {
        self.diagnostics.len()
    }

    /// Whether a fixing run writes `output` back. Layout the serializer
    /// normalizes without a diagnostic (line endings, quote style, attribute
    /// wrapping) never triggers a write on its own.
    #[must_use]
    pub fn needs_write(&self) -> bool {
        self.changed && self.count() > 0
    }
}

/// Converts documents with one settings overlay and indentation width.
///
/// # Examples
///
/// ```
/// use wixcop::{Converter, Settings};
///
/// let settings = Settings::default();
/// let converter = Converter::new(&settings, 2);
/// let result = converter
///     .convert_str("<?xml version='1.0' encoding='utf-8'?>\n<Wix xmlns='http://schemas.microsoft.com/wix/2006/wi' />")
///     .unwrap();
/// assert_eq!(result.count(), 1);
/// assert!(result.output.contains("http://wixtoolset.org/schemas/v4/wxs"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Converter<'s> {
    settings: &'s Settings,
    indentation_amount: usize,
}

impl<'s> Converter<'s> {
    /// Creates a converter indenting by `indentation_amount` spaces.
    #[must_use]
    pub fn new(settings: &'s Settings, indentation_amount: usize) -> Self {
        Self {
            settings,
            indentation_amount,
        }
    }

    /// The settings overlay in use.
    #[must_use]
    pub fn settings(&self) -> &'s Settings {
        self.settings
    }

    /// Runs every stage on `doc` in place and returns what was fixed.
    pub fn convert_document(&self, doc: &mut Document) -> Vec<Diagnostic> {
        let path = doc.path().map(Path::to_path_buf);
        let mut diagnostics = Diagnostics::new(self.settings, path.as_deref());

        let namespaces = namespace::normalize(doc, &mut diagnostics);
        let rules = rules::apply(doc, &mut diagnostics);
        let layout = format::canonicalize(doc, self.indentation_amount, &mut diagnostics);
        log::debug!(
            "{}: {namespaces} namespace, {rules} rule, {layout} layout fixes",
            path.as_deref()
                .map_or_else(|| "<input>".to_string(), |p| p.display().to_string())
        );

        diagnostics.into_vec()
    }

    /// Converts markup text.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if `text` is not well-formed.
    pub fn convert_str(&self, text: &str) -> Result<Conversion, ParseError> {
        let mut doc = Document::parse_str(text)?;
        Ok(self.finish(&mut doc, text))
    }

    /// Converts a file, writing the result back when `fix` is set and
    /// [`Conversion::needs_write`] holds. The file keeps the encoding its declaration names.
    ///
    /// # Errors
    ///
    /// Returns `ConvertError` if the file cannot be read, decoded, parsed,
    /// encoded or written.
    pub fn convert_file(&self, path: &Path, fix: bool) -> Result<Conversion, ConvertError> {
        let bytes = std::fs::read(path).map_err(|source| ConvertError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = encoding::decode(&bytes).map_err(|e| ConvertError::Parse {
            path: path.to_path_buf(),
            error: ParseError::new(e.message, SourceLocation::default()),
        })?;
        let mut doc = Document::parse_str(&text)
            .map_err(|error| ConvertError::Parse {
                path: path.to_path_buf(),
                error,
            })?
            .with_path(path);

        let conversion = self.finish(&mut doc, &text);
        if fix && conversion.needs_write() {
            let label = doc
                .declaration
                .as_ref()
                .and_then(|d| d.encoding.as_deref())
                .unwrap_or(format::DEFAULT_DECLARATION_ENCODING);
            let out = encoding::encode(&conversion.output, label).map_err(|error| {
                ConvertError::Encoding {
                    path: path.to_path_buf(),
                    error,
                }
            })?;
            std::fs::write(path, out).map_err(|source| ConvertError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            log::info!("{}: rewritten", path.display());
        }
        Ok(conversion)
    }

    fn finish(&self, doc: &mut Document, input: &str) -> Conversion {
        let diagnostics = self.convert_document(doc);
        let output = serial::serialize(doc, self.settings);
        let changed = output != input.strip_prefix('\u{FEFF}').unwrap_or(input);
        Conversion {
            output,
            diagnostics,
            changed,
        }
    }
}

/// Converts `doc` in place with the default indentation and returns the
/// number of fixes recorded.
pub fn convert(doc: &mut Document, settings: &Settings) -> usize {
    Converter::new(settings, DEFAULT_INDENT)
        .convert_document(doc)
        .len()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diagnostics::TestType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_convert_counts_every_stage() {
        let mut doc = Document::parse_str(
            "<Wix xmlns='http://schemas.microsoft.com/wix/2006/wi'><Component Guid='*'/></Wix>",
        )
        .unwrap();
        // namespace, Guid, declaration
        assert_eq!(convert(&mut doc, &Settings::default()), 3);
    }

    #[test]
    fn test_convert_str_output() {
        let settings = Settings::default();
        let result = Converter::new(&settings, 2)
            .convert_str("<?xml version='1.0' encoding='utf-8'?>\n<Wix xmlns='http://wixtoolset.org/schemas/v4/wxs'>\n<Fragment>\n</Fragment>\n</Wix>")
            .unwrap();
        let tests: Vec<TestType> = result.diagnostics.iter().map(|d| d.test).collect();
        assert_eq!(
            tests,
            [TestType::WhitespacePrecedingNodeWrong, TestType::NotEmptyElement]
        );
        assert_eq!(
            result.output,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Wix xmlns=\"http://wixtoolset.org/schemas/v4/wxs\">\n  <Fragment />\n</Wix>\n"
        );
        assert!(result.changed);
    }

    #[test]
    fn test_canonical_input_unchanged() {
        let text = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Wix xmlns=\"http://wixtoolset.org/schemas/v4/wxs\">\n    <Fragment />\n</Wix>\n";
        let settings = Settings::default();
        let result = Converter::new(&settings, 4).convert_str(text).unwrap();
        assert_eq!(result.count(), 0);
        assert!(!result.changed);
        assert_eq!(result.output, text);
    }

    #[test]
    fn test_parse_error_propagates() {
        let settings = Settings::default();
        let err = Converter::new(&settings, 4)
            .convert_str("<Wix><Fragment></Wix>")
            .unwrap_err();
        assert!(err.message.contains("mismatch") || err.message.contains("end tag"));
    }

    #[test]
    fn test_convert_file_fix_writes_utf16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Product.wxs");
        std::fs::write(&path, "<Wix xmlns='http://wixtoolset.org/schemas/v4/wxs' />").unwrap();

        let settings = Settings::default();
        let converter = Converter::new(&settings, 4);
        let first = converter.convert_file(&path, true).unwrap();
        assert_eq!(first.count(), 1);
        assert_eq!(first.diagnostics[0].test, TestType::DeclarationMissing);
        assert_eq!(first.diagnostics[0].file.as_deref(), Some(path.as_path()));

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"\xFF\xFE");

        let second = converter.convert_file(&path, true).unwrap();
        assert_eq!(second.count(), 0);
        assert!(!second.changed);
    }

    #[test]
    fn test_uncounted_layout_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Product.wxs");
        let original = "<?xml version='1.0' encoding='utf-8'?>\r\n<Wix xmlns='http://wixtoolset.org/schemas/v4/wxs'>\r\n    <Fragment Id='f'\r\n        />\r\n</Wix>\r\n";
        std::fs::write(&path, original).unwrap();

        let settings = Settings::default();
        let result = Converter::new(&settings, 4).convert_file(&path, true).unwrap();
        assert_eq!(result.count(), 0);
        assert!(result.changed);
        assert!(!result.needs_write());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_convert_file_without_fix_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Product.wxs");
        let original = "<Wix xmlns='http://schemas.microsoft.com/wix/2006/wi'/>";
        std::fs::write(&path, original).unwrap();

        let settings = Settings::default();
        let result = Converter::new(&settings, 4).convert_file(&path, false).unwrap();
        assert_eq!(result.count(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_convert_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.wxs");
        let settings = Settings::default();
        let err = Converter::new(&settings, 4).convert_file(&path, false).unwrap_err();
        assert!(matches!(err, ConvertError::Io { .. }));
        assert_eq!(err.path(), path.as_path());
    }
}

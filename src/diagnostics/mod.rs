//! Fix identifiers and the per-file diagnostic collector.
//!
//! Every fix the pipeline can make has a stable [`TestType`] id, used in
//! settings files to suppress a fix or downgrade it to a warning. A
//! [`Diagnostics`] collector is created per file, consulted before each fix
//! (a suppressed id must not be applied), and drained into the returned
//! list when the conversion finishes. Nothing is retained between files.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::SourceLocation;
use crate::settings::Settings;

/// Stable identifier of one kind of fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TestType {
    /// The document has no XML declaration.
    DeclarationMissing,
    /// The XML declaration does not name an encoding.
    DeclarationEncodingMissing,
    /// The root element declares no namespace.
    XmlnsMissing,
    /// A namespace declaration uses a legacy URI.
    NamespaceChanged,
    /// The whitespace before a child node is not canonical.
    WhitespacePrecedingNodeWrong,
    /// The whitespace before a closing tag is not canonical.
    WhitespacePrecedingEndElementWrong,
    /// Whitespace precedes a CDATA section.
    WhitespacePrecedingCDATAWrong,
    /// Whitespace follows a CDATA section.
    WhitespaceFollowingCDATAWrong,
    /// A CDATA payload starts or ends with whitespace.
    CDATAContentWhitespace,
    /// An element's only content is whitespace.
    NotEmptyElement,
    /// `SuppressSignatureValidation` has been replaced by
    /// `EnableSignatureValidation`.
    SuppressSignatureValidationDeprecated,
    /// A `File` has no `Id`.
    AssignAnonymousFileId,
    /// `Component/@Guid="*"` is the default.
    AutoGuidUnnecessary,
    /// `CustomAction/@BinaryKey` is now `BinaryRef`.
    BinaryKeyRenamed,
    /// `CustomAction/@FileKey` is now `FileRef`.
    FileKeyRenamed,
    /// `ExePackage/@*Command` is now `*Arguments`.
    ExePackageCommandRenamed,
    /// `Win64` has been replaced by `Bitness`.
    Win64AttributeReplaced,
    /// `Feature/@Absent` has been replaced by `AllowAbsent`.
    FeatureAbsentReplaced,
    /// A migration rule could not compute its result.
    RuleApplicationError,
}

impl TestType {
    /// Every id, in declaration order.
    pub const ALL: [TestType; 19] = [
        TestType::DeclarationMissing,
        TestType::DeclarationEncodingMissing,
        TestType::XmlnsMissing,
        TestType::NamespaceChanged,
        TestType::WhitespacePrecedingNodeWrong,
        TestType::WhitespacePrecedingEndElementWrong,
        TestType::WhitespacePrecedingCDATAWrong,
        TestType::WhitespaceFollowingCDATAWrong,
        TestType::CDATAContentWhitespace,
        TestType::NotEmptyElement,
        TestType::SuppressSignatureValidationDeprecated,
        TestType::AssignAnonymousFileId,
        TestType::AutoGuidUnnecessary,
        TestType::BinaryKeyRenamed,
        TestType::FileKeyRenamed,
        TestType::ExePackageCommandRenamed,
        TestType::Win64AttributeReplaced,
        TestType::FeatureAbsentReplaced,
        TestType::RuleApplicationError,
    ];

    /// The id as written in settings files and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TestType::DeclarationMissing => "DeclarationMissing",
            TestType::DeclarationEncodingMissing => "DeclarationEncodingMissing",
            TestType::XmlnsMissing => "XmlnsMissing",
            TestType::NamespaceChanged => "NamespaceChanged",
            TestType::WhitespacePrecedingNodeWrong => "WhitespacePrecedingNodeWrong",
            TestType::WhitespacePrecedingEndElementWrong => "WhitespacePrecedingEndElementWrong",
            TestType::WhitespacePrecedingCDATAWrong => "WhitespacePrecedingCDATAWrong",
            TestType::WhitespaceFollowingCDATAWrong => "WhitespaceFollowingCDATAWrong",
            TestType::CDATAContentWhitespace => "CDATAContentWhitespace",
            TestType::NotEmptyElement => "NotEmptyElement",
            TestType::SuppressSignatureValidationDeprecated => {
                "SuppressSignatureValidationDeprecated"
            }
            TestType::AssignAnonymousFileId => "AssignAnonymousFileId",
            TestType::AutoGuidUnnecessary => "AutoGuidUnnecessary",
            TestType::BinaryKeyRenamed => "BinaryKeyRenamed",
            TestType::FileKeyRenamed => "FileKeyRenamed",
            TestType::ExePackageCommandRenamed => "ExePackageCommandRenamed",
            TestType::Win64AttributeReplaced => "Win64AttributeReplaced",
            TestType::FeatureAbsentReplaced => "FeatureAbsentReplaced",
            TestType::RuleApplicationError => "RuleApplicationError",
        }
    }

    /// Looks up an id by name (case-sensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a diagnostic is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The default for every fix.
    Error,
    /// Fixes listed under `ErrorsAsWarnings`.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// One recorded fix or failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Which fix this is.
    pub test: TestType,
    /// Reporting severity after settings are applied.
    pub severity: Severity,
    /// The file the document came from, if known.
    pub file: Option<PathBuf>,
    /// Where in the source the fixed construct starts.
    pub location: SourceLocation,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}", file.display())?;
        }
        write!(
            f,
            "({},{}): {} {}: {}",
            self.location.line, self.location.column, self.severity, self.test, self.message
        )
    }
}

/// Per-file diagnostic collector.
///
/// Consults the settings on every report: an ignored id is dropped and the
/// caller is told not to apply the fix.
#[derive(Debug)]
pub struct Diagnostics<'s> {
    settings: &'s Settings,
    file: Option<PathBuf>,
    entries: Vec<Diagnostic>,
}

impl<'s> Diagnostics<'s> {
    /// Creates an empty collector for one file.
    #[must_use]
    pub fn new(settings: &'s Settings, file: Option<&Path>) -> Self {
        Self {
            settings,
            file: file.map(Path::to_path_buf),
            entries: Vec::new(),
        }
    }

    /// The settings this collector reports against.
    #[must_use]
    pub fn settings(&self) -> &'s Settings {
        self.settings
    }

    /// Records a fix. Returns `false` when the id is suppressed, in which
    /// case nothing is recorded and the fix must not be applied.
    pub fn report(
        &mut self,
        test: TestType,
        location: SourceLocation,
        message: impl Into<String>,
    ) -> bool {
        if self.settings.is_ignored(test) {
            log::trace!("{test} suppressed at {location}");
            return false;
        }
        let severity = if self.settings.is_warning(test) {
            Severity::Warning
        } else {
            Severity::Error
        };
        let diagnostic = Diagnostic {
            test,
            severity,
            file: self.file.clone(),
            location,
            message: message.into(),
        };
        log::debug!("{diagnostic}");
        self.entries.push(diagnostic);
        true
    }

    /// Number of diagnostics recorded so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The recorded diagnostics, in report order.
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Consumes the collector, returning its diagnostics.
    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for test in TestType::ALL {
            assert_eq!(TestType::from_name(test.as_str()), Some(test));
        }
        assert_eq!(TestType::from_name("namespacechanged"), None);
        assert_eq!(TestType::from_name(""), None);
    }

    #[test]
    fn test_report_records_error() {
        let settings = Settings::default();
        let mut diagnostics = Diagnostics::new(&settings, Some(Path::new("Product.wxs")));
        assert!(diagnostics.report(
            TestType::NamespaceChanged,
            SourceLocation::new(1, 2),
            "namespace changed"
        ));
        assert_eq!(diagnostics.count(), 1);
        let d = &diagnostics.entries()[0];
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(
            d.to_string(),
            "Product.wxs(1,2): error NamespaceChanged: namespace changed"
        );
    }

    #[test]
    fn test_report_suppressed() {
        let settings = Settings::default().ignore(TestType::NotEmptyElement);
        let mut diagnostics = Diagnostics::new(&settings, None);
        assert!(!diagnostics.report(TestType::NotEmptyElement, SourceLocation::new(1, 1), "x"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_report_as_warning() {
        let settings = Settings::default().warn(TestType::AutoGuidUnnecessary);
        let mut diagnostics = Diagnostics::new(&settings, None);
        assert!(diagnostics.report(
            TestType::AutoGuidUnnecessary,
            SourceLocation::new(4, 7),
            "guid"
        ));
        let all = diagnostics.into_vec();
        assert_eq!(all[0].severity, Severity::Warning);
        assert_eq!(all[0].to_string(), "(4,7): warning AutoGuidUnnecessary: guid");
    }
}

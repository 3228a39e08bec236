//! The settings overlay.
//!
//! Settings are read once per run from zero or more XML files, merged, and
//! then shared read-only by every conversion in that run:
//!
//! ```xml
//! <Settings>
//!   <IgnoreErrors><Test Id="WhitespacePrecedingNodeWrong"/></IgnoreErrors>
//!   <ErrorsAsWarnings><Test Id="NamespaceChanged"/></ErrorsAsWarnings>
//!   <ExemptFiles><File Name="Generated.wxs"/></ExemptFiles>
//!   <PassThrough><Element Name="CustomTable"/></PassThrough>
//! </Settings>
//! ```
//!
//! A malformed settings file affects every file in the run, so it is
//! reported as a [`SettingsError`] before any conversion starts.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::diagnostics::TestType;
use crate::tree::{Document, NodeId};

/// A settings file could not be read or understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsError {
    /// The settings file, if the settings came from one.
    pub path: Option<PathBuf>,
    /// What was wrong.
    pub message: String,
}

impl SettingsError {
    fn new(path: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            message: message.into(),
        }
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: settings error: {}", path.display(), self.message),
            None => write!(f, "settings error: {}", self.message),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Immutable per-run configuration.
///
/// # Examples
///
/// ```
/// use wixcop::{Settings, TestType};
///
/// let settings = Settings::default()
///     .ignore(TestType::WhitespacePrecedingNodeWrong)
///     .pass_through("CustomTable");
/// assert!(settings.is_ignored(TestType::WhitespacePrecedingNodeWrong));
/// assert!(settings.is_pass_through("CustomTable"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    ignored: BTreeSet<TestType>,
    warnings: BTreeSet<TestType>,
    exempt_files: BTreeSet<String>,
    pass_through: BTreeSet<String>,
}

impl Settings {
    /// Loads settings from an optional file. No path yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the file cannot be read or is malformed.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load_all(&[path]),
            None => Ok(Self::default()),
        }
    }

    /// Loads and merges several settings files; later files add to earlier
    /// ones.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for the first file that cannot be read or is
    /// malformed.
    pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        for path in paths {
            let path = path.as_ref();
            let bytes = std::fs::read(path)
                .map_err(|e| SettingsError::new(Some(path), e.to_string()))?;
            let doc = Document::parse_bytes(&bytes)
                .map_err(|e| SettingsError::new(Some(path), e.to_string()))?;
            settings.merge_document(&doc, Some(path))?;
            log::debug!("loaded settings from {}", path.display());
        }
        Ok(settings)
    }

    /// Parses settings from text.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the text is malformed.
    pub fn parse_str(text: &str) -> Result<Self, SettingsError> {
        let doc = Document::parse_str(text).map_err(|e| SettingsError::new(None, e.to_string()))?;
        let mut settings = Self::default();
        settings.merge_document(&doc, None)?;
        Ok(settings)
    }

    fn merge_document(&mut self, doc: &Document, path: Option<&Path>) -> Result<(), SettingsError> {
        let err = |id: NodeId, message: String| {
            SettingsError::new(path, format!("line {}: {message}", doc.location(id).line))
        };

        let root = doc
            .root_element()
            .ok_or_else(|| SettingsError::new(path, "missing root element"))?;
        if doc.node_name(root) != Some("Settings") {
            return Err(err(
                root,
                format!(
                    "expected <Settings> root element, found <{}>",
                    doc.node_name(root).unwrap_or_default()
                ),
            ));
        }

        for section in child_elements(doc, root) {
            let section_name = doc.node_name(section).unwrap_or_default();
            let (item, attribute) = match section_name {
                "IgnoreErrors" | "ErrorsAsWarnings" => ("Test", "Id"),
                "ExemptFiles" => ("File", "Name"),
                "PassThrough" => ("Element", "Name"),
                other => return Err(err(section, format!("unknown settings element <{other}>"))),
            };

            for entry in child_elements(doc, section) {
                let entry_name = doc.node_name(entry).unwrap_or_default();
                if entry_name != item {
                    return Err(err(
                        entry,
                        format!("unexpected <{entry_name}> in <{section_name}>, expected <{item}>"),
                    ));
                }
                let value = doc
                    .attribute(entry, attribute)
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| {
                        err(entry, format!("<{item}> is missing the {attribute} attribute"))
                    })?
                    .trim();

                match section_name {
                    "IgnoreErrors" | "ErrorsAsWarnings" => {
                        let test = TestType::from_name(value)
                            .ok_or_else(|| err(entry, format!("unknown test id '{value}'")))?;
                        if section_name == "IgnoreErrors" {
                            self.ignored.insert(test);
                        } else {
                            self.warnings.insert(test);
                        }
                    }
                    "ExemptFiles" => {
                        self.exempt_files.insert(value.to_ascii_lowercase());
                    }
                    _ => {
                        self.pass_through.insert(value.to_string());
                    }
                }
            }
        }
        Ok(())
    }

    /// Suppresses a fix.
    #[must_use]
    pub fn ignore(mut self, test: TestType) -> Self {
        self.ignored.insert(test);
        self
    }

    /// Reports a fix as a warning instead of an error.
    #[must_use]
    pub fn warn(mut self, test: TestType) -> Self {
        self.warnings.insert(test);
        self
    }

    /// Exempts a file name from batch runs.
    #[must_use]
    pub fn exempt_file(mut self, name: &str) -> Self {
        self.exempt_files.insert(name.to_ascii_lowercase());
        self
    }

    /// Marks an element name whose subtree is left exactly as written.
    #[must_use]
    pub fn pass_through(mut self, name: &str) -> Self {
        self.pass_through.insert(name.to_string());
        self
    }

    /// Returns `true` if the fix is suppressed.
    #[must_use]
    pub fn is_ignored(&self, test: TestType) -> bool {
        self.ignored.contains(&test)
    }

    /// Returns `true` if the fix is reported as a warning.
    #[must_use]
    pub fn is_warning(&self, test: TestType) -> bool {
        self.warnings.contains(&test)
    }

    /// Returns `true` if the file's name is exempt. Names compare
    /// case-insensitively.
    #[must_use]
    pub fn is_exempt(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| self.exempt_files.contains(&n.to_ascii_lowercase()))
    }

    /// Returns `true` if elements with this local name are passed through.
    #[must_use]
    pub fn is_pass_through(&self, local_name: &str) -> bool {
        self.pass_through.contains(local_name)
    }
}

fn child_elements(doc: &Document, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    doc.children(id).filter(|&c| doc.node(c).kind.is_element())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FULL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Settings>
  <!-- generated by the build -->
  <IgnoreErrors>
    <Test Id="WhitespacePrecedingNodeWrong" />
  </IgnoreErrors>
  <ErrorsAsWarnings>
    <Test Id="NamespaceChanged" />
  </ErrorsAsWarnings>
  <ExemptFiles>
    <File Name="Generated.wxs" />
  </ExemptFiles>
  <PassThrough>
    <Element Name="CustomTable" />
  </PassThrough>
</Settings>
"#;

    #[test]
    fn test_parse_full_settings() {
        let settings = Settings::parse_str(FULL).unwrap();
        assert!(settings.is_ignored(TestType::WhitespacePrecedingNodeWrong));
        assert!(!settings.is_ignored(TestType::NamespaceChanged));
        assert!(settings.is_warning(TestType::NamespaceChanged));
        assert!(settings.is_exempt(Path::new("src/GENERATED.wxs")));
        assert!(!settings.is_exempt(Path::new("Product.wxs")));
        assert!(settings.is_pass_through("CustomTable"));
        assert!(!settings.is_pass_through("customtable"));
    }

    #[test]
    fn test_load_none_is_default() {
        assert_eq!(Settings::load(None).unwrap(), Settings::default());
    }

    #[test]
    fn test_empty_settings_element() {
        assert_eq!(Settings::parse_str("<Settings/>").unwrap(), Settings::default());
    }

    #[test]
    fn test_unknown_test_id() {
        let err = Settings::parse_str(
            "<Settings>\n<IgnoreErrors><Test Id='NoSuchTest'/></IgnoreErrors></Settings>",
        )
        .unwrap_err();
        assert_eq!(err.message, "line 2: unknown test id 'NoSuchTest'");
    }

    #[test]
    fn test_unknown_section() {
        let err = Settings::parse_str("<Settings><Bogus/></Settings>").unwrap_err();
        assert!(err.message.contains("unknown settings element <Bogus>"));
    }

    #[test]
    fn test_wrong_root() {
        let err = Settings::parse_str("<Wix/>").unwrap_err();
        assert!(err.message.contains("expected <Settings>"));
    }

    #[test]
    fn test_missing_attribute() {
        let err = Settings::parse_str("<Settings><PassThrough><Element/></PassThrough></Settings>")
            .unwrap_err();
        assert!(err.message.contains("missing the Name attribute"));
    }

    #[test]
    fn test_wrong_entry_element() {
        let err = Settings::parse_str("<Settings><ExemptFiles><Test Id='x'/></ExemptFiles></Settings>")
            .unwrap_err();
        assert!(err.message.contains("expected <File>"));
    }

    #[test]
    fn test_malformed_xml() {
        assert!(Settings::parse_str("<Settings>").is_err());
    }

    #[test]
    fn test_load_all_merges_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.xml");
        let second = dir.path().join("second.xml");
        std::fs::write(
            &first,
            "<Settings><IgnoreErrors><Test Id='NotEmptyElement'/></IgnoreErrors></Settings>",
        )
        .unwrap();
        std::fs::write(
            &second,
            "<Settings><PassThrough><Element Name='Data'/></PassThrough></Settings>",
        )
        .unwrap();

        let settings = Settings::load_all(&[&first, &second]).unwrap();
        assert!(settings.is_ignored(TestType::NotEmptyElement));
        assert!(settings.is_pass_through("Data"));
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = Settings::load(Some(Path::new("/nonexistent/settings.xml"))).unwrap_err();
        assert_eq!(err.path.as_deref(), Some(Path::new("/nonexistent/settings.xml")));
        assert!(err.to_string().starts_with("/nonexistent/settings.xml: settings error:"));
    }

    #[test]
    fn test_pass_through_builder() {
        let settings = Settings::default().pass_through("CustomTable");
        assert!(settings.is_pass_through("CustomTable"));
        assert!(!settings.is_pass_through("Row"));
        assert!(!Settings::default().is_pass_through("CustomTable"));
    }
}

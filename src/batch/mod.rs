//! Batch driver.
//!
//! Resolves file patterns, loads the settings overlay once, converts every
//! matched file and folds the per-file outcomes into one exit code. Parse
//! and I/O failures are file-scoped: the batch records them and continues.
//! A settings failure aborts before any file is touched.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::convert::{ConvertError, Converter};
use crate::diagnostics::Diagnostic;
use crate::format::DEFAULT_INDENT;
use crate::settings::{Settings, SettingsError};

/// No file had anything to fix.
pub const EXIT_CLEAN: i32 = 0;
/// A file could not be read, parsed or written, or settings failed to load.
pub const EXIT_FATAL: i32 = 1;
/// At least one file had diagnostics, fixed or not.
pub const EXIT_DIAGNOSTICS: i32 = 2;

/// File names searched for in directories.
const SOURCE_GLOBS: &[&str] = &["*.wxs", "*.wxi", "*.wxl"];

/// A failure recorded by the batch.
#[derive(Debug)]
pub enum BatchError {
    /// The settings overlay could not be loaded. Nothing was converted.
    Settings(SettingsError),
    /// One file failed.
    Convert(ConvertError),
    /// A pattern is malformed or matched nothing.
    Pattern {
        /// The pattern as given.
        pattern: String,
        /// What went wrong.
        message: String,
    },
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::Settings(e) => write!(f, "{e}"),
            BatchError::Convert(e) => write!(f, "{e}"),
            BatchError::Pattern { pattern, message } => write!(f, "{pattern}: {message}"),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::Settings(e) => Some(e),
            BatchError::Convert(e) => Some(e),
            BatchError::Pattern { .. } => None,
        }
    }
}

/// What happened to one converted file.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// The file.
    pub path: PathBuf,
    /// Every fix found in it.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether the canonical text differs from the file.
    pub changed: bool,
    /// Whether the file was rewritten.
    pub written: bool,
}

/// The outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// [`EXIT_CLEAN`], [`EXIT_DIAGNOSTICS`] or [`EXIT_FATAL`].
    pub exit_code: i32,
    /// Files converted, in path order.
    pub files: Vec<FileReport>,
    /// Failures, in the order they occurred.
    pub errors: Vec<BatchError>,
}

impl BatchResult {
    /// Total diagnostics across all files.
    #[must_use]
    pub fn diagnostic_count(&self) -> usize {
        self.files.iter().map(|f| f.diagnostics.len()).sum()
    }

    fn fatal(error: BatchError) -> Self {
        Self {
            exit_code: EXIT_FATAL,
            files: Vec::new(),
            errors: vec![error],
        }
    }
}

/// Batch configuration.
///
/// # Examples
///
/// ```no_run
/// use wixcop::batch::Runner;
///
/// let runner = Runner {
///     fix_errors: true,
///     patterns: vec!["src/installer".to_string()],
///     ..Runner::default()
/// };
/// let result = runner.execute();
/// std::process::exit(result.exit_code);
/// ```
#[derive(Debug, Clone)]
pub struct Runner {
    /// Write canonical output back to files that had fixes.
    pub fix_errors: bool,
    /// Spaces per nesting level.
    pub indentation_amount: usize,
    /// Search directories recursively.
    pub recurse: bool,
    /// Settings files, merged in order.
    pub settings_files: Vec<PathBuf>,
    /// Files, directories or globs.
    pub patterns: Vec<String>,
    /// Set to stop the batch before the next file.
    pub cancel: Arc<AtomicBool>,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            fix_errors: false,
            indentation_amount: DEFAULT_INDENT,
            recurse: false,
            settings_files: Vec::new(),
            patterns: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Runner {
    /// Runs the batch.
    #[must_use]
    pub fn execute(&self) -> BatchResult {
        let settings = match Settings::load_all(&self.settings_files) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{e}");
                return BatchResult::fatal(BatchError::Settings(e));
            }
        };

        let mut result = BatchResult::default();
        let files = self.discover(&mut result.errors);
        log::info!("{} file(s) to inspect", files.len());

        let converter = Converter::new(&settings, self.indentation_amount);
        for path in files {
            if self.cancel.load(Ordering::Relaxed) {
                log::warn!("cancelled before {}", path.display());
                break;
            }
            if settings.is_exempt(&path) {
                log::info!("{}: exempt, skipped", path.display());
                continue;
            }
            match converter.convert_file(&path, self.fix_errors) {
                Ok(conversion) => {
                    log::info!("{}: {} diagnostic(s)", path.display(), conversion.count());
                    result.files.push(FileReport {
                        written: self.fix_errors && conversion.needs_write(),
                        changed: conversion.changed,
                        diagnostics: conversion.diagnostics,
                        path,
                    });
                }
                Err(e) => {
                    log::warn!("{e}");
                    result.errors.push(BatchError::Convert(e));
                }
            }
        }

        result.exit_code = if !result.errors.is_empty() {
            EXIT_FATAL
        } else if result.diagnostic_count() > 0 {
            EXIT_DIAGNOSTICS
        } else {
            EXIT_CLEAN
        };
        result
    }

    /// Resolves the patterns to a sorted, de-duplicated list of files.
    fn discover(&self, errors: &mut Vec<BatchError>) -> Vec<PathBuf> {
        let sources = match source_globs() {
            Ok(set) => set,
            Err(e) => {
                errors.push(BatchError::Pattern {
                    pattern: SOURCE_GLOBS.join(";"),
                    message: e.to_string(),
                });
                return Vec::new();
            }
        };

        let mut files = Vec::new();
        for pattern in &self.patterns {
            let path = Path::new(pattern);
            let before = files.len();
            if path.is_file() {
                files.push(path.to_path_buf());
            } else if path.is_dir() {
                self.walk(path, |name| sources.is_match(name), &mut files);
            } else {
                let dir = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or(Path::new("."));
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match file_glob(&name) {
                    Ok(matcher) => self.walk(dir, |n| matcher.is_match(n), &mut files),
                    Err(e) => {
                        errors.push(BatchError::Pattern {
                            pattern: pattern.clone(),
                            message: e.to_string(),
                        });
                        continue;
                    }
                }
            }
            if files.len() == before {
                errors.push(BatchError::Pattern {
                    pattern: pattern.clone(),
                    message: "no matching files".to_string(),
                });
            }
        }

        files.sort();
        files.dedup();
        files
    }

    fn walk(&self, dir: &Path, matches: impl Fn(&Path) -> bool, files: &mut Vec<PathBuf>) {
        let mut builder = WalkBuilder::new(dir);
        builder
            .standard_filters(false)
            .max_depth(if self.recurse { None } else { Some(1) });

        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("{}: {e}", dir.display());
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_some_and(|t| t.is_file())
                && path.file_name().is_some_and(|n| matches(Path::new(n)))
            {
                files.push(path.to_path_buf());
            }
        }
    }
}

fn file_glob(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(pattern)
        .case_insensitive(true)
        .literal_separator(true)
        .build()?
        .compile_matcher())
}

fn source_globs() -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in SOURCE_GLOBS {
        builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
    }
    builder.build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_source_globs_match_names() {
        let set = source_globs().unwrap();
        assert!(set.is_match("Product.wxs"));
        assert!(set.is_match("Strings.WXL"));
        assert!(set.is_match("Include.wxi"));
        assert!(!set.is_match("Product.wixproj"));
    }

    #[test]
    fn test_file_glob() {
        let matcher = file_glob("Prod*.wxs").unwrap();
        assert!(matcher.is_match("Product.wxs"));
        assert!(!matcher.is_match("Bundle.wxs"));
    }

    #[test]
    fn test_settings_error_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("settings.xml");
        std::fs::write(&settings, "<Settings><Bogus/></Settings>").unwrap();
        let wxs = dir.path().join("Product.wxs");
        std::fs::write(&wxs, "<Wix/>").unwrap();

        let runner = Runner {
            fix_errors: true,
            settings_files: vec![settings],
            patterns: vec![wxs.to_string_lossy().into_owned()],
            ..Runner::default()
        };
        let result = runner.execute();
        assert_eq!(result.exit_code, EXIT_FATAL);
        assert!(matches!(result.errors[0], BatchError::Settings(_)));
        assert!(result.files.is_empty());
        assert_eq!(std::fs::read_to_string(&wxs).unwrap(), "<Wix/>");
    }

    #[test]
    fn test_cancelled_runner_converts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.wxs"), "<Wix/>").unwrap();
        let runner = Runner {
            patterns: vec![dir.path().to_string_lossy().into_owned()],
            ..Runner::default()
        };
        runner.cancel.store(true, Ordering::Relaxed);
        let result = runner.execute();
        assert!(result.files.is_empty());
        assert_eq!(result.exit_code, EXIT_CLEAN);
    }
}

//! Spooler and scan configuration.

use crate::error::{CoreError, CoreResult};
use crate::event::{ErrorVerbosity, Severity};
use crate::format::FormatSettings;
use crate::scan::ColumnSelection;
use crate::{DEFAULT_MAX_FILES, SEGMENT_SUFFIX};
use pglog_storage::DEFAULT_FILE_MODE;
use std::path::{Component, Path, PathBuf};

/// Default spool directory, relative to the working directory of the host.
pub const DEFAULT_SPOOL_DIRECTORY: &str = "pglog_spool";

/// Configuration for the event spooler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoolConfig {
    /// Where segments are written. `None` or empty disables spooling.
    pub directory: Option<PathBuf>,

    /// Events below this severity are not spooled.
    pub min_messages: Severity,

    /// Events below this severity are spooled without the current statement.
    pub min_error_statement: Severity,

    /// The location cell is only written at `Verbose`.
    pub error_verbosity: ErrorVerbosity,

    /// Permission bits for new segment files. Owner read/write is always kept.
    pub file_mode: u32,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            directory: Some(PathBuf::from(DEFAULT_SPOOL_DIRECTORY)),
            min_messages: Severity::Warning,
            min_error_statement: Severity::Error,
            error_verbosity: ErrorVerbosity::Default,
            file_mode: DEFAULT_FILE_MODE,
        }
    }
}

impl SpoolConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the spool directory (canonicalized).
    #[must_use]
    pub fn directory(mut self, dir: impl AsRef<Path>) -> Self {
        self.directory = Some(canonicalize_path(dir.as_ref()));
        self
    }

    /// Disables spooling by clearing the directory.
    #[must_use]
    pub fn no_directory(mut self) -> Self {
        self.directory = None;
        self
    }

    /// Sets the minimum severity to spool.
    #[must_use]
    pub const fn min_messages(mut self, severity: Severity) -> Self {
        self.min_messages = severity;
        self
    }

    /// Sets the minimum severity at which the current statement is recorded.
    #[must_use]
    pub const fn min_error_statement(mut self, severity: Severity) -> Self {
        self.min_error_statement = severity;
        self
    }

    /// Sets the error verbosity.
    #[must_use]
    pub const fn error_verbosity(mut self, verbosity: ErrorVerbosity) -> Self {
        self.error_verbosity = verbosity;
        self
    }

    /// Sets the permission bits for new segment files.
    #[must_use]
    pub const fn file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }

    /// Settings handed to the formatter.
    #[must_use]
    pub fn format_settings(&self) -> FormatSettings {
        FormatSettings {
            error_verbosity: self.error_verbosity,
            min_error_statement: self.min_error_statement,
        }
    }

    /// Checks the configuration before a spooler is built from it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the directory is not
    /// representable or the file mode has bits outside `0o777`.
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(dir) = &self.directory {
            validate_directory(&dir.to_string_lossy())?;
        }
        if self.file_mode & !0o777 != 0 {
            return Err(CoreError::invalid_config(format!(
                "invalid file mode {:o}",
                self.file_mode
            )));
        }
        Ok(())
    }
}

/// Rejects directory values that cannot name a directory.
pub(crate) fn validate_directory(value: &str) -> CoreResult<()> {
    if value.contains('\0') {
        return Err(CoreError::invalid_config(
            "spool directory must not contain NUL characters",
        ));
    }
    Ok(())
}

/// Canonicalizes a path textually, without touching the filesystem.
///
/// Duplicate separators, `.` components and trailing separators are
/// removed, and `dir/..` pairs are folded away where possible.
#[must_use]
pub fn canonicalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir if !parts.is_empty() => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                Some(Component::CurDir) => {
                    parts.pop();
                    parts.push(Component::ParentDir);
                }
                _ => parts.push(Component::ParentDir),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Options for discovering and scanning segment files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Directory holding the segments.
    pub directory: PathBuf,

    /// File name suffix that marks a segment.
    pub suffix: String,

    /// At most this many segments are discovered.
    pub max_files: usize,

    /// Columns the caller actually needs. Advisory only.
    pub projection: Option<ColumnSelection>,
}

impl ScanOptions {
    /// Creates options for `directory` with default suffix and bound.
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: canonicalize_path(directory.as_ref()),
            suffix: SEGMENT_SUFFIX.to_string(),
            max_files: DEFAULT_MAX_FILES,
            projection: None,
        }
    }

    /// Sets the segment suffix.
    #[must_use]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Sets the maximum number of segments to discover.
    #[must_use]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.max_files = max;
        self
    }

    /// Sets the advisory column selection.
    #[must_use]
    pub fn projection(mut self, projection: Option<ColumnSelection>) -> Self {
        self.projection = projection;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SpoolConfig::default();
        assert_eq!(config.directory, Some(PathBuf::from("pglog_spool")));
        assert_eq!(config.min_messages, Severity::Warning);
        assert_eq!(config.file_mode, 0o600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = SpoolConfig::new()
            .directory("/var/log//pglog/")
            .min_messages(Severity::Log)
            .error_verbosity(ErrorVerbosity::Verbose);

        assert_eq!(config.directory, Some(PathBuf::from("/var/log/pglog")));
        assert_eq!(config.min_messages, Severity::Log);
        assert_eq!(
            config.format_settings().error_verbosity,
            ErrorVerbosity::Verbose
        );
    }

    #[test]
    fn invalid_file_mode_rejected() {
        let config = SpoolConfig::new().file_mode(0o4755);
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn canonicalize_examples() {
        let cases = [
            ("/a//b/./c/", "/a/b/c"),
            ("/a/b/../c", "/a/c"),
            ("/../a", "/a"),
            ("a/../../b", "../b"),
            ("./spool", "./spool"),
            ("spool/.", "spool"),
            ("", "."),
        ];
        for (input, expected) in cases {
            assert_eq!(canonicalize_path(Path::new(input)), PathBuf::from(expected), "{input}");
        }
    }

    #[test]
    fn nul_in_directory_rejected() {
        assert!(validate_directory("bad\0dir").is_err());
        assert!(validate_directory("/fine").is_ok());
    }

    #[test]
    fn scan_options_defaults() {
        let options = ScanOptions::new("/logs/");
        assert_eq!(options.directory, PathBuf::from("/logs"));
        assert_eq!(options.suffix, ".dat");
        assert_eq!(options.max_files, 16);
        assert!(options.projection.is_none());
    }
}

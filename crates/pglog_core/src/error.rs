//! Error types for pglog core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in pglog core operations.
///
/// Spooling failures are deliberately absent: a failed open or short write
/// disables the spooler and is reported through [`crate::spool::WriteStatus`]
/// rather than an error, so event producers are never blocked by logging.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] pglog_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A segment could not be read during a scan.
    #[error("could not read log file \"{}\": {source}", path.display())]
    FileRead {
        /// The segment being read.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A segment contains a record that cannot be decoded.
    #[error("malformed record in \"{}\" at line {line}: {message}", path.display())]
    MalformedRecord {
        /// The segment being read.
        path: PathBuf,
        /// Line on which the offending record starts (1-based).
        line: u64,
        /// Description of the problem.
        message: String,
    },

    /// A configuration value was rejected.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Why the value was rejected.
        message: String,
    },

    /// Unrecognized severity name.
    #[error("invalid value for severity: \"{name}\"")]
    UnknownSeverity {
        /// The rejected name.
        name: String,
    },

    /// A column name that is not part of the log relation.
    #[error("column \"{name}\" does not exist")]
    UnknownColumn {
        /// The rejected name.
        name: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a file read error.
    pub fn file_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a malformed record error.
    pub fn malformed_record(path: impl Into<PathBuf>, line: u64, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for errors that must abort the running scan.
    #[must_use]
    pub fn is_fatal_to_scan(&self) -> bool {
        matches!(
            self,
            Self::FileRead { .. } | Self::MalformedRecord { .. } | Self::Io(_) | Self::Storage(_)
        )
    }
}

//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Fewer bytes reached storage than were handed to it.
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite {
        /// Bytes accepted by the backend.
        written: usize,
        /// Bytes that should have been written.
        expected: usize,
    },

    /// The backend refused to open (used by test openers).
    #[error("storage is closed")]
    Closed,
}

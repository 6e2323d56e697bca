//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level append-only byte store holding one spool segment.
///
/// # Invariants
///
/// - `append` never reorders bytes; a partial append keeps a prefix
/// - `append` returns the number of bytes accepted, which may be smaller
///   than the input when the device is full
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For segment files on disk
pub trait StorageBackend: Send + Sync {
    /// Appends data to the end of the storage.
    ///
    /// Returns how many bytes were written. A value smaller than
    /// `data.len()` is a short write; the caller decides what to do.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing could be written because of an I/O error.
    fn append(&mut self, data: &[u8]) -> StorageResult<usize>;

    /// Pushes appended data out of any user-space buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;
}

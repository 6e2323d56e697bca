//! In-memory storage backend for testing.

use crate::backend::StorageBackend;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::sync::Arc;

/// An in-memory segment.
///
/// The byte buffer is shared: clones of a backend, and the
/// [`InMemoryOpener`](crate::InMemoryOpener) that produced it, observe the
/// same data. An optional capacity limit makes appends stop short once the
/// buffer is full, which is how tests simulate a full device.
///
/// # Example
///
/// ```rust
/// use pglog_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::with_capacity_limit(4);
/// assert_eq!(backend.append(b"abcdef").unwrap(), 4);
/// assert_eq!(backend.data(), b"abcd");
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    data: Arc<RwLock<Vec<u8>>>,
    capacity_limit: Option<usize>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend without a size limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that accepts at most `limit` bytes in total.
    #[must_use]
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            data: Arc::default(),
            capacity_limit: Some(limit),
        }
    }

    pub(crate) fn with_shared(data: Arc<RwLock<Vec<u8>>>, capacity_limit: Option<usize>) -> Self {
        Self {
            data,
            capacity_limit,
        }
    }

    /// Returns a copy of all data in the backend.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }
}

impl StorageBackend for InMemoryBackend {
    fn append(&mut self, new_data: &[u8]) -> StorageResult<usize> {
        let mut data = self.data.write();
        let room = match self.capacity_limit {
            Some(limit) => limit.saturating_sub(data.len()),
            None => usize::MAX,
        };
        let accepted = new_data.len().min(room);
        data.extend_from_slice(&new_data[..accepted]);
        Ok(accepted)
    }

    fn flush(&mut self) -> StorageResult<()> {
        // In-memory backend has no pending writes
        Ok(())
    }
}

//! Segment openers: the seam between the spooler and the filesystem.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use crate::file::{FileBackend, DEFAULT_FILE_MODE};
use crate::memory::InMemoryBackend;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Creates segment directories and opens segments for appending.
pub trait SegmentOpener: Send + Sync {
    /// Creates `dir` (and missing parents) with owner-only permissions.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created. An already
    /// existing directory is not an error.
    fn create_dir(&self, dir: &Path) -> StorageResult<()>;

    /// Opens `path` for appending, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment cannot be opened.
    fn open_append(&self, path: &Path) -> StorageResult<Box<dyn StorageBackend>>;
}

/// Opens segments as real files.
#[derive(Debug, Clone, Copy)]
pub struct FileOpener {
    mode: u32,
}

impl FileOpener {
    /// Creates an opener that creates files with the given permission bits.
    #[must_use]
    pub const fn new(mode: u32) -> Self {
        Self { mode }
    }
}

impl Default for FileOpener {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_MODE)
    }
}

impl SegmentOpener for FileOpener {
    fn create_dir(&self, dir: &Path) -> StorageResult<()> {
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        builder.create(dir)?;
        Ok(())
    }

    fn open_append(&self, path: &Path) -> StorageResult<Box<dyn StorageBackend>> {
        Ok(Box::new(FileBackend::open_append(path, self.mode)?))
    }
}

/// Opens segments in memory, keyed by path.
///
/// Reopening a path appends to the same buffer, mirroring append-mode
/// files. Failures can be injected: `set_fail_opens(true)` makes every
/// open fail, and a capacity limit makes every segment opened afterwards
/// stop accepting bytes once it holds `limit` bytes.
#[derive(Debug, Default)]
pub struct InMemoryOpener {
    files: Mutex<BTreeMap<PathBuf, Arc<RwLock<Vec<u8>>>>>,
    capacity_limit: Mutex<Option<usize>>,
    fail_opens: AtomicBool,
}

impl InMemoryOpener {
    /// Creates an opener with no segments and no injected failures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an opener whose segments accept at most `limit` bytes each.
    #[must_use]
    pub fn with_capacity_limit(limit: usize) -> Self {
        let opener = Self::default();
        *opener.capacity_limit.lock() = Some(limit);
        opener
    }

    /// Changes the capacity limit applied to segments opened from now on.
    pub fn set_capacity_limit(&self, limit: Option<usize>) {
        *self.capacity_limit.lock() = limit;
    }

    /// Makes subsequent opens fail (or succeed again).
    pub fn set_fail_opens(&self, fail: bool) {
        self.fail_opens.store(fail, Ordering::SeqCst);
    }

    /// Returns the paths of every segment opened so far, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }

    /// Returns the bytes held for `path`, if it was ever opened.
    #[must_use]
    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().get(path).map(|data| data.read().clone())
    }
}

impl SegmentOpener for InMemoryOpener {
    fn create_dir(&self, _dir: &Path) -> StorageResult<()> {
        Ok(())
    }

    fn open_append(&self, path: &Path) -> StorageResult<Box<dyn StorageBackend>> {
        if self.fail_opens.load(Ordering::SeqCst) {
            return Err(StorageError::Closed);
        }

        let data = Arc::clone(self.files.lock().entry(path.to_path_buf()).or_default());
        let limit = *self.capacity_limit.lock();
        Ok(Box::new(InMemoryBackend::with_shared(data, limit)))
    }
}

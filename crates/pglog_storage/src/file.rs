//! File-based storage backend for spool segments.

use crate::backend::StorageBackend;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Default permission bits for new segment files: owner read/write only.
pub const DEFAULT_FILE_MODE: u32 = 0o600;

/// A segment file opened in append mode.
///
/// Every `append` goes straight to the OS (the handle is unbuffered), so a
/// record handed to the backend is never left half-pending in a user-space
/// buffer. This is the line-buffered behaviour the spooler relies on.
///
/// # Example
///
/// ```no_run
/// use pglog_storage::{StorageBackend, FileBackend, DEFAULT_FILE_MODE};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open_append(Path::new("pglog.dat"), DEFAULT_FILE_MODE).unwrap();
/// backend.append(b"line\n").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    file: RwLock<File>,
}

impl FileBackend {
    /// Opens or creates a file for appending.
    ///
    /// `mode` is applied when the file is created; owner read/write is
    /// always added and execute bits are always dropped. Existing files
    /// keep their permissions.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open_append(path: &Path, mode: u32) -> StorageResult<Self> {
        let mut options = OpenOptions::new();
        options.read(true).append(true).create(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(effective_mode(mode));
        }
        #[cfg(not(unix))]
        let _ = mode;

        let file = options.open(path)?;

        Ok(Self {
            file: RwLock::new(file),
        })
    }
}

/// Permission bits actually requested for a new segment file.
pub(crate) const fn effective_mode(mode: u32) -> u32 {
    (mode | 0o600) & 0o666
}

impl StorageBackend for FileBackend {
    fn append(&mut self, data: &[u8]) -> StorageResult<usize> {
        let mut file = self.file.write();
        let mut written = 0;

        while written < data.len() {
            match file.write(&data[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if written == 0 => return Err(e.into()),
                // Part of the data reached the file; report it as short.
                Err(_) => break,
            }
        }

        Ok(written)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.file.write().flush()?;
        Ok(())
    }
}

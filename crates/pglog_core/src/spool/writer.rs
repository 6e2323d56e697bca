//! Append-only segment writer.

use crate::event::{now, Timestamp};
use crate::spool::naming::{segment_file_name, SEGMENT_TIME_FORMAT};
use pglog_storage::{
    FileOpener, SegmentOpener, StorageBackend, StorageError, StorageResult,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of handing one record to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The whole record reached the segment.
    Written {
        /// Number of bytes appended.
        bytes: usize,
    },
    /// The writer is disabled and dropped the record.
    Refused,
    /// The write failed and the writer is now disabled.
    Failed,
}

struct OpenSegment {
    path: PathBuf,
    backend: Box<dyn StorageBackend>,
}

impl OpenSegment {
    /// Appends a whole record and flushes it out of any buffer.
    fn append_record(&mut self, record: &[u8]) -> StorageResult<usize> {
        let written = self.backend.append(record)?;
        if written < record.len() {
            return Err(StorageError::ShortWrite {
                written,
                expected: record.len(),
            });
        }
        self.backend.flush()?;
        Ok(written)
    }
}

enum WriterState {
    Closed,
    Open(OpenSegment),
    Disabled,
}

/// Owns the current segment and its enabled/disabled state.
///
/// All failures are reported through `tracing` and reflected in the
/// returned status; none of them propagate to the caller, so a broken
/// spool never takes the host down with it.
pub struct SpoolWriter {
    opener: Arc<dyn SegmentOpener>,
    state: WriterState,
    last_stamp: Option<String>,
    sequence: u32,
}

impl SpoolWriter {
    /// Creates a writer that opens segments through `opener`.
    pub fn new(opener: Arc<dyn SegmentOpener>) -> Self {
        Self {
            opener,
            state: WriterState::Closed,
            last_stamp: None,
            sequence: 0,
        }
    }

    /// Creates a writer that opens real files with the given mode.
    #[must_use]
    pub fn with_file_mode(mode: u32) -> Self {
        Self::new(Arc::new(FileOpener::new(mode)))
    }

    /// Makes sure a segment is open in `dir`.
    ///
    /// Returns `true` if a segment is open afterwards. A disabled writer
    /// stays disabled and returns `false`.
    pub fn ensure_open(&mut self, dir: &Path) -> bool {
        match self.state {
            WriterState::Open(_) => true,
            WriterState::Disabled => false,
            WriterState::Closed => self.open_segment(dir),
        }
    }

    /// Appends one complete record to the open segment.
    ///
    /// A short write or I/O error disables the writer; the segment is
    /// released and nothing more is written until [`Self::rotate`].
    pub fn write(&mut self, record: &[u8]) -> WriteStatus {
        match std::mem::replace(&mut self.state, WriterState::Disabled) {
            WriterState::Open(mut segment) => match segment.append_record(record) {
                Ok(bytes) => {
                    self.state = WriterState::Open(segment);
                    WriteStatus::Written { bytes }
                }
                Err(e) => {
                    warn!(
                        path = %segment.path.display(),
                        error = %e,
                        "could not write log file, spooling disabled"
                    );
                    WriteStatus::Failed
                }
            },
            WriterState::Disabled => WriteStatus::Refused,
            WriterState::Closed => {
                warn!("no log file is open, spooling disabled");
                WriteStatus::Failed
            }
        }
    }

    /// Closes the current segment, re-enables the writer and opens a
    /// fresh segment in `dir`.
    ///
    /// Returns `true` if the new segment is open.
    pub fn rotate(&mut self, dir: &Path) -> bool {
        if let WriterState::Open(segment) = &self.state {
            debug!(path = %segment.path.display(), "closing segment for rotation");
        }
        self.state = WriterState::Closed;
        self.open_segment(dir)
    }

    /// Drops the open segment (if any) and refuses further writes.
    pub fn disable(&mut self) {
        self.state = WriterState::Disabled;
    }

    /// Releases the open segment. A disabled writer stays disabled.
    pub fn close(&mut self) {
        if let WriterState::Open(segment) = &self.state {
            debug!(path = %segment.path.display(), "closing segment");
            self.state = WriterState::Closed;
        }
    }

    /// Returns `false` once a failure has disabled the writer.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(self.state, WriterState::Disabled)
    }

    /// Returns `true` if a segment is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, WriterState::Open(_))
    }

    /// Path of the open segment.
    #[must_use]
    pub fn current_path(&self) -> Option<&Path> {
        match &self.state {
            WriterState::Open(segment) => Some(&segment.path),
            _ => None,
        }
    }

    fn open_segment(&mut self, dir: &Path) -> bool {
        if let Err(e) = self.opener.create_dir(dir) {
            // Opening the file below reports the real problem.
            debug!(dir = %dir.display(), error = %e, "could not create spool directory");
        }

        let path = self.next_segment_path(dir, &now());
        match self.opener.open_append(&path) {
            Ok(backend) => {
                debug!(path = %path.display(), "opened segment");
                self.state = WriterState::Open(OpenSegment { path, backend });
                true
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "could not open log file, spooling disabled"
                );
                self.state = WriterState::Disabled;
                false
            }
        }
    }

    fn next_segment_path(&mut self, dir: &Path, stamp: &Timestamp) -> PathBuf {
        let key = stamp.format(SEGMENT_TIME_FORMAT).to_string();
        if self.last_stamp.as_deref() == Some(key.as_str()) {
            self.sequence = self.sequence.saturating_add(1);
        } else {
            self.last_stamp = Some(key);
            self.sequence = 0;
        }
        segment_file_name(dir, stamp, self.sequence)
    }
}

impl fmt::Debug for SpoolWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpoolWriter")
            .field("enabled", &self.is_enabled())
            .field("current_path", &self.current_path())
            .finish_non_exhaustive()
    }
}

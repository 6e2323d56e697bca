//! Sequential reader across every discovered segment.

use crate::config::ScanOptions;
use crate::error::{CoreError, CoreResult};
use crate::record::{RecordError, RecordReader};
use crate::scan::catalog::FileCatalog;
use crate::scan::row::{ColumnSelection, LogRow};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where a [`ScanCursor`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// `open` has not been called.
    Unopened,
    /// A segment is open and may have more records.
    FileOpen,
    /// Every segment has been read, the scan failed, or it was closed.
    Done,
}

struct OpenFile {
    path: PathBuf,
    reader: RecordReader<BufReader<File>>,
}

/// Reads the rows of every segment in catalog order.
///
/// At most one segment is open at a time. Any I/O error or malformed
/// record ends the scan: the open segment is closed and the error is
/// returned. Rows are never skipped.
///
/// # Example
///
/// ```ignore
/// let mut cursor = ScanCursor::new(ScanOptions::new("/var/lib/pglog"));
/// cursor.open()?;
/// for row in &mut cursor {
///     let row = row?;
///     println!("{}", row.message().unwrap_or_default());
/// }
/// cursor.close();
/// ```
pub struct ScanCursor {
    catalog: FileCatalog,
    projection: Option<ColumnSelection>,
    files: Vec<PathBuf>,
    index: usize,
    current: Option<OpenFile>,
    state: CursorState,
    rows_read: u64,
}

impl ScanCursor {
    /// Creates an unopened cursor.
    #[must_use]
    pub fn new(options: ScanOptions) -> Self {
        Self {
            catalog: FileCatalog::new(&options),
            projection: options.projection,
            files: Vec::new(),
            index: 0,
            current: None,
            state: CursorState::Unopened,
            rows_read: 0,
        }
    }

    /// Creates a cursor that is already exhausted and never touches disk.
    #[must_use]
    pub fn exhausted(options: ScanOptions) -> Self {
        let mut cursor = Self::new(options);
        cursor.state = CursorState::Done;
        cursor
    }

    /// Lists the segments and opens the first one.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor was already opened, the directory
    /// cannot be listed, or the first segment cannot be opened.
    pub fn open(&mut self) -> CoreResult<()> {
        if self.state != CursorState::Unopened {
            return Err(CoreError::invalid_operation("scan cursor is already open"));
        }

        self.files = self.catalog.list()?;
        debug!(
            dir = %self.catalog.directory().display(),
            files = self.files.len(),
            "scan opened"
        );
        self.start_at_first_file()
    }

    /// Returns the next row, or `None` once every segment is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FileRead`] or [`CoreError::MalformedRecord`]
    /// if a segment cannot be read; the scan is over afterwards.
    pub fn next_row(&mut self) -> CoreResult<Option<LogRow>> {
        match self.state {
            CursorState::Unopened => {
                return Err(CoreError::invalid_operation("scan cursor is not open"));
            }
            CursorState::Done => return Ok(None),
            CursorState::FileOpen => {}
        }

        loop {
            let Some(file) = self.current.as_mut() else {
                self.state = CursorState::Done;
                return Ok(None);
            };

            let start_line = file.reader.line() + 1;
            let result = match file.reader.next_record() {
                Ok(Some(cells)) => LogRow::decode(cells)
                    .map(Some)
                    .map_err(|message| CoreError::malformed_record(&file.path, start_line, message)),
                Ok(None) => Ok(None),
                Err(RecordError::Io(e)) => Err(CoreError::file_read(&file.path, e)),
                Err(RecordError::Malformed { line, message }) => {
                    Err(CoreError::malformed_record(&file.path, line, message))
                }
            };

            match result {
                Ok(Some(row)) => {
                    self.rows_read += 1;
                    return Ok(Some(row));
                }
                Ok(None) => {
                    debug!(path = %file.path.display(), "segment exhausted");
                    self.current = None;
                    self.index += 1;
                    if self.index >= self.files.len() {
                        self.state = CursorState::Done;
                        return Ok(None);
                    }
                    self.open_file(self.index)?;
                }
                Err(e) => {
                    self.close();
                    return Err(e);
                }
            }
        }
    }

    /// Restarts the scan from the first segment, reusing the file list.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor was never opened or the first
    /// segment cannot be opened.
    pub fn reset(&mut self) -> CoreResult<()> {
        if self.state == CursorState::Unopened {
            return Err(CoreError::invalid_operation("scan cursor is not open"));
        }

        self.current = None;
        self.rows_read = 0;
        self.start_at_first_file()
    }

    /// Releases the open segment. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(file) = self.current.take() {
            debug!(path = %file.path.display(), "segment closed");
        }
        self.state = CursorState::Done;
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// The advisory column selection this scan was created with.
    #[must_use]
    pub fn projection(&self) -> Option<&ColumnSelection> {
        self.projection.as_ref()
    }

    /// Segments this scan covers, in reading order.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// The segment currently being read.
    #[must_use]
    pub fn current_file(&self) -> Option<&Path> {
        self.current.as_ref().map(|file| file.path.as_path())
    }

    /// Rows returned since the last open or reset.
    #[must_use]
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    fn start_at_first_file(&mut self) -> CoreResult<()> {
        self.index = 0;
        if self.files.is_empty() {
            self.state = CursorState::Done;
            return Ok(());
        }
        self.open_file(0)
    }

    fn open_file(&mut self, index: usize) -> CoreResult<()> {
        let path = self.files[index].clone();
        match File::open(&path) {
            Ok(file) => {
                debug!(path = %path.display(), "segment opened");
                self.current = Some(OpenFile {
                    path,
                    reader: RecordReader::new(BufReader::new(file)),
                });
                self.state = CursorState::FileOpen;
                Ok(())
            }
            Err(e) => {
                self.close();
                Err(CoreError::file_read(path, e))
            }
        }
    }
}

impl Iterator for ScanCursor {
    type Item = CoreResult<LogRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl std::fmt::Debug for ScanCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanCursor")
            .field("dir", &self.catalog.directory())
            .field("state", &self.state)
            .field("index", &self.index)
            .field("files", &self.files.len())
            .finish_non_exhaustive()
    }
}

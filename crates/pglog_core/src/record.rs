//! The delimited record format shared by the write and read paths.
//!
//! ## Record Format
//!
//! ```text
//! cell,cell,...,cell\n
//! ```
//!
//! - Text cells are quoted: `"it said ""hi"""`. A quote inside the value is
//!   doubled; commas and newlines inside quotes are literal.
//! - Numeric and timestamp cells are written bare.
//! - An absent value is an empty cell with no quotes at all, so absent and
//!   empty text stay distinguishable: `,,` versus `,"",`.
//!
//! A record therefore always ends at the first newline that is outside
//! quotes, which is what [`RecordReader`] looks for.

use std::fmt::Display;
use std::io::{self, BufRead};
use thiserror::Error;

/// One decoded cell: `None` for an absent value.
pub type Cell = Option<String>;

/// Appends `data` to `buf` as a quoted literal, or nothing if absent.
pub fn append_csv_literal(buf: &mut String, data: Option<&str>) {
    let Some(data) = data else {
        return;
    };

    buf.reserve(data.len() + 2);
    buf.push('"');
    for c in data.chars() {
        if c == '"' {
            buf.push('"');
        }
        buf.push(c);
    }
    buf.push('"');
}

/// Builds one record cell by cell.
///
/// # Example
///
/// ```rust
/// use pglog_core::RecordBuilder;
///
/// let mut record = RecordBuilder::new();
/// record.text(Some("say \"hi\"")).int(Some(42)).text(None);
/// assert_eq!(record.finish(), "\"say \"\"hi\"\"\",42,\n");
/// ```
#[derive(Debug, Default)]
pub struct RecordBuilder {
    buf: String,
    cells: usize,
}

impl RecordBuilder {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates an empty record with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity),
            cells: 0,
        }
    }

    fn start_cell(&mut self) {
        if self.cells > 0 {
            self.buf.push(',');
        }
        self.cells += 1;
    }

    /// Adds a quoted text cell.
    pub fn text(&mut self, value: Option<&str>) -> &mut Self {
        self.start_cell();
        append_csv_literal(&mut self.buf, value);
        self
    }

    /// Adds an unquoted cell. The value must not contain separators,
    /// quotes or newlines (timestamps, codes, severity names).
    pub fn raw(&mut self, value: Option<&str>) -> &mut Self {
        self.start_cell();
        if let Some(value) = value {
            debug_assert!(!value.contains([',', '"', '\n']));
            self.buf.push_str(value);
        }
        self
    }

    /// Adds an unquoted numeric cell.
    pub fn int<T: Display>(&mut self, value: Option<T>) -> &mut Self {
        self.start_cell();
        if let Some(value) = value {
            use std::fmt::Write;
            // Writing into a String cannot fail.
            let _ = write!(self.buf, "{value}");
        }
        self
    }

    /// Number of cells added so far.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells
    }

    /// Terminates the record with a newline and returns it.
    #[must_use]
    pub fn finish(mut self) -> String {
        self.buf.push('\n');
        self.buf
    }
}

/// Errors produced while reading records.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The underlying reader failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The bytes do not form a valid record.
    #[error("line {line}: {message}")]
    Malformed {
        /// Line on which the record starts (1-based).
        line: u64,
        /// Description of the problem.
        message: String,
    },
}

/// Splits one record (without its terminating newline) into cells.
///
/// # Errors
///
/// Returns a description of the problem if the quoting is invalid.
pub fn parse_record(line: &str) -> Result<Vec<Cell>, String> {
    let mut cells = Vec::new();
    let mut chars = line.chars().peekable();

    'cells: loop {
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        value.push('"');
                    }
                    Some('"') => break,
                    Some(c) => value.push(c),
                    None => return Err("unterminated quoted field".to_string()),
                }
            }
            cells.push(Some(value));
            match chars.next() {
                Some(',') => continue 'cells,
                None => break 'cells,
                Some(c) => {
                    return Err(format!("unexpected character '{c}' after closing quote"));
                }
            }
        }

        let mut value = String::new();
        loop {
            match chars.next() {
                Some(',') => {
                    cells.push((!value.is_empty()).then_some(value));
                    continue 'cells;
                }
                Some('"') => return Err("quote inside unquoted field".to_string()),
                Some(c) => value.push(c),
                None => {
                    cells.push((!value.is_empty()).then_some(value));
                    break 'cells;
                }
            }
        }
    }

    Ok(cells)
}

/// Reads records one by one from a buffered reader.
///
/// Memory use is bounded by the largest single record; a quoted cell may
/// span several physical lines.
#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
    /// Physical lines consumed so far.
    line: u64,
    buf: Vec<u8>,
}

impl<R: BufRead> RecordReader<R> {
    /// Wraps a buffered reader positioned at the start of a record.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: 0,
            buf: Vec::with_capacity(512),
        }
    }

    /// Number of physical lines consumed so far.
    #[must_use]
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Reads the next record.
    ///
    /// Returns `Ok(None)` at a clean end of input.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Io`] if reading fails and
    /// [`RecordError::Malformed`] for invalid UTF-8, unbalanced quotes or a
    /// record cut off at end of input.
    pub fn next_record(&mut self) -> Result<Option<Vec<Cell>>, RecordError> {
        self.buf.clear();
        let start_line = self.line + 1;
        let mut in_quotes = false;

        loop {
            let before = self.buf.len();
            let read = self.inner.read_until(b'\n', &mut self.buf)?;
            if read == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                if in_quotes {
                    return Err(RecordError::Malformed {
                        line: start_line,
                        message: "unterminated quoted field at end of file".to_string(),
                    });
                }
                break;
            }
            self.line += 1;

            let quotes = self.buf[before..].iter().filter(|&&b| b == b'"').count();
            if quotes % 2 == 1 {
                in_quotes = !in_quotes;
            }
            if !in_quotes && self.buf.ends_with(b"\n") {
                break;
            }
        }

        let mut end = self.buf.len();
        if self.buf[..end].ends_with(b"\n") {
            end -= 1;
            if self.buf[..end].ends_with(b"\r") {
                end -= 1;
            }
        }

        let text = std::str::from_utf8(&self.buf[..end]).map_err(|e| RecordError::Malformed {
            line: start_line,
            message: format!("invalid UTF-8: {e}"),
        })?;

        parse_record(text)
            .map(Some)
            .map_err(|message| RecordError::Malformed {
                line: start_line,
                message,
            })
    }
}

//! Cross-crate integration test helpers.
//!
//! Provides a spooler wired to in-memory segments so tests can inject
//! open failures and short writes and read back what was written.

use pglog_core::{
    parse_record, Cell, EmitOutcome, LogEvent, SessionContext, SpoolConfig, Spooler,
};
use pglog_storage::InMemoryOpener;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Directory used by the in-memory harness.
pub const HARNESS_DIR: &str = "/spool";

/// A spooler over in-memory segments.
pub struct SpoolHarness {
    /// The spooler under test.
    pub spooler: Spooler,
    opener: Arc<InMemoryOpener>,
}

impl SpoolHarness {
    /// Creates a harness spooling into [`HARNESS_DIR`] with `config`.
    pub fn new(config: SpoolConfig) -> Self {
        let opener = Arc::new(InMemoryOpener::new());
        let spooler = Spooler::with_opener(config.directory(HARNESS_DIR), opener.clone())
            .expect("Failed to create spooler");
        Self { spooler, opener }
    }

    /// The opener, for failure injection.
    pub fn opener(&self) -> &InMemoryOpener {
        &self.opener
    }

    /// Emits one event.
    pub fn emit(&mut self, event: &LogEvent, ctx: &SessionContext) -> EmitOutcome {
        self.spooler.emit(event, ctx)
    }

    /// Every segment created so far, sorted by name.
    pub fn segments(&self) -> Vec<PathBuf> {
        self.opener.paths()
    }

    /// Parsed records of one segment.
    pub fn records(&self, segment: &Path) -> Vec<Vec<Cell>> {
        let data = self.opener.contents(segment).expect("Unknown segment");
        let mut reader = pglog_core::RecordReader::new(data.as_slice());
        let mut records = Vec::new();
        while let Some(record) = reader.next_record().expect("Malformed segment") {
            records.push(record);
        }
        records
    }

    /// Parsed records of every segment, in segment order.
    pub fn all_records(&self) -> Vec<Vec<Cell>> {
        self.segments()
            .iter()
            .flat_map(|segment| self.records(segment))
            .collect()
    }
}

/// Parses a single formatted line, panicking on malformed input.
pub fn parse_line(line: &str) -> Vec<Cell> {
    parse_record(line.trim_end_matches('\n')).expect("Malformed record")
}

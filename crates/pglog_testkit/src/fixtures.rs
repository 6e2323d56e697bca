//! Test fixtures: spool directories and canned events.

use chrono::{DateTime, FixedOffset};
use pglog_core::{
    EventFormatter, FormatSettings, LogEvent, LogRow, ScanCursor, ScanOptions, SessionContext,
    Severity, SqlState,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Fixed timestamp used by canned events: 2021-01-01 00:00:00 UTC.
pub fn epoch_2021() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2021-01-01T00:00:00+00:00").expect("valid timestamp")
}

/// A session context with every field filled.
pub fn sample_context() -> SessionContext {
    SessionContext::new()
        .process(4242, epoch_2021())
        .connection("alice", "app")
        .remote("10.0.0.7", Some("51234"))
        .activity("SELECT")
        .virtual_xid(3, 17)
        .transaction_id(981)
        .application_name("psql")
        .query_text("SELECT 1/0")
}

/// `count` error events with messages `event 0`, `event 1`, ...
pub fn sample_events(count: usize) -> Vec<LogEvent> {
    (0..count)
        .map(|i| {
            LogEvent::new(Severity::Error, format!("event {i}"))
                .sql_state(SqlState::normalize("22012"))
                .at(epoch_2021())
        })
        .collect()
}

/// An event carrying awkward text in every optional field.
pub fn awkward_event() -> LogEvent {
    LogEvent::new(Severity::Warning, "say \"hi\", then\nleave")
        .detail("a,b,c")
        .hint("\"quoted\"")
        .context("line one\r\nline two")
        .at(epoch_2021())
}

/// Formats events into segment text, as one process would spool them.
pub fn format_segment(events: &[LogEvent], ctx: &SessionContext) -> String {
    let mut formatter = EventFormatter::new();
    events
        .iter()
        .map(|event| formatter.format(event, ctx, &FormatSettings::default()))
        .collect()
}

/// A temporary spool directory, removed on drop.
pub struct SpoolDir {
    temp_dir: TempDir,
}

impl SpoolDir {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// The directory path.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `events` as a segment named `name`.
    pub fn write_segment(&self, name: &str, events: &[LogEvent]) -> PathBuf {
        self.write_raw(name, format_segment(events, &sample_context()).as_bytes())
    }

    /// Writes arbitrary bytes as a file named `name`.
    pub fn write_raw(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, data).expect("Failed to write segment");
        path
    }

    /// Scan options for this directory.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::new(self.path())
    }

    /// Scans every segment and returns the rows.
    pub fn scan_rows(&self) -> Vec<LogRow> {
        let mut cursor = ScanCursor::new(self.scan_options());
        cursor.open().expect("Failed to open scan");
        let rows = cursor
            .by_ref()
            .collect::<Result<Vec<_>, _>>()
            .expect("Scan failed");
        cursor.close();
        rows
    }

    /// Scans every segment and returns the message of each row.
    pub fn scan_messages(&self) -> Vec<String> {
        self.scan_rows()
            .iter()
            .map(|row| row.message().unwrap_or_default().to_string())
            .collect()
    }
}

impl Default for SpoolDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_fixture_scans_back() {
        let dir = SpoolDir::new();
        dir.write_segment("a.dat", &sample_events(3));
        assert_eq!(dir.scan_messages(), vec!["event 0", "event 1", "event 2"]);
    }

    #[test]
    fn awkward_text_survives() {
        let dir = SpoolDir::new();
        dir.write_segment("a.dat", &[awkward_event()]);

        let rows = dir.scan_rows();
        assert_eq!(rows[0].message(), Some("say \"hi\", then\nleave"));
        assert_eq!(
            rows[0].get("context").and_then(|v| v.as_text()),
            Some("line one\r\nline two")
        );
    }
}

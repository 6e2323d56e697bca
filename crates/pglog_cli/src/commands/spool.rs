//! Spool command implementation.

use pglog_core::{
    EmitOutcome, LogEvent, SessionContext, Severity, SpoolConfig, Spooler, SqlState,
};
use std::io::{self, BufRead};
use std::path::Path;
use tracing::warn;

/// Options for the spool command.
#[derive(Debug, Clone)]
pub struct SpoolOptions {
    /// Severity name of every event.
    pub severity: String,
    /// Minimum severity name that is spooled.
    pub min_messages: String,
    /// SQL state code of every event.
    pub sql_state: Option<String>,
}

/// Outcome counts of one spool run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SpoolSummary {
    /// Events written.
    pub written: usize,
    /// Events below the minimum severity.
    pub filtered: usize,
    /// Events dropped because spooling was off or failed.
    pub dropped: usize,
}

/// Runs the spool command. Reads messages from stdin when none are given.
pub fn run(
    dir: &Path,
    options: &SpoolOptions,
    messages: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let messages = if messages.is_empty() {
        io::stdin().lock().lines().collect::<Result<Vec<_>, _>>()?
    } else {
        messages
    };

    let summary = spool(dir, options, &messages)?;
    println!(
        "{} written, {} filtered, {} dropped",
        summary.written, summary.filtered, summary.dropped
    );
    Ok(())
}

fn spool(
    dir: &Path,
    options: &SpoolOptions,
    messages: &[String],
) -> Result<SpoolSummary, Box<dyn std::error::Error>> {
    let severity = Severity::parse(&options.severity)?;
    let state = options
        .sql_state
        .as_deref()
        .map(SqlState::normalize)
        .unwrap_or_default();

    let config = SpoolConfig::new()
        .directory(dir)
        .min_messages(Severity::parse(&options.min_messages)?);
    let mut spooler = Spooler::init(config)?;
    let ctx = SessionContext::current_process().application_name("pglog");

    let mut summary = SpoolSummary::default();
    for message in messages {
        let event = LogEvent::new(severity, message.as_str()).sql_state(state);
        match spooler.emit(&event, &ctx) {
            EmitOutcome::Written => summary.written += 1,
            EmitOutcome::Filtered => summary.filtered += 1,
            EmitOutcome::Suppressed | EmitOutcome::Failed => summary.dropped += 1,
        }
    }

    if summary.dropped > 0 {
        warn!(dropped = summary.dropped, "some events were not spooled");
    }
    spooler.shutdown();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pglog_core::{ScanCursor, ScanOptions};

    fn options(severity: &str) -> SpoolOptions {
        SpoolOptions {
            severity: severity.to_string(),
            min_messages: "warning".to_string(),
            sql_state: Some("22012".to_string()),
        }
    }

    #[test]
    fn spooled_messages_scan_back() {
        let dir = tempfile::tempdir().unwrap();
        let messages = vec!["one".to_string(), "two".to_string()];

        let summary = spool(dir.path(), &options("error"), &messages).unwrap();
        assert_eq!(
            summary,
            SpoolSummary {
                written: 2,
                filtered: 0,
                dropped: 0
            }
        );

        let mut cursor = ScanCursor::new(ScanOptions::new(dir.path()));
        cursor.open().unwrap();
        let rows: Vec<_> = cursor.map(Result::unwrap).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].message(), Some("two"));
        assert_eq!(
            rows[0].get("sql_state_code").and_then(|v| v.as_text()),
            Some("22012")
        );
    }

    #[test]
    fn low_severity_is_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let summary = spool(dir.path(), &options("notice"), &["quiet".to_string()]).unwrap();
        assert_eq!(summary.filtered, 1);
        assert_eq!(summary.written, 0);
    }

    #[test]
    fn unknown_severity_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(spool(dir.path(), &options("loud"), &[]).is_err());
    }
}

//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use pglog_core::{EventFormatter, FormatSettings, LogEvent, SessionContext, Severity, SqlState};
use std::fs;
use std::path::Path;

/// A plain event with a message of roughly `message_len` bytes.
pub fn plain_event(message_len: usize) -> LogEvent {
    LogEvent::new(Severity::Error, "x".repeat(message_len))
        .sql_state(SqlState::normalize("23505"))
}

/// An event whose text needs quoting on every line.
pub fn quoted_event(message_len: usize) -> LogEvent {
    let message: String = "say \"hi\", ".chars().cycle().take(message_len).collect();
    LogEvent::new(Severity::Warning, message)
        .detail("Key (id)=(1) already exists.")
        .hint("Use \"ON CONFLICT\".")
}

/// A fully populated session context.
pub fn busy_context() -> SessionContext {
    SessionContext::current_process()
        .connection("app_user", "orders")
        .remote("192.168.1.20", Some("50432"))
        .activity("INSERT")
        .virtual_xid(4, 1200)
        .transaction_id(88_123)
        .application_name("orders-api")
        .query_text("INSERT INTO orders VALUES ($1, $2)")
}

/// Writes `files` segments of `records` records each into `dir`.
pub fn populate_segments(dir: &Path, files: usize, records: usize) {
    let ctx = busy_context();
    for file in 0..files {
        let mut formatter = EventFormatter::new();
        let mut data = String::new();
        for i in 0..records {
            let event = plain_event(32 + i % 64);
            data.push_str(&formatter.format(&event, &ctx, &FormatSettings::default()));
        }
        let name = format!("pglog-2021-01-{:02}_000000.dat", file + 1);
        fs::write(dir.join(name), data).expect("Failed to write segment");
    }
}

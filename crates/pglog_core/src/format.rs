//! Turns a [`LogEvent`] and its [`SessionContext`] into one record.
//!
//! ## Field Order
//!
//! Every record carries exactly [`RECORD_FIELD_COUNT`] cells, in this order:
//!
//! ```text
//!  1 log time (ms)        9 session start       17 internal query
//!  2 user name           10 virtual xid         18 internal position
//!  3 database name       11 transaction id      19 context
//!  4 process id          12 severity            20 query
//!  5 remote host[:port]  13 sql state           21 query position
//!  6 session id          14 message             22 location
//!  7 line number         15 detail              23 application name
//!  8 activity            16 hint
//! ```
//!
//! Formatting never fails. Anything missing from the event or the context
//! becomes an empty cell, so columns stay aligned across every record ever
//! written.

use crate::event::{now, ErrorVerbosity, LogEvent, SessionContext, Severity, Timestamp};
use crate::record::RecordBuilder;

/// Number of cells in every record.
pub const RECORD_FIELD_COUNT: usize = 23;

const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %:z";
const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

/// Settings that decide which optional cells are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSettings {
    /// The location cell is filled only at `Verbose`.
    pub error_verbosity: ErrorVerbosity,
    /// Minimum severity for the current statement to be recorded.
    pub min_error_statement: Severity,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            error_verbosity: ErrorVerbosity::Default,
            min_error_statement: Severity::Error,
        }
    }
}

/// Stateful record formatter.
///
/// Keeps the per-process line counter and the cached session start time.
/// Both reset whenever the process id of the context differs from the
/// previous call, which is what a freshly started worker looks like.
#[derive(Debug, Default)]
pub struct EventFormatter {
    line_number: u64,
    last_process_id: Option<u32>,
    start_time: Option<String>,
}

impl EventFormatter {
    /// Creates a formatter that has not seen any process yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Line number assigned to the most recent record.
    #[must_use]
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Formats one event into a newline-terminated record.
    pub fn format(
        &mut self,
        event: &LogEvent,
        ctx: &SessionContext,
        settings: &FormatSettings,
    ) -> String {
        if self.last_process_id != Some(ctx.process_id) {
            self.line_number = 0;
            self.last_process_id = Some(ctx.process_id);
            self.start_time = None;
        }
        self.line_number += 1;

        let log_time = event.timestamp.unwrap_or_else(now);
        let mut record = RecordBuilder::with_capacity(256 + event.message.len());

        record.raw(Some(&log_time.format(LOG_TIME_FORMAT).to_string()));
        record.text(ctx.user_name.as_deref());
        record.text(ctx.database_name.as_deref());
        record.int((ctx.process_id != 0).then_some(ctx.process_id));
        record.text(remote_address(ctx).as_deref());
        record.raw(session_id(ctx).as_deref());
        record.int(Some(self.line_number));
        record.text(ctx.activity.as_deref());

        if self.start_time.is_none() {
            self.start_time = ctx.process_start.as_ref().map(format_start_time);
        }
        record.raw(self.start_time.as_deref());

        let vxid = ctx
            .backend_id
            .map(|backend| format!("{backend}/{}", ctx.local_xid));
        record.raw(vxid.as_deref());
        record.int(Some(ctx.transaction_id));

        record.raw(Some(event.severity.name()));
        record.raw(Some(event.sql_state.as_str()));
        record.text(Some(&event.message));
        record.text(event.detail_log.as_deref().or(event.detail.as_deref()));
        record.text(event.hint.as_deref());
        record.text(event.internal_query.as_deref());
        record.int(
            (event.internal_query.is_some() && event.internal_position > 0)
                .then_some(event.internal_position),
        );
        record.text(event.context.as_deref());

        let print_statement = !event.hide_statement
            && ctx.query_text.is_some()
            && event.severity.is_log_output(settings.min_error_statement);
        record.text(if print_statement {
            ctx.query_text.as_deref()
        } else {
            None
        });
        record.int((print_statement && event.cursor_position > 0).then_some(event.cursor_position));

        let location = if settings.error_verbosity >= ErrorVerbosity::Verbose {
            source_location(event)
        } else {
            None
        };
        record.text(location.as_deref());
        record.text(ctx.application_name.as_deref());

        debug_assert_eq!(record.cell_count(), RECORD_FIELD_COUNT);
        record.finish()
    }
}

fn format_start_time(start: &Timestamp) -> String {
    start.format(START_TIME_FORMAT).to_string()
}

fn remote_address(ctx: &SessionContext) -> Option<String> {
    let host = ctx.remote_host.as_deref()?;
    match ctx.remote_port.as_deref() {
        Some(port) if !port.is_empty() => Some(format!("{host}:{port}")),
        _ => Some(host.to_string()),
    }
}

fn session_id(ctx: &SessionContext) -> Option<String> {
    let start = ctx.process_start.as_ref()?;
    if ctx.process_id == 0 {
        return None;
    }
    Some(format!("{:x}.{:x}", start.timestamp(), ctx.process_id))
}

fn source_location(event: &LogEvent) -> Option<String> {
    let file = event.file_name.as_deref()?;
    Some(match event.function_name.as_deref() {
        Some(function) => format!("{function}, {file}:{}", event.line_number),
        None => format!("{file}:{}", event.line_number),
    })
}

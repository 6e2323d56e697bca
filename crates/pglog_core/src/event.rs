//! Diagnostic events and the ambient session context they are captured in.
//!
//! A [`LogEvent`] is what the host's reporting mechanism hands to the
//! spooler for a single message. The [`SessionContext`] carries everything
//! that belongs to the emitting process rather than to the message: who is
//! connected, which statement is running, which transaction is open.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, FixedOffset, Local};
use std::fmt;
use std::str::FromStr;

/// Wall-clock timestamp with the offset it was observed in.
pub type Timestamp = DateTime<FixedOffset>;

/// Returns the current local time.
#[must_use]
pub fn now() -> Timestamp {
    Local::now().fixed_offset()
}

/// Message severity, in increasing order of importance.
///
/// The derived ordering matches the reporting order of the server
/// (`Log` sits below `Info`). Threshold checks for the server log use
/// [`Severity::is_log_output`], which moves `Log` between `Error` and
/// `Fatal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Most detailed debugging output.
    Debug5,
    /// Debugging output.
    Debug4,
    /// Debugging output.
    Debug3,
    /// Debugging output.
    Debug2,
    /// Least detailed debugging output.
    Debug1,
    /// Server operational message.
    Log,
    /// Client communication problem, logged like `Log`.
    CommError,
    /// Information explicitly requested by the user.
    Info,
    /// Helpful notice.
    Notice,
    /// Likely problem.
    Warning,
    /// Error that aborted the current command.
    Error,
    /// Error that terminated the session.
    Fatal,
    /// Error that terminated all sessions.
    Panic,
}

/// Accepted configuration names, in the order they are documented.
const SEVERITY_NAMES: &[(&str, Severity)] = &[
    ("debug", Severity::Debug2),
    ("debug5", Severity::Debug5),
    ("debug4", Severity::Debug4),
    ("debug3", Severity::Debug3),
    ("debug2", Severity::Debug2),
    ("debug1", Severity::Debug1),
    ("info", Severity::Info),
    ("notice", Severity::Notice),
    ("warning", Severity::Warning),
    ("error", Severity::Error),
    ("log", Severity::Log),
    ("fatal", Severity::Fatal),
    ("panic", Severity::Panic),
];

impl Severity {
    /// Returns the name written to the severity column.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Debug5 | Self::Debug4 | Self::Debug3 | Self::Debug2 | Self::Debug1 => "DEBUG",
            Self::Log | Self::CommError => "LOG",
            Self::Info => "INFO",
            Self::Notice => "NOTICE",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
            Self::Panic => "PANIC",
        }
    }

    /// Parses a configuration name such as `warning` or `debug3`.
    ///
    /// Matching is case-insensitive; `debug` is an alias for `debug2`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownSeverity`] for any other name.
    pub fn parse(name: &str) -> CoreResult<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        SEVERITY_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == lowered)
            .map(|&(_, severity)| severity)
            .ok_or_else(|| CoreError::UnknownSeverity {
                name: name.to_string(),
            })
    }

    /// Is `self` at or above `threshold` for server-log purposes?
    ///
    /// `Log` (and `CommError`) rank between `Error` and `Fatal` here: a
    /// `Log` event passes any threshold up to `Error`, and a `Log` threshold
    /// only lets `Log`, `Fatal` and `Panic` through.
    #[must_use]
    pub fn is_log_output(self, threshold: Severity) -> bool {
        if matches!(self, Self::Log | Self::CommError) {
            threshold == Self::Log || threshold <= Self::Error
        } else if threshold == Self::Log {
            self >= Self::Fatal
        } else {
            self >= threshold
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// How much of an event's origin to record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ErrorVerbosity {
    /// Omit detail, hint, query and context (the spooler still records them).
    Terse,
    /// Standard output.
    #[default]
    Default,
    /// Also record the source location of the report.
    Verbose,
}

impl FromStr for ErrorVerbosity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "terse" => Ok(Self::Terse),
            "default" => Ok(Self::Default),
            "verbose" => Ok(Self::Verbose),
            other => Err(CoreError::invalid_config(format!(
                "invalid error verbosity \"{other}\""
            ))),
        }
    }
}

/// A five-character SQLSTATE code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SqlState([u8; 5]);

impl SqlState {
    /// `00000`, used when an event carries no code.
    pub const SUCCESSFUL_COMPLETION: SqlState = SqlState(*b"00000");
    /// `XX000`, substituted for codes that cannot be represented.
    pub const INTERNAL_ERROR: SqlState = SqlState(*b"XX000");

    /// Parses a code made of exactly five characters from `0-9A-Z`.
    ///
    /// Lower-case letters are accepted and upper-cased.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        let bytes = code.as_bytes();
        if bytes.len() != 5 {
            return None;
        }
        let mut out = [0u8; 5];
        for (slot, &b) in out.iter_mut().zip(bytes) {
            let upper = b.to_ascii_uppercase();
            if !(upper.is_ascii_digit() || upper.is_ascii_uppercase()) {
                return None;
            }
            *slot = upper;
        }
        Some(Self(out))
    }

    /// Parses `code`, falling back to [`SqlState::INTERNAL_ERROR`].
    #[must_use]
    pub fn normalize(code: &str) -> Self {
        Self::parse(code).unwrap_or(Self::INTERNAL_ERROR)
    }

    /// Packs the code into six bits per character, first character lowest.
    #[must_use]
    pub fn pack(self) -> u32 {
        self.0
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, &c)| acc | (u32::from(c.wrapping_sub(b'0') & 0x3F) << (6 * i)))
    }

    /// Inverse of [`SqlState::pack`].
    #[must_use]
    pub fn unpack(mut packed: u32) -> Self {
        let mut out = [0u8; 5];
        for slot in &mut out {
            *slot = (packed & 0x3F) as u8 + b'0';
            packed >>= 6;
        }
        Self::parse(std::str::from_utf8(&out).unwrap_or("")).unwrap_or(Self::INTERNAL_ERROR)
    }

    /// Returns the code as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ASCII digits and letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("XX000")
    }
}

impl Default for SqlState {
    fn default() -> Self {
        Self::SUCCESSFUL_COMPLETION
    }
}

impl fmt::Display for SqlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic event as reported by the host.
///
/// Only the severity and the message are mandatory. Optional text fields
/// keep the difference between "absent" and "empty": an absent field is
/// written as an empty cell, an empty string as `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Severity of the report.
    pub severity: Severity,
    /// Primary message.
    pub message: String,
    /// Detail shown to the client.
    pub detail: Option<String>,
    /// Detail meant for the server log only; preferred over `detail`.
    pub detail_log: Option<String>,
    /// Hint.
    pub hint: Option<String>,
    /// Internally generated query the error refers to.
    pub internal_query: Option<String>,
    /// Cursor position inside `internal_query` (1-based, 0 = none).
    pub internal_position: i32,
    /// Context stack.
    pub context: Option<String>,
    /// Cursor position inside the current statement (1-based, 0 = none).
    pub cursor_position: i32,
    /// The reporter asked for the statement to be left out.
    pub hide_statement: bool,
    /// SQLSTATE of the report.
    pub sql_state: SqlState,
    /// Function that raised the report.
    pub function_name: Option<String>,
    /// Source file that raised the report.
    pub file_name: Option<String>,
    /// Source line that raised the report.
    pub line_number: u32,
    /// When the event happened; the formatter uses the current time if unset.
    pub timestamp: Option<Timestamp>,
}

impl LogEvent {
    /// Creates an event with only a severity and a message.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            detail: None,
            detail_log: None,
            hint: None,
            internal_query: None,
            internal_position: 0,
            context: None,
            cursor_position: 0,
            hide_statement: false,
            sql_state: SqlState::default(),
            function_name: None,
            file_name: None,
            line_number: 0,
            timestamp: None,
        }
    }

    /// Sets the client detail.
    #[must_use]
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Sets the server-log-only detail.
    #[must_use]
    pub fn detail_log(mut self, detail: impl Into<String>) -> Self {
        self.detail_log = Some(detail.into());
        self
    }

    /// Sets the hint.
    #[must_use]
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Sets the internal query and the cursor position inside it.
    #[must_use]
    pub fn internal_query(mut self, query: impl Into<String>, position: i32) -> Self {
        self.internal_query = Some(query.into());
        self.internal_position = position;
        self
    }

    /// Sets the context.
    #[must_use]
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Sets the cursor position inside the current statement.
    #[must_use]
    pub fn cursor_position(mut self, position: i32) -> Self {
        self.cursor_position = position;
        self
    }

    /// Keeps the current statement out of the record.
    #[must_use]
    pub fn hide_statement(mut self, hide: bool) -> Self {
        self.hide_statement = hide;
        self
    }

    /// Sets the SQLSTATE.
    #[must_use]
    pub fn sql_state(mut self, state: SqlState) -> Self {
        self.sql_state = state;
        self
    }

    /// Sets the source location.
    #[must_use]
    pub fn location(
        mut self,
        function_name: Option<&str>,
        file_name: impl Into<String>,
        line_number: u32,
    ) -> Self {
        self.function_name = function_name.map(str::to_string);
        self.file_name = Some(file_name.into());
        self.line_number = line_number;
        self
    }

    /// Sets the event timestamp.
    #[must_use]
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Ambient state of the process that emitted an event.
///
/// Everything is optional: a background worker has no client connection,
/// a process outside a transaction has no transaction id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    /// Process id, 0 when unknown.
    pub process_id: u32,
    /// When the process started.
    pub process_start: Option<Timestamp>,
    /// Connected user.
    pub user_name: Option<String>,
    /// Connected database.
    pub database_name: Option<String>,
    /// Client host.
    pub remote_host: Option<String>,
    /// Client port.
    pub remote_port: Option<String>,
    /// What the process is doing, as shown in its process title.
    pub activity: Option<String>,
    /// Backend slot, used for the virtual transaction id.
    pub backend_id: Option<u32>,
    /// Local transaction counter of the backend.
    pub local_xid: u32,
    /// Top-level transaction id, 0 when none is assigned.
    pub transaction_id: u32,
    /// Client application name.
    pub application_name: Option<String>,
    /// Statement currently being executed.
    pub query_text: Option<String>,
}

impl SessionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context for the calling process, started now.
    #[must_use]
    pub fn current_process() -> Self {
        Self {
            process_id: std::process::id(),
            process_start: Some(now()),
            ..Self::default()
        }
    }

    /// Sets the process identity.
    #[must_use]
    pub fn process(mut self, process_id: u32, start: Timestamp) -> Self {
        self.process_id = process_id;
        self.process_start = Some(start);
        self
    }

    /// Sets the connected user and database.
    #[must_use]
    pub fn connection(mut self, user: impl Into<String>, database: impl Into<String>) -> Self {
        self.user_name = Some(user.into());
        self.database_name = Some(database.into());
        self
    }

    /// Sets the client address.
    #[must_use]
    pub fn remote(mut self, host: impl Into<String>, port: Option<&str>) -> Self {
        self.remote_host = Some(host.into());
        self.remote_port = port.map(str::to_string);
        self
    }

    /// Sets the activity descriptor.
    #[must_use]
    pub fn activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }

    /// Sets the virtual transaction id parts.
    #[must_use]
    pub fn virtual_xid(mut self, backend_id: u32, local_xid: u32) -> Self {
        self.backend_id = Some(backend_id);
        self.local_xid = local_xid;
        self
    }

    /// Sets the top-level transaction id.
    #[must_use]
    pub fn transaction_id(mut self, xid: u32) -> Self {
        self.transaction_id = xid;
        self
    }

    /// Sets the application name.
    #[must_use]
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Sets the statement currently running.
    #[must_use]
    pub fn query_text(mut self, query: impl Into<String>) -> Self {
        self.query_text = Some(query.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_names() {
        assert_eq!(Severity::Debug3.name(), "DEBUG");
        assert_eq!(Severity::CommError.name(), "LOG");
        assert_eq!(Severity::Warning.to_string(), "WARNING");
    }

    #[test]
    fn severity_parse_accepts_documented_names() {
        assert_eq!(Severity::parse("debug").unwrap(), Severity::Debug2);
        assert_eq!(Severity::parse("DEBUG5").unwrap(), Severity::Debug5);
        assert_eq!(Severity::parse(" warning ").unwrap(), Severity::Warning);
        assert_eq!("panic".parse::<Severity>().unwrap(), Severity::Panic);
        assert!(matches!(
            Severity::parse("loud"),
            Err(CoreError::UnknownSeverity { .. })
        ));
        // Not a configuration name even though it is a severity.
        assert!(Severity::parse("commerror").is_err());
    }

    #[test]
    fn log_output_plain_ordering() {
        assert!(Severity::Error.is_log_output(Severity::Warning));
        assert!(Severity::Warning.is_log_output(Severity::Warning));
        assert!(!Severity::Notice.is_log_output(Severity::Warning));
    }

    #[test]
    fn log_output_moves_log_between_error_and_fatal() {
        assert!(Severity::Log.is_log_output(Severity::Warning));
        assert!(Severity::Log.is_log_output(Severity::Error));
        assert!(!Severity::Log.is_log_output(Severity::Fatal));
        assert!(Severity::CommError.is_log_output(Severity::Log));

        assert!(!Severity::Error.is_log_output(Severity::Log));
        assert!(Severity::Fatal.is_log_output(Severity::Log));
        assert!(Severity::Panic.is_log_output(Severity::Log));
    }

    #[test]
    fn sql_state_normalization() {
        assert_eq!(SqlState::normalize("42p01").as_str(), "42P01");
        assert_eq!(SqlState::normalize("4201"), SqlState::INTERNAL_ERROR);
        assert_eq!(SqlState::normalize("42-01"), SqlState::INTERNAL_ERROR);
        assert_eq!(SqlState::default().as_str(), "00000");
    }

    #[test]
    fn sql_state_pack_unpack() {
        for code in ["00000", "42P01", "XX000", "23505", "57014"] {
            let state = SqlState::parse(code).unwrap();
            assert_eq!(SqlState::unpack(state.pack()), state);
        }
        assert_eq!(SqlState::SUCCESSFUL_COMPLETION.pack(), 0);
    }

    #[test]
    fn verbosity_parse() {
        assert_eq!("verbose".parse::<ErrorVerbosity>().unwrap(), ErrorVerbosity::Verbose);
        assert!("chatty".parse::<ErrorVerbosity>().is_err());
        assert!(ErrorVerbosity::Verbose > ErrorVerbosity::Default);
    }

    #[test]
    fn event_builder() {
        let event = LogEvent::new(Severity::Error, "boom")
            .detail("d")
            .internal_query("SELECT 1", 3)
            .location(Some("exec_simple_query"), "postgres.c", 1042);
        assert_eq!(event.detail.as_deref(), Some("d"));
        assert_eq!(event.internal_position, 3);
        assert_eq!(event.file_name.as_deref(), Some("postgres.c"));
        assert!(event.hint.is_none());
    }
}

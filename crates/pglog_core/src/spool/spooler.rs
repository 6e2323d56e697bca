//! The event spooler.

use crate::config::{canonicalize_path, validate_directory, SpoolConfig};
use crate::error::CoreResult;
use crate::event::{LogEvent, SessionContext, Severity};
use crate::format::EventFormatter;
use crate::spool::writer::{SpoolWriter, WriteStatus};
use pglog_storage::{FileOpener, SegmentOpener};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// What happened to an event handed to [`Spooler::emit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    /// The record was appended to the current segment.
    Written,
    /// The event was below `min_messages`.
    Filtered,
    /// Spooling is off: no directory, or the writer is disabled.
    Suppressed,
    /// Opening or writing the segment failed; spooling is now disabled.
    Failed,
}

/// Receives log events and appends them as CSV records to segment files.
///
/// A spooler is owned by one thread. Settings may be changed between
/// events; a directory change takes effect at the next event by rotating
/// into the new directory.
#[derive(Debug)]
pub struct Spooler {
    config: SpoolConfig,
    writer: SpoolWriter,
    formatter: EventFormatter,
    rotation_pending: bool,
}

impl Spooler {
    /// Creates a spooler writing real files.
    ///
    /// No file is created until the first event passes the filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn init(config: SpoolConfig) -> CoreResult<Self> {
        let opener = Arc::new(FileOpener::new(config.file_mode));
        Self::with_opener(config, opener)
    }

    /// Creates a spooler that opens segments through `opener`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_opener(config: SpoolConfig, opener: Arc<dyn SegmentOpener>) -> CoreResult<Self> {
        config.validate()?;
        info!(
            directory = ?config.directory,
            min_messages = %config.min_messages,
            "spooler initialized"
        );
        Ok(Self {
            config,
            writer: SpoolWriter::new(opener),
            formatter: EventFormatter::new(),
            rotation_pending: false,
        })
    }

    /// Closes the current segment.
    pub fn shutdown(mut self) {
        self.writer.close();
        info!(records = self.formatter.line_number(), "spooler shut down");
    }

    /// Filters, formats and appends one event.
    pub fn emit(&mut self, event: &LogEvent, ctx: &SessionContext) -> EmitOutcome {
        let dir = match self.config.directory.as_deref() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => {
                self.writer.close();
                return EmitOutcome::Suppressed;
            }
        };

        if !event.severity.is_log_output(self.config.min_messages) {
            return EmitOutcome::Filtered;
        }

        if self.rotation_pending {
            self.rotation_pending = false;
            self.writer.rotate(dir);
        } else if !self.writer.is_enabled() {
            return EmitOutcome::Suppressed;
        } else {
            self.writer.ensure_open(dir);
        }

        if !self.writer.is_open() {
            return EmitOutcome::Failed;
        }

        let record = self
            .formatter
            .format(event, ctx, &self.config.format_settings());
        match self.writer.write(record.as_bytes()) {
            WriteStatus::Written { .. } => EmitOutcome::Written,
            WriteStatus::Refused => EmitOutcome::Suppressed,
            WriteStatus::Failed => EmitOutcome::Failed,
        }
    }

    /// Starts a new segment at the next event. Also re-enables a
    /// disabled spooler if the new segment opens.
    pub fn request_rotation(&mut self) {
        debug!("segment rotation requested");
        self.rotation_pending = true;
    }

    /// Changes the spool directory. An empty value turns spooling off.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot name a directory.
    pub fn set_directory(&mut self, value: &str) -> CoreResult<()> {
        validate_directory(value)?;
        let directory = if value.is_empty() {
            None
        } else {
            Some(canonicalize_path(Path::new(value)))
        };

        if directory != self.config.directory {
            info!(directory = ?directory, "spool directory changed");
            self.config.directory = directory;
            self.rotation_pending = true;
        }
        Ok(())
    }

    /// Changes the minimum severity by name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownSeverity`](crate::CoreError::UnknownSeverity)
    /// for names that are not severities.
    pub fn set_min_messages(&mut self, name: &str) -> CoreResult<()> {
        self.config.min_messages = Severity::parse(name)?;
        Ok(())
    }

    /// Changes the minimum severity at which the statement is recorded.
    ///
    /// # Errors
    ///
    /// Returns an error for names that are not severities.
    pub fn set_min_error_statement(&mut self, name: &str) -> CoreResult<()> {
        self.config.min_error_statement = Severity::parse(name)?;
        Ok(())
    }

    /// Returns `false` while failures keep spooling disabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.writer.is_enabled()
    }

    /// Path of the segment currently being written.
    #[must_use]
    pub fn current_segment(&self) -> Option<&Path> {
        self.writer.current_path()
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SpoolConfig {
        &self.config
    }

    /// The configured directory, if spooling is on.
    #[must_use]
    pub fn directory(&self) -> Option<&PathBuf> {
        self.config.directory.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_record;
    use crate::CoreError;
    use pglog_storage::InMemoryOpener;

    fn memory_spooler(config: SpoolConfig) -> (Arc<InMemoryOpener>, Spooler) {
        let opener = Arc::new(InMemoryOpener::new());
        let spooler = Spooler::with_opener(config, opener.clone()).unwrap();
        (opener, spooler)
    }

    fn ctx() -> SessionContext {
        SessionContext::new().connection("alice", "app")
    }

    fn lines(opener: &InMemoryOpener, path: &Path) -> Vec<String> {
        String::from_utf8(opener.contents(path).unwrap())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn filtered_events_create_nothing() {
        let (opener, mut spooler) = memory_spooler(SpoolConfig::new().directory("/spool"));
        let event = LogEvent::new(Severity::Info, "chatter");

        assert_eq!(spooler.emit(&event, &ctx()), EmitOutcome::Filtered);
        assert!(opener.paths().is_empty());
        assert!(spooler.current_segment().is_none());
    }

    #[test]
    fn warning_is_written() {
        let (opener, mut spooler) = memory_spooler(SpoolConfig::new().directory("/spool"));
        let event = LogEvent::new(Severity::Warning, "disk nearly full");

        assert_eq!(spooler.emit(&event, &ctx()), EmitOutcome::Written);

        let path = spooler.current_segment().unwrap().to_path_buf();
        let lines = lines(&opener, &path);
        assert_eq!(lines.len(), 1);
        let cells = parse_record(&lines[0]).unwrap();
        assert_eq!(cells.len(), 23);
        assert_eq!(cells[1].as_deref(), Some("alice"));
        assert_eq!(cells[11].as_deref(), Some("WARNING"));
        assert_eq!(cells[13].as_deref(), Some("disk nearly full"));
    }

    #[test]
    fn no_directory_suppresses() {
        let (opener, mut spooler) = memory_spooler(SpoolConfig::new().no_directory());
        let event = LogEvent::new(Severity::Error, "boom");

        assert_eq!(spooler.emit(&event, &ctx()), EmitOutcome::Suppressed);
        assert!(opener.paths().is_empty());
    }

    #[test]
    fn clearing_directory_closes_segment() {
        let (_, mut spooler) = memory_spooler(SpoolConfig::new().directory("/spool"));
        let event = LogEvent::new(Severity::Error, "boom");

        spooler.emit(&event, &ctx());
        assert!(spooler.current_segment().is_some());

        spooler.set_directory("").unwrap();
        assert_eq!(spooler.emit(&event, &ctx()), EmitOutcome::Suppressed);
        assert!(spooler.current_segment().is_none());
    }

    #[test]
    fn rotation_requests_produce_distinct_segments() {
        let (opener, mut spooler) = memory_spooler(SpoolConfig::new().directory("/spool"));
        let event = LogEvent::new(Severity::Error, "boom");

        for _ in 0..4 {
            spooler.request_rotation();
            assert_eq!(spooler.emit(&event, &ctx()), EmitOutcome::Written);
        }

        let paths = opener.paths();
        assert_eq!(paths.len(), 4);
        for path in paths {
            assert_eq!(lines(&opener, &path).len(), 1);
        }
    }

    #[test]
    fn disabled_spooler_recovers_on_rotation() {
        let opener = Arc::new(InMemoryOpener::new());
        let mut spooler =
            Spooler::with_opener(SpoolConfig::new().directory("/spool"), opener.clone()).unwrap();
        let event = LogEvent::new(Severity::Error, "boom");

        opener.set_capacity_limit(Some(10));
        assert_eq!(spooler.emit(&event, &ctx()), EmitOutcome::Failed);
        assert!(!spooler.is_enabled());
        assert_eq!(spooler.emit(&event, &ctx()), EmitOutcome::Suppressed);

        opener.set_capacity_limit(None);
        spooler.request_rotation();
        assert_eq!(spooler.emit(&event, &ctx()), EmitOutcome::Written);
        assert!(spooler.is_enabled());
    }

    #[test]
    fn open_failure_reports_failed() {
        let opener = Arc::new(InMemoryOpener::new());
        opener.set_fail_opens(true);
        let mut spooler =
            Spooler::with_opener(SpoolConfig::new().directory("/spool"), opener.clone()).unwrap();

        let event = LogEvent::new(Severity::Fatal, "gone");
        assert_eq!(spooler.emit(&event, &ctx()), EmitOutcome::Failed);
        assert_eq!(spooler.emit(&event, &ctx()), EmitOutcome::Suppressed);
    }

    #[test]
    fn directory_change_rotates_into_new_directory() {
        let (opener, mut spooler) = memory_spooler(SpoolConfig::new().directory("/one"));
        let event = LogEvent::new(Severity::Error, "boom");

        spooler.emit(&event, &ctx());
        spooler.set_directory("/two/./").unwrap();
        assert_eq!(spooler.directory(), Some(&PathBuf::from("/two")));
        spooler.emit(&event, &ctx());

        let paths = opener.paths();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].starts_with("/one"));
        assert!(paths[1].starts_with("/two"));
    }

    #[test]
    fn setting_same_directory_does_not_rotate() {
        let (opener, mut spooler) = memory_spooler(SpoolConfig::new().directory("/one"));
        let event = LogEvent::new(Severity::Error, "boom");

        spooler.emit(&event, &ctx());
        spooler.set_directory("/one").unwrap();
        spooler.emit(&event, &ctx());

        assert_eq!(opener.paths().len(), 1);
    }

    #[test]
    fn invalid_settings_rejected() {
        let (_, mut spooler) = memory_spooler(SpoolConfig::new().directory("/one"));
        assert!(spooler.set_directory("bad\0dir").is_err());
        assert!(matches!(
            spooler.set_min_messages("loud"),
            Err(CoreError::UnknownSeverity { .. })
        ));

        spooler.set_min_messages("log").unwrap();
        assert_eq!(spooler.config().min_messages, Severity::Log);
    }

    #[test]
    fn line_numbers_continue_across_rotation() {
        let (opener, mut spooler) = memory_spooler(SpoolConfig::new().directory("/spool"));
        let ctx = ctx().process(7, crate::event::now());
        let event = LogEvent::new(Severity::Error, "boom");

        spooler.emit(&event, &ctx);
        spooler.request_rotation();
        spooler.emit(&event, &ctx);

        let paths = opener.paths();
        let second = lines(&opener, &paths[1]);
        let cells = parse_record(&second[0]).unwrap();
        assert_eq!(cells[6].as_deref(), Some("2"));
    }

    #[test]
    fn shutdown_closes() {
        let tmp = tempfile::tempdir().unwrap();
        let mut spooler = Spooler::init(SpoolConfig::new().directory(tmp.path())).unwrap();
        spooler.emit(&LogEvent::new(Severity::Panic, "bye"), &ctx());
        let path = spooler.current_segment().unwrap().to_path_buf();
        spooler.shutdown();

        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("PANIC"));
    }
}

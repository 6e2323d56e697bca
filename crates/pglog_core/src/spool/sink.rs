//! Event sinks and the ordered chain that feeds them.

use crate::event::{LogEvent, SessionContext, Severity};
use crate::spool::spooler::Spooler;
use parking_lot::Mutex;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A destination for captured log events.
pub trait EventSink: Send {
    /// Short name used in diagnostics.
    fn name(&self) -> Cow<'_, str>;

    /// Handles one event. Sinks must not fail the caller.
    fn handle(&mut self, event: &LogEvent, ctx: &SessionContext);
}

impl EventSink for Spooler {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("pglog")
    }

    fn handle(&mut self, event: &LogEvent, ctx: &SessionContext) {
        self.emit(event, ctx);
    }
}

/// Lets the host keep a handle on a sink (to change settings or rotate)
/// while the chain owns a clone. Reports the wrapped sink's name.
impl<S: EventSink> EventSink for Arc<Mutex<S>> {
    fn name(&self) -> Cow<'_, str> {
        Cow::Owned(self.lock().name().into_owned())
    }

    fn handle(&mut self, event: &LogEvent, ctx: &SessionContext) {
        self.lock().handle(event, ctx);
    }
}

/// Forwards events to `tracing` at the matching level.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    min_severity: Severity,
}

impl TracingSink {
    /// Forwards events that pass `min_severity`.
    #[must_use]
    pub const fn new(min_severity: Severity) -> Self {
        Self { min_severity }
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(Severity::Warning)
    }
}

impl EventSink for TracingSink {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("tracing")
    }

    fn handle(&mut self, event: &LogEvent, ctx: &SessionContext) {
        if !event.severity.is_log_output(self.min_severity) {
            return;
        }

        let pid = ctx.process_id;
        let state = event.sql_state.as_str();
        let message = event.message.as_str();
        match event.severity {
            Severity::Debug5
            | Severity::Debug4
            | Severity::Debug3
            | Severity::Debug2
            | Severity::Debug1 => tracing::debug!(pid, state, "{message}"),
            Severity::Log | Severity::CommError | Severity::Info | Severity::Notice => {
                tracing::info!(pid, state, "{message}")
            }
            Severity::Warning => tracing::warn!(pid, state, "{message}"),
            Severity::Error | Severity::Fatal | Severity::Panic => {
                tracing::error!(pid, state, severity = %event.severity, "{message}")
            }
        }
    }
}

/// Sinks that every event is dispatched to, in registration order.
#[derive(Default)]
pub struct SinkChain {
    sinks: Vec<Box<dyn EventSink>>,
}

impl SinkChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sink to the end of the chain.
    pub fn push(&mut self, sink: impl EventSink + 'static) -> &mut Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Hands the event to every sink, first registered first.
    pub fn dispatch(&mut self, event: &LogEvent, ctx: &SessionContext) {
        for sink in &mut self.sinks {
            sink.handle(event, ctx);
        }
    }

    /// Number of registered sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns `true` if no sink is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Names of the registered sinks, in dispatch order.
    #[must_use]
    pub fn names(&self) -> Vec<Cow<'_, str>> {
        self.sinks.iter().map(|sink| sink.name()).collect()
    }
}

impl fmt::Debug for SinkChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkChain")
            .field("sinks", &self.names())
            .finish()
    }
}

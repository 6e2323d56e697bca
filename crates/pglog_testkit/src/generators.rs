//! Property-based test generators using proptest.
//!
//! Provides strategies for generating events and contexts that exercise
//! the quoting rules of the record format.

use chrono::{DateTime, FixedOffset, TimeZone};
use pglog_core::{LogEvent, SessionContext, Severity, SqlState};
use proptest::prelude::*;

/// Strategy for any severity.
pub fn severity_strategy() -> impl Strategy<Value = Severity> {
    prop::sample::select(vec![
        Severity::Debug5,
        Severity::Debug4,
        Severity::Debug3,
        Severity::Debug2,
        Severity::Debug1,
        Severity::Log,
        Severity::CommError,
        Severity::Info,
        Severity::Notice,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
        Severity::Panic,
    ])
}

/// Strategy for cell text, biased towards quotes, commas and line breaks.
pub fn cell_text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z \",\n\r]{0,24}").expect("Invalid regex")
}

/// Strategy for valid SQL state codes.
pub fn sql_state_strategy() -> impl Strategy<Value = SqlState> {
    prop::string::string_regex("[0-9A-Z]{5}")
        .expect("Invalid regex")
        .prop_map(|code| SqlState::normalize(&code))
}

/// Strategy for timestamps between 2000 and 2100, in whole milliseconds.
pub fn timestamp_strategy() -> impl Strategy<Value = DateTime<FixedOffset>> {
    (946_684_800_000i64..4_102_444_800_000i64, -12i32..=14).prop_map(|(millis, hours)| {
        let offset = FixedOffset::east_opt(hours * 3600).expect("offset in range");
        offset
            .timestamp_millis_opt(millis)
            .single()
            .expect("timestamp in range")
    })
}

/// Strategy for events with arbitrary optional fields.
pub fn log_event_strategy() -> impl Strategy<Value = LogEvent> {
    (
        severity_strategy(),
        cell_text_strategy(),
        prop::option::of(cell_text_strategy()),
        prop::option::of(cell_text_strategy()),
        prop::option::of(cell_text_strategy()),
        sql_state_strategy(),
        timestamp_strategy(),
    )
        .prop_map(|(severity, message, detail, hint, context, state, ts)| {
            let mut event = LogEvent::new(severity, message).sql_state(state).at(ts);
            if let Some(detail) = detail {
                event = event.detail(detail);
            }
            if let Some(hint) = hint {
                event = event.hint(hint);
            }
            if let Some(context) = context {
                event = event.context(context);
            }
            event
        })
}

/// Strategy for session contexts, some of them mostly empty.
pub fn session_context_strategy() -> impl Strategy<Value = SessionContext> {
    (
        0u32..100_000,
        timestamp_strategy(),
        prop::option::of(("[a-z]{1,8}", "[a-z]{1,8}")),
        prop::option::of(cell_text_strategy()),
    )
        .prop_map(|(pid, start, connection, query)| {
            let mut ctx = SessionContext::new().process(pid, start);
            if let Some((user, db)) = connection {
                ctx = ctx.connection(user, db);
            }
            if let Some(query) = query {
                ctx = ctx.query_text(query);
            }
            ctx
        })
}

//! # pglog Core
//!
//! Event spooling and segment scanning for pglog.
//!
//! This crate provides:
//! - The log event model ([`LogEvent`], [`SessionContext`], [`Severity`])
//! - A stateful CSV formatter with a fixed 23-field layout
//! - A spooler that appends formatted events to rotating segment files
//! - Discovery, cost estimation and sequential scanning of those segments
//!
//! ## Example
//!
//! ```rust,no_run
//! use pglog_core::{LogEvent, ScanCursor, ScanOptions, SessionContext, Severity, SpoolConfig, Spooler};
//!
//! let mut spooler = Spooler::init(SpoolConfig::new().directory("/tmp/pglog")).unwrap();
//! let ctx = SessionContext::current_process().connection("alice", "app");
//! spooler.emit(&LogEvent::new(Severity::Error, "division by zero"), &ctx);
//! spooler.shutdown();
//!
//! let mut cursor = ScanCursor::new(ScanOptions::new("/tmp/pglog"));
//! cursor.open().unwrap();
//! for row in &mut cursor {
//!     println!("{:?}", row.unwrap().message());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod event;
mod format;
mod record;
pub mod scan;
pub mod spool;

pub use config::{canonicalize_path, ScanOptions, SpoolConfig, DEFAULT_SPOOL_DIRECTORY};
pub use error::{CoreError, CoreResult};
pub use event::{now, ErrorVerbosity, LogEvent, SessionContext, Severity, SqlState, Timestamp};
pub use format::{EventFormatter, FormatSettings, RECORD_FIELD_COUNT};
pub use record::{append_csv_literal, parse_record, Cell, RecordBuilder, RecordError, RecordReader};
pub use scan::{
    analyze, ColumnSelection, CostEstimator, CostParams, CursorState, FileCatalog, LogRelation,
    LogRow, PredicateCost, RelationStats, ScanCursor, ScanPlan, Value, COLUMNS,
};
pub use spool::{EmitOutcome, EventSink, SinkChain, SpoolWriter, Spooler, TracingSink, WriteStatus};

/// File name prefix of every segment.
pub const SEGMENT_PREFIX: &str = "pglog";

/// File name suffix of every segment.
pub const SEGMENT_SUFFIX: &str = ".dat";

/// Segments discovered per scan unless configured otherwise.
pub const DEFAULT_MAX_FILES: usize = 16;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Event spooling.
//!
//! A [`Spooler`] receives log events, filters them by severity, renders
//! them with an [`EventFormatter`](crate::EventFormatter) and appends the
//! resulting records to the current segment through a [`SpoolWriter`].
//!
//! ## Segment lifecycle
//!
//! ```text
//!          ensure_open            write ok
//! Closed ─────────────▶ Open ◀──────────────┐
//!   ▲                    │  └───────────────┘
//!   │ rotate             │ short write / open failure
//!   │                    ▼
//!   └──────────────── Disabled
//! ```
//!
//! A disabled writer drops every event until a rotation succeeds.

mod naming;
mod sink;
mod spooler;
mod writer;

pub use naming::{segment_file_name, SEGMENT_TIME_FORMAT};
pub use sink::{EventSink, SinkChain, TracingSink};
pub use spooler::{EmitOutcome, Spooler};
pub use writer::{SpoolWriter, WriteStatus};

//! # pglog Testkit
//!
//! Test utilities for pglog.
//!
//! This crate provides:
//! - Temporary spool directories with hand-written segments
//! - Canned events and session contexts
//! - Property-based test generators using proptest
//! - An in-memory spooling harness for failure injection
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pglog_testkit::prelude::*;
//!
//! #[test]
//! fn scans_two_segments() {
//!     let dir = SpoolDir::new();
//!     dir.write_segment("pglog-2021-01-01_000000.dat", &sample_events(2));
//!     assert_eq!(dir.scan_messages().len(), 2);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;

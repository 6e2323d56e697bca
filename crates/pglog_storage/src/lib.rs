//! # pglog Storage
//!
//! Byte-store backends for pglog spool segments.
//!
//! Backends are **opaque byte stores**: they append and flush, and know
//! nothing about the record format written into them.
//! The spooler never creates backends directly; it asks a
//! [`SegmentOpener`] for one, which lets tests substitute in-memory
//! segments and inject open or write failures.
//!
//! ## Design Principles
//!
//! - Appends report how many bytes were accepted, so callers can detect
//!   short writes instead of having them folded into an error
//! - No knowledge of segment naming, rotation or the record layout
//! - Must be `Send + Sync` so a host can keep its spooler behind a lock
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing, with an optional capacity limit
//! - [`FileBackend`] - Append-mode files with owner-only permissions
//!
//! ## Example
//!
//! ```rust
//! use pglog_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let written = backend.append(b"hello world\n").unwrap();
//! assert_eq!(written, 12);
//! assert_eq!(&backend.data()[..5], b"hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;
mod opener;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::{FileBackend, DEFAULT_FILE_MODE};
pub use memory::InMemoryBackend;
pub use opener::{FileOpener, InMemoryOpener, SegmentOpener};

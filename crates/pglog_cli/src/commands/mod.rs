//! CLI command implementations.

pub mod analyze;
pub mod estimate;
pub mod list;
pub mod scan;
pub mod spool;

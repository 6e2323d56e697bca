//! Scanning spooled segments as one relation.
//!
//! A [`FileCatalog`] discovers the segment files in a directory, a
//! [`CostEstimator`] sizes them up for a planner, and a [`ScanCursor`]
//! reads them back one record at a time as [`LogRow`]s.
//!
//! ## Cursor States
//!
//! ```text
//! Unopened ──open──▶ FileOpen ──file exhausted──▶ next file? ──no──▶ Done
//!                       ▲                            │ yes
//!                       └────────────────────────────┘
//! ```
//!
//! Any read failure closes the open file and ends the scan with an error.

mod catalog;
mod cursor;
mod estimate;
mod relation;
mod row;

pub use catalog::FileCatalog;
pub use cursor::{CursorState, ScanCursor};
pub use estimate::{
    clamp_row_estimate, CostEstimate, CostEstimator, CostParams, PredicateCost, RelationStats,
    SizeEstimate,
};
pub use relation::{analyze, LogRelation, ScanPlan};
pub use row::{ColumnSelection, ColumnType, LogRow, Value, COLUMNS};

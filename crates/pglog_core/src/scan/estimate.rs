//! Size and cost estimates for scanning segments.
//!
//! I/O is costed as if the segments were a native table of the same size.
//! CPU cost per tuple is ten times that of a native scan, to pay for
//! parsing text records.

use std::fs;
use std::path::Path;

/// Upper bound for any row estimate.
const MAX_ROW_ESTIMATE: f64 = 1e100;

/// Alignment applied to row widths and tuple headers.
const MAX_ALIGN: u32 = 8;

/// Planner cost constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostParams {
    /// Cost of reading one page sequentially.
    pub seq_page_cost: f64,
    /// Cost of processing one tuple in a native scan.
    pub cpu_tuple_cost: f64,
    /// Page size in bytes.
    pub page_size: u64,
    /// Size assumed for a segment that cannot be stat'ed.
    pub default_file_size: u64,
    /// Per-tuple header overhead added to the row width.
    pub tuple_overhead: u32,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            seq_page_cost: 1.0,
            cpu_tuple_cost: 0.01,
            page_size: 8192,
            default_file_size: 10 * 8192,
            tuple_overhead: 24,
        }
    }
}

impl CostParams {
    /// Creates the default cost constants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sequential page cost.
    #[must_use]
    pub const fn seq_page_cost(mut self, cost: f64) -> Self {
        self.seq_page_cost = cost;
        self
    }

    /// Sets the per-tuple CPU cost.
    #[must_use]
    pub const fn cpu_tuple_cost(mut self, cost: f64) -> Self {
        self.cpu_tuple_cost = cost;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn page_size(mut self, size: u64) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the size assumed for missing segments.
    #[must_use]
    pub const fn default_file_size(mut self, size: u64) -> Self {
        self.default_file_size = size;
        self
    }
}

/// Page and tuple counts observed by a previous [`analyze`](super::analyze).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelationStats {
    /// Pages covered by the analyzed segments.
    pub pages: u64,
    /// Records found in them.
    pub tuples: f64,
}

/// Result of [`CostEstimator::estimate_size`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeEstimate {
    /// Bytes assumed for the input.
    pub bytes: u64,
    /// Pages, at least one.
    pub pages: u64,
    /// Estimated records.
    pub tuples: f64,
}

/// Cost the caller's predicates add to a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PredicateCost {
    /// One-off cost before the first row.
    pub startup: f64,
    /// Cost of evaluating the predicates for one row.
    pub per_tuple: f64,
}

/// Result of [`CostEstimator::estimate_cost`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    /// Cost before the first row is returned.
    pub startup_cost: f64,
    /// Cost of returning every row.
    pub total_cost: f64,
}

/// Rounds a row estimate to a whole number of at least one.
#[must_use]
pub fn clamp_row_estimate(rows: f64) -> f64 {
    if rows.is_nan() || rows <= 1.0 {
        1.0
    } else if rows > MAX_ROW_ESTIMATE {
        MAX_ROW_ESTIMATE
    } else {
        rows.round_ties_even()
    }
}

const fn max_align(len: u32) -> u64 {
    let align = MAX_ALIGN as u64;
    (len as u64 + align - 1) & !(align - 1)
}

/// Estimates scan sizes and costs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostEstimator {
    params: CostParams,
}

impl CostEstimator {
    /// Creates an estimator with the given constants.
    #[must_use]
    pub const fn new(params: CostParams) -> Self {
        Self { params }
    }

    /// The constants in use.
    #[must_use]
    pub const fn params(&self) -> &CostParams {
        &self.params
    }

    /// Estimates pages and tuples for one segment file.
    ///
    /// A file that cannot be stat'ed is assumed to be
    /// [`CostParams::default_file_size`] bytes.
    #[must_use]
    pub fn estimate_size(
        &self,
        file: &Path,
        row_width: u32,
        prior: Option<&RelationStats>,
    ) -> SizeEstimate {
        let bytes = fs::metadata(file).ok().map(|meta| meta.len());
        self.estimate_size_for_bytes(bytes, row_width, prior)
    }

    /// Estimates pages and tuples for `bytes` of segment data.
    ///
    /// With prior statistics the observed density (tuples per page) is
    /// projected onto the current page count. Otherwise tuples are the
    /// byte size divided by the aligned `row_width` plus tuple overhead.
    #[must_use]
    pub fn estimate_size_for_bytes(
        &self,
        bytes: Option<u64>,
        row_width: u32,
        prior: Option<&RelationStats>,
    ) -> SizeEstimate {
        let bytes = bytes.unwrap_or(self.params.default_file_size);
        let page_size = self.params.page_size.max(1);
        let pages = bytes.div_ceil(page_size).max(1);

        let tuples = match prior {
            Some(stats) if stats.pages > 0 => {
                let density = stats.tuples / stats.pages as f64;
                clamp_row_estimate(density * pages as f64)
            }
            _ => {
                let width = max_align(row_width) + max_align(self.params.tuple_overhead);
                clamp_row_estimate(bytes as f64 / width as f64)
            }
        };

        SizeEstimate {
            bytes,
            pages,
            tuples,
        }
    }

    /// Rows expected to survive predicates with the given selectivity.
    #[must_use]
    pub fn estimate_rows(&self, tuples: f64, selectivity: f64) -> f64 {
        clamp_row_estimate(tuples * selectivity.clamp(0.0, 1.0))
    }

    /// Costs a sequential scan over `pages` pages holding `tuples` records.
    #[must_use]
    pub fn estimate_cost(&self, pages: u64, tuples: f64, predicate: PredicateCost) -> CostEstimate {
        let cpu_per_tuple = self.params.cpu_tuple_cost * 10.0 + predicate.per_tuple;
        let run_cost = self.params.seq_page_cost * pages as f64 + cpu_per_tuple * tuples;
        CostEstimate {
            startup_cost: predicate.startup,
            total_cost: predicate.startup + run_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn ten_kib_without_stats() {
        let estimator = CostEstimator::default();
        let size = estimator.estimate_size_for_bytes(Some(10 * 1024), 176, None);
        assert_eq!(size.pages, 2);
        assert_eq!(size.tuples, 51.0);
    }

    #[test]
    fn unaligned_width_is_rounded_up() {
        let estimator = CostEstimator::default();
        let size = estimator.estimate_size_for_bytes(Some(10 * 1024), 170, None);
        assert_eq!(size.tuples, 51.0);
    }

    #[test]
    fn missing_file_uses_default_size() {
        let dir = tempdir().unwrap();
        let estimator = CostEstimator::default();
        let size = estimator.estimate_size(&dir.path().join("absent.dat"), 176, None);
        assert_eq!(size.bytes, 10 * 8192);
        assert_eq!(size.pages, 10);
    }

    #[test]
    fn real_file_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg.dat");
        std::fs::write(&path, vec![b'x'; 8193]).unwrap();

        let size = CostEstimator::default().estimate_size(&path, 176, None);
        assert_eq!(size.bytes, 8193);
        assert_eq!(size.pages, 2);
    }

    #[test]
    fn widest_row_does_not_overflow() {
        let size =
            CostEstimator::default().estimate_size_for_bytes(Some(10 * 1024), u32::MAX, None);
        assert_eq!(size.pages, 2);
        assert_eq!(size.tuples, 1.0);

        let params = CostParams {
            tuple_overhead: u32::MAX,
            ..CostParams::default()
        };
        let size =
            CostEstimator::new(params).estimate_size_for_bytes(Some(10 * 1024), u32::MAX, None);
        assert_eq!(size.tuples, 1.0);
    }

    #[test]
    fn empty_input_is_one_page_one_row() {
        let size = CostEstimator::default().estimate_size_for_bytes(Some(0), 176, None);
        assert_eq!(size.pages, 1);
        assert_eq!(size.tuples, 1.0);
    }

    #[test]
    fn prior_stats_project_density() {
        let stats = RelationStats {
            pages: 4,
            tuples: 100.0,
        };
        let size =
            CostEstimator::default().estimate_size_for_bytes(Some(8 * 8192), 176, Some(&stats));
        assert_eq!(size.pages, 8);
        assert_eq!(size.tuples, 200.0);
    }

    #[test]
    fn empty_prior_stats_are_ignored() {
        let stats = RelationStats {
            pages: 0,
            tuples: 0.0,
        };
        let size =
            CostEstimator::default().estimate_size_for_bytes(Some(10 * 1024), 176, Some(&stats));
        assert_eq!(size.tuples, 51.0);
    }

    #[test]
    fn rows_apply_selectivity() {
        let estimator = CostEstimator::default();
        assert_eq!(estimator.estimate_rows(1000.0, 0.25), 250.0);
        assert_eq!(estimator.estimate_rows(1000.0, 0.0), 1.0);
        assert_eq!(estimator.estimate_rows(10.0, 3.0), 10.0);
    }

    #[test]
    fn cost_formula() {
        let estimator = CostEstimator::default();
        let cost = estimator.estimate_cost(
            2,
            51.0,
            PredicateCost {
                startup: 0.5,
                per_tuple: 0.0025,
            },
        );
        // 1.0 * 2 + (0.1 + 0.0025) * 51
        assert_eq!(cost.startup_cost, 0.5);
        assert!((cost.total_cost - (0.5 + 2.0 + 0.1025 * 51.0)).abs() < 1e-9);
    }

    #[test]
    fn clamp_rounds_half_to_even() {
        assert_eq!(clamp_row_estimate(-3.0), 1.0);
        assert_eq!(clamp_row_estimate(f64::NAN), 1.0);
        assert_eq!(clamp_row_estimate(2.5), 2.0);
        assert_eq!(clamp_row_estimate(3.5), 4.0);
        assert_eq!(clamp_row_estimate(1e200), MAX_ROW_ESTIMATE);
    }

    proptest! {
        #[test]
        fn larger_files_never_estimate_fewer_tuples(
            small in 0u64..10_000_000,
            extra in 0u64..10_000_000,
            width in 1u32..2048,
        ) {
            let estimator = CostEstimator::default();
            let a = estimator.estimate_size_for_bytes(Some(small), width, None);
            let b = estimator.estimate_size_for_bytes(Some(small + extra), width, None);
            prop_assert!(b.tuples >= a.tuples);
            prop_assert!(b.pages >= a.pages);
        }

        #[test]
        fn larger_files_never_estimate_fewer_tuples_with_stats(
            small in 0u64..10_000_000,
            extra in 0u64..10_000_000,
            pages in 1u64..1000,
            tuples in 0.0f64..1e6,
        ) {
            let stats = RelationStats { pages, tuples };
            let estimator = CostEstimator::default();
            let a = estimator.estimate_size_for_bytes(Some(small), 200, Some(&stats));
            let b = estimator.estimate_size_for_bytes(Some(small + extra), 200, Some(&stats));
            prop_assert!(b.tuples >= a.tuples);
        }
    }
}

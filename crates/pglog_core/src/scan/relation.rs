//! The set of segments in one directory, planned and scanned as a table.

use crate::config::ScanOptions;
use crate::error::CoreResult;
use crate::scan::catalog::FileCatalog;
use crate::scan::cursor::ScanCursor;
use crate::scan::estimate::{CostEstimator, CostParams, PredicateCost, RelationStats};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Planner-facing summary of a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPlan {
    /// Segments that would be read, in order.
    pub files: Vec<PathBuf>,
    /// Bytes assumed for the whole relation.
    pub bytes: u64,
    /// Pages, at least one.
    pub pages: u64,
    /// Estimated records before predicates.
    pub tuples: f64,
    /// Estimated rows after predicates.
    pub rows: f64,
    /// Cost before the first row.
    pub startup_cost: f64,
    /// Cost of the whole scan.
    pub total_cost: f64,
}

/// Every segment in a directory, viewed as one relation.
#[derive(Debug, Clone)]
pub struct LogRelation {
    options: ScanOptions,
    estimator: CostEstimator,
    stats: Option<RelationStats>,
}

impl LogRelation {
    /// Creates a relation with default cost constants and no statistics.
    #[must_use]
    pub fn new(options: ScanOptions) -> Self {
        Self {
            options,
            estimator: CostEstimator::default(),
            stats: None,
        }
    }

    /// Uses the given cost constants.
    #[must_use]
    pub fn with_params(mut self, params: CostParams) -> Self {
        self.estimator = CostEstimator::new(params);
        self
    }

    /// Uses statistics from an earlier [`analyze`].
    #[must_use]
    pub fn with_stats(mut self, stats: RelationStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Statistics in use, if any.
    #[must_use]
    pub fn stats(&self) -> Option<&RelationStats> {
        self.stats.as_ref()
    }

    /// Scan options.
    #[must_use]
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Sizes and costs a full scan.
    ///
    /// `row_width` is the planner's expected output row width and
    /// `selectivity` the fraction of rows its predicates keep. All
    /// segments are summed; with none on disk the default size is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn plan(
        &self,
        row_width: u32,
        selectivity: f64,
        predicate: PredicateCost,
    ) -> CoreResult<ScanPlan> {
        let files = FileCatalog::new(&self.options).list()?;
        let bytes = if files.is_empty() {
            None
        } else {
            Some(
                files
                    .iter()
                    .filter_map(|path| fs::metadata(path).ok())
                    .map(|meta| meta.len())
                    .sum::<u64>(),
            )
        };

        let size = self
            .estimator
            .estimate_size_for_bytes(bytes, row_width, self.stats.as_ref());
        let rows = self.estimator.estimate_rows(size.tuples, selectivity);
        let cost = self.estimator.estimate_cost(size.pages, size.tuples, predicate);

        debug!(
            files = files.len(),
            pages = size.pages,
            tuples = size.tuples,
            rows,
            total_cost = cost.total_cost,
            "planned scan"
        );

        Ok(ScanPlan {
            files,
            bytes: size.bytes,
            pages: size.pages,
            tuples: size.tuples,
            rows,
            startup_cost: cost.startup_cost,
            total_cost: cost.total_cost,
        })
    }

    /// Starts a scan.
    ///
    /// An explain-only scan never lists the directory or opens a file and
    /// is exhausted from the start.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or the first
    /// segment cannot be opened.
    pub fn begin_scan(&self, explain_only: bool) -> CoreResult<ScanCursor> {
        if explain_only {
            return Ok(ScanCursor::exhausted(self.options.clone()));
        }
        let mut cursor = ScanCursor::new(self.options.clone());
        cursor.open()?;
        Ok(cursor)
    }

    /// Reads every segment to refresh the statistics used by [`Self::plan`].
    ///
    /// # Errors
    ///
    /// Returns the first scan error.
    pub fn analyze(&mut self) -> CoreResult<RelationStats> {
        let stats = analyze(&self.options, self.estimator.params())?;
        self.stats = Some(stats);
        Ok(stats)
    }
}

/// Counts the records and pages of every segment.
///
/// # Errors
///
/// Returns the first scan error; partial counts are never reported.
pub fn analyze(options: &ScanOptions, params: &CostParams) -> CoreResult<RelationStats> {
    let mut cursor = ScanCursor::new(options.clone());
    cursor.open()?;

    let mut tuples = 0u64;
    while cursor.next_row()?.is_some() {
        tuples += 1;
    }

    let bytes: u64 = cursor
        .files()
        .iter()
        .filter_map(|path| fs::metadata(path).ok())
        .map(|meta| meta.len())
        .sum();
    let pages = if bytes == 0 {
        0
    } else {
        bytes.div_ceil(params.page_size.max(1))
    };
    cursor.close();

    info!(
        dir = %options.directory.display(),
        pages,
        tuples,
        "analyzed segments"
    );
    Ok(RelationStats {
        pages,
        tuples: tuples as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{LogEvent, SessionContext, Severity};
    use crate::format::{EventFormatter, FormatSettings};
    use crate::scan::cursor::CursorState;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_records(path: &Path, count: usize) {
        let mut formatter = EventFormatter::new();
        let ctx = SessionContext::new();
        let mut data = String::new();
        for i in 0..count {
            let event = LogEvent::new(Severity::Warning, format!("event {i}"));
            data.push_str(&formatter.format(&event, &ctx, &FormatSettings::default()));
        }
        fs::write(path, data).unwrap();
    }

    #[test]
    fn plan_without_segments_uses_default_size() {
        let dir = tempdir().unwrap();
        let relation = LogRelation::new(ScanOptions::new(dir.path()));
        let plan = relation.plan(176, 1.0, PredicateCost::default()).unwrap();

        assert!(plan.files.is_empty());
        assert_eq!(plan.bytes, 10 * 8192);
        assert_eq!(plan.pages, 10);
        assert_eq!(plan.tuples, 410.0);
        assert_eq!(plan.startup_cost, 0.0);
        assert!((plan.total_cost - (10.0 + 0.1 * 410.0)).abs() < 1e-9);
    }

    #[test]
    fn plan_sums_all_segments() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.dat"), vec![b'x'; 6000]).unwrap();
        fs::write(dir.path().join("b.dat"), vec![b'x'; 4240]).unwrap();

        let relation = LogRelation::new(ScanOptions::new(dir.path()));
        let plan = relation.plan(176, 0.5, PredicateCost::default()).unwrap();

        assert_eq!(plan.files.len(), 2);
        assert_eq!(plan.bytes, 10_240);
        assert_eq!(plan.pages, 2);
        assert_eq!(plan.tuples, 51.0);
        assert_eq!(plan.rows, 26.0);
    }

    #[test]
    fn analyze_feeds_plan() {
        let dir = tempdir().unwrap();
        write_records(&dir.path().join("a.dat"), 30);
        write_records(&dir.path().join("b.dat"), 12);

        let mut relation = LogRelation::new(ScanOptions::new(dir.path()));
        let stats = relation.analyze().unwrap();
        assert_eq!(stats.tuples, 42.0);
        assert!(stats.pages >= 1);
        assert_eq!(relation.stats(), Some(&stats));

        let plan = relation.plan(176, 1.0, PredicateCost::default()).unwrap();
        assert_eq!(plan.pages, stats.pages);
        assert_eq!(plan.tuples, 42.0);
    }

    #[test]
    fn analyze_empty_directory() {
        let dir = tempdir().unwrap();
        let stats = analyze(&ScanOptions::new(dir.path()), &CostParams::default()).unwrap();
        assert_eq!(stats.pages, 0);
        assert_eq!(stats.tuples, 0.0);
    }

    #[test]
    fn explain_only_scan_touches_nothing() {
        let dir = tempdir().unwrap();
        write_records(&dir.path().join("a.dat"), 3);

        let relation = LogRelation::new(ScanOptions::new(dir.path()));
        let mut cursor = relation.begin_scan(true).unwrap();
        assert_eq!(cursor.state(), CursorState::Done);
        assert!(cursor.files().is_empty());
        assert!(cursor.next_row().unwrap().is_none());
    }

    #[test]
    fn begin_scan_reads_rows() {
        let dir = tempdir().unwrap();
        write_records(&dir.path().join("a.dat"), 3);

        let relation = LogRelation::new(ScanOptions::new(dir.path()));
        let rows: Vec<_> = relation
            .begin_scan(false)
            .unwrap()
            .collect::<CoreResult<_>>()
            .unwrap();
        assert_eq!(rows.len(), 3);
    }
}

//! Estimate command implementation.

use pglog_core::{LogRelation, PredicateCost, ScanOptions, ScanPlan};
use serde::Serialize;
use std::path::Path;

/// Planner estimates for a spool directory.
#[derive(Debug, Serialize)]
pub struct EstimateResult {
    /// Spool directory.
    pub path: String,
    /// Number of segments found.
    pub files: usize,
    /// Bytes assumed for the relation.
    pub bytes: u64,
    /// Pages.
    pub pages: u64,
    /// Estimated records.
    pub tuples: f64,
    /// Estimated rows after predicates.
    pub rows: f64,
    /// Startup cost.
    pub startup_cost: f64,
    /// Total cost.
    pub total_cost: f64,
    /// Whether fresh statistics were used.
    pub analyzed: bool,
}

/// Runs the estimate command.
pub fn run(
    dir: &Path,
    width: u32,
    selectivity: f64,
    analyze: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = estimate(dir, width, selectivity, analyze)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("Spool directory: {}", result.path);
            println!("Segments:        {}", result.files);
            println!("Bytes:           {}", result.bytes);
            println!("Pages:           {}", result.pages);
            println!("Tuples:          {}", result.tuples);
            println!("Rows:            {}", result.rows);
            println!(
                "Cost:            {:.2}..{:.2}",
                result.startup_cost, result.total_cost
            );
            if result.analyzed {
                println!("(using fresh statistics)");
            }
        }
    }

    Ok(())
}

fn estimate(
    dir: &Path,
    width: u32,
    selectivity: f64,
    analyze: bool,
) -> Result<EstimateResult, Box<dyn std::error::Error>> {
    let mut relation = LogRelation::new(ScanOptions::new(dir));
    if analyze {
        relation.analyze()?;
    }

    let plan: ScanPlan = relation.plan(width, selectivity, PredicateCost::default())?;
    Ok(EstimateResult {
        path: dir.display().to_string(),
        files: plan.files.len(),
        bytes: plan.bytes,
        pages: plan.pages,
        tuples: plan.tuples,
        rows: plan.rows,
        startup_cost: plan.startup_cost,
        total_cost: plan.total_cost,
        analyzed: analyze,
    })
}

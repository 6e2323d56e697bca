//! Analyze command implementation.

use pglog_core::{analyze, CostParams, RelationStats, ScanOptions};
use serde::Serialize;
use std::path::Path;

/// Statistics gathered by a full scan.
#[derive(Debug, Serialize)]
pub struct AnalyzeResult {
    /// Spool directory.
    pub path: String,
    /// Pages covered by the segments.
    pub pages: u64,
    /// Records found.
    pub tuples: u64,
}

/// Runs the analyze command.
pub fn run(dir: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let stats: RelationStats = analyze(&ScanOptions::new(dir), &CostParams::default())?;
    let result = AnalyzeResult {
        path: dir.display().to_string(),
        pages: stats.pages,
        tuples: stats.tuples as u64,
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("Spool directory: {}", result.path);
            println!("Pages:           {}", result.pages);
            println!("Records:         {}", result.tuples);
        }
    }

    Ok(())
}

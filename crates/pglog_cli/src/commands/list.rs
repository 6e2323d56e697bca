//! List command implementation.

use pglog_core::{FileCatalog, ScanOptions};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// One discovered segment.
#[derive(Debug, Serialize)]
pub struct SegmentInfo {
    /// Segment path.
    pub path: String,
    /// Size in bytes, if the file could be stat'ed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Runs the list command.
pub fn run(
    dir: &Path,
    suffix: &str,
    max_files: usize,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let segments = collect(dir, suffix, max_files)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&segments)?);
        }
        _ => {
            if segments.is_empty() {
                println!("No segments found in {}", dir.display());
            }
            for segment in &segments {
                match segment.size {
                    Some(size) => println!("{:>12}  {}", size, segment.path),
                    None => println!("{:>12}  {}", "?", segment.path),
                }
            }
        }
    }

    Ok(())
}

fn collect(
    dir: &Path,
    suffix: &str,
    max_files: usize,
) -> Result<Vec<SegmentInfo>, Box<dyn std::error::Error>> {
    let options = ScanOptions::new(dir).suffix(suffix).max_files(max_files);
    let files = FileCatalog::new(&options).list()?;

    Ok(files
        .into_iter()
        .map(|path| SegmentInfo {
            size: fs::metadata(&path).ok().map(|meta| meta.len()),
            path: path.display().to_string(),
        })
        .collect())
}

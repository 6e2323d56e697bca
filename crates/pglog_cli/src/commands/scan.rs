//! Scan command implementation.

use pglog_core::scan::COLUMNS;
use pglog_core::{ColumnSelection, LogRow, ScanCursor, ScanOptions, Severity, Value};
use serde_json::{Map, Value as JsonValue};
use std::path::Path;

/// Runs the scan command.
pub fn run(
    dir: &Path,
    limit: Option<usize>,
    min_severity: Option<&str>,
    columns: &[String],
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let threshold = min_severity.map(Severity::parse).transpose()?;
    let projection = if columns.is_empty() {
        None
    } else {
        ColumnSelection::from_needed(columns, false)?
    };
    let printed: Vec<String> = match &projection {
        Some(selection) => selection.columns().to_vec(),
        None if columns.is_empty() => COLUMNS.iter().map(|(name, _)| (*name).to_string()).collect(),
        None => columns.to_vec(),
    };

    let mut cursor = ScanCursor::new(ScanOptions::new(dir).projection(projection));
    cursor.open()?;

    let max_rows = limit.unwrap_or(usize::MAX);
    let mut shown = 0;
    let mut json_rows = Vec::new();

    while shown < max_rows {
        let row = match cursor.next_row() {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(e) => {
                cursor.close();
                return Err(e.into());
            }
        };
        if !passes(&row, threshold) {
            continue;
        }
        shown += 1;

        match format {
            "json" => json_rows.push(JsonValue::Object(to_json(&row, &printed))),
            _ => println!("{}", to_text(&row, &printed)),
        }
    }
    cursor.close();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&json_rows)?);
    }

    Ok(())
}

/// Severity filter on the rendered severity name.
fn passes(row: &LogRow, threshold: Option<Severity>) -> bool {
    let Some(threshold) = threshold else {
        return true;
    };
    row.severity()
        .and_then(|name| Severity::parse(name).ok())
        .is_some_and(|severity| severity.is_log_output(threshold))
}

fn to_text(row: &LogRow, columns: &[String]) -> String {
    columns
        .iter()
        .filter_map(|column| row.get(column))
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

fn to_json(row: &LogRow, columns: &[String]) -> Map<String, JsonValue> {
    columns
        .iter()
        .filter_map(|column| row.get(column).map(|value| (column, value)))
        .map(|(column, value)| {
            let json = match value {
                Value::Null => JsonValue::Null,
                Value::Integer(n) => JsonValue::from(*n),
                Value::Text(_) | Value::Timestamp(_) => JsonValue::from(value.to_string()),
            };
            (column.clone(), json)
        })
        .collect()
}

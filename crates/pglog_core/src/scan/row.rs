//! The row shape of the log relation.

use crate::error::{CoreError, CoreResult};
use crate::event::Timestamp;
use crate::format::RECORD_FIELD_COUNT;
use crate::record::Cell;
use chrono::DateTime;
use std::fmt;

/// Parses both the millisecond log time and the whole-second start time.
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %:z";

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Free text.
    Text,
    /// Whole number.
    Integer,
    /// Timestamp with time zone.
    Timestamp,
}

impl ColumnType {
    /// SQL-ish name of the type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "bigint",
            Self::Timestamp => "timestamptz",
        }
    }
}

/// Columns of the log relation, in record order.
pub const COLUMNS: [(&str, ColumnType); RECORD_FIELD_COUNT] = [
    ("log_time", ColumnType::Timestamp),
    ("user_name", ColumnType::Text),
    ("database_name", ColumnType::Text),
    ("process_id", ColumnType::Integer),
    ("connection_from", ColumnType::Text),
    ("session_id", ColumnType::Text),
    ("session_line_num", ColumnType::Integer),
    ("command_tag", ColumnType::Text),
    ("session_start_time", ColumnType::Timestamp),
    ("virtual_transaction_id", ColumnType::Text),
    ("transaction_id", ColumnType::Integer),
    ("error_severity", ColumnType::Text),
    ("sql_state_code", ColumnType::Text),
    ("message", ColumnType::Text),
    ("detail", ColumnType::Text),
    ("hint", ColumnType::Text),
    ("internal_query", ColumnType::Text),
    ("internal_query_pos", ColumnType::Integer),
    ("context", ColumnType::Text),
    ("query", ColumnType::Text),
    ("query_pos", ColumnType::Integer),
    ("location", ColumnType::Text),
    ("application_name", ColumnType::Text),
];

fn column_index(name: &str) -> Option<usize> {
    COLUMNS.iter().position(|(column, _)| *column == name)
}

/// One decoded cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Empty cell.
    Null,
    /// Text column.
    Text(String),
    /// Integer column.
    Integer(i64),
    /// Timestamp column.
    Timestamp(Timestamp),
}

impl Value {
    /// Returns `true` for an empty cell.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The number, if this is an integer value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    fn decode(cell: Cell, column: &str, ty: ColumnType) -> Result<Self, String> {
        let Some(text) = cell else {
            return Ok(Self::Null);
        };
        match ty {
            ColumnType::Text => Ok(Self::Text(text)),
            ColumnType::Integer => text
                .parse()
                .map(Self::Integer)
                .map_err(|_| format!("invalid integer \"{text}\" in column {column}")),
            ColumnType::Timestamp => DateTime::parse_from_str(&text, TIMESTAMP_PARSE_FORMAT)
                .map(Self::Timestamp)
                .map_err(|e| format!("invalid timestamp \"{text}\" in column {column}: {e}")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.3f %:z")),
        }
    }
}

/// One record decoded into every declared column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    values: Vec<Value>,
}

impl LogRow {
    /// Decodes a record's cells.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the record has the wrong
    /// number of cells or a typed cell does not parse.
    pub fn decode(cells: Vec<Cell>) -> Result<Self, String> {
        if cells.len() != COLUMNS.len() {
            return Err(format!(
                "expected {} fields, found {}",
                COLUMNS.len(),
                cells.len()
            ));
        }

        let values = cells
            .into_iter()
            .zip(COLUMNS)
            .map(|(cell, (column, ty))| Value::decode(cell, column, ty))
            .collect::<Result<_, _>>()?;
        Ok(Self { values })
    }

    /// Values in column order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the row, returning its values.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        column_index(column).and_then(|index| self.values.get(index))
    }

    /// Severity name of the event.
    #[must_use]
    pub fn severity(&self) -> Option<&str> {
        self.get("error_severity").and_then(Value::as_text)
    }

    /// Primary message of the event.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.get("message").and_then(Value::as_text)
    }

    /// Process that reported the event.
    #[must_use]
    pub fn process_id(&self) -> Option<i64> {
        self.get("process_id").and_then(Value::as_integer)
    }

    /// When the event was logged.
    #[must_use]
    pub fn log_time(&self) -> Option<&Timestamp> {
        match self.get("log_time") {
            Some(Value::Timestamp(ts)) => Some(ts),
            _ => None,
        }
    }
}

/// Columns a query actually needs.
///
/// This is a hint only: rows are always decoded in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    columns: Vec<String>,
}

impl ColumnSelection {
    /// Builds a selection from the columns referenced by a query.
    ///
    /// Returns `None` when the whole row is referenced or when every
    /// column is needed, since restricting would gain nothing. An empty
    /// `needed` (a `count(*)`, say) is a valid, empty selection.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownColumn`] for names outside [`COLUMNS`].
    pub fn from_needed<S: AsRef<str>>(
        needed: &[S],
        whole_row: bool,
    ) -> CoreResult<Option<Self>> {
        let mut columns: Vec<String> = Vec::with_capacity(needed.len());
        for name in needed {
            let name = name.as_ref();
            if column_index(name).is_none() {
                return Err(CoreError::UnknownColumn {
                    name: name.to_string(),
                });
            }
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }

        if whole_row || columns.len() == COLUMNS.len() {
            return Ok(None);
        }
        Ok(Some(Self { columns }))
    }

    /// Selected column names, in the order first referenced.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns `true` if `column` is selected.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

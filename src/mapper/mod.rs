//! Result row mapping.
//!
//! Zips warehouse rows with their column names and reads typed records out of
//! them. Reads never fail: a missing or malformed cell becomes the field's zero
//! value. A result without column descriptors maps to no records at all.

mod records;

pub use records::{ErrorFrequency, ErrorLogRecord, ErrorPattern, ErrorSearchResult, SeveritySummary};

use serde_json::Value;
use tracing::warn;

use crate::error::LogSearchError;
use crate::warehouse::{Row, StatementResult};

/// A record that can be read from one named row.
pub trait FromRow: Sized {
    fn from_row(row: &RowView<'_>) -> Self;
}

/// One row viewed through its column names.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    columns: &'a [String],
    row: &'a Row,
}

impl<'a> RowView<'a> {
    pub fn new(columns: &'a [String], row: &'a Row) -> Self {
        Self { columns, row }
    }

    /// Raw cell for `column`; `None` if the column is absent or the row is short.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.row.get(index)
    }

    /// Cell as text; null and missing cells read as the empty string.
    pub fn text(&self, column: &str) -> String {
        match self.get(column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Cell as an integer; anything unparseable reads as zero.
    pub fn integer(&self, column: &str) -> i64 {
        match self.get(column) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(float_to_int))
                .unwrap_or(0),
            Some(Value::String(s)) => parse_integer(s),
            Some(Value::Bool(b)) => i64::from(*b),
            _ => 0,
        }
    }

    /// Cell as a list of strings.
    ///
    /// Accepts a JSON array or a string holding one (arrays arrive serialized
    /// in `JSON_ARRAY` results). Anything else reads as an empty list.
    pub fn text_list(&self, column: &str) -> Vec<String> {
        match self.get(column) {
            Some(Value::Array(items)) => items.iter().filter_map(list_item).collect(),
            Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Array(items)) => items.iter().filter_map(list_item).collect(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}

fn list_item(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn parse_integer(text: &str) -> i64 {
    let text = text.trim();
    text.parse::<i64>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().map(float_to_int))
        .unwrap_or(0)
}

fn float_to_int(value: f64) -> i64 {
    if value.is_finite() {
        value.trunc() as i64
    } else {
        0
    }
}

/// Maps every row of `result` to `T`.
///
/// Returns an empty list when the result carries no column names, since
/// positional values cannot be matched to fields without them.
pub fn map_rows<T: FromRow>(result: &StatementResult) -> Vec<T> {
    let Some(columns) = result.columns.as_deref() else {
        if !result.rows.is_empty() {
            let err = LogSearchError::mapping(format!(
                "{} row(s) arrived without column metadata",
                result.rows.len()
            ));
            warn!(error = %err, "Discarding rows; returning empty result");
        }
        return Vec::new();
    };

    result
        .rows
        .iter()
        .map(|row| T::from_row(&RowView::new(columns, row)))
        .collect()
}

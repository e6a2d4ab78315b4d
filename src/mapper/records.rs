//! Typed records returned by the tools.

use serde::{Deserialize, Serialize};

use super::{FromRow, RowView};

/// One row of `error_logs_parsed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLogRecord {
    pub timestamp: String,
    pub error_code: String,
    pub file_path: String,
    pub severity: String,
    pub message: String,
    pub source_file: String,
}

impl FromRow for ErrorLogRecord {
    fn from_row(row: &RowView<'_>) -> Self {
        Self {
            timestamp: row.text("timestamp"),
            error_code: row.text("error_code"),
            file_path: row.text("file_path"),
            severity: row.text("severity"),
            message: row.text("message"),
            source_file: row.text("source_file"),
        }
    }
}

/// Search results plus a readable echo of the filters applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSearchResult {
    pub total_found: usize,
    pub results: Vec<ErrorLogRecord>,
    pub query: String,
}

impl ErrorSearchResult {
    pub fn new(results: Vec<ErrorLogRecord>, query: impl Into<String>) -> Self {
        Self {
            total_found: results.len(),
            results,
            query: query.into(),
        }
    }
}

/// Occurrence count per error code and severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorFrequency {
    pub error_code: String,
    pub severity: String,
    pub count: i64,
}

impl FromRow for ErrorFrequency {
    fn from_row(row: &RowView<'_>) -> Self {
        Self {
            error_code: row.text("error_code"),
            severity: row.text("severity"),
            count: row.integer("count"),
        }
    }
}

/// Totals per severity level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveritySummary {
    pub severity: String,
    pub error_count: i64,
    pub unique_codes: i64,
}

impl FromRow for SeveritySummary {
    fn from_row(row: &RowView<'_>) -> Self {
        Self {
            severity: row.text("severity"),
            error_count: row.integer("error_count"),
            unique_codes: row.integer("unique_codes"),
        }
    }
}

/// A normalized message pattern from the `error_patterns` view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPattern {
    pub error_code: String,
    pub severity: String,
    pub pattern: String,
    pub pattern_count: i64,
    pub example_messages: Vec<String>,
}

impl FromRow for ErrorPattern {
    fn from_row(row: &RowView<'_>) -> Self {
        Self {
            error_code: row.text("error_code"),
            severity: row.text("severity"),
            pattern: row.text("pattern"),
            pattern_count: row.integer("pattern_count"),
            example_messages: row.text_list("example_messages"),
        }
    }
}

//! SQL text construction, one function per tool shape.
//!
//! Every caller-supplied string goes through [`sanitize`] before it is
//! embedded, and catalog/schema go through [`sanitize_identifier`]. Limits
//! are clamped before they reach the SQL text.

use crate::config::ConnectionConfig;
use crate::error::{LogSearchError, Result};
use crate::sanitize::{sanitize, sanitize_identifier};

use super::{
    defaults, QuerySpec, ERROR_LOGS_TABLE, ERROR_PATTERNS_VIEW, PATTERN_ROW_CAP, TIME_RANGE_ROW_CAP,
};

/// Columns returned by every log-record query, in mapping order.
const LOG_COLUMNS: &str = "timestamp, error_code, file_path, severity, message, source_file";

/// Builds SQL against the tables of one resolved connection.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
    config: &'a ConnectionConfig,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(config: &'a ConnectionConfig) -> Self {
        Self { config }
    }

    /// Log records matching any combination of code, severity, path and message.
    pub fn search_by_criteria(&self, spec: &QuerySpec) -> Result<String> {
        let mut predicates = Predicates::default();
        predicates.equals("error_code", spec.error_code.as_deref())?;
        predicates.equals("severity", spec.severity.as_deref())?;
        predicates.contains("file_path", spec.file_path.as_deref())?;
        predicates.contains("message", spec.message_contains.as_deref())?;

        let table = self.table(ERROR_LOGS_TABLE)?;
        Ok(format!(
            "SELECT {LOG_COLUMNS} FROM {table}{} ORDER BY timestamp DESC LIMIT {}",
            predicates.where_clause(),
            spec.effective_limit(defaults::SEARCH_LIMIT)
        ))
    }

    /// Occurrence counts per error code, optionally for one severity.
    pub fn frequency_by_severity(&self, spec: &QuerySpec) -> Result<String> {
        let mut predicates = Predicates::default();
        predicates.equals("severity", spec.severity.as_deref())?;

        let table = self.table(ERROR_LOGS_TABLE)?;
        Ok(format!(
            "SELECT error_code, severity, COUNT(*) AS count FROM {table}{} \
             GROUP BY error_code, severity ORDER BY count DESC LIMIT {}",
            predicates.where_clause(),
            spec.effective_limit(defaults::FREQUENCY_LIMIT)
        ))
    }

    /// Error and distinct-code counts per severity.
    pub fn severity_summary(&self) -> Result<String> {
        let table = self.table(ERROR_LOGS_TABLE)?;
        Ok(format!(
            "SELECT severity, COUNT(*) AS error_count, COUNT(DISTINCT error_code) AS unique_codes \
             FROM {table} GROUP BY severity ORDER BY error_count DESC"
        ))
    }

    /// Log records of exactly one file path.
    pub fn errors_by_file(&self, spec: &QuerySpec) -> Result<String> {
        let path = spec
            .file_path
            .as_deref()
            .ok_or_else(|| LogSearchError::invalid_input("file_path is required"))?;
        let mut predicates = Predicates::default();
        predicates.push(format!("file_path = '{}'", sanitize(path)?));

        let table = self.table(ERROR_LOGS_TABLE)?;
        Ok(format!(
            "SELECT {LOG_COLUMNS} FROM {table}{} ORDER BY timestamp DESC LIMIT {}",
            predicates.where_clause(),
            spec.effective_limit(defaults::FILE_LIMIT)
        ))
    }

    /// Log records whose message contains the given text.
    pub fn search_by_message(&self, spec: &QuerySpec) -> Result<String> {
        let text = spec
            .message_contains
            .as_deref()
            .ok_or_else(|| LogSearchError::invalid_input("query is required"))?;
        let mut predicates = Predicates::default();
        predicates.push(format!("message LIKE '%{}%'", sanitize(text)?));

        let table = self.table(ERROR_LOGS_TABLE)?;
        Ok(format!(
            "SELECT {LOG_COLUMNS} FROM {table}{} ORDER BY timestamp DESC LIMIT {}",
            predicates.where_clause(),
            spec.effective_limit(defaults::MESSAGE_LIMIT)
        ))
    }

    /// Log records from the last `hours_ago` hours, capped at a fixed row count.
    pub fn search_by_time_range(&self, spec: &QuerySpec) -> Result<String> {
        let mut predicates = Predicates::default();
        predicates.push(format!(
            "timestamp >= current_timestamp() - INTERVAL {} HOURS",
            spec.effective_hours()
        ));
        predicates.equals("severity", spec.severity.as_deref())?;

        let table = self.table(ERROR_LOGS_TABLE)?;
        Ok(format!(
            "SELECT {LOG_COLUMNS} FROM {table}{} ORDER BY timestamp DESC LIMIT {TIME_RANGE_ROW_CAP}",
            predicates.where_clause()
        ))
    }

    /// Message patterns from the precomputed `error_patterns` view.
    pub fn error_patterns(&self, spec: &QuerySpec) -> Result<String> {
        let mut predicates = Predicates::default();
        predicates.equals("error_code", spec.error_code.as_deref())?;
        predicates.equals("severity", spec.severity.as_deref())?;

        let view = self.table(ERROR_PATTERNS_VIEW)?;
        Ok(format!(
            "SELECT error_code, severity, pattern, pattern_count, example_messages FROM {view}{} \
             ORDER BY pattern_count DESC LIMIT {PATTERN_ROW_CAP}",
            predicates.where_clause()
        ))
    }

    fn table(&self, name: &str) -> Result<String> {
        sanitize_identifier(&self.config.catalog)?;
        sanitize_identifier(&self.config.schema_name)?;
        Ok(self.config.qualified_table(name))
    }
}

/// `AND`-joined WHERE predicates.
#[derive(Debug, Default)]
struct Predicates(Vec<String>);

impl Predicates {
    /// `column = 'value'` when a non-empty value is given.
    fn equals(&mut self, column: &str, value: Option<&str>) -> Result<()> {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.0.push(format!("{column} = '{}'", sanitize(value)?));
        }
        Ok(())
    }

    /// `column LIKE '%value%'` when a non-empty value is given.
    fn contains(&mut self, column: &str, value: Option<&str>) -> Result<()> {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.0.push(format!("{column} LIKE '%{}%'", sanitize(value)?));
        }
        Ok(())
    }

    fn push(&mut self, predicate: String) {
        self.0.push(predicate);
    }

    fn where_clause(&self) -> String {
        if self.0.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.0.join(" AND "))
        }
    }
}

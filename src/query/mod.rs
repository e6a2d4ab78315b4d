//! Query shapes and SQL construction for the error-log tools.
//!
//! A [`QuerySpec`] carries the optional filters of one tool call;
//! [`QueryBuilder`] turns it into SQL text for the resolved connection.

pub mod builder;

pub use builder::QueryBuilder;

/// Parsed error-log table produced by the ETL notebook.
pub const ERROR_LOGS_TABLE: &str = "error_logs_parsed";

/// Precomputed view of message patterns per error code.
pub const ERROR_PATTERNS_VIEW: &str = "error_patterns";

/// Lower bound for every row limit.
pub const MIN_LIMIT: i64 = 1;

/// Upper bound for caller-supplied row limits.
pub const MAX_LIMIT: i64 = 100;

/// Upper bound for `hours_ago` (one year).
pub const MAX_HOURS_AGO: i64 = 8760;

/// Fixed row cap of the time-range search.
pub const TIME_RANGE_ROW_CAP: i64 = 50;

/// Fixed row cap of the pattern analysis.
pub const PATTERN_ROW_CAP: i64 = 50;

/// Default limits per tool shape.
pub mod defaults {
    pub const SEARCH_LIMIT: i64 = 20;
    pub const FREQUENCY_LIMIT: i64 = 10;
    pub const FILE_LIMIT: i64 = 50;
    pub const MESSAGE_LIMIT: i64 = 50;
    pub const HOURS_AGO: i64 = 24;
}

/// Clamps a row limit into `[1, 100]`.
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(MIN_LIMIT, MAX_LIMIT)
}

/// Clamps a look-back window into `[1, 8760]` hours.
pub fn clamp_hours(hours: i64) -> i64 {
    hours.clamp(MIN_LIMIT, MAX_HOURS_AGO)
}

/// Filters of one tool call. Absent fields add no predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySpec {
    pub error_code: Option<String>,
    pub severity: Option<String>,
    /// Substring for criteria search, exact path for per-file search.
    pub file_path: Option<String>,
    pub message_contains: Option<String>,
    pub hours_ago: Option<i64>,
    pub limit: Option<i64>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error_code(mut self, value: impl Into<String>) -> Self {
        self.error_code = Some(value.into());
        self
    }

    pub fn severity(mut self, value: impl Into<String>) -> Self {
        self.severity = Some(value.into());
        self
    }

    pub fn file_path(mut self, value: impl Into<String>) -> Self {
        self.file_path = Some(value.into());
        self
    }

    pub fn message_contains(mut self, value: impl Into<String>) -> Self {
        self.message_contains = Some(value.into());
        self
    }

    pub fn hours_ago(mut self, hours: i64) -> Self {
        self.hours_ago = Some(hours);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Effective limit: the caller's value (or `default`) clamped to `[1, 100]`.
    pub fn effective_limit(&self, default: i64) -> i64 {
        clamp_limit(self.limit.unwrap_or(default))
    }

    /// Effective look-back window clamped to `[1, 8760]` hours.
    pub fn effective_hours(&self) -> i64 {
        clamp_hours(self.hours_ago.unwrap_or(defaults::HOURS_AGO))
    }
}

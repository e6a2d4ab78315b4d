//! Statement Execution API payloads and the runner's result type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Lifecycle state of a submitted statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementState {
    /// Accepted but not started (`PENDING` on the wire).
    #[serde(alias = "PENDING")]
    Queued,
    Running,
    Succeeded,
    Failed,
    Canceled,
    /// Result was already fetched and released.
    Closed,
    /// Any state this client does not know about.
    #[serde(other)]
    Unknown,
}

impl StatementState {
    /// Returns true once the warehouse will not change the state any more.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Queued | Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
            Self::Closed => "CLOSED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque statement id returned on submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementHandle(String);

impl StatementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of both `POST /statements` and `GET /statements/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementResponse {
    #[serde(default)]
    pub statement_id: Option<String>,
    #[serde(default)]
    pub status: Option<StatementStatus>,
    #[serde(default)]
    pub manifest: Option<ResultManifest>,
    #[serde(default)]
    pub result: Option<ResultData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementStatus {
    pub state: StatementState,
    #[serde(default)]
    pub error: Option<ServiceError>,
}

/// Error detail attached to a FAILED statement or a non-2xx reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceError {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultManifest {
    #[serde(default)]
    pub schema: Option<ResultSchema>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSchema {
    #[serde(default)]
    pub columns: Option<Vec<ColumnInfo>>,
}

/// Column descriptor from the result manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultData {
    #[serde(default)]
    pub data_array: Option<Vec<Row>>,
}

/// One result row; cells are JSON values (strings or null in `JSON_ARRAY` format).
pub type Row = Vec<Value>;

impl StatementResponse {
    /// Builds a bare response in the given state.
    pub fn with_state(statement_id: impl Into<String>, state: StatementState) -> Self {
        Self {
            statement_id: Some(statement_id.into()),
            status: Some(StatementStatus { state, error: None }),
            manifest: None,
            result: None,
        }
    }

    /// Attaches column descriptors and inline rows.
    pub fn with_data(mut self, columns: &[&str], rows: Vec<Row>) -> Self {
        self.manifest = Some(ResultManifest {
            schema: Some(ResultSchema {
                columns: Some(
                    columns
                        .iter()
                        .enumerate()
                        .map(|(i, name)| ColumnInfo {
                            name: name.to_string(),
                            type_name: None,
                            position: Some(i as i64),
                        })
                        .collect(),
                ),
            }),
        });
        self.result = Some(ResultData {
            data_array: Some(rows),
        });
        self
    }

    pub fn state(&self) -> Option<StatementState> {
        self.status.as_ref().map(|s| s.state)
    }

    pub fn handle(&self) -> Option<StatementHandle> {
        self.statement_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(StatementHandle::new)
    }

    /// Error message attached to the status, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.error.as_ref())
            .and_then(|e| e.message.as_deref())
    }

    /// Ordered column names, or `None` when the manifest carries no columns.
    pub fn column_names(&self) -> Option<Vec<String>> {
        self.manifest
            .as_ref()
            .and_then(|m| m.schema.as_ref())
            .and_then(|s| s.columns.as_ref())
            .filter(|columns| !columns.is_empty())
            .map(|columns| columns.iter().map(|c| c.name.clone()).collect())
    }
}

/// What a statement run produced: final state, column names and rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementResult {
    /// Last observed state; `None` when nothing was submitted.
    pub state: Option<StatementState>,
    /// Ordered column names; `None` when the warehouse sent no descriptors.
    pub columns: Option<Vec<String>>,
    pub rows: Vec<Row>,
}

impl StatementResult {
    /// A result with no state, columns or rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A row-less result that records where the statement stopped.
    pub fn stopped_at(state: StatementState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    /// Takes columns and rows out of a terminal response.
    pub fn from_response(response: StatementResponse) -> Self {
        let columns = response.column_names();
        Self {
            state: response.state(),
            columns,
            rows: response
                .result
                .and_then(|r| r.data_array)
                .unwrap_or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

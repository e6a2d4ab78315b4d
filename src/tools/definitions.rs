//! Tool schemas and argument types.
//!
//! The JSON schemas here are what a calling agent sees in `tools/list`; the
//! input structs are what `tools/call` arguments deserialize into.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::{DEFAULT_CATALOG, DEFAULT_SCHEMA};
use crate::error::{LogSearchError, Result};
use crate::query::{defaults, QuerySpec, MAX_HOURS_AGO, MAX_LIMIT, MIN_LIMIT};

/// Tool names as registered with the client.
pub mod names {
    pub const CONFIGURE_DATABRICKS: &str = "configure_databricks";
    pub const SEARCH_ERROR_LOGS: &str = "search_error_logs";
    pub const GET_ERROR_FREQUENCY: &str = "get_error_frequency";
    pub const GET_SEVERITY_SUMMARY: &str = "get_severity_summary";
    pub const GET_FILE_ERRORS: &str = "get_file_errors";
    pub const SEARCH_BY_MESSAGE: &str = "search_by_message";
    pub const SEARCH_BY_TIME_RANGE: &str = "search_by_time_range";
    pub const ANALYZE_ERROR_PATTERNS: &str = "analyze_error_patterns";
}

/// Tool definition as listed by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDefinition {
    fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// Arguments of `configure_databricks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigureInput {
    pub host: String,
    pub token: String,
    pub warehouse_id: String,
    #[serde(default)]
    pub catalog: Option<String>,
    #[serde(default, alias = "schema")]
    pub schema_name: Option<String>,
}

/// Arguments of `search_error_logs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchErrorLogsInput {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub message_contains: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
}

impl SearchErrorLogsInput {
    pub fn to_spec(&self) -> QuerySpec {
        QuerySpec {
            error_code: self.error_code.clone(),
            severity: self.severity.clone(),
            file_path: self.file_path.clone(),
            message_contains: self.message_contains.clone(),
            hours_ago: None,
            limit: self.limit,
        }
    }

    /// `error_code=…, severity=…, file=…, message=…`
    pub fn describe(&self) -> String {
        format!(
            "error_code={}, severity={}, file={}, message={}",
            or_none(&self.error_code),
            or_none(&self.severity),
            or_none(&self.file_path),
            or_none(&self.message_contains)
        )
    }
}

/// Arguments of `get_error_frequency`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorFrequencyInput {
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
}

impl ErrorFrequencyInput {
    pub fn to_spec(&self) -> QuerySpec {
        QuerySpec {
            severity: self.severity.clone(),
            limit: self.limit,
            ..QuerySpec::default()
        }
    }
}

/// Arguments of `get_file_errors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileErrorsInput {
    pub file_path: String,
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
}

impl FileErrorsInput {
    pub fn to_spec(&self) -> QuerySpec {
        QuerySpec {
            file_path: Some(self.file_path.clone()),
            limit: self.limit,
            ..QuerySpec::default()
        }
    }

    pub fn describe(&self) -> String {
        format!("Errors in file: {}", self.file_path)
    }
}

/// Arguments of `search_by_message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSearchInput {
    pub query: String,
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
}

impl MessageSearchInput {
    pub fn to_spec(&self) -> QuerySpec {
        QuerySpec {
            message_contains: Some(self.query.clone()),
            limit: self.limit,
            ..QuerySpec::default()
        }
    }

    pub fn describe(&self) -> String {
        format!("Message contains: {}", self.query)
    }
}

/// Arguments of `search_by_time_range`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeRangeInput {
    #[serde(default, deserialize_with = "lenient_int")]
    pub hours_ago: Option<i64>,
    #[serde(default)]
    pub severity: Option<String>,
}

impl TimeRangeInput {
    pub fn to_spec(&self) -> QuerySpec {
        QuerySpec {
            severity: self.severity.clone(),
            hours_ago: self.hours_ago,
            ..QuerySpec::default()
        }
    }

    /// Echoes the clamped window, not the raw argument.
    pub fn describe(&self) -> String {
        format!(
            "Errors in last {} hours (severity={})",
            self.to_spec().effective_hours(),
            or_none(&self.severity)
        )
    }
}

/// Arguments of `analyze_error_patterns`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternInput {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
}

impl PatternInput {
    pub fn to_spec(&self) -> QuerySpec {
        QuerySpec {
            error_code: self.error_code.clone(),
            severity: self.severity.clone(),
            ..QuerySpec::default()
        }
    }
}

fn or_none(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("None")
}

/// Accepts integers, integral floats and numeric strings; `null` reads as absent.
fn lenient_int<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid integer: {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid integer: {s:?}"))),
        Some(other) => Err(de::Error::custom(format!("expected an integer, got {other}"))),
    }
}

/// Deserializes tool arguments; a missing argument object counts as `{}`.
pub fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| LogSearchError::invalid_input(format!("Invalid arguments for {tool}: {e}")))
}

fn limit_schema(default: i64) -> Value {
    json!({
        "type": "integer",
        "description": format!("Maximum number of results (default: {default}, clamped to {MIN_LIMIT}-{MAX_LIMIT})"),
        "default": default,
        "minimum": MIN_LIMIT,
        "maximum": MAX_LIMIT
    })
}

fn severity_schema(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}

/// Returns every tool the server exposes, in listing order.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            names::CONFIGURE_DATABRICKS,
            "Set Databricks connection details for this session. Use this tool if you cannot \
             pass HTTP headers. The configuration persists for the lifetime of the MCP session.",
            json!({
                "type": "object",
                "properties": {
                    "host": {
                        "type": "string",
                        "description": "Databricks workspace URL (e.g. https://adb-xxx.azuredatabricks.net)"
                    },
                    "token": {
                        "type": "string",
                        "description": "Databricks personal access token"
                    },
                    "warehouse_id": {
                        "type": "string",
                        "description": "SQL warehouse ID"
                    },
                    "catalog": {
                        "type": "string",
                        "description": format!("Unity Catalog name (default: {DEFAULT_CATALOG})"),
                        "default": DEFAULT_CATALOG
                    },
                    "schema_name": {
                        "type": "string",
                        "description": format!("Schema name (default: {DEFAULT_SCHEMA})"),
                        "default": DEFAULT_SCHEMA
                    }
                },
                "required": ["host", "token", "warehouse_id"]
            }),
        ),
        ToolDefinition::new(
            names::SEARCH_ERROR_LOGS,
            "Search for error logs by various criteria.",
            json!({
                "type": "object",
                "properties": {
                    "error_code": {
                        "type": "string",
                        "description": "Filter by error code (e.g., 'CC-1001')"
                    },
                    "severity": severity_schema("Filter by severity ('Warning', 'Error', 'Event')"),
                    "file_path": {
                        "type": "string",
                        "description": "Filter by file path (partial match)"
                    },
                    "message_contains": {
                        "type": "string",
                        "description": "Search for text in error message"
                    },
                    "limit": limit_schema(defaults::SEARCH_LIMIT)
                },
                "required": []
            }),
        ),
        ToolDefinition::new(
            names::GET_ERROR_FREQUENCY,
            "Get most frequently occurring error codes with statistics.",
            json!({
                "type": "object",
                "properties": {
                    "severity": severity_schema("Filter by severity level ('Warning', 'Error', 'Event')"),
                    "limit": limit_schema(defaults::FREQUENCY_LIMIT)
                },
                "required": []
            }),
        ),
        ToolDefinition::new(
            names::GET_SEVERITY_SUMMARY,
            "Get a summary of errors grouped by severity level.",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        ),
        ToolDefinition::new(
            names::GET_FILE_ERRORS,
            "Get all errors from a specific application file.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path to the file (e.g., 'app/src/main.py')"
                    },
                    "limit": limit_schema(defaults::FILE_LIMIT)
                },
                "required": ["file_path"]
            }),
        ),
        ToolDefinition::new(
            names::SEARCH_BY_MESSAGE,
            "Full-text search for errors by message content.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Text to search for in error messages (e.g., 'connection timeout')"
                    },
                    "limit": limit_schema(defaults::MESSAGE_LIMIT)
                },
                "required": ["query"]
            }),
        ),
        ToolDefinition::new(
            names::SEARCH_BY_TIME_RANGE,
            "Search errors within a specific time range.",
            json!({
                "type": "object",
                "properties": {
                    "hours_ago": {
                        "type": "integer",
                        "description": format!("How many hours back to search (default: {}, clamped to 1-{MAX_HOURS_AGO})", defaults::HOURS_AGO),
                        "default": defaults::HOURS_AGO,
                        "minimum": 1,
                        "maximum": MAX_HOURS_AGO
                    },
                    "severity": severity_schema("Optional severity filter ('Warning', 'Error', 'Event')")
                },
                "required": []
            }),
        ),
        ToolDefinition::new(
            names::ANALYZE_ERROR_PATTERNS,
            "Analyze patterns in error messages to find similar errors.",
            json!({
                "type": "object",
                "properties": {
                    "error_code": {
                        "type": "string",
                        "description": "Filter by error code (optional)"
                    },
                    "severity": severity_schema("Filter by severity level (optional)")
                },
                "required": []
            }),
        ),
    ]
}

//! Configuration management for the error-log MCP server.
//!
//! Handles the Databricks connection record, the partial override layers that
//! feed it (settings file, environment, request headers, sessions) and the
//! server settings loaded from TOML.

use crate::error::{LogSearchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Catalog used when nothing else names one.
pub const DEFAULT_CATALOG: &str = "dbx_1";

/// Schema used when nothing else names one.
pub const DEFAULT_SCHEMA: &str = "default";

/// Environment variables read for the process-wide default connection.
pub mod env {
    pub const HOST: &str = "DATABRICKS_HOST";
    pub const TOKEN: &str = "DATABRICKS_TOKEN";
    pub const WAREHOUSE_ID: &str = "DATABRICKS_WAREHOUSE_ID";
    pub const CATALOG: &str = "DATABRICKS_CATALOG";
    pub const SCHEMA: &str = "DATABRICKS_SCHEMA";
}

/// Effective Databricks connection for one tool call.
///
/// Built once per call by the resolver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Workspace URL, e.g. `https://adb-123.azuredatabricks.net`.
    pub host: String,
    /// Personal access token.
    pub token: String,
    /// SQL warehouse id.
    pub warehouse_id: String,
    /// Unity Catalog name.
    pub catalog: String,
    /// Schema inside the catalog.
    pub schema_name: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            token: String::new(),
            warehouse_id: String::new(),
            catalog: DEFAULT_CATALOG.to_string(),
            schema_name: DEFAULT_SCHEMA.to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Creates a config with the mandatory fields and default catalog/schema.
    pub fn new(
        host: impl Into<String>,
        token: impl Into<String>,
        warehouse_id: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            warehouse_id: warehouse_id.into(),
            ..Default::default()
        }
    }

    /// Sets the catalog.
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = catalog.into();
        self
    }

    /// Sets the schema.
    pub fn with_schema(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = schema_name.into();
        self
    }

    /// Reads the process-wide defaults from `DATABRICKS_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_with(|key| std::env::var(key).ok());
        config
    }

    /// Returns true when host, token and warehouse id are all non-empty.
    pub fn is_usable(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Names of the mandatory fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.host.trim().is_empty() {
            missing.push("host");
        }
        if self.token.trim().is_empty() {
            missing.push("token");
        }
        if self.warehouse_id.trim().is_empty() {
            missing.push("warehouse_id");
        }
        missing
    }

    /// Fully-qualified `catalog.schema.table` name.
    pub fn qualified_table(&self, table: &str) -> String {
        format!("{}.{}.{}", self.catalog, self.schema_name, table)
    }

    /// Applies every present, non-empty field of `overrides` on top of this config.
    pub fn merge(&mut self, overrides: &ConnectionOverrides) {
        fn set(target: &mut String, value: &Option<String>) {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                *target = v.to_string();
            }
        }
        set(&mut self.host, &overrides.host);
        set(&mut self.token, &overrides.token);
        set(&mut self.warehouse_id, &overrides.warehouse_id);
        set(&mut self.catalog, &overrides.catalog);
        set(&mut self.schema_name, &overrides.schema_name);
    }

    /// Applies `DATABRICKS_*` values returned by `lookup` as overrides.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.merge(&ConnectionOverrides {
            host: lookup(env::HOST),
            token: lookup(env::TOKEN),
            warehouse_id: lookup(env::WAREHOUSE_ID),
            catalog: lookup(env::CATALOG),
            schema_name: lookup(env::SCHEMA),
        });
    }

    /// Returns a display-safe string (no token) for logs and tool replies.
    pub fn display_string(&self) -> String {
        let host = if self.host.is_empty() {
            "<unset>"
        } else {
            &self.host
        };
        format!(
            "{}.{} @ {host} (warehouse {})",
            self.catalog, self.schema_name, self.warehouse_id
        )
    }
}

/// A partial connection: each present field overrides the layer below it.
///
/// Used for the `[databricks]` settings section, `x-databricks-*` request
/// headers and stored session configs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(default, alias = "schema", skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
}

impl ConnectionOverrides {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.token.is_none()
            && self.warehouse_id.is_none()
            && self.catalog.is_none()
            && self.schema_name.is_none()
    }
}

impl From<&ConnectionConfig> for ConnectionOverrides {
    fn from(config: &ConnectionConfig) -> Self {
        fn non_empty(value: &str) -> Option<String> {
            (!value.trim().is_empty()).then(|| value.to_string())
        }
        Self {
            host: non_empty(&config.host),
            token: non_empty(&config.token),
            warehouse_id: non_empty(&config.warehouse_id),
            catalog: non_empty(&config.catalog),
            schema_name: non_empty(&config.schema_name),
        }
    }
}

/// How the MCP server talks to its client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transport {
    /// Newline-delimited JSON-RPC on stdin/stdout.
    #[default]
    #[serde(rename = "stdio")]
    Stdio,
    /// JSON-RPC over HTTP POST with a `/health` probe.
    #[serde(rename = "http", alias = "streamable-http")]
    Http,
}

impl Transport {
    /// Returns the transport as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
        }
    }
}

impl FromStr for Transport {
    type Err = LogSearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" | "streamable-http" => Ok(Self::Http),
            other => Err(LogSearchError::config(format!(
                "Unknown transport '{other}'. Expected 'stdio' or 'streamable-http'"
            ))),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Transport and listen address.
    #[serde(default)]
    pub server: ServerSettings,

    /// Statement polling and HTTP client behavior.
    #[serde(default)]
    pub warehouse: WarehouseSettings,

    /// Connection defaults below the environment.
    #[serde(default)]
    pub databricks: ConnectionOverrides,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Server listen settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default)]
    pub transport: Transport,

    #[serde(default = "default_listen_host")]
    pub host: String,

    #[serde(default = "default_listen_port")]
    pub port: u16,
}

fn default_listen_host() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    8000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            host: default_listen_host(),
            port: default_listen_port(),
        }
    }
}

/// Statement polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseSettings {
    /// Delay between status polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on the total time spent polling one statement.
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_max_wait_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for WarehouseSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_wait_secs: default_max_wait_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl WarehouseSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Write logs to this file instead of stderr.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Settings {
    /// Returns the default settings file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dbx-error-logs-mcp")
            .join("config.toml")
    }

    /// Loads settings from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| LogSearchError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses settings from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            LogSearchError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Builds the process-wide default connection.
    ///
    /// Precedence: `DATABRICKS_*` environment > `[databricks]` section > built-ins.
    pub fn default_connection(&self) -> ConnectionConfig {
        self.default_connection_with(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::default_connection`] with an injectable environment.
    pub fn default_connection_with<F>(&self, lookup: F) -> ConnectionConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ConnectionConfig::default();
        config.merge(&self.databricks);
        config.apply_env_with(lookup);
        config
    }
}

//! Shared fixtures for the integration tests.

use std::sync::Arc;
use std::time::Duration;

use dbx_error_logs_mcp::config::ConnectionConfig;
use dbx_error_logs_mcp::mcp::McpServer;
use dbx_error_logs_mcp::resolver::ConfigResolver;
use dbx_error_logs_mcp::runner::StatementRunner;
use dbx_error_logs_mcp::session::SessionConfigStore;
use dbx_error_logs_mcp::tools::ToolDispatcher;
use dbx_error_logs_mcp::warehouse::{Row, WarehouseClient};
use serde_json::json;

/// Columns of `error_logs_parsed`, in query order.
pub const LOG_COLUMNS: [&str; 6] = [
    "timestamp",
    "error_code",
    "file_path",
    "severity",
    "message",
    "source_file",
];

/// A usable default connection.
pub fn default_connection() -> ConnectionConfig {
    ConnectionConfig::new("https://adb-default.example.net", "default-token", "default-wh")
}

/// A dispatcher over `client` with fast polling.
pub fn dispatcher(client: Arc<dyn WarehouseClient>, defaults: ConnectionConfig) -> ToolDispatcher {
    let resolver = ConfigResolver::new(defaults, Arc::new(SessionConfigStore::new()));
    let runner = StatementRunner::new(client)
        .with_poll_interval(Duration::from_millis(1))
        .with_max_wait(Some(Duration::from_secs(5)));
    ToolDispatcher::new(resolver, runner)
}

pub fn server(client: Arc<dyn WarehouseClient>) -> Arc<McpServer> {
    Arc::new(McpServer::new(dispatcher(client, default_connection())))
}

/// One `error_logs_parsed` row.
pub fn log_row(timestamp: &str, code: &str, path: &str, severity: &str, message: &str) -> Row {
    vec![
        json!(timestamp),
        json!(code),
        json!(path),
        json!(severity),
        json!(message),
        json!("app.log"),
    ]
}

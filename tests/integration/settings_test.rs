//! Settings file loading and default-connection layering.

use std::collections::HashMap;
use std::io::Write;

use dbx_error_logs_mcp::config::{Settings, Transport};
use pretty_assertions::assert_eq;
use tempfile::{NamedTempFile, TempDir};

fn write_settings(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_settings_file() {
    let file = write_settings(
        r#"
[server]
transport = "streamable-http"
port = 9100

[warehouse]
poll_interval_ms = 250
max_wait_secs = 10

[databricks]
host = "https://adb-file.example.net"
warehouse_id = "file-wh"
schema = "logs"
"#,
    );

    let settings = Settings::load_from_file(file.path()).unwrap();

    assert_eq!(settings.server.transport, Transport::Http);
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 9100);
    assert_eq!(settings.warehouse.poll_interval_ms, 250);
    assert_eq!(settings.warehouse.request_timeout_secs, 30);
    assert_eq!(settings.databricks.schema_name.as_deref(), Some("logs"));
}

#[test]
fn test_environment_overrides_file_per_field() {
    let file = write_settings(
        r#"
[databricks]
host = "https://adb-file.example.net"
warehouse_id = "file-wh"
catalog = "file_cat"
"#,
    );
    let settings = Settings::load_from_file(file.path()).unwrap();
    let env: HashMap<&str, &str> = [
        ("DATABRICKS_TOKEN", "env-token"),
        ("DATABRICKS_WAREHOUSE_ID", "env-wh"),
    ]
    .into_iter()
    .collect();

    let connection =
        settings.default_connection_with(|key| env.get(key).map(|v| v.to_string()));

    assert_eq!(connection.host, "https://adb-file.example.net");
    assert_eq!(connection.token, "env-token");
    assert_eq!(connection.warehouse_id, "env-wh");
    assert_eq!(connection.catalog, "file_cat");
    assert_eq!(connection.schema_name, "default");
    assert!(connection.is_usable());
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::load_from_file(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.server.transport, Transport::Stdio);
    assert_eq!(settings.server.port, 8000);
    assert_eq!(settings.warehouse.max_wait_secs, 30);

    let connection = settings.default_connection_with(|_| None);
    assert_eq!(connection.catalog, "dbx_1");
    assert!(!connection.is_usable());
}

#[test]
fn test_invalid_file_is_configuration_error() {
    let file = write_settings("[server]\nport = \"not a number\"\n");
    let err = Settings::load_from_file(file.path()).unwrap_err();
    assert_eq!(err.category(), "Configuration Error");
}

//! Live tests against a real Databricks SQL warehouse.
//!
//! Skipped unless DATABRICKS_HOST, DATABRICKS_TOKEN and
//! DATABRICKS_WAREHOUSE_ID are set.

use std::sync::Arc;
use std::time::Duration;

use dbx_error_logs_mcp::config::ConnectionConfig;
use dbx_error_logs_mcp::runner::StatementRunner;
use dbx_error_logs_mcp::session::RequestContext;
use dbx_error_logs_mcp::warehouse::{DatabricksClient, StatementState};

use super::support::dispatcher;

/// Connection from the environment, if it is usable.
fn live_connection() -> Option<ConnectionConfig> {
    let config = ConnectionConfig::from_env();
    config.is_usable().then_some(config)
}

#[tokio::test]
async fn test_live_select_one() {
    let Some(config) = live_connection() else {
        eprintln!("Skipping test: DATABRICKS_* not set");
        return;
    };

    let client = Arc::new(DatabricksClient::new(Duration::from_secs(30)).unwrap());
    let runner = StatementRunner::new(client).with_max_wait(Some(Duration::from_secs(120)));

    let result = runner.execute(&config, "SELECT 1 AS one").await;

    assert_eq!(result.state, Some(StatementState::Succeeded));
    assert_eq!(result.columns, Some(vec!["one".to_string()]));
    assert_eq!(result.row_count(), 1);
}

#[tokio::test]
async fn test_live_severity_summary() {
    let Some(config) = live_connection() else {
        eprintln!("Skipping test: DATABRICKS_* not set");
        return;
    };

    let client = Arc::new(DatabricksClient::with_default_timeout().unwrap());
    let tools = dispatcher(client, config);

    let summary = tools
        .get_severity_summary(&RequestContext::transient())
        .await
        .unwrap();

    for pair in summary.windows(2) {
        assert!(pair[0].error_count >= pair[1].error_count);
    }
}

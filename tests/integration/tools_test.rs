//! Tool pipeline tests: resolver, builder, runner and mapper together.

use std::sync::Arc;

use dbx_error_logs_mcp::config::{ConnectionConfig, ConnectionOverrides};
use dbx_error_logs_mcp::mapper::SeveritySummary;
use dbx_error_logs_mcp::session::{RequestContext, SessionId};
use dbx_error_logs_mcp::warehouse::{FailingWarehouse, ScriptedWarehouse, StatementState};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use super::support::{default_connection, dispatcher, log_row, LOG_COLUMNS};

#[tokio::test]
async fn test_search_by_code_and_severity() {
    let warehouse = Arc::new(ScriptedWarehouse::succeeding(
        &LOG_COLUMNS,
        vec![
            log_row("2024-05-03T09:00:00Z", "CC-1001", "/app/cache.py", "Error", "Cache node down"),
            log_row("2024-05-02T09:00:00Z", "CC-1001", "/app/cache.py", "Error", "Cache node down"),
            log_row("2024-05-01T09:00:00Z", "CC-1001", "/app/api.py", "Error", "Cache read failed"),
        ],
    ));
    let tools = dispatcher(warehouse.clone(), default_connection());

    let value = tools
        .call(
            "search_error_logs",
            json!({"error_code": "CC-1001", "severity": "Error", "limit": 5}),
            &RequestContext::transient(),
        )
        .await
        .unwrap();

    assert_eq!(value["total_found"], 3);
    assert_eq!(
        value["query"],
        "error_code=CC-1001, severity=Error, file=None, message=None"
    );
    let results = value["results"].as_array().unwrap();
    assert!(results
        .iter()
        .all(|r| r["error_code"] == "CC-1001" && r["severity"] == "Error"));
    let timestamps: Vec<&str> = results
        .iter()
        .map(|r| r["timestamp"].as_str().unwrap())
        .collect();
    let mut sorted = timestamps.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(timestamps, sorted);

    assert_eq!(
        warehouse.submitted_sql(),
        vec![
            "SELECT timestamp, error_code, file_path, severity, message, source_file \
             FROM dbx_1.default.error_logs_parsed \
             WHERE error_code = 'CC-1001' AND severity = 'Error' \
             ORDER BY timestamp DESC LIMIT 5"
                .to_string()
        ]
    );
}

#[tokio::test]
async fn test_injection_attempt_fails_before_sql() {
    let warehouse = Arc::new(ScriptedWarehouse::empty());
    let tools = dispatcher(warehouse.clone(), default_connection());

    let err = tools
        .call(
            "search_error_logs",
            json!({"message_contains": "drop table; --"}),
            &RequestContext::transient(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.category(), "Invalid Input");
    assert_eq!(warehouse.submit_count(), 0);
}

#[tokio::test]
async fn test_severity_summary_ordering() {
    let warehouse = Arc::new(ScriptedWarehouse::succeeding(
        &["severity", "error_count", "unique_codes"],
        vec![
            vec![json!("Warning"), json!("10"), json!("4")],
            vec![json!("Error"), json!("5"), json!("3")],
            vec![json!("Event"), json!("2"), json!("1")],
        ],
    ));
    let tools = dispatcher(warehouse.clone(), default_connection());

    let summary = tools
        .get_severity_summary(&RequestContext::transient())
        .await
        .unwrap();

    assert_eq!(
        summary,
        vec![
            SeveritySummary {
                severity: "Warning".to_string(),
                error_count: 10,
                unique_codes: 4
            },
            SeveritySummary {
                severity: "Error".to_string(),
                error_count: 5,
                unique_codes: 3
            },
            SeveritySummary {
                severity: "Event".to_string(),
                error_count: 2,
                unique_codes: 1
            },
        ]
    );
    assert!(warehouse.submitted_sql()[0].ends_with("ORDER BY error_count DESC"));
}

#[tokio::test]
async fn test_limits_are_clamped() {
    let warehouse = Arc::new(ScriptedWarehouse::empty());
    let tools = dispatcher(warehouse.clone(), default_connection());
    let ctx = RequestContext::transient();

    for (limit, expected) in [(json!(-5), 1), (json!(0), 1), (json!(1_000_000), 100), (json!("42"), 42)] {
        tools
            .call("get_error_frequency", json!({ "limit": limit }), &ctx)
            .await
            .unwrap();
        let sql = warehouse.submitted_sql().pop().unwrap();
        assert!(sql.ends_with(&format!("LIMIT {expected}")), "{sql}");
    }

    tools
        .call("search_by_time_range", json!({"hours_ago": 100_000}), &ctx)
        .await
        .unwrap();
    let sql = warehouse.submitted_sql().pop().unwrap();
    assert!(sql.contains("INTERVAL 8760 HOURS"), "{sql}");
}

#[tokio::test]
async fn test_header_beats_session_beats_default() {
    let warehouse = Arc::new(ScriptedWarehouse::empty());
    let tools = dispatcher(warehouse.clone(), default_connection().with_catalog("default_cat"));
    let session = SessionId::new("session-a");
    let ctx = RequestContext::for_session(session.clone());

    tools
        .call(
            "configure_databricks",
            json!({
                "host": "https://adb-session.example.net",
                "token": "session-token",
                "warehouse_id": "session-wh",
                "catalog": "session_cat"
            }),
            &ctx,
        )
        .await
        .unwrap();

    let resolved = tools.resolver().resolve(&ctx);
    assert_eq!(resolved.catalog, "session_cat");
    assert_eq!(resolved.host, "https://adb-session.example.net");

    let with_header = ctx.clone().with_headers(ConnectionOverrides {
        catalog: Some("header_cat".to_string()),
        ..Default::default()
    });
    let resolved = tools.resolver().resolve(&with_header);
    assert_eq!(resolved.catalog, "header_cat");
    assert_eq!(resolved.token, "session-token");

    let other = RequestContext::for_session(SessionId::new("session-b"));
    assert_eq!(tools.resolver().resolve(&other).catalog, "default_cat");

    tools
        .call("get_severity_summary", Value::Null, &with_header)
        .await
        .unwrap();
    assert!(warehouse.submitted_sql()[0].contains("FROM header_cat.default.error_logs_parsed"));
}

#[tokio::test]
async fn test_reconfigure_overwrites_session() {
    let tools = dispatcher(Arc::new(ScriptedWarehouse::empty()), default_connection());
    let ctx = RequestContext::for_session(SessionId::new("s"));

    for wh in ["first", "second"] {
        tools
            .call(
                "configure_databricks",
                json!({"host": "h", "token": "t", "warehouse_id": wh}),
                &ctx,
            )
            .await
            .unwrap();
    }

    assert_eq!(tools.resolver().sessions().len(), 1);
    assert_eq!(tools.resolver().resolve(&ctx).warehouse_id, "second");
}

#[tokio::test]
async fn test_unconfigured_returns_empty_without_rpc() {
    let warehouse = Arc::new(ScriptedWarehouse::empty());
    let tools = dispatcher(warehouse.clone(), ConnectionConfig::default());

    let value = tools
        .call(
            "get_file_errors",
            json!({"file_path": "/app/main.py"}),
            &RequestContext::transient(),
        )
        .await
        .unwrap();

    assert_eq!(
        value,
        json!({"total_found": 0, "results": [], "query": "Errors in file: /app/main.py"})
    );
    assert_eq!(warehouse.submit_count(), 0);
}

#[tokio::test]
async fn test_polls_through_queued_and_running() {
    let warehouse = Arc::new(
        ScriptedWarehouse::succeeding(
            &LOG_COLUMNS,
            vec![log_row(
                "2024-05-01T00:00:00Z",
                "DB-2002",
                "/app/db.py",
                "Warning",
                "connection timeout",
            )],
        )
        .with_states([
            StatementState::Queued,
            StatementState::Running,
            StatementState::Running,
            StatementState::Succeeded,
        ]),
    );
    let tools = dispatcher(warehouse.clone(), default_connection());

    let value = tools
        .call(
            "search_by_message",
            json!({"query": "connection timeout"}),
            &RequestContext::transient(),
        )
        .await
        .unwrap();

    assert_eq!(value["total_found"], 1);
    assert_eq!(value["query"], "Message contains: connection timeout");
    assert_eq!(warehouse.poll_count(), 3);
    assert!(warehouse.submitted_sql()[0].contains("message LIKE '%connection timeout%'"));
}

#[tokio::test]
async fn test_transport_failure_degrades_to_empty() {
    let tools = dispatcher(Arc::new(FailingWarehouse::on_poll()), default_connection());

    let value = tools
        .call("analyze_error_patterns", json!({}), &RequestContext::transient())
        .await
        .unwrap();

    assert_eq!(value, json!([]));
}

#[tokio::test]
async fn test_missing_column_metadata_degrades_to_empty() {
    let warehouse = Arc::new(
        ScriptedWarehouse::succeeding(
            &LOG_COLUMNS,
            vec![log_row("t", "CC-1", "/a", "Error", "m")],
        )
        .without_columns(),
    );
    let tools = dispatcher(warehouse, default_connection());

    let value = tools
        .call("search_error_logs", json!({}), &RequestContext::transient())
        .await
        .unwrap();

    assert_eq!(value["total_found"], 0);
}

#[tokio::test]
async fn test_concurrent_sessions_stay_isolated() {
    let tools = dispatcher(Arc::new(ScriptedWarehouse::empty()), default_connection());

    let mut handles = Vec::new();
    for i in 0..16 {
        let tools = tools.clone();
        handles.push(tokio::spawn(async move {
            let ctx = RequestContext::for_session(SessionId::new(format!("s{i}")));
            tools
                .call(
                    "configure_databricks",
                    json!({"host": "h", "token": "t", "warehouse_id": format!("wh-{i}")}),
                    &ctx,
                )
                .await
                .unwrap();
            tools.call("get_severity_summary", json!({}), &ctx).await.unwrap();
            tools.resolver().resolve(&ctx).warehouse_id
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), format!("wh-{i}"));
    }
    assert_eq!(tools.resolver().sessions().len(), 16);
}

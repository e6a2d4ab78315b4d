//! MCP protocol tests over the stdio and HTTP transports.

use std::sync::Arc;

use dbx_error_logs_mcp::mcp::JsonRpcResponse;
use dbx_error_logs_mcp::session::SessionId;
use dbx_error_logs_mcp::transport::{router, serve_lines};
use dbx_error_logs_mcp::warehouse::ScriptedWarehouse;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use super::support::{log_row, server, LOG_COLUMNS};

fn line(value: Value) -> String {
    format!("{value}\n")
}

async fn run_stdio(warehouse: Arc<ScriptedWarehouse>, input: String) -> Vec<JsonRpcResponse> {
    let output = serve_lines(
        server(warehouse),
        SessionId::new("stdio-session"),
        input.as_bytes(),
        Vec::new(),
    )
    .await
    .unwrap();

    let mut responses: Vec<JsonRpcResponse> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    responses.sort_by_key(|r| r.id.as_i64());
    responses
}

#[tokio::test]
async fn test_stdio_session_flow() {
    let warehouse = Arc::new(ScriptedWarehouse::succeeding(
        &LOG_COLUMNS,
        vec![log_row("2024-05-01T00:00:00Z", "CC-1001", "/app/cache.py", "Error", "boom")],
    ));
    let input = [
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "get_file_errors", "arguments": {"file_path": "/app/cache.py"}}
        }),
        json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": {"name": "search_by_message", "arguments": {"query": "'; DROP TABLE x"}}
        }),
    ]
    .into_iter()
    .map(line)
    .collect::<String>();

    let responses = run_stdio(warehouse.clone(), input).await;

    assert_eq!(responses.len(), 4);
    assert_eq!(
        responses[0].result.as_ref().unwrap()["protocolVersion"],
        "2024-11-05"
    );
    assert_eq!(
        responses[1].result.as_ref().unwrap()["tools"]
            .as_array()
            .unwrap()
            .len(),
        8
    );

    let call = responses[2].result.as_ref().unwrap();
    assert_eq!(call["isError"], false);
    assert_eq!(call["structuredContent"]["total_found"], 1);
    assert_eq!(call["structuredContent"]["query"], "Errors in file: /app/cache.py");
    let text: Value = serde_json::from_str(call["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(text, call["structuredContent"]);

    let rejected = responses[3].result.as_ref().unwrap();
    assert_eq!(rejected["isError"], true);
    assert_eq!(warehouse.submit_count(), 1);
}

#[tokio::test]
async fn test_stdio_configure_applies_to_later_calls() {
    let warehouse = Arc::new(ScriptedWarehouse::empty());
    let input = [
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {
                "name": "configure_databricks",
                "arguments": {
                    "host": "https://adb-1.example.net",
                    "token": "t",
                    "warehouse_id": "w",
                    "catalog": "ops",
                    "schema_name": "logs"
                }
            }
        }),
    ]
    .into_iter()
    .map(line)
    .collect::<String>();
    let responses = run_stdio(warehouse.clone(), input).await;
    assert_eq!(
        responses[0].result.as_ref().unwrap()["content"][0]["text"],
        "Databricks configured for session. Host: https://adb-1.example.net, Catalog: ops.logs, Warehouse: w"
    );
}

#[tokio::test]
async fn test_http_round_trip() {
    let warehouse = Arc::new(ScriptedWarehouse::succeeding(
        &["error_code", "severity", "count"],
        vec![vec![json!("CC-1001"), json!("Error"), json!("7")]],
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let app = router(server(warehouse.clone()));
    let serving = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    let health: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "healthy"}));

    let init = client
        .post(format!("{base}/mcp"))
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}))
        .send()
        .await
        .unwrap();
    let session = init
        .headers()
        .get("mcp-session-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let call: Value = client
        .post(format!("{base}/mcp"))
        .header("mcp-session-id", &session)
        .header("x-databricks-catalog", "analytics")
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": {"name": "get_error_frequency", "arguments": {"severity": "Error"}}
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(
        call["result"]["structuredContent"],
        json!({"result": [{"error_code": "CC-1001", "severity": "Error", "count": 7}]})
    );
    assert_eq!(
        warehouse.submitted_sql(),
        vec![
            "SELECT error_code, severity, COUNT(*) AS count \
             FROM analytics.default.error_logs_parsed WHERE severity = 'Error' \
             GROUP BY error_code, severity ORDER BY count DESC LIMIT 10"
                .to_string()
        ]
    );

    let _ = stop_tx.send(());
    serving.await.unwrap().unwrap();
}

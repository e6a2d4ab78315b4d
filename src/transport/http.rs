//! Streamable-HTTP transport.
//!
//! `POST /mcp` takes one JSON-RPC message per request. `initialize` mints a
//! session id returned in the `Mcp-Session-Id` header; later requests send it
//! back so `configure_databricks` has a stable session to write to. The
//! `x-databricks-*` headers of each request form the highest config layer.
//! `DELETE /mcp` ends the session named in the header. `GET /health` is for
//! liveness probes.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::error::{LogSearchError, Result};
use crate::mcp::{methods, JsonRpcError, JsonRpcResponse, McpServer};
use crate::session::{headers, RequestContext, SessionId};

/// Shared state of the HTTP transport.
pub struct HttpState {
    server: Arc<McpServer>,
    /// Session ids handed out by `initialize`.
    sessions: RwLock<HashSet<SessionId>>,
}

impl HttpState {
    pub fn new(server: Arc<McpServer>) -> Self {
        Self {
            server,
            sessions: RwLock::new(HashSet::new()),
        }
    }

    fn open_session(&self) -> SessionId {
        let id = SessionId::generate();
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone());
        id
    }

    fn close_session(&self, id: &SessionId) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if removed {
            self.server.end_session(id);
        }
        removed
    }

    fn is_known(&self, id: &SessionId) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn mcp_handler(
    State(state): State<Arc<HttpState>>,
    request_headers: HeaderMap,
    body: Bytes,
) -> Response {
    let raw = match std::str::from_utf8(&body) {
        Ok(raw) => raw,
        Err(e) => {
            let response = JsonRpcResponse::failure(
                serde_json::Value::Null,
                JsonRpcError::parse_error(e),
            );
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    let request = match McpServer::parse_message(raw) {
        Ok(request) => request,
        Err(response) => return (StatusCode::BAD_REQUEST, Json(response)).into_response(),
    };

    let overrides = RequestContext::headers_from(|name| header_value(&request_headers, name));
    let presented = header_value(&request_headers, headers::SESSION_ID).map(SessionId::new);

    let (session, minted) = if request.method == methods::INITIALIZE && presented.is_none() {
        (Some(state.open_session()), true)
    } else {
        (presented, false)
    };

    if let Some(id) = session.as_ref().filter(|_| !minted) {
        if !state.is_known(id) {
            warn!(session = %id, "Request for unknown MCP session");
            let response = JsonRpcResponse::failure(
                request.id.clone().unwrap_or(serde_json::Value::Null),
                JsonRpcError::invalid_request("unknown session; re-initialize"),
            );
            return (StatusCode::NOT_FOUND, Json(response)).into_response();
        }
    }

    let ctx = RequestContext {
        session_id: session.clone(),
        headers: None,
    }
    .with_headers(overrides);
    debug!(
        method = %request.method,
        session = session.as_ref().map(|s| s.as_str()).unwrap_or("<none>"),
        header_layer = ctx.headers.is_some(),
        "MCP HTTP request"
    );

    let mut response = match state.server.handle_request(request, &ctx).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };

    if minted {
        if let Some(value) = session
            .as_ref()
            .and_then(|id| HeaderValue::from_str(id.as_str()).ok())
        {
            response.headers_mut().insert(headers::SESSION_ID, value);
        }
    }

    response
}

async fn delete_session_handler(
    State(state): State<Arc<HttpState>>,
    request_headers: HeaderMap,
) -> StatusCode {
    let Some(id) = header_value(&request_headers, headers::SESSION_ID).map(SessionId::new) else {
        return StatusCode::BAD_REQUEST;
    };
    if state.close_session(&id) {
        info!(session = %id, "MCP session closed by client");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Builds the router: `GET /health`, `POST /mcp` and `DELETE /mcp`.
pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/mcp", post(mcp_handler).delete(delete_session_handler))
        .with_state(Arc::new(HttpState::new(server)))
}

/// Binds `host:port` and serves until `shutdown` resolves.
pub async fn serve_http<F>(server: Arc<McpServer>, host: &str, port: u16, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| LogSearchError::config(format!("Invalid address '{}:{}': {}", host, port, e)))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| LogSearchError::config(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("MCP HTTP server listening on {}", addr);

    axum::serve(listener, router(server))
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("MCP HTTP server shutting down");
        })
        .await
        .map_err(|e| LogSearchError::internal(format!("HTTP server error: {e}")))
}

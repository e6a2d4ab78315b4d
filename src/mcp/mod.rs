//! MCP method handling, independent of transport.
//!
//! Transports hand raw JSON-RPC text (or a parsed request) plus a
//! [`RequestContext`] to [`McpServer`] and write back whatever response it
//! returns. Notifications produce no response.

pub mod protocol;

pub use protocol::{
    error_codes, methods, CallToolResult, Content, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ToolCallParams, PROTOCOL_VERSION, SERVER_NAME,
};

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::error::LogSearchError;
use crate::session::{RequestContext, SessionId};
use crate::tools::ToolDispatcher;

/// Answers MCP requests using a [`ToolDispatcher`].
#[derive(Clone)]
pub struct McpServer {
    tools: ToolDispatcher,
}

impl McpServer {
    pub fn new(tools: ToolDispatcher) -> Self {
        Self { tools }
    }

    /// Drops whatever `configure_databricks` stored for a closed session.
    pub fn end_session(&self, session_id: &SessionId) {
        if self.tools.resolver().sessions().remove(session_id).is_some() {
            debug!(session = %session_id, "Dropped session configuration");
        }
    }

    /// Parses one JSON-RPC message.
    ///
    /// On failure returns the error response to send back, with the request
    /// id when it could be recovered.
    pub fn parse_message(raw: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| JsonRpcResponse::failure(Value::Null, JsonRpcError::parse_error(e)))?;

        if value.is_array() {
            return Err(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::invalid_request("batch requests are not supported"),
            ));
        }

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(|e| JsonRpcResponse::failure(id, JsonRpcError::invalid_request(e)))
    }

    /// Handles one raw message.
    pub async fn handle_message(&self, raw: &str, ctx: &RequestContext) -> Option<JsonRpcResponse> {
        match Self::parse_message(raw) {
            Ok(request) => self.handle_request(request, ctx).await,
            Err(response) => {
                warn!(
                    error = response.error.as_ref().map(|e| e.message.as_str()).unwrap_or(""),
                    "Rejected malformed JSON-RPC message"
                );
                Some(response)
            }
        }
    }

    /// Handles one parsed request; notifications return `None`.
    pub async fn handle_request(
        &self,
        request: JsonRpcRequest,
        ctx: &RequestContext,
    ) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            if request.method == methods::INITIALIZED {
                info!("MCP client initialized");
            } else {
                debug!(method = %request.method, "Received notification");
            }
            return None;
        };

        if request.jsonrpc != protocol::JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request("jsonrpc must be 2.0"),
            ));
        }

        debug!(method = %request.method, "Processing MCP method");
        let outcome = match request.method.as_str() {
            methods::INITIALIZE => Ok(self.initialize(ctx)),
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => Ok(json!({ "tools": self.tools.definitions() })),
            methods::TOOLS_CALL => self.call_tool(request.params, ctx).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn initialize(&self, ctx: &RequestContext) -> Value {
        info!(
            session = ctx.session_id.as_ref().map(|s| s.as_str()).unwrap_or("<none>"),
            "MCP initialize"
        );
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    async fn call_tool(&self, params: Value, ctx: &RequestContext) -> Result<Value, JsonRpcError> {
        let params: ToolCallParams =
            serde_json::from_value(params).map_err(JsonRpcError::invalid_params)?;

        info!(tool = %params.name, "MCP tools/call");
        let result = match self.tools.call(&params.name, params.arguments, ctx).await {
            Ok(value) => CallToolResult::success(value),
            Err(e) if e.is_caller_fault() => {
                info!(tool = %params.name, error = %e, "Tool call rejected");
                CallToolResult::error(e.to_string())
            }
            Err(LogSearchError::Protocol(message)) => {
                return Err(JsonRpcError::invalid_params(message));
            }
            Err(e) => {
                error!(tool = %params.name, error = %e, category = e.category(), "Tool call failed");
                return Err(JsonRpcError::internal(e));
            }
        };

        serde_json::to_value(result).map_err(JsonRpcError::internal)
    }
}

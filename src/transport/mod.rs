//! Transports that carry MCP messages to and from [`McpServer`].

pub mod http;
pub mod stdio;

pub use http::{router, serve_http};
pub use stdio::{serve_lines, serve_stdio};

use std::sync::Arc;

use tracing::info;

use crate::config::{ServerSettings, Transport};
use crate::error::Result;
use crate::mcp::McpServer;

/// Runs the configured transport until the client goes away or the process
/// is interrupted.
pub async fn run(server: Arc<McpServer>, settings: &ServerSettings) -> Result<()> {
    info!(transport = %settings.transport, "Starting MCP server");
    match settings.transport {
        Transport::Stdio => serve_stdio(server).await,
        Transport::Http => {
            serve_http(server, &settings.host, settings.port, shutdown_signal()).await
        }
    }
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

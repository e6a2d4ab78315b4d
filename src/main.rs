//! dbx-error-logs-mcp - MCP server for Databricks error-log search.

use std::sync::Arc;

use anyhow::Context;
use dbx_error_logs_mcp::cli::Cli;
use dbx_error_logs_mcp::config::Settings;
use dbx_error_logs_mcp::mcp::McpServer;
use dbx_error_logs_mcp::tools::ToolDispatcher;
use dbx_error_logs_mcp::{logging, transport};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already be set.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse_args();
    let config_path = cli.config_path();
    let mut settings = Settings::load_from_file(&config_path)
        .with_context(|| format!("loading settings from {}", config_path.display()))?;
    cli.apply_to(&mut settings)?;

    logging::init(settings.logging.file.as_deref());
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }
    info!("Settings: {}", config_path.display());

    let tools = ToolDispatcher::from_settings(&settings)?;
    let server = Arc::new(McpServer::new(tools));

    transport::run(server, &settings.server).await?;
    Ok(())
}

//! Command-line argument parsing.
//!
//! Every server flag can also come from the environment. Flags and
//! environment win over the settings file.

use crate::config::{Settings, Transport};
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// MCP server for searching Databricks error logs.
#[derive(Parser, Debug)]
#[command(name = "dbx-error-logs-mcp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Transport: stdio or streamable-http
    #[arg(short = 't', long, env = "MCP_TRANSPORT", value_name = "TRANSPORT")]
    pub transport: Option<String>,

    /// Listen address for the HTTP transport
    #[arg(short = 'H', long, env = "MCP_SERVER_HOST", value_name = "HOST")]
    pub host: Option<String>,

    /// Listen port for the HTTP transport
    #[arg(short = 'p', long, env = "MCP_SERVER_PORT", value_name = "PORT")]
    pub port: Option<u16>,

    /// Settings file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the settings file path, using the default if not specified.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Settings::default_path)
    }

    /// Overlays flags onto settings loaded from file.
    pub fn apply_to(&self, settings: &mut Settings) -> Result<()> {
        if let Some(transport) = &self.transport {
            settings.server.transport = transport.parse::<Transport>()?;
        }
        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(file) = &self.log_file {
            settings.logging.file = Some(file.clone());
        }
        Ok(())
    }
}

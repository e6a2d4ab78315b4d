//! Databricks SQL Statement Execution API client.
//!
//! Implements the WarehouseClient trait with `reqwest`. Statements are
//! submitted with a zero wait timeout so all polling stays in the runner.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ConnectionConfig;
use crate::error::{LogSearchError, Result};

use super::{StatementHandle, StatementResponse, WarehouseClient};

/// Statement Execution API path.
const STATEMENTS_PATH: &str = "/api/2.0/sql/statements";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Databricks warehouse client. Cheap to clone; the connection pool is shared.
#[derive(Debug, Clone)]
pub struct DatabricksClient {
    client: Client,
}

#[derive(Debug, Serialize)]
struct SubmitStatementRequest<'a> {
    warehouse_id: &'a str,
    statement: &'a str,
    catalog: &'a str,
    schema: &'a str,
    wait_timeout: &'static str,
    disposition: &'static str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl DatabricksClient {
    /// Creates a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dbx-error-logs-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                LogSearchError::internal(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    /// Creates a client with the default 30 second timeout.
    pub fn with_default_timeout() -> Result<Self> {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Resolves the statements endpoint for a workspace host.
    ///
    /// Hosts without a scheme are treated as `https://`.
    fn statements_url(host: &str) -> Result<Url> {
        let host = host.trim().trim_end_matches('/');
        let base = if host.starts_with("https://") || host.starts_with("http://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };

        Url::parse(&base)
            .and_then(|url| url.join(STATEMENTS_PATH))
            .map_err(|e| LogSearchError::transport(format!("Invalid Databricks host '{host}': {e}")))
    }

    fn statement_url(host: &str, handle: &StatementHandle) -> Result<Url> {
        let mut url = Self::statements_url(host)?;
        url.path_segments_mut()
            .map_err(|_| LogSearchError::transport(format!("Invalid Databricks host '{host}'")))?
            .push(handle.as_str());
        Ok(url)
    }

    /// Maps a non-2xx reply to a transport error.
    fn parse_error(status: StatusCode, body: &str) -> LogSearchError {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return LogSearchError::transport(
                "Authentication failed. Check your Databricks token.",
            );
        }

        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(body) {
            if let Some(message) = error.message {
                let code = error.error_code.unwrap_or_else(|| status.to_string());
                return LogSearchError::transport(format!("Databricks API error ({code}): {message}"));
            }
        }

        LogSearchError::transport(format!("Databricks API error ({}): {}", status, body))
    }

    async fn send(&self, request: RequestBuilder) -> Result<StatementResponse> {
        let response = request
            .send()
            .await
            .map_err(|e| LogSearchError::transport(format!("Request to Databricks failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LogSearchError::transport(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            LogSearchError::transport(format!("Failed to parse statement response: {e}"))
        })
    }
}

#[async_trait]
impl WarehouseClient for DatabricksClient {
    async fn submit_statement(
        &self,
        config: &ConnectionConfig,
        sql: &str,
    ) -> Result<StatementResponse> {
        let url = Self::statements_url(&config.host)?;
        debug!(%url, warehouse = %config.warehouse_id, "Submitting statement");

        let body = SubmitStatementRequest {
            warehouse_id: &config.warehouse_id,
            statement: sql,
            catalog: &config.catalog,
            schema: &config.schema_name,
            wait_timeout: "0s",
            disposition: "INLINE",
            format: "JSON_ARRAY",
        };

        self.send(self.client.post(url).bearer_auth(&config.token).json(&body))
            .await
    }

    async fn get_statement(
        &self,
        config: &ConnectionConfig,
        handle: &StatementHandle,
    ) -> Result<StatementResponse> {
        let url = Self::statement_url(&config.host, handle)?;
        debug!(statement = %handle, "Polling statement");

        self.send(self.client.get(url).bearer_auth(&config.token))
            .await
    }
}

//! Tool dispatch.
//!
//! Every read tool runs the same pipeline: resolve the connection for the
//! call, build SQL, execute it and map the rows. Only invalid input fails a
//! call; everything downstream of the builder degrades to an empty result.

pub mod definitions;

pub use definitions::{names, tool_definitions, ToolDefinition};

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{ConnectionConfig, Settings, DEFAULT_CATALOG, DEFAULT_SCHEMA};
use crate::error::{LogSearchError, Result};
use crate::mapper::{
    map_rows, ErrorFrequency, ErrorLogRecord, ErrorPattern, ErrorSearchResult, FromRow,
    SeveritySummary,
};
use crate::query::QueryBuilder;
use crate::resolver::ConfigResolver;
use crate::runner::StatementRunner;
use crate::sanitize::sanitize_identifier;
use crate::session::{RequestContext, SessionConfigStore};
use crate::warehouse::{DatabricksClient, WarehouseClient};

use definitions::{
    parse_arguments, ConfigureInput, ErrorFrequencyInput, FileErrorsInput, MessageSearchInput,
    PatternInput, SearchErrorLogsInput, TimeRangeInput,
};

/// Routes tool calls through resolver, builder, runner and mapper.
#[derive(Clone)]
pub struct ToolDispatcher {
    resolver: ConfigResolver,
    runner: StatementRunner,
}

impl ToolDispatcher {
    pub fn new(resolver: ConfigResolver, runner: StatementRunner) -> Self {
        Self { resolver, runner }
    }

    /// Wires the dispatcher to the real Databricks client.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = DatabricksClient::new(settings.warehouse.request_timeout())?;
        Ok(Self::with_client(settings, Arc::new(client)))
    }

    /// Wires the dispatcher to any warehouse client.
    pub fn with_client(settings: &Settings, client: Arc<dyn WarehouseClient>) -> Self {
        let defaults = settings.default_connection();
        info!(connection = %defaults.display_string(), "Default Databricks connection");

        let resolver = ConfigResolver::new(defaults, Arc::new(SessionConfigStore::new()));
        let runner = StatementRunner::from_settings(client, &settings.warehouse);
        Self::new(resolver, runner)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        tool_definitions()
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    /// Invokes a tool by name with raw JSON arguments.
    ///
    /// Unknown tool names are protocol errors; bad arguments and rejected
    /// values are invalid input.
    pub async fn call(&self, name: &str, arguments: Value, ctx: &RequestContext) -> Result<Value> {
        debug!(tool = name, "Dispatching tool call");
        match name {
            names::CONFIGURE_DATABRICKS => {
                let input = parse_arguments(name, arguments)?;
                to_json(self.configure_databricks(ctx, input)?)
            }
            names::SEARCH_ERROR_LOGS => {
                let input = parse_arguments(name, arguments)?;
                to_json(self.search_error_logs(ctx, input).await?)
            }
            names::GET_ERROR_FREQUENCY => {
                let input = parse_arguments(name, arguments)?;
                to_json(self.get_error_frequency(ctx, input).await?)
            }
            names::GET_SEVERITY_SUMMARY => to_json(self.get_severity_summary(ctx).await?),
            names::GET_FILE_ERRORS => {
                let input = parse_arguments(name, arguments)?;
                to_json(self.get_file_errors(ctx, input).await?)
            }
            names::SEARCH_BY_MESSAGE => {
                let input = parse_arguments(name, arguments)?;
                to_json(self.search_by_message(ctx, input).await?)
            }
            names::SEARCH_BY_TIME_RANGE => {
                let input = parse_arguments(name, arguments)?;
                to_json(self.search_by_time_range(ctx, input).await?)
            }
            names::ANALYZE_ERROR_PATTERNS => {
                let input = parse_arguments(name, arguments)?;
                to_json(self.analyze_error_patterns(ctx, input).await?)
            }
            other => Err(LogSearchError::protocol(format!("Unknown tool: {other}"))),
        }
    }

    /// Stores a connection for the caller's session.
    ///
    /// Fails without a stable session id, since the entry could never be
    /// looked up again.
    pub fn configure_databricks(&self, ctx: &RequestContext, input: ConfigureInput) -> Result<String> {
        let session_id = ctx.session_id.clone().ok_or_else(|| {
            LogSearchError::invalid_input(
                "configure_databricks needs a session; this connection has no session id. \
                 Pass x-databricks-* headers instead.",
            )
        })?;

        let mut missing = Vec::new();
        for (field, value) in [
            ("host", &input.host),
            ("token", &input.token),
            ("warehouse_id", &input.warehouse_id),
        ] {
            if value.trim().is_empty() {
                missing.push(field);
            }
        }
        if !missing.is_empty() {
            return Err(LogSearchError::invalid_input(format!(
                "Missing required value(s): {}",
                missing.join(", ")
            )));
        }

        let catalog = non_empty_or(input.catalog.as_deref(), DEFAULT_CATALOG);
        let schema = non_empty_or(input.schema_name.as_deref(), DEFAULT_SCHEMA);
        sanitize_identifier(catalog)?;
        sanitize_identifier(schema)?;

        let config = ConnectionConfig::new(
            input.host.trim(),
            input.token.trim(),
            input.warehouse_id.trim(),
        )
        .with_catalog(catalog)
        .with_schema(schema);

        let reply = format!(
            "Databricks configured for session. Host: {}, Catalog: {}.{}, Warehouse: {}",
            config.host, config.catalog, config.schema_name, config.warehouse_id
        );

        let replaced = self.resolver.sessions().insert(session_id.clone(), config);
        info!(
            session = %session_id,
            replaced = replaced.is_some(),
            "Stored session Databricks config"
        );

        Ok(reply)
    }

    pub async fn search_error_logs(
        &self,
        ctx: &RequestContext,
        input: SearchErrorLogsInput,
    ) -> Result<ErrorSearchResult> {
        let config = self.resolver.resolve(ctx);
        let sql = QueryBuilder::new(&config).search_by_criteria(&input.to_spec())?;
        let records: Vec<ErrorLogRecord> = self.run(&config, &sql).await;
        Ok(ErrorSearchResult::new(records, input.describe()))
    }

    pub async fn get_error_frequency(
        &self,
        ctx: &RequestContext,
        input: ErrorFrequencyInput,
    ) -> Result<Vec<ErrorFrequency>> {
        let config = self.resolver.resolve(ctx);
        let sql = QueryBuilder::new(&config).frequency_by_severity(&input.to_spec())?;
        Ok(self.run(&config, &sql).await)
    }

    pub async fn get_severity_summary(&self, ctx: &RequestContext) -> Result<Vec<SeveritySummary>> {
        let config = self.resolver.resolve(ctx);
        let sql = QueryBuilder::new(&config).severity_summary()?;
        Ok(self.run(&config, &sql).await)
    }

    pub async fn get_file_errors(
        &self,
        ctx: &RequestContext,
        input: FileErrorsInput,
    ) -> Result<ErrorSearchResult> {
        let config = self.resolver.resolve(ctx);
        let sql = QueryBuilder::new(&config).errors_by_file(&input.to_spec())?;
        let records: Vec<ErrorLogRecord> = self.run(&config, &sql).await;
        Ok(ErrorSearchResult::new(records, input.describe()))
    }

    pub async fn search_by_message(
        &self,
        ctx: &RequestContext,
        input: MessageSearchInput,
    ) -> Result<ErrorSearchResult> {
        let config = self.resolver.resolve(ctx);
        let sql = QueryBuilder::new(&config).search_by_message(&input.to_spec())?;
        let records: Vec<ErrorLogRecord> = self.run(&config, &sql).await;
        Ok(ErrorSearchResult::new(records, input.describe()))
    }

    pub async fn search_by_time_range(
        &self,
        ctx: &RequestContext,
        input: TimeRangeInput,
    ) -> Result<ErrorSearchResult> {
        let config = self.resolver.resolve(ctx);
        let sql = QueryBuilder::new(&config).search_by_time_range(&input.to_spec())?;
        let records: Vec<ErrorLogRecord> = self.run(&config, &sql).await;
        Ok(ErrorSearchResult::new(records, input.describe()))
    }

    pub async fn analyze_error_patterns(
        &self,
        ctx: &RequestContext,
        input: PatternInput,
    ) -> Result<Vec<ErrorPattern>> {
        let config = self.resolver.resolve(ctx);
        let sql = QueryBuilder::new(&config).error_patterns(&input.to_spec())?;
        Ok(self.run(&config, &sql).await)
    }

    async fn run<T: FromRow>(&self, config: &ConnectionConfig, sql: &str) -> Vec<T> {
        let result = self.runner.execute(config, sql).await;
        map_rows(&result)
    }
}

fn non_empty_or<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(default)
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| LogSearchError::internal(format!("Failed to serialize tool result: {e}")))
}

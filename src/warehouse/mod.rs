//! Warehouse RPC boundary.
//!
//! Provides a trait-based interface to the SQL warehouse so the statement
//! runner can be exercised against scripted doubles as well as the real
//! Databricks Statement Execution API.

mod databricks;
mod mock;
mod types;

pub use databricks::DatabricksClient;
pub use mock::{FailingWarehouse, ScriptedWarehouse};
pub use types::{
    ColumnInfo, ResultData, ResultManifest, ResultSchema, Row, ServiceError, StatementHandle,
    StatementResponse, StatementResult, StatementState, StatementStatus,
};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the warehouse operations the runner needs.
///
/// The connection travels with every call because host and token may differ
/// per request. Implementations must be thread-safe; one client instance is
/// shared by every concurrent tool call.
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    /// Submits a statement and returns its id and initial status.
    async fn submit_statement(
        &self,
        config: &ConnectionConfig,
        sql: &str,
    ) -> Result<StatementResponse>;

    /// Fetches the current status (and inline result, once succeeded).
    async fn get_statement(
        &self,
        config: &ConnectionConfig,
        handle: &StatementHandle,
    ) -> Result<StatementResponse>;
}

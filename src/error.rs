//! Error types for the error-log MCP server.
//!
//! Only [`LogSearchError::InvalidInput`] is meant to reach a tool caller.
//! The warehouse-side variants are logged and degraded to empty results
//! by the statement runner and result mapper.

use thiserror::Error;

/// Main error type for error-log search operations.
#[derive(Error, Debug)]
pub enum LogSearchError {
    /// Caller-supplied value rejected before any SQL was built.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resolved connection is missing host, token or warehouse id.
    #[error("Databricks is not configured: {0}")]
    ConfigUnusable(String),

    /// Warehouse RPC failed (network, HTTP status, undecodable body).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Warehouse answered without the column metadata needed to map rows.
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Settings file or environment could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed JSON-RPC / MCP traffic.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LogSearchError {
    /// Creates an invalid-input error with the given message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates an unusable-config error with the given message.
    pub fn config_unusable(msg: impl Into<String>) -> Self {
        Self::ConfigUnusable(msg.into())
    }

    /// Creates a transport error with the given message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a mapping error with the given message.
    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::Mapping(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a protocol error with the given message.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "Invalid Input",
            Self::ConfigUnusable(_) => "Unconfigured",
            Self::Transport(_) => "Transport Error",
            Self::Mapping(_) => "Mapping Error",
            Self::Config(_) => "Configuration Error",
            Self::Protocol(_) => "Protocol Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true for errors caused by the caller's arguments.
    pub fn is_caller_fault(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Result type alias using LogSearchError.
pub type Result<T> = std::result::Result<T, LogSearchError>;

//! dbx-error-logs-mcp - search application error logs in Databricks over MCP.
//!
//! A tool call flows through [`resolver::ConfigResolver`] (which connection),
//! [`query::QueryBuilder`] (which SQL), [`runner::StatementRunner`] (execute
//! and poll) and [`mapper`] (typed records). [`tools::ToolDispatcher`] ties
//! the steps together; [`mcp`] and [`transport`] put it on the wire.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod mcp;
pub mod query;
pub mod resolver;
pub mod runner;
pub mod sanitize;
pub mod session;
pub mod tools;
pub mod transport;
pub mod warehouse;

//! Integration tests for dbx-error-logs-mcp.

pub mod live_test;
pub mod mcp_test;
pub mod settings_test;
pub mod support;
pub mod tools_test;

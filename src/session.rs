//! Per-session connection storage and request context.
//!
//! `configure_databricks` writes into a [`SessionConfigStore`]; the resolver
//! reads from it. The store is shared by every concurrent tool call, so all
//! access goes through short read/write critical sections and no lock is ever
//! held across a warehouse round-trip.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use uuid::Uuid;

use crate::config::{ConnectionConfig, ConnectionOverrides};

/// Request headers that override connection fields (networked transport only).
pub mod headers {
    pub const HOST: &str = "x-databricks-host";
    pub const TOKEN: &str = "x-databricks-token";
    pub const WAREHOUSE_ID: &str = "x-databricks-warehouse-id";
    pub const CATALOG: &str = "x-databricks-catalog";
    pub const SCHEMA: &str = "x-databricks-schema";
    /// Session id header of the streamable-http transport.
    pub const SESSION_ID: &str = "mcp-session-id";
}

/// Stable identity of one MCP session channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh random session id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the transport knows about the caller of one tool call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Session the call belongs to, if the transport provides a stable one.
    pub session_id: Option<SessionId>,
    /// `x-databricks-*` header values (HTTP transport only).
    pub headers: Option<ConnectionOverrides>,
}

impl RequestContext {
    /// A context with no session and no headers.
    pub fn transient() -> Self {
        Self::default()
    }

    /// A context bound to the given session.
    pub fn for_session(session_id: SessionId) -> Self {
        Self {
            session_id: Some(session_id),
            headers: None,
        }
    }

    /// Attaches header overrides.
    pub fn with_headers(mut self, overrides: ConnectionOverrides) -> Self {
        self.headers = (!overrides.is_empty()).then_some(overrides);
        self
    }

    /// Reads the `x-databricks-*` headers through `lookup`.
    pub fn headers_from<F>(lookup: F) -> ConnectionOverrides
    where
        F: Fn(&str) -> Option<String>,
    {
        ConnectionOverrides {
            host: lookup(headers::HOST),
            token: lookup(headers::TOKEN),
            warehouse_id: lookup(headers::WAREHOUSE_ID),
            catalog: lookup(headers::CATALOG),
            schema_name: lookup(headers::SCHEMA),
        }
    }
}

/// Session id to connection mapping shared across concurrent calls.
///
/// Entries live for the process lifetime; reconfiguring a session replaces
/// its entry.
#[derive(Debug, Default)]
pub struct SessionConfigStore {
    configs: RwLock<HashMap<SessionId, ConnectionConfig>>,
}

impl SessionConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the session's config, if one was stored.
    pub fn get(&self, session_id: &SessionId) -> Option<ConnectionConfig> {
        self.configs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    /// Stores a session's config, returning the one it replaced.
    pub fn insert(
        &self,
        session_id: SessionId,
        config: ConnectionConfig,
    ) -> Option<ConnectionConfig> {
        self.configs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id, config)
    }

    /// Forgets a session's config, returning it if one was stored.
    pub fn remove(&self, session_id: &SessionId) -> Option<ConnectionConfig> {
        self.configs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)
    }

    pub fn len(&self) -> usize {
        self.configs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

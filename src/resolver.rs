//! Per-call connection resolution.
//!
//! Each field is resolved on its own, highest layer first:
//!
//! 1. `x-databricks-*` request headers
//! 2. the session's stored `configure_databricks` config
//! 3. process-wide defaults (environment and settings file)
//!
//! Resolution never fails. A result missing host, token or warehouse id is
//! handed on as-is and the statement runner short-circuits it.

use std::sync::Arc;

use tracing::debug;

use crate::config::{ConnectionConfig, ConnectionOverrides};
use crate::session::{RequestContext, SessionConfigStore};

/// Merges header, session and default layers into one [`ConnectionConfig`].
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    defaults: ConnectionConfig,
    sessions: Arc<SessionConfigStore>,
}

impl ConfigResolver {
    pub fn new(defaults: ConnectionConfig, sessions: Arc<SessionConfigStore>) -> Self {
        Self { defaults, sessions }
    }

    /// The shared session store.
    pub fn sessions(&self) -> &Arc<SessionConfigStore> {
        &self.sessions
    }

    /// Produces the effective connection for one call.
    pub fn resolve(&self, ctx: &RequestContext) -> ConnectionConfig {
        let mut config = self.defaults.clone();

        if let Some(session_id) = &ctx.session_id {
            if let Some(session) = self.sessions.get(session_id) {
                debug!(session = %session_id, "Applying session Databricks config");
                config.merge(&ConnectionOverrides::from(&session));
            }
        }

        if let Some(headers) = &ctx.headers {
            debug!("Applying Databricks request headers");
            config.merge(headers);
        }

        config
    }
}

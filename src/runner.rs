//! Statement execution with polling.
//!
//! Submits SQL to the warehouse, polls until the statement reaches a terminal
//! state and returns its rows. Unusable connections, RPC failures, failed
//! statements and timeouts all degrade to an empty [`StatementResult`] after
//! logging the cause, so tools always have a well-typed answer.
//!
//! Polling sleeps on the tokio timer between status fetches, so concurrent
//! tool calls keep running. The wait cap is a deadline covering submission,
//! sleeps and every status fetch. Dropping the returned future (for example when a
//! transport disconnects) abandons the loop at its next await point; no
//! cancel request is sent to the warehouse.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, warn};

use crate::config::{ConnectionConfig, WarehouseSettings};
use crate::error::{LogSearchError, Result};
use crate::warehouse::{StatementResult, StatementState, WarehouseClient};

/// Default delay between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default cap on total polling time.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(30);

/// Runs statements against a shared warehouse client.
#[derive(Clone)]
pub struct StatementRunner {
    client: Arc<dyn WarehouseClient>,
    poll_interval: Duration,
    max_wait: Option<Duration>,
}

impl StatementRunner {
    /// Creates a runner with the default 500 ms interval and 30 s cap.
    pub fn new(client: Arc<dyn WarehouseClient>) -> Self {
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: Some(DEFAULT_MAX_WAIT),
        }
    }

    /// Creates a runner using the `[warehouse]` settings.
    pub fn from_settings(client: Arc<dyn WarehouseClient>, settings: &WarehouseSettings) -> Self {
        Self::new(client)
            .with_poll_interval(settings.poll_interval())
            .with_max_wait(Some(settings.max_wait()))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the total polling cap; `None` polls until a terminal state.
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Executes `sql` and returns its rows, or an empty result on any failure.
    pub async fn execute(&self, config: &ConnectionConfig, sql: &str) -> StatementResult {
        if !config.is_usable() {
            let err = LogSearchError::config_unusable(format!(
                "missing {}",
                config.missing_fields().join(", ")
            ));
            warn!(error = %err, "Skipping query; returning empty result");
            return StatementResult::empty();
        }

        match self.run(config, sql).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    error = %e,
                    category = e.category(),
                    connection = %config.display_string(),
                    "Query failed; returning empty result"
                );
                StatementResult::empty()
            }
        }
    }

    async fn run(&self, config: &ConnectionConfig, sql: &str) -> Result<StatementResult> {
        let started = Instant::now();
        let deadline = self.max_wait.map(|max_wait| started + max_wait);

        debug!(sql, "Submitting statement");
        let Some(mut response) = within(deadline, self.client.submit_statement(config, sql)).await?
        else {
            warn!(
                waited_ms = started.elapsed().as_millis() as u64,
                "Statement submission did not finish in time; returning empty result"
            );
            return Ok(StatementResult::empty());
        };

        while let Some(state) = response.state().filter(|s| !s.is_terminal()) {
            let handle = response.handle().ok_or_else(|| {
                LogSearchError::transport(format!("Statement is {state} but has no statement id"))
            })?;

            let pause = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Ok(timed_out(state, started));
                    }
                    self.poll_interval.min(remaining)
                }
                None => self.poll_interval,
            };
            sleep(pause).await;

            match within(deadline, self.client.get_statement(config, &handle)).await? {
                Some(next) => response = next,
                None => return Ok(timed_out(state, started)),
            }
        }

        match response.state() {
            Some(StatementState::Succeeded) => {
                let result = StatementResult::from_response(response);
                debug!(
                    rows = result.row_count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Statement succeeded"
                );
                Ok(result)
            }
            Some(state) => {
                warn!(
                    state = %state,
                    message = response.error_message().unwrap_or("<none>"),
                    "Statement did not succeed; returning empty result"
                );
                Ok(StatementResult::stopped_at(state))
            }
            None => {
                debug!("Statement response carried no status");
                Ok(StatementResult::from_response(response))
            }
        }
    }
}

/// Awaits `call`, giving up with `None` once `deadline` passes.
async fn within<T>(
    deadline: Option<Instant>,
    call: impl Future<Output = Result<T>>,
) -> Result<Option<T>> {
    match deadline {
        Some(deadline) => match timeout_at(deadline, call).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        },
        None => call.await.map(Some),
    }
}

fn timed_out(state: StatementState, started: Instant) -> StatementResult {
    warn!(
        state = %state,
        waited_ms = started.elapsed().as_millis() as u64,
        "Statement did not finish in time; returning empty result"
    );
    StatementResult::stopped_at(state)
}

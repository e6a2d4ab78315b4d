//! Warehouse doubles for testing.
//!
//! [`ScriptedWarehouse`] plays back a fixed state sequence and records the
//! SQL it was given; [`FailingWarehouse`] fails every RPC.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{Row, StatementHandle, StatementResponse, StatementState, WarehouseClient};
use crate::config::ConnectionConfig;
use crate::error::{LogSearchError, Result};

const SCRIPTED_STATEMENT_ID: &str = "scripted-statement";

/// A warehouse that answers with a scripted sequence of states.
///
/// The first state is returned by `submit_statement`, each following one by
/// `get_statement`. Once the script runs out the last state repeats. Columns
/// and rows are attached only to `SUCCEEDED` responses. Optional delays make
/// either RPC slow.
pub struct ScriptedWarehouse {
    states: Mutex<VecDeque<StatementState>>,
    last_state: Mutex<StatementState>,
    columns: Option<Vec<String>>,
    rows: Vec<Row>,
    submitted: Mutex<Vec<String>>,
    submit_calls: AtomicUsize,
    poll_calls: AtomicUsize,
    submit_delay: Duration,
    poll_delay: Duration,
}

impl ScriptedWarehouse {
    /// Succeeds immediately with the given columns and rows.
    pub fn succeeding(columns: &[&str], rows: Vec<Row>) -> Self {
        Self {
            states: Mutex::new(VecDeque::from([StatementState::Succeeded])),
            last_state: Mutex::new(StatementState::Succeeded),
            columns: Some(columns.iter().map(|c| c.to_string()).collect()),
            rows,
            submitted: Mutex::new(Vec::new()),
            submit_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            submit_delay: Duration::ZERO,
            poll_delay: Duration::ZERO,
        }
    }

    /// Succeeds immediately with no rows.
    pub fn empty() -> Self {
        Self::succeeding(&[], Vec::new())
    }

    /// Replaces the state script.
    pub fn with_states(self, states: impl IntoIterator<Item = StatementState>) -> Self {
        let states: VecDeque<_> = states.into_iter().collect();
        let last = states.back().copied().unwrap_or(StatementState::Succeeded);
        Self {
            states: Mutex::new(states),
            last_state: Mutex::new(last),
            ..self
        }
    }

    /// Answers without column descriptors.
    pub fn without_columns(self) -> Self {
        Self {
            columns: None,
            ..self
        }
    }

    /// Delays every `submit_statement` answer.
    pub fn with_submit_delay(self, delay: Duration) -> Self {
        Self {
            submit_delay: delay,
            ..self
        }
    }

    /// Delays every `get_statement` answer.
    pub fn with_poll_delay(self, delay: Duration) -> Self {
        Self {
            poll_delay: delay,
            ..self
        }
    }

    /// SQL texts submitted so far, in order.
    pub fn submitted_sql(&self) -> Vec<String> {
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn submit_count(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> StatementResponse {
        let next = self
            .states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let mut last = self.last_state.lock().unwrap_or_else(PoisonError::into_inner);
        let state = next.unwrap_or(*last);
        *last = state;

        let response = StatementResponse::with_state(SCRIPTED_STATEMENT_ID, state);
        if state != StatementState::Succeeded {
            return response;
        }

        match &self.columns {
            Some(columns) => {
                let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
                response.with_data(&columns, self.rows.clone())
            }
            None => {
                let mut response = response.with_data(&[], self.rows.clone());
                response.manifest = None;
                response
            }
        }
    }
}

#[async_trait]
impl WarehouseClient for ScriptedWarehouse {
    async fn submit_statement(
        &self,
        _config: &ConnectionConfig,
        sql: &str,
    ) -> Result<StatementResponse> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sql.to_string());
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }
        Ok(self.next_response())
    }

    async fn get_statement(
        &self,
        _config: &ConnectionConfig,
        _handle: &StatementHandle,
    ) -> Result<StatementResponse> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        if !self.poll_delay.is_zero() {
            tokio::time::sleep(self.poll_delay).await;
        }
        Ok(self.next_response())
    }
}

/// A warehouse whose RPCs always fail with a transport error.
///
/// With `fail_on_submit == false` submission succeeds in `RUNNING` state and
/// the first poll fails instead.
pub struct FailingWarehouse {
    fail_on_submit: bool,
    calls: AtomicUsize,
}

impl FailingWarehouse {
    pub fn on_submit() -> Self {
        Self {
            fail_on_submit: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on_poll() -> Self {
        Self {
            fail_on_submit: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Total RPCs attempted.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WarehouseClient for FailingWarehouse {
    async fn submit_statement(
        &self,
        _config: &ConnectionConfig,
        _sql: &str,
    ) -> Result<StatementResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_submit {
            return Err(LogSearchError::transport("connection refused"));
        }
        Ok(StatementResponse::with_state(
            SCRIPTED_STATEMENT_ID,
            StatementState::Running,
        ))
    }

    async fn get_statement(
        &self,
        _config: &ConnectionConfig,
        _handle: &StatementHandle,
    ) -> Result<StatementResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LogSearchError::transport("connection reset by peer"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("h", "t", "w")
    }

    #[tokio::test]
    async fn test_scripted_sequence_then_repeat() {
        let warehouse = ScriptedWarehouse::succeeding(&["n"], vec![vec![json!("1")]])
            .with_states([StatementState::Queued, StatementState::Running]);
        let handle = StatementHandle::new(SCRIPTED_STATEMENT_ID);

        let first = warehouse.submit_statement(&config(), "SELECT 1").await.unwrap();
        assert_eq!(first.state(), Some(StatementState::Queued));
        let second = warehouse.get_statement(&config(), &handle).await.unwrap();
        assert_eq!(second.state(), Some(StatementState::Running));
        let third = warehouse.get_statement(&config(), &handle).await.unwrap();
        assert_eq!(third.state(), Some(StatementState::Running));
        assert!(third.result.is_none());

        assert_eq!(warehouse.submitted_sql(), vec!["SELECT 1".to_string()]);
        assert_eq!(warehouse.submit_count(), 1);
        assert_eq!(warehouse.poll_count(), 2);
    }

    #[tokio::test]
    async fn test_succeeded_carries_data() {
        let warehouse = ScriptedWarehouse::succeeding(&["n"], vec![vec![json!("1")]]);
        let response = warehouse.submit_statement(&config(), "SELECT 1").await.unwrap();
        assert_eq!(response.column_names(), Some(vec!["n".to_string()]));
    }

    #[tokio::test]
    async fn test_without_columns() {
        let warehouse =
            ScriptedWarehouse::succeeding(&["n"], vec![vec![json!("1")]]).without_columns();
        let response = warehouse.submit_statement(&config(), "SELECT 1").await.unwrap();
        assert_eq!(response.column_names(), None);
        assert!(response.result.is_some());
    }

    #[tokio::test]
    async fn test_failing_warehouse() {
        let warehouse = FailingWarehouse::on_submit();
        assert!(warehouse.submit_statement(&config(), "SELECT 1").await.is_err());

        let warehouse = FailingWarehouse::on_poll();
        let response = warehouse.submit_statement(&config(), "SELECT 1").await.unwrap();
        let handle = response.handle().unwrap();
        assert!(warehouse.get_statement(&config(), &handle).await.is_err());
        assert_eq!(warehouse.call_count(), 2);
    }
}

//! Mock database clients for testing.
//!
//! `MockDatabaseClient` returns a canned result and records every statement it
//! is asked to run, so callers can assert on the exact SQL sent to a database.

use super::{DatabaseClient, QueryResult};
use crate::error::{Result, SheetQueryError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Shared view of what a mock client saw. Survives the client being closed.
#[derive(Debug, Clone, Default)]
pub struct MockHandle {
    executed: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl MockHandle {
    /// Returns every statement executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|sql| sql.clone())
            .unwrap_or_default()
    }

    /// Returns true once the client has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, sql: &str) {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }
    }

    fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// A mock database client that returns a predefined result.
#[derive(Debug)]
pub struct MockDatabaseClient {
    result: QueryResult,
    handle: MockHandle,
}

impl MockDatabaseClient {
    /// Creates a mock client that answers every query with `result`.
    pub fn with_result(result: QueryResult) -> Self {
        Self {
            result,
            handle: MockHandle::default(),
        }
    }

    /// Returns a handle for inspecting executed statements.
    pub fn handle(&self) -> MockHandle {
        self.handle.clone()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        self.handle.record(sql);
        Ok(self.result.clone())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.handle.mark_closed();
        Ok(())
    }
}

/// A database client whose queries always fail.
#[derive(Debug)]
pub struct FailingDatabaseClient {
    message: String,
    handle: MockHandle,
}

impl FailingDatabaseClient {
    /// Creates a client that fails every query with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            handle: MockHandle::default(),
        }
    }

    /// Returns a handle for inspecting executed statements.
    pub fn handle(&self) -> MockHandle {
        self.handle.clone()
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        self.handle.record(sql);
        Err(SheetQueryError::query(self.message.clone()))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.handle.mark_closed();
        Ok(())
    }
}

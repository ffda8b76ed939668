//! Database abstraction layer for sheetquery.
//!
//! Provides a trait-based interface for running a single query over a single
//! connection, allowing different database backends to be used interchangeably.

mod mock;
mod postgres;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient, MockHandle};
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::{Result, SheetQueryError};
use async_trait::async_trait;
use url::Url;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend as a string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a URL scheme.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Determines the backend from a connection string.
    pub fn from_connection_string(conn_str: &str) -> Result<Self> {
        let url = Url::parse(conn_str)
            .map_err(|e| SheetQueryError::config(format!("Invalid connection string: {e}")))?;

        Self::parse(url.scheme()).ok_or_else(|| {
            SheetQueryError::config(format!(
                "Unsupported scheme '{}'. Expected 'postgres', 'postgresql' or 'sqlite'",
                url.scheme()
            ))
        })
    }
}

/// Creates a database client for the given configuration.
///
/// This is the central factory function for database connections. The backend
/// is chosen from the connection string's scheme.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    match config.backend()? {
        DatabaseBackend::Postgres => {
            let client = PostgresClient::connect(config).await?;
            Ok(Box::new(client))
        }
        DatabaseBackend::Sqlite => {
            let client = SqliteClient::connect(config).await?;
            Ok(Box::new(client))
        }
    }
}

/// Trait defining the interface for database clients.
///
/// A client owns exactly one connection. `close` consumes the client so the
/// connection cannot be used after it has been released.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Executes a SQL statement verbatim and returns every row it produces.
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(self: Box<Self>) -> Result<()>;
}

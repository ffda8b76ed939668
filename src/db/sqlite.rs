//! SQLite database client implementation.
//!
//! SQLite values carry their own storage class, so conversion follows the
//! runtime type of each value rather than the declared column type.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{Result, SheetQueryError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{
    Column as SqlxColumn, ConnectOptions, Connection, Executor, Row as SqlxRow, Statement,
    TypeInfo, ValueRef,
};
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

/// SQLite database client holding a single connection.
#[derive(Debug)]
pub struct SqliteClient {
    conn: SqliteConnection,
}

impl SqliteClient {
    /// Opens the database file named by the connection string.
    ///
    /// The file must already exist; a typo in the path should not silently
    /// create an empty database.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        debug!("Opening {}", config.display_string());

        let options = SqliteConnectOptions::from_str(config.url())
            .map_err(|e| SheetQueryError::config(format!("Invalid SQLite connection string: {e}")))?
            .create_if_missing(false);

        let conn = options.connect().await.map_err(|e| {
            SheetQueryError::connection(format!("Cannot open {}: {e}", config.display_string()))
        })?;

        Ok(Self { conn })
    }

    async fn fetch_column_metadata(&mut self, sql: &str) -> Vec<ColumnInfo> {
        match (&mut self.conn).prepare(sql).await {
            Ok(statement) => statement
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            Err(e) => {
                debug!("Could not describe empty result set: {e}");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let result: Vec<SqliteRow> = sqlx::query(sql)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| SheetQueryError::query(e.to_string()))?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = if let Some(first_row) = result.first() {
            first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect()
        } else {
            self.fetch_column_metadata(sql).await
        };

        let rows: Vec<Row> = result.iter().map(convert_row).collect();

        Ok(QueryResult::with_data(columns, rows).with_execution_time(execution_time))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| SheetQueryError::connection(format!("Failed to close connection: {e}")))
    }
}

fn convert_row(row: &SqliteRow) -> Row {
    (0..row.len()).map(|i| convert_value(row, i)).collect()
}

/// Converts a single value using its storage class.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(e) => {
            debug!("Cannot read column {index}: {e}");
            return Value::Null;
        }
    };

    match storage_class.as_str() {
        "INTEGER" => row
            .try_get::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),
        "REAL" => row
            .try_get::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

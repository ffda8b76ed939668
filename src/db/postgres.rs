//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! for PostgreSQL databases using sqlx.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{Result, SheetQueryError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::types::{Oid, PgInterval, PgMoney};
use sqlx::postgres::{PgConnection, PgHasArrayType, PgRow, Postgres};
use sqlx::types::{Decimal, JsonValue, Uuid};
use sqlx::{
    Column as SqlxColumn, Connection, Decode, Executor, Row as SqlxRow, Statement, Type,
    TypeInfo, ValueRef,
};
use std::time::Instant;
use tracing::debug;

/// PostgreSQL database client holding a single connection.
#[derive(Debug)]
pub struct PostgresClient {
    conn: PgConnection,
}

impl PostgresClient {
    /// Opens one connection using the configured connection string.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        debug!("Connecting to {}", config.display_string());

        let conn = PgConnection::connect(config.url())
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Successfully connected to database");
        Ok(Self { conn })
    }

    /// Fetches column metadata for a statement that returned no rows.
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
impl DatabaseClient for PostgresClient {
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let result: Vec<PgRow> = sqlx::query(sql)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| SheetQueryError::query(format_query_error(e)))?;

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

        let rows = result
            .iter()
            .map(convert_row)
            .collect::<Result<Vec<Row>>>()?;

        Ok(QueryResult::with_data(columns, rows).with_execution_time(execution_time))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| SheetQueryError::connection(format!("Failed to close connection: {e}")))
    }
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Result<Row> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Decodes a nullable column of a known type.
fn get<'r, T>(row: &'r PgRow, index: usize) -> Result<Option<T>>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(index)
        .map_err(|e| SheetQueryError::query(format!("Cannot decode column {index}: {e}")))
}

/// Decodes an array column into the text of each element.
fn get_array<'r, T>(row: &'r PgRow, index: usize) -> Result<Option<Vec<String>>>
where
    T: for<'a> Decode<'a, Postgres> + Type<Postgres> + PgHasArrayType + ToString,
{
    Ok(get::<Vec<Option<T>>>(row, index)?.map(|items| {
        items
            .iter()
            .map(|item| item.as_ref().map_or_else(|| "NULL".to_string(), T::to_string))
            .collect()
    }))
}

fn unsupported(type_name: &str) -> SheetQueryError {
    SheetQueryError::query(format!(
        "unsupported column type {type_name}; cast it to text in the query"
    ))
}

/// Converts one column of a PgRow using its declared type.
///
/// Dates, times, decimals and other types without a native spreadsheet
/// representation become text. A column of any other type is an error, never
/// a silently empty cell.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Result<Value> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| SheetQueryError::query(format!("Cannot read column {index}: {e}")))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let text = |s: Option<String>| s.map(Value::String);
    let value = match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => get::<bool>(row, index)?.map(Value::Bool),
        "INT2" | "SMALLINT" => get::<i16>(row, index)?.map(|v| Value::Int(v.into())),
        "INT4" | "INT" | "INTEGER" => get::<i32>(row, index)?.map(|v| Value::Int(v.into())),
        "INT8" | "BIGINT" => get::<i64>(row, index)?.map(Value::Int),
        "OID" => get::<Oid>(row, index)?.map(|v| Value::Int(v.0.into())),
        "FLOAT4" | "REAL" => get::<f32>(row, index)?.map(|v| Value::Float(v.into())),
        "FLOAT8" | "DOUBLE PRECISION" => get::<f64>(row, index)?.map(Value::Float),
        "NUMERIC" | "DECIMAL" => text(get::<Decimal>(row, index)?.map(|d| d.to_string())),
        "MONEY" => text(get::<PgMoney>(row, index)?.map(|m| Decimal::new(m.0, 2).to_string())),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" | "CITEXT" | "UNKNOWN" => {
            text(get::<String>(row, index)?)
        }
        "UUID" => text(get::<Uuid>(row, index)?.map(|u| u.to_string())),
        "JSON" | "JSONB" => text(get::<JsonValue>(row, index)?.map(|j| j.to_string())),
        "BYTEA" => get::<Vec<u8>>(row, index)?.map(Value::Bytes),
        "DATE" => text(get::<NaiveDate>(row, index)?.map(|d| d.to_string())),
        "TIME" => text(get::<NaiveTime>(row, index)?.map(|t| t.to_string())),
        "TIMESTAMP" => text(
            get::<NaiveDateTime>(row, index)?.map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string()),
        ),
        "TIMESTAMPTZ" => text(get::<DateTime<Utc>>(row, index)?.map(|d| d.to_rfc3339())),
        "INTERVAL" => text(get::<PgInterval>(row, index)?.map(|i| format_interval(&i))),
        name => match name.strip_suffix("[]") {
            Some(element) => array_value(row, index, element)?
                .map(|items| Value::String(format!("{{{}}}", items.join(",")))),
            None => return Err(unsupported(type_name)),
        },
    };

    Ok(value.unwrap_or(Value::Null))
}

/// Decodes an array whose element type is `element`.
fn array_value(row: &PgRow, index: usize, element: &str) -> Result<Option<Vec<String>>> {
    match element {
        "BOOL" => get_array::<bool>(row, index),
        "INT2" => get_array::<i16>(row, index),
        "INT4" => get_array::<i32>(row, index),
        "INT8" => get_array::<i64>(row, index),
        "FLOAT4" => get_array::<f32>(row, index),
        "FLOAT8" => get_array::<f64>(row, index),
        "NUMERIC" => get_array::<Decimal>(row, index),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => get_array::<String>(row, index),
        "UUID" => get_array::<Uuid>(row, index),
        "DATE" => get_array::<NaiveDate>(row, index),
        _ => Err(unsupported(&format!("{element}[]"))),
    }
}

/// Renders an interval the way PostgreSQL prints it, e.g. `1 year 2 mons 3 days 04:05:06`.
fn format_interval(interval: &PgInterval) -> String {
    fn unit(n: i32, name: &str) -> String {
        if n.abs() == 1 {
            format!("{n} {name}")
        } else {
            format!("{n} {name}s")
        }
    }

    let mut parts = Vec::new();
    let (years, months) = (interval.months / 12, interval.months % 12);
    if years != 0 {
        parts.push(unit(years, "year"));
    }
    if months != 0 {
        parts.push(unit(months, "mon"));
    }
    if interval.days != 0 {
        parts.push(unit(interval.days, "day"));
    }

    if interval.microseconds != 0 || parts.is_empty() {
        let sign = if interval.microseconds < 0 { "-" } else { "" };
        let micros = interval.microseconds.unsigned_abs();
        let secs = micros / 1_000_000;
        let mut time = format!(
            "{sign}{:02}:{:02}:{:02}",
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        let fraction = micros % 1_000_000;
        if fraction != 0 {
            time.push('.');
            time.push_str(format!("{fraction:06}").trim_end_matches('0'));
        }
        parts.push(time);
    }

    parts.join(" ")
}

/// Maps sqlx connection errors to user-friendly messages.
///
/// Messages name the host and database but never the password.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> SheetQueryError {
    let target = config.display_string();
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        SheetQueryError::connection(format!(
            "Cannot connect to {target}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        SheetQueryError::connection(format!(
            "Authentication failed for {target}. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        SheetQueryError::connection(format!("Database does not exist: {target}"))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        SheetQueryError::connection(
            "Server requires SSL. Add '?sslmode=require' to connection string.".to_string(),
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        SheetQueryError::connection(format!(
            "Connection to {target} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        SheetQueryError::connection(format!("{target}: {error}"))
    }
}

/// Formats a query error with hints if available.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }

        if let Some(table) = pg_error.table() {
            result.push_str("\n  TABLE: ");
            result.push_str(table);
        }

        if let Some(column) = pg_error.column() {
            result.push_str("\n  COLUMN: ");
            result.push_str(column);
        }
    }

    result
}

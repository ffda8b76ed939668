//! Spreadsheet-driven query execution.
//!
//! Reads the key column of an input spreadsheet, fills the template's `IN`
//! placeholder, runs the statement over one connection and writes the result
//! set to a new spreadsheet.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::template::QueryStore;
use super::{QuotePolicy, SubstitutionMode};
use crate::config::{Config, ConnectionConfig};
use crate::db::{self, DatabaseClient, QueryResult};
use crate::error::Result;
use crate::sheet::{self, Table};

/// Inputs for one query run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Spreadsheet holding the key values.
    pub input_path: PathBuf,
    /// Header of the key column.
    pub column: String,
    /// Template file name inside the query directory.
    pub query_name: String,
    /// Where the result spreadsheet is written.
    pub output_path: PathBuf,
    /// Column named in the template's `<column> IN ()` placeholder.
    pub in_clause_column: String,
}

/// A statement ready to run, built without touching the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedQuery {
    /// SQL text to execute verbatim.
    pub sql: String,
    /// Whether the placeholder was filled.
    pub substituted: bool,
    /// Number of values in the `IN` list.
    pub value_count: usize,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The statement that was executed.
    pub sql: String,
    /// Whether the placeholder was filled.
    pub substituted: bool,
    /// Number of values in the `IN` list.
    pub value_count: usize,
    /// Rows in the result set.
    pub row_count: usize,
    /// Columns in the result set.
    pub column_count: usize,
    /// Spreadsheet the result was written to.
    pub output_path: PathBuf,
    /// Wall time of the whole run.
    pub elapsed: Duration,
}

/// Runs spreadsheet-parameterized queries.
#[derive(Debug, Clone)]
pub struct QueryRunner {
    store: QueryStore,
    mode: SubstitutionMode,
    quotes: QuotePolicy,
}

impl QueryRunner {
    /// Creates a runner over `store` with default substitution settings.
    pub fn new(store: QueryStore) -> Self {
        Self {
            store,
            mode: SubstitutionMode::default(),
            quotes: QuotePolicy::default(),
        }
    }

    /// Creates a runner from the configured query directory and settings.
    pub fn from_config(config: &Config) -> Self {
        Self::new(QueryStore::new(config.query_dir.clone()))
            .with_mode(config.substitution.mode)
            .with_quote_policy(config.substitution.quotes)
    }

    /// Sets the substitution mode.
    pub fn with_mode(mut self, mode: SubstitutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the quote policy.
    pub fn with_quote_policy(mut self, quotes: QuotePolicy) -> Self {
        self.quotes = quotes;
        self
    }

    /// Loads the key values and builds the statement.
    ///
    /// The key column is validated before the template is read, and nothing
    /// here opens a database connection.
    pub fn prepare(&self, request: &QueryRequest) -> Result<PreparedQuery> {
        let input = sheet::read_table(&request.input_path)?;
        let values = input.non_empty_values(&request.column)?;
        debug!(
            "Column '{}' has {} non-empty values",
            request.column,
            values.len()
        );

        let template = self.store.load(&request.query_name)?;
        let substitution = template.substitute(
            &request.in_clause_column,
            values.as_slice(),
            self.mode,
            self.quotes,
        )?;

        Ok(PreparedQuery {
            sql: substitution.sql,
            substituted: substitution.substituted,
            value_count: values.len(),
        })
    }

    /// Runs the full pipeline against the configured database.
    pub async fn run(
        &self,
        request: &QueryRequest,
        connection: &ConnectionConfig,
    ) -> Result<RunSummary> {
        let start = Instant::now();
        let prepared = self.prepare(request)?;

        info!("Connecting to {}", connection.display_string());
        let client = db::connect(connection).await?;

        self.finish(prepared, client, &request.output_path, start)
            .await
    }

    /// Runs the full pipeline with an already-open client.
    ///
    /// The client is closed on every path, including when preparation fails.
    pub async fn run_with_client(
        &self,
        request: &QueryRequest,
        client: Box<dyn DatabaseClient>,
    ) -> Result<RunSummary> {
        let start = Instant::now();
        let prepared = match self.prepare(request) {
            Ok(prepared) => prepared,
            Err(e) => {
                close_client(client).await;
                return Err(e);
            }
        };

        self.finish(prepared, client, &request.output_path, start)
            .await
    }

    async fn finish(
        &self,
        prepared: PreparedQuery,
        client: Box<dyn DatabaseClient>,
        output_path: &Path,
        start: Instant,
    ) -> Result<RunSummary> {
        let result = execute_and_close(client, &prepared.sql).await?;
        info!(
            "Query returned {} rows in {:?}",
            result.row_count, result.execution_time
        );

        let table = Table::from(result);
        sheet::write_table(&table, output_path)?;

        Ok(RunSummary {
            sql: prepared.sql,
            substituted: prepared.substituted,
            value_count: prepared.value_count,
            row_count: table.row_count(),
            column_count: table.column_count(),
            output_path: output_path.to_path_buf(),
            elapsed: start.elapsed(),
        })
    }
}

/// Executes `sql` and releases the connection whether or not it succeeded.
async fn execute_and_close(
    mut client: Box<dyn DatabaseClient>,
    sql: &str,
) -> Result<QueryResult> {
    debug!("Executing: {sql}");
    let result = client.execute_query(sql).await;
    close_client(client).await;
    result
}

async fn close_client(client: Box<dyn DatabaseClient>) {
    if let Err(e) = client.close().await {
        warn!("{e}");
    }
}

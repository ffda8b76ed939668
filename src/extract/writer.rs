//! Extract file engine.
//!
//! An extract is a single-file SQLite database holding one table whose
//! columns are all `TEXT`. Opening an extract always starts from an empty
//! file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection};
use tracing::debug;

use crate::db::Row;
use crate::error::{Result, SheetQueryError};

/// Files SQLite may leave next to a database.
const SIDECAR_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

/// An open extract file.
#[derive(Debug)]
pub struct ExtractWriter {
    conn: SqliteConnection,
    path: PathBuf,
}

impl ExtractWriter {
    /// Creates a fresh extract at `path`, destroying any existing file there.
    pub async fn create_or_replace(path: &Path) -> Result<Self> {
        ensure_parent_dirs(path)?;
        remove_existing(path)?;

        // The path is handed over as a filename, never parsed as a URL.
        let conn = SqliteConnectOptions::new()
            .filename(path)
            .journal_mode(SqliteJournalMode::Delete)
            .create_if_missing(true)
            .connect()
            .await
            .map_err(|e| {
                SheetQueryError::extract(format!("Failed to create {}: {e}", path.display()))
            })?;

        debug!("Created extract file {}", path.display());
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Returns the extract file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates `table` with one `TEXT` column per name, in order.
    pub async fn create_table(&mut self, table: &str, columns: &[String]) -> Result<()> {
        validate_columns(columns)?;

        let sql = create_table_statement(table, columns);
        debug!("{sql}");
        sqlx::query(&sql)
            .execute(&mut self.conn)
            .await
            .map_err(|e| SheetQueryError::extract(format!("Failed to create table: {e}")))?;
        Ok(())
    }

    /// Inserts `rows` into `table` in one transaction, preserving order.
    ///
    /// Empty cells are stored as NULL, everything else as text.
    pub async fn insert_rows(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Row],
    ) -> Result<u64> {
        let sql = insert_statement(table, columns);
        let mut tx = self
            .conn
            .begin()
            .await
            .map_err(|e| SheetQueryError::extract(format!("Failed to begin transaction: {e}")))?;

        let mut inserted = 0;
        for (index, row) in rows.iter().enumerate() {
            let mut query = sqlx::query(&sql);
            for cell in row.iter().take(columns.len()) {
                query = query.bind(cell.as_text());
            }
            for _ in row.len()..columns.len() {
                query = query.bind(None::<String>);
            }

            inserted += query
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    SheetQueryError::extract(format!("Failed to insert row {}: {e}", index + 1))
                })?
                .rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| SheetQueryError::extract(format!("Failed to commit rows: {e}")))?;

        Ok(inserted)
    }

    /// Closes the extract file.
    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| SheetQueryError::extract(format!("Failed to close extract: {e}")))
    }
}

/// Quotes an identifier for SQLite.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Builds `CREATE TABLE "t" ("a" TEXT, ...)`.
pub fn create_table_statement(table: &str, columns: &[String]) -> String {
    let defs: Vec<String> = columns
        .iter()
        .map(|c| format!("{} TEXT", quote_identifier(c)))
        .collect();
    format!("CREATE TABLE {} ({})", quote_identifier(table), defs.join(", "))
}

/// Builds `INSERT INTO "t" ("a", ...) VALUES (?, ...)` sized to the columns.
pub fn insert_statement(table: &str, columns: &[String]) -> String {
    let names: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
    let params = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        names.join(", "),
        params
    )
}

/// Rejects column lists SQLite cannot turn into a table.
fn validate_columns(columns: &[String]) -> Result<()> {
    if columns.is_empty() {
        return Err(SheetQueryError::extract("Source has no columns"));
    }

    // SQLite column names are case-insensitive.
    let mut seen = HashSet::new();
    for column in columns {
        if column.is_empty() {
            return Err(SheetQueryError::extract("Column names must not be empty"));
        }
        if !seen.insert(column.to_lowercase()) {
            return Err(SheetQueryError::extract(format!(
                "Duplicate column name: {column}"
            )));
        }
    }
    Ok(())
}

fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            SheetQueryError::extract(format!(
                "Failed to create directory {}: {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Deletes an existing extract and its SQLite sidecar files.
fn remove_existing(path: &Path) -> Result<()> {
    let mut targets = vec![path.to_path_buf()];
    for suffix in SIDECAR_SUFFIXES {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        targets.push(PathBuf::from(name));
    }

    for target in targets.iter().filter(|t| t.exists()) {
        std::fs::remove_file(target).map_err(|e| {
            SheetQueryError::extract(format!("Failed to replace {}: {e}", target.display()))
        })?;
        debug!("Removed {}", target.display());
    }
    Ok(())
}

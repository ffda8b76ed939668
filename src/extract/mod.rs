//! Spreadsheet to extract file export.
//!
//! Materializes a spreadsheet as an extract file with a single table named
//! `Extract`. Every column is stored as text; nothing is inferred.

mod writer;

pub use writer::ExtractWriter;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::sheet::{self, Table};

/// Name of the table every extract contains.
pub const EXTRACT_TABLE: &str = "Extract";

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    /// The extract file written.
    pub output_path: PathBuf,
    /// Number of columns in `Extract`.
    pub column_count: usize,
    /// Number of rows inserted.
    pub row_count: u64,
}

/// Converts spreadsheets to extract files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractExporter;

impl ExtractExporter {
    /// Creates an exporter.
    pub fn new() -> Self {
        Self
    }

    /// Reads `source` and writes it to a fresh extract at `output`.
    pub async fn run(&self, source: &Path, output: &Path) -> Result<ExtractSummary> {
        let table = sheet::read_table(source)?;
        info!(
            "Exporting {} rows x {} columns from {}",
            table.row_count(),
            table.column_count(),
            source.display()
        );
        self.export_table(&table, output).await
    }

    /// Writes `table` to a fresh extract at `output`.
    ///
    /// The extract file is closed whether or not population succeeds.
    pub async fn export_table(&self, table: &Table, output: &Path) -> Result<ExtractSummary> {
        let mut writer = ExtractWriter::create_or_replace(output).await?;

        let populated = populate(&mut writer, table).await;
        let closed = writer.close().await;

        let row_count = populated?;
        closed?;

        Ok(ExtractSummary {
            output_path: output.to_path_buf(),
            column_count: table.column_count(),
            row_count,
        })
    }
}

async fn populate(writer: &mut ExtractWriter, table: &Table) -> Result<u64> {
    writer.create_table(EXTRACT_TABLE, &table.columns).await?;
    writer
        .insert_rows(EXTRACT_TABLE, &table.columns, &table.rows)
        .await
}

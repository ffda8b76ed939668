//! Spreadsheet import/export.
//!
//! A spreadsheet is handled as a `Table`: an ordered list of column names and
//! the rows below the header, loaded fully into memory.

mod reader;
mod writer;

pub use reader::read_table;
pub use writer::write_table;

use crate::db::{QueryResult, Row, Value};
use crate::error::{Result, SheetQueryError};

/// An in-memory table with named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names in sheet order.
    pub columns: Vec<String>,
    /// Data rows. Every row has exactly `columns.len()` cells.
    pub rows: Vec<Row>,
}

impl Table {
    /// Creates a table, padding or truncating rows to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Returns the position of the named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns the text of every non-empty cell in the named column, in row
    /// order, duplicates included.
    ///
    /// Fails if the column is absent or has no non-empty cells.
    pub fn non_empty_values(&self, name: &str) -> Result<Vec<String>> {
        let index = self
            .column_index(name)
            .ok_or_else(|| SheetQueryError::missing_column(name))?;

        let values: Vec<String> = self
            .rows
            .iter()
            .filter_map(|row| row.get(index).and_then(Value::as_text))
            .collect();

        if values.is_empty() {
            return Err(SheetQueryError::empty_column(name));
        }

        Ok(values)
    }

    /// Returns the number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

impl From<QueryResult> for Table {
    fn from(result: QueryResult) -> Self {
        let columns = result.column_names();
        Table::new(columns, result.rows)
    }
}

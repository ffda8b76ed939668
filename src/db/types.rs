//! Query result types for sheetquery.
//!
//! Defines the structures used to represent query results from the database.
//! `Value` doubles as the cell type of in-memory spreadsheet tables.

use std::fmt;
use std::time::Duration;

/// Rows and column metadata returned by one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Column metadata for the result set, in driver order.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data.
    pub rows: Vec<Row>,

    /// Time taken to execute the query.
    pub execution_time: Duration,

    /// Number of rows in the result.
    pub row_count: usize,
}

impl QueryResult {
    /// Creates a query result with the given columns and rows.
    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            execution_time: Duration::ZERO,
            row_count,
        }
    }

    /// Sets the execution time.
    pub fn with_execution_time(mut self, duration: Duration) -> Self {
        self.execution_time = duration;
        self
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the column names in result order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type as reported by the driver.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// A single value from a database query or spreadsheet cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// SQL NULL, or a blank cell.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Whole number. Spreadsheet floats with no fraction land here too.
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text/string value.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true for NULL and for the empty string, the two shapes an
    /// empty spreadsheet cell takes.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Returns the text form of a non-empty value.
    pub fn as_text(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_display_string())
        }
    }

    /// Converts the value to a string representation.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

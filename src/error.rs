//! Error types for sheetquery.
//!
//! Defines the main error enum used throughout the application. Messages for
//! the spreadsheet and query-file failures keep the wording operators already
//! see in the quiet-mode output.

use thiserror::Error;

/// Main error type for sheetquery operations.
#[derive(Error, Debug)]
pub enum SheetQueryError {
    /// The key column is not one of the input spreadsheet's headers.
    #[error("Column '{column}' not found in the Excel sheet.")]
    MissingColumn { column: String },

    /// The key column has no values left after dropping empty cells.
    #[error("The column '{column}' is empty.")]
    EmptyColumn { column: String },

    /// The named query template does not exist in the query directory.
    #[error("Query file '{name}' not found in '{dir}'.")]
    QueryFileNotFound { name: String, dir: String },

    /// Strict substitution found no `<column> IN ()` placeholder.
    #[error("Placeholder '{pattern}' not found in query file '{query}'.")]
    PatternNotFound { pattern: String, query: String },

    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, missing tables, etc.)
    #[error("Query error: {0}")]
    QueryExecution(String),

    /// The input spreadsheet could not be opened or parsed.
    #[error("Spreadsheet read error: {0}")]
    SpreadsheetRead(String),

    /// The output spreadsheet could not be written.
    #[error("Spreadsheet write error: {0}")]
    SpreadsheetWrite(String),

    /// Extract file creation or population failed.
    #[error("Extract error: {0}")]
    ExtractEngine(String),

    /// Configuration errors (invalid config file, bad connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other filesystem errors.
    #[error("I/O error: {0}")]
    Io(String),
}

impl SheetQueryError {
    /// Creates a missing column error.
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    /// Creates an empty column error.
    pub fn empty_column(column: impl Into<String>) -> Self {
        Self::EmptyColumn {
            column: column.into(),
        }
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query execution error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryExecution(msg.into())
    }

    /// Creates a spreadsheet read error with the given message.
    pub fn sheet_read(msg: impl Into<String>) -> Self {
        Self::SpreadsheetRead(msg.into())
    }

    /// Creates a spreadsheet write error with the given message.
    pub fn sheet_write(msg: impl Into<String>) -> Self {
        Self::SpreadsheetWrite(msg.into())
    }

    /// Creates an extract engine error with the given message.
    pub fn extract(msg: impl Into<String>) -> Self {
        Self::ExtractEngine(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an I/O error with the given message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingColumn { .. } => "Missing Column",
            Self::EmptyColumn { .. } => "Empty Column",
            Self::QueryFileNotFound { .. } => "Query File Not Found",
            Self::PatternNotFound { .. } => "Placeholder Not Found",
            Self::Connection(_) => "Connection Error",
            Self::QueryExecution(_) => "Query Error",
            Self::SpreadsheetRead(_) => "Spreadsheet Read Error",
            Self::SpreadsheetWrite(_) => "Spreadsheet Write Error",
            Self::ExtractEngine(_) => "Extract Error",
            Self::Config(_) => "Configuration Error",
            Self::Io(_) => "I/O Error",
        }
    }
}

/// Result type alias using SheetQueryError.
pub type Result<T> = std::result::Result<T, SheetQueryError>;

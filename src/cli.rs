//! Command-line argument parsing for sheetquery.
//!
//! Uses clap to parse the `query` and `extract` subcommands and the global
//! logging and config flags.

use crate::config::Config;
use crate::error::{Result, SheetQueryError};
use crate::query::{QueryRequest, QuotePolicy, SubstitutionMode};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Run spreadsheet-driven SQL queries and export the results.
#[derive(Parser, Debug)]
#[command(name = "sheetquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true, value_name = "PATH", env = "SHEETQUERY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print failures to stdout and exit successfully
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a query template filled with values from a spreadsheet column
    Query(QueryArgs),
    /// Convert a spreadsheet into an extract file
    Extract(ExtractArgs),
}

/// Arguments for `sheetquery query`.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Spreadsheet holding the key values
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Header of the key column
    #[arg(short, long, value_name = "NAME")]
    pub column: String,

    /// Query template file name inside the query directory
    #[arg(long, value_name = "NAME")]
    pub query: String,

    /// Result spreadsheet to write
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Column named in the template's `<column> IN ()` placeholder [default: --column]
    #[arg(long, value_name = "NAME")]
    pub in_column: Option<String>,

    /// Database connection string (postgres://... or sqlite://...)
    #[arg(long, value_name = "URL", conflicts_with = "connection")]
    pub db_url: Option<String>,

    /// Use named connection from config
    #[arg(long, value_name = "NAME")]
    pub connection: Option<String>,

    /// Directory holding query templates
    #[arg(long, value_name = "DIR")]
    pub query_dir: Option<PathBuf>,

    /// Fail when the template has no placeholder instead of running it unchanged
    #[arg(long)]
    pub strict: bool,

    /// Insert values without escaping single quotes
    #[arg(long)]
    pub verbatim_quotes: bool,

    /// Also export the result spreadsheet to this extract file
    #[arg(long, value_name = "FILE")]
    pub extract: Option<PathBuf>,
}

/// Arguments for `sheetquery extract`.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Spreadsheet to convert
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Extract file to create or replace
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }
}

impl QueryArgs {
    /// Returns the placeholder column, defaulting to the key column.
    pub fn in_clause_column(&self) -> &str {
        self.in_column.as_deref().unwrap_or(&self.column)
    }

    /// Rejects blank column names, which would match every template.
    pub fn validate(&self) -> Result<()> {
        if self.column.trim().is_empty() {
            return Err(SheetQueryError::config("--column must not be empty"));
        }
        if self.in_clause_column().trim().is_empty() {
            return Err(SheetQueryError::config("--in-column must not be empty"));
        }
        if self.query.trim().is_empty() {
            return Err(SheetQueryError::config("--query must not be empty"));
        }
        Ok(())
    }

    /// Applies command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.query_dir {
            config.query_dir = dir.clone();
        }
        if self.strict {
            config.substitution.mode = SubstitutionMode::Strict;
        }
        if self.verbatim_quotes {
            config.substitution.quotes = QuotePolicy::Verbatim;
        }
    }

    /// Builds the runner request.
    pub fn to_request(&self) -> QueryRequest {
        QueryRequest {
            input_path: self.input.clone(),
            column: self.column.clone(),
            query_name: self.query.clone(),
            output_path: self.output.clone(),
            in_clause_column: self.in_clause_column().to_string(),
        }
    }
}

/// Formats an error the way quiet mode prints it.
pub fn quiet_message(error: &SheetQueryError) -> String {
    match error {
        SheetQueryError::ExtractEngine(msg) => format!("Error creating extract file: {msg}"),
        _ => format!("An error occurred: {error}"),
    }
}

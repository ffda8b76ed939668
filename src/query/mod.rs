//! Query templates and spreadsheet-driven query execution.
//!
//! This module isolates template lookup, `IN` list substitution and the
//! run pipeline from the command-line layer.

pub mod in_clause;
pub mod runner;
pub mod template;

pub use in_clause::{QuotePolicy, SubstitutionMode};
pub use runner::{PreparedQuery, QueryRequest, QueryRunner, RunSummary};
pub use template::{QueryStore, QueryTemplate, Substitution};

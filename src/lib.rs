//! sheetquery - spreadsheet-driven SQL queries with spreadsheet and extract export.
//!
//! This library exposes the core modules for the binary and for integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod logging;
pub mod query;
pub mod sheet;

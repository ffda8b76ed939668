//! Integration tests for sheetquery.

pub mod common;
pub mod extract_test;
pub mod pipeline_test;
pub mod postgres_test;

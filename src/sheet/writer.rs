//! Write a `Table` to an xlsx file with a bold header row.

use std::path::Path;

use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet, XlsxError};
use tracing::debug;

use super::Table;
use crate::db::Value;
use crate::error::{Result, SheetQueryError};

/// Largest magnitude an xlsx number cell (an f64) holds exactly.
const MAX_EXACT_INT: u64 = 1 << 53;

/// Write `table` to `path`, replacing any existing file.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    fill_worksheet(worksheet, table)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            SheetQueryError::sheet_write(format!("Failed to create {}: {e}", parent.display()))
        })?;
    }

    workbook.save(path).map_err(|e| {
        SheetQueryError::sheet_write(format!("Failed to save {}: {e}", path.display()))
    })?;

    debug!(
        "Wrote {} rows x {} columns to {}",
        table.row_count(),
        table.column_count(),
        path.display()
    );
    Ok(())
}

fn fill_worksheet(worksheet: &mut Worksheet, table: &Table) -> Result<()> {
    let header_format = Format::new().set_bold();

    for (col, name) in table.columns.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col_num(col)?, name, &header_format)
            .map_err(write_error)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = row_num(row_idx + 1)?;
        for (col, value) in row.iter().enumerate() {
            write_value(worksheet, row_num, col_num(col)?, value).map_err(write_error)?;
        }
    }

    Ok(())
}

fn write_value(
    ws: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    value: &Value,
) -> std::result::Result<(), XlsxError> {
    match value {
        Value::Null => { /* Leave cell empty */ }
        Value::Bool(b) => {
            ws.write_boolean(row, col, *b)?;
        }
        // Larger integers would be rounded by the f64 cell, so keep their digits as text.
        Value::Int(i) if i.unsigned_abs() > MAX_EXACT_INT => {
            ws.write_string(row, col, i.to_string())?;
        }
        Value::Int(i) => {
            ws.write_number(row, col, *i as f64)?;
        }
        Value::Float(f) => {
            ws.write_number(row, col, *f)?;
        }
        Value::String(s) => {
            ws.write_string(row, col, s)?;
        }
        Value::Bytes(_) => {
            ws.write_string(row, col, value.to_display_string())?;
        }
    }
    Ok(())
}

fn row_num(index: usize) -> Result<RowNum> {
    RowNum::try_from(index)
        .map_err(|_| SheetQueryError::sheet_write(format!("Row {index} is out of range")))
}

fn col_num(index: usize) -> Result<ColNum> {
    ColNum::try_from(index)
        .map_err(|_| SheetQueryError::sheet_write(format!("Column {index} is out of range")))
}

fn write_error(error: impl std::fmt::Display) -> SheetQueryError {
    SheetQueryError::sheet_write(error.to_string())
}

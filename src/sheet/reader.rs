//! Read the first worksheet of a workbook into a `Table`.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use tracing::debug;

use super::Table;
use crate::db::{Row, Value};
use crate::error::{Result, SheetQueryError};

/// Read a workbook's first sheet. The first row is the header.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        SheetQueryError::sheet_read(format!("Failed to open {}: {e}", path.display()))
    })?;

    let sheet_name = workbook.sheet_names().first().cloned().ok_or_else(|| {
        SheetQueryError::sheet_read(format!("{} contains no worksheets", path.display()))
    })?;

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        SheetQueryError::sheet_read(format!("Failed to read sheet '{sheet_name}': {e}"))
    })?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        debug!("Sheet '{sheet_name}' is empty");
        return Ok(Table::default());
    };

    let columns = header_names(header);
    let data: Vec<Row> = rows
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    debug!(
        "Read {} rows x {} columns from '{sheet_name}'",
        data.len(),
        columns.len()
    );

    Ok(Table::new(columns, data))
}

/// Builds column names from the header row.
///
/// Blank headers become `Unnamed: <index>` and repeated names get a `.N`
/// suffix, so every column stays addressable by name.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let base = convert_cell(cell)
                .as_text()
                .unwrap_or_else(|| format!("Unnamed: {i}"));

            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

fn convert_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) => float_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_string(dt.as_f64())
            .map(Value::String)
            .unwrap_or(Value::Float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
    }
}

/// Spreadsheets store every number as a float; whole numbers read back as
/// integers so `101` stays `101` rather than `101.0`.
fn float_value(f: f64) -> Value {
    // 2^53, the last integer an f64 represents exactly.
    if f.fract() == 0.0 && f.abs() <= 9_007_199_254_740_992.0 {
        Value::Int(f as i64)
    } else {
        Value::Float(f)
    }
}

/// Converts an Excel serial date (1900 system) to `YYYY-MM-DD HH:MM:SS`.
fn excel_serial_to_string(serial: f64) -> Option<String> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let datetime = epoch.checked_add_signed(Duration::milliseconds(millis))?;

    Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
}

//! Raw tabular readers: CSV text, spreadsheet files, JSON records
//!
//! Each reader produces a [`Frame`] with the source's raw headers; the
//! ingestion pipeline owns normalization, classification, validation and
//! cleaning so every source goes through the identical path.

use calamine::{open_workbook_auto, DataType as Cell, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::path::Path;

use crate::error::{Error, Result};
use crate::frame::{Frame, Value};

/// Parse decoded CSV text into a frame. Cells stay strings (empty cells
/// become null); type coercion is the cleaning pass's job so its outcome
/// can be reported.
pub fn read_csv(text: &str, delimiter: u8) -> Result<Frame> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::DataFormat(format!("unreadable CSV header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(Error::DataFormat("input has no usable header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::DataFormat(format!("malformed CSV row: {e}")))?;
        rows.push(record.iter().map(cell_from_str).collect());
    }

    Ok(Frame::new(headers, rows))
}

fn cell_from_str(raw: &str) -> Value {
    if raw.trim().is_empty() {
        Value::Null
    } else {
        Value::Str(raw.to_string())
    }
}

/// Read the first worksheet of an XLS/XLSX/ODS file. The first row is the
/// header; spreadsheet-native types carry through (numbers, booleans,
/// serial dates).
pub fn read_workbook(path: &Path) -> Result<Frame> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::DataFormat(format!("unreadable workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::DataFormat("workbook has no sheets".to_string()))?
        .map_err(|e| Error::DataFormat(format!("unreadable worksheet: {e}")))?;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = rows_iter
        .next()
        .ok_or_else(|| Error::DataFormat("worksheet is empty".to_string()))?
        .iter()
        .map(|c| c.to_string())
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(Error::DataFormat("worksheet has no usable header row".to_string()));
    }

    let rows = rows_iter
        .map(|row| row.iter().map(cell_from_sheet).collect())
        .collect();

    Ok(Frame::new(headers, rows))
}

fn cell_from_sheet(cell: &Cell) -> Value {
    match cell {
        Cell::Empty => Value::Null,
        Cell::String(s) if s.trim().is_empty() => Value::Null,
        Cell::String(s) => Value::Str(s.clone()),
        Cell::Float(f) => Value::Num(*f),
        Cell::Int(i) => Value::Num(*i as f64),
        Cell::Bool(b) => Value::Bool(*b),
        Cell::DateTime(serial) => excel_serial_to_datetime(*serial)
            .map(Value::Date)
            .unwrap_or(Value::Null),
        Cell::Error(_) => Value::Null,
        other => Value::Str(other.to_string()),
    }
}

/// Excel serial day number to a datetime. Day 0 is 1899-12-30 (the 1900
/// leap-year bug is baked into the epoch choice).
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let whole_days = serial.trunc() as i64;
    let day_fraction = serial.fract();
    let secs = (day_fraction * 86_400.0).round() as i64;
    epoch
        .checked_add_signed(Duration::days(whole_days))?
        .checked_add_signed(Duration::seconds(secs))
}

/// Build a frame from API-sourced JSON records (one object per row).
///
/// The column set is the union of all keys, in first-seen order, so ragged
/// connector payloads still produce a stable frame.
pub fn read_json_records(records: &[serde_json::Value]) -> Result<Frame> {
    if records.is_empty() {
        return Err(Error::DataFormat("no records supplied".to_string()));
    }

    let mut columns: Vec<String> = Vec::new();
    for (i, record) in records.iter().enumerate() {
        let obj = record
            .as_object()
            .ok_or_else(|| Error::DataFormat(format!("record {i} is not an object")))?;
        for key in obj.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .map(|record| {
            let obj = record.as_object().expect("validated above");
            columns
                .iter()
                .map(|col| obj.get(col).map_or(Value::Null, cell_from_json))
                .collect()
        })
        .collect();

    Ok(Frame::new(columns, rows))
}

fn cell_from_json(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Num),
        serde_json::Value::String(s) if s.trim().is_empty() => Value::Null,
        serde_json::Value::String(s) => Value::Str(s.clone()),
        // Nested structures have no tabular meaning; keep their text form
        other => Value::Str(other.to_string()),
    }
}

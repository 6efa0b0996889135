//! Workbook decoding using calamine.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use serde_json::{Map, Number, Value};

use super::record::{normalize_headers, RowRecord};
use super::SourceError;

/// Open the workbook at `path` and decode `sheet` into row records.
pub(crate) fn read_sheet(path: &Path, sheet: &str) -> Result<Vec<RowRecord>, SourceError> {
  if !path.exists() {
    return Err(SourceError::Unreadable(format!(
      "{}: file not found",
      path.display()
    )));
  }

  let mut workbook = open_workbook_auto(path)
    .map_err(|e| SourceError::Unreadable(format!("{}: {}", path.display(), e)))?;

  if !workbook.sheet_names().iter().any(|name| name == sheet) {
    return Err(SourceError::SheetNotFound(sheet.to_string()));
  }

  let range = workbook
    .worksheet_range(sheet)
    .map_err(|e| SourceError::Unreadable(format!("{}: {}", sheet, e)))?;

  decode_range(sheet, &range)
}

/// Decode a sheet range: first row is the header, the rest are records.
fn decode_range(sheet: &str, range: &Range<Data>) -> Result<Vec<RowRecord>, SourceError> {
  let mut rows = range.rows();

  let header = match rows.next() {
    Some(header) => normalize_headers(header.iter().map(cell_to_header)),
    None => return Err(SourceError::SheetNotFound(sheet.to_string())),
  };

  let mut raw_rows = 0usize;
  let mut records = Vec::new();

  for row in rows {
    raw_rows += 1;
    let values: Vec<Value> = (0..header.len())
      .map(|index| row.get(index).map(cell_to_value).unwrap_or(Value::Null))
      .collect();
    if values.iter().all(Value::is_null) {
      continue;
    }

    let fields: Map<String, Value> = header.iter().cloned().zip(values).collect();
    records.push(RowRecord::new(fields));
  }

  if raw_rows == 0 {
    return Err(SourceError::SheetNotFound(sheet.to_string()));
  }

  if records.is_empty() {
    return Err(SourceError::MalformedData(format!(
      "sheet '{}' has {} rows but none could be decoded",
      sheet, raw_rows
    )));
  }

  Ok(records)
}

fn cell_to_header(cell: &Data) -> String {
  match cell_to_value(cell) {
    Value::Null => String::new(),
    Value::String(s) => s,
    other => other.to_string(),
  }
}

/// Convert a calamine cell to a JSON scalar.
fn cell_to_value(cell: &Data) -> Value {
  match cell {
    Data::Empty | Data::Error(_) => Value::Null,
    Data::String(s) if s.is_empty() => Value::Null,
    Data::String(s) => Value::String(s.clone()),
    Data::Bool(b) => Value::Bool(*b),
    Data::Int(i) => Value::Number((*i).into()),
    Data::Float(f) => float_to_value(*f),
    Data::DateTime(dt) => match dt.as_datetime() {
      Some(naive) => Value::String(naive.format("%Y-%m-%dT%H:%M:%S").to_string()),
      None => float_to_value(dt.as_f64()),
    },
    Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
  }
}

/// Whole floats become integers (sheet numbers are stored as floats).
fn float_to_value(f: f64) -> Value {
  if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
    return Value::Number((f as i64).into());
  }
  Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

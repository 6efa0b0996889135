//! Schema-less row records decoded from a sheet.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One spreadsheet row as an ordered column -> value mapping.
///
/// Column order follows the sheet header. Values are JSON scalars
/// (`null`, bool, number or string).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowRecord(Map<String, Value>);

impl RowRecord {
  pub fn new(fields: Map<String, Value>) -> Self {
    Self(fields)
  }

  #[cfg(test)]
  pub fn get(&self, column: &str) -> Option<&Value> {
    self.0.get(column)
  }
}

/// Build unique column names from a raw header row.
///
/// Blank cells become `Unnamed: <index>`; repeated names get a `.<n>` suffix.
/// Other header text is kept verbatim, surrounding whitespace included.
pub fn normalize_headers<I, S>(raw: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut names: Vec<String> = Vec::new();

  for (index, cell) in raw.into_iter().enumerate() {
    let raw = cell.as_ref();
    let base = if raw.trim().is_empty() {
      format!("Unnamed: {}", index)
    } else {
      raw.to_string()
    };

    let mut candidate = base.clone();
    let mut suffix = 0;
    while names.contains(&candidate) {
      suffix += 1;
      candidate = format!("{}.{}", base, suffix);
    }
    names.push(candidate);
  }

  names
}

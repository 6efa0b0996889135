//! Minimal OOXML workbooks for tests.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

#[derive(Debug, Clone)]
pub enum Cell {
  Empty,
  Text(String),
  Number(f64),
  Error,
}

impl Cell {
  pub fn text(s: &str) -> Self {
    Cell::Text(s.to_string())
  }

  pub fn number(n: f64) -> Self {
    Cell::Number(n)
  }
}

/// Write an `.xlsx` file with the given sheets (name, rows).
pub fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<Cell>>)]) {
  let file = File::create(path).unwrap();
  let mut zip = ZipWriter::new(file);
  let options = SimpleFileOptions::default();

  let mut overrides = String::new();
  let mut sheet_entries = String::new();
  let mut rels = String::new();
  for (index, (name, _)) in sheets.iter().enumerate() {
    let n = index + 1;
    overrides.push_str(&format!(
      r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
    ));
    sheet_entries.push_str(&format!(
      r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
      escape(name)
    ));
    rels.push_str(&format!(
      r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
    ));
  }

  let parts = [
    (
      "[Content_Types].xml".to_string(),
      format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{overrides}</Types>"#
      ),
    ),
    (
      "_rels/.rels".to_string(),
      r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_string(),
    ),
    (
      "xl/workbook.xml".to_string(),
      format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheet_entries}</sheets></workbook>"#
      ),
    ),
    (
      "xl/_rels/workbook.xml.rels".to_string(),
      format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
      ),
    ),
  ];

  for (name, body) in parts.iter() {
    zip.start_file(name.as_str(), options).unwrap();
    zip.write_all(body.as_bytes()).unwrap();
  }

  for (index, (_, rows)) in sheets.iter().enumerate() {
    zip
      .start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options)
      .unwrap();
    zip.write_all(sheet_xml(rows).as_bytes()).unwrap();
  }

  zip.finish().unwrap();
}

fn sheet_xml(rows: &[Vec<Cell>]) -> String {
  let mut data = String::new();
  for (r, row) in rows.iter().enumerate() {
    let row_number = r + 1;
    data.push_str(&format!(r#"<row r="{row_number}">"#));
    for (c, cell) in row.iter().enumerate() {
      let reference = format!("{}{}", column_letter(c), row_number);
      match cell {
        Cell::Empty => {}
        Cell::Text(s) => data.push_str(&format!(
          r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#,
          escape(s)
        )),
        Cell::Number(n) => data.push_str(&format!(r#"<c r="{reference}"><v>{n}</v></c>"#)),
        Cell::Error => data.push_str(&format!(r#"<c r="{reference}" t="e"><v>#N/A</v></c>"#)),
      }
    }
    data.push_str("</row>");
  }

  format!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{data}</sheetData></worksheet>"#
  )
}

fn column_letter(index: usize) -> String {
  let mut index = index + 1;
  let mut letters = Vec::new();
  while index > 0 {
    let rem = (index - 1) % 26;
    letters.push((b'A' + rem as u8) as char);
    index = (index - 1) / 26;
  }
  letters.iter().rev().collect()
}

fn escape(s: &str) -> String {
  s.replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
}

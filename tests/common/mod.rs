#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use supplier_ingest::BulkSink;
use supplier_ingest::error::SinkError;
use supplier_ingest::parser::column_letters;
use supplier_ingest::record::{Field, FieldKind, SupplierRecord};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// One `<c>` element of a test worksheet.
#[derive(Debug, Clone)]
pub enum Cell {
    Literal(String),
    Shared(String),
    Inline(String),
}

impl Cell {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn shared(index: impl ToString) -> Self {
        Self::Shared(index.to_string())
    }

    fn to_xml(&self, reference: &str) -> String {
        match self {
            Self::Literal(text) => format!(r#"<c r="{reference}" t="str"><v>{}</v></c>"#, escape(text)),
            Self::Shared(index) => format!(r#"<c r="{reference}" t="s"><v>{}</v></c>"#, escape(index)),
            Self::Inline(text) => format!(
                r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#,
                escape(text)
            ),
        }
    }
}

/// Builds `<row>` XML; `number` is the 1-based worksheet row.
pub fn row_xml(number: usize, cells: &[(usize, Cell)]) -> String {
    let mut xml = format!(r#"<row r="{number}">"#);
    for (column, cell) in cells {
        let reference = format!("{}{number}", column_letters(*column));
        xml.push_str(&cell.to_xml(&reference));
    }
    xml.push_str("</row>");
    xml
}

pub fn sheet_xml(rows: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        rows.concat()
    )
}

pub fn shared_strings_xml(items: &[&str]) -> String {
    let body: String = items
        .iter()
        .map(|item| format!("<si><t>{}</t></si>", escape(item)))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{n}" uniqueCount="{n}">{body}</sst>"#,
        n = items.len()
    )
}

/// Zips the given parts into an in-memory archive.
pub fn archive(parts: &[(&str, String)]) -> Cursor<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in parts {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start part");
        writer.write_all(body.as_bytes()).expect("write part");
    }
    let mut cursor = writer.finish().expect("finish archive");
    cursor.set_position(0);
    cursor
}

/// Workbook with an optional shared-string table and one worksheet.
pub fn workbook(shared: Option<&[&str]>, rows: &[String]) -> Cursor<Vec<u8>> {
    let mut parts = vec![
        ("[Content_Types].xml", "<Types/>".to_owned()),
        ("xl/workbook.xml", "<workbook/>".to_owned()),
        ("xl/worksheets/sheet1.xml", sheet_xml(rows)),
    ];
    if let Some(items) = shared {
        parts.push(("xl/sharedStrings.xml", shared_strings_xml(items)));
    }
    archive(&parts)
}

/// Header row naming every column, stored as shared strings 0..55.
pub fn header_row() -> String {
    let cells: Vec<(usize, Cell)> = Field::all().map(|f| (f.column(), Cell::shared(f.column()))).collect();
    row_xml(1, &cells)
}

pub fn header_strings() -> Vec<&'static str> {
    Field::all().map(Field::name).collect()
}

/// Cell text that satisfies every rule of `field`.
pub fn valid_value(field: Field) -> String {
    if field == Field::CustomerDomainName {
        return "contoso.com".to_owned();
    }
    match field.kind() {
        FieldKind::Text => format!("{}-value", field.name()),
        FieldKind::OptionalText => "optional".to_owned(),
        FieldKind::Integer => "7".to_owned(),
        FieldKind::Decimal => "2.5".to_owned(),
        FieldKind::Date => "44197".to_owned(),
        FieldKind::JsonMap => r#"{"source":"test"}"#.to_owned(),
    }
}

/// Data row with every column valid; `overrides` replace individual cells.
pub fn data_row(number: usize, overrides: &[(Field, &str)]) -> String {
    let cells: Vec<(usize, Cell)> = Field::all()
        .map(|field| {
            let text = overrides
                .iter()
                .find(|(target, _)| *target == field)
                .map_or_else(|| valid_value(field), |(_, text)| (*text).to_owned());
            (field.column(), Cell::literal(text))
        })
        .collect();
    row_xml(number, &cells)
}

/// Header plus `count` valid data rows.
pub fn supplier_workbook(count: usize) -> Cursor<Vec<u8>> {
    let mut rows = vec![header_row()];
    rows.extend((0..count).map(|i| data_row(i + 2, &[])));
    workbook(Some(&header_strings()), &rows)
}

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Sink that accepts `accept` batches, then rejects every later one.
pub struct FailingSink {
    accept: usize,
    calls: AtomicUsize,
}

impl FailingSink {
    pub fn new(accept: usize) -> Self {
        Self {
            accept,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BulkSink for FailingSink {
    fn insert_many(&self, _records: &[SupplierRecord]) -> Result<(), SinkError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.accept {
            Ok(())
        } else {
            Err("database unavailable".into())
        }
    }
}

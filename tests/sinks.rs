#![allow(clippy::pedantic)]
mod common;

use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

use csv::ReaderBuilder;
use supplier_ingest::record::Field;
use supplier_ingest::{CsvSink, ImportOptions, MemorySink, SupplierImporter};

use common::supplier_workbook;

#[test]
fn concurrent_csv_export_keeps_rows_intact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("suppliers.csv");
    let file = BufWriter::new(File::create(&output).expect("create csv"));

    let importer = SupplierImporter::new(CsvSink::new(file))
        .with_options(ImportOptions::new().with_workers(4).with_batch_size(25));
    let report = importer.import(supplier_workbook(300)).expect("import");
    assert_eq!(report.records, 300);
    importer.into_sink().into_inner().expect("finish csv");

    let mut reader = ReaderBuilder::new().from_path(&output).expect("open csv");
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(headers.len(), 4 + Field::all().count());
    let country = headers
        .iter()
        .position(|name| name == "country")
        .expect("country column");

    let mut rows = 0;
    for record in reader.records() {
        let record = record.expect("csv row");
        assert_eq!(record.len(), headers.len(), "row {rows} is torn");
        assert_eq!(&record[country], "country-value");
        rows += 1;
    }
    assert_eq!(rows, 300);
}

#[test]
fn shared_memory_sink_can_be_reused_across_imports() {
    let sink = Arc::new(MemorySink::new());
    let importer = SupplierImporter::new(Arc::clone(&sink))
        .with_options(ImportOptions::new().with_workers(2));
    importer.import(supplier_workbook(5)).expect("first import");
    importer.import(supplier_workbook(5)).expect("second import");

    // Imports are not idempotent: the same rows land twice.
    assert_eq!(sink.len(), 10);
}

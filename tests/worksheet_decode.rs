#![allow(clippy::pedantic)]
mod common;

use supplier_ingest::parser::{COLUMN_COUNT, Workbook, WorksheetRows};
use supplier_ingest::{Error, inspect, read_rows};

use common::{Cell, archive, header_row, header_strings, row_xml, sheet_xml, supplier_workbook, workbook};

#[test]
fn rows_are_fixed_width_regardless_of_cells() {
    let rows = vec![
        row_xml(1, &[(0, Cell::literal("only A"))]),
        row_xml(2, &[]),
        row_xml(
            3,
            &[
                (3, Cell::literal("D")),
                (54, Cell::literal("BC")),
                (55, Cell::literal("BD is dropped")),
                (80, Cell::literal("far right")),
            ],
        ),
    ];
    let decoded = read_rows(workbook(None, &rows)).expect("decode");

    assert_eq!(decoded.len(), 3);
    for row in &decoded {
        assert_eq!(row.len(), COLUMN_COUNT);
    }
    assert_eq!(decoded[0].get(0), "only A");
    assert!(decoded[1].is_blank());
    assert_eq!(decoded[2].get(3), "D");
    assert_eq!(decoded[2].get(54), "BC");
    assert!(
        decoded[2].as_slice().iter().all(|cell| cell != "BD is dropped" && cell != "far right"),
        "columns past the layout must be discarded"
    );
}

#[test]
fn shared_string_references_resolve_by_position() {
    let shared = ["zero", "one", "two", "three", "four"];
    let rows = vec![row_xml(
        1,
        &[
            (0, Cell::shared(2)),
            (1, Cell::shared(999)),
            (2, Cell::shared("x")),
            (3, Cell::literal("2")),
        ],
    )];
    let decoded = read_rows(workbook(Some(&shared), &rows)).expect("decode");

    assert_eq!(decoded[0].get(0), "two");
    assert_eq!(decoded[0].get(1), "", "out-of-range index resolves to empty text");
    assert_eq!(decoded[0].get(2), "", "non-numeric index resolves to empty text");
    assert_eq!(decoded[0].get(3), "2", "literal cells are used verbatim");
}

#[test]
fn missing_shared_strings_part_resolves_to_empty() {
    let rows = vec![row_xml(1, &[(0, Cell::shared(0)), (1, Cell::Inline("inline".into()))])];
    let decoded = read_rows(workbook(None, &rows)).expect("decode");
    assert_eq!(decoded[0].get(0), "");
    assert_eq!(decoded[0].get(1), "inline");
}

#[test]
fn escaped_text_is_unescaped() {
    let rows = vec![row_xml(1, &[(0, Cell::literal("Fish & Chips <Ltd>"))])];
    let decoded = read_rows(workbook(None, &rows)).expect("decode");
    assert_eq!(decoded[0].get(0), "Fish & Chips <Ltd>");
}

#[test]
fn decoder_is_lazy_and_single_pass() {
    let mut source = workbook(None, &[row_xml(1, &[(0, Cell::literal("a"))]), row_xml(2, &[(0, Cell::literal("b"))])]);
    source.set_position(0);
    let mut workbook = Workbook::open(source).expect("open");
    let shared = workbook.shared_strings().expect("shared strings");
    let part = workbook.worksheet().expect("worksheet");
    let mut rows = WorksheetRows::new(&part.xml, &part.name, &shared);

    assert_eq!(rows.try_next().expect("row 1").expect("present").get(0), "a");
    assert_eq!(rows.rows_emitted(), 1);
    assert_eq!(rows.try_next().expect("row 2").expect("present").get(0), "b");
    assert!(rows.try_next().expect("end").is_none());
    assert!(rows.try_next().expect("still ended").is_none());
}

#[test]
fn malformed_row_is_fatal() {
    let source = archive(&[(
        "xl/worksheets/sheet1.xml",
        r#"<worksheet><sheetData><row r="1"><c r="A1"><v>1</v></row></sheetData></worksheet>"#.to_owned(),
    )]);
    let err = read_rows(source).expect_err("mismatched tags");
    assert!(matches!(err, Error::Xml { .. }), "got {err:?}");
    assert!(err.to_string().contains("xl/worksheets/sheet1.xml"), "{err}");
}

#[test]
fn rich_text_shared_strings_are_concatenated() {
    let sst = r#"<sst><si><r><t>Con</t></r><r><rPr><b/></rPr><t>toso</t></r><rPh><t>ignored</t></rPh></si></sst>"#;
    let source = archive(&[
        ("xl/sharedStrings.xml", sst.to_owned()),
        ("xl/worksheets/sheet1.xml", sheet_xml(&[row_xml(1, &[(1, Cell::shared(0))])])),
    ]);
    let decoded = read_rows(source).expect("decode");
    assert_eq!(decoded[0].get(1), "Contoso");
}

#[test]
fn inspect_summarises_the_sheet() {
    let summary = inspect(supplier_workbook(4)).expect("inspect");
    assert_eq!(summary.worksheet, "xl/worksheets/sheet1.xml");
    assert_eq!(summary.data_rows, 4);
    assert_eq!(summary.shared_strings, COLUMN_COUNT);
    assert_eq!(summary.header, header_strings());

    let err = inspect(workbook(None, &[])).expect_err("no rows");
    assert!(matches!(err, Error::EmptySheet), "got {err:?}");

    let only_header = inspect(workbook(Some(&header_strings()), &[header_row()])).expect("header only");
    assert_eq!(only_header.data_rows, 0);
}

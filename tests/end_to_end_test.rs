//! End-to-end tests: build a real PDF with lopdf, convert it, read the
//! workbook back with calamine.

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdfsheet::{
    convert_file, convert_file_with_options, ConvertOptions, LopdfBackend, PdfBackend,
};

/// Text placed at `(x, y)` on one page.
type Placement<'a> = (f32, f32, &'a str);

/// Write a PDF with one page per entry of `pages`, all text in 12pt Helvetica.
fn build_pdf(path: &Path, pages: &[Vec<Placement>]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for placements in pages {
        let mut operations = Vec::new();
        for &(x, y, text) in placements {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![x.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn people_page() -> Vec<Placement<'static>> {
    vec![
        (72.0, 700.0, "Name"),
        (200.0, 700.0, "Age"),
        (72.0, 680.0, "Alice"),
        (200.0, 680.0, "30"),
        (72.0, 660.0, "Bob"),
        (200.0, 660.0, "25"),
    ]
}

fn read_sheet(path: &Path, name: &str) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range(name).unwrap();
    range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::String(s) => s.clone(),
                    Data::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}

#[test]
fn test_backend_reads_positioned_text() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("people.pdf");
    build_pdf(&input, &[people_page()]);

    let backend = LopdfBackend::load_file(&input).unwrap();
    assert_eq!(backend.page_count(), 1);
    assert_eq!(backend.format().version, "1.5");
    assert_eq!(backend.page_numbers(), vec![1]);

    let text = backend.page_text(1).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Name  "));
    assert!(lines[0].ends_with("Age"));

    let tables = backend.page_tables(1).unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].column_count(), 2);
}

#[test]
fn test_convert_table_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("people.pdf");
    let output = dir.path().join("people.xlsx");
    build_pdf(&input, &[people_page()]);

    let report = convert_file(&input, &output).unwrap();
    assert_eq!(report.detected_tables, 1);
    assert_eq!(report.sheet_count, 2);
    assert_eq!(report.text_rows, 3);

    let workbook: Xlsx<_> = open_workbook(&output).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Table_1", "Table_2"]);

    let expected = vec![
        vec!["Name", "Age"],
        vec!["Alice", "30"],
        vec!["Bob", "25"],
    ];
    assert_eq!(read_sheet(&output, "Table_1"), expected);
    assert_eq!(read_sheet(&output, "Table_2"), expected);
}

#[test]
fn test_convert_plain_text_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("memo.pdf");
    let output = dir.path().join("memo.xlsx");
    build_pdf(
        &input,
        &[
            vec![(72.0, 700.0, "Quarterly memo")],
            vec![(72.0, 700.0, "Nothing tabular here")],
        ],
    );

    let report = convert_file(&input, &output).unwrap();
    assert_eq!(report.detected_tables, 0);
    assert_eq!(report.sheet_count, 1);

    assert_eq!(
        read_sheet(&output, "Table_1"),
        vec![vec!["Quarterly memo"], vec!["Nothing tabular here"]]
    );
}

#[test]
fn test_tables_on_every_page_come_first() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("two_tables.pdf");
    let output = dir.path().join("two_tables.xlsx");
    build_pdf(&input, &[people_page(), people_page()]);

    let report = convert_file(&input, &output).unwrap();
    assert_eq!(report.detected_tables, 2);

    let workbook: Xlsx<_> = open_workbook(&output).unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec!["Table_1", "Table_2", "Table_3"]
    );
    // Text of both pages lands in the last sheet
    assert_eq!(read_sheet(&output, "Table_3").len(), 6);
}

#[test]
fn test_table_detection_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("people.pdf");
    let output = dir.path().join("people.xlsx");
    build_pdf(&input, &[people_page()]);

    let options = ConvertOptions::new().with_table_detection(false);
    let report = convert_file_with_options(&input, &output, options).unwrap();
    assert_eq!(report.sheet_count, 1);
    assert_eq!(read_sheet(&output, "Table_1")[0], vec!["Name", "Age"]);
}

//! Integration tests for the three office builders.

mod common;

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use hanu::convert::{layout_document, layout_sheet};
use hanu::ooxml::{docx, xlsx, DocProps};
use hanu::progress::NoopReporter;
use hanu::{convert, convert_with_options, ConvertOptions, PdfSource, ProgressTracker, TargetFormat};

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn sheet_rows(package: &[u8], sheet: &str) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> =
        calamine::open_workbook_from_rs(Cursor::new(package.to_vec())).expect("readable xlsx");
    let range = workbook.worksheet_range(sheet).expect("sheet exists");
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
fn test_spreadsheet_from_lines() {
    let options = ConvertOptions::default();
    let mut progress = ProgressTracker::new(&NoopReporter);
    let sheet = layout_sheet(&lines(&["A\tB", "1  2"]), &options, &mut progress).unwrap();
    let package = xlsx::write_workbook(&sheet, &DocProps::now("t")).unwrap();

    assert_eq!(
        sheet_rows(&package, "Converted PDF"),
        vec![vec!["A", "B"], vec!["1", "2"]]
    );

    let sheet_xml = common::read_part(&package, "xl/worksheets/sheet1.xml");
    assert!(sheet_xml.contains(r#"<c r="A1" s="1""#));
    assert!(sheet_xml.contains(r#"<c r="B1" s="1""#));
    assert!(sheet_xml.contains(r#"<c r="A2" s="3""#));
    assert!(sheet_xml.contains("<cols>"));

    let styles = common::read_part(&package, "xl/styles.xml");
    assert!(styles.contains("FF228B57"));
    assert!(styles.contains("FFF2F7F4"));
}

#[test]
fn test_spreadsheet_from_pdf() {
    let pdf = common::build_pdf(&[&["Name  Qty", "Apple  3"]]);
    let package = convert(&PdfSource::from_bytes(pdf), TargetFormat::Spreadsheet).unwrap();

    let rows = sheet_rows(&package, "Converted PDF");
    // First non-empty line is the page marker, which becomes the header.
    assert_eq!(rows[0][0], "--- Page 1 ---");
    assert!(rows.iter().skip(1).any(|r| r.iter().any(|c| c.contains("Apple"))));
}

#[test]
fn test_document_from_lines() {
    let options = ConvertOptions::default();
    let mut progress = ProgressTracker::new(&NoopReporter);
    let blocks = layout_document(
        &lines(&["--- Page 1 ---", "Short Title", "This is a normal sentence."]),
        &options,
        &mut progress,
    )
    .unwrap();
    let package = docx::write_document(&blocks, &DocProps::now("t")).unwrap();
    let xml = common::read_part(&package, "word/document.xml");

    assert!(xml.contains("Converted by Hanu PDF Converter"));
    assert!(xml.contains(r#"<w:pStyle w:val="Heading2"/>"#));
    assert!(xml.contains(r#"<w:t xml:space="preserve">Page 1</w:t>"#));
    assert!(xml.contains(
        r#"<w:b/><w:sz w:val="24"/><w:szCs w:val="24"/></w:rPr><w:t xml:space="preserve">Short Title</w:t>"#
    ));
    assert!(xml.contains(
        r#"<w:sz w:val="22"/><w:szCs w:val="22"/></w:rPr><w:t xml:space="preserve">This is a normal sentence.</w:t>"#
    ));
    // Only the first marker: no page break.
    assert!(!xml.contains(r#"w:type="page""#));
}

#[test]
fn test_document_from_pdf_breaks_between_pages() {
    let pdf = common::build_pdf(&[&["One."], &["Two."], &["Three."]]);
    let package = convert(&PdfSource::from_bytes(pdf), TargetFormat::WordProcessing).unwrap();
    let xml = common::read_part(&package, "word/document.xml");

    assert_eq!(xml.matches(r#"<w:br w:type="page"/>"#).count(), 2);
    assert_eq!(xml.matches(r#"<w:pStyle w:val="Heading2"/>"#).count(), 3);
    assert!(xml.contains(">Page 3</w:t>"));
    assert!(common::read_part(&package, "word/styles.xml").contains("Heading2"));
}

#[test]
fn test_presentation_one_slide_per_page() {
    let pdf = common::build_pdf(&[&["first"], &["second"], &["third"]]);
    let package = convert(&PdfSource::from_bytes(pdf), TargetFormat::Presentation).unwrap();
    let names = common::part_names(&package);

    for i in 1..=3 {
        let slide = common::read_part(&package, &format!("ppt/slides/slide{}.xml", i));
        assert_eq!(slide.matches("<p:pic>").count(), 1);
        assert!(slide.contains(&format!("<a:t>{} / 3</a:t>", i)));
        assert!(slide.contains(r#"<a:off x="0" y="0"/><a:ext cx="9144000" cy="6858000"/>"#));
        assert!(names.contains(&format!("ppt/media/image{}.png", i)));
    }
    assert!(!names.contains(&"ppt/slides/slide4.xml".to_string()));

    let presentation = common::read_part(&package, "ppt/presentation.xml");
    assert_eq!(presentation.matches("<p:sldId ").count(), 3);
}

#[test]
fn test_presentation_pictures_are_rendered_pages() {
    let pdf = common::build_pdf(&[&["x"]]);
    let package = convert(&PdfSource::from_bytes(pdf), TargetFormat::Presentation).unwrap();
    let png = common::read_part_bytes(&package, "ppt/media/image1.png");

    let image = image::load_from_memory(&png).unwrap();
    assert_eq!(image.width(), common::PAGE_WIDTH as u32 * 2);
    assert_eq!(image.height(), common::PAGE_HEIGHT as u32 * 2);
}

#[test]
fn test_presentation_jpeg_option() {
    let pdf = common::build_pdf(&[&["x"]]);
    let options = ConvertOptions::new()
        .with_raster_scale(1.0)
        .with_slide_image(hanu::SlideImageFormat::jpeg());
    let package = convert_with_options(
        &PdfSource::from_bytes(pdf),
        TargetFormat::Presentation,
        &options,
        &NoopReporter,
    )
    .unwrap();

    let jpeg = common::read_part_bytes(&package, "ppt/media/image1.jpeg");
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    assert!(common::read_part(&package, "[Content_Types].xml").contains("image/jpeg"));
}

#[test]
fn test_same_input_same_content() {
    let pdf = common::build_pdf(&[&["Header  Value", "Row  1"], &["Next page."]]);
    for format in TargetFormat::ALL {
        let source = PdfSource::from_bytes(pdf.clone());
        let first = convert(&source, format).unwrap();
        let second = convert(&source, format).unwrap();

        let names = common::part_names(&first);
        assert_eq!(names, common::part_names(&second));
        for name in names.iter().filter(|n| *n != "docProps/core.xml") {
            assert_eq!(
                common::read_part_bytes(&first, name),
                common::read_part_bytes(&second, name),
                "{} differs for {}",
                name,
                format
            );
        }
    }
}

#[test]
fn test_core_properties_present() {
    let pdf = common::build_pdf(&[&["x"]]);
    let package = convert(&PdfSource::from_bytes(pdf), TargetFormat::Spreadsheet).unwrap();
    let core = common::read_part(&package, "docProps/core.xml");
    assert!(core.contains("<dc:creator>Hanu PDF Converter</dc:creator>"));
    assert!(core.contains("dcterms:created"));
}

//! Integration tests for page rasterization.

mod common;

use hanu::raster::render_page;
use hanu::{Error, PdfSource, RasterSession};
use lopdf::content::Operation;

const WHITE: [u8; 4] = [255, 255, 255, 255];

fn red_box_pdf() -> Vec<u8> {
    common::build_pdf_with(vec![vec![
        Operation::new("rg", vec![1.into(), 0.into(), 0.into()]),
        Operation::new("re", vec![50.into(), 50.into(), 40.into(), 30.into()]),
        Operation::new("f", vec![]),
    ]])
}

#[test]
fn test_bitmap_size_follows_scale() {
    let pdf = common::build_pdf(&[&["x"]]);
    let page = render_page(&PdfSource::from_bytes(pdf.clone()), 0, 2.0).unwrap();
    assert_eq!(page.width(), 400);
    assert_eq!(page.height(), 300);

    let page = render_page(&PdfSource::from_bytes(pdf), 0, 1.5).unwrap();
    assert_eq!((page.width(), page.height()), (300, 225));
}

#[test]
fn test_filled_rectangle_lands_in_place() {
    let page = render_page(&PdfSource::from_bytes(red_box_pdf()), 0, 2.0).unwrap();

    // PDF (50,50)-(90,80) maps to pixels (100,140)-(180,200) at 2x.
    assert_eq!(page.pixel(140, 170), Some([255, 0, 0, 255]));
    assert_eq!(page.pixel(5, 5), Some(WHITE));
    assert_eq!(page.pixel(140, 100), Some(WHITE));
    assert_eq!(page.pixel(140, 250), Some(WHITE));
    assert_eq!(page.pixel(400, 0), None);
    assert_eq!(page.pixel(0, 300), None);
    assert_eq!(page.pixel(u32::MAX, 0), None);
}

#[test]
fn test_text_darkens_its_line() {
    let page = render_page(&PdfSource::from_bytes(common::build_pdf(&[&["Hello world"]])), 0, 2.0)
        .unwrap();

    // Baseline at y=130 in PDF space, 40 px from the top at 2x.
    let mut dark = 0;
    for y in 28..42 {
        for x in 20..60 {
            let [r, g, b, _] = page.pixel(x, y).unwrap();
            if r < 128 && g < 128 && b < 128 {
                dark += 1;
            }
        }
    }
    assert!(dark > 0);

    // Far below the only line nothing is drawn.
    for x in (0..400).step_by(7) {
        assert_eq!(page.pixel(x, 250), Some(WHITE));
    }
}

#[test]
fn test_empty_page_is_white() {
    let page = render_page(&PdfSource::from_bytes(common::build_pdf(&[&[]])), 0, 1.0).unwrap();
    assert!(page.pixels().chunks(4).all(|px| px == WHITE));
}

#[test]
fn test_session_renders_every_page() {
    let pdf = common::build_pdf(&[&["one"], &["two"], &["three"]]);
    let mut session = RasterSession::open(&PdfSource::from_bytes(pdf)).unwrap();
    assert_eq!(session.page_count(), 3);
    let mb = session.media_box(0).unwrap();
    assert_eq!((mb.width, mb.height), (200.0, 150.0));
    assert!(session.media_box(3).is_err());

    for i in 0..3 {
        let page = session.render(i, 1.0).unwrap();
        assert_eq!(page.page_index(), i);
    }
    assert_eq!(session.pages_rendered(), 3);

    match session.render(3, 1.0) {
        Err(Error::PageRender { page, .. }) => assert_eq!(page, 4),
        other => panic!("expected a page render error, got {:?}", other.map(|p| p.width())),
    }
    session.close();
}

#[test]
fn test_png_and_jpeg_encoding() {
    let page = render_page(&PdfSource::from_bytes(red_box_pdf()), 0, 1.0).unwrap();

    let png = page.encode_png().unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let jpeg = page.encode_jpeg(80).unwrap();
    let decoded = image::load_from_memory(&jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (200, 150));
}

#[test]
fn test_unparseable_source_is_a_render_failure() {
    let err = RasterSession::open(&PdfSource::from_bytes(b"garbage".to_vec())).unwrap_err();
    assert!(err.is_page_render());
    assert!(matches!(err, Error::PageRender { page: 1, .. }));
}

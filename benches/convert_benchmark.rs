//! Benchmarks for the office builders.
//!
//! Run with: cargo bench
//!
//! The builders are fed synthetic extracted lines so the numbers measure
//! layout and packaging, not PDF parsing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hanu::convert::{layout_document, layout_sheet};
use hanu::ooxml::{docx, xlsx, DocProps};
use hanu::progress::NoopReporter;
use hanu::{ConvertOptions, ProgressTracker};

/// Lines shaped like extracted text: page markers, tabular rows and prose.
fn synthetic_lines(pages: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for page in 1..=pages {
        lines.push(hanu::extract::page_marker(page as u32));
        lines.push("Item  Quantity  Price".to_string());
        for row in 0..20 {
            lines.push(format!("Widget {}  {}  {}.99", row, row * 3, row + 10));
        }
        lines.push(String::new());
        lines.push(
            "Totals include shipping and are subject to change without notice.".to_string(),
        );
    }
    lines
}

fn bench_format_detection(c: &mut Criterion) {
    let header = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n";
    c.bench_function("sniff_pdf_header", |b| {
        b.iter(|| hanu::sniff(black_box(header)).unwrap());
    });
}

fn bench_spreadsheet(c: &mut Criterion) {
    let mut group = c.benchmark_group("spreadsheet");
    let options = ConvertOptions::default();

    for pages in [1, 10, 50].iter() {
        let lines = synthetic_lines(*pages);
        group.bench_function(format!("{}_pages", pages), |b| {
            b.iter(|| {
                let mut progress = ProgressTracker::new(&NoopReporter);
                let sheet = layout_sheet(black_box(&lines), &options, &mut progress).unwrap();
                xlsx::write_workbook(&sheet, &DocProps::now("bench")).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("document");
    let options = ConvertOptions::default();

    for pages in [1, 10, 50].iter() {
        let lines = synthetic_lines(*pages);
        group.bench_function(format!("{}_pages", pages), |b| {
            b.iter(|| {
                let mut progress = ProgressTracker::new(&NoopReporter);
                let blocks = layout_document(black_box(&lines), &options, &mut progress).unwrap();
                docx::write_document(&blocks, &DocProps::now("bench")).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_format_detection,
    bench_spreadsheet,
    bench_document,
);
criterion_main!(benches);

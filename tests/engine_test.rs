//! Integration tests for job orchestration: progress, busy state,
//! cancellation and output files.

mod common;

use std::sync::Mutex;

use hanu::progress::NoopReporter;
use hanu::{
    CancelToken, ConversionJob, ConvertOptions, Engine, Error, FileSink, PdfSource,
    ProgressEvent, TargetFormat,
};
use tempfile::TempDir;

fn sample_pdf() -> Vec<u8> {
    common::build_pdf(&[
        &["Quarterly Report", "Item  Amount", "Rent  1200"],
        &["Second page text."],
    ])
}

fn assert_monotonic(events: &[ProgressEvent]) {
    for pair in events.windows(2) {
        assert!(
            pair[0].percent <= pair[1].percent,
            "progress went backwards: {:?} then {:?}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_spawned_jobs_report_monotonic_progress() {
    let engine = Engine::new();
    for format in TargetFormat::ALL {
        let handle = engine
            .spawn(PdfSource::from_bytes(sample_pdf()), format, Vec::<u8>::new())
            .unwrap();
        let events: Vec<ProgressEvent> = handle.events().iter().collect();
        let bytes = handle.join().unwrap();

        assert_eq!(&bytes[..2], b"PK", "{} output is not a zip", format);
        assert_monotonic(&events);
        let last = events.last().unwrap();
        assert_eq!(last.percent, 100);
        assert_eq!(last.status, "Done!");
        assert_eq!(events.iter().filter(|e| e.percent == 100).count(), 1);
        assert!(events[0].percent < 100);
    }
    assert!(!engine.is_busy());
}

#[test]
fn test_second_job_is_rejected_while_busy() {
    let engine = Engine::new();
    let source = PdfSource::from_bytes(sample_pdf());
    let nested = Mutex::new(None);

    let reporter = |percent: u8, _status: &str| {
        let mut nested = nested.lock().unwrap();
        if percent == 5 && nested.is_none() {
            let mut sink = Vec::new();
            *nested = Some(engine.run(&source, TargetFormat::WordProcessing, &mut sink, &NoopReporter));
        }
    };

    let mut sink = Vec::new();
    engine
        .run(&source, TargetFormat::Spreadsheet, &mut sink, &reporter)
        .unwrap();

    let nested = nested.into_inner().unwrap().expect("reporter ran");
    assert!(matches!(nested, Err(Error::Busy)));
    assert!(!sink.is_empty());
    assert!(!engine.is_busy());

    // Free again once the first job is done.
    let mut again = Vec::new();
    engine
        .run(&source, TargetFormat::WordProcessing, &mut again, &NoopReporter)
        .unwrap();
}

#[test]
fn test_cancelled_job_writes_nothing() {
    let source = PdfSource::from_bytes(sample_pdf());
    let options = ConvertOptions::default();
    let token = CancelToken::new();
    let seen = Mutex::new(Vec::new());

    let reporter = |percent: u8, _status: &str| {
        seen.lock().unwrap().push(percent);
        token.cancel();
    };

    for format in TargetFormat::ALL {
        let mut sink = Vec::new();
        let result = ConversionJob::new(&source, &options, &reporter)
            .with_cancel(token.clone())
            .run(format, &mut sink);
        assert!(matches!(result, Err(Error::Cancelled)), "{}", format);
        assert!(sink.is_empty());
    }
    assert!(!seen.into_inner().unwrap().contains(&100));
}

#[test]
fn test_spawned_job_cancel_before_events() {
    let engine = Engine::new();
    let page: &[&str] = &["a"];
    let pdf = common::build_pdf(&[page; 6]);
    let handle = engine
        .spawn(PdfSource::from_bytes(pdf), TargetFormat::Presentation, Vec::<u8>::new())
        .unwrap();
    handle.cancel();
    let events = handle.events().clone();

    match handle.join() {
        // The worker may already have been past its last checkpoint.
        Ok(bytes) => {
            assert!(!bytes.is_empty());
            assert_eq!(events.iter().last().map(|e| e.percent), Some(100));
        }
        Err(e) => {
            assert!(matches!(e, Error::Cancelled));
            assert!(events.iter().all(|e| e.percent < 100));
        }
    }
    assert!(!engine.is_busy());
}

#[test]
fn test_file_output_named_after_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("report.pdf");
    std::fs::write(&input, sample_pdf()).unwrap();
    let out_dir = dir.path().join("out");

    let path = hanu::convert_file(&input, TargetFormat::Spreadsheet, &out_dir).unwrap();
    assert_eq!(path, out_dir.join("report_hanu.xlsx"));
    let written = std::fs::read(&path).unwrap();
    assert_eq!(&written[..2], b"PK");

    // Only the finished file is left behind.
    let entries: Vec<_> = std::fs::read_dir(&out_dir).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_spawned_job_returns_file_sink() {
    let dir = TempDir::new().unwrap();
    let source = PdfSource::from_bytes(sample_pdf()).with_name("notes.pdf");
    let sink = FileSink::in_dir(
        dir.path(),
        &TargetFormat::WordProcessing.output_file_name(source.name()),
    )
    .unwrap();

    let handle = Engine::new()
        .spawn(source, TargetFormat::WordProcessing, sink)
        .unwrap();
    let sink = handle.join().unwrap();

    assert_eq!(sink.path(), dir.path().join("notes_hanu.docx"));
    let size = std::fs::metadata(sink.path()).unwrap().len();
    assert_eq!(sink.bytes_written(), Some(size));
}

#[test]
fn test_failed_job_leaves_no_file() {
    let dir = TempDir::new().unwrap();
    let source = PdfSource::from_bytes(b"%PDF-1.4 not really".to_vec());
    let mut sink = FileSink::in_dir(dir.path(), "broken_hanu.pptx").unwrap();
    let events = Mutex::new(Vec::new());
    let reporter = |percent: u8, _status: &str| events.lock().unwrap().push(percent);

    let result = Engine::new().run(&source, TargetFormat::Presentation, &mut sink, &reporter);

    assert!(result.is_err());
    assert!(!sink.path().exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert!(!events.into_inner().unwrap().contains(&100));
}

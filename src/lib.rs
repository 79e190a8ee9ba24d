//! # hanu
//!
//! PDF to office document conversion for Rust.
//!
//! This library turns a PDF into an Excel spreadsheet, a Word document or a
//! PowerPoint presentation while reporting progress as it goes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hanu::{convert_file, TargetFormat};
//!
//! fn main() -> hanu::Result<()> {
//!     // Writes Hanu_Converted/report_hanu.docx
//!     let path = convert_file("report.pdf", TargetFormat::WordProcessing, "Hanu_Converted")?;
//!     println!("{}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Spreadsheet output**: one row per text line, cells split on tabs or runs of spaces
//! - **Word output**: page sections with page breaks and heading emphasis
//! - **Presentation output**: one rendered picture slide per page
//! - **Progress events**: monotonic `(percent, status)` updates over a channel
//! - **Worker jobs**: run a conversion on a background thread and cancel it
//! - **Graceful fallback**: image-only or encrypted PDFs still convert, with a notice

pub mod backend;
pub mod convert;
pub mod detect;
pub mod engine;
pub mod error;
pub mod extract;
pub mod ooxml;
pub mod policy;
pub mod progress;
pub mod raster;
pub mod sink;
pub mod source;

// Re-export commonly used types
pub use convert::{
    ConversionJob, ConvertOptions, DocumentBuilder, OfficeConverter, PresentationBuilder,
    SlideImageFormat, SpreadsheetBuilder, TargetFormat,
};
pub use detect::{is_pdf, sniff, PdfHeader};
pub use engine::{Engine, JobHandle};
pub use error::{Error, Result};
pub use policy::{ColumnSplitter, HeadingPolicy};
pub use progress::{CancelToken, ProgressEvent, ProgressReporter, ProgressTracker};
pub use raster::{RasterPage, RasterSession};
pub use sink::{ByteSink, FileSink, OutputDocument};
pub use source::PdfSource;

use std::path::{Path, PathBuf};

use progress::NoopReporter;

/// Convert a PDF in memory and return the package bytes.
///
/// # Example
///
/// ```no_run
/// use hanu::{convert, PdfSource, TargetFormat};
///
/// let source = PdfSource::open("slides.pdf").unwrap();
/// let pptx = convert(&source, TargetFormat::Presentation).unwrap();
/// std::fs::write("slides.pptx", pptx).unwrap();
/// ```
pub fn convert(source: &PdfSource, format: TargetFormat) -> Result<Vec<u8>> {
    convert_with_options(source, format, &ConvertOptions::default(), &NoopReporter)
}

/// Convert a PDF in memory with custom options and a progress reporter.
///
/// # Example
///
/// ```no_run
/// use hanu::{convert_with_options, ConvertOptions, PdfSource, TargetFormat};
///
/// let source = PdfSource::open("table.pdf").unwrap();
/// let options = ConvertOptions::new().with_sheet_name("Prices");
/// let report = |percent: u8, status: &str| println!("{:>3}% {}", percent, status);
/// let xlsx = convert_with_options(&source, TargetFormat::Spreadsheet, &options, &report).unwrap();
/// ```
pub fn convert_with_options(
    source: &PdfSource,
    format: TargetFormat,
    options: &ConvertOptions,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    ConversionJob::new(source, options, reporter).run(format, &mut bytes)?;
    Ok(bytes)
}

/// Convert a PDF file into `out_dir`, returning the path written.
///
/// The output is named after the input (`report.pdf` becomes
/// `report_hanu.xlsx`) and appears only once fully written.
pub fn convert_file<P: AsRef<Path>, D: AsRef<Path>>(
    path: P,
    format: TargetFormat,
    out_dir: D,
) -> Result<PathBuf> {
    let source = PdfSource::open(path)?;
    let mut sink = FileSink::in_dir(out_dir, &format.output_file_name(source.name()))?;
    ConversionJob::new(&source, &ConvertOptions::default(), &NoopReporter).run(format, &mut sink)?;
    Ok(sink.path().to_path_buf())
}

/// Extract the text lines of a PDF file, with page markers.
///
/// # Example
///
/// ```no_run
/// let lines = hanu::extract_lines("document.pdf").unwrap();
/// for line in &lines {
///     println!("{}", line);
/// }
/// ```
pub fn extract_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let source = PdfSource::open(path)?;
    let mut progress = ProgressTracker::new(&NoopReporter);
    extract::extract(&source, &mut progress)
}

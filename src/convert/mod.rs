//! Conversion jobs and the three office-format builders.
//!
//! A job binds one [`PdfSource`], one [`ByteSink`] and one progress reporter
//! to one [`TargetFormat`]. The builder for that format produces an
//! [`OutputDocument`]; the job hands it to the sink and only then reports
//! `(100, "Done!")`.
//!
//! # Example
//!
//! ```no_run
//! use hanu::convert::{ConversionJob, ConvertOptions, TargetFormat};
//! use hanu::progress::NoopReporter;
//! use hanu::sink::FileSink;
//! use hanu::PdfSource;
//!
//! fn main() -> hanu::Result<()> {
//!     let source = PdfSource::open("report.pdf")?;
//!     let format: TargetFormat = "xlsx".parse()?;
//!     let mut sink = FileSink::new(format.output_file_name(source.name()));
//!
//!     ConversionJob::new(&source, &ConvertOptions::default(), &NoopReporter)
//!         .run(format, &mut sink)?;
//!     Ok(())
//! }
//! ```

mod document;
mod presentation;
mod spreadsheet;

pub use document::{layout_document, DocumentBuilder};
pub use presentation::PresentationBuilder;
pub use spreadsheet::{layout_sheet, SpreadsheetBuilder};

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::ooxml::{docx, pptx, xlsx};
use crate::policy::{ColumnSplitter, HeadingPolicy};
use crate::progress::{CancelToken, ProgressReporter, ProgressTracker};
use crate::sink::{ByteSink, OutputDocument};
use crate::source::PdfSource;

/// Default title paragraph of word-processing output.
pub const DEFAULT_DOCUMENT_TITLE: &str = "Converted by Hanu PDF Converter";

/// Default worksheet name of spreadsheet output.
pub const DEFAULT_SHEET_NAME: &str = "Converted PDF";

/// Suffix appended to the source stem in output file names.
pub const OUTPUT_SUFFIX: &str = "_hanu";

/// The three supported output containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// `.xlsx`
    Spreadsheet,
    /// `.docx`
    WordProcessing,
    /// `.pptx`
    Presentation,
}

impl TargetFormat {
    /// All formats, in display order.
    pub const ALL: [TargetFormat; 3] = [
        TargetFormat::Spreadsheet,
        TargetFormat::WordProcessing,
        TargetFormat::Presentation,
    ];

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Spreadsheet => "xlsx",
            TargetFormat::WordProcessing => "docx",
            TargetFormat::Presentation => "pptx",
        }
    }

    /// MIME type of the container.
    pub fn mime_type(self) -> &'static str {
        match self {
            TargetFormat::Spreadsheet => xlsx::MIME_TYPE,
            TargetFormat::WordProcessing => docx::MIME_TYPE,
            TargetFormat::Presentation => pptx::MIME_TYPE,
        }
    }

    /// Human-readable label, e.g. "Excel Spreadsheet (.xlsx)".
    pub fn label(self) -> &'static str {
        match self {
            TargetFormat::Spreadsheet => "Excel Spreadsheet (.xlsx)",
            TargetFormat::WordProcessing => "Word Document (.docx)",
            TargetFormat::Presentation => "PowerPoint Presentation (.pptx)",
        }
    }

    /// Output file name for a source named `input_name`:
    /// `report.pdf` becomes `report_hanu.xlsx`.
    pub fn output_file_name(self, input_name: Option<&str>) -> String {
        let stem = input_name
            .map(|name| {
                name.strip_suffix(".pdf")
                    .or_else(|| name.strip_suffix(".PDF"))
                    .unwrap_or(name)
            })
            .filter(|stem| !stem.trim().is_empty())
            .unwrap_or("converted");
        format!("{}{}.{}", stem, OUTPUT_SUFFIX, self.extension())
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TargetFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel" | "spreadsheet" => Ok(TargetFormat::Spreadsheet),
            "docx" | "word" | "document" => Ok(TargetFormat::WordProcessing),
            "pptx" | "ppt" | "powerpoint" | "presentation" => Ok(TargetFormat::Presentation),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

/// How slide pictures are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlideImageFormat {
    /// Lossless.
    #[default]
    Png,
    /// Lossy with the given quality (1-100).
    Jpeg { quality: u8 },
}

impl SlideImageFormat {
    /// JPEG at the default quality of 90.
    pub fn jpeg() -> Self {
        SlideImageFormat::Jpeg { quality: 90 }
    }
}

/// Options shared by all builders.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Presentation page scale
    pub raster_scale: f32,
    /// Slide picture encoding
    pub slide_image: SlideImageFormat,
    /// Heading emphasis heuristic for word-processing output
    pub heading_policy: HeadingPolicy,
    /// Cell splitting heuristic for spreadsheet output
    pub column_splitter: ColumnSplitter,
    /// Title paragraph of word-processing output
    pub document_title: String,
    /// Worksheet name of spreadsheet output
    pub sheet_name: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            raster_scale: 2.0,
            slide_image: SlideImageFormat::default(),
            heading_policy: HeadingPolicy::default(),
            column_splitter: ColumnSplitter::default(),
            document_title: DEFAULT_DOCUMENT_TITLE.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

impl ConvertOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the presentation page scale.
    pub fn with_raster_scale(mut self, scale: f32) -> Self {
        self.raster_scale = scale;
        self
    }

    /// Set the slide picture encoding.
    pub fn with_slide_image(mut self, format: SlideImageFormat) -> Self {
        self.slide_image = format;
        self
    }

    /// Replace the heading heuristic.
    pub fn with_heading_policy(mut self, policy: HeadingPolicy) -> Self {
        self.heading_policy = policy;
        self
    }

    /// Replace the column splitting heuristic.
    pub fn with_column_splitter(mut self, splitter: ColumnSplitter) -> Self {
        self.column_splitter = splitter;
        self
    }

    /// Set the document title.
    pub fn with_document_title(mut self, title: impl Into<String>) -> Self {
        self.document_title = title.into();
        self
    }

    /// Set the worksheet name.
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }
}

/// Builds one kind of office document from a PDF.
pub trait OfficeConverter: Send + Sync {
    /// Format this converter produces.
    fn format(&self) -> TargetFormat;

    /// Short name for logs.
    fn name(&self) -> &str;

    /// Produce the finished document, reporting progress below 100.
    fn convert(&self, job: &mut ConversionJob<'_>) -> Result<OutputDocument>;
}

/// Converter for a target format.
pub fn converter_for(format: TargetFormat) -> Box<dyn OfficeConverter> {
    match format {
        TargetFormat::Spreadsheet => Box::new(SpreadsheetBuilder),
        TargetFormat::WordProcessing => Box::new(DocumentBuilder),
        TargetFormat::Presentation => Box::new(PresentationBuilder),
    }
}

/// State of one conversion: source, options and running progress.
pub struct ConversionJob<'a> {
    source: &'a PdfSource,
    options: &'a ConvertOptions,
    progress: ProgressTracker<'a>,
}

impl<'a> ConversionJob<'a> {
    /// Bind a job to its source and reporter.
    pub fn new(
        source: &'a PdfSource,
        options: &'a ConvertOptions,
        reporter: &'a dyn ProgressReporter,
    ) -> Self {
        Self {
            source,
            options,
            progress: ProgressTracker::new(reporter),
        }
    }

    /// Allow cancelling the job between pages and lines.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.progress = self.progress.with_cancel(token);
        self
    }

    /// Source document.
    pub fn source(&self) -> &'a PdfSource {
        self.source
    }

    /// Options in effect.
    pub fn options(&self) -> &'a ConvertOptions {
        self.options
    }

    /// Progress state.
    pub fn progress(&mut self) -> &mut ProgressTracker<'a> {
        &mut self.progress
    }

    /// Build the document and hand it to `sink`.
    ///
    /// `(100, "Done!")` is reported only after the sink accepted the bytes;
    /// any error before that leaves the job without a final event.
    pub fn run<S: ByteSink + ?Sized>(mut self, format: TargetFormat, sink: &mut S) -> Result<()> {
        let converter = converter_for(format);
        log::info!(
            "Converting {} to {} with {}",
            self.source.name().unwrap_or("<memory>"),
            format,
            converter.name()
        );

        let document = converter.convert(&mut self)?;
        self.progress.checkpoint()?;
        let size = document.len();
        sink.write_document(document)?;
        self.progress.finish();

        log::info!("Conversion to {} finished ({} bytes)", format, size);
        Ok(())
    }
}

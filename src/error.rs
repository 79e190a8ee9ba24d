//! Error types for the hanu conversion engine.

use std::io;
use thiserror::Error;

/// Result type alias for hanu operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting a PDF.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading the source document.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error extracting text content. Never leaves the text extractor,
    /// which substitutes the fallback text instead.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// A page could not be rasterized.
    #[error("Failed to render page {page}: {reason}")]
    PageRender {
        /// 1-based page number
        page: u32,
        /// What went wrong
        reason: String,
    },

    /// The output sink rejected the finished document.
    #[error("Failed to write output: {0}")]
    SinkWrite(#[source] io::Error),

    /// The caller asked for a target format that does not exist.
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// Error assembling the output container (zip, XML, image encoding).
    #[error("Packaging error: {0}")]
    Package(String),

    /// The engine is already running a job.
    #[error("A conversion is already in progress")]
    Busy,

    /// The job was cancelled before it finished.
    #[error("Conversion cancelled")]
    Cancelled,

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Human-readable message suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            "An unknown error occurred. Please try again.".to_string()
        } else {
            message
        }
    }

    /// Whether this error came from rasterizing a page.
    pub fn is_page_render(&self) -> bool {
        matches!(self, Error::PageRender { .. })
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Package(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Package(format!("image encoding failed: {}", err))
    }
}

//! Page-by-page text extraction with page markers.
//!
//! The output is a flat list of lines. Each page contributes one synthetic
//! marker line (`--- Page N ---`) followed by that page's text lines, kept
//! exactly as extracted (blank lines included). If anything goes wrong the
//! partial output is thrown away and a fixed four-line notice is returned
//! instead. The only error that escapes is [`Error::Cancelled`], checked
//! before every page.

use crate::backend::{LopdfBackend, PdfBackend};
use crate::error::{Error, Result};
use crate::progress::ProgressTracker;
use crate::source::PdfSource;

/// Lines substituted when the text of a document cannot be extracted.
pub const FALLBACK_LINES: [&str; 4] = [
    "--- Page 1 ---",
    "This PDF may be image-based or encrypted.",
    "Text extraction was not possible.",
    "For scanned PDFs, please use an OCR tool first.",
];

const MARKER_PREFIX: &str = "--- Page ";
const MARKER_SUFFIX: &str = " ---";

/// Extraction occupies 5..=35 of the overall job.
const PROGRESS_BASE: u8 = 5;
const PROGRESS_SPAN: u8 = 30;

/// Marker line for a 1-based page number.
pub fn page_marker(page: u32) -> String {
    format!("{}{}{}", MARKER_PREFIX, page, MARKER_SUFFIX)
}

/// Page number of a marker line, or `None` for ordinary text.
pub fn parse_page_marker(line: &str) -> Option<u32> {
    line.strip_prefix(MARKER_PREFIX)?
        .strip_suffix(MARKER_SUFFIX)?
        .parse()
        .ok()
}

/// Whether `line` starts like a page marker.
///
/// Looser than [`parse_page_marker`]: any line beginning with `--- Page `
/// is treated as a page boundary by the word-processing layout.
pub fn is_page_marker(line: &str) -> bool {
    line.starts_with(MARKER_PREFIX)
}

/// The fallback notice as owned lines.
pub fn fallback_lines() -> Vec<String> {
    FALLBACK_LINES.iter().map(|s| s.to_string()).collect()
}

/// Extract all lines from a source, reporting progress per page.
///
/// Unreadable documents yield [`FALLBACK_LINES`]; only cancellation is
/// returned as an error.
pub fn extract(source: &PdfSource, progress: &mut ProgressTracker<'_>) -> Result<Vec<String>> {
    match LopdfBackend::load_bytes(source.bytes()) {
        Ok(backend) => extract_from(&backend, progress),
        Err(e) => {
            log::warn!("Text extraction unavailable ({}), using fallback text", e);
            Ok(fallback_lines())
        }
    }
}

/// Extract all lines through an already opened backend.
pub fn extract_from<B: PdfBackend + ?Sized>(
    backend: &B,
    progress: &mut ProgressTracker<'_>,
) -> Result<Vec<String>> {
    match try_extract(backend, progress) {
        Ok(lines) => Ok(lines),
        Err(Error::Cancelled) => Err(Error::Cancelled),
        Err(e) => {
            log::warn!("Text extraction failed ({}), using fallback text", e);
            Ok(fallback_lines())
        }
    }
}

fn try_extract<B: PdfBackend + ?Sized>(
    backend: &B,
    progress: &mut ProgressTracker<'_>,
) -> Result<Vec<String>> {
    let pages = backend.pages();
    let total = pages.len();
    let mut lines = Vec::new();

    // Markers number pages by position, whatever keys the backend uses.
    for (index, &key) in pages.keys().enumerate() {
        progress.checkpoint()?;

        let page_number = index as u32 + 1;
        let text = backend.page_text(key)?;

        lines.push(page_marker(page_number));
        lines.extend(split_page_text(&text));
        log::debug!("Extracted page {}/{}", page_number, total);

        progress.report_fraction(
            PROGRESS_BASE,
            PROGRESS_SPAN,
            page_number as usize,
            total,
            format!("Extracting text from page {}/{}…", page_number, total),
        );
    }

    Ok(lines)
}

/// Split one page's text on line feeds.
///
/// Interior blank lines survive; the empty tail after a final line feed
/// is not a line of its own.
fn split_page_text(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Number of pages in a source, or 1 when the document cannot be opened.
pub fn page_count(source: &PdfSource) -> u32 {
    match LopdfBackend::load_bytes(source.bytes()) {
        Ok(backend) => backend.page_count(),
        Err(e) => {
            log::debug!("Page count unavailable ({}), assuming 1", e);
            1
        }
    }
}

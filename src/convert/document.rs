//! Word-processing output: title, page sections and body paragraphs.

use super::{ConversionJob, ConvertOptions, OfficeConverter, TargetFormat};
use crate::error::Result;
use crate::extract;
use crate::ooxml::docx::{self, DocBlock};
use crate::ooxml::DocProps;
use crate::progress::ProgressTracker;
use crate::sink::OutputDocument;

const CONTENT_BASE: u8 = 50;
const CONTENT_SPAN: u8 = 40;

/// Builds `.docx` output.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentBuilder;

impl OfficeConverter for DocumentBuilder {
    fn format(&self) -> TargetFormat {
        TargetFormat::WordProcessing
    }

    fn name(&self) -> &str {
        "document"
    }

    fn convert(&self, job: &mut ConversionJob<'_>) -> Result<OutputDocument> {
        let (source, options) = (job.source(), job.options());
        let progress = job.progress();

        progress.report(5, "Opening PDF…");
        let page_count = extract::page_count(source);
        progress.report(15, format!("Found {} pages…", page_count));

        let lines = extract::extract(source, progress)?;
        progress.checkpoint()?;

        progress.report(CONTENT_BASE, "Writing document content…");
        let blocks = layout_document(&lines, options, progress)?;

        progress.report(93, "Saving Word document…");
        let bytes = docx::write_document(&blocks, &DocProps::now(&options.document_title))?;
        Ok(OutputDocument::new(TargetFormat::WordProcessing, bytes))
    }
}

/// Marker text without its dashes: `--- Page 3 ---` becomes `Page 3`.
fn marker_label(line: &str) -> String {
    line.replace("---", "").trim().to_string()
}

/// Turn extracted lines into document blocks.
///
/// The title comes first. Every page marker after the first is preceded by
/// a page break. Body lines keep their original text; the heading policy
/// sees them untrimmed.
pub fn layout_document(
    lines: &[String],
    options: &ConvertOptions,
    progress: &mut ProgressTracker<'_>,
) -> Result<Vec<DocBlock>> {
    let total = lines.len();
    let mut blocks = Vec::with_capacity(total + 1);
    blocks.push(DocBlock::Title(options.document_title.clone()));

    let mut first_page = true;
    for (index, line) in lines.iter().enumerate() {
        progress.checkpoint()?;

        if extract::is_page_marker(line) {
            if !first_page {
                blocks.push(DocBlock::PageBreak);
            }
            blocks.push(DocBlock::PageMarker(marker_label(line)));
            first_page = false;
        } else if line.trim().is_empty() {
            blocks.push(DocBlock::Blank);
        } else {
            blocks.push(DocBlock::Text {
                text: line.clone(),
                heading: options.heading_policy.is_heading(line),
            });
        }

        progress.report_fraction(CONTENT_BASE, CONTENT_SPAN, index + 1, total, "Writing content…");
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopReporter;

    fn layout(items: &[&str]) -> Vec<DocBlock> {
        let lines: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        let mut progress = ProgressTracker::new(&NoopReporter);
        layout_document(&lines, &ConvertOptions::default(), &mut progress).unwrap()
    }

    #[test]
    fn test_marker_heading_and_body() {
        let blocks = layout(&[
            "--- Page 1 ---",
            "Short Title",
            "This is a normal sentence.",
        ]);
        assert_eq!(
            blocks,
            vec![
                DocBlock::Title("Converted by Hanu PDF Converter".into()),
                DocBlock::PageMarker("Page 1".into()),
                DocBlock::Text {
                    text: "Short Title".into(),
                    heading: true
                },
                DocBlock::Text {
                    text: "This is a normal sentence.".into(),
                    heading: false
                },
            ]
        );
    }

    #[test]
    fn test_page_break_before_later_markers() {
        let blocks = layout(&["--- Page 1 ---", "", "--- Page 2 ---"]);
        assert_eq!(
            blocks[1..],
            [
                DocBlock::PageMarker("Page 1".into()),
                DocBlock::Blank,
                DocBlock::PageBreak,
                DocBlock::PageMarker("Page 2".into()),
            ]
        );
    }

    #[test]
    fn test_custom_title() {
        let options = ConvertOptions::default().with_document_title("Quarterly");
        let mut progress = ProgressTracker::new(&NoopReporter);
        let blocks = layout_document(&[], &options, &mut progress).unwrap();
        assert_eq!(blocks, vec![DocBlock::Title("Quarterly".into())]);
    }

    #[test]
    fn test_marker_label() {
        assert_eq!(marker_label("--- Page 12 ---"), "Page 12");
    }
}

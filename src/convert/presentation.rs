//! Presentation output: one full-canvas picture slide per page.

use super::{ConversionJob, ConvertOptions, OfficeConverter, SlideImageFormat, TargetFormat};
use crate::error::Result;
use crate::ooxml::pptx::{self, Anchor, PictureFormat, Slide, SLIDE_HEIGHT, SLIDE_WIDTH};
use crate::ooxml::DocProps;
use crate::raster::{RasterPage, RasterSession};
use crate::sink::OutputDocument;

const PAGES_BASE: u8 = 10;
const PAGES_SPAN: u8 = 82;

/// The picture fills the whole canvas; aspect ratio is not preserved.
pub const PICTURE_ANCHOR: Anchor = Anchor::new(0.0, 0.0, SLIDE_WIDTH, SLIDE_HEIGHT);

/// Page counter in the bottom-right corner.
pub const LABEL_ANCHOR: Anchor = Anchor::new(SLIDE_WIDTH - 80.0, SLIDE_HEIGHT - 30.0, 70.0, 24.0);

/// Builds `.pptx` output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresentationBuilder;

impl OfficeConverter for PresentationBuilder {
    fn format(&self) -> TargetFormat {
        TargetFormat::Presentation
    }

    fn name(&self) -> &str {
        "presentation"
    }

    fn convert(&self, job: &mut ConversionJob<'_>) -> Result<OutputDocument> {
        let (source, options) = (job.source(), job.options());
        let progress = job.progress();

        progress.report(5, "Opening PDF…");
        // Closed on every exit path when `session` is dropped.
        let mut session = RasterSession::open(source)?;
        let total = session.page_count();
        progress.report(PAGES_BASE, format!("Rendering {} PDF pages…", total));

        let mut slides = Vec::with_capacity(total);
        for index in 0..total {
            progress.checkpoint()?;

            let page = session.render(index, options.raster_scale)?;
            slides.push(page_slide(&page, index, total, options)?);

            progress.report_fraction(
                PAGES_BASE,
                PAGES_SPAN,
                index + 1,
                total,
                format!("Converting page {} of {}…", index + 1, total),
            );
        }
        session.close();

        progress.report(94, "Saving PowerPoint file…");
        let title = source.name().unwrap_or("Presentation");
        let bytes = pptx::write_presentation(&slides, &DocProps::now(title))?;
        Ok(OutputDocument::new(TargetFormat::Presentation, bytes))
    }
}

/// Counter text for a 0-based page index.
pub fn slide_label(index: usize, total: usize) -> String {
    format!("{} / {}", index + 1, total)
}

fn page_slide(
    page: &RasterPage,
    index: usize,
    total: usize,
    options: &ConvertOptions,
) -> Result<Slide> {
    let (picture, picture_format) = match options.slide_image {
        SlideImageFormat::Png => (page.encode_png()?, PictureFormat::Png),
        SlideImageFormat::Jpeg { quality } => (page.encode_jpeg(quality)?, PictureFormat::Jpeg),
    };
    Ok(Slide {
        picture,
        picture_format,
        picture_anchor: PICTURE_ANCHOR,
        label: slide_label(index, total),
        label_anchor: LABEL_ANCHOR,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_label() {
        assert_eq!(slide_label(0, 3), "1 / 3");
        assert_eq!(slide_label(2, 3), "3 / 3");
    }

    #[test]
    fn test_label_anchor() {
        assert_eq!(LABEL_ANCHOR, Anchor::new(640.0, 510.0, 70.0, 24.0));
        assert_eq!(PICTURE_ANCHOR.width, 720.0);
    }
}

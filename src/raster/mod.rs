//! Page rasterization.
//!
//! A [`RasterSession`] keeps one parsed document open for the lifetime of a
//! job and renders pages from it one at a time. The session is closed exactly
//! once: explicitly through [`RasterSession::close`], or on drop when a job
//! bails out early.
//!
//! Painting covers paths, solid colors, images and form XObjects. Text is
//! drawn as greeked bars at the positions the glyphs would occupy; glyph
//! outlines are not rendered.

mod image;
mod interpreter;

use tiny_skia::{Color, Pixmap, Transform};

use crate::backend::{LopdfBackend, MediaBox, PageId, PdfBackend};
use crate::error::{Error, Result};
use crate::source::PdfSource;

use interpreter::Painter;

/// Largest bitmap edge we agree to allocate, in pixels.
const MAX_DIMENSION: u32 = 16_384;

/// A rendered page: RGBA, 8 bits per channel, premultiplied alpha.
pub struct RasterPage {
    page_index: usize,
    pixmap: Pixmap,
}

impl RasterPage {
    /// 0-based index of the page this bitmap was rendered from.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Raw RGBA pixels, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// RGBA value of a single pixel, `None` outside the bitmap.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        // tiny-skia only checks the linear offset, so a large `x` would wrap.
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let p = self.pixmap.pixel(x, y)?.demultiply();
        Some([p.red(), p.green(), p.blue(), p.alpha()])
    }

    /// Encode as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| Error::Package(format!("PNG encoding failed: {}", e)))
    }

    /// Encode as JPEG with the given quality (1-100).
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        use ::image::codecs::jpeg::JpegEncoder;
        use ::image::{ExtendedColorType, ImageEncoder};

        let mut rgb = Vec::with_capacity((self.width() * self.height() * 3) as usize);
        for pixel in self.pixmap.pixels() {
            let p = pixel.demultiply();
            rgb.extend_from_slice(&[p.red(), p.green(), p.blue()]);
        }

        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).write_image(
            &rgb,
            self.width(),
            self.height(),
            ExtendedColorType::Rgb8,
        )?;
        Ok(out)
    }
}

impl std::fmt::Debug for RasterPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterPage")
            .field("page_index", &self.page_index)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Pixel size of a page rendered at `scale`.
pub fn raster_size(media_box: &MediaBox, scale: f32) -> (u32, u32) {
    let w = (media_box.width * scale).ceil().max(1.0) as u32;
    let h = (media_box.height * scale).ceil().max(1.0) as u32;
    (w, h)
}

/// One open renderer over a source document.
#[derive(Debug)]
pub struct RasterSession {
    backend: Option<LopdfBackend>,
    pages: Vec<PageId>,
    rendered: usize,
}

impl RasterSession {
    /// Parse the source and prepare it for rendering.
    ///
    /// A document that cannot be opened is reported as a render failure of
    /// page 1.
    pub fn open(source: &PdfSource) -> Result<Self> {
        let backend = LopdfBackend::load_bytes(source.bytes()).map_err(|e| Error::PageRender {
            page: 1,
            reason: format!("cannot open document: {}", e),
        })?;
        let pages: Vec<PageId> = backend.pages().into_values().collect();
        log::debug!("Renderer session opened ({} pages)", pages.len());
        Ok(Self {
            backend: Some(backend),
            pages,
            rendered: 0,
        })
    }

    /// Number of pages available.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of pages rendered so far.
    pub fn pages_rendered(&self) -> usize {
        self.rendered
    }

    /// Page geometry in PDF units.
    pub fn media_box(&self, page_index: usize) -> Result<MediaBox> {
        let (backend, page) = self.page(page_index)?;
        Ok(backend.media_box(page))
    }

    /// Render one page (0-based) at `scale` onto an opaque white bitmap of
    /// `ceil(width * scale)` x `ceil(height * scale)` pixels.
    pub fn render(&mut self, page_index: usize, scale: f32) -> Result<RasterPage> {
        let page_number = page_index as u32 + 1;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::PageRender {
                page: page_number,
                reason: format!("invalid scale {}", scale),
            });
        }

        let (backend, page) = self.page(page_index)?;
        let media_box = backend.media_box(page);
        let (width, height) = raster_size(&media_box, scale);
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::PageRender {
                page: page_number,
                reason: format!("bitmap {}x{} exceeds size limit", width, height),
            });
        }

        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| Error::PageRender {
            page: page_number,
            reason: format!("cannot allocate {}x{} bitmap", width, height),
        })?;
        pixmap.fill(Color::WHITE);

        // PDF user space has its origin bottom-left; flip into pixel space.
        let base = Transform::from_row(
            scale,
            0.0,
            0.0,
            -scale,
            -media_box.x * scale,
            height as f32 + media_box.y * scale,
        );

        let content = backend
            .page_content(page)
            .map_err(|e| page_error(page_number, e))?;
        let operations = backend
            .decode_content(&content)
            .map_err(|e| page_error(page_number, e))?;

        let mut painter = Painter::new(backend, &mut pixmap, base);
        painter.run(&operations, backend.page_resources(page));

        self.rendered += 1;
        log::debug!("Rendered page {} at {}x{}", page_number, width, height);

        Ok(RasterPage { page_index, pixmap })
    }

    /// Close the session. Dropping an open session closes it as well.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.backend.take().is_some() {
            log::debug!(
                "Renderer session closed after {} of {} pages",
                self.rendered,
                self.pages.len()
            );
        }
    }

    fn page(&self, page_index: usize) -> Result<(&LopdfBackend, PageId)> {
        let page_number = page_index as u32 + 1;
        let backend = self.backend.as_ref().ok_or_else(|| Error::PageRender {
            page: page_number,
            reason: "renderer session is closed".to_string(),
        })?;
        let page = self
            .pages
            .get(page_index)
            .copied()
            .ok_or_else(|| Error::PageRender {
                page: page_number,
                reason: format!(
                    "page index out of range (document has {} pages)",
                    self.pages.len()
                ),
            })?;
        Ok((backend, page))
    }
}

impl Drop for RasterSession {
    fn drop(&mut self) {
        self.release();
    }
}

fn page_error(page: u32, err: Error) -> Error {
    Error::PageRender {
        page,
        reason: err.to_string(),
    }
}

/// Render a single page without keeping a session around.
pub fn render_page(source: &PdfSource, page_index: usize, scale: f32) -> Result<RasterPage> {
    let mut session = RasterSession::open(source)?;
    let page = session.render(page_index, scale);
    session.close();
    page
}

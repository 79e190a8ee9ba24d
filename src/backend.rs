//! PDF backend abstraction layer.
//!
//! Text extraction talks to the document through the [`PdfBackend`] trait so
//! the lopdf types stay in this module. The rasterizer needs finer access
//! (resources, XObjects) and uses [`LopdfBackend`]'s inherent methods.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};

/// Page identifier: (object number, generation number).
pub type PageId = ObjectId;

/// Letter size, used when a page has no usable media box.
pub const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Parent chains deeper than this are treated as cycles.
const MAX_TREE_DEPTH: usize = 32;

/// Page rectangle in PDF user space units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for MediaBox {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: DEFAULT_PAGE_SIZE.0,
            height: DEFAULT_PAGE_SIZE.1,
        }
    }
}

/// Abstract interface for the text side of a PDF document.
pub trait PdfBackend {
    /// Return all pages as (1-based page number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Number of pages in the document.
    fn page_count(&self) -> u32 {
        self.pages().len() as u32
    }

    /// Raw text of a single page (1-based), lines separated by `\n`.
    fn page_text(&self, page_number: u32) -> Result<String>;
}

// ---------------------------------------------------------------------------
// LopdfBackend — concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
#[derive(Debug)]
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;
        Ok(Self { doc })
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Follow references until a direct object is reached.
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        let mut current = obj;
        for _ in 0..MAX_TREE_DEPTH {
            match current {
                Object::Reference(id) => match self.doc.get_object(*id) {
                    Ok(next) => current = next,
                    Err(_) => return current,
                },
                _ => return current,
            }
        }
        current
    }

    /// Resolve `obj` and view it as a dictionary (streams yield their dict).
    pub fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match self.resolve(obj) {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    /// Look up a page attribute, walking up the page tree for inherited keys.
    pub fn inherited_attribute(&self, page: PageId, key: &[u8]) -> Option<&Object> {
        let mut node = self.doc.get_dictionary(page).ok()?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = node.get(key) {
                return Some(value);
            }
            let parent = node.get(b"Parent").ok()?;
            node = self.resolve_dict(parent)?;
        }
        None
    }

    /// Media box of a page, inherited if necessary.
    pub fn media_box(&self, page: PageId) -> MediaBox {
        let Some(array) = self
            .inherited_attribute(page, b"MediaBox")
            .map(|o| self.resolve(o))
            .and_then(|o| o.as_array().ok())
        else {
            return MediaBox::default();
        };

        let nums: Vec<f32> = array
            .iter()
            .filter_map(|o| number(self.resolve(o)))
            .collect();
        if nums.len() < 4 {
            return MediaBox::default();
        }

        let (x0, x1) = (nums[0].min(nums[2]), nums[0].max(nums[2]));
        let (y0, y1) = (nums[1].min(nums[3]), nums[1].max(nums[3]));
        if x1 - x0 <= 0.0 || y1 - y0 <= 0.0 {
            return MediaBox::default();
        }

        MediaBox {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    /// Resource dictionary of a page, inherited if necessary.
    pub fn page_resources(&self, page: PageId) -> Option<&Dictionary> {
        self.inherited_attribute(page, b"Resources")
            .and_then(|o| self.resolve_dict(o))
    }

    /// Return the raw (decompressed) content stream bytes for a page.
    pub fn page_content(&self, page: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let Ok(contents) = page_dict.get(b"Contents") else {
            // A page without content is blank, not broken.
            return Ok(Vec::new());
        };

        match self.resolve(contents) {
            Object::Stream(s) => s
                .decompressed_content()
                .or_else(|_| Ok(s.content.clone())),
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Stream(s) = self.resolve(obj) {
                        let data = s
                            .decompressed_content()
                            .unwrap_or_else(|_| s.content.clone());
                        content.extend_from_slice(&data);
                        content.push(b' ');
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    /// Parse raw content stream bytes into operations.
    pub fn decode_content(&self, data: &[u8]) -> Result<Vec<lopdf::content::Operation>> {
        let content =
            lopdf::content::Content::decode(data).map_err(|e| Error::PdfParse(e.to_string()))?;
        Ok(content.operations)
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_text(&self, page_number: u32) -> Result<String> {
        self.doc
            .extract_text(&[page_number])
            .map_err(|e| Error::TextExtract(format!("Page {}: {}", page_number, e)))
    }
}

/// Helper: read a number from an integer or real object.
pub fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

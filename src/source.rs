//! Source document handle.

use std::io::{Cursor, Read};
use std::path::Path;

use crate::error::Result;

/// Immutable, seekable handle to the bytes of a PDF.
///
/// A job borrows the source for its whole duration; moving a source into
/// [`Engine::spawn`](crate::Engine::spawn) hands exclusive ownership to the
/// worker so no two builders can read the same handle at once.
#[derive(Clone)]
pub struct PdfSource {
    name: Option<String>,
    data: Vec<u8>,
}

impl PdfSource {
    /// Read a PDF from disk. The file name is kept for output naming.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Ok(Self { name, data })
    }

    /// Wrap bytes already in memory.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: None,
            data: data.into(),
        }
    }

    /// Drain a reader into a new source.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::from_bytes(data))
    }

    /// Attach a display name (usually the original file name).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display name, if known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the source holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Seekable reader over the bytes.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.data)
    }

    /// Raw document bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl std::fmt::Debug for PdfSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfSource")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Seek, SeekFrom};

    #[test]
    fn test_from_bytes() {
        let source = PdfSource::from_bytes(b"%PDF-1.4".to_vec()).with_name("report.pdf");
        assert_eq!(source.len(), 8);
        assert!(!source.is_empty());
        assert_eq!(source.name(), Some("report.pdf"));
    }

    #[test]
    fn test_reader_is_seekable() {
        let source = PdfSource::from_bytes(b"%PDF-1.4".to_vec());
        let mut reader = source.reader();
        reader.seek(SeekFrom::Start(5)).unwrap();
        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "1.4");
    }

    #[test]
    fn test_open_missing_file() {
        assert!(PdfSource::open("/definitely/not/here.pdf").is_err());
    }

    #[test]
    fn test_debug_hides_bytes() {
        let source = PdfSource::from_bytes(vec![0u8; 32]);
        assert_eq!(format!("{:?}", source), "PdfSource { name: None, len: 32 }");
    }
}

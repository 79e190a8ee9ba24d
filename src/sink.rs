//! Output sinks.
//!
//! A finished [`OutputDocument`] is handed to a [`ByteSink`] by value; the
//! engine keeps no copy. [`FileSink`] makes the write all-or-nothing: bytes go
//! to a temporary file next to the destination, which is renamed into place
//! only after everything was written and flushed.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::convert::TargetFormat;
use crate::error::{Error, Result};

/// A finished office document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDocument {
    /// Container format of `bytes`
    pub format: TargetFormat,
    /// Complete zip package
    pub bytes: Vec<u8>,
}

impl OutputDocument {
    /// Wrap finished package bytes.
    pub fn new(format: TargetFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    /// Package size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the package is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MIME type of the package.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Destination for a finished document.
pub trait ByteSink {
    /// Take ownership of the document and store it. Any error is fatal to
    /// the job.
    fn write_document(&mut self, document: OutputDocument) -> Result<()>;
}

impl ByteSink for Vec<u8> {
    fn write_document(&mut self, document: OutputDocument) -> Result<()> {
        *self = document.bytes;
        Ok(())
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write_document(&mut self, document: OutputDocument) -> Result<()> {
        (**self).write_document(document)
    }
}

/// Sink writing to a file path atomically.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    written: Option<u64>,
}

impl FileSink {
    /// Sink for the given destination path. Nothing is touched until the
    /// document arrives.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            written: None,
        }
    }

    /// Sink for `dir/file_name`, creating `dir` if needed.
    pub fn in_dir(dir: impl AsRef<Path>, file_name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(Error::SinkWrite)?;
        Ok(Self::new(dir.join(file_name)))
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written, once the document was persisted.
    pub fn bytes_written(&self) -> Option<u64> {
        self.written
    }
}

impl ByteSink for FileSink {
    fn write_document(&mut self, document: OutputDocument) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        // Dropping the temp file on any early return removes it.
        let mut temp = NamedTempFile::new_in(&dir).map_err(Error::SinkWrite)?;
        temp.write_all(&document.bytes).map_err(Error::SinkWrite)?;
        temp.as_file().sync_all().map_err(Error::SinkWrite)?;
        temp.persist(&self.path)
            .map_err(|e| Error::SinkWrite(e.error))?;

        self.written = Some(document.bytes.len() as u64);
        log::debug!(
            "Wrote {} bytes to {}",
            document.bytes.len(),
            self.path.display()
        );
        Ok(())
    }
}

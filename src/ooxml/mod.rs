//! Minimal Office Open XML packaging.
//!
//! Each container is a zip archive of XML parts tied together by
//! `[Content_Types].xml` and relationship parts. [`Package`] collects the
//! parts in memory; the format modules only produce XML strings.

pub mod docx;
pub mod pptx;
pub mod xlsx;

use std::borrow::Cow;
use std::fmt::Write as _;
use std::io::{Cursor, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;

pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub(crate) mod rel {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const WORKSHEET: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
    pub const SHARED_STRINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
}

/// Application name written into document properties.
pub const APPLICATION: &str = "Hanu PDF Converter";

/// Package-level metadata shared by all three formats.
#[derive(Debug, Clone, PartialEq)]
pub struct DocProps {
    pub title: String,
    pub creator: String,
    pub created: DateTime<Utc>,
}

impl DocProps {
    /// Properties stamped with the current time.
    pub fn now(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            creator: APPLICATION.to_string(),
            created: Utc::now(),
        }
    }

    fn core_xml(&self) -> String {
        let stamp = self.created.to_rfc3339_opts(SecondsFormat::Secs, true);
        format!(
            concat!(
                "{decl}",
                r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
                r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
                r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
                "<dc:title>{title}</dc:title>",
                "<dc:creator>{creator}</dc:creator>",
                "<cp:lastModifiedBy>{creator}</cp:lastModifiedBy>",
                r#"<dcterms:created xsi:type="dcterms:W3CDTF">{stamp}</dcterms:created>"#,
                r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{stamp}</dcterms:modified>"#,
                "</cp:coreProperties>"
            ),
            decl = XML_DECLARATION,
            title = xml_text(&self.title),
            creator = xml_text(&self.creator),
            stamp = stamp,
        )
    }

    fn app_xml(&self) -> String {
        format!(
            concat!(
                "{decl}",
                r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" "#,
                r#"xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
                "<Application>{app}</Application>",
                "</Properties>"
            ),
            decl = XML_DECLARATION,
            app = xml_text(APPLICATION),
        )
    }
}

/// Escape text for element content or attribute values.
///
/// Characters XML 1.0 cannot carry at all (most C0 controls) are dropped;
/// extracted PDF text contains them surprisingly often.
pub fn xml_text(s: &str) -> Cow<'_, str> {
    if s.chars().all(is_xml_char) {
        quick_xml::escape::escape(s)
    } else {
        let cleaned: String = s.chars().filter(|c| is_xml_char(*c)).collect();
        Cow::Owned(quick_xml::escape::escape(&cleaned).into_owned())
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// `[Content_Types].xml` builder.
#[derive(Debug, Default)]
pub(crate) struct ContentTypes {
    defaults: Vec<(&'static str, &'static str)>,
    overrides: Vec<(String, &'static str)>,
}

impl ContentTypes {
    pub(crate) fn new() -> Self {
        let mut types = Self::default();
        types.add_default(
            "rels",
            "application/vnd.openxmlformats-package.relationships+xml",
        );
        types.add_default("xml", "application/xml");
        types.add(
            "/docProps/core.xml",
            "application/vnd.openxmlformats-package.core-properties+xml",
        );
        types.add(
            "/docProps/app.xml",
            "application/vnd.openxmlformats-officedocument.extended-properties+xml",
        );
        types
    }

    pub(crate) fn add_default(&mut self, extension: &'static str, mime: &'static str) {
        if !self.defaults.iter().any(|(e, _)| *e == extension) {
            self.defaults.push((extension, mime));
        }
    }

    pub(crate) fn add(&mut self, part: impl Into<String>, mime: &'static str) {
        self.overrides.push((part.into(), mime));
    }

    pub(crate) fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (ext, mime) in &self.defaults {
            let _ = write!(xml, r#"<Default Extension="{}" ContentType="{}"/>"#, ext, mime);
        }
        for (part, mime) in &self.overrides {
            let _ = write!(
                xml,
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                xml_text(part),
                mime
            );
        }
        xml.push_str("</Types>");
        xml
    }
}

/// A relationships part (`_rels/*.rels`).
#[derive(Debug, Default)]
pub(crate) struct Relationships {
    items: Vec<(String, &'static str, String)>,
}

impl Relationships {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a relationship and return its id (`rId1`, `rId2`, ...).
    pub(crate) fn add(&mut self, kind: &'static str, target: impl Into<String>) -> String {
        let id = format!("rId{}", self.items.len() + 1);
        self.items.push((id.clone(), kind, target.into()));
        id
    }

    pub(crate) fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (id, kind, target) in &self.items {
            let _ = write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                id,
                kind,
                xml_text(target)
            );
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// In-memory zip package.
pub(crate) struct Package {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl Package {
    pub(crate) fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    /// Add one part. `path` has no leading slash.
    pub(crate) fn add(&mut self, path: &str, contents: impl AsRef<[u8]>) -> Result<()> {
        self.zip.start_file(path, self.options)?;
        self.zip.write_all(contents.as_ref())?;
        Ok(())
    }

    /// Add an already compressed payload (PNG, JPEG) without deflating it again.
    pub(crate) fn add_stored(&mut self, path: &str, contents: &[u8]) -> Result<()> {
        let options = self.options.compression_method(CompressionMethod::Stored);
        self.zip.start_file(path, options)?;
        self.zip.write_all(contents)?;
        Ok(())
    }

    /// Write the package-level parts every format shares: content types,
    /// the root relationships pointing at `main_part`, and docProps.
    pub(crate) fn add_common(
        &mut self,
        types: &ContentTypes,
        main_part: &str,
        props: &DocProps,
    ) -> Result<()> {
        self.add("[Content_Types].xml", types.to_xml())?;

        let mut root = Relationships::new();
        root.add(rel::OFFICE_DOCUMENT, main_part);
        root.add(rel::CORE_PROPERTIES, "docProps/core.xml");
        root.add(rel::EXTENDED_PROPERTIES, "docProps/app.xml");
        self.add("_rels/.rels", root.to_xml())?;

        self.add("docProps/core.xml", props.core_xml())?;
        self.add("docProps/app.xml", props.app_xml())?;
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<Vec<u8>> {
        Ok(self.zip.finish()?.into_inner())
    }
}

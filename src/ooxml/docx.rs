//! WordprocessingML serializer.

use std::fmt::Write as _;

use super::{rel, xml_text, ContentTypes, DocProps, Package, Relationships, XML_DECLARATION};
use crate::error::Result;

pub const MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Font sizes are in half-points.
const TITLE_SIZE: u32 = 28;
const MARKER_SIZE: u32 = 18;
const BODY_SIZE: u32 = 22;
const HEADING_SIZE: u32 = 24;

const TITLE_COLOR: &str = "1A6B3A";
const MARKER_COLOR: &str = "888888";
const BODY_FONT: &str = "Calibri";

/// One block of the document body, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocBlock {
    /// Centered bold title followed by a line break.
    Title(String),
    /// Paragraph holding a hard page break.
    PageBreak,
    /// Page boundary label rendered in the `Heading2` style.
    PageMarker(String),
    /// Empty paragraph.
    Blank,
    /// Body text; `heading` switches on bold 12pt emphasis.
    Text { text: String, heading: bool },
}

fn write_block(xml: &mut String, block: &DocBlock) {
    match block {
        DocBlock::Title(text) => {
            let _ = write!(
                xml,
                concat!(
                    r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr>"#,
                    r#"<w:r><w:rPr><w:b/><w:color w:val="{color}"/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/></w:rPr>"#,
                    r#"<w:t xml:space="preserve">{text}</w:t><w:br/></w:r></w:p>"#
                ),
                color = TITLE_COLOR,
                size = TITLE_SIZE,
                text = xml_text(text)
            );
        }
        DocBlock::PageBreak => {
            xml.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
        }
        DocBlock::PageMarker(text) => {
            let _ = write!(
                xml,
                concat!(
                    r#"<w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr>"#,
                    r#"<w:r><w:rPr><w:color w:val="{color}"/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/></w:rPr>"#,
                    r#"<w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#
                ),
                color = MARKER_COLOR,
                size = MARKER_SIZE,
                text = xml_text(text)
            );
        }
        DocBlock::Blank => xml.push_str("<w:p/>"),
        DocBlock::Text { text, heading } => {
            let (bold, size) = if *heading {
                ("<w:b/>", HEADING_SIZE)
            } else {
                ("", BODY_SIZE)
            };
            let _ = write!(
                xml,
                concat!(
                    r#"<w:p><w:r><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#,
                    r#"{bold}<w:sz w:val="{size}"/><w:szCs w:val="{size}"/></w:rPr>"#,
                    r#"<w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#
                ),
                font = BODY_FONT,
                bold = bold,
                size = size,
                text = xml_text(text)
            );
        }
    }
}

/// `word/document.xml` for the given blocks.
pub fn document_xml(blocks: &[DocBlock]) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>"#,
    );
    for block in blocks {
        write_block(&mut xml, block);
    }
    // US Letter, 1 inch margins.
    xml.push_str(concat!(
        r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/>"#,
        r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/>"#,
        "</w:sectPr></w:body></w:document>"
    ));
    xml
}

const STYLES_XML: &str = concat!(
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/>"#,
    r#"<w:sz w:val="22"/><w:szCs w:val="22"/></w:rPr></w:rPrDefault>"#,
    r#"<w:pPrDefault><w:pPr><w:spacing w:after="120" w:line="264" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults>"#,
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/>"#,
    r#"<w:next w:val="Normal"/><w:uiPriority w:val="9"/><w:qFormat/>"#,
    r#"<w:pPr><w:keepNext/><w:spacing w:before="240" w:after="60"/><w:outlineLvl w:val="1"/></w:pPr>"#,
    r#"<w:rPr><w:b/><w:sz w:val="26"/><w:szCs w:val="26"/></w:rPr></w:style>"#,
    "</w:styles>"
);

/// Serialize a document package.
pub fn write_document(blocks: &[DocBlock], props: &DocProps) -> Result<Vec<u8>> {
    let mut types = ContentTypes::new();
    types.add(
        "/word/document.xml",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
    );
    types.add(
        "/word/styles.xml",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
    );

    let mut document_rels = Relationships::new();
    document_rels.add(rel::STYLES, "styles.xml");

    let mut pkg = Package::new();
    pkg.add_common(&types, "word/document.xml", props)?;
    pkg.add("word/document.xml", document_xml(blocks))?;
    pkg.add("word/_rels/document.xml.rels", document_rels.to_xml())?;
    pkg.add("word/styles.xml", format!("{}{}", XML_DECLARATION, STYLES_XML))?;
    pkg.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_block() {
        let xml = document_xml(&[DocBlock::Title("Converted & Done".into())]);
        assert!(xml.contains(r#"<w:jc w:val="center"/>"#));
        assert!(xml.contains(r#"<w:color w:val="1A6B3A"/><w:sz w:val="28"/>"#));
        assert!(xml.contains("Converted &amp; Done</w:t><w:br/>"));
    }

    #[test]
    fn test_text_runs() {
        let xml = document_xml(&[
            DocBlock::Text {
                text: "Short Title".into(),
                heading: true,
            },
            DocBlock::Text {
                text: "Body.".into(),
                heading: false,
            },
        ]);
        assert!(xml.contains(r#"<w:b/><w:sz w:val="24"/>"#));
        assert!(xml.contains(r#"w:cs="Calibri"/><w:sz w:val="22"/>"#));
    }

    #[test]
    fn test_page_break_and_marker() {
        let xml = document_xml(&[DocBlock::PageBreak, DocBlock::PageMarker("Page 2".into())]);
        let brk = xml.find(r#"<w:br w:type="page"/>"#).unwrap();
        let marker = xml.find(r#"<w:pStyle w:val="Heading2"/>"#).unwrap();
        assert!(brk < marker);
        assert!(xml.contains(">Page 2</w:t>"));
    }

    #[test]
    fn test_styles_define_heading2() {
        assert!(STYLES_XML.contains(r#"w:styleId="Heading2""#));
        assert!(STYLES_XML.contains(r#"w:styleId="Normal""#));
    }
}

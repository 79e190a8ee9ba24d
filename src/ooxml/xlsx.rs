//! SpreadsheetML serializer.

use std::collections::HashMap;
use std::fmt::Write as _;

use super::{rel, xml_text, ContentTypes, DocProps, Package, Relationships, XML_DECLARATION};
use crate::error::Result;

pub const MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Cell formats defined in `styles.xml`, by `cellXfs` index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellStyle {
    Default = 0,
    /// Bold white text on dark green
    Header = 1,
    /// Wrapped text
    Content = 2,
    /// Wrapped text on a light green tint
    Alternate = 3,
}

/// One row of cells sharing a style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub cells: Vec<String>,
    pub style: CellStyle,
}

/// A single worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    pub name: String,
    pub rows: Vec<SheetRow>,
    /// Widths in character units for the leading columns; other columns
    /// keep the application default.
    pub column_widths: Vec<f64>,
}

/// `A`, `B`, ..., `Z`, `AA`, ... for a 0-based column index.
pub fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Sheet names are at most 31 characters and cannot contain `[]:*?/\`.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(31)
        .collect();
    let cleaned = cleaned.trim_matches('\'').to_string();
    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

#[derive(Default)]
struct SharedStrings {
    index: HashMap<String, usize>,
    strings: Vec<String>,
    references: usize,
}

impl SharedStrings {
    fn intern(&mut self, s: &str) -> usize {
        self.references += 1;
        if let Some(&i) = self.index.get(s) {
            return i;
        }
        let i = self.strings.len();
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), i);
        i
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        let _ = write!(
            xml,
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.references,
            self.strings.len()
        );
        for s in &self.strings {
            let _ = write!(xml, r#"<si><t xml:space="preserve">{}</t></si>"#, xml_text(s));
        }
        xml.push_str("</sst>");
        xml
    }
}

fn sheet_xml(sheet: &Worksheet, strings: &mut SharedStrings) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    if !sheet.column_widths.is_empty() {
        xml.push_str("<cols>");
        for (i, width) in sheet.column_widths.iter().enumerate() {
            let _ = write!(
                xml,
                r#"<col min="{n}" max="{n}" width="{w:.2}" customWidth="1"/>"#,
                n = i + 1,
                w = width
            );
        }
        xml.push_str("</cols>");
    }

    xml.push_str("<sheetData>");
    for (r, row) in sheet.rows.iter().enumerate() {
        let row_number = r + 1;
        let _ = write!(xml, r#"<row r="{}">"#, row_number);
        for (c, value) in row.cells.iter().enumerate() {
            let idx = strings.intern(value);
            let _ = write!(
                xml,
                r#"<c r="{}{}" s="{}" t="s"><v>{}</v></c>"#,
                column_name(c),
                row_number,
                row.style as u8,
                idx
            );
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        concat!(
            "{}",
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets>"#,
            "</workbook>"
        ),
        XML_DECLARATION,
        xml_text(&sanitize_sheet_name(sheet_name))
    )
}

const STYLES_XML: &str = concat!(
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="2">"#,
    r#"<font><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#,
    r#"<font><b/><sz val="11"/><color rgb="FFFFFFFF"/><name val="Calibri"/><family val="2"/></font>"#,
    "</fonts>",
    r#"<fills count="4">"#,
    r#"<fill><patternFill patternType="none"/></fill>"#,
    r#"<fill><patternFill patternType="gray125"/></fill>"#,
    r#"<fill><patternFill patternType="solid"><fgColor rgb="FF228B57"/><bgColor indexed="64"/></patternFill></fill>"#,
    r#"<fill><patternFill patternType="solid"><fgColor rgb="FFF2F7F4"/><bgColor indexed="64"/></patternFill></fill>"#,
    "</fills>",
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="4">"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
    r#"<xf numFmtId="0" fontId="1" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1"/>"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment wrapText="1"/></xf>"#,
    r#"<xf numFmtId="0" fontId="0" fillId="3" borderId="0" xfId="0" applyFill="1" applyAlignment="1"><alignment wrapText="1"/></xf>"#,
    "</cellXfs>",
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    "</styleSheet>"
);

/// Serialize a one-sheet workbook.
pub fn write_workbook(sheet: &Worksheet, props: &DocProps) -> Result<Vec<u8>> {
    let mut strings = SharedStrings::default();
    let sheet_part = sheet_xml(sheet, &mut strings);

    let mut types = ContentTypes::new();
    types.add(
        "/xl/workbook.xml",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
    );
    types.add(
        "/xl/worksheets/sheet1.xml",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
    );
    types.add(
        "/xl/styles.xml",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml",
    );
    types.add(
        "/xl/sharedStrings.xml",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml",
    );

    let mut workbook_rels = Relationships::new();
    workbook_rels.add(rel::WORKSHEET, "worksheets/sheet1.xml");
    workbook_rels.add(rel::STYLES, "styles.xml");
    workbook_rels.add(rel::SHARED_STRINGS, "sharedStrings.xml");

    let mut pkg = Package::new();
    pkg.add_common(&types, "xl/workbook.xml", props)?;
    pkg.add("xl/workbook.xml", workbook_xml(&sheet.name))?;
    pkg.add("xl/_rels/workbook.xml.rels", workbook_rels.to_xml())?;
    pkg.add("xl/worksheets/sheet1.xml", sheet_part)?;
    pkg.add("xl/styles.xml", format!("{}{}", XML_DECLARATION, STYLES_XML))?;
    pkg.add("xl/sharedStrings.xml", strings.to_xml())?;
    pkg.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Converted PDF"), "Converted PDF");
        assert_eq!(sanitize_sheet_name("a/b:c"), "abc");
        assert_eq!(sanitize_sheet_name(""), "Sheet1");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), 31);
    }

    #[test]
    fn test_shared_strings_dedup() {
        let mut strings = SharedStrings::default();
        assert_eq!(strings.intern("a"), 0);
        assert_eq!(strings.intern("b"), 1);
        assert_eq!(strings.intern("a"), 0);
        let xml = strings.to_xml();
        assert!(xml.contains(r#"count="3" uniqueCount="2""#));
    }

    #[test]
    fn test_sheet_xml_cells() {
        let sheet = Worksheet {
            name: "S".to_string(),
            rows: vec![
                SheetRow {
                    cells: vec!["A".into(), "B".into()],
                    style: CellStyle::Header,
                },
                SheetRow {
                    cells: vec!["1 < 2".into()],
                    style: CellStyle::Alternate,
                },
            ],
            column_widths: vec![4.0, 3.0],
        };
        let mut strings = SharedStrings::default();
        let xml = sheet_xml(&sheet, &mut strings);
        assert!(xml.contains(r#"<c r="B1" s="1" t="s"><v>1</v></c>"#));
        assert!(xml.contains(r#"<c r="A2" s="3" t="s"><v>2</v></c>"#));
        assert!(xml.contains(r#"<col min="2" max="2" width="3.00" customWidth="1"/>"#));
        assert!(strings.to_xml().contains("1 &lt; 2"));
    }
}

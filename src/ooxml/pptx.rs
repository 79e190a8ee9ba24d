//! PresentationML serializer.
//!
//! Coordinates are given in points (720 x 540 canvas) and converted to EMU
//! when written.

use std::fmt::Write as _;

use super::{rel, xml_text, ContentTypes, DocProps, Package, Relationships, XML_DECLARATION};
use crate::error::Result;

pub const MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

pub const EMU_PER_POINT: i64 = 12_700;

/// Slide canvas in points (10 x 7.5 inches).
pub const SLIDE_WIDTH: f32 = 720.0;
pub const SLIDE_HEIGHT: f32 = 540.0;

const LABEL_COLOR: &str = "808080";
const LABEL_SIZE: u32 = 900;

const NS: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

/// Rectangle on the slide canvas, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Anchor {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn xfrm(&self) -> String {
        format!(
            r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            emu(self.x),
            emu(self.y),
            emu(self.width),
            emu(self.height)
        )
    }
}

fn emu(points: f32) -> i64 {
    (points as f64 * EMU_PER_POINT as f64).round() as i64
}

/// Encoded picture format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureFormat {
    Png,
    Jpeg,
}

impl PictureFormat {
    pub fn extension(self) -> &'static str {
        match self {
            PictureFormat::Png => "png",
            PictureFormat::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            PictureFormat::Png => "image/png",
            PictureFormat::Jpeg => "image/jpeg",
        }
    }
}

/// One slide: a picture and a text label.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub picture: Vec<u8>,
    pub picture_format: PictureFormat,
    pub picture_anchor: Anchor,
    pub label: String,
    pub label_anchor: Anchor,
}

/// `ppt/slides/slideN.xml`. The picture is referenced through `picture_rel`.
pub fn slide_xml(slide: &Slide, number: usize, picture_rel: &str) -> String {
    let mut xml = String::from(XML_DECLARATION);
    let _ = write!(xml, "<p:sld {}>", NS);
    xml.push_str(concat!(
        "<p:cSld>",
        r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="FFFFFF"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
        "<p:spTree>",
        r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
        r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
    ));

    let _ = write!(
        xml,
        concat!(
            "<p:pic>",
            r#"<p:nvPicPr><p:cNvPr id="2" name="Page {number}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
            r#"<p:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
            r#"<p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#,
            "</p:pic>"
        ),
        number = number,
        rel = picture_rel,
        xfrm = slide.picture_anchor.xfrm()
    );

    let _ = write!(
        xml,
        concat!(
            "<p:sp>",
            r#"<p:nvSpPr><p:cNvPr id="3" name="Page Number"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
            r#"<p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#,
            r#"<p:txBody><a:bodyPr wrap="none" rtlCol="0"/><a:lstStyle/>"#,
            r#"<a:p><a:pPr algn="r"/><a:r><a:rPr lang="en-US" sz="{size}" dirty="0">"#,
            r#"<a:solidFill><a:srgbClr val="{color}"/></a:solidFill></a:rPr>"#,
            "<a:t>{label}</a:t></a:r></a:p></p:txBody>",
            "</p:sp>"
        ),
        xfrm = slide.label_anchor.xfrm(),
        size = LABEL_SIZE,
        color = LABEL_COLOR,
        label = xml_text(&slide.label)
    );

    xml.push_str(
        "</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>",
    );
    xml
}

fn presentation_xml(slide_rels: &[String], master_rel: &str) -> String {
    let mut xml = String::from(XML_DECLARATION);
    let _ = write!(xml, r#"<p:presentation {} saveSubsetFonts="1">"#, NS);
    let _ = write!(
        xml,
        r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="{}"/></p:sldMasterIdLst>"#,
        master_rel
    );
    if !slide_rels.is_empty() {
        xml.push_str("<p:sldIdLst>");
        for (i, rel_id) in slide_rels.iter().enumerate() {
            let _ = write!(xml, r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + i, rel_id);
        }
        xml.push_str("</p:sldIdLst>");
    }
    let _ = write!(
        xml,
        r#"<p:sldSz cx="{}" cy="{}" type="screen4x3"/><p:notesSz cx="{}" cy="{}"/>"#,
        emu(SLIDE_WIDTH),
        emu(SLIDE_HEIGHT),
        emu(SLIDE_HEIGHT),
        emu(SLIDE_WIDTH)
    );
    xml.push_str("</p:presentation>");
    xml
}

const EMPTY_TREE: &str = concat!(
    "<p:spTree>",
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
    "</p:spTree>"
);

fn slide_master_xml() -> String {
    format!(
        concat!(
            "{decl}<p:sldMaster {ns}>",
            r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>{tree}</p:cSld>"#,
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" "#,
            r#"accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            "</p:sldMaster>"
        ),
        decl = XML_DECLARATION,
        ns = NS,
        tree = EMPTY_TREE
    )
}

fn slide_layout_xml() -> String {
    format!(
        concat!(
            r#"{decl}<p:sldLayout {ns} type="blank" preserve="1">"#,
            r#"<p:cSld name="Blank">{tree}</p:cSld>"#,
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>",
            "</p:sldLayout>"
        ),
        decl = XML_DECLARATION,
        ns = NS,
        tree = EMPTY_TREE
    )
}

const THEME_XML: &str = concat!(
    r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Hanu">"#,
    r#"<a:themeElements><a:clrScheme name="Hanu">"#,
    r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#,
    r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
    r#"<a:dk2><a:srgbClr val="1F3D2B"/></a:dk2><a:lt2><a:srgbClr val="F2F7F4"/></a:lt2>"#,
    r#"<a:accent1><a:srgbClr val="228B57"/></a:accent1><a:accent2><a:srgbClr val="1A6B3A"/></a:accent2>"#,
    r#"<a:accent3><a:srgbClr val="5FB38A"/></a:accent3><a:accent4><a:srgbClr val="808080"/></a:accent4>"#,
    r#"<a:accent5><a:srgbClr val="4472C4"/></a:accent5><a:accent6><a:srgbClr val="ED7D31"/></a:accent6>"#,
    r#"<a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink>"#,
    "</a:clrScheme>",
    r#"<a:fontScheme name="Hanu">"#,
    r#"<a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
    r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
    "</a:fontScheme>",
    r#"<a:fmtScheme name="Hanu">"#,
    "<a:fillStyleLst>",
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    "</a:fillStyleLst>",
    "<a:lnStyleLst>",
    r#"<a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    "</a:lnStyleLst>",
    "<a:effectStyleLst>",
    "<a:effectStyle><a:effectLst/></a:effectStyle>",
    "<a:effectStyle><a:effectLst/></a:effectStyle>",
    "<a:effectStyle><a:effectLst/></a:effectStyle>",
    "</a:effectStyleLst>",
    "<a:bgFillStyleLst>",
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    "</a:bgFillStyleLst>",
    "</a:fmtScheme></a:themeElements>",
    "<a:objectDefaults/><a:extraClrSchemeLst/>",
    "</a:theme>"
);

/// Serialize a presentation with one slide per entry.
pub fn write_presentation(slides: &[Slide], props: &DocProps) -> Result<Vec<u8>> {
    let mut types = ContentTypes::new();
    types.add(
        "/ppt/presentation.xml",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml",
    );
    types.add(
        "/ppt/slideMasters/slideMaster1.xml",
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml",
    );
    types.add(
        "/ppt/slideLayouts/slideLayout1.xml",
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml",
    );
    types.add(
        "/ppt/theme/theme1.xml",
        "application/vnd.openxmlformats-officedocument.theme+xml",
    );

    let mut presentation_rels = Relationships::new();
    let master_rel = presentation_rels.add(rel::SLIDE_MASTER, "slideMasters/slideMaster1.xml");

    let mut pkg = Package::new();
    let mut slide_rels = Vec::with_capacity(slides.len());

    for (i, slide) in slides.iter().enumerate() {
        let number = i + 1;
        let ext = slide.picture_format.extension();
        types.add_default(ext, slide.picture_format.mime_type());
        types.add(
            format!("/ppt/slides/slide{}.xml", number),
            "application/vnd.openxmlformats-officedocument.presentationml.slide+xml",
        );

        let mut rels = Relationships::new();
        rels.add(rel::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");
        let picture_rel = rels.add(rel::IMAGE, format!("../media/image{}.{}", number, ext));

        pkg.add(
            &format!("ppt/slides/slide{}.xml", number),
            slide_xml(slide, number, &picture_rel),
        )?;
        pkg.add(
            &format!("ppt/slides/_rels/slide{}.xml.rels", number),
            rels.to_xml(),
        )?;
        pkg.add_stored(&format!("ppt/media/image{}.{}", number, ext), &slide.picture)?;

        slide_rels.push(presentation_rels.add(rel::SLIDE, format!("slides/slide{}.xml", number)));
    }
    presentation_rels.add(rel::THEME, "theme/theme1.xml");

    let mut master_rels = Relationships::new();
    master_rels.add(rel::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");
    master_rels.add(rel::THEME, "../theme/theme1.xml");

    let mut layout_rels = Relationships::new();
    layout_rels.add(rel::SLIDE_MASTER, "../slideMasters/slideMaster1.xml");

    pkg.add_common(&types, "ppt/presentation.xml", props)?;
    pkg.add(
        "ppt/presentation.xml",
        presentation_xml(&slide_rels, &master_rel),
    )?;
    pkg.add("ppt/_rels/presentation.xml.rels", presentation_rels.to_xml())?;
    pkg.add("ppt/slideMasters/slideMaster1.xml", slide_master_xml())?;
    pkg.add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        master_rels.to_xml(),
    )?;
    pkg.add("ppt/slideLayouts/slideLayout1.xml", slide_layout_xml())?;
    pkg.add(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        layout_rels.to_xml(),
    )?;
    pkg.add(
        "ppt/theme/theme1.xml",
        format!("{}{}", XML_DECLARATION, THEME_XML),
    )?;
    pkg.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(label: &str) -> Slide {
        Slide {
            picture: vec![0x89, b'P', b'N', b'G'],
            picture_format: PictureFormat::Png,
            picture_anchor: Anchor::new(0.0, 0.0, SLIDE_WIDTH, SLIDE_HEIGHT),
            label: label.to_string(),
            label_anchor: Anchor::new(640.0, 510.0, 70.0, 24.0),
        }
    }

    #[test]
    fn test_emu() {
        assert_eq!(emu(SLIDE_WIDTH), 9_144_000);
        assert_eq!(emu(SLIDE_HEIGHT), 6_858_000);
    }

    #[test]
    fn test_slide_xml_layout() {
        let xml = slide_xml(&slide("2 / 5"), 2, "rId2");
        assert!(xml.contains(r#"<a:blip r:embed="rId2"/>"#));
        assert!(xml.contains(r#"<a:off x="0" y="0"/><a:ext cx="9144000" cy="6858000"/>"#));
        assert!(xml.contains(r#"<a:off x="8128000" y="6477000"/><a:ext cx="889000" cy="304800"/>"#));
        assert!(xml.contains(r#"<a:pPr algn="r"/>"#));
        assert!(xml.contains(r#"sz="900""#));
        assert!(xml.contains("<a:t>2 / 5</a:t>"));
        assert!(xml.contains(r#"<a:srgbClr val="FFFFFF"/>"#));
    }

    #[test]
    fn test_presentation_lists_slides() {
        let xml = presentation_xml(&["rId2".to_string(), "rId3".to_string()], "rId1");
        assert!(xml.contains(r#"<p:sldId id="256" r:id="rId2"/>"#));
        assert!(xml.contains(r#"<p:sldId id="257" r:id="rId3"/>"#));
        assert!(xml.contains(r#"<p:sldSz cx="9144000" cy="6858000""#));
    }

    #[test]
    fn test_picture_format() {
        assert_eq!(PictureFormat::Png.extension(), "png");
        assert_eq!(PictureFormat::Jpeg.mime_type(), "image/jpeg");
    }
}

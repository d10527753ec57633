//! WordprocessingML block markup for generated report content.
//!
//! Pure string builders: every function returns well-formed block-level XML
//! that the insertion pass splices into `word/document.xml`.

use crate::imaging::EmbedSize;
use crate::naming::display_title;
use quick_xml::escape::escape;
use std::fmt::Write;

const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Text width of an A4 page with 2 cm margins, in twentieths of a point.
const TEXT_WIDTH_TWIPS: usize = 9638;
/// Full table width in fiftieths of a percent.
const FULL_WIDTH_PCT: usize = 5000;

/// Deepest heading style the report uses.
const DEEPEST_HEADING_STYLE: usize = 4;

/// An image already stored in the package, ready to reference.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub relationship_id: String,
    /// Unique drawing id (`wp:docPr/@id`).
    pub drawing_id: usize,
    pub name: String,
    pub size: EmbedSize,
}

/// A folder heading.
///
/// `normal_text` sections render as bold justified body text. Otherwise
/// levels 0..=3 map to `Heading1`..=`Heading4`; deeper levels keep
/// `Heading4` and add an explicit bold 12 pt run.
pub fn heading(title: &str, level: usize, normal_text: bool) -> String {
    let text = escape(display_title(title).as_str()).into_owned();
    if normal_text {
        return format!(
            r#"<w:p><w:pPr><w:jc w:val="both"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#
        );
    }

    let style = level.saturating_add(1).min(DEEPEST_HEADING_STYLE);
    let run_props = if level >= DEEPEST_HEADING_STYLE {
        r#"<w:rPr><w:b/><w:sz w:val="24"/></w:rPr>"#
    } else {
        ""
    };
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="Heading{style}"/></w:pPr><w:r>{run_props}<w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#
    )
}

/// Inline drawing run content for one image.
pub fn drawing(image: &EmbeddedImage) -> String {
    let (cx, cy) = image.size.extent_emu();
    let name = escape(image.name.as_str());
    format!(
        concat!(
            r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0" xmlns:wp="{wp}">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:effectExtent l="0" t="0" r="0" b="0"/>"#,
            r#"<wp:docPr id="{id}" name="{name}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="{a}" noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic xmlns:a="{a}"><a:graphicData uri="{pic}"><pic:pic xmlns:pic="{pic}">"#,
            r#"<pic:nvPicPr><pic:cNvPr id="0" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel}" xmlns:r="{r}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"#,
        ),
        wp = WP_NS,
        a = A_NS,
        pic = PIC_NS,
        r = R_NS,
        cx = cx,
        cy = cy,
        id = image.drawing_id,
        name = name,
        rel = image.relationship_id,
    )
}

fn centered_image_paragraph(image: &EmbeddedImage) -> String {
    format!(
        r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r>{}</w:r></w:p>"#,
        drawing(image)
    )
}

/// A single centered image followed by a spacer paragraph.
pub fn single_image(image: &EmbeddedImage) -> String {
    let mut out = centered_image_paragraph(image);
    out.push_str(spacer());
    out
}

/// A borderless one-row table with one equal-width cell per image,
/// followed by a spacer paragraph.
pub fn image_group(images: &[EmbeddedImage]) -> String {
    let columns = images.len().max(1);
    let grid_col = TEXT_WIDTH_TWIPS / columns;
    let cell_pct = FULL_WIDTH_PCT / columns;

    let mut out = String::from(concat!(
        r#"<w:tbl><w:tblPr><w:tblW w:w="5000" w:type="pct"/><w:jc w:val="center"/>"#,
        r#"<w:tblBorders><w:top w:val="none" w:sz="0" w:space="0" w:color="auto"/>"#,
        r#"<w:left w:val="none" w:sz="0" w:space="0" w:color="auto"/>"#,
        r#"<w:bottom w:val="none" w:sz="0" w:space="0" w:color="auto"/>"#,
        r#"<w:right w:val="none" w:sz="0" w:space="0" w:color="auto"/>"#,
        r#"<w:insideH w:val="none" w:sz="0" w:space="0" w:color="auto"/>"#,
        r#"<w:insideV w:val="none" w:sz="0" w:space="0" w:color="auto"/></w:tblBorders>"#,
        r#"<w:tblLayout w:type="fixed"/></w:tblPr><w:tblGrid>"#,
    ));
    for _ in 0..columns {
        let _ = write!(out, r#"<w:gridCol w:w="{grid_col}"/>"#);
    }
    out.push_str("</w:tblGrid><w:tr>");
    for image in images {
        let _ = write!(
            out,
            r#"<w:tc><w:tcPr><w:tcW w:w="{cell_pct}" w:type="pct"/></w:tcPr>{}</w:tc>"#,
            centered_image_paragraph(image)
        );
    }
    out.push_str("</w:tr></w:tbl>");
    out.push_str(spacer());
    out
}

pub fn spacer() -> &'static str {
    "<w:p/>"
}

pub fn page_break() -> &'static str {
    r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::Reader;
    use quick_xml::events::Event;

    fn embedded(n: usize) -> EmbeddedImage {
        EmbeddedImage {
            relationship_id: format!("rIdReport{n}"),
            drawing_id: 10_000 + n,
            name: format!("report_image{n}.jpeg"),
            size: EmbedSize {
                width_cm: 2.0,
                height_cm: 1.0,
            },
        }
    }

    /// Wrap in a root that declares `w:` and parse to the end.
    fn assert_well_formed(markup: &str) {
        let xml = format!(r#"<w:body xmlns:w="w">{markup}</w:body>"#);
        let mut reader = Reader::from_str(&xml);
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => panic!("malformed markup: {e}\n{markup}"),
            }
        }
    }

    #[test]
    fn heading_levels_map_to_styles() {
        assert!(heading("A", 0, false).contains(r#"w:val="Heading1""#));
        assert!(heading("A", 1, false).contains(r#"w:val="Heading2""#));
        assert!(heading("A", 2, false).contains(r#"w:val="Heading3""#));
        assert!(heading("A", 3, false).contains(r#"w:val="Heading4""#));
        assert!(!heading("A", 3, false).contains("<w:b/>"));
    }

    #[test]
    fn deep_headings_reuse_deepest_style_with_bold_fallback() {
        let h = heading("A", 6, false);
        assert!(h.contains(r#"w:val="Heading4""#));
        assert!(h.contains(r#"<w:b/><w:sz w:val="24"/>"#));
    }

    #[test]
    fn huge_level_keeps_deepest_style() {
        let h = heading("A", usize::MAX, false);
        assert!(h.contains(r#"w:val="Heading4""#));
        assert!(h.contains(r#"<w:b/><w:sz w:val="24"/>"#));
    }

    #[test]
    fn normal_text_heading_is_bold_body_text() {
        let h = heading("- Detalhes", 2, true);
        assert!(!h.contains("pStyle"));
        assert!(h.contains(r#"<w:jc w:val="both"/>"#));
        assert!(h.contains("<w:b/>"));
        assert!(h.contains(">- Detalhes:<"));
    }

    #[test]
    fn heading_text_is_cleaned_and_escaped() {
        let h = heading("»»R&D <sala>", 2, false);
        assert!(h.contains(">R&amp;D &lt;sala&gt;:<"));
        assert_well_formed(&h);
    }

    #[test]
    fn drawing_carries_extent_and_relationship() {
        let d = drawing(&embedded(1));
        assert!(d.contains(r#"<wp:extent cx="720000" cy="360000"/>"#));
        assert!(d.contains(r#"r:embed="rIdReport1""#));
        assert!(d.contains(r#"<wp:docPr id="10001""#));
        assert_well_formed(&format!("<w:r>{d}</w:r>"));
    }

    #[test]
    fn single_image_is_centered_and_spaced() {
        let s = single_image(&embedded(1));
        assert!(s.starts_with(r#"<w:p><w:pPr><w:jc w:val="center"/>"#));
        assert!(s.ends_with("<w:p/>"));
        assert_well_formed(&s);
    }

    #[test]
    fn group_table_has_one_equal_cell_per_image() {
        let images = [embedded(1), embedded(2), embedded(3)];
        let t = image_group(&images);
        assert_eq!(t.matches("<w:tc>").count(), 3);
        assert_eq!(t.matches(r#"<w:gridCol w:w="3212"/>"#).count(), 3);
        assert_eq!(t.matches(r#"<w:tcW w:w="1666" w:type="pct"/>"#).count(), 3);
        assert_eq!(t.matches(r#"w:val="none""#).count(), 6);
        assert!(t.ends_with("</w:tbl><w:p/>"));
        assert_well_formed(&t);
    }

    #[test]
    fn group_table_of_one() {
        let t = image_group(&[embedded(1)]);
        assert_eq!(t.matches("<w:tc>").count(), 1);
        assert!(t.contains(r#"<w:tcW w:w="5000" w:type="pct"/>"#));
    }

    #[test]
    fn page_break_and_spacer_are_well_formed() {
        assert_well_formed(page_break());
        assert_well_formed(spacer());
        assert!(page_break().contains(r#"w:type="page""#));
    }
}

//! Slide shapes: reading existing ones and rendering new ones.

use crate::error::{Error, Result};
use crate::xml;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};
use std::fmt::Write as FmtWrite;

/// English Metric Units per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Convert inches to EMU.
pub fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH as f64).round() as i64
}

/// Position and size in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub const fn new(left: i64, top: i64, width: i64, height: i64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    fn write_xfrm(&self, out: &mut String) {
        let _ = write!(
            out,
            r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            self.left, self.top, self.width, self.height
        );
    }
}

/// What a top-level shape can do, decided once while reading the slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// A shape with a text body
    Text,
    /// A picture with an embedded image
    Picture,
    /// Groups, tables, charts, connectors, text-less shapes
    Other,
}

/// The `<p:ph>` of a placeholder shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaceholderRef {
    /// `type` attribute; absent means an object placeholder
    pub kind: Option<String>,
    /// `idx` attribute
    pub idx: Option<u32>,
}

impl PlaceholderRef {
    pub fn new(kind: Option<&str>, idx: Option<u32>) -> Self {
        Self {
            kind: kind.map(str::to_string),
            idx,
        }
    }

    fn kind_is(&self, names: &[&str]) -> bool {
        self.kind.as_deref().is_some_and(|k| names.contains(&k))
    }

    /// Title or centered title.
    pub fn is_title(&self) -> bool {
        self.kind_is(&["title", "ctrTitle"])
    }

    /// Body text region (`body`, `obj`, or untyped).
    pub fn is_body(&self) -> bool {
        self.kind.is_none() || self.kind_is(&["body", "obj"])
    }

    /// Any placeholder that takes free text and is not the title.
    pub fn is_text_slot(&self) -> bool {
        !self.is_title()
            && !self.kind_is(&[
                "dt", "ftr", "sldNum", "hdr", "pic", "chart", "tbl", "clipArt", "dgm", "media",
                "sldImg",
            ])
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str("<p:ph");
        if let Some(kind) = &self.kind {
            let _ = write!(out, r#" type="{}""#, xml::escape(kind));
        }
        if let Some(idx) = self.idx {
            let _ = write!(out, r#" idx="{}""#, idx);
        }
        out.push_str("/>");
    }
}

/// One top-level shape as found in slide XML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeRecord {
    /// `cNvPr/@id`
    pub id: u32,
    /// `cNvPr/@name`
    pub name: String,
    pub kind: ShapeKind,
    pub placeholder: Option<PlaceholderRef>,
    /// Text of each paragraph (text shapes only)
    pub paragraphs: Vec<String>,
    /// Relationship id of the embedded image (pictures only)
    pub embed: Option<String>,
}

impl ShapeRecord {
    /// Paragraphs joined by newlines.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n")
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TopTag {
    Sp,
    Pic,
    Other,
}

struct RecordBuilder {
    tag: TopTag,
    id: Option<u32>,
    name: String,
    placeholder: Option<PlaceholderRef>,
    has_text_body: bool,
    paragraphs: Vec<String>,
    embed: Option<String>,
    in_text: bool,
}

impl RecordBuilder {
    fn new(tag: TopTag) -> Self {
        Self {
            tag,
            id: None,
            name: String::new(),
            placeholder: None,
            has_text_body: false,
            paragraphs: Vec::new(),
            embed: None,
            in_text: false,
        }
    }

    fn finish(self) -> ShapeRecord {
        let kind = match self.tag {
            TopTag::Pic if self.embed.is_some() => ShapeKind::Picture,
            TopTag::Sp if self.has_text_body => ShapeKind::Text,
            _ => ShapeKind::Other,
        };
        ShapeRecord {
            id: self.id.unwrap_or(0),
            name: self.name,
            kind,
            placeholder: self.placeholder,
            paragraphs: if kind == ShapeKind::Text {
                self.paragraphs
            } else {
                Vec::new()
            },
            embed: if kind == ShapeKind::Picture { self.embed } else { None },
        }
    }

    fn on_element(&mut self, e: &quick_xml::events::BytesStart<'_>, is_start: bool) {
        match e.name().local_name().as_ref() {
            b"cNvPr" if self.id.is_none() => {
                self.id = xml::attr(e, b"id").and_then(|v| v.parse().ok()).or(Some(0));
                self.name = xml::attr(e, b"name").unwrap_or_default();
            }
            b"ph" if self.placeholder.is_none() && self.tag != TopTag::Other => {
                self.placeholder = Some(PlaceholderRef {
                    kind: xml::attr(e, b"type"),
                    idx: xml::attr(e, b"idx").and_then(|v| v.parse().ok()),
                });
            }
            b"txBody" if self.tag == TopTag::Sp => self.has_text_body = true,
            b"p" if self.tag == TopTag::Sp && self.has_text_body => {
                self.paragraphs.push(String::new());
            }
            b"t" if is_start && self.tag == TopTag::Sp => self.in_text = true,
            b"br" if self.tag == TopTag::Sp => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.push('\n');
                }
            }
            b"blip" if self.tag == TopTag::Pic && self.embed.is_none() => {
                self.embed = xml::attr(e, b"embed");
            }
            _ => {}
        }
    }
}

/// Read the top-level shapes of a slide, layout or master in tree order.
///
/// Group members are not descended into: a group is a single `Other` shape.
pub fn scan_shapes(content: &str) -> Result<Vec<ShapeRecord>> {
    let mut reader = quick_xml::Reader::from_str(content);
    let mut records = Vec::new();
    let mut in_tree = false;
    let mut depth = 0usize;
    let mut current: Option<RecordBuilder> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let local = e.name().local_name();
                if !in_tree {
                    in_tree = local.as_ref() == b"spTree";
                    continue;
                }
                if depth == 0 {
                    current = match local.as_ref() {
                        b"sp" => Some(RecordBuilder::new(TopTag::Sp)),
                        b"pic" => Some(RecordBuilder::new(TopTag::Pic)),
                        b"grpSp" | b"graphicFrame" | b"cxnSp" | b"contentPart" => {
                            Some(RecordBuilder::new(TopTag::Other))
                        }
                        _ => None,
                    };
                } else if let Some(builder) = current.as_mut() {
                    builder.on_element(&e, true);
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if in_tree && depth > 0 {
                    if let Some(builder) = current.as_mut() {
                        builder.on_element(&e, false);
                    }
                }
            }
            Event::Text(t) => {
                if let Some(builder) = current.as_mut() {
                    if builder.in_text {
                        let text = t
                            .unescape()
                            .map_err(|e| Error::XmlParse(e.to_string()))?;
                        if let Some(p) = builder.paragraphs.last_mut() {
                            p.push_str(&text);
                        }
                    }
                }
            }
            Event::End(e) => {
                if !in_tree {
                    continue;
                }
                if depth == 0 {
                    // </p:spTree>
                    in_tree = false;
                    continue;
                }
                depth -= 1;
                if depth == 0 {
                    if let Some(builder) = current.take() {
                        records.push(builder.finish());
                    }
                } else if e.name().local_name().as_ref() == b"t" {
                    if let Some(builder) = current.as_mut() {
                        builder.in_text = false;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(records)
}

/// Largest shape id used in a part.
pub fn max_shape_id(content: &str) -> Result<u32> {
    let mut reader = quick_xml::Reader::from_str(content);
    let mut max = 1;
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.name().local_name().as_ref() == b"cNvPr" => {
                if let Some(id) = xml::attr(&e, b"id").and_then(|v| v.parse::<u32>().ok()) {
                    max = max.max(id);
                }
            }
            Event::Eof => return Ok(max),
            _ => {}
        }
    }
}

/// One paragraph of a text frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextParagraph {
    pub text: String,
    pub bold: bool,
    /// Font size in hundredths of a point
    pub size: Option<u32>,
}

impl TextParagraph {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            size: None,
        }
    }

    fn write_xml(&self, out: &mut String) {
        if self.text.is_empty() {
            out.push_str("<a:p/>");
            return;
        }
        out.push_str(r#"<a:p><a:r><a:rPr lang="zh-TW" altLang="en-US" dirty="0""#);
        if let Some(size) = self.size {
            let _ = write!(out, r#" sz="{}""#, size);
        }
        if self.bold {
            out.push_str(r#" b="1""#);
        }
        let _ = write!(out, "/><a:t>{}</a:t></a:r></a:p>", xml::escape(&self.text));
    }
}

/// Paragraph list of a text body.
///
/// A new frame holds one empty paragraph; the first appended paragraph
/// takes its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFrame {
    paragraphs: Vec<TextParagraph>,
    pristine: bool,
}

impl Default for TextFrame {
    fn default() -> Self {
        Self {
            paragraphs: vec![TextParagraph::default()],
            pristine: true,
        }
    }
}

impl TextFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a single paragraph.
    pub fn set_text(&mut self, paragraph: TextParagraph) {
        self.paragraphs = vec![paragraph];
        self.pristine = false;
    }

    /// Append a paragraph.
    pub fn add_paragraph(&mut self, paragraph: TextParagraph) {
        if self.pristine {
            self.paragraphs.clear();
            self.pristine = false;
        }
        self.paragraphs.push(paragraph);
    }

    pub fn paragraphs(&self) -> &[TextParagraph] {
        &self.paragraphs
    }

    fn write_xml(&self, out: &mut String, body_pr: &str) {
        out.push_str("<p:txBody>");
        out.push_str(body_pr);
        out.push_str("<a:lstStyle/>");
        for p in &self.paragraphs {
            p.write_xml(out);
        }
        out.push_str("</p:txBody>");
    }
}

/// A shape added to a slide by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Inherits geometry and formatting from a layout placeholder
    Placeholder {
        id: u32,
        name: String,
        placeholder: PlaceholderRef,
        frame: TextFrame,
    },
    /// Free-standing text box
    TextBox {
        id: u32,
        name: String,
        rect: Rect,
        wrap: bool,
        frame: TextFrame,
    },
    /// Picture referencing an image relationship
    Picture {
        id: u32,
        name: String,
        rect: Rect,
        embed: String,
        descr: String,
    },
}

impl Shape {
    /// Text frame of a text-bearing shape.
    pub fn frame(&self) -> Option<&TextFrame> {
        match self {
            Shape::Placeholder { frame, .. } | Shape::TextBox { frame, .. } => Some(frame),
            Shape::Picture { .. } => None,
        }
    }

    pub fn frame_mut(&mut self) -> Option<&mut TextFrame> {
        match self {
            Shape::Placeholder { frame, .. } | Shape::TextBox { frame, .. } => Some(frame),
            Shape::Picture { .. } => None,
        }
    }

    /// Render as a `p:spTree` child.
    pub fn to_xml(&self, out: &mut String) {
        match self {
            Shape::Placeholder {
                id,
                name,
                placeholder,
                frame,
            } => {
                let _ = write!(
                    out,
                    r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>"#,
                    id,
                    xml::escape(name)
                );
                placeholder.write_xml(out);
                out.push_str("</p:nvPr></p:nvSpPr><p:spPr/>");
                frame.write_xml(out, "<a:bodyPr/>");
                out.push_str("</p:sp>");
            }
            Shape::TextBox {
                id,
                name,
                rect,
                wrap,
                frame,
            } => {
                let _ = write!(
                    out,
                    r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>"#,
                    id,
                    xml::escape(name)
                );
                rect.write_xfrm(out);
                out.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#);
                let body_pr = if *wrap {
                    r#"<a:bodyPr wrap="square" rtlCol="0"><a:normAutofit/></a:bodyPr>"#
                } else {
                    r#"<a:bodyPr wrap="none" rtlCol="0"><a:spAutoFit/></a:bodyPr>"#
                };
                frame.write_xml(out, body_pr);
                out.push_str("</p:sp>");
            }
            Shape::Picture {
                id,
                name,
                rect,
                embed,
                descr,
            } => {
                let _ = write!(
                    out,
                    r#"<p:pic><p:nvPicPr><p:cNvPr id="{}" name="{}" descr="{}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
                    id,
                    xml::escape(name),
                    xml::escape(descr)
                );
                let _ = write!(
                    out,
                    r#"<p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>"#,
                    xml::escape(embed)
                );
                rect.write_xfrm(out);
                out.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE: &str = r#"<p:sld xmlns:a="urn:a" xmlns:p="urn:p" xmlns:r="urn:r"><p:cSld><p:spTree>
<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>
<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/>
<p:txBody><a:bodyPr/><a:p><a:r><a:t>Hello &amp; bye</a:t></a:r></a:p></p:txBody></p:sp>
<p:pic><p:nvPicPr><p:cNvPr id="4" name="Picture 3"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/></p:blipFill><p:spPr/></p:pic>
<p:grpSp><p:nvGrpSpPr><p:cNvPr id="5" name="Group"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>
<p:pic><p:nvPicPr><p:cNvPr id="6" name="Inner"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId3"/></p:blipFill><p:spPr/></p:pic></p:grpSp>
<p:sp><p:nvSpPr><p:cNvPr id="7" name="Body"/><p:cNvSpPr/><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr><p:spPr/>
<p:txBody><a:bodyPr/><a:p><a:r><a:t>one</a:t></a:r><a:br/><a:r><a:t>two</a:t></a:r></a:p><a:p/></p:txBody></p:sp>
<p:sp><p:nvSpPr><p:cNvPr id="8" name="Rect"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/></p:sp>
</p:spTree></p:cSld></p:sld>"#;

    #[test]
    fn test_scan_shapes_kinds() {
        let shapes = scan_shapes(SLIDE).unwrap();
        let kinds: Vec<ShapeKind> = shapes.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ShapeKind::Text,
                ShapeKind::Picture,
                ShapeKind::Other,
                ShapeKind::Text,
                ShapeKind::Other
            ]
        );
        assert_eq!(shapes[0].text(), "Hello & bye");
        assert!(shapes[0].placeholder.as_ref().unwrap().is_title());
        assert_eq!(shapes[1].embed.as_deref(), Some("rId2"));
        assert_eq!(shapes[2].id, 5);
        assert!(shapes[2].embed.is_none());
    }

    #[test]
    fn test_scan_shapes_paragraphs() {
        let shapes = scan_shapes(SLIDE).unwrap();
        let body = &shapes[3];
        assert_eq!(body.paragraphs, vec!["one\ntwo".to_string(), String::new()]);
        let ph = body.placeholder.as_ref().unwrap();
        assert!(ph.is_body());
        assert_eq!(ph.idx, Some(1));
    }

    #[test]
    fn test_max_shape_id() {
        assert_eq!(max_shape_id(SLIDE).unwrap(), 8);
    }

    #[test]
    fn test_placeholder_roles() {
        assert!(PlaceholderRef::new(Some("ctrTitle"), None).is_title());
        assert!(PlaceholderRef::new(Some("subTitle"), Some(1)).is_text_slot());
        assert!(!PlaceholderRef::new(Some("subTitle"), Some(1)).is_body());
        assert!(!PlaceholderRef::new(Some("sldNum"), Some(12)).is_text_slot());
        assert!(PlaceholderRef::new(None, Some(1)).is_body());
    }

    #[test]
    fn test_text_frame_first_paragraph() {
        let mut frame = TextFrame::new();
        assert_eq!(frame.paragraphs().len(), 1);
        frame.add_paragraph(TextParagraph::plain("a"));
        frame.add_paragraph(TextParagraph::plain("b"));
        assert_eq!(frame.paragraphs().len(), 2);
        assert_eq!(frame.paragraphs()[0].text, "a");
    }

    #[test]
    fn test_rendered_shapes_scan_back() {
        let mut frame = TextFrame::new();
        frame.add_paragraph(TextParagraph::bold("Heading <1>"));
        let shapes = [
            Shape::TextBox {
                id: 2,
                name: "TextBox 1".into(),
                rect: Rect::new(0, 0, inches(1.0), inches(1.0)),
                wrap: true,
                frame,
            },
            Shape::Picture {
                id: 3,
                name: "Picture 2".into(),
                rect: Rect::new(1, 2, 3, 4),
                embed: "rId7".into(),
                descr: "slide_1_image_1.png".into(),
            },
        ];
        let mut xml = String::from(r#"<p:sld xmlns:a="urn:a" xmlns:p="urn:p" xmlns:r="urn:r"><p:cSld><p:spTree>"#);
        for s in &shapes {
            s.to_xml(&mut xml);
        }
        xml.push_str("</p:spTree></p:cSld></p:sld>");

        let records = scan_shapes(&xml).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].paragraphs, vec!["Heading <1>".to_string()]);
        assert!(xml.contains(r#"wrap="square""#));
        assert_eq!(records[1].kind, ShapeKind::Picture);
        assert_eq!(records[1].embed.as_deref(), Some("rId7"));
    }
}

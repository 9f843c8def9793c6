//! Editable presentation: slides, layouts and media over an OOXML package.

use crate::container::{rel_types, ContentTypes, OoxmlPackage, Relationships};
use crate::error::{Error, Result};
use crate::model::{extension_for_content_type, image_content_type, normalize_extension};
use crate::pptx::layout::{resolve_layouts, LayoutPlaceholder, ResolvedLayouts, SlideLayout};
use crate::pptx::shape::{
    max_shape_id, scan_shapes, PlaceholderRef, Rect, Shape, ShapeRecord, TextFrame,
};
use crate::pptx::template::{self, part_types, GROUP_HEADER, NS_DECL, XML_DECL};
use crate::xml;
use once_cell::unsync::OnceCell;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Slide dimensions in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSize {
    pub width: i64,
    pub height: i64,
}

impl Default for SlideSize {
    fn default() -> Self {
        Self {
            width: template::DEFAULT_SLIDE_WIDTH,
            height: template::DEFAULT_SLIDE_HEIGHT,
        }
    }
}

/// An image embedded in a slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage<'a> {
    /// Media part holding the image
    pub part_name: String,
    pub data: &'a [u8],
    /// Extension with a leading '.'
    pub extension: String,
}

/// One slide of a presentation.
#[derive(Debug, Clone)]
pub struct Slide {
    part_name: String,
    slide_id: u32,
    rel_id: String,
    layout_part: Option<String>,
    xml: String,
    rels: Relationships,
    added: Vec<Shape>,
    next_shape_id: u32,
}

impl Slide {
    /// Layout part the slide is based on.
    pub fn layout_part(&self) -> Option<&str> {
        self.layout_part.as_deref()
    }

    /// Slide XML including shapes added since loading.
    pub fn to_xml(&self) -> Result<String> {
        if self.added.is_empty() {
            return Ok(self.xml.clone());
        }
        let mut fragment = String::new();
        for shape in &self.added {
            shape.to_xml(&mut fragment);
        }
        xml::insert_before_close(&self.xml, b"spTree", &fragment)?
            .ok_or_else(|| Error::InvalidData(format!("{} has no shape tree", self.part_name)))
    }

    /// Top-level shapes in tree order.
    pub fn shapes(&self) -> Result<Vec<ShapeRecord>> {
        scan_shapes(&self.to_xml()?)
    }

    /// Shapes added by this crate, in insertion order.
    pub fn added_shapes(&self) -> &[Shape] {
        &self.added
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_shape_id;
        self.next_shape_id += 1;
        id
    }

    fn find_placeholder(&self, pred: impl Fn(&PlaceholderRef) -> bool) -> Option<usize> {
        self.added.iter().position(|s| match s {
            Shape::Placeholder { placeholder, .. } => pred(placeholder),
            _ => false,
        })
    }

    /// Index of the added title placeholder.
    pub fn title_placeholder(&self) -> Option<usize> {
        self.find_placeholder(PlaceholderRef::is_title)
    }

    /// Index of the added body placeholder.
    pub fn body_placeholder(&self) -> Option<usize> {
        self.find_placeholder(PlaceholderRef::is_body)
    }

    /// Index of the first added non-title text placeholder.
    pub fn secondary_placeholder(&self) -> Option<usize> {
        self.find_placeholder(PlaceholderRef::is_text_slot)
    }

    /// Text frame of an added shape.
    pub fn frame_mut(&mut self, index: usize) -> Option<&mut TextFrame> {
        self.added.get_mut(index).and_then(Shape::frame_mut)
    }

    /// Add a text box and return its index among added shapes.
    pub fn add_text_box(&mut self, rect: Rect, wrap: bool, frame: TextFrame) -> usize {
        let id = self.allocate_id();
        self.added.push(Shape::TextBox {
            id,
            name: format!("TextBox {}", id - 1),
            rect,
            wrap,
            frame,
        });
        self.added.len() - 1
    }

    fn add_placeholder(&mut self, layout_ph: &LayoutPlaceholder) -> usize {
        let id = self.allocate_id();
        self.added.push(Shape::Placeholder {
            id,
            name: layout_ph.name.clone(),
            placeholder: layout_ph.placeholder.clone(),
            frame: TextFrame::new(),
        });
        self.added.len() - 1
    }
}

/// A presentation loaded into memory.
pub struct Presentation {
    package: OoxmlPackage,
    content_types: ContentTypes,
    pres_part: String,
    pres_rels: Relationships,
    slide_size: SlideSize,
    slides: Vec<Slide>,
    layouts: Vec<SlideLayout>,
    resolved: OnceCell<Option<ResolvedLayouts>>,
}

impl Presentation {
    /// The built-in presentation with no slides.
    pub fn new_default() -> Result<Self> {
        Self::from_package(template::default_package())
    }

    /// Open a .pptx file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_package(OoxmlPackage::open(path)?)
    }

    /// Load a .pptx from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_package(OoxmlPackage::from_bytes(data)?)
    }

    /// Load from an already opened package.
    pub fn from_package(package: OoxmlPackage) -> Result<Self> {
        let content_types = package.content_types()?;
        let pres_part = package.main_part()?;
        let pres_rels = package.read_relationships(&pres_part)?;
        let pres_xml = package.read_xml(&pres_part)?;
        let info = PresentationInfo::parse(&pres_xml)?;

        let mut slides = Vec::with_capacity(info.slide_ids.len());
        for (slide_id, rel_id) in &info.slide_ids {
            let rel = pres_rels
                .get(rel_id)
                .ok_or_else(|| Error::MissingComponent(format!("slide relationship {rel_id}")))?;
            let part_name = OoxmlPackage::resolve_path(&pres_part, &rel.target);
            slides.push(Self::load_slide(&package, part_name, *slide_id, rel_id.clone())?);
        }

        let layouts = match info.master_rel_ids.first() {
            Some(rid) => match pres_rels.get(rid) {
                Some(rel) => {
                    let master = OoxmlPackage::resolve_path(&pres_part, &rel.target);
                    Self::load_layouts(&package, &master)?
                }
                None => Vec::new(),
            },
            None => Vec::new(),
        };

        Ok(Self {
            package,
            content_types,
            pres_part,
            pres_rels,
            slide_size: info.slide_size.unwrap_or_default(),
            slides,
            layouts,
            resolved: OnceCell::new(),
        })
    }

    fn load_slide(
        package: &OoxmlPackage,
        part_name: String,
        slide_id: u32,
        rel_id: String,
    ) -> Result<Slide> {
        let xml = package.read_xml(&part_name)?;
        let rels = package.read_relationships(&part_name)?;
        let layout_part = rels
            .get_by_type(rel_types::SLIDE_LAYOUT)
            .first()
            .map(|r| OoxmlPackage::resolve_path(&part_name, &r.target));
        let next_shape_id = max_shape_id(&xml)? + 1;
        Ok(Slide {
            part_name,
            slide_id,
            rel_id,
            layout_part,
            xml,
            rels,
            added: Vec::new(),
            next_shape_id,
        })
    }

    fn load_layouts(package: &OoxmlPackage, master_part: &str) -> Result<Vec<SlideLayout>> {
        let master_xml = package.read_xml(master_part)?;
        let master_rels = package.read_relationships(master_part)?;

        let mut rel_ids = Vec::new();
        let mut reader = quick_xml::Reader::from_str(&master_xml);
        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e)
                    if e.name().local_name().as_ref() == b"sldLayoutId" =>
                {
                    if let Some(rid) = xml::prefixed_attr(&e, b"id") {
                        rel_ids.push(rid);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        if rel_ids.is_empty() {
            rel_ids = master_rels
                .get_by_type(rel_types::SLIDE_LAYOUT)
                .iter()
                .map(|r| r.id.clone())
                .collect();
        }

        let mut layouts = Vec::with_capacity(rel_ids.len());
        for rid in rel_ids {
            let Some(rel) = master_rels.get(&rid) else {
                tracing::warn!(master = master_part, rel_id = %rid, "layout relationship missing");
                continue;
            };
            let part_name = OoxmlPackage::resolve_path(master_part, &rel.target);
            let xml = package.read_xml(&part_name)?;
            let name = layout_name(&xml)?.unwrap_or_default();
            let placeholders = scan_shapes(&xml)?
                .into_iter()
                .filter_map(|s| {
                    s.placeholder.map(|placeholder| LayoutPlaceholder {
                        name: s.name,
                        placeholder,
                    })
                })
                .collect();
            layouts.push(SlideLayout {
                part_name,
                name,
                placeholders,
            });
        }
        Ok(layouts)
    }

    /// Slide size in EMU.
    pub fn slide_size(&self) -> SlideSize {
        self.slide_size
    }

    /// Slides in presentation order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Mutable access to a slide by 0-based index.
    pub fn slide_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }

    /// Layouts of the first slide master.
    pub fn layouts(&self) -> &[SlideLayout] {
        &self.layouts
    }

    /// Role classification of the layouts, computed once.
    pub fn resolved_layouts(&self) -> Option<&ResolvedLayouts> {
        self.resolved
            .get_or_init(|| resolve_layouts(&self.layouts))
            .as_ref()
    }

    /// The underlying package.
    pub fn package(&self) -> &OoxmlPackage {
        &self.package
    }

    /// Set the document title in the core properties.
    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.package.set_core_property("title", title)
    }

    /// Remove every slide together with parts only the slides referenced
    /// (notes, media). Layouts, masters and theme are kept.
    pub fn strip_slides(&mut self) -> Result<()> {
        if self.slides.is_empty() {
            return Ok(());
        }
        for slide in self.slides.drain(..) {
            self.pres_rels.remove(&slide.rel_id);
            self.package.remove_part(&slide.part_name);
            self.package
                .remove_part(&OoxmlPackage::rels_path_for(&slide.part_name));
            self.content_types.remove_override(&slide.part_name);
        }
        self.write_presentation_parts()?;
        let removed = self.package.prune_unreachable()?;
        self.content_types = self.package.content_types()?;
        tracing::debug!(removed, "stripped template slides");
        Ok(())
    }

    /// Append a slide based on the layout at `layout_index`.
    ///
    /// Title and text placeholders of the layout are instantiated on the
    /// slide. Returns the 0-based slide index.
    pub fn add_slide(&mut self, layout_index: usize) -> Result<usize> {
        let layout = self.layouts.get(layout_index).ok_or_else(|| {
            Error::ResourceNotFound(format!("slide layout {layout_index}"))
        })?;

        let part_name = self.next_part_name("ppt/slides/slide", ".xml");
        let mut rels = Relationships::new();
        rels.add_new(
            rel_types::SLIDE_LAYOUT,
            &OoxmlPackage::relative_target(&part_name, &layout.part_name),
        );
        let rel_id = self.pres_rels.add_new(
            rel_types::SLIDE,
            &OoxmlPackage::relative_target(&self.pres_part, &part_name),
        );
        let slide_id = self
            .slides
            .iter()
            .map(|s| s.slide_id)
            .max()
            .unwrap_or(255)
            .max(255)
            + 1;

        let xml = format!(
            "{XML_DECL}\n<p:sld {NS_DECL}><p:cSld><p:spTree>{GROUP_HEADER}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"
        );
        let mut slide = Slide {
            part_name,
            slide_id,
            rel_id,
            layout_part: Some(layout.part_name.clone()),
            xml,
            rels,
            added: Vec::new(),
            next_shape_id: 2,
        };
        for ph in layout
            .placeholders
            .iter()
            .filter(|p| p.placeholder.is_title() || p.placeholder.is_text_slot())
        {
            slide.add_placeholder(ph);
        }

        self.content_types
            .set_override(&slide.part_name, part_types::SLIDE);
        self.slides.push(slide);
        Ok(self.slides.len() - 1)
    }

    /// Add a picture from a file to a slide.
    pub fn add_picture(&mut self, slide_index: usize, path: &Path, rect: Rect) -> Result<()> {
        let data = std::fs::read(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .filter(|e| image_content_type(e).is_some());
        let descr = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.add_picture_bytes(slide_index, data, ext.as_deref(), rect, &descr)
    }

    /// Add a picture from bytes; the format is sniffed when `extension` is None.
    pub fn add_picture_bytes(
        &mut self,
        slide_index: usize,
        data: Vec<u8>,
        extension: Option<&str>,
        rect: Rect,
        descr: &str,
    ) -> Result<()> {
        if slide_index >= self.slides.len() {
            return Err(Error::ResourceNotFound(format!("slide {}", slide_index + 1)));
        }
        let ext = match extension {
            Some(e) => e.trim_start_matches('.').to_lowercase(),
            None => image::guess_format(&data)?
                .extensions_str()
                .first()
                .map(|e| e.to_string())
                .ok_or_else(|| Error::Image("unknown image format".to_string()))?,
        };
        let content_type = image_content_type(&ext)
            .ok_or_else(|| Error::UnsupportedFormat(format!("image extension {ext}")))?;

        let media_part = self.next_part_name("ppt/media/image", &format!(".{ext}"));
        self.package.write_part(&media_part, data);
        self.content_types.ensure_default(&ext, content_type);

        let slide = &mut self.slides[slide_index];
        let embed = slide.rels.add_new(
            rel_types::IMAGE,
            &OoxmlPackage::relative_target(&slide.part_name, &media_part),
        );
        let id = slide.allocate_id();
        slide.added.push(Shape::Picture {
            id,
            name: format!("Picture {}", id - 1),
            rect,
            embed,
            descr: descr.to_string(),
        });
        Ok(())
    }

    /// Images embedded in a slide's pictures, in shape order.
    pub fn slide_images(&self, slide_index: usize) -> Result<Vec<EmbeddedImage<'_>>> {
        let slide = self
            .slides
            .get(slide_index)
            .ok_or_else(|| Error::ResourceNotFound(format!("slide {}", slide_index + 1)))?;
        let mut images = Vec::new();
        for record in slide.shapes()? {
            let Some(embed) = record.embed.as_deref() else {
                continue;
            };
            let rel = slide.rels.get(embed).ok_or_else(|| {
                Error::MissingComponent(format!("{} relationship {embed}", slide.part_name))
            })?;
            let part_name = OoxmlPackage::resolve_path(&slide.part_name, &rel.target);
            let data = self.package.read_binary(&part_name)?;
            let extension = self
                .content_types
                .content_type_of(&part_name)
                .and_then(extension_for_content_type)
                .map(normalize_extension)
                .or_else(|| part_name.rsplit_once('.').map(|(_, e)| normalize_extension(e)))
                .unwrap_or_default();
            images.push(EmbeddedImage {
                part_name,
                data,
                extension,
            });
        }
        Ok(images)
    }

    fn next_part_name(&self, prefix: &str, suffix: &str) -> String {
        let taken: Vec<u32> = self
            .package
            .list_files_with_prefix(prefix)
            .iter()
            .chain(self.slides.iter().map(|s| &s.part_name))
            .filter_map(|n| n.strip_prefix(prefix))
            .filter_map(|rest| rest.split('.').next())
            .filter_map(|n| n.parse().ok())
            .collect();
        let n = taken.into_iter().max().unwrap_or(0) + 1;
        format!("{prefix}{n}{suffix}")
    }

    fn write_presentation_parts(&mut self) -> Result<()> {
        let pres_xml = self.package.read_xml(&self.pres_part)?;
        let updated = rewrite_slide_id_list(&pres_xml, &self.slides)?;
        self.package.write_xml(&self.pres_part, updated);
        self.package
            .write_relationships(&self.pres_part, &self.pres_rels);
        self.package.write_content_types(&self.content_types);
        Ok(())
    }

    /// Write slides and presentation metadata back into the package.
    fn flush(&mut self) -> Result<()> {
        for i in 0..self.slides.len() {
            let (part, xml) = {
                let slide = &self.slides[i];
                (slide.part_name.clone(), slide.to_xml()?)
            };
            self.package.write_xml(&part, xml);
            let rels = self.slides[i].rels.clone();
            self.package.write_relationships(&part, &rels);
        }
        self.write_presentation_parts()
    }

    /// Serialize to .pptx bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush()?;
        self.package.to_bytes()
    }

    /// Write the presentation to a file.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.flush()?;
        self.package.save(path)
    }
}

impl std::fmt::Debug for Presentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presentation")
            .field("slides", &self.slides.len())
            .field("layouts", &self.layouts.len())
            .field("slide_size", &self.slide_size)
            .finish()
    }
}

/// Facts read from presentation.xml.
#[derive(Debug, Default)]
struct PresentationInfo {
    slide_ids: Vec<(u32, String)>,
    master_rel_ids: Vec<String>,
    slide_size: Option<SlideSize>,
}

impl PresentationInfo {
    fn parse(content: &str) -> Result<Self> {
        let mut info = Self::default();
        let mut reader = quick_xml::Reader::from_str(content);
        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => match e.name().local_name().as_ref() {
                    b"sldId" => {
                        if let Some(rid) = xml::prefixed_attr(&e, b"id") {
                            let id = xml::exact_attr(&e, b"id")
                                .and_then(|v| v.parse().ok())
                                .unwrap_or(0);
                            info.slide_ids.push((id, rid));
                        }
                    }
                    b"sldMasterId" => {
                        if let Some(rid) = xml::prefixed_attr(&e, b"id") {
                            info.master_rel_ids.push(rid);
                        }
                    }
                    b"sldSz" => {
                        let cx = xml::attr(&e, b"cx").and_then(|v| v.parse().ok());
                        let cy = xml::attr(&e, b"cy").and_then(|v| v.parse().ok());
                        if let (Some(width), Some(height)) = (cx, cy) {
                            info.slide_size = Some(SlideSize { width, height });
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(info)
    }
}

fn layout_name(content: &str) -> Result<Option<String>> {
    let mut reader = quick_xml::Reader::from_str(content);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.name().local_name().as_ref() == b"cSld" => {
                return Ok(xml::attr(&e, b"name"));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Replace `<p:sldIdLst>` with one listing `slides`, keeping schema order
/// (after the master lists, before `sldSz`).
fn rewrite_slide_id_list(pres_xml: &str, slides: &[Slide]) -> Result<String> {
    let mut content = match xml::element_span(pres_xml, b"sldIdLst")? {
        Some(span) => format!("{}{}", &pres_xml[..span.start], &pres_xml[span.end..]),
        None => pres_xml.to_string(),
    };
    if slides.is_empty() {
        return Ok(content);
    }

    let mut list = String::from("<p:sldIdLst>");
    for slide in slides {
        list.push_str(&format!(
            r#"<p:sldId id="{}" r:id="{}"/>"#,
            slide.slide_id,
            xml::escape(&slide.rel_id)
        ));
    }
    list.push_str("</p:sldIdLst>");

    let mut insert_at = None;
    for anchor in [
        &b"handoutMasterIdLst"[..],
        &b"notesMasterIdLst"[..],
        &b"sldMasterIdLst"[..],
    ] {
        if let Some(span) = xml::element_span(&content, anchor)? {
            insert_at = Some(span.end);
            break;
        }
    }
    if insert_at.is_none() {
        insert_at = xml::element_span(&content, b"sldSz")?.map(|s| s.start);
    }
    let pos = insert_at
        .ok_or_else(|| Error::InvalidData("presentation.xml has no slide master list".into()))?;
    content.insert_str(pos, &list);
    Ok(content)
}

//! Editable ZIP container for OOXML packages.
//!
//! The whole archive is loaded into memory as a map of part name to bytes.
//! Builders and injectors mutate parts in place and serialize the result
//! back into a new archive.

use crate::error::{Error, Result};
use crate::xml;
use quick_xml::events::Event;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;

/// Name of the content types part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Relationship type URIs used by the builders.
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    pub const THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const NUMBERING: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
}

/// Content types shared by every package the builders produce.
pub mod content_types {
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
}

const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Fresh `docProps/core.xml` with a title and the current time.
pub fn core_properties_xml(title: &str) -> String {
    let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{title}</dc:title><dc:creator>mdoffice</dc:creator>",
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created>"#,
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified>"#,
            "</cp:coreProperties>"
        ),
        title = xml::escape(title),
        now = now
    )
}

/// `docProps/app.xml` naming this crate as the producer.
pub fn app_properties_xml() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
        r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" "#,
        r#"xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
        "<Application>mdoffice</Application></Properties>"
    )
    .to_string()
}

/// A relationship entry from a .rels file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute)
    pub target: String,
    /// Whether the target is external
    pub external: bool,
}

/// Ordered collection of relationships parsed from a .rels file.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the XML of a .rels part.
    pub fn parse(content: &str) -> Result<Self> {
        let mut rels = Relationships::new();
        if content.trim().is_empty() {
            return Ok(rels);
        }

        let mut reader = quick_xml::Reader::from_str(content);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().local_name().as_ref() == b"Relationship" =>
                {
                    let id = xml::attr(&e, b"Id").unwrap_or_default();
                    if id.is_empty() {
                        continue;
                    }
                    rels.add(Relationship {
                        id,
                        rel_type: xml::attr(&e, b"Type").unwrap_or_default(),
                        target: xml::attr(&e, b"Target").unwrap_or_default(),
                        external: xml::attr(&e, b"TargetMode")
                            .map(|m| m.eq_ignore_ascii_case("external"))
                            .unwrap_or(false),
                    });
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
        }

        Ok(rels)
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// Get relationships by type, in document order.
    pub fn get_by_type(&self, rel_type: &str) -> Vec<&Relationship> {
        self.items.iter().filter(|r| r.rel_type == rel_type).collect()
    }

    /// Iterate all relationships in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a relationship, replacing one with the same ID.
    pub fn add(&mut self, rel: Relationship) {
        self.items.retain(|r| r.id != rel.id);
        self.items.push(rel);
    }

    /// Add an internal relationship under a fresh ID and return that ID.
    pub fn add_new(&mut self, rel_type: &str, target: &str) -> String {
        let id = self.next_id();
        self.add(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external: false,
        });
        id
    }

    /// Remove a relationship by ID.
    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let pos = self.items.iter().position(|r| r.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Smallest unused `rIdN`.
    pub fn next_id(&self) -> String {
        let max = self
            .items
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
            .max()
            .unwrap_or(0);
        format!("rId{}", max + 1)
    }

    /// Serialize to .rels XML.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(128 + self.items.len() * 160);
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        out.push_str("\n<Relationships xmlns=\"");
        out.push_str(RELS_NS);
        out.push_str("\">");
        for rel in &self.items {
            out.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                xml::escape(&rel.id),
                xml::escape(&rel.rel_type),
                xml::escape(&rel.target)
            ));
            if rel.external {
                out.push_str(r#" TargetMode="External""#);
            }
            out.push_str("/>");
        }
        out.push_str("</Relationships>");
        out
    }
}

/// Parsed `[Content_Types].xml`.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Parse the content types part.
    pub fn parse(content: &str) -> Result<Self> {
        let mut types = ContentTypes::default();
        let mut reader = quick_xml::Reader::from_str(content);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) => match e.name().local_name().as_ref() {
                    b"Default" => {
                        if let (Some(ext), Some(ct)) =
                            (xml::attr(&e, b"Extension"), xml::attr(&e, b"ContentType"))
                        {
                            types.defaults.push((ext.to_lowercase(), ct));
                        }
                    }
                    b"Override" => {
                        if let (Some(part), Some(ct)) =
                            (xml::attr(&e, b"PartName"), xml::attr(&e, b"ContentType"))
                        {
                            types.overrides.push((part, ct));
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
        }

        Ok(types)
    }

    /// Register a default content type for an extension if none exists.
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        let ext = extension.trim_start_matches('.').to_lowercase();
        if !self.defaults.iter().any(|(e, _)| *e == ext) {
            self.defaults.push((ext, content_type.to_string()));
        }
    }

    /// Set the override for a part (`part` is a package part name without leading slash).
    pub fn set_override(&mut self, part: &str, content_type: &str) {
        let name = format!("/{}", part.trim_start_matches('/'));
        self.overrides.retain(|(p, _)| *p != name);
        self.overrides.push((name, content_type.to_string()));
    }

    /// Remove the override for a part.
    pub fn remove_override(&mut self, part: &str) {
        let name = format!("/{}", part.trim_start_matches('/'));
        self.overrides.retain(|(p, _)| *p != name);
    }

    /// Whether `part` has an explicit override.
    pub fn has_override(&self, part: &str) -> bool {
        let name = format!("/{}", part.trim_start_matches('/'));
        self.overrides.iter().any(|(p, _)| *p == name)
    }

    /// Content type of a part, by override first and extension second.
    pub fn content_type_of(&self, part: &str) -> Option<&str> {
        let name = format!("/{}", part.trim_start_matches('/'));
        if let Some((_, ct)) = self.overrides.iter().find(|(p, _)| *p == name) {
            return Some(ct);
        }
        let ext = part.rsplit('.').next()?.to_lowercase();
        self.defaults
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, ct)| ct.as_str())
    }

    fn retain_overrides(&mut self, keep: impl Fn(&str) -> bool) {
        self.overrides.retain(|(p, _)| keep(p.trim_start_matches('/')));
    }

    /// Serialize to XML.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(256 + self.overrides.len() * 160);
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        out.push_str("\n<Types xmlns=\"");
        out.push_str(CONTENT_TYPES_NS);
        out.push_str("\">");
        for (ext, ct) in &self.defaults {
            out.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                xml::escape(ext),
                xml::escape(ct)
            ));
        }
        for (part, ct) in &self.overrides {
            out.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                xml::escape(part),
                xml::escape(ct)
            ));
        }
        out.push_str("</Types>");
        out
    }
}

/// Fix XML encoding declaration from UTF-16 to UTF-8.
///
/// After decoding UTF-16 XML into a Rust `String`, the declaration still says
/// UTF-16, which makes quick-xml reinterpret the text.
fn fix_xml_encoding_declaration(content: &str) -> String {
    if content.starts_with("<?xml") {
        if let Some(end_decl) = content.find("?>") {
            let decl = &content[..end_decl + 2];
            let rest = &content[end_decl + 2..];
            let fixed_decl = decl
                .replace("encoding=\"UTF-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='UTF-16'", "encoding='UTF-8'")
                .replace("encoding=\"utf-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='utf-16'", "encoding='UTF-8'");
            return format!("{}{}", fixed_decl, rest);
        }
    }
    content.to_string()
}

/// Decode XML bytes handling different encodings (UTF-8, UTF-16 LE/BE).
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    if bytes.len() >= 3 && bytes[0] == 0xEF && bytes[1] == 0xBB && bytes[2] == 0xBF {
        return String::from_utf8(bytes[3..].to_vec())
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)));
    }

    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xFE {
        let content = decode_utf16(&bytes[2..], u16::from_le_bytes)?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let content = decode_utf16(&bytes[2..], u16::from_be_bytes)?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(s) => Ok(s),
        Err(_) => {
            // UTF-16 without BOM shows null bytes next to ASCII markup
            if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 {
                decode_utf16(bytes, u16::from_le_bytes)
            } else if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 {
                decode_utf16(bytes, u16::from_be_bytes)
            } else {
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

fn decode_utf16(bytes: &[u8], to_u16: fn([u8; 2]) -> u16) -> Result<String> {
    let len = bytes.len() & !1;
    let units = (0..len).step_by(2).map(|i| to_u16([bytes[i], bytes[i + 1]]));
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// In-memory OOXML package.
///
/// Part names never carry a leading slash. The original entry order is kept
/// when writing, with `[Content_Types].xml` always first.
#[derive(Clone, Default)]
pub struct OoxmlPackage {
    parts: BTreeMap<String, Vec<u8>>,
    order: Vec<String>,
}

impl OoxmlPackage {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a package from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Load a package from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(data))
    }

    /// Load a package from a seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut package = Self::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            package.write_part(&name, data);
        }

        if !package.exists(CONTENT_TYPES_PART) {
            return Err(Error::MissingComponent(CONTENT_TYPES_PART.to_string()));
        }

        Ok(package)
    }

    /// Read an XML part as a string.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        let bytes = self
            .parts
            .get(path)
            .ok_or_else(|| Error::MissingComponent(path.to_string()))?;
        decode_xml_bytes(bytes)
    }

    /// Read a binary part.
    pub fn read_binary(&self, path: &str) -> Result<&[u8]> {
        self.parts
            .get(path)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::MissingComponent(path.to_string()))
    }

    /// Check if a part exists.
    pub fn exists(&self, path: &str) -> bool {
        self.parts.contains_key(path)
    }

    /// List all parts in archive order.
    pub fn list_files(&self) -> Vec<String> {
        self.order.clone()
    }

    /// List parts matching a prefix.
    pub fn list_files_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.order
            .iter()
            .filter(|n| n.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Insert or replace a part.
    pub fn write_part(&mut self, path: &str, data: Vec<u8>) {
        if self.parts.insert(path.to_string(), data).is_none() {
            self.order.push(path.to_string());
        }
    }

    /// Insert or replace an XML part.
    pub fn write_xml(&mut self, path: &str, content: impl Into<String>) {
        self.write_part(path, content.into().into_bytes());
    }

    /// Remove a part, returning its data.
    pub fn remove_part(&mut self, path: &str) -> Option<Vec<u8>> {
        let data = self.parts.remove(path)?;
        self.order.retain(|n| n != path);
        Some(data)
    }

    /// Path of the .rels part belonging to `part_path`.
    pub fn rels_path_for(part_path: &str) -> String {
        if part_path.is_empty() || part_path == "/" {
            return "_rels/.rels".to_string();
        }
        match part_path.rfind('/') {
            Some(slash) => format!(
                "{}/_rels/{}.rels",
                &part_path[..slash],
                &part_path[slash + 1..]
            ),
            None => format!("_rels/{}.rels", part_path),
        }
    }

    /// Read the relationships of a part (empty when the part has none).
    pub fn read_relationships(&self, part_path: &str) -> Result<Relationships> {
        match self.read_xml(&Self::rels_path_for(part_path)) {
            Ok(content) => Relationships::parse(&content),
            Err(Error::MissingComponent(_)) => Ok(Relationships::new()),
            Err(e) => Err(e),
        }
    }

    /// Read package-level relationships (_rels/.rels).
    pub fn read_package_relationships(&self) -> Result<Relationships> {
        self.read_relationships("")
    }

    /// Write the relationships of a part.
    pub fn write_relationships(&mut self, part_path: &str, rels: &Relationships) {
        self.write_xml(&Self::rels_path_for(part_path), rels.to_xml());
    }

    /// Parse `[Content_Types].xml`.
    pub fn content_types(&self) -> Result<ContentTypes> {
        ContentTypes::parse(&self.read_xml(CONTENT_TYPES_PART)?)
    }

    /// Replace `[Content_Types].xml`.
    pub fn write_content_types(&mut self, types: &ContentTypes) {
        self.write_xml(CONTENT_TYPES_PART, types.to_xml());
    }

    /// Part targeted by the package's main officeDocument relationship.
    pub fn main_part(&self) -> Result<String> {
        let rels = self.read_package_relationships()?;
        rels.get_by_type(rel_types::OFFICE_DOCUMENT)
            .first()
            .map(|r| Self::resolve_path("", &r.target))
            .ok_or_else(|| Error::MissingComponent("officeDocument relationship".to_string()))
    }

    /// Replace the text of a core property (e.g. `title`) in docProps/core.xml.
    ///
    /// Missing core properties are left alone.
    pub fn set_core_property(&mut self, local: &str, value: &str) -> Result<()> {
        let path = "docProps/core.xml";
        let Ok(content) = self.read_xml(path) else {
            return Ok(());
        };
        let escaped = xml::escape(value);
        let updated = match xml::element_span(&content, local.as_bytes())? {
            Some(span) => {
                let existing = &content[span.clone()];
                let tag_end = existing.find('>').unwrap_or(existing.len() - 1);
                let open = existing[..=tag_end].trim_end_matches("/>").trim_end_matches('>');
                let qname = open.trim_start_matches('<').split_whitespace().next().unwrap_or(local);
                format!(
                    "{}<{}>{}</{}>{}",
                    &content[..span.start],
                    qname,
                    escaped,
                    qname,
                    &content[span.end..]
                )
            }
            None => match xml::insert_before_close(
                &content,
                b"coreProperties",
                &format!("<dc:{local}>{escaped}</dc:{local}>"),
            )? {
                Some(c) => c,
                None => return Ok(()),
            },
        };
        self.write_xml(path, updated);
        Ok(())
    }

    /// Remove every part that is not reachable from the package relationships.
    ///
    /// Content type overrides pointing at removed parts are dropped too.
    pub fn prune_unreachable(&mut self) -> Result<usize> {
        let mut reachable: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(String::new());

        while let Some(part) = queue.pop_front() {
            let rels = self.read_relationships(&part)?;
            if !part.is_empty() && !rels.is_empty() {
                reachable.insert(Self::rels_path_for(&part));
            }
            for rel in rels.iter().filter(|r| !r.external) {
                let target = Self::resolve_path(&part, &rel.target);
                if self.exists(&target) && reachable.insert(target.clone()) {
                    queue.push_back(target);
                }
            }
        }
        reachable.insert("_rels/.rels".to_string());
        reachable.insert(CONTENT_TYPES_PART.to_string());

        let doomed: Vec<String> = self
            .order
            .iter()
            .filter(|n| !reachable.contains(*n))
            .cloned()
            .collect();
        for name in &doomed {
            self.remove_part(name);
        }

        let mut types = self.content_types()?;
        types.retain_overrides(|p| reachable.contains(p));
        self.write_content_types(&types);

        Ok(doomed.len())
    }

    /// Serialize the package into ZIP bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        let names = std::iter::once(CONTENT_TYPES_PART)
            .chain(self.order.iter().map(String::as_str).filter(|n| *n != CONTENT_TYPES_PART));
        for name in names {
            if let Some(data) = self.parts.get(name) {
                zip.start_file(name, options)?;
                zip.write_all(data)?;
            }
        }

        Ok(zip.finish()?.into_inner())
    }

    /// Write the package to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_bytes()?)?;
        Ok(())
    }

    /// Resolve a relationship target relative to the part that owns it.
    pub fn resolve_path(base: &str, relative: &str) -> String {
        if let Some(stripped) = relative.strip_prefix('/') {
            return stripped.to_string();
        }

        let base_path = Path::new(base);
        let base_dir = base_path.parent().unwrap_or(Path::new(""));

        let mut result = base_dir.to_path_buf();
        for component in Path::new(relative).components() {
            match component {
                std::path::Component::ParentDir => {
                    result.pop();
                }
                std::path::Component::Normal(c) => {
                    result.push(c);
                }
                _ => {}
            }
        }

        result.to_string_lossy().replace('\\', "/")
    }

    /// Relative target from the directory of `from_part` to `to_part`.
    pub fn relative_target(from_part: &str, to_part: &str) -> String {
        let from_dir: Vec<&str> = match from_part.rfind('/') {
            Some(i) => from_part[..i].split('/').collect(),
            None => Vec::new(),
        };
        let to: Vec<&str> = to_part.split('/').collect();
        let common = from_dir
            .iter()
            .zip(to.iter())
            .take_while(|(a, b)| a == b)
            .count();
        let mut parts: Vec<&str> = vec![".."; from_dir.len() - common];
        parts.extend_from_slice(&to[common..]);
        parts.join("/")
    }
}

impl std::fmt::Debug for OoxmlPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OoxmlPackage")
            .field("parts", &self.parts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_package() -> OoxmlPackage {
        let mut pkg = OoxmlPackage::new();
        let mut types = ContentTypes::default();
        types.ensure_default("rels", "application/vnd.openxmlformats-package.relationships+xml");
        types.ensure_default("xml", "application/xml");
        types.set_override("doc/main.xml", "application/test+xml");
        types.set_override("doc/orphan.xml", "application/test+xml");
        pkg.write_content_types(&types);

        let mut root = Relationships::new();
        root.add_new(rel_types::OFFICE_DOCUMENT, "doc/main.xml");
        pkg.write_relationships("", &root);

        let mut main = Relationships::new();
        main.add_new(rel_types::IMAGE, "media/a.png");
        pkg.write_relationships("doc/main.xml", &main);

        pkg.write_xml("doc/main.xml", "<main/>");
        pkg.write_part("doc/media/a.png", vec![1, 2, 3]);
        pkg.write_xml("doc/orphan.xml", "<orphan/>");
        pkg.write_part("doc/media/b.png", vec![4]);
        pkg
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            OoxmlPackage::resolve_path("ppt/slides/slide1.xml", "../media/image1.png"),
            "ppt/media/image1.png"
        );
        assert_eq!(
            OoxmlPackage::resolve_path("word/document.xml", "styles.xml"),
            "word/styles.xml"
        );
        assert_eq!(
            OoxmlPackage::resolve_path("ppt/slides/slide1.xml", "/ppt/media/image1.png"),
            "ppt/media/image1.png"
        );
        assert_eq!(OoxmlPackage::resolve_path("", "ppt/presentation.xml"), "ppt/presentation.xml");
    }

    #[test]
    fn test_relative_target() {
        assert_eq!(
            OoxmlPackage::relative_target("ppt/slides/slide1.xml", "ppt/media/image1.png"),
            "../media/image1.png"
        );
        assert_eq!(
            OoxmlPackage::relative_target("ppt/presentation.xml", "ppt/slides/slide2.xml"),
            "slides/slide2.xml"
        );
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(OoxmlPackage::rels_path_for(""), "_rels/.rels");
        assert_eq!(
            OoxmlPackage::rels_path_for("ppt/slides/slide1.xml"),
            "ppt/slides/_rels/slide1.xml.rels"
        );
    }

    #[test]
    fn test_relationships_collection() {
        let mut rels = Relationships::new();
        let first = rels.add_new("http://test/type1", "target1.xml");
        let second = rels.add_new("http://test/type1", "target2.xml");
        assert_eq!(first, "rId1");
        assert_eq!(second, "rId2");
        assert!(rels.get("rId1").is_some());
        assert!(rels.get("rId3").is_none());
        assert_eq!(rels.get_by_type("http://test/type1").len(), 2);

        rels.remove("rId1");
        assert_eq!(rels.len(), 1);
        assert_eq!(rels.next_id(), "rId3");
    }

    #[test]
    fn test_relationships_xml_round_trip() {
        let mut rels = Relationships::new();
        rels.add_new(rel_types::SLIDE, "slides/slide1.xml");
        rels.add(Relationship {
            id: "rId9".into(),
            rel_type: "http://test/link".into(),
            target: "https://example.com/?a=1&b=2".into(),
            external: true,
        });
        let parsed = Relationships::parse(&rels.to_xml()).unwrap();
        assert_eq!(parsed.len(), 2);
        let link = parsed.get("rId9").unwrap();
        assert!(link.external);
        assert_eq!(link.target, "https://example.com/?a=1&b=2");
    }

    #[test]
    fn test_content_types_lookup() {
        let mut types = ContentTypes::default();
        types.ensure_default("png", "image/png");
        types.ensure_default(".PNG", "image/other");
        types.set_override("ppt/slides/slide1.xml", "application/slide+xml");
        assert_eq!(types.content_type_of("ppt/media/x.png"), Some("image/png"));
        assert_eq!(
            types.content_type_of("ppt/slides/slide1.xml"),
            Some("application/slide+xml")
        );
        types.remove_override("ppt/slides/slide1.xml");
        assert_eq!(types.content_type_of("ppt/slides/slide1.xml"), None);
    }

    #[test]
    fn test_prune_unreachable() {
        let mut pkg = tiny_package();
        let removed = pkg.prune_unreachable().unwrap();
        assert_eq!(removed, 2);
        assert!(pkg.exists("doc/media/a.png"));
        assert!(!pkg.exists("doc/media/b.png"));
        assert!(!pkg.exists("doc/orphan.xml"));
        let types = pkg.content_types().unwrap();
        assert!(!types.has_override("doc/orphan.xml"));
        // Only the extension default is left for the removed part name.
        assert_eq!(types.content_type_of("doc/orphan.xml"), Some("application/xml"));
    }

    #[test]
    fn test_zip_round_trip() {
        let pkg = tiny_package();
        let bytes = pkg.to_bytes().unwrap();
        let reopened = OoxmlPackage::from_bytes(bytes).unwrap();
        assert_eq!(reopened.list_files()[0], CONTENT_TYPES_PART);
        assert_eq!(reopened.read_binary("doc/media/a.png").unwrap(), &[1, 2, 3]);
        assert_eq!(reopened.main_part().unwrap(), "doc/main.xml");
    }

    #[test]
    fn test_from_bytes_rejects_non_package() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("hello.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"hi").unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        assert!(matches!(
            OoxmlPackage::from_bytes(bytes),
            Err(Error::MissingComponent(_))
        ));
    }

    #[test]
    fn test_set_core_property() {
        let mut pkg = OoxmlPackage::new();
        pkg.write_xml(
            "docProps/core.xml",
            r#"<cp:coreProperties xmlns:cp="urn:cp" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Old</dc:title></cp:coreProperties>"#,
        );
        pkg.set_core_property("title", "New & Better").unwrap();
        pkg.set_core_property("creator", "mdoffice").unwrap();
        let xml = pkg.read_xml("docProps/core.xml").unwrap();
        assert!(xml.contains("<dc:title>New &amp; Better</dc:title>"), "got: {xml}");
        assert!(xml.contains("<dc:creator>mdoffice</dc:creator>"), "got: {xml}");
    }

    #[test]
    fn test_utf16_decoding_function() {
        let utf16_le = b"\xFF\xFE<\0?\0x\0m\0l\0>\0";
        assert_eq!(decode_xml_bytes(utf16_le).unwrap(), "<?xml>");

        let utf16_be = b"\xFE\xFF\0<\0?\0x\0m\0l\0>";
        assert_eq!(decode_xml_bytes(utf16_be).unwrap(), "<?xml>");

        let utf8_bom = b"\xEF\xBB\xBF<?xml>";
        assert_eq!(decode_xml_bytes(utf8_bom).unwrap(), "<?xml>");
    }
}

//! Markdown to word-processing document conversion.

use crate::container::{rel_types, OoxmlPackage};
use crate::detect::{detect_format, FormatType};
use crate::docx::styles::StyleMap;
use crate::docx::template;
use crate::error::{Error, Result};
use crate::markdown::{clean_generated, lines, MarkdownLine};
use crate::model::{DocConfig, DEFAULT_DOCUMENT_TITLE};
use crate::xml;
use quick_xml::events::Event;
use serde::Serialize;
use std::path::Path;

/// A paragraph queued for the document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordParagraph {
    pub style_id: Option<String>,
    pub text: String,
    /// Set when the requested style is missing and emphasis stands in for it
    pub bold: bool,
}

/// Pieces of `word/document.xml` around the body content.
#[derive(Debug, Clone)]
struct BodyParts {
    /// Everything up to and including `<w:body>`
    head: String,
    /// The body's own `w:sectPr`, if any
    sect_pr: String,
    /// `</w:body>` to the end
    tail: String,
}

/// A word-processing document whose body is built from scratch.
///
/// Template documents contribute styles, numbering, headers and section
/// properties; their body content is discarded.
pub struct WordDocument {
    package: OoxmlPackage,
    doc_part: String,
    parts: BodyParts,
    styles: StyleMap,
    body: Vec<WordParagraph>,
}

impl WordDocument {
    /// The built-in document with an empty body.
    pub fn new_default() -> Result<Self> {
        Self::from_template_package(template::default_package())
    }

    /// Use an opened package as a template.
    pub fn from_template_package(mut package: OoxmlPackage) -> Result<Self> {
        let doc_part = package.main_part()?;
        let parts = split_body(&package.read_xml(&doc_part)?)?;

        // Images belong to the discarded body.
        let mut rels = package.read_relationships(&doc_part)?;
        let images: Vec<String> = rels
            .get_by_type(rel_types::IMAGE)
            .iter()
            .map(|r| r.id.clone())
            .collect();
        if !images.is_empty() {
            for id in &images {
                rels.remove(id);
            }
            package.write_relationships(&doc_part, &rels);
            let removed = package.prune_unreachable()?;
            tracing::debug!(removed, "dropped template body media");
        }

        let styles = match rels.get_by_type(rel_types::STYLES).first() {
            Some(rel) => {
                let path = OoxmlPackage::resolve_path(&doc_part, &rel.target);
                StyleMap::parse(&package.read_xml(&path)?)?
            }
            None => StyleMap::default(),
        };

        Ok(Self {
            package,
            doc_part,
            parts,
            styles,
            body: Vec::new(),
        })
    }

    /// Styles available to the document.
    pub fn styles(&self) -> &StyleMap {
        &self.styles
    }

    /// Paragraphs added so far.
    pub fn paragraphs(&self) -> &[WordParagraph] {
        &self.body
    }

    /// Set the document title in the core properties.
    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.package.set_core_property("title", title)
    }

    /// Add a paragraph with the named style; unknown styles fall back to the
    /// default paragraph style.
    pub fn add_paragraph(&mut self, text: &str, style: Option<&str>) {
        let (style_id, bold) = self.style_or_emphasis(style, false);
        self.body.push(WordParagraph {
            style_id,
            text: text.to_string(),
            bold,
        });
    }

    /// Add a heading. Level 0 is the document title; levels above 9 are
    /// clamped.
    pub fn add_heading(&mut self, text: &str, level: u8) {
        let name = match level {
            0 => "Title".to_string(),
            n => format!("Heading {}", n.min(9)),
        };
        let (style_id, bold) = self.style_or_emphasis(Some(&name), true);
        self.body.push(WordParagraph {
            style_id,
            text: text.to_string(),
            bold,
        });
    }

    fn style_or_emphasis(&self, name: Option<&str>, emphasize: bool) -> (Option<String>, bool) {
        let Some(name) = name else {
            return (None, false);
        };
        match self.styles.id_for_name(name) {
            Some(id) => (Some(id.to_string()), false),
            None => {
                tracing::debug!(style = name, "style not defined in document");
                (None, emphasize)
            }
        }
    }

    /// The complete `word/document.xml`.
    pub fn document_xml(&self) -> String {
        let mut out = String::with_capacity(self.parts.head.len() + self.body.len() * 96);
        out.push_str(&self.parts.head);
        for p in &self.body {
            out.push_str("<w:p>");
            if let Some(id) = &p.style_id {
                out.push_str(&format!(r#"<w:pPr><w:pStyle w:val="{}"/></w:pPr>"#, xml::escape(id)));
            }
            if !p.text.is_empty() {
                out.push_str("<w:r>");
                if p.bold {
                    out.push_str("<w:rPr><w:b/></w:rPr>");
                }
                out.push_str(&format!(
                    r#"<w:t xml:space="preserve">{}</w:t>"#,
                    xml::escape(&p.text)
                ));
                out.push_str("</w:r>");
            }
            out.push_str("</w:p>");
        }
        out.push_str(&self.parts.sect_pr);
        out.push_str(&self.parts.tail);
        out
    }

    fn flush(&mut self) {
        let content = self.document_xml();
        self.package.write_xml(&self.doc_part, content);
    }

    /// Serialize to .docx bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush();
        self.package.to_bytes()
    }

    /// Write the document to a file.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.flush();
        self.package.save(path)
    }
}

impl std::fmt::Debug for WordDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordDocument")
            .field("doc_part", &self.doc_part)
            .field("paragraphs", &self.body.len())
            .field("styles", &self.styles.styles.len())
            .finish()
    }
}

/// Locate the body of a document part and its direct `w:sectPr` child.
fn split_body(content: &str) -> Result<BodyParts> {
    let mut reader = quick_xml::Reader::from_str(content);
    let mut body_open: Option<usize> = None;
    let mut depth = 0usize;
    let mut sect_start: Option<usize> = None;
    let mut sect: Option<(usize, usize)> = None;

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) => {
                let after = reader.buffer_position() as usize;
                let is_body = e.name().local_name().as_ref() == b"body";
                if body_open.is_none() {
                    if is_body {
                        body_open = Some(after);
                        depth = 1;
                    }
                    continue;
                }
                if depth == 1 && e.name().local_name().as_ref() == b"sectPr" {
                    sect_start = Some(before);
                }
                depth += 1;
            }
            Event::Empty(e) => {
                let after = reader.buffer_position() as usize;
                let local = e.name().local_name();
                if body_open.is_none() {
                    if local.as_ref() == b"body" {
                        let qname = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                        return Ok(BodyParts {
                            head: format!("{}<{qname}>", &content[..before]),
                            sect_pr: String::new(),
                            tail: format!("</{qname}>{}", &content[after..]),
                        });
                    }
                    continue;
                }
                if depth == 1 && local.as_ref() == b"sectPr" {
                    sect = Some((before, after));
                }
            }
            Event::End(e) => {
                let Some(open) = body_open else {
                    continue;
                };
                depth -= 1;
                if depth == 1 && e.name().local_name().as_ref() == b"sectPr" {
                    if let Some(start) = sect_start.take() {
                        sect = Some((start, reader.buffer_position() as usize));
                    }
                }
                if depth == 0 {
                    return Ok(BodyParts {
                        head: content[..open].to_string(),
                        sect_pr: sect
                            .map(|(s, e)| content[s..e].to_string())
                            .unwrap_or_default(),
                        tail: content[before..].to_string(),
                    });
                }
            }
            Event::Eof => return Err(Error::MissingComponent("w:body".to_string())),
            _ => {}
        }
    }
}

/// Template document with its body removed, or the built-in one.
fn load_base(template: Option<&Path>) -> Result<WordDocument> {
    let Some(path) = template else {
        return WordDocument::new_default();
    };
    let loaded = OoxmlPackage::open(path).and_then(|package| match detect_format(&package)? {
        FormatType::Docx => WordDocument::from_template_package(package).map(Some),
        other => {
            tracing::warn!(template = %path.display(), format = %other, "template is not a word document, using default");
            Ok(None)
        }
    });
    match loaded {
        Ok(Some(doc)) => Ok(doc),
        Ok(None) => WordDocument::new_default(),
        Err(e) => {
            tracing::warn!(template = %path.display(), error = %e, "template could not be loaded, using default");
            WordDocument::new_default()
        }
    }
}

/// Convert Markdown into a word-processing document.
///
/// The title paragraph comes from `config.title` (`生成的文檔` when blank);
/// `#`, `##` and `###`
/// become headings 1-3 (deeper levels use heading 3), list items use the
/// "List Bullet" and "List Number" styles and anything else is a plain
/// paragraph.
pub fn markdown_to_docx(
    markdown: &str,
    config: &DocConfig,
    template: Option<&Path>,
) -> Result<WordDocument> {
    let mut doc = load_base(template)?;
    let title = config.title_or(DEFAULT_DOCUMENT_TITLE);
    doc.set_title(title)?;
    doc.add_heading(title, 0);

    let cleaned = clean_generated(markdown);
    for line in lines(&cleaned) {
        match line {
            MarkdownLine::Blank => {}
            MarkdownLine::Heading { level, text } => doc.add_heading(text, level.min(3)),
            MarkdownLine::Bullet(text) => doc.add_paragraph(text, Some("List Bullet")),
            MarkdownLine::Numbered { text, .. } => doc.add_paragraph(text, Some("List Number")),
            MarkdownLine::Text(text) => doc.add_paragraph(text, None),
        }
    }

    tracing::info!(paragraphs = doc.paragraphs().len(), "document built");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::reader::package_paragraphs;

    fn reread(doc: &mut WordDocument) -> Vec<crate::docx::reader::DocxParagraph> {
        let pkg = OoxmlPackage::from_bytes(doc.to_bytes().unwrap()).unwrap();
        package_paragraphs(&pkg).unwrap()
    }

    #[test]
    fn test_markdown_to_docx_styles() {
        let md = "# One\n## Two\n### Three\n- bullet\n* star\n3. third\nplain & text\n\n";
        let mut doc = markdown_to_docx(md, &DocConfig::new("Report"), None).unwrap();
        let paragraphs = reread(&mut doc);

        let got: Vec<(Option<&str>, &str)> = paragraphs
            .iter()
            .map(|p| (p.style_id.as_deref(), p.text.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                (Some("Title"), "Report"),
                (Some("Heading1"), "One"),
                (Some("Heading2"), "Two"),
                (Some("Heading3"), "Three"),
                (Some("ListBullet"), "bullet"),
                (Some("ListBullet"), "star"),
                (Some("ListNumber"), "third"),
                (None, "plain & text"),
            ]
        );
    }

    #[test]
    fn test_document_keeps_section_properties() {
        let mut doc = markdown_to_docx("text", &DocConfig::default(), None).unwrap();
        let xml = doc.document_xml();
        let para = xml.find("text</w:t>").unwrap();
        let sect = xml.find("<w:sectPr>").unwrap();
        assert!(para < sect);
        assert!(xml.ends_with("</w:body></w:document>"));
        let core = OoxmlPackage::from_bytes(doc.to_bytes().unwrap())
            .unwrap()
            .read_xml("docProps/core.xml")
            .unwrap();
        assert!(core.contains("生成的演示文稿"));
    }

    #[test]
    fn test_template_body_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.docx");
        let mut first = markdown_to_docx("# Old heading\nstale", &DocConfig::new("Old"), None).unwrap();
        first.save(&path).unwrap();

        let mut doc = markdown_to_docx("fresh", &DocConfig::new("New"), Some(&path)).unwrap();
        let texts: Vec<String> = reread(&mut doc).into_iter().map(|p| p.text).collect();
        assert_eq!(texts, vec!["New".to_string(), "fresh".to_string()]);
    }

    #[test]
    fn test_template_with_localized_style_ids() {
        let mut pkg = template::default_package();
        let styles = pkg
            .read_xml("word/styles.xml")
            .unwrap()
            .replace(r#"w:styleId="Heading1""#, r#"w:styleId="1""#);
        pkg.write_xml("word/styles.xml", styles);
        pkg.write_xml(
            "word/document.xml",
            format!(
                r#"<w:document xmlns:w="{}"><w:body><w:p><w:pPr><w:sectPr/></w:pPr></w:p><w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#,
                template::W_NS
            ),
        );

        let mut doc = WordDocument::from_template_package(pkg).unwrap();
        doc.add_heading("Heading", 1);
        doc.add_heading("Deep", 4);
        let xml = doc.document_xml();
        assert!(xml.contains(r#"<w:pStyle w:val="1"/>"#));
        assert!(xml.contains(r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body>"#));
        assert!(!xml.contains("<w:pPr><w:sectPr/>"));
        // Heading 4 is not defined, so it falls back to emphasis.
        assert_eq!(doc.paragraphs()[1].style_id, None);
        assert!(doc.paragraphs()[1].bold);
    }

    #[cfg(feature = "pptx")]
    #[test]
    fn test_non_docx_template_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        crate::pptx::template::default_package().save(&path).unwrap();
        let doc = markdown_to_docx("x", &DocConfig::default(), Some(&path)).unwrap();
        assert_eq!(doc.paragraphs().len(), 2);
        assert_eq!(doc.paragraphs()[0].style_id.as_deref(), Some("Title"));
    }

    #[test]
    fn test_empty_body_element() {
        let parts = split_body(r#"<w:document xmlns:w="u"><w:body/></w:document>"#).unwrap();
        assert_eq!(parts.head, r#"<w:document xmlns:w="u"><w:body>"#);
        assert_eq!(parts.tail, "</w:body></w:document>");
        assert!(split_body("<w:document/>").is_err());
    }

    #[test]
    fn test_untitled_document_default() {
        let mut doc = markdown_to_docx("body", &DocConfig::new(""), None).unwrap();
        let paragraphs = reread(&mut doc);
        assert_eq!(paragraphs[0].text, "生成的文檔");
        assert_eq!(paragraphs[0].style_id.as_deref(), Some("Title"));
    }
}

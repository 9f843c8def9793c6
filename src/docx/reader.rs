//! Reading paragraphs back out of a word-processing document.

use crate::container::OoxmlPackage;
use crate::error::{Error, Result};
use crate::xml;
use quick_xml::events::Event;
use serde::Serialize;
use std::path::Path;

/// A paragraph of `word/document.xml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocxParagraph {
    /// `w:pStyle` value
    pub style_id: Option<String>,
    pub text: String,
}

/// Parse every paragraph of a document part in order, including those
/// nested in tables.
pub fn parse_paragraphs(content: &str) -> Result<Vec<DocxParagraph>> {
    let mut reader = quick_xml::Reader::from_str(content);
    let mut paragraphs = Vec::new();
    let mut current: Option<DocxParagraph> = None;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().local_name().as_ref() {
                b"p" => {
                    current = Some(DocxParagraph {
                        style_id: None,
                        text: String::new(),
                    })
                }
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match (e.name().local_name().as_ref(), current.as_mut()) {
                (b"p", None) => paragraphs.push(DocxParagraph {
                    style_id: None,
                    text: String::new(),
                }),
                (b"pStyle", Some(p)) => p.style_id = xml::attr(&e, b"val"),
                (b"tab", Some(p)) => p.text.push('\t'),
                (b"br" | b"cr", Some(p)) => p.text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(p) = current.as_mut() {
                    let text = t.unescape().map_err(|e| Error::XmlParse(e.to_string()))?;
                    p.text.push_str(&text);
                }
            }
            Event::End(e) => match e.name().local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if let Some(p) = current.take() {
                        paragraphs.push(p);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Paragraphs of a loaded package's main document.
pub fn package_paragraphs(package: &OoxmlPackage) -> Result<Vec<DocxParagraph>> {
    let main = package.main_part()?;
    parse_paragraphs(&package.read_xml(&main)?)
}

/// Plain text of a .docx file, one line per paragraph.
pub fn extract_text(path: impl AsRef<Path>) -> Result<String> {
    let package = OoxmlPackage::open(path)?;
    let paragraphs = package_paragraphs(&package)?;
    Ok(paragraphs
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n"))
}

//! DOCX styles parsing.

use crate::error::{Error, Result};
use crate::xml;
use quick_xml::events::Event;
use std::collections::HashMap;

/// Style type (paragraph, character, table, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleType {
    Paragraph,
    Character,
    Table,
    Numbering,
}

/// A parsed style definition.
#[derive(Debug, Clone, Default)]
pub struct Style {
    /// Style ID (e.g., "Heading1")
    pub id: String,
    /// Style name (e.g., "heading 1")
    pub name: String,
    pub style_type: Option<StyleType>,
    /// Based on another style
    pub based_on: Option<String>,
    /// Outline level (for headings)
    pub outline_level: Option<u8>,
}

/// Collection of styles from styles.xml.
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    /// Styles by ID
    pub styles: HashMap<String, Style>,
    /// Default paragraph style
    pub default_paragraph: Option<String>,
}

impl StyleMap {
    /// Parse styles from XML content.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut map = StyleMap::default();
        let mut reader = quick_xml::Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut current_style: Option<Style> = None;
        let mut in_ppr = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().local_name().as_ref() {
                    b"style" => {
                        let style_type = match xml::attr(&e, b"type").as_deref() {
                            Some("paragraph") => Some(StyleType::Paragraph),
                            Some("character") => Some(StyleType::Character),
                            Some("table") => Some(StyleType::Table),
                            Some("numbering") => Some(StyleType::Numbering),
                            _ => None,
                        };
                        let style = Style {
                            id: xml::attr(&e, b"styleId").unwrap_or_default(),
                            style_type,
                            ..Default::default()
                        };
                        let is_default = matches!(xml::attr(&e, b"default").as_deref(), Some("1" | "true"));
                        if is_default && style_type == Some(StyleType::Paragraph) {
                            map.default_paragraph = Some(style.id.clone());
                        }
                        current_style = Some(style);
                    }
                    b"pPr" if current_style.is_some() => in_ppr = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => {
                    if let Some(ref mut style) = current_style {
                        match e.name().local_name().as_ref() {
                            b"name" => style.name = xml::attr(&e, b"val").unwrap_or_default(),
                            b"basedOn" => style.based_on = xml::attr(&e, b"val"),
                            b"outlineLvl" if in_ppr => {
                                style.outline_level = xml::attr(&e, b"val").and_then(|v| v.parse().ok());
                            }
                            _ => {}
                        }
                    }
                }
                Ok(Event::End(e)) => match e.name().local_name().as_ref() {
                    b"style" => {
                        if let Some(style) = current_style.take() {
                            map.styles.insert(style.id.clone(), style);
                        }
                        in_ppr = false;
                    }
                    b"pPr" => in_ppr = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(map)
    }

    /// Find the ID of the paragraph style called `name`.
    ///
    /// Word stores built-in names in lowercase ("heading 1") while documents
    /// refer to them capitalized, so names compare case-insensitively. A
    /// style whose ID equals the name without spaces also matches.
    pub fn id_for_name(&self, name: &str) -> Option<&str> {
        let by_name = self
            .styles
            .values()
            .filter(|s| s.style_type != Some(StyleType::Character))
            .find(|s| s.name.eq_ignore_ascii_case(name));
        if let Some(style) = by_name {
            return Some(&style.id);
        }
        let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        self.styles.get(&compact).map(|s| s.id.as_str())
    }

    /// Heading level (1-based) of a style, following `basedOn` links.
    pub fn heading_level(&self, id: &str) -> Option<u8> {
        let mut current = self.styles.get(id)?;
        // Inheritance chains are short; cap the walk to survive cycles.
        for _ in 0..10 {
            if let Some(level) = current.outline_level {
                return Some(level + 1);
            }
            current = self.styles.get(current.based_on.as_deref()?)?;
        }
        None
    }

    /// Whether a style with this ID exists.
    pub fn contains(&self, id: &str) -> bool {
        self.styles.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
        <w:name w:val="Normal"/>
    </w:style>
    <w:style w:type="paragraph" w:styleId="Heading1">
        <w:name w:val="heading 1"/>
        <w:basedOn w:val="Normal"/>
        <w:pPr>
            <w:outlineLvl w:val="0"/>
        </w:pPr>
    </w:style>
    <w:style w:type="paragraph" w:styleId="CustomHeading">
        <w:name w:val="Corporate Heading"/>
        <w:basedOn w:val="Heading1"/>
    </w:style>
    <w:style w:type="paragraph" w:styleId="a5">
        <w:name w:val="List Bullet"/>
    </w:style>
    <w:style w:type="character" w:styleId="TitleChar">
        <w:name w:val="Title"/>
    </w:style>
</w:styles>"#;

    #[test]
    fn test_parse_styles() {
        let map = StyleMap::parse(STYLES).unwrap();
        assert_eq!(map.styles.len(), 5);
        assert_eq!(map.default_paragraph.as_deref(), Some("Normal"));
        let style = map.styles.get("Heading1").unwrap();
        assert_eq!(style.name, "heading 1");
        assert_eq!(style.outline_level, Some(0));
    }

    #[test]
    fn test_id_for_name() {
        let map = StyleMap::parse(STYLES).unwrap();
        assert_eq!(map.id_for_name("Heading 1"), Some("Heading1"));
        assert_eq!(map.id_for_name("List Bullet"), Some("a5"));
        // Character styles never match paragraph names.
        assert_eq!(map.id_for_name("Title"), None);
        assert_eq!(map.id_for_name("List Number"), None);
    }

    #[test]
    fn test_heading_level_follows_based_on() {
        let map = StyleMap::parse(STYLES).unwrap();
        assert_eq!(map.heading_level("Heading1"), Some(1));
        assert_eq!(map.heading_level("CustomHeading"), Some(1));
        assert_eq!(map.heading_level("Normal"), None);
        assert_eq!(map.heading_level("Missing"), None);
    }

    #[test]
    fn test_empty_styles() {
        let map = StyleMap::parse("  ").unwrap();
        assert!(map.styles.is_empty());
    }
}

//! Caller-supplied inputs for conversion and injection.

use crate::detect::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Title used when a presentation is built without one.
pub const DEFAULT_PRESENTATION_TITLE: &str = "生成的演示文稿";

/// Title used when a word-processing document is built without one.
pub const DEFAULT_DOCUMENT_TITLE: &str = "生成的文檔";

/// Document-level settings for a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocConfig {
    /// Document title (core properties, DOCX title paragraph)
    pub title: String,
    /// Headline shown on the title slide
    pub display_name: String,
}

impl DocConfig {
    /// Create a config with the same title and display name.
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            display_name: title.clone(),
            title,
        }
    }

    /// Config with the untitled default of an output format.
    pub fn default_for(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Docx => Self::new(DEFAULT_DOCUMENT_TITLE),
            _ => Self::new(DEFAULT_PRESENTATION_TITLE),
        }
    }

    /// Title, or `fallback` when it is blank.
    pub fn title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.title.trim().is_empty() {
            fallback
        } else {
            &self.title
        }
    }

    /// Display name, falling back to the title and then to `fallback`.
    pub fn display_name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.display_name.trim().is_empty() {
            self.title_or(fallback)
        } else {
            &self.display_name
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }
}

impl Default for DocConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PRESENTATION_TITLE)
    }
}

/// One image to place onto an existing slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionRequest {
    /// Image file on disk
    pub image_path: PathBuf,
    /// 1-based target slide
    pub slide_number: i64,
}

impl InjectionRequest {
    /// Create a new request.
    pub fn new(image_path: impl Into<PathBuf>, slide_number: i64) -> Self {
        Self {
            image_path: image_path.into(),
            slide_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_config_builder() {
        let cfg = DocConfig::new("Report").with_display_name("Quarterly Report");
        assert_eq!(cfg.title, "Report");
        assert_eq!(cfg.display_name, "Quarterly Report");
    }

    #[test]
    fn test_untitled_defaults_per_format() {
        assert_eq!(DocConfig::default_for(OutputFormat::Docx).title, "生成的文檔");
        assert_eq!(DocConfig::default_for(OutputFormat::Pptx).title, "生成的演示文稿");
        assert_eq!(DocConfig::default(), DocConfig::default_for(OutputFormat::Pptx));

        let blank = DocConfig::new(" ");
        assert_eq!(blank.title_or(DEFAULT_DOCUMENT_TITLE), "生成的文檔");
        assert_eq!(blank.display_name_or(DEFAULT_PRESENTATION_TITLE), "生成的演示文稿");
        let named = DocConfig::new("").with_display_name("Kickoff");
        assert_eq!(named.display_name_or(DEFAULT_PRESENTATION_TITLE), "Kickoff");
    }

    #[test]
    fn test_injection_request_json() {
        let json = r#"[{"image_path":"a.png","slide_number":2}]"#;
        let reqs: Vec<InjectionRequest> = serde_json::from_str(json).unwrap();
        assert_eq!(reqs, vec![InjectionRequest::new("a.png", 2)]);
    }
}

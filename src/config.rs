//! Conversion options and directory settings.

use crate::error::Result;
use crate::model::MARKER_IMAGE_EXTENSIONS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Attribution written under the title slide headline.
pub const DEFAULT_SUBTITLE: &str = "由 AI 自動生成";

/// Title of the slide created for an image that appears before any heading.
pub const DEFAULT_ORPHAN_SLIDE_TITLE: &str = "圖片內容";

/// Where builder pictures go, as fractions of the slide size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PicturePlacement {
    /// Left edge as a fraction of slide width
    pub left: f64,
    /// Top edge as a fraction of slide height
    pub top: f64,
    /// Picture width as a fraction of slide width
    pub width: f64,
}

impl Default for PicturePlacement {
    fn default() -> Self {
        Self {
            left: 0.55,
            top: 0.20,
            width: 0.35,
        }
    }
}

/// Options for Markdown conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Subheading placed on the title slide when the layout has room for one
    pub subtitle: String,

    /// Title for a slide synthesized to hold an image seen before any heading
    pub orphan_slide_title: String,

    /// Font size of synthesized slide titles, in hundredths of a point
    pub title_font_size: u32,

    /// Extensions tried, in order, when resolving a marker
    pub image_extensions: Vec<String>,

    /// Geometry of pictures placed from markers
    pub picture: PicturePlacement,

    /// Strip outer code fences before converting
    pub clean_input: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            subtitle: DEFAULT_SUBTITLE.to_string(),
            orphan_slide_title: DEFAULT_ORPHAN_SLIDE_TITLE.to_string(),
            title_font_size: 3200,
            image_extensions: MARKER_IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            picture: PicturePlacement::default(),
            clean_input: true,
        }
    }
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title slide attribution.
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    /// Set the title of slides created for leading images.
    pub fn with_orphan_slide_title(mut self, title: impl Into<String>) -> Self {
        self.orphan_slide_title = title.into();
        self
    }

    /// Set the synthesized title font size in points.
    pub fn with_title_font_size(mut self, points: u32) -> Self {
        self.title_font_size = points.clamp(8, 96) * 100;
        self
    }

    /// Replace the marker image extensions.
    pub fn with_image_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.image_extensions = extensions
            .into_iter()
            .map(|e| crate::model::normalize_extension(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Set picture placement.
    pub fn with_picture_placement(mut self, placement: PicturePlacement) -> Self {
        self.picture = placement;
        self
    }

    /// Convert the input verbatim.
    pub fn without_cleanup(mut self) -> Self {
        self.clean_input = false;
        self
    }
}

/// Directory layout of a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Uploaded source files
    pub upload_dir: PathBuf,
    /// Stored templates
    pub template_dir: PathBuf,
    /// Generated documents
    pub output_dir: PathBuf,
    /// Root for per-session extracted images
    pub temp_image_dir: PathBuf,
}

impl Settings {
    /// Default layout under `base`.
    pub fn from_base(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let output_dir = base.join("output");
        Self {
            upload_dir: base.join("uploads"),
            template_dir: base.join("templates_storage"),
            temp_image_dir: output_dir.join("temp_images"),
            output_dir,
        }
    }

    /// Layout under the current directory, with `MDOFFICE_*` overrides.
    ///
    /// `MDOFFICE_BASE_DIR` moves every directory; `MDOFFICE_UPLOAD_DIR`,
    /// `MDOFFICE_TEMPLATE_DIR`, `MDOFFICE_OUTPUT_DIR` and
    /// `MDOFFICE_TEMP_IMAGE_DIR` override single entries.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key).map(PathBuf::from))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<PathBuf>) -> Self {
        let base = lookup("MDOFFICE_BASE_DIR").unwrap_or_else(|| PathBuf::from("."));
        let mut settings = Self::from_base(base);
        if let Some(dir) = lookup("MDOFFICE_UPLOAD_DIR") {
            settings.upload_dir = dir;
        }
        if let Some(dir) = lookup("MDOFFICE_TEMPLATE_DIR") {
            settings.template_dir = dir;
        }
        if let Some(dir) = lookup("MDOFFICE_OUTPUT_DIR") {
            settings.temp_image_dir = dir.join("temp_images");
            settings.output_dir = dir;
        }
        if let Some(dir) = lookup("MDOFFICE_TEMP_IMAGE_DIR") {
            settings.temp_image_dir = dir;
        }
        settings
    }

    /// Create every configured directory.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            &self.upload_dir,
            &self.template_dir,
            &self.output_dir,
            &self.temp_image_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_base(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_options() {
        let opts = ConvertOptions::default();
        assert_eq!(opts.subtitle, "由 AI 自動生成");
        assert_eq!(opts.title_font_size, 3200);
        assert_eq!(opts.image_extensions, vec![".png", ".jpg", ".jpeg", ".gif", ".bmp"]);
        assert!(opts.clean_input);
    }

    #[test]
    fn test_builder_pattern() {
        let opts = ConvertOptions::new()
            .with_subtitle("draft")
            .with_title_font_size(200)
            .with_image_extensions(["PNG", ".webp", ""])
            .without_cleanup();
        assert_eq!(opts.subtitle, "draft");
        assert_eq!(opts.title_font_size, 9600);
        assert_eq!(opts.image_extensions, vec![".png", ".webp"]);
        assert!(!opts.clean_input);
    }

    #[test]
    fn test_settings_layout() {
        let s = Settings::from_base("/srv/app");
        assert_eq!(s.upload_dir, PathBuf::from("/srv/app/uploads"));
        assert_eq!(s.template_dir, PathBuf::from("/srv/app/templates_storage"));
        assert_eq!(s.temp_image_dir, PathBuf::from("/srv/app/output/temp_images"));
    }

    #[test]
    fn test_settings_overrides() {
        let env: HashMap<&str, PathBuf> = [
            ("MDOFFICE_BASE_DIR", PathBuf::from("/base")),
            ("MDOFFICE_OUTPUT_DIR", PathBuf::from("/out")),
        ]
        .into_iter()
        .collect();
        let s = Settings::from_lookup(|k| env.get(k).cloned());
        assert_eq!(s.upload_dir, PathBuf::from("/base/uploads"));
        assert_eq!(s.output_dir, PathBuf::from("/out"));
        assert_eq!(s.temp_image_dir, PathBuf::from("/out/temp_images"));
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::from_base(dir.path());
        s.ensure_dirs().unwrap();
        assert!(s.temp_image_dir.is_dir());
        assert!(s.template_dir.is_dir());
    }
}

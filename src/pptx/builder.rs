//! Markdown to presentation conversion.
//!
//! Every `#`/`##` heading opens a slide; following lines become paragraphs
//! of that slide's content frame until the next heading. Other `#` lines are
//! dropped. Image markers are resolved against a folder of extracted images
//! and placed as pictures.

use crate::config::ConvertOptions;
use crate::container::OoxmlPackage;
use crate::detect::{detect_format, FormatType};
use crate::error::{Error, Result};
use crate::markdown::{clean_generated, MarkdownLine};
use crate::marker::{has_marker, parse_marker, resolve_image_with};
use crate::model::{DocConfig, ImageRef, DEFAULT_PRESENTATION_TITLE};
use crate::pptx::layout::ResolvedLayouts;
use crate::pptx::presentation::{Presentation, Slide, SlideSize};
use crate::pptx::shape::{inches, Rect, TextFrame, TextParagraph};
use std::path::Path;

/// Position of the line walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// No slide has been opened yet
    Idle,
    /// Body lines go to `body` (an added-shape index) on `slide`
    Active { slide: usize, body: usize },
}

/// Convert Markdown into a presentation with default options.
///
/// `image_folder` enables marker resolution; `template` supplies layouts and
/// theme (its slides are discarded). An unusable template falls back to the
/// built-in presentation.
pub fn markdown_to_pptx(
    markdown: &str,
    config: &DocConfig,
    image_folder: Option<&Path>,
    template: Option<&Path>,
) -> Result<Presentation> {
    markdown_to_pptx_with(markdown, config, image_folder, template, &ConvertOptions::default())
}

/// Convert Markdown into a presentation.
pub fn markdown_to_pptx_with(
    markdown: &str,
    config: &DocConfig,
    image_folder: Option<&Path>,
    template: Option<&Path>,
    options: &ConvertOptions,
) -> Result<Presentation> {
    let mut pres = load_base(template)?;
    let roles = match pres.resolved_layouts() {
        Some(roles) => *roles,
        None => {
            tracing::warn!("template has no slide layouts, using the built-in presentation");
            pres = Presentation::new_default()?;
            *pres
                .resolved_layouts()
                .ok_or_else(|| Error::MissingComponent("slide layouts".to_string()))?
        }
    };
    tracing::debug!(?roles, "resolved slide layouts");
    pres.set_title(config.title_or(DEFAULT_PRESENTATION_TITLE))?;

    let mut builder = SlideBuilder {
        pres,
        roles,
        options,
        image_folder,
    };
    builder.add_title_slide(config.display_name_or(DEFAULT_PRESENTATION_TITLE))?;

    let cleaned;
    let text = if options.clean_input {
        cleaned = clean_generated(markdown);
        cleaned.as_str()
    } else {
        markdown
    };

    let mut cursor = Cursor::Idle;
    for line in text.lines() {
        cursor = builder.step(cursor, line)?;
    }

    tracing::info!(slides = builder.pres.slide_count(), "presentation built");
    Ok(builder.pres)
}

/// Template presentation with its slides removed, or the built-in one.
fn load_base(template: Option<&Path>) -> Result<Presentation> {
    let Some(path) = template else {
        return Presentation::new_default();
    };

    let loaded = OoxmlPackage::open(path).and_then(|package| match detect_format(&package)? {
        FormatType::Pptx => {
            let mut pres = Presentation::from_package(package)?;
            pres.strip_slides()?;
            Ok(Some(pres))
        }
        other => {
            tracing::warn!(template = %path.display(), format = %other, "template is not a presentation, using default");
            Ok(None)
        }
    });
    match loaded {
        Ok(Some(pres)) => {
            tracing::debug!(template = %path.display(), layouts = pres.layouts().len(), "loaded template");
            Ok(pres)
        }
        Ok(None) => Presentation::new_default(),
        Err(e) => {
            tracing::warn!(template = %path.display(), error = %e, "template could not be loaded, using default");
            Presentation::new_default()
        }
    }
}

fn title_rect(size: SlideSize) -> Rect {
    Rect::new(inches(0.5), inches(0.5), size.width - inches(1.0), inches(1.0))
}

fn body_rect(size: SlideSize) -> Rect {
    Rect::new(
        inches(0.5),
        inches(1.5),
        size.width - inches(1.0),
        size.height - inches(2.0),
    )
}

struct SlideBuilder<'a> {
    pres: Presentation,
    roles: ResolvedLayouts,
    options: &'a ConvertOptions,
    image_folder: Option<&'a Path>,
}

impl SlideBuilder<'_> {
    fn add_title_slide(&mut self, headline: &str) -> Result<()> {
        let idx = self.pres.add_slide(self.roles.title)?;
        self.set_slide_title(idx, headline)?;

        let subtitle = self.options.subtitle.clone();
        let slide = self.slide(idx)?;
        if let Some(sub) = slide.secondary_placeholder() {
            if let Some(frame) = slide.frame_mut(sub) {
                frame.set_text(TextParagraph::plain(subtitle));
            }
        }
        Ok(())
    }

    fn slide(&mut self, idx: usize) -> Result<&mut Slide> {
        self.pres
            .slide_mut(idx)
            .ok_or_else(|| Error::ResourceNotFound(format!("slide {}", idx + 1)))
    }

    fn set_slide_title(&mut self, idx: usize, title: &str) -> Result<()> {
        let size = self.pres.slide_size();
        let font_size = self.options.title_font_size;
        let slide = self.slide(idx)?;
        match slide.title_placeholder().and_then(|t| slide.frame_mut(t)) {
            Some(frame) => frame.set_text(TextParagraph::plain(title)),
            None => {
                let mut frame = TextFrame::new();
                frame.set_text(TextParagraph {
                    size: Some(font_size),
                    ..TextParagraph::bold(title)
                });
                slide.add_text_box(title_rect(size), true, frame);
            }
        }
        Ok(())
    }

    /// Create a content slide and its content frame.
    fn open_slide(&mut self, title: &str) -> Result<Cursor> {
        let idx = self.pres.add_slide(self.roles.content_slide_layout())?;
        self.set_slide_title(idx, title)?;

        let size = self.pres.slide_size();
        let use_placeholder = !self.roles.synthesizes_text();
        let slide = self.slide(idx)?;
        let body = match slide.body_placeholder().filter(|_| use_placeholder) {
            Some(body) => body,
            None => slide.add_text_box(body_rect(size), true, TextFrame::new()),
        };
        tracing::debug!(slide = idx + 1, title, "opened slide");
        Ok(Cursor::Active { slide: idx, body })
    }

    /// Advance the cursor over one line.
    fn step(&mut self, cursor: Cursor, line: &str) -> Result<Cursor> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(cursor);
        }

        if let Some(folder) = self.image_folder {
            if has_marker(line) {
                return match parse_marker(line) {
                    Some(image_ref) => self.place_marker(cursor, folder, image_ref),
                    None => {
                        tracing::warn!(line, "image marker numbers out of range");
                        Ok(cursor)
                    }
                };
            }
        }

        match MarkdownLine::classify(line) {
            MarkdownLine::Heading { level: 1 | 2, text } if !text.is_empty() => {
                self.open_slide(text)
            }
            // Deeper headings and other '#' lines carry no slide text.
            MarkdownLine::Heading { .. } => Ok(cursor),
            MarkdownLine::Text(text) if text.starts_with('#') => Ok(cursor),
            MarkdownLine::Bullet(text) => {
                self.append(cursor, TextParagraph::plain(text))?;
                Ok(cursor)
            }
            MarkdownLine::Numbered { raw, .. } => {
                self.append(cursor, TextParagraph::plain(raw))?;
                Ok(cursor)
            }
            MarkdownLine::Text(text) => {
                self.append(cursor, TextParagraph::plain(text))?;
                Ok(cursor)
            }
            MarkdownLine::Blank => Ok(cursor),
        }
    }

    fn append(&mut self, cursor: Cursor, paragraph: TextParagraph) -> Result<()> {
        let Cursor::Active { slide, body } = cursor else {
            tracing::debug!(text = %paragraph.text, "dropping text before the first heading");
            return Ok(());
        };
        if paragraph.text.is_empty() {
            return Ok(());
        }
        if let Some(frame) = self.slide(slide)?.frame_mut(body) {
            frame.add_paragraph(paragraph);
        }
        Ok(())
    }

    /// Consume a marker line, placing the image when it resolves.
    fn place_marker(&mut self, cursor: Cursor, folder: &Path, image_ref: ImageRef) -> Result<Cursor> {
        let Some(path) = resolve_image_with(folder, image_ref, &self.options.image_extensions) else {
            tracing::warn!(
                marker = %image_ref.marker(),
                folder = %folder.display(),
                "image for marker not found"
            );
            return Ok(cursor);
        };

        let cursor = match cursor {
            Cursor::Idle => {
                let title = self.options.orphan_slide_title.clone();
                self.open_slide(&title)?
            }
            active => active,
        };
        let Cursor::Active { slide, .. } = cursor else {
            return Ok(cursor);
        };

        let (width_px, height_px) = match image::image_dimensions(&path) {
            Ok(dims) => dims,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read image size, skipping");
                return Ok(cursor);
            }
        };
        if width_px == 0 || height_px == 0 {
            tracing::warn!(path = %path.display(), "image has no pixels, skipping");
            return Ok(cursor);
        }

        let size = self.pres.slide_size();
        let placement = self.options.picture;
        let width = (size.width as f64 * placement.width) as i64;
        let rect = Rect::new(
            (size.width as f64 * placement.left) as i64,
            (size.height as f64 * placement.top) as i64,
            width,
            (width as f64 * height_px as f64 / width_px as f64).round() as i64,
        );

        match self.pres.add_picture(slide, &path, rect) {
            Ok(()) => tracing::debug!(path = %path.display(), slide = slide + 1, "inserted image"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to insert image"),
        }
        Ok(cursor)
    }
}

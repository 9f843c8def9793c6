//! Pulling images and text out of an existing presentation.

use crate::error::{Error, Result};
use crate::model::{ExtractedImage, ImageRef};
use crate::pptx::presentation::Presentation;
use crate::pptx::shape::ShapeKind;
use serde::Serialize;
use std::path::Path;

/// Writes every embedded picture of a presentation to disk.
///
/// Files are named `slide_{s}_image_{i}{ext}` where `i` restarts at 1 on
/// each slide.
pub struct ImageExtractor;

impl ImageExtractor {
    /// Extract all pictures of the presentation at `source` into `output_dir`.
    ///
    /// Any failure aborts the whole run and is reported as
    /// [`Error::Extraction`].
    pub fn extract(
        source: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> Result<Vec<ExtractedImage>> {
        let source = source.as_ref();
        Presentation::open(source)
            .and_then(|pres| Self::extract_from(&pres, output_dir.as_ref()))
            .map_err(|e| Error::Extraction {
                path: source.to_path_buf(),
                source: Box::new(e),
            })
    }

    /// Extract from an already loaded presentation.
    pub fn extract_from(pres: &Presentation, output_dir: &Path) -> Result<Vec<ExtractedImage>> {
        std::fs::create_dir_all(output_dir)?;

        let mut extracted = Vec::new();
        for slide_index in 0..pres.slide_count() {
            let slide_number = slide_index as u32 + 1;
            for (i, image) in pres.slide_images(slide_index)?.into_iter().enumerate() {
                let image_ref = ImageRef::new(slide_number, i as u32 + 1);
                let path = output_dir.join(image_ref.file_name(&image.extension));
                std::fs::write(&path, image.data)?;
                tracing::debug!(marker = %image_ref.marker(), path = %path.display(), "extracted image");
                extracted.push(ExtractedImage::new(image_ref, path, &image.extension));
            }
        }

        tracing::info!(count = extracted.len(), dir = %output_dir.display(), "image extraction complete");
        Ok(extracted)
    }
}

/// Plain text of a presentation, optionally with image markers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextExtraction {
    pub text: String,
    /// Pictures seen across all slides
    pub image_count: usize,
}

/// Extract slide text in shape order.
///
/// With `include_markers`, every picture contributes a
/// `[圖片 s-i: 來自投影片 s]` line numbered the same way as
/// [`ImageExtractor`] names its files.
pub fn extract_text(path: impl AsRef<Path>, include_markers: bool) -> Result<TextExtraction> {
    let pres = Presentation::open(path)?;
    extract_text_from(&pres, include_markers)
}

/// [`extract_text`] over a loaded presentation.
pub fn extract_text_from(pres: &Presentation, include_markers: bool) -> Result<TextExtraction> {
    let mut slides_text = Vec::new();
    let mut image_count = 0;

    for (slide_index, slide) in pres.slides().iter().enumerate() {
        let slide_number = slide_index as u32 + 1;
        let mut parts: Vec<String> = Vec::new();
        let mut per_slide = 0;

        for shape in slide.shapes()? {
            match shape.kind {
                ShapeKind::Picture => {
                    per_slide += 1;
                    image_count += 1;
                    if include_markers {
                        let marker = ImageRef::new(slide_number, per_slide).reference_marker();
                        parts.push(format!("\n{marker}\n"));
                    }
                }
                ShapeKind::Text => {
                    let text = shape.text();
                    if !text.trim().is_empty() {
                        parts.push(text);
                    }
                }
                ShapeKind::Other => {}
            }
        }

        if !parts.is_empty() {
            slides_text.push(parts.join("\n"));
        }
    }

    Ok(TextExtraction {
        text: slides_text.join("\n\n"),
        image_count,
    })
}

//! Extracted image records and their slide coordinates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Image extensions accepted when resolving markers against a folder.
pub const MARKER_IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".bmp"];

/// Origin coordinate of an image: 1-based slide and per-slide image ordinal.
///
/// `image_index` restarts at 1 on every slide, so only the pair is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageRef {
    /// 1-based slide position
    pub slide_index: u32,
    /// 1-based image ordinal within the slide
    pub image_index: u32,
}

impl ImageRef {
    /// Create a new coordinate.
    pub fn new(slide_index: u32, image_index: u32) -> Self {
        Self {
            slide_index,
            image_index,
        }
    }

    /// Short marker stored on extracted records: `[圖片 s-i]`.
    pub fn marker(&self) -> String {
        format!("[圖片 {}-{}]", self.slide_index, self.image_index)
    }

    /// Marker embedded into extracted text: `[圖片 s-i: 來自投影片 s]`.
    pub fn reference_marker(&self) -> String {
        format!(
            "[圖片 {}-{}: 來自投影片 {}]",
            self.slide_index, self.image_index, self.slide_index
        )
    }

    /// File stem used on disk: `slide_s_image_i`.
    pub fn file_stem(&self) -> String {
        format!("slide_{}_image_{}", self.slide_index, self.image_index)
    }

    /// File name with an extension (with or without leading '.').
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}{}", self.file_stem(), normalize_extension(extension))
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.slide_index, self.image_index)
    }
}

/// One image pulled out of a source presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedImage {
    /// 1-based slide position
    pub slide_index: u32,
    /// 1-based ordinal within the slide
    pub image_index: u32,
    /// Where the image was written
    pub file_path: PathBuf,
    /// Extension including the leading '.'
    pub extension: String,
    /// Canonical marker, `[圖片 s-i]`
    pub marker: String,
}

impl ExtractedImage {
    /// Build a record for `image_ref` written to `file_path`.
    pub fn new(image_ref: ImageRef, file_path: PathBuf, extension: &str) -> Self {
        Self {
            slide_index: image_ref.slide_index,
            image_index: image_ref.image_index,
            file_path,
            extension: normalize_extension(extension),
            marker: image_ref.marker(),
        }
    }

    /// Coordinate of this image.
    pub fn image_ref(&self) -> ImageRef {
        ImageRef::new(self.slide_index, self.image_index)
    }

    /// File name on disk.
    pub fn filename(&self) -> String {
        self.image_ref().file_name(&self.extension)
    }
}

/// Ensure an extension carries exactly one leading '.' and is lowercase.
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{}", trimmed.to_lowercase())
    }
}

/// MIME type for an image extension.
pub fn image_content_type(ext: &str) -> Option<&'static str> {
    let mime = match ext.trim_start_matches('.').to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "svg" => "image/svg+xml",
        "wmf" => "image/x-wmf",
        "emf" => "image/x-emf",
        "webp" => "image/webp",
        _ => return None,
    };
    Some(mime)
}

/// Extension for an image MIME type.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let ext = match content_type.to_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/bmp" | "image/x-bmp" => "bmp",
        "image/tiff" => "tiff",
        "image/svg+xml" => "svg",
        "image/x-wmf" => "wmf",
        "image/x-emf" => "emf",
        "image/webp" => "webp",
        _ => return None,
    };
    Some(ext)
}

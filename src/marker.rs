//! Image marker recognition.
//!
//! Markers survive a trip through an LLM, so the pattern accepts both the
//! bracketed form written by extraction (`[圖片 1-2: 來自投影片 1]`) and the
//! list-item form a model tends to produce when summarizing
//! (`- 圖片 1-2: 來自投影片 1`). The trailing slide reference is informational;
//! the leading pair is authoritative.

use crate::model::{ImageRef, MARKER_IMAGE_EXTENSIONS};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static RE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-\[]?\s*圖片\s+(\d+)\s*-\s*(\d+)(?:\s*[:：]\s*來自投影片\s*\d+)?\s*\]?").unwrap()
});

/// Whether a line carries a marker, even one whose numbers do not fit an
/// [`ImageRef`].
pub fn has_marker(line: &str) -> bool {
    RE_MARKER.is_match(line)
}

/// Return the first `(slide_index, image_index)` marker on a line.
///
/// `None` when the first marker's numbers overflow; such a marker can never
/// resolve to a file.
pub fn parse_marker(line: &str) -> Option<ImageRef> {
    let caps = RE_MARKER.captures(line)?;
    let slide = caps.get(1)?.as_str().parse().ok()?;
    let image = caps.get(2)?.as_str().parse().ok()?;
    Some(ImageRef::new(slide, image))
}

/// Find the extracted file for `image_ref` in `folder`, trying each accepted
/// extension in order.
pub fn resolve_image(folder: &Path, image_ref: ImageRef) -> Option<PathBuf> {
    resolve_image_with(folder, image_ref, &MARKER_IMAGE_EXTENSIONS)
}

/// Same as [`resolve_image`] with a caller-chosen extension list.
pub fn resolve_image_with<S: AsRef<str>>(
    folder: &Path,
    image_ref: ImageRef,
    extensions: &[S],
) -> Option<PathBuf> {
    let stem = image_ref.file_stem();
    extensions
        .iter()
        .map(|ext| folder.join(format!("{}{}", stem, ext.as_ref())))
        .find(|candidate| candidate.is_file())
}

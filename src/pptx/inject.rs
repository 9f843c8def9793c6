//! Placing images onto slides of an existing presentation.

use crate::error::Result;
use crate::model::InjectionRequest;
use crate::pptx::presentation::{Presentation, SlideSize};
use crate::pptx::shape::{inches, Rect};
use std::path::{Path, PathBuf};

/// Share of the slide width an injected image may occupy.
const MAX_WIDTH_RATIO: f64 = 0.45;
/// Share of the slide height an injected image may occupy.
const MAX_HEIGHT_RATIO: f64 = 0.70;

/// Adds images to slides of a saved presentation and writes a new version.
pub struct ImageInjector;

impl ImageInjector {
    /// Apply `requests` to the presentation at `source`.
    ///
    /// Requests whose image is missing or unreadable, or whose slide number
    /// is outside `1..=slide_count`, are logged and skipped. The result is
    /// written to `output`, or next to the source as `<stem>_vN.<ext>` with
    /// the first free `N`. Returns the written path.
    pub fn inject(
        source: impl AsRef<Path>,
        requests: &[InjectionRequest],
        output: Option<&Path>,
    ) -> Result<PathBuf> {
        let source = source.as_ref();
        let mut pres = Presentation::open(source)?;

        let mut applied = 0usize;
        for request in requests {
            if Self::apply(&mut pres, request)? {
                applied += 1;
            }
        }

        let target = match output {
            Some(path) => path.to_path_buf(),
            None => next_version_path(source),
        };
        pres.save(&target)?;
        tracing::info!(
            applied,
            skipped = requests.len() - applied,
            output = %target.display(),
            "image injection complete"
        );
        Ok(target)
    }

    fn apply(pres: &mut Presentation, request: &InjectionRequest) -> Result<bool> {
        let path = request.image_path.as_path();
        if path.as_os_str().is_empty() || !path.is_file() {
            tracing::warn!(image = %path.display(), "image file does not exist, skipping");
            return Ok(false);
        }

        let count = pres.slide_count();
        let slide_index = match usize::try_from(request.slide_number) {
            Ok(n) if (1..=count).contains(&n) => n - 1,
            _ => {
                tracing::warn!(
                    slide = request.slide_number,
                    slide_count = count,
                    "invalid slide number, skipping"
                );
                return Ok(false);
            }
        };

        let (width, height) = match image::image_dimensions(path) {
            Ok((w, h)) if w > 0 && h > 0 => (w, h),
            Ok(_) => {
                tracing::warn!(image = %path.display(), "image has no pixels, skipping");
                return Ok(false);
            }
            Err(e) => {
                tracing::warn!(image = %path.display(), error = %e, "cannot read image size, skipping");
                return Ok(false);
            }
        };

        let rect = injection_rect(pres.slide_size(), width, height);
        pres.add_picture(slide_index, path, rect)?;
        tracing::debug!(image = %path.display(), slide = request.slide_number, "injected image");
        Ok(true)
    }
}

/// Scale the image into the right side of the slide, keeping its aspect
/// ratio, 0.5in from the right edge and vertically centered.
pub fn injection_rect(size: SlideSize, width_px: u32, height_px: u32) -> Rect {
    let slide_w = size.width as f64;
    let slide_h = size.height as f64;
    let scale = (slide_w * MAX_WIDTH_RATIO / width_px as f64)
        .min(slide_h * MAX_HEIGHT_RATIO / height_px as f64);

    let width = (width_px as f64 * scale) as i64;
    let height = (height_px as f64 * scale) as i64;
    Rect::new(
        size.width - width - inches(0.5),
        (size.height - height) / 2,
        width,
        height,
    )
}

/// `<dir>/<stem>_vN.<ext>` with the smallest `N >= 1` that does not exist.
pub fn next_version_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "presentation".to_string());
    let ext = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pptx".to_string());
    let dir = source.parent().unwrap_or_else(|| Path::new(""));

    let mut version = 1u32;
    loop {
        let candidate = dir.join(format!("{stem}_v{version}.{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pptx::shape::ShapeKind;

    fn deck(dir: &Path, slides: usize) -> PathBuf {
        let mut pres = Presentation::new_default().unwrap();
        for _ in 0..slides {
            pres.add_slide(1).unwrap();
        }
        let path = dir.join("deck.pptx");
        pres.save(&path).unwrap();
        path
    }

    fn picture_counts(path: &Path) -> Vec<usize> {
        let pres = Presentation::open(path).unwrap();
        pres.slides()
            .iter()
            .map(|s| {
                s.shapes()
                    .unwrap()
                    .iter()
                    .filter(|r| r.kind == ShapeKind::Picture)
                    .count()
            })
            .collect()
    }

    #[test]
    fn test_injection_rect_wide_image() {
        let size = SlideSize::default();
        let rect = injection_rect(size, 400, 100);
        let expected_w = (9_144_000f64 * 0.45) as i64;
        assert_eq!(rect.width, expected_w);
        assert_eq!(rect.height, (100f64 * (9_144_000f64 * 0.45 / 400.0)) as i64);
        assert_eq!(rect.left, 9_144_000 - expected_w - 457_200);
        assert_eq!(rect.top, (6_858_000 - rect.height) / 2);
    }

    #[test]
    fn test_injection_rect_tall_image() {
        let rect = injection_rect(SlideSize::default(), 100, 1000);
        assert_eq!(rect.height, (1000f64 * (6_858_000f64 * 0.7 / 1000.0)) as i64);
        assert!(rect.width < (9_144_000f64 * 0.45) as i64);
    }

    #[test]
    fn test_out_of_range_slides_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let source = deck(dir.path(), 2);
        let img = dir.path().join("pic.png");
        image::RgbImage::new(8, 4).save(&img).unwrap();

        let requests = vec![
            InjectionRequest::new(&img, 0),
            InjectionRequest::new(&img, 3),
            InjectionRequest::new(&img, -1),
            InjectionRequest::new(&img, 2),
            InjectionRequest::new(dir.path().join("missing.png"), 1),
        ];
        let out = ImageInjector::inject(&source, &requests, None).unwrap();
        assert_eq!(out, dir.path().join("deck_v1.pptx"));
        assert_eq!(picture_counts(&out), vec![0, 1]);
    }

    #[test]
    fn test_version_increments() {
        let dir = tempfile::tempdir().unwrap();
        let source = deck(dir.path(), 1);

        let first = ImageInjector::inject(&source, &[], None).unwrap();
        let second = ImageInjector::inject(&source, &[], None).unwrap();
        assert_eq!(first.file_name().unwrap(), "deck_v1.pptx");
        assert_eq!(second.file_name().unwrap(), "deck_v2.pptx");
        assert_eq!(picture_counts(&second), vec![0]);
    }

    #[test]
    fn test_unreadable_image_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let source = deck(dir.path(), 1);
        let bogus = dir.path().join("bogus.png");
        std::fs::write(&bogus, b"not an image").unwrap();

        let target = dir.path().join("out.pptx");
        let out =
            ImageInjector::inject(&source, &[InjectionRequest::new(&bogus, 1)], Some(&target))
                .unwrap();
        assert_eq!(out, target);
        assert_eq!(picture_counts(&out), vec![0]);
    }
}

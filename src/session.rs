//! Per-request scratch directories for extracted images.

use crate::config::Settings;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A uniquely named directory under the configured temp-image root.
///
/// The directory and its contents are removed when the session is dropped
/// unless [`ImageSession::keep`] is called.
#[derive(Debug)]
pub struct ImageSession {
    dir: TempDir,
}

impl ImageSession {
    /// Create a session directory inside `settings.temp_image_dir`.
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::in_dir(&settings.temp_image_dir)
    }

    /// Create a session directory inside `root`, creating `root` if needed.
    pub fn in_dir(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new().prefix("session_").tempdir_in(root)?;
        tracing::debug!(dir = %dir.path().display(), "created image session");
        Ok(Self { dir })
    }

    /// Directory holding the session's images.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Random identifier of the session (the directory name).
    pub fn id(&self) -> String {
        self.dir
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Extract every picture of a presentation into the session.
    #[cfg(feature = "pptx")]
    pub fn extract(&self, source: impl AsRef<Path>) -> Result<Vec<crate::model::ExtractedImage>> {
        crate::pptx::ImageExtractor::extract(source, self.path())
    }

    /// Persist the directory beyond this value's lifetime, e.g. between the
    /// upload and conversion requests of one user. Remove it later with
    /// [`ImageSession::cleanup`].
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }

    /// Remove a directory previously persisted with [`ImageSession::keep`].
    ///
    /// Only directories created by a session are accepted.
    pub fn cleanup(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let is_session = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("session_"));
        if !is_session {
            return Err(Error::InvalidData(format!(
                "{} is not an image session directory",
                path.display()
            )));
        }
        if path.exists() {
            std::fs::remove_dir_all(path)?;
            tracing::debug!(dir = %path.display(), "removed image session");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let session = ImageSession::in_dir(root.path().join("temp_images")).unwrap();
            std::fs::write(session.path().join("slide_1_image_1.png"), b"x").unwrap();
            assert!(session.id().starts_with("session_"));
            session.path().to_path_buf()
        };
        assert!(!path.exists());
        assert!(root.path().join("temp_images").is_dir());
    }

    #[test]
    fn test_sessions_are_distinct() {
        let root = tempfile::tempdir().unwrap();
        let a = ImageSession::in_dir(root.path()).unwrap();
        let b = ImageSession::in_dir(root.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_keep_and_cleanup() {
        let root = tempfile::tempdir().unwrap();
        let settings = Settings::from_base(root.path());
        let kept = ImageSession::new(&settings).unwrap().keep();
        assert!(kept.is_dir());
        assert!(kept.starts_with(&settings.temp_image_dir));

        ImageSession::cleanup(&kept).unwrap();
        assert!(!kept.exists());
        // Already gone is fine.
        ImageSession::cleanup(&kept).unwrap();
    }

    #[test]
    fn test_cleanup_rejects_foreign_dirs() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            ImageSession::cleanup(root.path()),
            Err(Error::InvalidData(_))
        ));
        assert!(root.path().is_dir());
    }
}

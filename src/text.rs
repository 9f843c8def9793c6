//! Plain text of template files, used to build generation prompts.

use crate::detect::{detect_format_from_path, FormatType};
use crate::error::Result;
use std::path::Path;

/// Read the text of a PPTX, DOCX, TXT or MD file.
///
/// Office files are recognized by content when the extension is missing or
/// unfamiliar.
pub fn template_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "txt" | "md" | "markdown" => {
            let bytes = std::fs::read(path)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => match detect_format_from_path(path)? {
            FormatType::Pptx => pptx_text(path),
            FormatType::Docx => docx_text(path),
        },
    }
}

#[cfg(feature = "pptx")]
fn pptx_text(path: &Path) -> Result<String> {
    Ok(crate::pptx::extract_text(path, false)?.text)
}

#[cfg(not(feature = "pptx"))]
fn pptx_text(_path: &Path) -> Result<String> {
    Err(crate::error::Error::UnsupportedFormat("pptx support is disabled".to_string()))
}

#[cfg(feature = "docx")]
fn docx_text(path: &Path) -> Result<String> {
    crate::docx::extract_text(path)
}

#[cfg(not(feature = "docx"))]
fn docx_text(_path: &Path) -> Result<String> {
    Err(crate::error::Error::UnsupportedFormat("docx support is disabled".to_string()))
}

/// Reject paths that are neither text nor a recognizable office file.
pub fn is_supported_template(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    let by_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            ["txt", "md", "markdown", "pptx", "docx"]
                .iter()
                .any(|known| e.eq_ignore_ascii_case(known))
        });
    by_ext || detect_format_from_path(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocConfig;

    #[test]
    fn test_plain_text_templates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outline.md");
        std::fs::write(&path, "# 目的\n- 範圍\n").unwrap();
        assert_eq!(template_text(&path).unwrap(), "# 目的\n- 範圍\n");
        assert!(is_supported_template(&path));
    }

    #[cfg(feature = "pptx")]
    #[test]
    fn test_presentation_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        let mut pres =
            crate::pptx::markdown_to_pptx("# Scope\n- item", &DocConfig::new("Deck"), None, None)
                .unwrap();
        pres.save(&path).unwrap();

        let text = template_text(&path).unwrap();
        assert!(text.contains("Deck"));
        assert!(text.contains("Scope\nitem"));
    }

    #[cfg(feature = "docx")]
    #[test]
    fn test_document_template_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template");
        let mut doc = crate::docx::markdown_to_docx("## Steps", &DocConfig::new("SOP"), None).unwrap();
        doc.save(&path).unwrap();
        assert_eq!(template_text(&path).unwrap(), "SOP\nSteps");
    }

    #[test]
    fn test_unknown_binary_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, [0u8, 1, 2, 3]).unwrap();
        assert!(template_text(&path).is_err());
        assert!(!is_supported_template(&path));
    }
}

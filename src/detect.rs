//! Format detection for templates and output requests.

use crate::container::OoxmlPackage;
use crate::error::{Error, Result};
use std::path::Path;

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Main part content types of word-processing packages.
const DOCX_MAIN_TYPES: [&str; 4] = [
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml",
    "application/vnd.ms-word.document.macroEnabled.main+xml",
    "application/vnd.ms-word.template.macroEnabledTemplate.main+xml",
];

/// Main part content types of presentation packages.
const PPTX_MAIN_TYPES: [&str; 4] = [
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml",
    "application/vnd.openxmlformats-officedocument.presentationml.template.main+xml",
    "application/vnd.ms-powerpoint.presentation.macroEnabled.main+xml",
    "application/vnd.ms-powerpoint.template.macroEnabled.main+xml",
];

/// Detected Office document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    /// Microsoft Word document (.docx)
    Docx,
    /// Microsoft PowerPoint presentation (.pptx)
    Pptx,
}

impl FormatType {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Docx => "docx",
            FormatType::Pptx => "pptx",
        }
    }

    /// Returns a human-readable name for this format.
    pub fn name(&self) -> &'static str {
        match self {
            FormatType::Docx => "Word Document",
            FormatType::Pptx => "PowerPoint Presentation",
        }
    }
}

impl std::fmt::Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Requested output of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Raw Markdown only
    Markdown,
    /// Word document
    Docx,
    /// PowerPoint presentation
    #[default]
    Pptx,
    /// PDF (not rendered by this crate)
    Pdf,
}

impl OutputFormat {
    /// File extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Docx => "docx",
            OutputFormat::Pptx => "pptx",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "docx" => Ok(OutputFormat::Docx),
            "pptx" => Ok(OutputFormat::Pptx),
            "pdf" => Ok(OutputFormat::Pdf),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Detect the format of a template file.
///
/// The file must be a ZIP package; the format comes from the content type of
/// the part targeted by the officeDocument relationship.
///
/// # Example
///
/// ```no_run
/// use mdoffice::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("template.pptx")?;
/// println!("Detected format: {}", format);
/// # Ok::<(), mdoffice::Error>(())
/// ```
pub fn detect_format_from_path(path: impl AsRef<Path>) -> Result<FormatType> {
    detect_format_from_bytes(&std::fs::read(path.as_ref())?)
}

/// Detect the format type from a byte slice.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<FormatType> {
    if !is_zip_file(data) {
        return Err(Error::UnknownFormat);
    }
    detect_format(&OoxmlPackage::from_bytes(data.to_vec())?)
}

/// Detect the format of a loaded package.
///
/// Macro-enabled files and templates (`.docm`, `.dotx`, `.pptm`, `.potx`)
/// count as their base format. A package whose main part has no known
/// content type is classified by the folder holding that part.
pub fn detect_format(package: &OoxmlPackage) -> Result<FormatType> {
    let main = package.main_part()?;
    let types = package.content_types()?;

    if let Some(content_type) = types.content_type_of(&main) {
        if DOCX_MAIN_TYPES.contains(&content_type) {
            return Ok(FormatType::Docx);
        }
        if PPTX_MAIN_TYPES.contains(&content_type) {
            return Ok(FormatType::Pptx);
        }
        tracing::debug!(part = %main, content_type, "unrecognized main part content type");
    }

    match main.split('/').next() {
        Some("word") => Ok(FormatType::Docx),
        Some("ppt") => Ok(FormatType::Pptx),
        _ => Err(Error::UnknownFormat),
    }
}

fn is_zip_file(data: &[u8]) -> bool {
    data.starts_with(&ZIP_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{rel_types, ContentTypes, Relationships};

    #[test]
    fn test_format_type_display() {
        assert_eq!(FormatType::Docx.to_string(), "Word Document");
        assert_eq!(FormatType::Pptx.to_string(), "PowerPoint Presentation");
        assert_eq!(FormatType::Pptx.extension(), "pptx");
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("PPTX".parse::<OutputFormat>().unwrap(), OutputFormat::Pptx);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert!(matches!(
            "xlsx".parse::<OutputFormat>(),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_is_zip_file() {
        assert!(is_zip_file(&[0x50, 0x4B, 0x03, 0x04, 0x00]));
        assert!(!is_zip_file(&[0x00, 0x00, 0x00, 0x00]));
        assert!(!is_zip_file(&[0x50, 0x4B]));
    }

    fn package_with_main(part: &str, content_type: Option<&str>) -> OoxmlPackage {
        let mut pkg = OoxmlPackage::new();
        let mut types = ContentTypes::default();
        types.ensure_default("xml", "application/xml");
        if let Some(ct) = content_type {
            types.set_override(part, ct);
        }
        pkg.write_content_types(&types);
        let mut root = Relationships::new();
        root.add_new(rel_types::OFFICE_DOCUMENT, part);
        pkg.write_relationships("", &root);
        pkg.write_xml(part, "<root/>");
        pkg
    }

    #[test]
    fn test_detect_by_main_part_type() {
        let potx = package_with_main("ppt/presentation.xml", Some(PPTX_MAIN_TYPES[1]));
        assert_eq!(detect_format(&potx).unwrap(), FormatType::Pptx);

        // Main part type wins over the folder name.
        let odd = package_with_main("ppt/document.xml", Some(DOCX_MAIN_TYPES[2]));
        assert_eq!(detect_format(&odd).unwrap(), FormatType::Docx);
    }

    #[test]
    fn test_detect_by_main_part_folder() {
        let docx = package_with_main("word/document.xml", None);
        assert_eq!(detect_format(&docx).unwrap(), FormatType::Docx);

        let unknown = package_with_main("xl/workbook.xml", None);
        assert!(matches!(detect_format(&unknown), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_detect_bytes_round_trip() {
        let pkg = package_with_main("word/document.xml", Some(DOCX_MAIN_TYPES[0]));
        let bytes = pkg.to_bytes().unwrap();
        assert_eq!(detect_format_from_bytes(&bytes).unwrap(), FormatType::Docx);
    }

    #[test]
    fn test_detect_invalid_data() {
        let result = detect_format_from_bytes(&[0x00, 0x00, 0x00, 0x00]);
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }
}

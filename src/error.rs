//! Error types for the mdoffice library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mdoffice operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during document generation and conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format could not be determined.
    #[error("Unknown file format")]
    UnknownFormat,

    /// The file format is recognized but not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Error reading or writing a ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Invalid or malformed data in the document.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required package part is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// A referenced file or slide was not found.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// An image could not be decoded.
    #[error("Image error: {0}")]
    Image(String),

    /// Image extraction from a presentation failed as a whole.
    #[error("Failed to extract images from '{path}': {source}")]
    Extraction {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// The text-generation collaborator failed.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Error while rendering output.
    #[error("Render error: {0}")]
    Render(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

//! # mdoffice
//!
//! Markdown to PowerPoint and Word conversion with template inheritance and
//! slide image reconciliation.
//!
//! Images pulled out of a source presentation are named by slide and
//! position, referenced from Markdown through markers such as
//! `[圖片 2-1: 來自投影片 2]`, and placed back onto the generated slides.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mdoffice::pptx::{extract_text, markdown_to_pptx, ImageExtractor};
//! use mdoffice::DocConfig;
//! use std::path::Path;
//!
//! // Pull images and marked-up text out of an old deck
//! ImageExtractor::extract("old.pptx", "images")?;
//! let source = extract_text("old.pptx", true)?;
//!
//! // ...rewrite source.text, keeping the markers...
//!
//! let config = DocConfig::new("Onboarding");
//! let mut pres = markdown_to_pptx(
//!     &source.text,
//!     &config,
//!     Some(Path::new("images")),
//!     Some(Path::new("corporate.pptx")),
//! )?;
//! pres.save("onboarding.pptx")?;
//! # Ok::<(), mdoffice::Error>(())
//! ```
//!
//! ## Features
//!
//! - `pptx` (default): presentation building, extraction and injection
//! - `docx` (default): word-processing output

pub mod config;
pub mod container;
pub mod detect;
pub mod error;
pub mod generate;
pub mod markdown;
pub mod marker;
pub mod model;
pub mod session;
pub mod text;
mod xml;

#[cfg(feature = "docx")]
pub mod docx;

#[cfg(feature = "pptx")]
pub mod pptx;

// Re-exports
pub use config::{ConvertOptions, PicturePlacement, Settings};
pub use container::{OoxmlPackage, Relationship, Relationships};
pub use detect::{
    detect_format, detect_format_from_bytes, detect_format_from_path, FormatType, OutputFormat,
};
pub use error::{Error, Result};
pub use generate::{generate_document, GeneratedDocument, GenerationRequest, TextGenerator};
pub use marker::{parse_marker, resolve_image};
pub use model::{DocConfig, ExtractedImage, ImageRef, InjectionRequest};
pub use session::ImageSession;

#[cfg(feature = "docx")]
pub use docx::{markdown_to_docx, WordDocument};

#[cfg(feature = "pptx")]
pub use pptx::{extract_text, markdown_to_pptx, ImageExtractor, ImageInjector, Presentation};

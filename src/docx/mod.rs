//! DOCX (Word) documents.
//!
//! Markdown is rendered into the body of either a built-in document or a
//! template whose styles and page setup are kept.

mod builder;
mod reader;
pub mod styles;
pub mod template;

pub use builder::{markdown_to_docx, WordDocument, WordParagraph};
pub use reader::{extract_text, package_paragraphs, parse_paragraphs, DocxParagraph};
pub use styles::StyleMap;

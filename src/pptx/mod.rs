//! PPTX (PowerPoint) presentations.
//!
//! Building presentations from Markdown on top of a template, extracting
//! their images and text, and injecting images into saved decks.

mod builder;
mod extract;
mod inject;
pub mod layout;
mod presentation;
pub mod shape;
pub mod template;

pub use builder::{markdown_to_pptx, markdown_to_pptx_with, Cursor};
pub use extract::{extract_text, extract_text_from, ImageExtractor, TextExtraction};
pub use inject::{injection_rect, next_version_path, ImageInjector};
pub use layout::{resolve_layouts, LayoutRole, ResolvedLayouts, SlideLayout};
pub use presentation::{EmbeddedImage, Presentation, Slide, SlideSize};
pub use shape::{ShapeKind, ShapeRecord};

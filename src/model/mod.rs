//! Records exchanged between the extraction, conversion and injection stages.

mod image;
mod request;

pub use image::*;
pub use request::*;

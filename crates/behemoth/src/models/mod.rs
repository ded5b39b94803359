//! Data models shared by every pipeline stage.

mod annotation;
mod document;

pub use annotation::Annotation;
pub use document::{DisplayOptions, Document};

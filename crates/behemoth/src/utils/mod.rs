//! Utility modules.

pub mod format;
pub mod mime;
pub mod text;

pub use format::{format_size, CorpusSize};
pub use mime::{clean_mime_type, detect_mime_type, guess_mime_from_url, MimeCategory};
pub use text::{utf16_len, utf16_slice, Utf16Cursor};

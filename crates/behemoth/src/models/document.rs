//! The document record passed between pipeline stages.
//!
//! A document starts life with just a URL and raw content, and each stage
//! fills in more of it: extracted text, metadata, annotations. Offsets of
//! annotations always refer to `text`, never to `content`.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::annotation::Annotation;
use crate::utils::text::utf16_slice;

/// Aggregate document value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier, also the record key in most stages.
    pub url: String,
    /// MIME type; parameters are stripped when the record is written.
    /// The record stores an absent type as an empty string, so `Some("")`
    /// reads back as `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Raw original bytes. Absent content is written as zero bytes, so
    /// empty content reads back as `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<u8>>,
    /// Extracted text; authoritative once present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    /// Insertion order is kept as is; nothing re-sorts on write.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

/// Which parts of a document `Document::display` renders.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayOptions {
    pub content: bool,
    pub text: bool,
    pub annotations: bool,
    pub metadata: bool,
}

impl Document {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Metadata map, created on first access.
    pub fn metadata_mut(&mut self) -> &mut BTreeMap<String, String> {
        self.metadata.get_or_insert_with(BTreeMap::new)
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|md| md.get(key))
            .map(String::as_str)
    }

    pub fn clear_annotations(&mut self) {
        self.annotations.clear();
    }

    pub fn clear_metadata(&mut self) {
        self.metadata = None;
    }

    /// Annotations whose type equals `kind`, in list order.
    pub fn annotations_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Annotation> {
        self.annotations.iter().filter(move |a| a.kind == kind)
    }

    /// Text covered by an annotation, if the offsets fall inside `text`.
    pub fn covered_text(&self, annotation: &Annotation) -> Option<&str> {
        let text = self.text.as_deref()?;
        utf16_slice(text, annotation.start, annotation.end)
    }

    /// Human-readable dump of the record.
    pub fn display(&self, options: DisplayOptions) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "url: {}", self.url);
        let _ = writeln!(
            out,
            "contentType: {}",
            self.content_type.as_deref().unwrap_or("")
        );

        if options.metadata {
            if let Some(metadata) = &self.metadata {
                let _ = writeln!(out, "metadata:");
                for (key, value) in metadata {
                    let _ = writeln!(out, "\t{}: {}", key, value);
                }
            }
        }

        if options.content {
            if let Some(content) = &self.content {
                let _ = writeln!(out, "Content:\n{}", String::from_utf8_lossy(content));
            }
        }

        if options.text {
            if let Some(text) = &self.text {
                let _ = writeln!(out, "Text:\n{}", text);
            }
        }

        if options.annotations && !self.annotations.is_empty() {
            let _ = writeln!(out, "Annotations:");
            for annotation in &self.annotations {
                let _ = writeln!(out, "{}", annotation);
            }
        }

        out
    }
}

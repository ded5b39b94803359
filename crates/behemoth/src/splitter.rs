//! Decomposition of one document into sub-documents along annotation spans.
//!
//! With no `document.splitter.type` configured the splitter sorts the
//! annotations and hands back the original document untouched. Configuring
//! a type turns on real splitting: every annotation matching the
//! type/feature/value query becomes its own document holding the covered
//! text and the annotations nested inside the span, shifted to start at 0.

use thiserror::Error;

use crate::annotations::{self, AnnotationQuery};
use crate::config::keys::{SPLITTER_FEATURE, SPLITTER_KEEP_METADATA, SPLITTER_TYPE, SPLITTER_VALUE};
use crate::config::{ConfigError, Configuration};
use crate::models::Document;
use crate::utils::text::utf16_slice;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Invalid splitter pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Default)]
pub struct DocumentSplitter {
    query: Option<AnnotationQuery>,
    keep_metadata: bool,
}

impl DocumentSplitter {
    pub fn from_config(conf: &Configuration) -> Result<Self, SplitError> {
        let query = match conf.get_non_empty(SPLITTER_TYPE) {
            Some(kind) => Some(AnnotationQuery::new(
                kind,
                conf.get_non_empty(SPLITTER_FEATURE),
                conf.get(SPLITTER_VALUE),
            )?),
            None => None,
        };
        Ok(Self {
            query,
            keep_metadata: conf.get_bool(SPLITTER_KEEP_METADATA, false)?,
        })
    }

    /// Whether a split type is configured.
    pub fn is_splitting(&self) -> bool {
        self.query.is_some()
    }

    /// Split `doc`. Without a configured type, or when nothing matches, the
    /// result is the input document with its annotations sorted.
    pub fn split(&self, mut doc: Document) -> Vec<Document> {
        annotations::sort(&mut doc.annotations);

        let Some(query) = &self.query else {
            return vec![doc];
        };
        let Some(text) = doc.text.as_deref() else {
            return vec![doc];
        };

        let spans = query.select(&doc.annotations);
        let mut parts = Vec::with_capacity(spans.len());

        for span in spans {
            let Some(covered) = utf16_slice(text, span.start, span.end) else {
                tracing::debug!(
                    "Skipping split span {}-{} outside the text of {}",
                    span.start,
                    span.end,
                    doc.url
                );
                continue;
            };

            let mut part = Document::new(format!("{}#{}-{}", doc.url, span.start, span.end));
            part.content_type = doc.content_type.clone();
            part.text = Some(covered.to_string());
            if self.keep_metadata {
                part.metadata = doc.metadata.clone();
            }
            part.annotations = annotations::contained(&doc.annotations, span.start, span.end)
                .into_iter()
                .map(|a| {
                    let mut shifted = a.clone();
                    shifted.start -= span.start;
                    shifted.end -= span.start;
                    shifted
                })
                .collect();
            parts.push(part);
        }

        if parts.is_empty() {
            return vec![doc];
        }
        parts
    }
}

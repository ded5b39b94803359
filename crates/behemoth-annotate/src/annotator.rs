//! Annotator trait, the shared abstraction for annotation engines.

use async_trait::async_trait;

use behemoth::Document;

use super::types::{AnnotationError, AnnotationOutcome};

/// An engine adapter that can annotate documents.
///
/// Implementations hand the document text (or raw content) to an engine and
/// merge what comes back into the document. On error the document must be
/// left as it was, so that a stage can pass it on unmodified.
#[async_trait]
pub trait Annotator: Send + Sync {
    /// Human-readable name for progress output and logs.
    fn name(&self) -> &str;

    /// Annotate a single document.
    async fn annotate(&self, doc: &mut Document) -> Result<AnnotationOutcome, AnnotationError>;
}

/// Text of a document, or `Err(Skipped)` when it has none.
pub fn document_text(doc: &Document) -> Result<&str, AnnotationOutcome> {
    match doc.text.as_deref() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(AnnotationOutcome::Skipped),
    }
}

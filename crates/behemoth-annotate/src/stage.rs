//! Stage implementation for annotation.

use std::sync::Arc;

use async_trait::async_trait;

use behemoth::annotations;
use behemoth::stage::{DocumentStage, RecordFailure, StageOutput};
use behemoth::Document;

use super::annotator::Annotator;
use super::types::AnnotationOutcome;

/// Annotation stage, running a single `Annotator` against every document.
///
/// Annotations are sorted by the total order after each merge so the record
/// written downstream is deterministic whatever order the engine reported in.
pub struct AnnotatorStage {
    annotator: Arc<dyn Annotator>,
}

impl AnnotatorStage {
    pub fn new(annotator: Arc<dyn Annotator>) -> Self {
        Self { annotator }
    }
}

#[async_trait]
impl DocumentStage for AnnotatorStage {
    fn name(&self) -> &str {
        self.annotator.name()
    }

    async fn process(&self, mut doc: Document) -> Result<StageOutput, RecordFailure> {
        match self.annotator.annotate(&mut doc).await {
            Ok(AnnotationOutcome::Annotated(added)) => {
                tracing::debug!("{}: {} annotation(s) on {}", self.name(), added, doc.url);
                annotations::sort(&mut doc.annotations);
                Ok(StageOutput::Emit(vec![doc]))
            }
            Ok(AnnotationOutcome::NoResult) => Ok(StageOutput::Emit(vec![doc])),
            Ok(AnnotationOutcome::Skipped) => Ok(StageOutput::Skipped(doc)),
            Err(e) => Err(RecordFailure::new(e.kind(), &e, doc)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnnotationError;
    use behemoth::Annotation;

    struct Reversed;

    #[async_trait]
    impl Annotator for Reversed {
        fn name(&self) -> &str {
            "reversed"
        }

        async fn annotate(&self, doc: &mut Document) -> Result<AnnotationOutcome, AnnotationError> {
            match doc.text.as_deref() {
                None => Ok(AnnotationOutcome::Skipped),
                Some("fail") => Err(AnnotationError::Failed("engine crashed".into())),
                Some(_) => {
                    doc.annotations.push(Annotation::new("Token", 5, 9));
                    doc.annotations.push(Annotation::new("Token", 0, 4));
                    Ok(AnnotationOutcome::Annotated(2))
                }
            }
        }
    }

    #[tokio::test]
    async fn test_annotations_are_sorted_after_merge() {
        let stage = AnnotatorStage::new(Arc::new(Reversed));
        let mut doc = Document::new("u");
        doc.text = Some("some text".into());

        let StageOutput::Emit(docs) = stage.process(doc).await.unwrap() else {
            panic!("expected emitted documents");
        };
        let starts: Vec<i64> = docs[0].annotations.iter().map(|a| a.start).collect();
        assert_eq!(starts, vec![0, 5]);
    }

    #[tokio::test]
    async fn test_skip_and_failure() {
        let stage = AnnotatorStage::new(Arc::new(Reversed));
        assert!(matches!(
            stage.process(Document::new("u")).await,
            Ok(StageOutput::Skipped(_))
        ));

        let mut doc = Document::new("u");
        doc.text = Some("fail".into());
        let failure = stage.process(doc.clone()).await.unwrap_err();
        assert_eq!(failure.kind, "Failed");
        assert_eq!(*failure.document, doc);
    }
}

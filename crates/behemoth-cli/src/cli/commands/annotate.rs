//! Annotate command: run one annotator as a stage.

use std::path::Path;
use std::sync::Arc;

use behemoth::Configuration;
use behemoth_annotate::{Annotator, AnnotatorStage, LanguageIdentifier, PatternAnnotator, Tokenizer};

use super::helpers::run_stage;

/// Annotators available from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AnnotatorKind {
    /// Token and Sentence annotations
    Tokens,
    /// Regex entity rules (annotate.pattern.<Type>)
    Patterns,
    /// Language code into metadata
    Language,
}

impl AnnotatorKind {
    fn build(self, conf: &Configuration) -> anyhow::Result<Arc<dyn Annotator>> {
        Ok(match self {
            Self::Tokens => Arc::new(Tokenizer::new()?),
            Self::Patterns => Arc::new(PatternAnnotator::from_config(conf)?),
            Self::Language => Arc::new(LanguageIdentifier::from_config(conf)?),
        })
    }
}

pub async fn cmd_annotate(
    conf: &Configuration,
    kind: AnnotatorKind,
    input: &Path,
    output: &Path,
) -> anyhow::Result<()> {
    let annotator = kind.build(conf)?;
    tracing::debug!("Running annotator {}", annotator.name());
    run_stage(conf, AnnotatorStage::new(annotator), input, output).await?;
    Ok(())
}

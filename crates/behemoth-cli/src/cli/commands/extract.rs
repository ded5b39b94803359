//! Extract command: text, metadata and markup annotations from raw content.

use std::path::Path;
use std::sync::Arc;

use behemoth::Configuration;
use behemoth_annotate::{AnnotatorStage, TextExtractor};

use super::helpers::run_stage;

pub async fn cmd_extract(conf: &Configuration, input: &Path, output: &Path) -> anyhow::Result<()> {
    let extractor = TextExtractor::from_config(conf)?;
    run_stage(conf, AnnotatorStage::new(Arc::new(extractor)), input, output).await?;
    Ok(())
}

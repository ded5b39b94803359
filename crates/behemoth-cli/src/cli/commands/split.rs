//! Split command: one document per matching annotation.

use std::path::Path;

use console::style;

use behemoth::{Configuration, DocumentSplitter};

use super::helpers::run_stage;

pub async fn cmd_split(conf: &Configuration, input: &Path, output: &Path) -> anyhow::Result<()> {
    let splitter = DocumentSplitter::from_config(conf)?;
    if !splitter.is_splitting() {
        println!(
            "{} document.splitter.type is not set, documents are only re-sorted",
            style("!").yellow()
        );
    }
    run_stage(conf, splitter, input, output).await?;
    Ok(())
}

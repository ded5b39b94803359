//! Filter command: apply the document filter without any other processing.

use std::path::Path;

use anyhow::bail;

use behemoth::filter::DocumentFilter;
use behemoth::stage::PassThrough;
use behemoth::Configuration;

use super::helpers::run_stage;

pub async fn cmd_filter(conf: &Configuration, input: &Path, output: &Path) -> anyhow::Result<()> {
    if !DocumentFilter::is_required(conf)? {
        bail!("No document.filter.* settings configured; nothing to filter on");
    }
    run_stage(conf, PassThrough, input, output).await?;
    Ok(())
}

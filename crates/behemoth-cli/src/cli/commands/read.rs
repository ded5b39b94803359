//! Read command: dump a corpus to stdout.

use std::io::Write;
use std::path::Path;

use anyhow::Context;

use behemoth::{CorpusReader, DisplayOptions};

pub fn cmd_read(input: &Path, options: DisplayOptions, json: bool) -> anyhow::Result<()> {
    let reader = CorpusReader::open(input)
        .with_context(|| format!("Failed to open corpus {}", input.display()))?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut count = 0u64;
    for doc in reader {
        let doc = doc.with_context(|| {
            format!("Corrupt corpus {} after {} documents", input.display(), count)
        })?;
        if json {
            writeln!(out, "{}", serde_json::to_string(&doc)?)?;
        } else {
            writeln!(out, "{}", doc.display(options))?;
        }
        count += 1;
    }
    tracing::info!("Read {} documents from {}", count, input.display());
    Ok(())
}

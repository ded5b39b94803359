//! Export command: JSON lines with mapped annotation fields.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use console::style;

use behemoth::{Configuration, CorpusReader, FieldMapping};

use crate::cli::progress::spinner;

pub fn cmd_export(
    conf: &Configuration,
    fields: &[String],
    input: &Path,
    output: &Path,
) -> anyhow::Result<()> {
    let mut mapping = FieldMapping::from_config(conf)?;
    mapping.merge(FieldMapping::parse(fields)?);
    if mapping.is_empty() {
        println!(
            "{} No field mappings given, exporting url, text and metadata only",
            style("!").yellow()
        );
    }

    let reader = CorpusReader::open(input)
        .with_context(|| format!("Failed to open corpus {}", input.display()))?;
    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut out = BufWriter::new(file);

    let pb = spinner(format!("Exporting {}", input.display()));
    let mut exported = 0u64;
    for doc in reader {
        let doc = doc?;
        writeln!(out, "{}", mapping.export_line(&doc)?)?;
        exported += 1;
        if exported % 100 == 0 {
            pb.set_message(format!("Exporting {}: {} documents", input.display(), exported));
        }
    }
    pb.finish_and_clear();
    out.flush()?;

    println!(
        "{} Exported {} documents ({} field mappings) to {}",
        style("✓").green(),
        style(exported).green(),
        mapping.len(),
        output.display()
    );
    Ok(())
}

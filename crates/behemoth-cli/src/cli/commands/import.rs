//! Import commands: build a corpus from a directory or WARC archives.

use std::path::{Path, PathBuf};

use anyhow::Context;
use console::style;
use regex::Regex;

use behemoth::CorpusWriter;
use behemoth_import::{FileSystemSource, ImportConfig, ImportSource, ImportStats, WarcSource};

use super::helpers::print_corpus_size;
use crate::cli::progress::spinner;

#[derive(clap::Args)]
pub struct ImportArgs {
    /// Output corpus
    #[arg(short, long)]
    output: PathBuf,

    /// Maximum number of documents to import (0 = unlimited)
    #[arg(short, long, default_value = "0")]
    limit: usize,

    /// Only import URLs matching this regex
    #[arg(long)]
    filter: Option<String>,
}

impl ImportArgs {
    fn import_config(&self) -> anyhow::Result<ImportConfig> {
        let url_filter = self
            .filter
            .as_deref()
            .map(Regex::new)
            .transpose()
            .context("Invalid --filter regex")?;
        Ok(ImportConfig {
            limit: self.limit,
            url_filter,
        })
    }
}

/// Import every file under `dir`.
pub async fn cmd_import_fs(dir: &Path, args: &ImportArgs) -> anyhow::Result<()> {
    let sources: Vec<Box<dyn ImportSource>> = vec![Box::new(FileSystemSource::new(dir))];
    import_all(sources, args).await
}

/// Import response records from WARC archives.
pub async fn cmd_import_warc(files: &[PathBuf], args: &ImportArgs) -> anyhow::Result<()> {
    let sources: Vec<Box<dyn ImportSource>> = files
        .iter()
        .map(|f| Box::new(WarcSource::new(f)) as Box<dyn ImportSource>)
        .collect();
    import_all(sources, args).await
}

async fn import_all(sources: Vec<Box<dyn ImportSource>>, args: &ImportArgs) -> anyhow::Result<()> {
    let mut config = args.import_config()?;
    let mut writer = CorpusWriter::create(&args.output)
        .with_context(|| format!("Failed to create corpus {}", args.output.display()))?;
    let mut totals = ImportStats::default();

    for mut source in sources {
        if args.limit > 0 {
            if totals.imported >= args.limit {
                break;
            }
            config.limit = args.limit - totals.imported;
        }

        println!(
            "{} Importing {} ({})",
            style("→").cyan(),
            source.source_path().display(),
            source.display_name()
        );
        let pb = spinner(format!("Reading {}", source.source_path().display()));
        let result = source.run_import(&config, &mut writer).await;
        pb.finish_and_clear();

        match result {
            Ok(stats) => {
                println!(
                    "  {} imported, {} skipped, {} filtered",
                    style(stats.imported).green(),
                    style(stats.skipped).yellow(),
                    style(stats.filtered).dim()
                );
                totals.merge(&stats);
            }
            Err(e) => {
                println!("{} {}", style("✗").red(), e);
                totals.errors += 1;
            }
        }
    }

    writer
        .finish()
        .with_context(|| format!("Failed to write corpus {}", args.output.display()))?;
    tracing::info!(
        "Imported {} documents into {}",
        totals.imported,
        args.output.display()
    );

    println!("\n{} Import complete:", style("✓").green());
    println!("  Records scanned:    {}", style(totals.scanned).dim());
    println!("  Documents imported: {}", style(totals.imported).green());
    println!("  Documents skipped:  {}", style(totals.skipped).yellow());
    println!("  Records filtered:   {}", style(totals.filtered).dim());
    if totals.errors > 0 {
        println!("  Errors:             {}", style(totals.errors).red());
    }
    print_corpus_size(&args.output, totals.imported as u64);
    Ok(())
}

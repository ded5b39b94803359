//! Shared plumbing for stage commands.

use std::path::Path;

use anyhow::Context;
use console::style;

use behemoth::utils::CorpusSize;
use behemoth::{Configuration, CorpusReader, CorpusWriter, DocumentStage, StageCounters, StageRunner};

use crate::cli::progress::StageProgress;

/// Configuration from the optional TOML file, then `-D` overrides on top.
pub fn load_configuration(path: Option<&Path>, defines: &[String]) -> anyhow::Result<Configuration> {
    let mut conf = match path {
        Some(path) => Configuration::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => Configuration::new(),
    };
    conf.apply_overrides(defines)?;
    tracing::debug!("Loaded {} configuration entries", conf.len());
    Ok(conf)
}

/// Run `stage` from `input` to `output` with the configured filter and
/// post-processing, showing a spinner, and print the counters.
pub async fn run_stage<S: DocumentStage>(
    conf: &Configuration,
    stage: S,
    input: &Path,
    output: &Path,
) -> anyhow::Result<StageCounters> {
    let runner = StageRunner::from_config(conf, stage)?;
    let reader = CorpusReader::open(input)
        .with_context(|| format!("Failed to open corpus {}", input.display()))?;
    let mut writer = CorpusWriter::create(output)
        .with_context(|| format!("Failed to create corpus {}", output.display()))?;

    println!(
        "{} {}: {} → {}",
        style("→").cyan(),
        runner.stage().name(),
        input.display(),
        output.display()
    );

    let progress = StageProgress::start();
    let result = runner.run(reader, &mut writer, Some(progress.sender())).await;
    progress.finish().await;
    let counters = result?;

    writer
        .finish()
        .with_context(|| format!("Failed to write corpus {}", output.display()))?;

    print_counters(&counters);
    print_corpus_size(output, counters.written);
    Ok(counters)
}

pub fn print_counters(counters: &StageCounters) {
    println!("\n{} Stage complete:", style("✓").green());
    println!("  Documents read:     {}", style(counters.read).dim());
    println!("  Documents written:  {}", style(counters.written).green());
    println!("  Filtered out:       {}", style(counters.filtered).dim());
    println!("  Skipped:            {}", style(counters.skipped).yellow());
    if counters.failed > 0 {
        println!("  Failed:             {}", style(counters.failed).red());
        for (kind, count) in &counters.errors {
            println!("    {:<18}{}", kind, style(count).red());
        }
    }
}

pub fn print_corpus_size(path: &Path, records: u64) {
    if let Ok(meta) = std::fs::metadata(path) {
        let size = CorpusSize {
            bytes: meta.len(),
            records,
        };
        println!("  Corpus size:        {}", style(size).dim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defines_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("behemoth.toml");
        std::fs::write(
            &path,
            "[document.splitter]\ntype = \"Sentence\"\nkeep.metadata = \"false\"\n",
        )
        .unwrap();

        let conf = load_configuration(
            Some(&path),
            &["document.splitter.keep.metadata=true".to_string()],
        )
        .unwrap();
        assert_eq!(conf.get("document.splitter.type"), Some("Sentence"));
        assert_eq!(conf.get("document.splitter.keep.metadata"), Some("true"));
    }

    #[test]
    fn test_bad_define() {
        assert!(load_configuration(None, &["no-equals-sign".to_string()]).is_err());
    }
}

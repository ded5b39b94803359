//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod annotate;
mod export;
mod extract;
mod filter;
mod helpers;
mod import;
mod read;
mod split;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "behemoth")]
#[command(about = "Document-processing pipeline over binary corpus files")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML, flattened into dotted keys)
    #[arg(long, global = true, env = "BEHEMOTH_CONF")]
    conf: Option<PathBuf>,

    /// Set a configuration value (key=value), may be repeated
    #[arg(short = 'D', value_name = "KEY=VALUE", global = true)]
    define: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a corpus from an external collection
    Import {
        #[command(subcommand)]
        source: ImportCommands,
    },

    /// Print the documents of a corpus
    Read {
        /// Corpus file
        input: PathBuf,

        /// Show raw content
        #[arg(short, long)]
        content: bool,

        /// Show extracted text
        #[arg(short, long)]
        text: bool,

        /// Show annotations
        #[arg(short, long)]
        annotations: bool,

        /// Show metadata
        #[arg(short, long)]
        metadata: bool,

        /// One JSON object per document instead of the text dump
        #[arg(long)]
        json: bool,
    },

    /// Keep only documents accepted by the document.filter.* settings
    Filter {
        /// Input corpus
        input: PathBuf,

        /// Output corpus
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract text, metadata and markup annotations from raw content
    Extract {
        /// Input corpus
        input: PathBuf,

        /// Output corpus
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run an annotator over every document
    Annotate {
        /// Input corpus
        input: PathBuf,

        /// Output corpus
        #[arg(short, long)]
        output: PathBuf,

        /// Annotator to run
        #[arg(long = "with", value_enum)]
        annotator: annotate::AnnotatorKind,
    },

    /// Split documents along annotations (document.splitter.* settings)
    Split {
        /// Input corpus
        input: PathBuf,

        /// Output corpus
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Export documents as JSON lines with mapped annotation fields
    Export {
        /// Input corpus
        input: PathBuf,

        /// Output file (JSON lines)
        #[arg(short, long)]
        output: PathBuf,

        /// Field mapping (Type.feature=field, feature * for covered text)
        #[arg(short, long = "field", value_name = "MAPPING")]
        fields: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ImportCommands {
    /// Import every file under a directory
    Fs {
        /// Root directory
        dir: PathBuf,

        #[command(flatten)]
        options: import::ImportArgs,
    },

    /// Import response records from WARC archives (.warc or .warc.gz)
    Warc {
        /// WARC files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        options: import::ImportArgs,
    },
}

/// Check if verbose flag is set (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let conf = helpers::load_configuration(cli.conf.as_deref(), &cli.define)?;

    match cli.command {
        Commands::Import { source } => match source {
            ImportCommands::Fs { dir, options } => import::cmd_import_fs(&dir, &options).await,
            ImportCommands::Warc { files, options } => {
                import::cmd_import_warc(&files, &options).await
            }
        },
        Commands::Read {
            input,
            content,
            text,
            annotations,
            metadata,
            json,
        } => read::cmd_read(
            &input,
            behemoth::DisplayOptions {
                content,
                text,
                annotations,
                metadata,
            },
            json,
        ),
        Commands::Filter { input, output } => filter::cmd_filter(&conf, &input, &output).await,
        Commands::Extract { input, output } => extract::cmd_extract(&conf, &input, &output).await,
        Commands::Annotate {
            input,
            output,
            annotator,
        } => annotate::cmd_annotate(&conf, annotator, &input, &output).await,
        Commands::Split { input, output } => split::cmd_split(&conf, &input, &output).await,
        Commands::Export {
            input,
            output,
            fields,
        } => export::cmd_export(&conf, &fields, &input, &output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_defines() {
        let cli = Cli::try_parse_from([
            "behemoth",
            "split",
            "in.bin",
            "-o",
            "out.bin",
            "-D",
            "document.splitter.type=Sentence",
            "-D",
            "stage.drop.content=true",
        ])
        .unwrap();
        assert_eq!(cli.define.len(), 2);
        assert!(matches!(cli.command, Commands::Split { .. }));
    }

    #[test]
    fn test_read_flags() {
        let cli = Cli::try_parse_from(["behemoth", "read", "c.bin", "-t", "-a"]).unwrap();
        match cli.command {
            Commands::Read {
                text,
                annotations,
                content,
                json,
                ..
            } => {
                assert!(text && annotations);
                assert!(!content && !json);
            }
            _ => panic!("expected read"),
        }
    }

    #[test]
    fn test_annotate_requires_annotator() {
        assert!(Cli::try_parse_from(["behemoth", "annotate", "in", "-o", "out"]).is_err());
        let cli =
            Cli::try_parse_from(["behemoth", "annotate", "in", "-o", "out", "--with", "tokens"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Annotate {
                annotator: annotate::AnnotatorKind::Tokens,
                ..
            }
        ));
    }
}

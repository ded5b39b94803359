//! Producers that turn external collections into Behemoth documents.
//!
//! Each source walks its input (a directory tree, a WARC archive) and hands
//! every document it builds to a `DocumentSink`, usually a corpus file that
//! the first pipeline stage reads.

pub mod sources;

pub use sources::{FileSystemSource, WarcSource};

use std::io::Write;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

use behemoth::{CodecError, CorpusWriter, Document};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to open WARC file {}: {message}", path.display())]
    Warc { path: PathBuf, message: String },

    #[error("Failed to write document: {0}")]
    Codec(#[from] CodecError),
}

/// Where imported documents go.
pub trait DocumentSink: Send {
    fn accept(&mut self, doc: Document) -> Result<(), CodecError>;
}

impl<W: Write + Send> DocumentSink for CorpusWriter<W> {
    fn accept(&mut self, doc: Document) -> Result<(), CodecError> {
        self.write(&doc)
    }
}

impl DocumentSink for Vec<Document> {
    fn accept(&mut self, doc: Document) -> Result<(), CodecError> {
        self.push(doc);
        Ok(())
    }
}

/// Options shared by all sources.
#[derive(Debug, Clone, Default)]
pub struct ImportConfig {
    /// Stop after this many imported documents (0 = unlimited).
    pub limit: usize,
    /// Only import documents whose URL matches.
    pub url_filter: Option<Regex>,
}

impl ImportConfig {
    fn limit_reached(&self, stats: &ImportStats) -> bool {
        self.limit > 0 && stats.imported >= self.limit
    }

    fn accepts_url(&self, url: &str) -> bool {
        self.url_filter.as_ref().map_or(true, |re| re.is_match(url))
    }
}

/// Statistics collected during import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Total items scanned.
    pub scanned: usize,
    /// Documents handed to the sink.
    pub imported: usize,
    /// Items that are not documents (directories, request records, error
    /// responses, empty bodies).
    pub skipped: usize,
    /// Filtered out by URL regex.
    pub filtered: usize,
    /// Unreadable items.
    pub errors: usize,
}

impl ImportStats {
    /// Merge stats from another instance.
    pub fn merge(&mut self, other: &ImportStats) {
        self.scanned += other.scanned;
        self.imported += other.imported;
        self.skipped += other.skipped;
        self.filtered += other.filtered;
        self.errors += other.errors;
    }
}

/// Trait for import sources.
#[async_trait::async_trait]
pub trait ImportSource: Send + Sync {
    /// Unique identifier for this import format.
    fn format_id(&self) -> &'static str;

    /// Human-readable name for display.
    fn display_name(&self) -> &str;

    /// Path of the file or directory being imported.
    fn source_path(&self) -> &Path;

    /// Build documents and hand them to `sink`.
    async fn run_import(
        &mut self,
        config: &ImportConfig,
        sink: &mut dyn DocumentSink,
    ) -> Result<ImportStats, ImportError>;
}

//! File-system import source.
//!
//! Walks a directory tree and turns every regular file into a document with
//! a `file://` URL, the raw bytes as content, a sniffed content type and
//! `digest` (SHA-256), `size` and `modified` metadata.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use url::Url;

use behemoth::utils::detect_mime_type;
use behemoth::Document;

use crate::{DocumentSink, ImportConfig, ImportError, ImportSource, ImportStats};

pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Regular files under `dir`, in path order.
    fn collect_files(dir: &Path, files: &mut Vec<PathBuf>, stats: &mut ImportStats) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot list {}: {}", dir.display(), e);
                stats.errors += 1;
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
        paths.sort();

        for path in paths {
            if path.is_dir() {
                Self::collect_files(&path, files, stats);
            } else if path.is_file() {
                files.push(path);
            } else {
                stats.scanned += 1;
                stats.skipped += 1;
            }
        }
    }

    async fn build_document(path: &Path) -> Result<Option<Document>, ImportError> {
        let io_err = |source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        };
        let content = tokio::fs::read(path).await.map_err(io_err)?;
        if content.is_empty() {
            return Ok(None);
        }
        let modified = tokio::fs::metadata(path)
            .await
            .and_then(|m| m.modified())
            .ok()
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339());

        let url = Url::from_file_path(path)
            .map(String::from)
            .unwrap_or_else(|_| format!("file://{}", path.display()));

        let mut doc = Document::new(url);
        doc.content_type = detect_mime_type(&content, &doc.url);

        let metadata = doc.metadata_mut();
        metadata.insert("digest".to_string(), hex::encode(Sha256::digest(&content)));
        metadata.insert("size".to_string(), content.len().to_string());
        if let Some(modified) = modified {
            metadata.insert("modified".to_string(), modified);
        }

        doc.content = Some(content);
        Ok(Some(doc))
    }
}

#[async_trait::async_trait]
impl ImportSource for FileSystemSource {
    fn format_id(&self) -> &'static str {
        "fs"
    }

    fn display_name(&self) -> &str {
        "File system"
    }

    fn source_path(&self) -> &Path {
        &self.root
    }

    async fn run_import(
        &mut self,
        config: &ImportConfig,
        sink: &mut dyn DocumentSink,
    ) -> Result<ImportStats, ImportError> {
        if !self.root.is_dir() {
            return Err(ImportError::NotFound(self.root.clone()));
        }
        let root = std::fs::canonicalize(&self.root).map_err(|source| ImportError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut stats = ImportStats::default();
        let mut files = Vec::new();
        Self::collect_files(&root, &mut files, &mut stats);

        for path in files {
            if config.limit_reached(&stats) {
                break;
            }
            stats.scanned += 1;

            let doc = match Self::build_document(&path).await {
                Ok(Some(doc)) => doc,
                Ok(None) => {
                    tracing::debug!("Skipping empty file {}", path.display());
                    stats.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    stats.errors += 1;
                    continue;
                }
            };

            if !config.accepts_url(&doc.url) {
                stats.filtered += 1;
                continue;
            }

            sink.accept(doc)?;
            stats.imported += 1;
        }

        Ok(stats)
    }
}

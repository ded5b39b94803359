//! Stage abstraction and the runner that drives a stage over a corpus.
//!
//! Every pipeline step follows the same loop: read a record, filter it,
//! process it, post-process the outputs, write them, count what happened.
//! Stages only implement `process`; the runner owns the rest.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Write};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::codec::CodecError;
use crate::config::keys::{STAGE_CLEAR_ANNOTATIONS, STAGE_CLEAR_METADATA, STAGE_DROP_CONTENT};
use crate::config::{ConfigError, Configuration};
use crate::corpus::{CorpusReader, CorpusWriter};
use crate::filter::{DocumentFilter, FilterError};
use crate::models::Document;
use crate::splitter::DocumentSplitter;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("Corpus error: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// A stage failed on one record. The record travels back with the error so
/// the runner can pass it on unmodified.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct RecordFailure {
    pub kind: String,
    pub message: String,
    pub document: Box<Document>,
}

impl RecordFailure {
    pub fn new(kind: impl Into<String>, error: impl fmt::Display, document: Document) -> Self {
        Self {
            kind: kind.into(),
            message: error.to_string(),
            document: Box::new(document),
        }
    }
}

/// What a stage did with one record.
#[derive(Debug)]
pub enum StageOutput {
    /// Zero or more documents to write downstream.
    Emit(Vec<Document>),
    /// The stage had nothing to do; the document goes on as is.
    Skipped(Document),
}

#[async_trait]
pub trait DocumentStage: Send + Sync {
    /// Human-readable name for progress output.
    fn name(&self) -> &str;

    async fn process(&self, doc: Document) -> Result<StageOutput, RecordFailure>;
}

/// Progress events emitted while a stage runs.
#[derive(Debug, Clone)]
pub enum StageEvent {
    Started {
        stage: String,
    },
    ItemCompleted {
        stage: String,
        url: String,
        emitted: usize,
    },
    ItemSkipped {
        stage: String,
        url: String,
    },
    ItemFiltered {
        url: String,
    },
    ItemFailed {
        stage: String,
        url: String,
        error: String,
    },
    Completed {
        stage: String,
        counters: StageCounters,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageCounters {
    pub read: u64,
    pub written: u64,
    pub filtered: u64,
    pub failed: u64,
    pub skipped: u64,
    /// Failures by error kind.
    pub errors: BTreeMap<String, u64>,
}

impl StageCounters {
    fn record_failure(&mut self, kind: &str) {
        self.failed += 1;
        *self.errors.entry(kind.to_string()).or_insert(0) += 1;
    }
}

impl fmt::Display for StageCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read {}, written {}, filtered {}, skipped {}, failed {}",
            self.read, self.written, self.filtered, self.skipped, self.failed
        )
    }
}

/// Cleanup applied to every document a stage hands on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostProcess {
    pub clear_annotations: bool,
    pub clear_metadata: bool,
    pub drop_content: bool,
}

impl PostProcess {
    pub fn from_config(conf: &Configuration) -> Result<Self, ConfigError> {
        Ok(Self {
            clear_annotations: conf.get_bool(STAGE_CLEAR_ANNOTATIONS, false)?,
            clear_metadata: conf.get_bool(STAGE_CLEAR_METADATA, false)?,
            drop_content: conf.get_bool(STAGE_DROP_CONTENT, false)?,
        })
    }

    pub fn apply(&self, doc: &mut Document) {
        if self.clear_annotations {
            doc.clear_annotations();
        }
        if self.clear_metadata {
            doc.clear_metadata();
        }
        if self.drop_content {
            doc.content = None;
        }
    }
}

pub struct StageRunner<S> {
    stage: S,
    filter: Option<DocumentFilter>,
    post: PostProcess,
}

impl<S: DocumentStage> StageRunner<S> {
    pub fn new(stage: S) -> Self {
        Self {
            stage,
            filter: None,
            post: PostProcess::default(),
        }
    }

    /// Runner with the filter and post-processing the configuration asks for.
    pub fn from_config(conf: &Configuration, stage: S) -> Result<Self, StageError> {
        let filter = DocumentFilter::from_config(conf)?;
        Ok(Self {
            stage,
            filter: filter.is_active().then_some(filter),
            post: PostProcess::from_config(conf)?,
        })
    }

    pub fn with_filter(mut self, filter: DocumentFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_post_process(mut self, post: PostProcess) -> Self {
        self.post = post;
        self
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    /// Drive the stage over every record of `input`, writing results to
    /// `output`. A corpus that cannot be decoded aborts the run; failures
    /// inside the stage are counted and the record is passed on as the stage
    /// received it. Post-processing applies to every record written.
    pub async fn run<R: Read, W: Write>(
        &self,
        input: CorpusReader<R>,
        output: &mut CorpusWriter<W>,
        event_tx: Option<&mpsc::Sender<StageEvent>>,
    ) -> Result<StageCounters, StageError> {
        let stage_name = self.stage.name().to_string();
        let mut counters = StageCounters::default();

        emit(
            event_tx,
            StageEvent::Started {
                stage: stage_name.clone(),
            },
        )
        .await;

        for doc in input {
            let doc = doc?;
            counters.read += 1;

            if let Some(filter) = &self.filter {
                if !filter.keep(&doc) {
                    tracing::debug!("Filtered out {}", doc.url);
                    counters.filtered += 1;
                    emit(event_tx, StageEvent::ItemFiltered { url: doc.url }).await;
                    continue;
                }
            }

            let url = doc.url.clone();
            match self.stage.process(doc).await {
                Ok(StageOutput::Emit(docs)) => {
                    let emitted = docs.len();
                    for mut out in docs {
                        self.post.apply(&mut out);
                        output.write(&out)?;
                        counters.written += 1;
                    }
                    emit(
                        event_tx,
                        StageEvent::ItemCompleted {
                            stage: stage_name.clone(),
                            url,
                            emitted,
                        },
                    )
                    .await;
                }
                Ok(StageOutput::Skipped(mut doc)) => {
                    counters.skipped += 1;
                    self.post.apply(&mut doc);
                    output.write(&doc)?;
                    counters.written += 1;
                    emit(
                        event_tx,
                        StageEvent::ItemSkipped {
                            stage: stage_name.clone(),
                            url,
                        },
                    )
                    .await;
                }
                Err(failure) => {
                    tracing::warn!("{} failed on {}: {}", stage_name, url, failure);
                    counters.record_failure(&failure.kind);
                    let error = failure.to_string();
                    let mut doc = *failure.document;
                    self.post.apply(&mut doc);
                    output.write(&doc)?;
                    counters.written += 1;
                    emit(
                        event_tx,
                        StageEvent::ItemFailed {
                            stage: stage_name.clone(),
                            url,
                            error,
                        },
                    )
                    .await;
                }
            }
        }

        tracing::info!("{}: {}", stage_name, counters);
        emit(
            event_tx,
            StageEvent::Completed {
                stage: stage_name,
                counters: counters.clone(),
            },
        )
        .await;

        Ok(counters)
    }
}

async fn emit(event_tx: Option<&mpsc::Sender<StageEvent>>, event: StageEvent) {
    if let Some(tx) = event_tx {
        let _ = tx.send(event).await;
    }
}

/// Stage that hands every document on unchanged. Combined with a filter it
/// is the `filter` step.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

#[async_trait]
impl DocumentStage for PassThrough {
    fn name(&self) -> &str {
        "pass-through"
    }

    async fn process(&self, doc: Document) -> Result<StageOutput, RecordFailure> {
        Ok(StageOutput::Emit(vec![doc]))
    }
}

#[async_trait]
impl DocumentStage for DocumentSplitter {
    fn name(&self) -> &str {
        "splitter"
    }

    async fn process(&self, doc: Document) -> Result<StageOutput, RecordFailure> {
        Ok(StageOutput::Emit(self.split(doc)))
    }
}

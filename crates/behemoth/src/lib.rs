//! behemoth - document processing pipelines over a compact binary record.
//!
//! Core library shared by the workspace crates: the document record and its
//! annotations, the versioned binary codec, the annotation algebra and the
//! filter/splitter steps a stage can apply to every record it sees.

pub mod annotations;
pub mod codec;
pub mod config;
pub mod corpus;
pub mod export;
pub mod filter;
pub mod models;
pub mod splitter;
pub mod stage;
pub mod utils;

pub use codec::CodecError;
pub use config::Configuration;
pub use corpus::{CorpusReader, CorpusWriter};
pub use export::FieldMapping;
pub use filter::DocumentFilter;
pub use models::{Annotation, DisplayOptions, Document};
pub use splitter::DocumentSplitter;
pub use stage::{DocumentStage, RecordFailure, StageCounters, StageEvent, StageOutput, StageRunner};

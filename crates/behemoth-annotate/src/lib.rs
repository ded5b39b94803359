//! Annotator adapters for Behemoth.
//!
//! Each adapter wraps an analysis engine behind the `Annotator` trait and
//! converts what the engine reports into document text, metadata and
//! annotations. `AnnotatorStage` plugs any of them into a `StageRunner`.

pub mod annotator;
pub mod engine;
pub mod extract;
pub mod language;
pub mod pattern;
pub mod stage;
pub mod tokenizer;
pub mod types;

pub use annotator::Annotator;
pub use engine::EngineGuard;
pub use extract::TextExtractor;
pub use language::LanguageIdentifier;
pub use pattern::PatternAnnotator;
pub use stage::AnnotatorStage;
pub use tokenizer::Tokenizer;
pub use types::{AnnotationError, AnnotationOutcome};

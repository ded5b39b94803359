//! Types shared across annotators.

use behemoth::config::ConfigError;
use thiserror::Error;

/// Result of annotating a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationOutcome {
    /// The document was changed; the count is the number of annotations added.
    Annotated(usize),
    /// The engine ran but found nothing to add.
    NoResult,
    /// The document was not processed (no text, unsupported content, ...).
    Skipped,
}

/// Errors from annotators.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Annotation failed: {0}")]
    Failed(String),

    #[error("Engine {engine} failed: {message}")]
    Engine { engine: String, message: String },

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AnnotationError {
    /// Short name used to count failures by kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Failed(_) => "Failed",
            Self::Engine { .. } => "Engine",
            Self::Pattern(_) => "Pattern",
            Self::Config(_) => "Config",
        }
    }
}

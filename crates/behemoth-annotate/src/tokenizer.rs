//! Rule-based tokenizer and sentence splitter.
//!
//! Emits `Token` annotations carrying a `kind` feature (`word`, `number` or
//! `punct`) and `Sentence` annotations spanning from the first token of a
//! sentence to its terminal punctuation, closing quotes and brackets included.
//! A line break also ends a sentence.

use async_trait::async_trait;
use regex::Regex;

use behemoth::utils::Utf16Cursor;
use behemoth::{Annotation, Document};

use super::annotator::{document_text, Annotator};
use super::engine::EngineGuard;
use super::types::{AnnotationError, AnnotationOutcome};

pub const TOKEN_TYPE: &str = "Token";
pub const SENTENCE_TYPE: &str = "Sentence";

const TOKEN_PATTERN: &str = r"\p{L}[\p{L}\p{M}\p{N}'’-]*|\p{N}+(?:[.,]\p{N}+)*|[^\s\p{L}\p{N}]";

const CLOSERS: &[&str] = &["\"", "'", ")", "]", "}", "»", "”", "’"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    Number,
    Punct,
}

impl TokenKind {
    fn of(token: &str) -> Self {
        match token.chars().next() {
            Some(c) if c.is_alphabetic() => Self::Word,
            Some(c) if c.is_numeric() => Self::Number,
            _ => Self::Punct,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Number => "number",
            Self::Punct => "punct",
        }
    }
}

fn is_terminal(token: &str) -> bool {
    matches!(token, "." | "!" | "?" | "…")
}

pub struct TokenizerEngine {
    token: Regex,
}

impl TokenizerEngine {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token: Regex::new(TOKEN_PATTERN)?,
        })
    }

    /// Tokens and sentences of `text`, with UTF-16 offsets.
    pub fn tokenize(&self, text: &str) -> Vec<Annotation> {
        let mut cursor = Utf16Cursor::new(text);
        let mut annotations = Vec::new();
        let mut sentence_start: Option<usize> = None;
        let mut last_end = 0usize;
        let mut last_byte = 0usize;
        let mut closing = false;

        for m in self.token.find_iter(text) {
            let start = cursor.offset_of(m.start());
            let end = cursor.offset_of(m.end());
            let token = m.as_str();
            let kind = TokenKind::of(token);
            let terminal = kind == TokenKind::Punct && is_terminal(token);

            let line_break = text[last_byte..m.start()].contains('\n');
            if line_break || (closing && !terminal && !CLOSERS.contains(&token)) {
                if let Some(from) = sentence_start.take() {
                    annotations.push(Annotation::new(SENTENCE_TYPE, from as i64, last_end as i64));
                }
                closing = false;
            }
            if sentence_start.is_none() {
                sentence_start = Some(start);
            }

            annotations.push(
                Annotation::new(TOKEN_TYPE, start as i64, end as i64).with_feature("kind", kind.as_str()),
            );
            last_end = end;
            last_byte = m.end();
            closing |= terminal;
        }

        if let Some(from) = sentence_start {
            annotations.push(Annotation::new(SENTENCE_TYPE, from as i64, last_end as i64));
        }
        annotations
    }
}

pub struct Tokenizer {
    engine: EngineGuard<TokenizerEngine>,
}

impl Tokenizer {
    pub fn new() -> Result<Self, AnnotationError> {
        Ok(Self {
            engine: EngineGuard::new("tokenizer", TokenizerEngine::new()?),
        })
    }
}

#[async_trait]
impl Annotator for Tokenizer {
    fn name(&self) -> &str {
        "Tokenizer"
    }

    async fn annotate(&self, doc: &mut Document) -> Result<AnnotationOutcome, AnnotationError> {
        let text = match document_text(doc) {
            Ok(text) => text,
            Err(outcome) => return Ok(outcome),
        };
        let found = self.engine.with(|engine| engine.tokenize(text)).await;
        if found.is_empty() {
            return Ok(AnnotationOutcome::NoResult);
        }
        let added = found.len();
        doc.annotations.extend(found);
        Ok(AnnotationOutcome::Annotated(added))
    }
}

//! Language identification by stopword overlap.
//!
//! Each candidate language contributes its stopword list; the language whose
//! list covers the most words of the text wins and its ISO 639-1 code is
//! written into the document metadata.

use std::collections::HashSet;

use async_trait::async_trait;
use stop_words::{get, LANGUAGE};

use behemoth::config::keys::{LANG_METADATA_KEY, LANG_MIN_TEXT_LENGTH};
use behemoth::utils::utf16_len;
use behemoth::{Configuration, Document};

use super::annotator::{document_text, Annotator};
use super::engine::EngineGuard;
use super::types::{AnnotationError, AnnotationOutcome};

pub const DEFAULT_METADATA_KEY: &str = "lang";
pub const DEFAULT_MIN_TEXT_LENGTH: usize = 20;

const CANDIDATES: &[&str] = &["en", "de", "fr", "es", "it", "pt", "nl"];

fn stopword_list(code: &str) -> Option<LANGUAGE> {
    let lang = match code {
        "en" => LANGUAGE::English,
        "de" => LANGUAGE::German,
        "fr" => LANGUAGE::French,
        "es" => LANGUAGE::Spanish,
        "it" => LANGUAGE::Italian,
        "pt" => LANGUAGE::Portuguese,
        "nl" => LANGUAGE::Dutch,
        _ => return None,
    };
    Some(lang)
}

pub struct LanguageModel {
    languages: Vec<(&'static str, HashSet<String>)>,
}

impl LanguageModel {
    pub fn new() -> Self {
        let languages = CANDIDATES
            .iter()
            .filter_map(|code| {
                let lang = stopword_list(code)?;
                let words: HashSet<String> = get(lang).iter().map(|s| s.to_string()).collect();
                Some((*code, words))
            })
            .collect();
        Self { languages }
    }

    /// Best matching language code, or `None` when no stopword occurs.
    pub fn detect(&self, text: &str) -> Option<&'static str> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphabetic() && c != '\'')
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();

        let mut best: Option<(&'static str, usize)> = None;
        for (code, stopwords) in &self.languages {
            let hits = words.iter().filter(|w| stopwords.contains(w.as_str())).count();
            if hits > 0 && best.map_or(true, |(_, top)| hits > top) {
                best = Some((*code, hits));
            }
        }
        best.map(|(code, _)| code)
    }
}

impl Default for LanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

pub struct LanguageIdentifier {
    engine: EngineGuard<LanguageModel>,
    metadata_key: String,
    min_text_length: usize,
}

impl LanguageIdentifier {
    pub fn new(metadata_key: impl Into<String>, min_text_length: usize) -> Self {
        Self {
            engine: EngineGuard::new("language", LanguageModel::new()),
            metadata_key: metadata_key.into(),
            min_text_length,
        }
    }

    pub fn from_config(conf: &Configuration) -> Result<Self, AnnotationError> {
        Ok(Self::new(
            conf.get_non_empty(LANG_METADATA_KEY)
                .unwrap_or(DEFAULT_METADATA_KEY),
            conf.get_usize(LANG_MIN_TEXT_LENGTH, DEFAULT_MIN_TEXT_LENGTH)?,
        ))
    }

    pub fn metadata_key(&self) -> &str {
        &self.metadata_key
    }
}

#[async_trait]
impl Annotator for LanguageIdentifier {
    fn name(&self) -> &str {
        "Language identification"
    }

    async fn annotate(&self, doc: &mut Document) -> Result<AnnotationOutcome, AnnotationError> {
        if doc.metadata_value(&self.metadata_key).is_some() {
            return Ok(AnnotationOutcome::Skipped);
        }
        let text = match document_text(doc) {
            Ok(text) => text,
            Err(outcome) => return Ok(outcome),
        };
        if utf16_len(text) < self.min_text_length {
            tracing::debug!("Text of {} too short for language identification", doc.url);
            return Ok(AnnotationOutcome::Skipped);
        }

        let Some(code) = self.engine.with(|model| model.detect(text)).await else {
            return Ok(AnnotationOutcome::NoResult);
        };
        doc.metadata_mut()
            .insert(self.metadata_key.clone(), code.to_string());
        Ok(AnnotationOutcome::Annotated(0))
    }
}

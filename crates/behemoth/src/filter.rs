//! Document filter built from configuration.
//!
//! A filter combines three checks, applied in order:
//!
//! 1. the URL must fully match `document.filter.url.keep` (if set)
//! 2. the content type must fully match `document.filter.mimetype.keep` (if set)
//! 3. metadata patterns, either all "keep" (`document.filter.md.keep.<field>`)
//!    or all "skip" (`document.filter.md.skip.<field>`); mixing both is a
//!    configuration error
//!
//! With keep patterns a document survives only if one of its metadata values
//! matches the pattern for its key. With skip patterns a document survives
//! unless one does.

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

use crate::annotations::whole_match;
use crate::config::keys::{
    FILTER_MD_KEEP_PREFIX, FILTER_MD_SKIP_PREFIX, FILTER_MIMETYPE_KEEP, FILTER_URL_KEEP,
};
use crate::config::Configuration;
use crate::models::Document;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error(
        "Both keep (document.filter.md.keep.*) and skip (document.filter.md.skip.*) \
         metadata patterns are configured; use one or the other"
    )]
    ConflictingModes,

    #[error("Invalid metadata pattern for {field}: {source}")]
    InvalidPattern {
        field: String,
        source: regex::Error,
    },
}

#[derive(Debug, Clone)]
pub struct DocumentFilter {
    /// Skip documents whose metadata matches (blacklist) instead of keeping
    /// only those that do (whitelist).
    negative_mode: bool,
    kv_patterns: HashMap<String, Regex>,
    url_regex: Option<Regex>,
    mimetype_regex: Option<Regex>,
}

impl DocumentFilter {
    /// Build a filter from configuration.
    ///
    /// Fails immediately if both keep and skip metadata patterns are present.
    /// An invalid URL or mimetype regex is logged and ignored.
    pub fn from_config(conf: &Configuration) -> Result<Self, FilterError> {
        let keep: Vec<(&str, &str)> = conf.with_prefix(FILTER_MD_KEEP_PREFIX).collect();
        let skip: Vec<(&str, &str)> = conf.with_prefix(FILTER_MD_SKIP_PREFIX).collect();

        if !keep.is_empty() && !skip.is_empty() {
            return Err(FilterError::ConflictingModes);
        }

        let negative_mode = keep.is_empty();
        let entries = if negative_mode { skip } else { keep };

        let mut kv_patterns = HashMap::with_capacity(entries.len());
        for (field, pattern) in entries {
            let regex = whole_match(pattern).map_err(|source| FilterError::InvalidPattern {
                field: field.to_string(),
                source,
            })?;
            kv_patterns.insert(field.to_string(), regex);
        }

        let filter = Self {
            negative_mode,
            kv_patterns,
            url_regex: optional_regex(conf, FILTER_URL_KEEP),
            mimetype_regex: optional_regex(conf, FILTER_MIMETYPE_KEEP),
        };

        tracing::debug!(
            "Document filter: {} metadata pattern(s), negative mode {}, url {}, mimetype {}",
            filter.kv_patterns.len(),
            filter.negative_mode,
            filter.url_regex.is_some(),
            filter.mimetype_regex.is_some()
        );

        Ok(filter)
    }

    /// Whether the configuration asks for any filtering at all.
    pub fn is_required(conf: &Configuration) -> Result<bool, FilterError> {
        Ok(Self::from_config(conf)?.is_active())
    }

    pub fn is_active(&self) -> bool {
        !self.kv_patterns.is_empty() || self.url_regex.is_some() || self.mimetype_regex.is_some()
    }

    pub fn is_negative_mode(&self) -> bool {
        self.negative_mode
    }

    /// Decide whether a document goes on to the next step.
    pub fn keep(&self, doc: &Document) -> bool {
        if let Some(url_regex) = &self.url_regex {
            if !url_regex.is_match(&doc.url) {
                return false;
            }
        }

        if let Some(mimetype_regex) = &self.mimetype_regex {
            match doc.content_type.as_deref() {
                Some(content_type) if mimetype_regex.is_match(content_type) => {}
                _ => return false,
            }
        }

        if self.kv_patterns.is_empty() {
            return true;
        }

        let metadata = match &doc.metadata {
            Some(md) if !md.is_empty() => md,
            // Nothing can match a keep rule, and nothing forbidden is present.
            _ => return self.negative_mode,
        };

        let found = metadata.iter().any(|(key, value)| {
            self.kv_patterns
                .get(key)
                .is_some_and(|regex| regex.is_match(value))
        });

        found != self.negative_mode
    }
}

fn optional_regex(conf: &Configuration, key: &str) -> Option<Regex> {
    let pattern = conf.get_non_empty(key)?;
    match whole_match(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!("Ignoring invalid regex for {}: {} ({})", key, pattern, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conf(entries: &[(&str, &str)]) -> Configuration {
        let mut conf = Configuration::new();
        for (key, value) in entries {
            conf.set(*key, *value);
        }
        conf
    }

    fn doc_with_md(url: &str, md: &[(&str, &str)]) -> Document {
        let mut doc = Document::new(url);
        for (key, value) in md {
            doc.metadata_mut().insert(key.to_string(), value.to_string());
        }
        doc
    }

    #[test]
    fn test_keep_and_skip_are_mutually_exclusive() {
        let conf = conf(&[
            ("document.filter.md.keep.lang", "en"),
            ("document.filter.md.skip.source", "spam"),
        ]);
        assert!(matches!(
            DocumentFilter::from_config(&conf),
            Err(FilterError::ConflictingModes)
        ));
        assert!(DocumentFilter::is_required(&conf).is_err());
    }

    #[test]
    fn test_empty_metadata_asymmetry() {
        let doc = Document::new("https://example.com/");

        let whitelist =
            DocumentFilter::from_config(&conf(&[("document.filter.md.keep.lang", "en")])).unwrap();
        assert!(!whitelist.is_negative_mode());
        assert!(!whitelist.keep(&doc));

        let blacklist =
            DocumentFilter::from_config(&conf(&[("document.filter.md.skip.lang", "en")])).unwrap();
        assert!(blacklist.is_negative_mode());
        assert!(blacklist.keep(&doc));

        let mut empty_md = doc.clone();
        empty_md.metadata_mut();
        assert!(!whitelist.keep(&empty_md));
        assert!(blacklist.keep(&empty_md));
    }

    #[test]
    fn test_whitelist() {
        let filter =
            DocumentFilter::from_config(&conf(&[("document.filter.md.keep.lang", "en|fr")]))
                .unwrap();
        assert!(filter.keep(&doc_with_md("u", &[("lang", "fr")])));
        assert!(!filter.keep(&doc_with_md("u", &[("lang", "de")])));
        // Whole-string match only.
        assert!(!filter.keep(&doc_with_md("u", &[("lang", "english")])));
        assert!(!filter.keep(&doc_with_md("u", &[("other", "en")])));
    }

    #[test]
    fn test_blacklist() {
        let filter =
            DocumentFilter::from_config(&conf(&[("document.filter.md.skip.source", "spam.*")]))
                .unwrap();
        assert!(!filter.keep(&doc_with_md("u", &[("source", "spamfarm")])));
        assert!(filter.keep(&doc_with_md("u", &[("source", "news")])));
        assert!(filter.keep(&doc_with_md("u", &[("lang", "spam")])));
    }

    #[test]
    fn test_url_gate_precedes_metadata() {
        let filter = DocumentFilter::from_config(&conf(&[
            ("document.filter.url.keep", "https://example\\.com/.*"),
            ("document.filter.md.keep.lang", "en"),
        ]))
        .unwrap();

        assert!(filter.keep(&doc_with_md("https://example.com/a", &[("lang", "en")])));
        assert!(!filter.keep(&doc_with_md("https://other.org/a", &[("lang", "en")])));
    }

    #[test]
    fn test_mimetype_gate() {
        let filter =
            DocumentFilter::from_config(&conf(&[("document.filter.mimetype.keep", "text/.+")]))
                .unwrap();

        let mut doc = Document::new("u");
        assert!(!filter.keep(&doc));
        doc.content_type = Some("text/html".into());
        assert!(filter.keep(&doc));
        doc.content_type = Some("application/pdf".into());
        assert!(!filter.keep(&doc));
    }

    #[test]
    fn test_invalid_url_regex_is_ignored() {
        let conf = conf(&[("document.filter.url.keep", "https://(unclosed")]);
        let filter = DocumentFilter::from_config(&conf).unwrap();
        assert!(!filter.is_active());
        assert!(filter.keep(&Document::new("anything")));
        assert!(!DocumentFilter::is_required(&conf).unwrap());
    }

    #[test]
    fn test_invalid_metadata_pattern_is_fatal() {
        let conf = conf(&[("document.filter.md.keep.lang", "(en")]);
        assert!(matches!(
            DocumentFilter::from_config(&conf),
            Err(FilterError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_is_required() {
        assert!(!DocumentFilter::is_required(&Configuration::new()).unwrap());
        assert!(
            DocumentFilter::is_required(&conf(&[("document.filter.mimetype.keep", "text/html")]))
                .unwrap()
        );
        assert!(DocumentFilter::is_required(&conf(&[("document.filter.md.skip.x", "y")])).unwrap());
    }
}

//! Regex entity annotator.
//!
//! Rules come from `annotate.pattern.<Type> = <regex>` entries. Every match
//! of a rule becomes a `<Type>` annotation over the matched text, and each
//! named capture group that took part in the match becomes a feature. With
//! no rules configured a small built-in set (e-mail addresses, URLs, ISO
//! dates) is used.

use std::collections::HashSet;

use async_trait::async_trait;
use regex::Regex;

use behemoth::config::keys::ANNOTATE_PATTERN_PREFIX;
use behemoth::utils::Utf16Cursor;
use behemoth::{Annotation, Configuration, Document};

use super::annotator::{document_text, Annotator};
use super::engine::EngineGuard;
use super::types::{AnnotationError, AnnotationOutcome};

const DEFAULT_RULES: &[(&str, &str)] = &[
    ("Email", r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+"),
    ("Url", r#"(?P<scheme>https?)://[^\s<>"'()]+[^\s<>"'().,;:!?]"#),
    ("Date", r"\b(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})\b"),
];

#[derive(Debug, Clone)]
struct PatternRule {
    kind: String,
    regex: Regex,
}

pub struct PatternEngine {
    rules: Vec<PatternRule>,
}

impl PatternEngine {
    pub fn new<K: AsRef<str>, P: AsRef<str>>(rules: &[(K, P)]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|(kind, pattern)| {
                Ok(PatternRule {
                    kind: kind.as_ref().to_string(),
                    regex: Regex::new(pattern.as_ref())?,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn extract(&self, text: &str) -> Vec<Annotation> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for rule in &self.rules {
            let names: Vec<&str> = rule.regex.capture_names().flatten().collect();
            let mut cursor = Utf16Cursor::new(text);

            for caps in rule.regex.captures_iter(text) {
                let Some(whole) = caps.get(0) else {
                    continue;
                };
                if whole.is_empty() {
                    continue;
                }
                let start = cursor.offset_of(whole.start()) as i64;
                let end = cursor.offset_of(whole.end()) as i64;
                if !seen.insert((rule.kind.as_str(), start, end)) {
                    continue;
                }

                let mut annotation = Annotation::new(rule.kind.as_str(), start, end);
                for name in &names {
                    if let Some(group) = caps.name(name) {
                        annotation
                            .features
                            .insert(name.to_string(), group.as_str().to_string());
                    }
                }
                found.push(annotation);
            }
        }

        found
    }
}

pub struct PatternAnnotator {
    engine: EngineGuard<PatternEngine>,
}

impl PatternAnnotator {
    pub fn new(engine: PatternEngine) -> Self {
        Self {
            engine: EngineGuard::new("patterns", engine),
        }
    }

    /// Annotator with the `annotate.pattern.*` rules, or the built-in ones
    /// when none are configured.
    pub fn from_config(conf: &Configuration) -> Result<Self, AnnotationError> {
        let configured: Vec<(&str, &str)> = conf
            .with_prefix(ANNOTATE_PATTERN_PREFIX)
            .filter(|(kind, pattern)| !kind.is_empty() && !pattern.is_empty())
            .collect();

        let engine = if configured.is_empty() {
            tracing::debug!("No pattern rules configured, using built-in rules");
            PatternEngine::new(DEFAULT_RULES)?
        } else {
            PatternEngine::new(&configured)?
        };
        Ok(Self::new(engine))
    }
}

#[async_trait]
impl Annotator for PatternAnnotator {
    fn name(&self) -> &str {
        "Pattern entities"
    }

    async fn annotate(&self, doc: &mut Document) -> Result<AnnotationOutcome, AnnotationError> {
        let text = match document_text(doc) {
            Ok(text) => text,
            Err(outcome) => return Ok(outcome),
        };
        let found = self.engine.with(|engine| engine.extract(text)).await;
        if found.is_empty() {
            return Ok(AnnotationOutcome::NoResult);
        }
        let added = found.len();
        doc.annotations.extend(found);
        Ok(AnnotationOutcome::Annotated(added))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let engine = PatternEngine::new(DEFAULT_RULES).unwrap();
        let text = "Mail jo@example.org before 2024-03-15, see https://example.org/faq.";
        let mut doc = Document::new("u");
        doc.text = Some(text.into());
        doc.annotations = engine.extract(text);

        let email = doc.annotations_of("Email").next().unwrap();
        assert_eq!(doc.covered_text(email), Some("jo@example.org"));

        let date = doc.annotations_of("Date").next().unwrap();
        assert_eq!(date.feature("year"), Some("2024"));
        assert_eq!(date.feature("day"), Some("15"));

        let url = doc.annotations_of("Url").next().unwrap();
        assert_eq!(doc.covered_text(url), Some("https://example.org/faq"));
        assert_eq!(url.feature("scheme"), Some("https"));
    }

    #[test]
    fn test_configured_rules_replace_defaults() {
        let mut conf = Configuration::new();
        conf.set("annotate.pattern.Agency", r"\b(?P<acronym>FBI|CIA)\b");
        conf.set("annotate.pattern.Case", r"No\. \d+");

        let annotator = PatternAnnotator::from_config(&conf).unwrap();
        let engine = annotator.engine.into_inner();
        assert_eq!(engine.rule_count(), 2);

        let found = engine.extract("The FBI filed No. 42 with the CIA; mail a@b.cd");
        let kinds: Vec<&str> = found.iter().map(|a| a.kind.as_str()).collect();
        assert_eq!(kinds, vec!["Agency", "Agency", "Case"]);
        assert_eq!(found[1].feature("acronym"), Some("CIA"));
    }

    #[test]
    fn test_invalid_rule() {
        let mut conf = Configuration::new();
        conf.set("annotate.pattern.Broken", "(unclosed");
        assert!(matches!(
            PatternAnnotator::from_config(&conf),
            Err(AnnotationError::Pattern(_))
        ));
    }

    #[test]
    fn test_offsets_after_multibyte_text() {
        let engine = PatternEngine::new(&[("Code", r"X\d")]).unwrap();
        let found = engine.extract("ünï 😀 X1");
        assert_eq!((found[0].start, found[0].end), (7, 9));
    }

    #[tokio::test]
    async fn test_no_match_is_no_result() {
        let annotator = PatternAnnotator::from_config(&Configuration::new()).unwrap();
        let mut doc = Document::new("u");
        doc.text = Some("nothing to see".into());
        assert_eq!(
            annotator.annotate(&mut doc).await.unwrap(),
            AnnotationOutcome::NoResult
        );
        assert!(doc.annotations.is_empty());
    }
}

//! Mapping of annotations onto flat fields for indexing.
//!
//! A mapping entry reads `Type.feature=field`: the value of `feature` on every
//! `Type` annotation goes into `field`. The feature `*` stands for the text
//! the annotation covers. Each exported record is a JSON object with the URL,
//! the text, the metadata and one array per mapped field that found values.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::keys::EXPORT_FIELD_PREFIX;
use crate::config::Configuration;
use crate::models::Document;

const RESERVED_FIELDS: [&str; 3] = ["url", "text", "metadata"];

/// Feature name selecting the covered text instead of a feature value.
pub const COVERED_TEXT: &str = "*";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Field mapping must look like Type.feature=field, got: {0}")]
    BadMapping(String),

    #[error("Field name {0} is reserved")]
    ReservedField(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldRule {
    kind: String,
    feature: String,
    field: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    rules: Vec<FieldRule>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `Type.feature=field` entries.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, ExportError> {
        let mut mapping = Self::new();
        for entry in entries {
            let entry = entry.as_ref();
            let (source, field) = entry
                .split_once('=')
                .ok_or_else(|| ExportError::BadMapping(entry.to_string()))?;
            mapping.add(source.trim(), field.trim())?;
        }
        Ok(mapping)
    }

    /// Mapping from `export.field.<field> = Type.feature` entries.
    pub fn from_config(conf: &Configuration) -> Result<Self, ExportError> {
        let mut mapping = Self::new();
        for (field, source) in conf.with_prefix(EXPORT_FIELD_PREFIX) {
            mapping.add(source.trim(), field)?;
        }
        Ok(mapping)
    }

    /// Add one rule; `source` is `Type.feature`.
    pub fn add(&mut self, source: &str, field: &str) -> Result<(), ExportError> {
        let bad = || ExportError::BadMapping(format!("{}={}", source, field));
        let (kind, feature) = source.split_once('.').ok_or_else(bad)?;
        if kind.is_empty() || feature.is_empty() || field.is_empty() {
            return Err(bad());
        }
        if RESERVED_FIELDS.contains(&field) {
            return Err(ExportError::ReservedField(field.to_string()));
        }
        self.rules.push(FieldRule {
            kind: kind.to_string(),
            feature: feature.to_string(),
            field: field.to_string(),
        });
        Ok(())
    }

    pub fn merge(&mut self, other: FieldMapping) {
        self.rules.extend(other.rules);
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn export(&self, doc: &Document) -> Value {
        let mut record = Map::new();
        record.insert("url".into(), Value::String(doc.url.clone()));
        if let Some(text) = &doc.text {
            record.insert("text".into(), Value::String(text.clone()));
        }
        if let Some(metadata) = &doc.metadata {
            let md: Map<String, Value> = metadata
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            record.insert("metadata".into(), Value::Object(md));
        }

        for rule in &self.rules {
            let values: Vec<Value> = doc
                .annotations_of(&rule.kind)
                .filter_map(|annotation| {
                    if rule.feature == COVERED_TEXT {
                        doc.covered_text(annotation)
                    } else {
                        annotation.feature(&rule.feature)
                    }
                })
                .map(|v| Value::String(v.to_string()))
                .collect();
            if values.is_empty() {
                continue;
            }
            match record.get_mut(&rule.field) {
                Some(Value::Array(existing)) => existing.extend(values),
                _ => {
                    record.insert(rule.field.clone(), Value::Array(values));
                }
            }
        }

        Value::Object(record)
    }

    /// One JSON line per document.
    pub fn export_line(&self, doc: &Document) -> Result<String, ExportError> {
        Ok(serde_json::to_string(&self.export(doc))?)
    }
}

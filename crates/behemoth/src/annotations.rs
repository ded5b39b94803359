//! Annotation algebra: sorting, containment and type/feature/value queries.
//!
//! All patterns are whole-string regular expressions: `Person` matches the
//! type "Person" but not "PersonName".

use regex::Regex;

use crate::models::Annotation;

/// Error raised by an invalid type, feature or value pattern.
pub type QueryError = regex::Error;

/// Compile `pattern` so it only matches the entire input.
pub fn whole_match(pattern: &str) -> Result<Regex, QueryError> {
    Regex::new(&format!("^(?:{})$", pattern))
}

/// Stable in-place sort by the annotation total order.
pub fn sort(annotations: &mut [Annotation]) {
    annotations.sort_by(Annotation::compare);
}

/// Annotations lying fully inside `[start, end]`.
///
/// Overlapping but not nested spans are excluded.
pub fn contained(annotations: &[Annotation], start: i64, end: i64) -> Vec<&Annotation> {
    annotations
        .iter()
        .filter(|a| a.is_within(start, end))
        .collect()
}

/// A compiled type/feature/value query.
#[derive(Debug, Clone)]
pub struct AnnotationQuery {
    kind: Regex,
    feature: Option<Regex>,
    value: Option<Regex>,
}

impl AnnotationQuery {
    /// `feature = None` selects on type alone. An empty `value` means the
    /// feature only has to be present.
    pub fn new(kind: &str, feature: Option<&str>, value: Option<&str>) -> Result<Self, QueryError> {
        let feature = feature.map(whole_match).transpose()?;
        let value = match value {
            Some(v) if !v.is_empty() => Some(whole_match(v)?),
            _ => None,
        };
        Ok(Self {
            kind: whole_match(kind)?,
            feature,
            value,
        })
    }

    pub fn matches(&self, annotation: &Annotation) -> bool {
        if !self.kind.is_match(&annotation.kind) {
            return false;
        }
        let Some(feature) = &self.feature else {
            return true;
        };
        annotation
            .features
            .iter()
            .filter(|(key, _)| feature.is_match(key))
            .any(|(_, value)| match &self.value {
                Some(pattern) => pattern.is_match(value),
                None => true,
            })
    }

    pub fn select<'a>(&self, annotations: &'a [Annotation]) -> Vec<&'a Annotation> {
        annotations.iter().filter(|a| self.matches(a)).collect()
    }
}

/// Annotations matching a type pattern and, optionally, a feature name and
/// value pattern.
pub fn filter<'a>(
    annotations: &'a [Annotation],
    kind: &str,
    feature: Option<&str>,
    value: Option<&str>,
) -> Result<Vec<&'a Annotation>, QueryError> {
    Ok(AnnotationQuery::new(kind, feature, value)?.select(annotations))
}

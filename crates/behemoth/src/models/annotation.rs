//! Typed text span with a string-keyed feature map.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Offset value meaning "not set".
pub const UNSET_OFFSET: i64 = -1;

/// A typed span over a document's text.
///
/// Offsets are UTF-16 code units into `Document::text`, end exclusive.
/// `start <= end` is expected but not enforced; producers are responsible
/// for it. The set of types and feature names is open: whatever an engine
/// emits is carried through as plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Category label, e.g. "Person" or "Token".
    #[serde(rename = "type")]
    pub kind: String,
    pub start: i64,
    pub end: i64,
    /// Engine-specific attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, String>,
}

impl Default for Annotation {
    fn default() -> Self {
        Self {
            kind: String::new(),
            start: UNSET_OFFSET,
            end: UNSET_OFFSET,
            features: BTreeMap::new(),
        }
    }
}

impl Annotation {
    pub fn new(kind: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            kind: kind.into(),
            start,
            end,
            features: BTreeMap::new(),
        }
    }

    /// Builder-style feature insertion.
    pub fn with_feature(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.features.insert(key.into(), value.into());
        self
    }

    pub fn feature(&self, key: &str) -> Option<&str> {
        self.features.get(key).map(String::as_str)
    }

    /// Number of features; zero when none were ever set.
    pub fn feature_num(&self) -> usize {
        self.features.len()
    }

    /// Whether this span lies fully inside `[start, end]`.
    pub fn is_within(&self, start: i64, end: i64) -> bool {
        self.start >= start && self.end <= end
    }

    /// Total order used for sorting and deduplication.
    ///
    /// Compares start, then type, then end, then feature *count*. Two
    /// annotations that differ only in feature contents compare `Equal`,
    /// which is why this is not the `Ord` impl: `==` stays structural.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.end.cmp(&other.end))
            .then_with(|| self.feature_num().cmp(&other.feature_num()))
    }
}

impl fmt::Display for Annotation {
    /// `type \t start \t end` followed by tab-separated `key=value` pairs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.kind, self.start, self.end)?;
        for (key, value) in &self.features {
            write!(f, "\t{}={}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unset() {
        let annotation = Annotation::default();
        assert_eq!(annotation.kind, "");
        assert_eq!(annotation.start, UNSET_OFFSET);
        assert_eq!(annotation.end, UNSET_OFFSET);
        assert_eq!(annotation.feature_num(), 0);
    }

    #[test]
    fn test_compare_orders_by_start_then_type() {
        let a = Annotation::new("B", 1, 5);
        let b = Annotation::new("A", 1, 5);
        let c = Annotation::new("Z", 0, 5);

        let mut list = vec![a.clone(), b.clone(), c.clone()];
        list.sort_by(Annotation::compare);

        assert_eq!(list, vec![c, b, a]);
    }

    #[test]
    fn test_compare_tie_breaks_on_end_and_feature_count() {
        let short = Annotation::new("Token", 0, 3);
        let long = Annotation::new("Token", 0, 7);
        assert_eq!(short.compare(&long), Ordering::Less);

        let bare = Annotation::new("Token", 0, 3);
        let rich = Annotation::new("Token", 0, 3).with_feature("pos", "NN");
        assert_eq!(bare.compare(&rich), Ordering::Less);
    }

    #[test]
    fn test_compare_ignores_feature_contents() {
        let subject = Annotation::new("Person", 4, 9).with_feature("role", "subject");
        let object = Annotation::new("Person", 4, 9).with_feature("role", "object");

        assert_eq!(subject.compare(&object), Ordering::Equal);
        assert_ne!(subject, object);
    }

    #[test]
    fn test_display_format() {
        let annotation = Annotation::new("Person", 3, 8)
            .with_feature("gender", "female")
            .with_feature("role", "subject");
        assert_eq!(
            annotation.to_string(),
            "Person\t3\t8\tgender=female\trole=subject"
        );
        assert_eq!(Annotation::new("Token", 0, 2).to_string(), "Token\t0\t2");
    }
}

//! Shared string pool for annotation types and feature names.
//!
//! Types and feature names share one pool and one index space. Entries keep
//! first-encountered order: for each annotation its type, then its feature
//! names.

use std::collections::HashMap;

use super::CodecError;
use crate::models::Annotation;

#[derive(Debug, Default)]
pub struct StringPool<'a> {
    entries: Vec<&'a str>,
    lookup: HashMap<&'a str, i32>,
}

impl<'a> StringPool<'a> {
    pub fn from_annotations(annotations: &'a [Annotation]) -> Self {
        let mut pool = Self::default();
        for annotation in annotations {
            pool.intern(&annotation.kind);
            for key in annotation.features.keys() {
                pool.intern(key);
            }
        }
        pool
    }

    fn intern(&mut self, value: &'a str) {
        if !self.lookup.contains_key(value) {
            self.lookup.insert(value, self.entries.len() as i32);
            self.entries.push(value);
        }
    }

    pub fn index_of(&self, value: &str) -> Result<i32, CodecError> {
        self.lookup
            .get(value)
            .copied()
            .ok_or_else(|| CodecError::MissingPoolEntry(value.to_string()))
    }

    pub fn entries(&self) -> &[&'a str] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve a decoded pool index.
pub fn resolve(pool: &[String], index: i32) -> Result<&str, CodecError> {
    usize::try_from(index)
        .ok()
        .and_then(|idx| pool.get(idx))
        .map(String::as_str)
        .ok_or(CodecError::PoolIndex {
            index,
            size: pool.len(),
        })
}

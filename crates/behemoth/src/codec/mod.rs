//! Versioned binary encoding of a `Document`.
//!
//! Layout (big-endian):
//!
//! 1. version byte (`CURRENT_VERSION`)
//! 2. URL as a length-prefixed string
//! 3. `i32` content length, then the raw bytes (0 when there is no content)
//! 4. content type with parameters stripped (empty when unset)
//! 5. `bool` has-text, then the text
//! 6. `bool` has-metadata, then an `i32` count of key/value string pairs
//! 7. string pool: `i32` count, then each string
//! 8. `i32` annotation count; per annotation an `i32` pool index for the
//!    type, varint start and end, an `i32` feature count and per feature an
//!    `i32` pool index for the name followed by the value string
//!
//! Strings are a varint byte length followed by UTF-8 bytes.

mod pool;
pub mod wire;

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::models::{Annotation, Document};
use crate::utils::mime::clean_mime_type;

pub use pool::StringPool;

/// Record version written by this codec.
pub const CURRENT_VERSION: u8 = 1;

/// Upper bound for pre-allocating collections from untrusted counts.
const MAX_PREALLOC: usize = 1024;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Unsupported record version {found} (this reader supports version {supported})")]
    VersionMismatch { found: u8, supported: u8 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid UTF-8 string: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("Negative or oversized length: {0}")]
    NegativeLength(i64),

    #[error("Length {0} does not fit the record format")]
    TooLarge(usize),

    #[error("String pool index {index} out of range (pool has {size} entries)")]
    PoolIndex { index: i32, size: usize },

    #[error("String missing from pool: {0}")]
    MissingPoolEntry(String),
}

impl CodecError {
    /// Whether the stream ended in the middle of a record.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

/// Write one document record.
pub fn write_document<W: Write>(doc: &Document, out: &mut W) -> Result<(), CodecError> {
    wire::write_u8(out, CURRENT_VERSION)?;
    wire::write_string(out, &doc.url)?;

    match &doc.content {
        Some(content) => {
            wire::write_i32(out, wire::len_to_i32(content.len())?)?;
            out.write_all(content)?;
        }
        None => wire::write_i32(out, 0)?,
    }

    let content_type = doc.content_type.as_deref().map(clean_mime_type).unwrap_or("");
    wire::write_string(out, content_type)?;

    wire::write_bool(out, doc.text.is_some())?;
    if let Some(text) = &doc.text {
        wire::write_string(out, text)?;
    }

    wire::write_bool(out, doc.metadata.is_some())?;
    if let Some(metadata) = &doc.metadata {
        wire::write_i32(out, wire::len_to_i32(metadata.len())?)?;
        for (key, value) in metadata {
            wire::write_string(out, key)?;
            wire::write_string(out, value)?;
        }
    }

    write_annotations(&doc.annotations, out)
}

fn write_annotations<W: Write>(annotations: &[Annotation], out: &mut W) -> Result<(), CodecError> {
    let pool = StringPool::from_annotations(annotations);

    wire::write_i32(out, wire::len_to_i32(pool.len())?)?;
    for entry in pool.entries() {
        wire::write_string(out, entry)?;
    }

    wire::write_i32(out, wire::len_to_i32(annotations.len())?)?;
    for annotation in annotations {
        wire::write_i32(out, pool.index_of(&annotation.kind)?)?;
        wire::write_vlong(out, annotation.start)?;
        wire::write_vlong(out, annotation.end)?;
        wire::write_i32(out, wire::len_to_i32(annotation.features.len())?)?;
        for (key, value) in &annotation.features {
            wire::write_i32(out, pool.index_of(key)?)?;
            wire::write_string(out, value)?;
        }
    }
    Ok(())
}

/// Read one document record.
///
/// A record from a newer (or unknown) version is rejected outright; a
/// truncated or malformed stream fails the whole record.
pub fn read_document<R: Read>(input: &mut R) -> Result<Document, CodecError> {
    let version = wire::read_u8(input)?;
    if version != CURRENT_VERSION {
        return Err(CodecError::VersionMismatch {
            found: version,
            supported: CURRENT_VERSION,
        });
    }

    let url = wire::read_string(input)?;

    // Zero length and an empty type both mean "absent" on the wire.
    let content_len = wire::read_len(input)?;
    let content = if content_len > 0 {
        Some(wire::read_bytes(input, content_len)?)
    } else {
        None
    };

    let content_type = Some(wire::read_string(input)?).filter(|ct| !ct.is_empty());

    let text = if wire::read_bool(input)? {
        Some(wire::read_string(input)?)
    } else {
        None
    };

    let metadata = if wire::read_bool(input)? {
        let count = wire::read_len(input)?;
        let mut metadata = BTreeMap::new();
        for _ in 0..count {
            let key = wire::read_string(input)?;
            let value = wire::read_string(input)?;
            metadata.insert(key, value);
        }
        Some(metadata)
    } else {
        None
    };

    let annotations = read_annotations(input)?;

    Ok(Document {
        url,
        content_type,
        content,
        text,
        metadata,
        annotations,
    })
}

fn read_annotations<R: Read>(input: &mut R) -> Result<Vec<Annotation>, CodecError> {
    let pool_size = wire::read_len(input)?;
    let mut pool = Vec::with_capacity(pool_size.min(MAX_PREALLOC));
    for _ in 0..pool_size {
        pool.push(wire::read_string(input)?);
    }

    let count = wire::read_len(input)?;
    let mut annotations = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        let kind = pool::resolve(&pool, wire::read_i32(input)?)?.to_string();
        let start = wire::read_vlong(input)?;
        let end = wire::read_vlong(input)?;

        let mut annotation = Annotation::new(kind, start, end);
        let feature_count = wire::read_len(input)?;
        for _ in 0..feature_count {
            let key = pool::resolve(&pool, wire::read_i32(input)?)?.to_string();
            let value = wire::read_string(input)?;
            annotation.features.insert(key, value);
        }
        annotations.push(annotation);
    }
    Ok(annotations)
}

/// Encode a document into a fresh buffer.
pub fn encode(doc: &Document) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    write_document(doc, &mut buf)?;
    Ok(buf)
}

/// Decode a document from a byte slice. Trailing bytes are ignored.
pub fn decode(bytes: &[u8]) -> Result<Document, CodecError> {
    let mut input = bytes;
    read_document(&mut input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rich_document() -> Document {
        let mut doc = Document::new("https://example.com/news/1");
        doc.content_type = Some("text/html; charset=utf-8".to_string());
        doc.content = Some(b"<html><body>Jane met Bob.</body></html>".to_vec());
        doc.text = Some("Jane met Bob.".to_string());
        doc.metadata_mut().insert("lang".into(), "en".into());
        doc.metadata_mut().insert("segment".into(), "20240101".into());
        doc.annotations = vec![
            Annotation::new("Sentence", 0, 13),
            Annotation::new("Person", 0, 4).with_feature("role", "subject"),
            Annotation::new("Token", 0, 4).with_feature("pos", "NNP"),
            Annotation::new("Token", 5, 8).with_feature("pos", "VBD"),
            Annotation::new("Person", 9, 12).with_feature("role", "object"),
            Annotation::new("Token", 9, 12)
                .with_feature("pos", "NNP")
                .with_feature("role", "object"),
        ];
        doc
    }

    #[test]
    fn test_empty_content_and_type_read_back_as_absent() {
        let mut doc = Document::new("u");
        doc.content_type = Some(String::new());
        doc.content = Some(Vec::new());

        let bytes = encode(&doc).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.content_type, None);
        assert_eq!(decoded.content, None);
        // Same bytes as a document that never had either.
        assert_eq!(bytes, encode(&Document::new("u")).unwrap());
    }

    #[test]
    fn test_round_trip_preserves_fields_and_order() {
        let doc = rich_document();
        let decoded = decode(&encode(&doc).unwrap()).unwrap();

        let mut expected = doc.clone();
        expected.content_type = Some("text/html".to_string());
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_round_trip_minimal_document() {
        let doc = Document::new("file:///tmp/empty.txt");
        let decoded = decode(&encode(&doc).unwrap()).unwrap();
        assert_eq!(decoded, doc);
        assert!(decoded.metadata.is_none());
    }

    #[test]
    fn test_empty_metadata_survives_as_present() {
        let mut doc = Document::new("u");
        doc.metadata_mut();
        let decoded = decode(&encode(&doc).unwrap()).unwrap();
        assert_eq!(decoded.metadata, Some(BTreeMap::new()));
    }

    #[test]
    fn test_exact_byte_layout() {
        let mut doc = Document::new("u");
        doc.annotations.push(Annotation::new("Token", 0, 1));

        let bytes = encode(&doc).unwrap();
        let expected: Vec<u8> = vec![
            0x01, // version
            0x01, b'u', // url
            0x00, 0x00, 0x00, 0x00, // content length
            0x00, // content type ""
            0x00, // has text
            0x00, // has metadata
            0x00, 0x00, 0x00, 0x01, // pool size
            0x05, b'T', b'o', b'k', b'e', b'n', // pool[0]
            0x00, 0x00, 0x00, 0x01, // annotation count
            0x00, 0x00, 0x00, 0x00, // type index
            0x00, 0x01, // start, end
            0x00, 0x00, 0x00, 0x00, // feature count
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_pool_holds_each_distinct_string_once() {
        let doc = rich_document();
        let bytes = encode(&doc).unwrap();

        // Skip the header fields to reach the pool section.
        let mut input = bytes.as_slice();
        wire::read_u8(&mut input).unwrap();
        wire::read_string(&mut input).unwrap();
        let len = wire::read_len(&mut input).unwrap();
        wire::read_bytes(&mut input, len).unwrap();
        wire::read_string(&mut input).unwrap();
        assert!(wire::read_bool(&mut input).unwrap());
        wire::read_string(&mut input).unwrap();
        assert!(wire::read_bool(&mut input).unwrap());
        let md = wire::read_len(&mut input).unwrap();
        for _ in 0..md * 2 {
            wire::read_string(&mut input).unwrap();
        }

        let pool_size = wire::read_len(&mut input).unwrap();
        let pool: Vec<String> = (0..pool_size)
            .map(|_| wire::read_string(&mut input).unwrap())
            .collect();
        assert_eq!(pool, vec!["Sentence", "Person", "role", "Token", "pos"]);
    }

    #[test]
    fn test_future_version_is_rejected() {
        let mut bytes = encode(&rich_document()).unwrap();
        bytes[0] = CURRENT_VERSION + 1;
        match decode(&bytes) {
            Err(CodecError::VersionMismatch { found, supported }) => {
                assert_eq!(found, 2);
                assert_eq!(supported, 1);
            }
            other => panic!("expected version mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_record_fails() {
        let bytes = encode(&rich_document()).unwrap();
        for cut in [1, 10, bytes.len() / 2, bytes.len() - 1] {
            let err = decode(&bytes[..cut]).unwrap_err();
            assert!(err.is_truncation(), "cut at {}: {:?}", cut, err);
        }
    }

    #[test]
    fn test_bad_pool_index_fails() {
        let mut doc = Document::new("u");
        doc.annotations.push(Annotation::new("Token", 0, 1));
        let mut bytes = encode(&doc).unwrap();
        // Type index sits right after the annotation count.
        let type_index_at = bytes.len() - 10;
        bytes[type_index_at + 3] = 7;
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::PoolIndex { index: 7, size: 1 })
        ));
    }

    #[test]
    fn test_negative_offsets_round_trip() {
        let mut doc = Document::new("u");
        doc.text = Some(String::new());
        doc.annotations.push(Annotation::default());
        doc.annotations
            .push(Annotation::new("Big", 1 << 40, i64::MAX).with_feature("k", ""));
        let decoded = decode(&encode(&doc).unwrap()).unwrap();
        assert_eq!(decoded, doc);
    }
}

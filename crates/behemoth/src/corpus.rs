//! Corpus files: the record stream handed from one stage to the next.
//!
//! A corpus is a sequence of frames, each a big-endian `u32` byte length
//! followed by one encoded document. A clean end of file between frames ends
//! the corpus; anything cut short inside a frame is a codec error.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::codec::{self, wire, CodecError};
use crate::models::Document;

pub struct CorpusWriter<W: Write> {
    out: W,
    buf: Vec<u8>,
    written: u64,
}

impl CorpusWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> CorpusWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            buf: Vec::new(),
            written: 0,
        }
    }

    pub fn write(&mut self, doc: &Document) -> Result<(), CodecError> {
        self.buf.clear();
        codec::write_document(doc, &mut self.buf)?;
        let len = u32::try_from(self.buf.len()).map_err(|_| CodecError::TooLarge(self.buf.len()))?;
        self.out.write_all(&len.to_be_bytes())?;
        self.out.write_all(&self.buf)?;
        self.written += 1;
        Ok(())
    }

    /// Number of documents written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

pub struct CorpusReader<R: Read> {
    input: R,
}

impl CorpusReader<BufReader<File>> {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read> CorpusReader<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// Next document, `Ok(None)` at a clean end of the corpus.
    pub fn read_next(&mut self) -> Result<Option<Document>, CodecError> {
        let mut len_buf = [0u8; 4];
        let mut filled = 0;
        while filled < len_buf.len() {
            match self.input.read(&mut len_buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(CodecError::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "corpus ended inside a frame header",
                    )))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        let len = u32::from_be_bytes(len_buf) as usize;
        let frame = wire::read_bytes(&mut self.input, len)?;
        codec::decode(&frame).map(Some)
    }
}

impl<R: Read> Iterator for CorpusReader<R> {
    type Item = Result<Document, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Annotation;

    fn docs() -> Vec<Document> {
        (0..3)
            .map(|i| {
                let mut doc = Document::new(format!("https://example.com/{}", i));
                doc.text = Some(format!("document number {}", i));
                doc.annotations.push(Annotation::new("Token", 0, 8));
                doc
            })
            .collect()
    }

    #[test]
    fn test_write_then_read_in_order() {
        let mut writer = CorpusWriter::new(Vec::new());
        for doc in docs() {
            writer.write(&doc).unwrap();
        }
        assert_eq!(writer.written(), 3);
        let bytes = writer.finish().unwrap();

        let read: Vec<Document> = CorpusReader::new(bytes.as_slice())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(read, docs());
    }

    #[test]
    fn test_empty_corpus() {
        let mut reader = CorpusReader::new(&[][..]);
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn test_truncated_frame_is_an_error() {
        let mut writer = CorpusWriter::new(Vec::new());
        for doc in docs() {
            writer.write(&doc).unwrap();
        }
        let bytes = writer.finish().unwrap();

        let cut = &bytes[..bytes.len() - 5];
        let results: Vec<_> = CorpusReader::new(cut).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(results[2].as_ref().unwrap_err().is_truncation());

        let header_only = &bytes[..2];
        let err = CorpusReader::new(header_only).read_next().unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.bin");

        let mut writer = CorpusWriter::create(&path).unwrap();
        for doc in docs() {
            writer.write(&doc).unwrap();
        }
        writer.finish().unwrap();

        let count = CorpusReader::open(&path).unwrap().count();
        assert_eq!(count, 3);
    }
}

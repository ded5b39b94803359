//! WARC archive import source.
//!
//! Reads `.warc` and `.warc.gz` files and turns every `response` record
//! with a 2xx HTTP status into a document: the target URI becomes the URL,
//! the HTTP body the content and the HTTP `Content-Type` the content type.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::DateTime;
use warc::{WarcHeader, WarcReader};

use behemoth::Document;

use crate::{DocumentSink, ImportConfig, ImportError, ImportSource, ImportStats};

/// HTTP response headers extracted from a WARC body.
#[derive(Debug, PartialEq, Eq)]
struct HttpResponseHeaders {
    status: u16,
    content_type: Option<String>,
}

/// Split a WARC response body into HTTP headers and payload.
fn parse_http_response(data: &[u8]) -> Option<(HttpResponseHeaders, &[u8])> {
    let separator = b"\r\n\r\n";
    let sep_pos = data.windows(separator.len()).position(|w| w == separator)?;

    let header_bytes = &data[..sep_pos];
    let body = &data[sep_pos + separator.len()..];

    let header_str = std::str::from_utf8(header_bytes).ok()?;
    let mut lines = header_str.lines();

    // "HTTP/1.1 200 OK"
    let status_line = lines.next()?;
    if !status_line.starts_with("HTTP/") {
        return None;
    }
    let status = status_line.split_whitespace().nth(1)?.parse().ok()?;

    let mut content_type = None;
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case("content-type") {
                content_type = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
        }
    }

    Some((
        HttpResponseHeaders {
            status,
            content_type,
        },
        body,
    ))
}

/// WARC dates normalized to RFC 3339, or kept verbatim when unparsable.
fn normalize_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|_| raw.to_string())
}

pub struct WarcSource {
    warc_path: PathBuf,
    is_gzip: bool,
}

impl WarcSource {
    pub fn new(warc_path: impl Into<PathBuf>) -> Self {
        let warc_path = warc_path.into();
        let is_gzip = warc_path.extension().is_some_and(|ext| ext == "gz");
        Self { warc_path, is_gzip }
    }

    fn open_error(&self, e: impl std::fmt::Display) -> ImportError {
        ImportError::Warc {
            path: self.warc_path.clone(),
            message: e.to_string(),
        }
    }

    fn process_records<R: BufRead>(
        &self,
        reader: WarcReader<R>,
        config: &ImportConfig,
        sink: &mut dyn DocumentSink,
    ) -> Result<ImportStats, ImportError> {
        let mut stats = ImportStats::default();

        for record_result in reader.iter_records() {
            if config.limit_reached(&stats) {
                break;
            }
            stats.scanned += 1;

            let record = match record_result {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!("Skipping malformed record: {}", e);
                    stats.errors += 1;
                    continue;
                }
            };

            let warc_type = record.header(WarcHeader::WarcType);
            if warc_type.as_deref() != Some("response") {
                stats.skipped += 1;
                continue;
            }

            let target_uri = match record.header(WarcHeader::TargetURI) {
                Some(uri) => uri.to_string(),
                None => {
                    stats.skipped += 1;
                    continue;
                }
            };

            if !config.accepts_url(&target_uri) {
                stats.filtered += 1;
                continue;
            }

            let (headers, content) = match parse_http_response(record.body()) {
                Some(parsed) => parsed,
                None => {
                    tracing::debug!("Could not parse HTTP response for {}", target_uri);
                    stats.skipped += 1;
                    continue;
                }
            };

            if !(200..300).contains(&headers.status) || content.is_empty() {
                stats.skipped += 1;
                continue;
            }

            let mut doc = Document::new(target_uri);
            doc.content_type = headers.content_type;
            doc.content = Some(content.to_vec());
            let metadata = doc.metadata_mut();
            metadata.insert("http.status".to_string(), headers.status.to_string());
            if let Some(date) = record.header(WarcHeader::Date) {
                metadata.insert("warc.date".to_string(), normalize_date(&date));
            }

            sink.accept(doc)?;
            stats.imported += 1;
        }

        tracing::debug!(
            "{}: scanned {}, imported {}",
            self.warc_path.display(),
            stats.scanned,
            stats.imported
        );
        Ok(stats)
    }
}

#[async_trait::async_trait]
impl ImportSource for WarcSource {
    fn format_id(&self) -> &'static str {
        "warc"
    }

    fn display_name(&self) -> &str {
        if self.is_gzip {
            "WARC archive (gzip)"
        } else {
            "WARC archive"
        }
    }

    fn source_path(&self) -> &Path {
        &self.warc_path
    }

    async fn run_import(
        &mut self,
        config: &ImportConfig,
        sink: &mut dyn DocumentSink,
    ) -> Result<ImportStats, ImportError> {
        if !self.warc_path.exists() {
            return Err(ImportError::NotFound(self.warc_path.clone()));
        }

        if self.is_gzip {
            let reader = WarcReader::from_path_gzip(&self.warc_path).map_err(|e| self.open_error(e))?;
            self.process_records(reader, config, sink)
        } else {
            let file = File::open(&self.warc_path).map_err(|e| self.open_error(e))?;
            self.process_records(WarcReader::new(BufReader::new(file)), config, sink)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(warc_type: &str, uri: &str, body: &str) -> Vec<u8> {
        let mut out = Vec::new();
        write!(
            out,
            "WARC/1.0\r\n\
             WARC-Type: {}\r\n\
             WARC-Target-URI: {}\r\n\
             WARC-Date: 2024-01-02T03:04:05Z\r\n\
             WARC-Record-ID: <urn:uuid:{:08x}-0000-0000-0000-000000000000>\r\n\
             Content-Type: application/http; msgtype={}\r\n\
             Content-Length: {}\r\n\
             \r\n",
            warc_type,
            uri,
            uri.len(),
            warc_type,
            body.len()
        )
        .unwrap();
        out.extend_from_slice(body.as_bytes());
        out.extend_from_slice(b"\r\n\r\n");
        out
    }

    fn archive() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".warc").tempfile().unwrap();
        let page = "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\n\r\n<p>hi</p>";
        let missing = "HTTP/1.1 404 Not Found\r\nContent-Type: text/html\r\n\r\ngone";
        file.write_all(&record("request", "https://example.com/", "GET / HTTP/1.1\r\n\r\n"))
            .unwrap();
        file.write_all(&record("response", "https://example.com/", page))
            .unwrap();
        file.write_all(&record("response", "https://example.com/missing", missing))
            .unwrap();
        file.write_all(&record("response", "https://other.org/x", page))
            .unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_http_response() {
        let data = b"HTTP/1.1 206 Partial Content\r\ncontent-type: application/pdf\r\n\r\n%PDF";
        let (headers, body) = parse_http_response(data).unwrap();
        assert_eq!(headers.status, 206);
        assert_eq!(headers.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(body, b"%PDF");

        assert!(parse_http_response(b"no separator").is_none());
        assert!(parse_http_response(b"GET / HTTP/1.1\r\n\r\n").is_none());
    }

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("2024-01-02T03:04:05Z"), "2024-01-02T03:04:05+00:00");
        assert_eq!(normalize_date("yesterday"), "yesterday");
    }

    #[tokio::test]
    async fn test_imports_successful_responses() {
        let file = archive();
        let mut source = WarcSource::new(file.path());
        assert_eq!(source.display_name(), "WARC archive");

        let mut docs: Vec<Document> = Vec::new();
        let stats = source
            .run_import(&ImportConfig::default(), &mut docs)
            .await
            .unwrap();

        assert_eq!(stats.scanned, 4);
        assert_eq!(stats.imported, 2);
        assert_eq!(stats.skipped, 2);

        let doc = &docs[0];
        assert_eq!(doc.url, "https://example.com/");
        assert_eq!(doc.content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert_eq!(doc.content.as_deref(), Some(&b"<p>hi</p>"[..]));
        assert_eq!(doc.metadata_value("http.status"), Some("200"));
        assert_eq!(doc.metadata_value("warc.date"), Some("2024-01-02T03:04:05+00:00"));
    }

    #[tokio::test]
    async fn test_url_filter() {
        let file = archive();
        let config = ImportConfig {
            limit: 0,
            url_filter: Some(regex::Regex::new(r"^https://other\.org/").unwrap()),
        };
        let mut docs: Vec<Document> = Vec::new();
        let stats = WarcSource::new(file.path())
            .run_import(&config, &mut docs)
            .await
            .unwrap();
        assert_eq!(stats.filtered, 2);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].url, "https://other.org/x");
    }
}

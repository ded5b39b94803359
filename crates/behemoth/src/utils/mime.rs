//! Content-type normalization and detection.

/// Strip parameters (`; charset=...`) from a content type.
///
/// Idempotent: cleaning an already clean value returns it unchanged.
pub fn clean_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}

/// Guess MIME type from a filename's extension.
pub fn guess_mime_from_filename(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())?;

    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" | "text" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "xhtml" => "application/xhtml+xml",
        "xml" => "application/xml",
        "json" => "application/json",
        "md" => "text/markdown",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "eml" => "message/rfc822",
        "zip" => "application/zip",
        "warc" => "application/warc",
        _ => return None,
    };
    Some(mime)
}

/// Guess MIME type from a URL, stripping query params and fragments first.
pub fn guess_mime_from_url(url: &str) -> Option<&'static str> {
    let path = url.split('?').next().unwrap_or(url);
    let path = path.split('#').next().unwrap_or(path);
    let name = path.rsplit('/').next().unwrap_or(path);
    guess_mime_from_filename(name)
}

/// Detect a content type from raw bytes, falling back to the URL extension.
///
/// Magic bytes win over the extension; content that is valid UTF-8 with no
/// better match is reported as `text/plain`.
pub fn detect_mime_type(content: &[u8], url: &str) -> Option<String> {
    if let Some(kind) = infer::get(content) {
        return Some(kind.mime_type().to_string());
    }
    if let Some(mime) = guess_mime_from_url(url) {
        return Some(mime.to_string());
    }
    if !content.is_empty() && std::str::from_utf8(content).is_ok() {
        return Some("text/plain".to_string());
    }
    None
}

/// MIME type categories driving text extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeCategory {
    Markup,
    Text,
    Other,
}

impl MimeCategory {
    pub fn of(mime: &str) -> Self {
        let mime = clean_mime_type(mime).to_lowercase();
        if mime == "text/html" || mime == "application/xhtml+xml" {
            Self::Markup
        } else if mime.starts_with("text/") || mime == "application/json" {
            Self::Text
        } else {
            Self::Other
        }
    }
}

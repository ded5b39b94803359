//! Text and metadata extraction from raw content.
//!
//! HTML is parsed with `scraper`. The visible body text becomes the document
//! text, `<title>` and `<meta>` tags go into metadata, and every element of
//! the body is turned into an annotation: the tag name is the type, the
//! attributes are the features and the offsets span the text the element
//! produced. Plain text content is decoded as UTF-8. Anything else is left
//! for a dedicated extractor.

use std::collections::BTreeMap;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};

use behemoth::config::keys::{EXTRACT_ANNOTATIONS, EXTRACT_METADATA};
use behemoth::utils::{clean_mime_type, detect_mime_type, MimeCategory};
use behemoth::{Annotation, Configuration, Document};

use super::annotator::Annotator;
use super::engine::EngineGuard;
use super::types::{AnnotationError, AnnotationOutcome};

/// Elements whose content never reaches the text.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start and end on their own line.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// What the markup engine returns for one document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Extraction {
    pub text: String,
    pub metadata: BTreeMap<String, String>,
    pub annotations: Vec<Annotation>,
}

/// HTML extraction engine.
pub struct MarkupEngine {
    title: Option<Selector>,
    meta: Option<Selector>,
    body: Option<Selector>,
    with_annotations: bool,
    with_metadata: bool,
}

impl MarkupEngine {
    pub fn new(with_annotations: bool, with_metadata: bool) -> Self {
        Self {
            title: Selector::parse("title").ok(),
            meta: Selector::parse("meta[content]").ok(),
            body: Selector::parse("body").ok(),
            with_annotations,
            with_metadata,
        }
    }

    pub fn extract(&self, html: &str) -> Extraction {
        let document = Html::parse_document(html);
        let mut extraction = Extraction::default();

        if self.with_metadata {
            self.extract_metadata(&document, &mut extraction.metadata);
        }

        let root = self
            .body
            .as_ref()
            .and_then(|selector| document.select(selector).next())
            .unwrap_or_else(|| document.root_element());

        let mut writer = TextWriter::default();
        self.walk(root, &mut writer, &mut extraction.annotations);
        writer.trim_end();

        // Trailing line breaks are gone; nothing may point past the text.
        let len = writer.offset() as i64;
        for annotation in &mut extraction.annotations {
            annotation.start = annotation.start.min(len);
            annotation.end = annotation.end.min(len);
        }
        extraction.text = writer.into_text();
        extraction
    }

    fn extract_metadata(&self, document: &Html, metadata: &mut BTreeMap<String, String>) {
        if let Some(selector) = &self.title {
            let title = document
                .select(selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty());
            if let Some(title) = title {
                metadata.insert("title".to_string(), title);
            }
        }

        if let Some(selector) = &self.meta {
            for el in document.select(selector) {
                let element = el.value();
                let key = element.attr("name").or_else(|| element.attr("property"));
                if let (Some(key), Some(content)) = (key, element.attr("content")) {
                    let content = content.trim();
                    if !content.is_empty() {
                        metadata.insert(key.to_lowercase(), content.to_string());
                    }
                }
            }
        }
    }

    /// Depth-first walk over the element tree with an explicit stack, so
    /// nesting depth is bounded by the heap and not the thread stack.
    fn walk(&self, root: ElementRef<'_>, out: &mut TextWriter, annotations: &mut Vec<Annotation>) {
        let mut stack = vec![(root.children(), None::<OpenElement>)];

        loop {
            let next = match stack.last_mut() {
                Some((children, _)) => children.next(),
                None => break,
            };
            let Some(node) = next else {
                if let Some((_, Some(open))) = stack.pop() {
                    if let Some(slot) = open.slot {
                        annotations[slot].end = out.offset() as i64;
                    }
                    if open.block {
                        out.break_line();
                    }
                }
                continue;
            };

            match node.value() {
                Node::Text(text) => out.push_text(text),
                Node::Element(_) => {
                    let Some(child) = ElementRef::wrap(node) else {
                        continue;
                    };
                    let name = child.value().name();
                    if SKIPPED_ELEMENTS.contains(&name) {
                        continue;
                    }
                    let block = BLOCK_ELEMENTS.contains(&name);
                    if block {
                        out.break_line();
                    } else {
                        out.flush_space();
                    }

                    // Reserved on entry so parents precede their children.
                    let slot = self.with_annotations.then(|| {
                        let start = out.offset() as i64;
                        let mut annotation = Annotation::new(name, start, start);
                        for (key, value) in child.value().attrs() {
                            annotation.features.insert(key.to_string(), value.to_string());
                        }
                        annotations.push(annotation);
                        annotations.len() - 1
                    });
                    stack.push((child.children(), Some(OpenElement { slot, block })));
                }
                _ => {}
            }
        }
    }
}

/// An element whose children are being walked.
struct OpenElement {
    /// Index of its annotation, when annotations are emitted.
    slot: Option<usize>,
    block: bool,
}

/// Accumulates normalized text while tracking its length in UTF-16 units.
#[derive(Default)]
struct TextWriter {
    text: String,
    units: usize,
    pending_space: bool,
}

impl TextWriter {
    fn offset(&self) -> usize {
        self.units
    }

    fn push_char(&mut self, c: char) {
        self.text.push(c);
        self.units += c.len_utf16();
    }

    fn at_line_start(&self) -> bool {
        self.text.is_empty() || self.text.ends_with('\n')
    }

    fn flush_space(&mut self) {
        if self.pending_space && !self.at_line_start() {
            self.push_char(' ');
        }
        self.pending_space = false;
    }

    fn push_text(&mut self, raw: &str) {
        for c in raw.chars() {
            if c.is_whitespace() {
                self.pending_space = true;
            } else {
                self.flush_space();
                self.push_char(c);
            }
        }
    }

    fn break_line(&mut self) {
        if !self.at_line_start() {
            self.push_char('\n');
        }
        self.pending_space = false;
    }

    fn trim_end(&mut self) {
        while self.text.ends_with('\n') {
            self.text.pop();
            self.units -= 1;
        }
    }

    fn into_text(self) -> String {
        self.text
    }
}

/// Fills in document text from raw content.
pub struct TextExtractor {
    engine: EngineGuard<MarkupEngine>,
}

impl TextExtractor {
    pub fn new(with_annotations: bool, with_metadata: bool) -> Self {
        Self {
            engine: EngineGuard::new("markup", MarkupEngine::new(with_annotations, with_metadata)),
        }
    }

    pub fn from_config(conf: &Configuration) -> Result<Self, AnnotationError> {
        Ok(Self::new(
            conf.get_bool(EXTRACT_ANNOTATIONS, true)?,
            conf.get_bool(EXTRACT_METADATA, true)?,
        ))
    }

    /// Content type to extract with: the declared one, else sniffed from
    /// the bytes and the URL.
    fn resolve_content_type(doc: &Document, content: &[u8]) -> Option<String> {
        doc.content_type
            .as_deref()
            .map(clean_mime_type)
            .filter(|ct| !ct.is_empty())
            .map(str::to_string)
            .or_else(|| detect_mime_type(content, &doc.url))
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(true, true)
    }
}

#[async_trait]
impl Annotator for TextExtractor {
    fn name(&self) -> &str {
        "Text extraction"
    }

    async fn annotate(&self, doc: &mut Document) -> Result<AnnotationOutcome, AnnotationError> {
        if doc.text.as_deref().is_some_and(|t| !t.is_empty()) {
            return Ok(AnnotationOutcome::Skipped);
        }
        let Some(content) = doc.content.as_deref().filter(|c| !c.is_empty()) else {
            return Ok(AnnotationOutcome::Skipped);
        };
        let Some(content_type) = Self::resolve_content_type(doc, content) else {
            tracing::debug!("No content type for {}", doc.url);
            return Ok(AnnotationOutcome::Skipped);
        };

        let extraction = match MimeCategory::of(&content_type) {
            MimeCategory::Markup => {
                let html = String::from_utf8_lossy(content);
                self.engine.with(|engine| engine.extract(&html)).await
            }
            MimeCategory::Text => Extraction {
                text: String::from_utf8_lossy(content).into_owned(),
                ..Default::default()
            },
            MimeCategory::Other => {
                tracing::debug!("Skipping {} ({})", doc.url, content_type);
                return Ok(AnnotationOutcome::Skipped);
            }
        };

        let added = extraction.annotations.len();
        doc.content_type = Some(content_type);
        doc.text = Some(extraction.text);
        if !extraction.metadata.is_empty() {
            doc.metadata_mut().extend(extraction.metadata);
        }
        doc.annotations.extend(extraction.annotations);
        Ok(AnnotationOutcome::Annotated(added))
    }
}

//! Well-known configuration keys.

/// Prefix of metadata patterns a document must match to be kept.
pub const FILTER_MD_KEEP_PREFIX: &str = "document.filter.md.keep.";
/// Prefix of metadata patterns that cause a document to be skipped.
pub const FILTER_MD_SKIP_PREFIX: &str = "document.filter.md.skip.";
/// Regex the document URL must fully match.
pub const FILTER_URL_KEEP: &str = "document.filter.url.keep";
/// Regex the content type must fully match.
pub const FILTER_MIMETYPE_KEEP: &str = "document.filter.mimetype.keep";

pub const SPLITTER_TYPE: &str = "document.splitter.type";
pub const SPLITTER_FEATURE: &str = "document.splitter.feature";
pub const SPLITTER_VALUE: &str = "document.splitter.value";
pub const SPLITTER_KEEP_METADATA: &str = "document.splitter.keep.metadata";

pub const STAGE_CLEAR_ANNOTATIONS: &str = "stage.clear.annotations";
pub const STAGE_CLEAR_METADATA: &str = "stage.clear.metadata";
pub const STAGE_DROP_CONTENT: &str = "stage.drop.content";

pub const EXTRACT_ANNOTATIONS: &str = "extract.annotations";
pub const EXTRACT_METADATA: &str = "extract.metadata";

/// Prefix of `annotate.pattern.<Type> = <regex>` entity rules.
pub const ANNOTATE_PATTERN_PREFIX: &str = "annotate.pattern.";

pub const LANG_METADATA_KEY: &str = "lang.metadata.key";
pub const LANG_MIN_TEXT_LENGTH: &str = "lang.min.text.length";

/// Prefix of `export.field.<name> = <Type>.<feature>` mappings.
pub const EXPORT_FIELD_PREFIX: &str = "export.field.";

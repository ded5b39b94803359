//! Size summaries for corpus files.

use std::fmt;

const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];

/// Byte count in binary units, one decimal above bytes.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Size of a corpus file and the records it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusSize {
    pub bytes: u64,
    pub records: u64,
}

impl CorpusSize {
    /// Mean frame size, length prefix included.
    pub fn mean_record(&self) -> Option<u64> {
        (self.records > 0).then(|| self.bytes / self.records)
    }
}

impl fmt::Display for CorpusSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_size(self.bytes))?;
        match self.mean_record() {
            Some(mean) => write!(f, " ({} records, ~{} each)", self.records, format_size(mean)),
            None => write!(f, " (empty)"),
        }
    }
}

//! UTF-16 offset helpers.
//!
//! Annotation offsets count UTF-16 code units, the unit the external
//! annotation engines report in. Rust strings are UTF-8, so every lookup
//! of covered text goes through these conversions.

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Byte offset of the UTF-16 position `offset`, or `None` if it is past the
/// end or falls inside a surrogate pair.
pub fn utf16_to_byte_offset(text: &str, offset: usize) -> Option<usize> {
    let mut units = 0usize;
    for (idx, ch) in text.char_indices() {
        if units == offset {
            return Some(idx);
        }
        if units > offset {
            return None;
        }
        units += ch.len_utf16();
    }
    (units == offset).then_some(text.len())
}

/// Slice `text` by UTF-16 offsets `[start, end)`.
pub fn utf16_slice(text: &str, start: i64, end: i64) -> Option<&str> {
    if start < 0 || end < start {
        return None;
    }
    let from = utf16_to_byte_offset(text, start as usize)?;
    let to = utf16_to_byte_offset(text, end as usize)?;
    text.get(from..to)
}

/// Converts increasing byte offsets of one text into UTF-16 offsets in a
/// single forward pass.
#[derive(Debug, Clone)]
pub struct Utf16Cursor<'a> {
    text: &'a str,
    byte: usize,
    units: usize,
}

impl<'a> Utf16Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            units: 0,
        }
    }

    /// UTF-16 offset of byte offset `byte`. Offsets must not go backwards;
    /// an earlier offset restarts the scan from the beginning.
    pub fn offset_of(&mut self, byte: usize) -> usize {
        if byte < self.byte {
            self.byte = 0;
            self.units = 0;
        }
        let byte = byte.min(self.text.len());
        if let Some(slice) = self.text.get(self.byte..byte) {
            self.units += utf16_len(slice);
            self.byte = byte;
        }
        self.units
    }
}

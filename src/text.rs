//! Legacy text TRM codec
//!
//! The legacy format is line-oriented `key = value` content. Blank lines
//! and `#` comment lines are ignored on read. Later duplicate keys
//! overwrite earlier values.

use crate::document::{TextDocument, TrmError};

/// Parses and serializes the legacy `key = value` format
pub struct TextCodec;

impl TextCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self
    }

    /// Parse legacy text TRM content into an ordered mapping.
    ///
    /// A NUL byte anywhere in the input means the content is binary, not
    /// legacy text, and is reported as such instead of as a parse error.
    pub fn parse(&self, text: &str) -> Result<TextDocument, TrmError> {
        if text.contains('\0') {
            return Err(TrmError::BinaryContentDetected);
        }

        let mut document = TextDocument::new();
        for (line_num, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Split on the first '=' only; values may contain more
            let Some((key, value)) = line.split_once('=') else {
                return Err(TrmError::InvalidTextLine {
                    line_number: line_num + 1,
                    line: raw_line.to_string(),
                });
            };
            document.insert(key.trim().to_string(), value.trim().to_string());
        }
        Ok(document)
    }

    /// Serialize a mapping back to `key = value` lines.
    ///
    /// A trailing newline is appended only when the mapping is non-empty;
    /// an empty mapping serializes to the empty string.
    pub fn serialize(&self, document: &TextDocument) -> String {
        let lines: Vec<String> = document
            .iter()
            .map(|(key, value)| format!("{} = {}", key, value))
            .collect();
        if lines.is_empty() {
            String::new()
        } else {
            lines.join("\n") + "\n"
        }
    }
}

impl Default for TextCodec {
    fn default() -> Self {
        Self::new()
    }
}

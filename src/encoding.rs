//! Multi-encoding text decoding
//!
//! Legacy text TRM files show up in more than one encoding in the wild.
//! Instead of retry logic scattered through the read path, decoding is an
//! ordered list of pure attempts: the first candidate that decodes the
//! whole buffer wins.

use crate::document::TrmError;
use std::borrow::Cow;

/// A candidate text encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Strict UTF-8, no replacement characters
    Utf8,
    /// Windows code page 1252
    Windows1252,
    /// ISO-8859-1: every byte maps to U+0000..=U+00FF, so this candidate
    /// cannot fail
    Latin1,
}

impl TextEncoding {
    /// Attempt to decode the buffer with this encoding. Returns `None`
    /// when any byte sequence is invalid for the encoding.
    pub fn try_decode(&self, data: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => encoding_rs::UTF_8
                .decode_without_bom_handling_and_without_replacement(data)
                .map(Cow::into_owned),
            TextEncoding::Windows1252 => encoding_rs::WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(data)
                .map(Cow::into_owned),
            TextEncoding::Latin1 => Some(data.iter().map(|&b| b as char).collect()),
        }
    }
}

/// Decodes byte buffers by trying candidate encodings in order
pub struct EncodingResolver {
    candidates: Vec<TextEncoding>,
}

impl EncodingResolver {
    /// Create a resolver with the default candidate order: strict UTF-8,
    /// then Windows-1252, then Latin-1 as the terminal fallback
    pub fn new() -> Self {
        Self {
            candidates: vec![
                TextEncoding::Utf8,
                TextEncoding::Windows1252,
                TextEncoding::Latin1,
            ],
        }
    }

    /// Create a resolver with a custom candidate list
    pub fn with_candidates(candidates: Vec<TextEncoding>) -> Self {
        Self { candidates }
    }

    /// Decode the buffer with the first candidate that accepts it.
    ///
    /// With the default candidate list this never fails; a custom list
    /// without a terminal fallback reports `UnsupportedEncoding` once
    /// every candidate has been exhausted.
    pub fn decode(&self, data: &[u8]) -> Result<String, TrmError> {
        for encoding in &self.candidates {
            if let Some(text) = encoding.try_decode(data) {
                return Ok(text);
            }
        }
        Err(TrmError::UnsupportedEncoding)
    }
}

impl Default for EncodingResolver {
    fn default() -> Self {
        Self::new()
    }
}

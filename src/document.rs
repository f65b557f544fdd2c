//! TRM document model

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// Binary TRM layout constants
pub const ENTRY_SIZE: usize = 6692;
pub const FOOTER_FLOAT_COUNT: usize = 8;
pub const FOOTER_SIZE: usize = FOOTER_FLOAT_COUNT * 4;
pub const ENTRIES_OFFSET: usize = 4; // entries start right after the u32 count
pub const NAME_SIZE: usize = 32;
pub const HEADER_FIELD_COUNT: usize = 10;
pub const HEADER_FIELD_OFFSET: usize = 0x20;
pub const POSITION_OFFSET: usize = 0x54;

/// JSON key that bypasses structural encoding and emits the decoded
/// base64 bytes verbatim
pub const RAW_OVERRIDE_KEY: &str = "__raw_binary_base64";

/// One fixed-size record of a binary TRM file.
///
/// The decoded fields are editable views over the entry bytes. The
/// `raw_entry_base64` blob is the authoritative representation: encoding
/// starts from it and patches the named fields into a copy, so reserved
/// regions past offset 0x60 survive an edit cycle untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    pub name: String,
    pub difficulty: u32,
    pub time_flag: u32,
    pub stage_index: u32,
    pub group: u32,
    pub flags: u32,
    pub value: u32,
    pub count: u32,
    pub pass_value: u32,
    pub rate_u32: u32,
    pub zero_unused: u32,
    /// `rate_u32` reinterpreted as an IEEE-754 float32. Takes precedence
    /// over `rate_u32` when both are supplied to the encoder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f32>,
    pub position: Position,
    /// Base64 of the full original entry bytes, exactly [`ENTRY_SIZE`]
    /// once decoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_entry_base64: Option<String>,
}

impl Entry {
    /// The header value written back into the rate field: the bit pattern
    /// of `rate` when present, otherwise the stored `rate_u32`
    pub fn effective_rate_u32(&self) -> u32 {
        match self.rate {
            Some(rate) => rate.to_bits(),
            None => self.rate_u32,
        }
    }
}

/// Entry position, three little-endian float32 at offset 0x54
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Trailing block of 8 float32 values following the last entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footer {
    pub floats: Vec<f32>,
}

impl Default for Footer {
    fn default() -> Self {
        Self {
            floats: vec![0.0; FOOTER_FLOAT_COUNT],
        }
    }
}

/// A fully decoded binary TRM file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryDocument {
    /// Declared entry count. Always present after a decode; when supplied
    /// on encode it must agree with `entries.len()`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<u32>,
    pub entries: Vec<Entry>,
    pub footer: Footer,
}

/// Legacy text TRM content: a `key = value` mapping with insertion order
/// preserved for deterministic serialization
pub type TextDocument = IndexMap<String, String>;

/// Result of reading a TRM byte stream, chosen by structural probing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TrmDocument {
    Binary(BinaryDocument),
    Text(TextDocument),
}

/// Result of encoding a structured JSON value back into TRM form
#[derive(Debug, Clone, PartialEq)]
pub enum TrmOutput {
    /// Binary TRM bytes, or raw-override bytes passed through verbatim
    Bytes(Vec<u8>),
    /// Serialized legacy text TRM content
    Text(String),
}

/// Error type for TRM conversions
#[derive(Debug, Clone, PartialEq)]
pub enum TrmError {
    /// The byte stream does not match the fixed binary layout
    MalformedBinaryLayout { reason: String },

    /// Text parse input contains a NUL byte, so the content is binary
    /// rather than a legacy text TRM
    BinaryContentDetected,

    /// A non-comment text line has no `=` separator
    InvalidTextLine { line_number: usize, line: String },

    /// Every candidate encoding failed to decode the input
    UnsupportedEncoding,

    /// A field supplied to the encoder is out of range or inconsistent
    InvalidFieldValue { field: String, reason: String },
}

impl std::fmt::Display for TrmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrmError::MalformedBinaryLayout { reason } => {
                write!(f, "Malformed binary TRM layout: {}", reason)
            }
            TrmError::BinaryContentDetected => {
                write!(
                    f,
                    "TRM content appears to be binary (contains NUL bytes) \
                     and does not match the binary layout"
                )
            }
            TrmError::InvalidTextLine { line_number, line } => {
                write!(f, "Line {} is missing '=': {:?}", line_number, line)
            }
            TrmError::UnsupportedEncoding => {
                write!(f, "No candidate encoding could decode the input")
            }
            TrmError::InvalidFieldValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for TrmError {}

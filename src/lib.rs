//! # trm-codec
//!
//! Codec for the TRM training-scenario file format, converting between
//! the proprietary binary layout, a legacy text variant, and JSON.
//!
//! ## Binary TRM Format
//!
//! A binary TRM file is a little-endian fixed layout:
//!
//! ```text
//! u32 entry_count
//! entry_count x 6692-byte entries
//! 8 x float32 footer
//! ```
//!
//! Each entry decodes a NUL-padded ASCII name, ten u32 header fields,
//! and a float32 position, and keeps the full original entry bytes as
//! base64 so re-encoding is lossless: edits patch the named fields into
//! a copy of the raw blob, leaving reserved regions untouched.
//!
//! ## Legacy Text Format
//!
//! The older text variant is line-oriented `key = value` content:
//!
//! ```text
//! # comment
//! name = Example
//! value = 42
//! ```
//!
//! ## Format Detection
//!
//! Reads probe the byte stream structurally: the buffer is binary TRM
//! only when its length matches the declared entry count exactly,
//! otherwise it is decoded as text through an ordered encoding fallback
//! chain (UTF-8, Windows-1252, Latin-1) and parsed as `key = value`
//! lines.
//!
//! ## Raw Override
//!
//! A JSON object carrying only a `__raw_binary_base64` field round-trips
//! any file byte-for-byte without structural interpretation.

pub mod binary;
pub mod convert;
pub mod document;
pub mod encoding;
pub mod text;

pub use binary::BinaryCodec;
pub use convert::Converter;
pub use document::{
    BinaryDocument, Entry, Footer, Position, TextDocument, TrmDocument, TrmError, TrmOutput,
    ENTRY_SIZE, FOOTER_FLOAT_COUNT, NAME_SIZE, RAW_OVERRIDE_KEY,
};
pub use encoding::{EncodingResolver, TextEncoding};
pub use text::TextCodec;

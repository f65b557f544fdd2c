//! Format detection and conversion dispatch
//!
//! Reads probe the byte stream structurally, never by file extension: a
//! buffer whose length matches the declared entry count exactly is binary
//! TRM, anything else is decoded as text and parsed as the legacy
//! `key = value` format. Writes dispatch on the shape of the JSON value,
//! with a raw-override escape hatch that passes base64 bytes through
//! untouched.

use crate::binary::BinaryCodec;
use crate::document::{
    BinaryDocument, TextDocument, TrmDocument, TrmError, TrmOutput, RAW_OVERRIDE_KEY,
};
use crate::encoding::EncodingResolver;
use crate::text::TextCodec;
use base64::Engine;

/// Render a scalar JSON value the way it appears in a text TRM line
fn stringify_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Converts between TRM byte streams and structured documents
pub struct Converter {
    resolver: EncodingResolver,
}

impl Converter {
    /// Create a converter with the default encoding fallback chain
    pub fn new() -> Self {
        Self {
            resolver: EncodingResolver::new(),
        }
    }

    /// Create a converter with a custom encoding resolver
    pub fn with_resolver(resolver: EncodingResolver) -> Self {
        Self { resolver }
    }

    /// Decode a TRM byte stream, choosing the codec by structural probing.
    ///
    /// The binary attempt is all-or-nothing: any layout failure discards
    /// partial results and falls through to the text path, whose errors
    /// then propagate unmodified.
    pub fn decode(&self, data: &[u8]) -> Result<TrmDocument, TrmError> {
        match BinaryCodec::new().decode(data) {
            Ok(document) => Ok(TrmDocument::Binary(document)),
            Err(TrmError::MalformedBinaryLayout { .. }) => {
                let text = self.resolver.decode(data)?;
                Ok(TrmDocument::Text(TextCodec::new().parse(&text)?))
            }
            Err(other) => Err(other),
        }
    }

    /// Encode a structured JSON value into TRM output, dispatching on its
    /// shape: raw override first, then binary (an `entries` array), then
    /// the flat text mapping.
    pub fn encode(&self, value: &serde_json::Value) -> Result<TrmOutput, TrmError> {
        let Some(object) = value.as_object() else {
            return Err(TrmError::InvalidFieldValue {
                field: "root".to_string(),
                reason: "JSON root must be an object".to_string(),
            });
        };

        if let Some(raw) = object.get(RAW_OVERRIDE_KEY) {
            let Some(encoded) = raw.as_str() else {
                return Err(TrmError::InvalidFieldValue {
                    field: RAW_OVERRIDE_KEY.to_string(),
                    reason: "must be a base64 string".to_string(),
                });
            };
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| TrmError::InvalidFieldValue {
                    field: RAW_OVERRIDE_KEY.to_string(),
                    reason: e.to_string(),
                })?;
            return Ok(TrmOutput::Bytes(bytes));
        }

        if object.contains_key("entries") {
            let document: BinaryDocument = serde_json::from_value(value.clone())
                .map_err(|e| TrmError::InvalidFieldValue {
                    field: "entries".to_string(),
                    reason: e.to_string(),
                })?;
            return Ok(TrmOutput::Bytes(BinaryCodec::new().encode(&document)?));
        }

        let mut document = TextDocument::new();
        for (key, val) in object {
            document.insert(key.clone(), stringify_value(val));
        }
        Ok(TrmOutput::Text(TextCodec::new().serialize(&document)))
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

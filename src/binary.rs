//! Binary TRM codec
//!
//! Layout (little-endian):
//!
//! ```text
//! 0x00            u32 entry_count
//! 0x04 + i*6692   entry i:
//!   0x00            name, 32 bytes, NUL-padded ASCII
//!   0x20            10 x u32 header fields
//!   0x54            3 x float32 position
//!   0x60..end       reserved tail, preserved verbatim
//! after entries   8 x float32 footer
//! ```
//!
//! Decoding keeps each entry's full byte blob; encoding patches the named
//! fields into a copy of that blob so the reserved tail round-trips
//! byte-exactly.

use crate::document::{
    BinaryDocument, Entry, Footer, Position, TrmError, ENTRIES_OFFSET, ENTRY_SIZE,
    FOOTER_FLOAT_COUNT, FOOTER_SIZE, HEADER_FIELD_COUNT, HEADER_FIELD_OFFSET, NAME_SIZE,
    POSITION_OFFSET,
};
use base64::Engine;

fn le_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn le_f32(data: &[u8], offset: usize) -> f32 {
    f32::from_bits(le_u32(data, offset))
}

/// Decode the NUL-padded ASCII name field, dropping non-ASCII bytes
fn read_cstring(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    data[..end]
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| b as char)
        .collect()
}

/// Decodes and encodes the fixed binary TRM layout
pub struct BinaryCodec;

impl BinaryCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self
    }

    /// Decode a full binary TRM byte stream.
    ///
    /// The buffer length must equal `4 + entry_count*6692 + 32` exactly;
    /// a buffer that is merely large enough is rejected so trailing
    /// garbage never passes as binary.
    pub fn decode(&self, data: &[u8]) -> Result<BinaryDocument, TrmError> {
        if data.len() < ENTRIES_OFFSET + FOOTER_SIZE {
            return Err(TrmError::MalformedBinaryLayout {
                reason: format!("{} bytes is too small for a binary TRM", data.len()),
            });
        }

        let entry_count = le_u32(data, 0);
        let expected = (entry_count as usize)
            .checked_mul(ENTRY_SIZE)
            .and_then(|n| n.checked_add(ENTRIES_OFFSET + FOOTER_SIZE))
            .ok_or_else(|| TrmError::MalformedBinaryLayout {
                reason: format!("entry count {} overflows the layout size", entry_count),
            })?;
        if data.len() != expected {
            return Err(TrmError::MalformedBinaryLayout {
                reason: format!(
                    "expected {} bytes for {} entries, got {}",
                    expected,
                    entry_count,
                    data.len()
                ),
            });
        }

        let mut entries = Vec::with_capacity(entry_count as usize);
        for i in 0..entry_count as usize {
            let offset = ENTRIES_OFFSET + i * ENTRY_SIZE;
            entries.push(self.decode_entry(&data[offset..offset + ENTRY_SIZE]));
        }

        let footer_offset = ENTRIES_OFFSET + entry_count as usize * ENTRY_SIZE;
        let floats = (0..FOOTER_FLOAT_COUNT)
            .map(|i| le_f32(data, footer_offset + i * 4))
            .collect();

        Ok(BinaryDocument {
            entry_count: Some(entry_count),
            entries,
            footer: Footer { floats },
        })
    }

    /// Decode a single entry from its 6692-byte slice
    fn decode_entry(&self, entry_bytes: &[u8]) -> Entry {
        let mut header = [0u32; HEADER_FIELD_COUNT];
        for (i, field) in header.iter_mut().enumerate() {
            *field = le_u32(entry_bytes, HEADER_FIELD_OFFSET + i * 4);
        }

        Entry {
            name: read_cstring(&entry_bytes[..NAME_SIZE]),
            difficulty: header[0],
            time_flag: header[1],
            stage_index: header[2],
            group: header[3],
            flags: header[4],
            value: header[5],
            count: header[6],
            pass_value: header[7],
            rate_u32: header[8],
            zero_unused: header[9],
            rate: Some(f32::from_bits(header[8])),
            position: Position {
                x: le_f32(entry_bytes, POSITION_OFFSET),
                y: le_f32(entry_bytes, POSITION_OFFSET + 4),
                z: le_f32(entry_bytes, POSITION_OFFSET + 8),
            },
            raw_entry_base64: Some(
                base64::engine::general_purpose::STANDARD.encode(entry_bytes),
            ),
        }
    }

    /// Encode a document back into binary TRM bytes
    pub fn encode(&self, document: &BinaryDocument) -> Result<Vec<u8>, TrmError> {
        if let Some(declared) = document.entry_count {
            if declared as usize != document.entries.len() {
                return Err(TrmError::InvalidFieldValue {
                    field: "entry_count".to_string(),
                    reason: format!(
                        "declared {} but {} entries were supplied",
                        declared,
                        document.entries.len()
                    ),
                });
            }
        }
        if document.footer.floats.len() != FOOTER_FLOAT_COUNT {
            return Err(TrmError::InvalidFieldValue {
                field: "footer.floats".to_string(),
                reason: format!(
                    "must contain {} values, got {}",
                    FOOTER_FLOAT_COUNT,
                    document.footer.floats.len()
                ),
            });
        }

        let mut buffer =
            Vec::with_capacity(ENTRIES_OFFSET + document.entries.len() * ENTRY_SIZE + FOOTER_SIZE);
        buffer.extend_from_slice(&(document.entries.len() as u32).to_le_bytes());

        for entry in &document.entries {
            buffer.extend_from_slice(&self.encode_entry(entry)?);
        }

        for value in &document.footer.floats {
            buffer.extend_from_slice(&value.to_le_bytes());
        }

        Ok(buffer)
    }

    /// Encode one entry by patching its named fields into the raw blob
    fn encode_entry(&self, entry: &Entry) -> Result<Vec<u8>, TrmError> {
        let mut raw = self.entry_template(entry)?;

        let name_bytes: Vec<u8> = entry
            .name
            .chars()
            .filter(char::is_ascii)
            .map(|c| c as u8)
            .collect();
        if name_bytes.len() >= NAME_SIZE {
            return Err(TrmError::InvalidFieldValue {
                field: "name".to_string(),
                reason: format!("must be shorter than {} bytes", NAME_SIZE),
            });
        }

        // Name is NUL-padded, so clear the whole region first
        raw[..NAME_SIZE].fill(0);
        raw[..name_bytes.len()].copy_from_slice(&name_bytes);

        let header = [
            entry.difficulty,
            entry.time_flag,
            entry.stage_index,
            entry.group,
            entry.flags,
            entry.value,
            entry.count,
            entry.pass_value,
            entry.effective_rate_u32(),
            entry.zero_unused,
        ];
        for (i, value) in header.iter().enumerate() {
            let offset = HEADER_FIELD_OFFSET + i * 4;
            raw[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }

        let position = [entry.position.x, entry.position.y, entry.position.z];
        for (i, value) in position.iter().enumerate() {
            let offset = POSITION_OFFSET + i * 4;
            raw[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }

        Ok(raw)
    }

    /// The byte buffer an entry is patched into: the decoded raw blob when
    /// present, otherwise a zero-filled template
    fn entry_template(&self, entry: &Entry) -> Result<Vec<u8>, TrmError> {
        let Some(encoded) = &entry.raw_entry_base64 else {
            return Ok(vec![0u8; ENTRY_SIZE]);
        };

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| TrmError::InvalidFieldValue {
                field: "raw_entry_base64".to_string(),
                reason: e.to_string(),
            })?;
        if decoded.len() != ENTRY_SIZE {
            return Err(TrmError::InvalidFieldValue {
                field: "raw_entry_base64".to_string(),
                reason: format!("must decode to {} bytes, got {}", ENTRY_SIZE, decoded.len()),
            });
        }
        Ok(decoded)
    }
}

impl Default for BinaryCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build one entry blob with a marker-filled reserved tail
    pub fn build_entry_bytes(name: &str) -> Vec<u8> {
        let mut raw = vec![0u8; ENTRY_SIZE];
        raw[..name.len()].copy_from_slice(name.as_bytes());

        let header: [u32; HEADER_FIELD_COUNT] = [
            0,                  // difficulty
            0,                  // time_flag
            1,                  // stage_index
            2,                  // group
            1,                  // flags
            700,                // value
            5,                  // count
            100,                // pass_value
            0.05f32.to_bits(),  // rate_u32
            0,                  // zero_unused
        ];
        for (i, value) in header.iter().enumerate() {
            let offset = HEADER_FIELD_OFFSET + i * 4;
            raw[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }
        for (i, value) in [1.0f32, 2.0, 3.0].iter().enumerate() {
            let offset = POSITION_OFFSET + i * 4;
            raw[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }

        for byte in raw.iter_mut().skip(0x60) {
            *byte = 0xAA;
        }
        raw
    }

    /// Build a whole binary TRM file with `entry_count` entries and a
    /// footer of `i * 1.5`
    pub fn build_trm_bytes(entry_count: usize) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&(entry_count as u32).to_le_bytes());
        for i in 0..entry_count {
            data.extend_from_slice(&build_entry_bytes(&format!("Easy/S01/SABO{}", i)));
        }
        for i in 0..FOOTER_FLOAT_COUNT {
            data.extend_from_slice(&(i as f32 * 1.5).to_le_bytes());
        }
        data
    }

    #[test]
    fn test_decode_single_entry() {
        let codec = BinaryCodec::new();
        let document = codec.decode(&build_trm_bytes(1)).unwrap();

        assert_eq!(document.entry_count, Some(1));
        assert_eq!(document.entries.len(), 1);

        let entry = &document.entries[0];
        assert_eq!(entry.name, "Easy/S01/SABO0");
        assert_eq!(entry.difficulty, 0);
        assert_eq!(entry.stage_index, 1);
        assert_eq!(entry.value, 700);
        assert_eq!(entry.count, 5);
        assert_eq!(entry.rate_u32, 0.05f32.to_bits());
        let rate = entry.rate.unwrap();
        assert!((rate - 0.05).abs() / 0.05 < 1e-6);
        assert_eq!(entry.position, Position { x: 1.0, y: 2.0, z: 3.0 });

        let expected: Vec<f32> = (0..FOOTER_FLOAT_COUNT).map(|i| i as f32 * 1.5).collect();
        assert_eq!(document.footer.floats, expected);
    }

    #[test]
    fn test_decode_name_truncates_at_nul() {
        let mut raw = build_entry_bytes("ABC");
        raw[3] = 0;
        raw[4] = b'Z'; // past the NUL, must be ignored
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&raw);
        data.extend_from_slice(&[0u8; FOOTER_SIZE]);

        let document = BinaryCodec::new().decode(&data).unwrap();
        assert_eq!(document.entries[0].name, "ABC");
    }

    #[test]
    fn test_decode_name_drops_non_ascii() {
        let mut raw = build_entry_bytes("AB");
        raw[2] = 0xC3; // stray non-ASCII byte inside the name
        raw[3] = b'C';
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&raw);
        data.extend_from_slice(&[0u8; FOOTER_SIZE]);

        let document = BinaryCodec::new().decode(&data).unwrap();
        assert_eq!(document.entries[0].name, "ABC");
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let result = BinaryCodec::new().decode(&[0u8; 8]);
        assert!(matches!(
            result,
            Err(TrmError::MalformedBinaryLayout { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_length_mismatch() {
        let mut data = build_trm_bytes(1);
        data.push(0); // trailing garbage
        let result = BinaryCodec::new().decode(&data);
        assert!(matches!(
            result,
            Err(TrmError::MalformedBinaryLayout { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_overstated_entry_count() {
        let mut data = build_trm_bytes(1);
        data[0..4].copy_from_slice(&2u32.to_le_bytes());
        let result = BinaryCodec::new().decode(&data);
        assert!(matches!(
            result,
            Err(TrmError::MalformedBinaryLayout { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_huge_entry_count() {
        let mut data = build_trm_bytes(1);
        data[0..4].copy_from_slice(&u32::MAX.to_le_bytes());
        let result = BinaryCodec::new().decode(&data);
        assert!(matches!(
            result,
            Err(TrmError::MalformedBinaryLayout { .. })
        ));
    }

    #[test]
    fn test_encode_decode_roundtrip_is_byte_exact() {
        let codec = BinaryCodec::new();
        let original = build_trm_bytes(2);
        let document = codec.decode(&original).unwrap();
        let encoded = codec.encode(&document).unwrap();
        assert_eq!(encoded, original);

        // A second cycle through decode must also be stable
        let reencoded = codec.encode(&codec.decode(&encoded).unwrap()).unwrap();
        assert_eq!(reencoded, original);
    }

    #[test]
    fn test_edit_preserves_reserved_tail() {
        let codec = BinaryCodec::new();
        let original = build_trm_bytes(1);
        let mut document = codec.decode(&original).unwrap();

        document.entries[0].count = 999;
        document.entries[0].rate = Some(0.1);
        document.entries[0].position.z = 9.5;

        let encoded = codec.encode(&document).unwrap();
        let reparsed = codec.decode(&encoded).unwrap();
        let entry = &reparsed.entries[0];
        assert_eq!(entry.count, 999);
        let rate = entry.rate.unwrap();
        assert!((rate - 0.1).abs() / 0.1 < 1e-6);
        assert_eq!(entry.position.z, 9.5);

        // All bytes past 0x60 are untouched by the field edits
        let entry_offset = ENTRIES_OFFSET;
        assert_eq!(
            &encoded[entry_offset + 0x60..entry_offset + ENTRY_SIZE],
            &original[entry_offset + 0x60..entry_offset + ENTRY_SIZE]
        );
    }

    #[test]
    fn test_encode_rate_bit_pattern() {
        let codec = BinaryCodec::new();
        let document = BinaryDocument {
            entry_count: None,
            entries: vec![Entry {
                rate: Some(0.05),
                ..Default::default()
            }],
            footer: Footer::default(),
        };

        let encoded = codec.encode(&document).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded.entries[0].rate_u32, 0.05f32.to_bits());
    }

    #[test]
    fn test_encode_without_raw_blob_uses_zero_template() {
        let codec = BinaryCodec::new();
        let document = BinaryDocument {
            entry_count: None,
            entries: vec![Entry {
                name: "Fresh".to_string(),
                count: 7,
                ..Default::default()
            }],
            footer: Footer::default(),
        };

        let encoded = codec.encode(&document).unwrap();
        assert_eq!(encoded.len(), ENTRIES_OFFSET + ENTRY_SIZE + FOOTER_SIZE);
        // Reserved tail is all zeroes in a fresh template
        assert!(encoded[ENTRIES_OFFSET + 0x60..ENTRIES_OFFSET + ENTRY_SIZE]
            .iter()
            .all(|&b| b == 0));

        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded.entries[0].name, "Fresh");
        assert_eq!(decoded.entries[0].count, 7);
    }

    #[test]
    fn test_encode_rejects_long_name() {
        let codec = BinaryCodec::new();
        let document = BinaryDocument {
            entry_count: None,
            entries: vec![Entry {
                name: "x".repeat(NAME_SIZE),
                ..Default::default()
            }],
            footer: Footer::default(),
        };

        let result = codec.encode(&document);
        assert!(matches!(
            result,
            Err(TrmError::InvalidFieldValue { ref field, .. }) if field == "name"
        ));
    }

    #[test]
    fn test_encode_rejects_entry_count_mismatch() {
        let codec = BinaryCodec::new();
        let document = BinaryDocument {
            entry_count: Some(2),
            entries: vec![Entry::default()],
            footer: Footer::default(),
        };

        let result = codec.encode(&document);
        assert!(matches!(
            result,
            Err(TrmError::InvalidFieldValue { ref field, .. }) if field == "entry_count"
        ));
    }

    #[test]
    fn test_encode_rejects_short_footer() {
        let codec = BinaryCodec::new();
        let document = BinaryDocument {
            entry_count: None,
            entries: vec![Entry::default()],
            footer: Footer { floats: vec![1.0; 4] },
        };

        let result = codec.encode(&document);
        assert!(matches!(
            result,
            Err(TrmError::InvalidFieldValue { ref field, .. }) if field == "footer.floats"
        ));
    }

    #[test]
    fn test_encode_rejects_bad_raw_blob() {
        let codec = BinaryCodec::new();
        let document = BinaryDocument {
            entry_count: None,
            entries: vec![Entry {
                raw_entry_base64: Some("not base64!!".to_string()),
                ..Default::default()
            }],
            footer: Footer::default(),
        };

        let result = codec.encode(&document);
        assert!(matches!(
            result,
            Err(TrmError::InvalidFieldValue { ref field, .. }) if field == "raw_entry_base64"
        ));
    }

    #[test]
    fn test_encode_rejects_wrong_size_raw_blob() {
        let codec = BinaryCodec::new();
        let document = BinaryDocument {
            entry_count: None,
            entries: vec![Entry {
                raw_entry_base64: Some(
                    base64::engine::general_purpose::STANDARD.encode([0u8; 16]),
                ),
                ..Default::default()
            }],
            footer: Footer::default(),
        };

        let result = codec.encode(&document);
        assert!(matches!(
            result,
            Err(TrmError::InvalidFieldValue { ref field, .. }) if field == "raw_entry_base64"
        ));
    }
}

//! Binary codec for settings files.
//!
//! File format:
//! ```text
//! [magic:4 = "STKS"][version:1][reserved:3][payload_len:4][payload:N]
//! ```
//! Total header size: 12 bytes.  `payload_len` is big-endian.  The payload is
//! the `bincode` encoding of a `BTreeMap<String, SettingValue>`; every value
//! carries its variant index, so types survive the round trip exactly.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::value::SettingValue;

/// Magic bytes at the start of every settings file.
pub const MAGIC: [u8; 4] = *b"STKS";

/// Current file format version byte.
pub const FORMAT_VERSION: u8 = 0x01;

/// Total size of the file header in bytes.
pub const HEADER_SIZE: usize = 12;

/// Errors that can occur while encoding or decoding a settings file.
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    /// The byte slice is shorter than the header.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The file does not start with the settings magic bytes.
    #[error("not a settings file (bad magic bytes)")]
    BadMagic,

    /// The format version in the header is not supported.
    #[error("unsupported settings format version: {0}")]
    UnsupportedVersion(u8),

    /// The header's payload length does not match the data available.
    #[error("payload length mismatch: header says {declared}, available is {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },

    /// Extra bytes follow the declared payload.
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),

    /// The payload could not be (de)serialized.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a settings map into a byte vector including the 12-byte header.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] if `bincode` serialization fails, or if
/// the payload exceeds `u32::MAX` bytes.
pub fn encode_settings(values: &BTreeMap<String, SettingValue>) -> Result<Vec<u8>, CodecError> {
    let payload = bincode::serialize(values).map_err(|e| CodecError::Malformed(e.to_string()))?;
    let payload_len = u32::try_from(payload.len())
        .map_err(|_| CodecError::Malformed(format!("payload too large: {} bytes", payload.len())))?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&MAGIC);
    buf.push(FORMAT_VERSION);
    buf.extend_from_slice(&[0x00; 3]); // reserved
    buf.extend_from_slice(&payload_len.to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decodes a settings map from a complete file image.
///
/// # Errors
///
/// Returns [`CodecError`] if the header is invalid, the length does not match,
/// or the payload cannot be deserialized.
pub fn decode_settings(bytes: &[u8]) -> Result<BTreeMap<String, SettingValue>, CodecError> {
    if bytes.len() < HEADER_SIZE {
        return Err(CodecError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    if bytes[0..4] != MAGIC {
        return Err(CodecError::BadMagic);
    }

    let version = bytes[4];
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    // bytes[5..8] are reserved – ignored on decode

    let payload_len = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    let available = bytes.len() - HEADER_SIZE;
    if available < payload_len {
        return Err(CodecError::PayloadLengthMismatch {
            declared: payload_len,
            available,
        });
    }
    if available > payload_len {
        return Err(CodecError::TrailingBytes(available - payload_len));
    }

    bincode::deserialize(&bytes[HEADER_SIZE..]).map_err(|e| CodecError::Malformed(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BTreeMap<String, SettingValue> {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), SettingValue::from("A"));
        map.insert("abc".to_string(), SettingValue::from(1i32));
        map.insert("ratio".to_string(), SettingValue::from(0.5f64));
        map
    }

    #[test]
    fn test_encode_writes_header() {
        // Act
        let bytes = encode_settings(&sample()).expect("encode");

        // Assert
        assert_eq!(&bytes[0..4], b"STKS");
        assert_eq!(bytes[4], FORMAT_VERSION);
        assert_eq!(&bytes[5..8], &[0, 0, 0]);
        let declared = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        assert_eq!(declared, bytes.len() - HEADER_SIZE);
    }

    #[test]
    fn test_round_trip_preserves_types() {
        let original = sample();
        let bytes = encode_settings(&original).expect("encode");
        let decoded = decode_settings(&bytes).expect("decode");
        assert_eq!(decoded, original);
        assert_eq!(decoded["abc"], SettingValue::Int32(1));
    }

    #[test]
    fn test_empty_map_round_trips() {
        let bytes = encode_settings(&BTreeMap::new()).expect("encode");
        assert!(decode_settings(&bytes).expect("decode").is_empty());
    }

    #[test]
    fn test_decode_short_input_returns_insufficient_data() {
        let err = decode_settings(b"STK").unwrap_err();
        assert_eq!(
            err,
            CodecError::InsufficientData {
                needed: HEADER_SIZE,
                available: 3
            }
        );
    }

    #[test]
    fn test_decode_bad_magic() {
        let mut bytes = encode_settings(&sample()).unwrap();
        bytes[0] = b'X';
        assert_eq!(decode_settings(&bytes).unwrap_err(), CodecError::BadMagic);
    }

    #[test]
    fn test_decode_unknown_version() {
        let mut bytes = encode_settings(&sample()).unwrap();
        bytes[4] = 0x7F;
        assert_eq!(
            decode_settings(&bytes).unwrap_err(),
            CodecError::UnsupportedVersion(0x7F)
        );
    }

    #[test]
    fn test_decode_truncated_payload() {
        let bytes = encode_settings(&sample()).unwrap();
        let truncated = &bytes[..bytes.len() - 1];
        assert!(matches!(
            decode_settings(truncated).unwrap_err(),
            CodecError::PayloadLengthMismatch { .. }
        ));
    }

    #[test]
    fn test_decode_trailing_bytes() {
        let mut bytes = encode_settings(&sample()).unwrap();
        bytes.extend_from_slice(&[1, 2]);
        assert_eq!(decode_settings(&bytes).unwrap_err(), CodecError::TrailingBytes(2));
    }

    #[test]
    fn test_decode_garbage_payload_is_malformed() {
        // Arrange: valid header declaring a 4-byte payload of 0xFF bytes
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC);
        bytes.push(FORMAT_VERSION);
        bytes.extend_from_slice(&[0; 3]);
        bytes.extend_from_slice(&4u32.to_be_bytes());
        bytes.extend_from_slice(&[0xFF; 4]);

        // Act / Assert
        assert!(matches!(
            decode_settings(&bytes).unwrap_err(),
            CodecError::Malformed(_)
        ));
    }
}

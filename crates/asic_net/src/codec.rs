//! MessagePack codec helpers.
//!
//! Thin wrappers around `rmp-serde` for encoding and decoding records. All
//! transport payloads use **named** (map-style) MessagePack encoding, where
//! struct fields are serialised as `{"field_name": value, …}` rather than
//! positional arrays, so any MessagePack decoder in any language can read a
//! record without knowing Rust struct field ordering.

use serde::{Deserialize, Serialize};

use crate::error::NetError;

/// Encode a value to **named** (map-style) MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, NetError> {
    rmp_serde::to_vec_named(value).map_err(NetError::Encode)
}

/// Decode a value from MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Decode`] if deserialisation fails.
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, NetError> {
    rmp_serde::from_slice(bytes).map_err(NetError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Record, RecordOp};

    #[test]
    fn test_record_codec_roundtrip() {
        let record = Record {
            key: "SAI_OBJECT_TYPE_PORT:oid:0x2000000000001".to_string(),
            fields: vec![("SAI_PORT_ATTR_SPEED".to_string(), "40000".to_string())],
            op: RecordOp::Set,
        };
        let bytes = encode(&record).unwrap();
        let restored: Record = decode(&bytes).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_decode_invalid_bytes() {
        let result: Result<Record, _> = decode(&[0xff, 0xff]);
        assert!(result.is_err());
    }
}

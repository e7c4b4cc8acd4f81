//! Hex helpers shared by the wire formats
//!
//! The settlement authority mixes `0x`-prefixed and bare hex, so decoding
//! accepts both while encoding is explicit about which form it produces.

use crate::errors::SerializationError;

/// Strip an optional `0x`/`0X` prefix
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode hex with or without prefix. Case-insensitive.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, SerializationError> {
    Ok(hex::decode(strip_hex_prefix(s.trim()))?)
}

/// Decode hex into a fixed-size array
pub fn decode_hex_array<const N: usize>(s: &str) -> Result<[u8; N], SerializationError> {
    let bytes = decode_hex(s)?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| SerializationError::InvalidLength {
            expected: N,
            actual,
        })
}

/// Lowercase hex with `0x` prefix
pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Serde adapter for byte vectors carried as `0x` hex strings
pub mod serde_hex_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_hex_prefixed(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::decode_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for lists of hex-encoded byte vectors
pub mod serde_hex_vec_list {
    use serde::{ser::SerializeSeq, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&super::to_hex_prefixed(item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        let items = Vec::<String>::deserialize(deserializer)?;
        items
            .iter()
            .map(|s| super::decode_hex(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

//! Serde helper that stores byte blobs as lowercase hex strings.
//!
//! Use with `#[serde(with = "crate::shared::hex_bytes")]`.

use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(bytes))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let encoded = String::deserialize(deserializer)?;
    let trimmed = encoded.strip_prefix("0x").unwrap_or(&encoded);
    hex::decode(trimmed).map_err(serde::de::Error::custom)
}

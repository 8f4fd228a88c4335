//! Serde helpers for remote store rows

/// `#[serde(default = ...)]` for flags that are on unless stated otherwise
pub fn default_true() -> bool {
    true
}

/// Order line arrays stored in a JSON column.
///
/// Rows written by other clients may carry the array as a JSON-encoded
/// string instead of a native array; both forms are accepted, `null` reads
/// as empty. Always written as a native array.
pub mod json_lines {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::order::OrderLine;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Lines(Vec<OrderLine>),
        Encoded(String),
    }

    pub fn serialize<S: Serializer>(lines: &[OrderLine], serializer: S) -> Result<S::Ok, S::Error> {
        lines.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<OrderLine>, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(Vec::new()),
            Some(Raw::Lines(lines)) => Ok(lines),
            Some(Raw::Encoded(text)) if text.trim().is_empty() => Ok(Vec::new()),
            Some(Raw::Encoded(text)) => serde_json::from_str(&text).map_err(D::Error::custom),
        }
    }
}

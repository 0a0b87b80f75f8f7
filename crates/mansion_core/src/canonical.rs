//! Canonical JSON and BLAKE3 digests
//!
//! Canonical form: object keys sorted recursively, no whitespace. The digest
//! of the canonical bytes identifies an artifact independently of how the
//! struct fields happen to be declared.

use crate::errors::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Serialize `value` to canonical JSON.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&canonicalize(json))?)
}

fn canonicalize(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: BTreeMap<String, serde_json::Value> = map
                .into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            serde_json::Value::Object(sorted.into_iter().collect())
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(canonicalize).collect())
        }
        other => other,
    }
}

/// Hex BLAKE3 digest of raw bytes.
pub fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

/// Hex BLAKE3 digest of the canonical JSON form of `value`.
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String> {
    Ok(digest_hex(to_canonical_json(value)?.as_bytes()))
}

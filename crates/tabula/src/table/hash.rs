//! Structural layout hash.
//!
//! The renderer compares this hash against the one it cached alongside the
//! user's column layout. It must change whenever the table's shape changes
//! and stay put while the user only pages, searches or filters.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Copy of `value` with every object's keys in sorted order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Hex-encoded SHA-256 of the canonical JSON text of `structure`.
pub fn structural_hash(structure: &Value) -> String {
    let text = canonicalize(structure).to_string();
    let digest = Sha256::digest(text.as_bytes());

    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

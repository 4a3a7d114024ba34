//! Parsed filter values.

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Stored for clauses that take no value (`is_set` / `is_not_set`).
pub const PRESENT_SENTINEL: &str = "anyValue";

/// The value half of a parsed `(clause, value)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    List(Vec<String>),
    Bool(bool),
    /// Marker for null checks, which have no operand.
    Present,
}

impl FilterValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Canonical JSON form written back into the request parameters.
    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Text(text) => Value::String(text.clone()),
            FilterValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            FilterValue::Bool(b) => Value::Bool(*b),
            FilterValue::Present => Value::String(PRESENT_SENTINEL.to_string()),
        }
    }
}

impl Serialize for FilterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

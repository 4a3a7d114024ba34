//! Input rows fetched from a record source and the output rows built from them.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Reserved key under which column decorations are attached to an output row.
pub const DECORATION_KEY: &str = "_customColumnsParams";

/// A row from the backing store.
///
/// Stored attributes come from physical storage. Computed attributes are
/// derived by the model and, unlike stored ones, only serialize when a column
/// explicitly asks for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    attributes: Map<String, Value>,
    computed: Map<String, Value>,
}

impl Record {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self {
            attributes,
            computed: Map::new(),
        }
    }

    /// Build a record from a JSON object. Non-objects yield an empty record.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(attributes) => Self::new(attributes),
            _ => Self::default(),
        }
    }

    /// Attach a computed attribute.
    pub fn with_computed(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.computed.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Value of a stored or computed attribute; missing attributes read as null.
    pub fn get(&self, name: &str) -> &Value {
        self.attributes
            .get(name)
            .or_else(|| self.computed.get(name))
            .unwrap_or(&Value::Null)
    }

    pub fn is_computed(&self, name: &str) -> bool {
        !self.attributes.contains_key(name) && self.computed.contains_key(name)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

/// A presentation row, populated field by field by the column pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputRecord {
    values: Map<String, Value>,
    computed: BTreeSet<String>,
    appends: BTreeSet<String>,
    decorations: Map<String, Value>,
}

impl OutputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a stored field value.
    pub fn set(&mut self, field: &str, value: Value) {
        self.computed.remove(field);
        self.values.insert(field.to_string(), value);
    }

    /// Write a computed field value. It is only serialized once appended.
    pub fn set_computed(&mut self, field: &str, value: Value) {
        self.computed.insert(field.to_string());
        self.values.insert(field.to_string(), value);
    }

    /// Request serialization of computed fields.
    pub fn append<'a>(&mut self, fields: impl IntoIterator<Item = &'a str>) {
        self.appends.extend(fields.into_iter().map(str::to_string));
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Attach a decoration under `(field, kind)`, leaving the field value alone.
    pub fn decorate(&mut self, field: &str, kind: &str, annotation: Value) {
        let entry = self
            .decorations
            .entry(field.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(kinds) = entry {
            kinds.insert(kind.to_string(), annotation);
        }
    }

    pub fn decoration(&self, field: &str, kind: &str) -> Option<&Value> {
        self.decorations.get(field).and_then(|kinds| kinds.get(kind))
    }

    fn is_serialized(&self, field: &str) -> bool {
        !self.computed.contains(field) || self.appends.contains(field)
    }

    /// JSON view of the row as the renderer receives it.
    pub fn to_value(&self) -> Value {
        let mut out: Map<String, Value> = self
            .values
            .iter()
            .filter(|(field, _)| self.is_serialized(field))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        if !self.decorations.is_empty() {
            out.insert(
                DECORATION_KEY.to_string(),
                Value::Object(self.decorations.clone()),
            );
        }
        Value::Object(out)
    }
}

impl Serialize for OutputRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (field, value) in &self.values {
            if self.is_serialized(field) {
                map.serialize_entry(field, value)?;
            }
        }
        if !self.decorations.is_empty() {
            map.serialize_entry(DECORATION_KEY, &self.decorations)?;
        }
        map.end()
    }
}

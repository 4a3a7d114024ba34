//! Record sources: restrict-and-paginate access to backing-store rows.

use crate::error::SourceError;
use crate::query::{CompiledPredicate, Predicate};
use crate::record::Record;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// A restricted, ordered query over one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    pub resource: String,
    pub predicate: Option<Predicate>,
    /// Ascending sort field.
    pub sort: Option<String>,
}

impl RecordQuery {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            predicate: None,
            sort: None,
        }
    }

    pub fn restrict(mut self, predicate: Option<Predicate>) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort = Some(field.into());
        self
    }
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u32,
}

impl PageRequest {
    pub fn offset(&self) -> usize {
        let index = usize::try_from(self.page.saturating_sub(1)).unwrap_or(usize::MAX);
        index.saturating_mul(self.per_page as usize)
    }
}

/// One page of rows plus the total count of the restricted query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Record>,
    pub total: u64,
}

/// Backing-store access used by table resolution.
///
/// Implementations report failures as [`SourceError`]; the engine passes
/// them through to the caller untouched.
pub trait RecordSource: Send + Sync {
    /// Whether `resource` names a record type this source can query.
    fn contains_resource(&self, resource: &str) -> bool;

    /// Run the restricted query and return the requested page.
    fn paginate(&self, query: &RecordQuery, page: PageRequest) -> Result<Page, SourceError>;
}

/// In-memory source keyed by resource name.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    resources: HashMap<String, Vec<Record>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, resource: impl Into<String>, records: Vec<Record>) -> Self {
        self.insert(resource, records);
        self
    }

    pub fn insert(&mut self, resource: impl Into<String>, records: Vec<Record>) {
        self.resources.insert(resource.into(), records);
    }

    /// Load a resource from a JSON array of objects.
    pub fn from_json(resource: impl Into<String>, rows: Value) -> Self {
        let records = match rows {
            Value::Array(rows) => rows.into_iter().map(Record::from_json).collect(),
            _ => Vec::new(),
        };
        Self::new().with_resource(resource, records)
    }
}

impl RecordSource for InMemorySource {
    fn contains_resource(&self, resource: &str) -> bool {
        self.resources.contains_key(resource)
    }

    fn paginate(&self, query: &RecordQuery, page: PageRequest) -> Result<Page, SourceError> {
        let records = self
            .resources
            .get(&query.resource)
            .ok_or_else(|| SourceError::UnknownResource(query.resource.clone()))?;

        let compiled = query.predicate.as_ref().map(CompiledPredicate::compile);
        let mut matching: Vec<&Record> = records
            .iter()
            .filter(|record| compiled.as_ref().map_or(true, |p| p.matches(record)))
            .collect();

        if let Some(field) = &query.sort {
            matching.sort_by(|a, b| compare_values(a.get(field), b.get(field)));
        }

        let total = matching.len() as u64;
        let items: Vec<Record> = matching
            .into_iter()
            .skip(page.offset())
            .take(page.per_page as usize)
            .cloned()
            .collect();

        debug!(
            resource = %query.resource,
            total,
            returned = items.len(),
            "in-memory page fetched"
        );
        Ok(Page { items, total })
    }
}

/// Null first, then booleans, numbers, strings; mixed kinds by that rank.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

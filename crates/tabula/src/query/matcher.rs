//! In-memory evaluation of predicates against records.
//!
//! A [`Predicate`] is compiled once per query so needles are lowercased a
//! single time, then evaluated against every candidate row. Comparisons follow
//! SQL null semantics: a null field only satisfies `IsNull`.

use super::predicate::{parse_date, DateOp, LikePattern, Predicate};
use crate::record::Record;
use chrono::NaiveDate;
use serde_json::Value;

/// A needle lowercased once, up front.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    lower: String,
}

impl CachedValue {
    pub fn new(value: &str) -> Self {
        Self {
            lower: value.to_lowercase(),
        }
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }

    #[inline]
    fn equals(&self, haystack: &str) -> bool {
        haystack.to_lowercase() == self.lower
    }

    #[inline]
    fn like(&self, haystack: &str, pattern: LikePattern) -> bool {
        let haystack = haystack.to_lowercase();
        match pattern {
            LikePattern::Contains => haystack.contains(&self.lower),
            LikePattern::StartsWith => haystack.starts_with(&self.lower),
            LikePattern::EndsWith => haystack.ends_with(&self.lower),
        }
    }
}

/// Compiled predicate for efficient row-by-row evaluation.
#[derive(Debug, Clone)]
pub enum CompiledPredicate {
    Like {
        field: String,
        pattern: LikePattern,
        needle: CachedValue,
        negated: bool,
    },
    Equals {
        field: String,
        needle: CachedValue,
        negated: bool,
    },
    In {
        field: String,
        needles: Vec<CachedValue>,
        negated: bool,
    },
    IsNull(String),
    NotNull(String),
    Bool {
        field: String,
        value: bool,
    },
    Date {
        field: String,
        op: DateOp,
        date: NaiveDate,
    },
    And(Vec<CompiledPredicate>),
    Or(Vec<CompiledPredicate>),
}

impl CompiledPredicate {
    pub fn compile(predicate: &Predicate) -> Self {
        match predicate {
            Predicate::Like {
                field,
                pattern,
                value,
                negated,
            } => CompiledPredicate::Like {
                field: field.clone(),
                pattern: *pattern,
                needle: CachedValue::new(value.as_str()),
                negated: *negated,
            },
            Predicate::Equals {
                field,
                value,
                negated,
            } => CompiledPredicate::Equals {
                field: field.clone(),
                needle: CachedValue::new(value.as_str()),
                negated: *negated,
            },
            Predicate::In {
                field,
                values,
                negated,
            } => CompiledPredicate::In {
                field: field.clone(),
                needles: values.iter().map(|v| CachedValue::new(v.as_str())).collect(),
                negated: *negated,
            },
            Predicate::IsNull { field } => CompiledPredicate::IsNull(field.clone()),
            Predicate::NotNull { field } => CompiledPredicate::NotNull(field.clone()),
            Predicate::Bool { field, value } => CompiledPredicate::Bool {
                field: field.clone(),
                value: *value,
            },
            Predicate::Date { field, op, date } => CompiledPredicate::Date {
                field: field.clone(),
                op: *op,
                date: *date,
            },
            Predicate::And(parts) => CompiledPredicate::And(parts.iter().map(Self::compile).collect()),
            Predicate::Or(parts) => CompiledPredicate::Or(parts.iter().map(Self::compile).collect()),
        }
    }

    /// Check if a record satisfies this predicate.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            CompiledPredicate::Like {
                field,
                pattern,
                needle,
                negated,
            } => match comparable(record.get(field)) {
                Some(text) => needle.like(&text, *pattern) != *negated,
                None => false,
            },
            CompiledPredicate::Equals {
                field,
                needle,
                negated,
            } => match comparable(record.get(field)) {
                Some(text) => needle.equals(&text) != *negated,
                None => false,
            },
            CompiledPredicate::In {
                field,
                needles,
                negated,
            } => match comparable(record.get(field)) {
                Some(text) => needles.iter().any(|n| n.equals(&text)) != *negated,
                None => false,
            },
            CompiledPredicate::IsNull(field) => record.get(field).is_null(),
            CompiledPredicate::NotNull(field) => !record.get(field).is_null(),
            CompiledPredicate::Bool { field, value } => truthiness(record.get(field)) == Some(*value),
            CompiledPredicate::Date { field, op, date } => {
                let Some(actual) = comparable(record.get(field)).and_then(|s| parse_date(&s)) else {
                    return false;
                };
                match op {
                    DateOp::Eq => actual == *date,
                    DateOp::NotEq => actual != *date,
                    DateOp::Gte => actual >= *date,
                    DateOp::Lte => actual <= *date,
                }
            }
            CompiledPredicate::And(parts) => parts.iter().all(|p| p.matches(record)),
            CompiledPredicate::Or(parts) => parts.iter().any(|p| p.matches(record)),
        }
    }
}

/// String form used for comparisons; `None` for null and structured values.
fn comparable(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Boolean reading of a stored value, as a database column would coerce it.
pub fn truthiness(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::Clause;
    use crate::filter::FilterValue;
    use crate::query::ValueKind;
    use serde_json::json;

    fn row(value: Value) -> Record {
        Record::from_json(value)
    }

    fn compile(clause: Clause, field: &str, value: Option<FilterValue>) -> CompiledPredicate {
        let predicate = Predicate::for_clause(field, clause, value.as_ref(), ValueKind::Text).unwrap();
        CompiledPredicate::compile(&predicate)
    }

    #[test]
    fn test_like_is_case_insensitive() {
        let contains = compile(Clause::Contains, "name", Some(FilterValue::Text("SMITH".into())));
        assert!(contains.matches(&row(json!({"name": "John Smith"}))));
        assert!(!contains.matches(&row(json!({"name": "John Doe"}))));
        assert!(!contains.matches(&row(json!({"name": null}))));

        let not_contains = compile(Clause::DoesNotContain, "name", Some(FilterValue::Text("smith".into())));
        assert!(!not_contains.matches(&row(json!({"name": "John Smith"}))));
        assert!(not_contains.matches(&row(json!({"name": "John Doe"}))));
        assert!(!not_contains.matches(&row(json!({}))));
    }

    #[test]
    fn test_equality_against_numbers() {
        let equals = compile(Clause::Equals, "id", Some(FilterValue::Text("7".into())));
        assert!(equals.matches(&row(json!({"id": 7}))));
        assert!(!equals.matches(&row(json!({"id": 8}))));
    }

    #[test]
    fn test_membership() {
        let not_in = compile(
            Clause::IsNotIn,
            "status",
            Some(FilterValue::List(vec!["active".into(), "pending".into()])),
        );
        assert!(not_in.matches(&row(json!({"status": "inactive"}))));
        assert!(!not_in.matches(&row(json!({"status": "Active"}))));
    }

    #[test]
    fn test_null_and_bool_checks() {
        let is_set = compile(Clause::IsSet, "verified_at", None);
        assert!(is_set.matches(&row(json!({"verified_at": "2024-01-01"}))));
        assert!(!is_set.matches(&row(json!({"verified_at": null}))));

        let is_true = compile(Clause::IsTrue, "admin", None);
        assert!(is_true.matches(&row(json!({"admin": true}))));
        assert!(is_true.matches(&row(json!({"admin": 1}))));
        assert!(!is_true.matches(&row(json!({"admin": false}))));
        assert!(!is_true.matches(&row(json!({}))));
    }

    #[test]
    fn test_date_range() {
        let predicate = Predicate::for_clause(
            "created_at",
            Clause::Between,
            Some(&FilterValue::List(vec!["2024-01-01".into(), "2024-01-31".into()])),
            ValueKind::Date,
        )
        .unwrap();
        let compiled = CompiledPredicate::compile(&predicate);

        assert!(compiled.matches(&row(json!({"created_at": "2024-01-01T00:00:00Z"}))));
        assert!(compiled.matches(&row(json!({"created_at": "2024-01-31 23:59:59"}))));
        assert!(!compiled.matches(&row(json!({"created_at": "2024-02-01"}))));
        assert!(!compiled.matches(&row(json!({"created_at": "not a date"}))));
    }

    #[test]
    fn test_cached_value_holds_lowercase_only() {
        let needle = CachedValue::new("SmItH");
        assert_eq!(needle.lower(), "smith");
        assert_eq!(needle, CachedValue::new("smith"));
        assert!(needle.like("John SMITH", LikePattern::EndsWith));
        assert!(needle.equals("Smith"));
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(truthiness(&json!("yes")), Some(true));
        assert_eq!(truthiness(&json!(0)), Some(false));
        assert_eq!(truthiness(&json!(null)), None);
        assert_eq!(truthiness(&json!("maybe")), None);
    }
}

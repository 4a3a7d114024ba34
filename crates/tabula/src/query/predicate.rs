//! Backing-store restrictions and the clause translation table.

use crate::clause::Clause;
use crate::filter::FilterValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Which part of the string a LIKE pattern anchors to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LikePattern {
    Contains,
    StartsWith,
    EndsWith,
}

/// Date comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOp {
    Eq,
    NotEq,
    Gte,
    Lte,
}

/// How a field's filter value should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueKind {
    #[default]
    Text,
    Date,
}

/// A restriction on the rows of a record source.
///
/// String comparisons are case-insensitive throughout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    Like {
        field: String,
        pattern: LikePattern,
        value: String,
        negated: bool,
    },
    Equals {
        field: String,
        value: String,
        negated: bool,
    },
    In {
        field: String,
        values: Vec<String>,
        negated: bool,
    },
    IsNull {
        field: String,
    },
    NotNull {
        field: String,
    },
    Bool {
        field: String,
        value: bool,
    },
    Date {
        field: String,
        op: DateOp,
        date: NaiveDate,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// AND-combine, collapsing trivial groups.
    pub fn and(mut predicates: Vec<Predicate>) -> Option<Predicate> {
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Predicate::And(predicates)),
        }
    }

    /// OR-combine, collapsing trivial groups.
    pub fn or(mut predicates: Vec<Predicate>) -> Option<Predicate> {
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Predicate::Or(predicates)),
        }
    }

    /// Case-insensitive substring match across several fields (global search).
    pub fn search<'a>(
        fields: impl IntoIterator<Item = &'a str>,
        term: &str,
    ) -> Option<Predicate> {
        Predicate::or(
            fields
                .into_iter()
                .map(|field| Predicate::Like {
                    field: field.to_string(),
                    pattern: LikePattern::Contains,
                    value: term.to_string(),
                    negated: false,
                })
                .collect(),
        )
    }

    /// Translate a selected clause and its value into a restriction.
    ///
    /// Returns `None` when the value cannot drive the clause (missing value,
    /// wrong shape, or a date range whose bounds are all unparsable).
    pub fn for_clause(
        field: &str,
        clause: Clause,
        value: Option<&FilterValue>,
        kind: ValueKind,
    ) -> Option<Predicate> {
        let field_name = field.to_string();

        match clause {
            Clause::IsSet => return Some(Predicate::NotNull { field: field_name }),
            Clause::IsNotSet => return Some(Predicate::IsNull { field: field_name }),
            Clause::IsTrue => {
                return Some(Predicate::Bool {
                    field: field_name,
                    value: true,
                })
            }
            Clause::IsFalse => {
                return Some(Predicate::Bool {
                    field: field_name,
                    value: false,
                })
            }
            _ => {}
        }

        let value = value?;

        match clause {
            Clause::Contains | Clause::DoesNotContain => like(
                field,
                LikePattern::Contains,
                clause == Clause::DoesNotContain,
                value,
            ),
            Clause::StartsWith | Clause::DoesNotStartWith => like(
                field,
                LikePattern::StartsWith,
                clause == Clause::DoesNotStartWith,
                value,
            ),
            Clause::EndsWith | Clause::DoesNotEndWith => like(
                field,
                LikePattern::EndsWith,
                clause == Clause::DoesNotEndWith,
                value,
            ),
            Clause::Equals | Clause::DoesNotEqual => {
                let negated = clause == Clause::DoesNotEqual;
                match (kind, value) {
                    (ValueKind::Date, FilterValue::Text(text)) => {
                        parse_date(text).map(|date| Predicate::Date {
                            field: field_name,
                            op: if negated { DateOp::NotEq } else { DateOp::Eq },
                            date,
                        })
                    }
                    (_, FilterValue::Text(text)) => Some(Predicate::Equals {
                        field: field_name,
                        value: text.clone(),
                        negated,
                    }),
                    (_, FilterValue::List(values)) => Some(Predicate::In {
                        field: field_name,
                        values: values.clone(),
                        negated,
                    }),
                    _ => None,
                }
            }
            Clause::IsIn | Clause::IsNotIn => {
                let values = match value {
                    FilterValue::List(values) => values.clone(),
                    FilterValue::Text(text) => vec![text.clone()],
                    _ => return None,
                };
                Some(Predicate::In {
                    field: field_name,
                    values,
                    negated: clause == Clause::IsNotIn,
                })
            }
            Clause::After | Clause::Before => {
                let op = if clause == Clause::After { DateOp::Gte } else { DateOp::Lte };
                value.as_text().and_then(parse_date).map(|date| Predicate::Date {
                    field: field_name,
                    op,
                    date,
                })
            }
            Clause::Between => between(field, value),
            Clause::IsSet | Clause::IsNotSet | Clause::IsTrue | Clause::IsFalse => None,
        }
    }
}

fn like(
    field: &str,
    pattern: LikePattern,
    negated: bool,
    value: &FilterValue,
) -> Option<Predicate> {
    value.as_text().map(|text| Predicate::Like {
        field: field.to_string(),
        pattern,
        value: text.to_string(),
        negated,
    })
}

/// Inclusive date range; a malformed or empty bound is skipped.
fn between(field: &str, value: &FilterValue) -> Option<Predicate> {
    match value {
        FilterValue::Text(text) => parse_date(text).map(|date| Predicate::Date {
            field: field.to_string(),
            op: DateOp::Eq,
            date,
        }),
        FilterValue::List(bounds) => {
            let mut parts = Vec::new();
            let ops = [DateOp::Gte, DateOp::Lte];
            for (bound, op) in bounds.iter().zip(ops) {
                if let Some(date) = parse_date(bound) {
                    parts.push(Predicate::Date {
                        field: field.to_string(),
                        op,
                        date,
                    });
                }
            }
            Predicate::and(parts)
        }
        _ => None,
    }
}

/// Parse a calendar date from the formats commonly seen in filters and rows.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.date_naive());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|datetime| datetime.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> FilterValue {
        FilterValue::Text(value.to_string())
    }

    fn list(values: &[&str]) -> FilterValue {
        FilterValue::List(values.iter().map(|v| v.to_string()).collect())
    }

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_contains_family() {
        let predicate = Predicate::for_clause("name", Clause::DoesNotStartWith, Some(&text("Sm")), ValueKind::Text);
        assert_eq!(
            predicate,
            Some(Predicate::Like {
                field: "name".into(),
                pattern: LikePattern::StartsWith,
                value: "Sm".into(),
                negated: true,
            })
        );
    }

    #[test]
    fn test_equals_with_list_becomes_membership() {
        let predicate = Predicate::for_clause("status", Clause::DoesNotEqual, Some(&list(&["a", "b"])), ValueKind::Text);
        assert_eq!(
            predicate,
            Some(Predicate::In {
                field: "status".into(),
                values: vec!["a".into(), "b".into()],
                negated: true,
            })
        );
    }

    #[test]
    fn test_no_value_clauses_ignore_value() {
        assert_eq!(
            Predicate::for_clause("deleted_at", Clause::IsSet, None, ValueKind::Text),
            Some(Predicate::NotNull { field: "deleted_at".into() })
        );
        assert_eq!(
            Predicate::for_clause("deleted_at", Clause::IsNotSet, Some(&FilterValue::Present), ValueKind::Text),
            Some(Predicate::IsNull { field: "deleted_at".into() })
        );
        assert_eq!(
            Predicate::for_clause("active", Clause::IsTrue, Some(&FilterValue::Bool(true)), ValueKind::Text),
            Some(Predicate::Bool { field: "active".into(), value: true })
        );
    }

    #[test]
    fn test_missing_value_yields_nothing() {
        assert_eq!(Predicate::for_clause("name", Clause::Equals, None, ValueKind::Text), None);
        assert_eq!(Predicate::for_clause("name", Clause::Contains, None, ValueKind::Text), None);
    }

    #[test]
    fn test_date_equals_on_date_fields() {
        assert_eq!(
            Predicate::for_clause("created_at", Clause::Equals, Some(&text("2024-01-01")), ValueKind::Date),
            Some(Predicate::Date {
                field: "created_at".into(),
                op: DateOp::Eq,
                date: date("2024-01-01"),
            })
        );
    }

    #[test]
    fn test_between_skips_malformed_bound() {
        let predicate = Predicate::for_clause("created_at", Clause::Between, Some(&list(&["garbage", "2024-01-31"])), ValueKind::Date);
        assert_eq!(
            predicate,
            Some(Predicate::Date {
                field: "created_at".into(),
                op: DateOp::Lte,
                date: date("2024-01-31"),
            })
        );

        let both = Predicate::for_clause("created_at", Clause::Between, Some(&list(&["2024-01-01", "2024-01-31"])), ValueKind::Date);
        assert!(matches!(both, Some(Predicate::And(ref parts)) if parts.len() == 2));

        let none = Predicate::for_clause("created_at", Clause::Between, Some(&list(&["x", ""])), ValueKind::Date);
        assert_eq!(none, None);
    }

    #[test]
    fn test_after_and_before() {
        assert_eq!(
            Predicate::for_clause("created_at", Clause::After, Some(&text("2024-02-01")), ValueKind::Date),
            Some(Predicate::Date { field: "created_at".into(), op: DateOp::Gte, date: date("2024-02-01") })
        );
        assert_eq!(
            Predicate::for_clause("created_at", Clause::Before, Some(&text("nonsense")), ValueKind::Date),
            None
        );
    }

    #[test]
    fn test_search_is_or_group() {
        let predicate = Predicate::search(["name", "email"], "acme").unwrap();
        match predicate {
            Predicate::Or(parts) => assert_eq!(parts.len(), 2),
            other => panic!("expected OR group, got {other:?}"),
        }
        assert!(Predicate::search([], "acme").is_none());
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-05"), Some(date("2024-01-05")));
        assert_eq!(parse_date("2024-01-05T10:00:00Z"), Some(date("2024-01-05")));
        assert_eq!(parse_date("2024-01-05 10:00:00"), Some(date("2024-01-05")));
        assert_eq!(parse_date("05/01/2024"), None);
        assert_eq!(parse_date(""), None);
    }
}

//! Rendering predicates as parameterized SQL.
//!
//! Fields are emitted as-is; callers are expected to pass column names that
//! come from table definitions, never from the request.

use super::predicate::{DateOp, LikePattern, Predicate};
use serde_json::Value;

/// A `WHERE` fragment with positional `?` bindings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlFragment {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl SqlFragment {
    fn new(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }
}

/// Escape LIKE wildcards so user input matches literally.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

impl Predicate {
    /// Render this predicate as a SQL condition.
    pub fn to_sql(&self) -> SqlFragment {
        match self {
            Predicate::Like {
                field,
                pattern,
                value,
                negated,
            } => {
                let needle = escape_like(&value.to_lowercase());
                let binding = match pattern {
                    LikePattern::Contains => format!("%{needle}%"),
                    LikePattern::StartsWith => format!("{needle}%"),
                    LikePattern::EndsWith => format!("%{needle}"),
                };
                let not = if *negated { "NOT " } else { "" };
                SqlFragment::new(
                    format!("LOWER({field}) {not}LIKE ? ESCAPE '\\'"),
                    vec![Value::String(binding)],
                )
            }
            Predicate::Equals {
                field,
                value,
                negated,
            } => {
                let op = if *negated { "!=" } else { "=" };
                SqlFragment::new(
                    format!("LOWER({field}) {op} ?"),
                    vec![Value::String(value.to_lowercase())],
                )
            }
            Predicate::In {
                field,
                values,
                negated,
            } => {
                if values.is_empty() {
                    return SqlFragment::new(if *negated { "1 = 1" } else { "1 = 0" }, vec![]);
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                let not = if *negated { "NOT " } else { "" };
                SqlFragment::new(
                    format!("LOWER({field}) {not}IN ({placeholders})"),
                    values
                        .iter()
                        .map(|v| Value::String(v.to_lowercase()))
                        .collect(),
                )
            }
            Predicate::IsNull { field } => SqlFragment::new(format!("{field} IS NULL"), vec![]),
            Predicate::NotNull { field } => {
                SqlFragment::new(format!("{field} IS NOT NULL"), vec![])
            }
            Predicate::Bool { field, value } => {
                SqlFragment::new(format!("{field} = ?"), vec![Value::Bool(*value)])
            }
            Predicate::Date { field, op, date } => {
                let op = match op {
                    DateOp::Eq => "=",
                    DateOp::NotEq => "!=",
                    DateOp::Gte => ">=",
                    DateOp::Lte => "<=",
                };
                SqlFragment::new(
                    format!("DATE({field}) {op} ?"),
                    vec![Value::String(date.format("%Y-%m-%d").to_string())],
                )
            }
            Predicate::And(parts) => join(parts, " AND ", "1 = 1"),
            Predicate::Or(parts) => join(parts, " OR ", "1 = 0"),
        }
    }
}

fn join(parts: &[Predicate], separator: &str, empty: &str) -> SqlFragment {
    if parts.is_empty() {
        return SqlFragment::new(empty, vec![]);
    }
    let mut sql = Vec::with_capacity(parts.len());
    let mut bindings = Vec::new();
    for part in parts {
        let fragment = part.to_sql();
        sql.push(format!("({})", fragment.sql));
        bindings.extend(fragment.bindings);
    }
    SqlFragment::new(sql.join(separator), bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_like_is_lowercased_and_escaped() {
        let predicate = Predicate::Like {
            field: "name".into(),
            pattern: LikePattern::Contains,
            value: "Sm_th".into(),
            negated: true,
        };
        let fragment = predicate.to_sql();
        assert_eq!(fragment.sql, "LOWER(name) NOT LIKE ? ESCAPE '\\'");
        assert_eq!(fragment.bindings, vec![json!("%sm\\_th%")]);
    }

    #[test]
    fn test_membership_placeholders() {
        let fragment = Predicate::In {
            field: "status".into(),
            values: vec!["Active".into(), "Pending".into()],
            negated: false,
        }
        .to_sql();
        assert_eq!(fragment.sql, "LOWER(status) IN (?, ?)");
        assert_eq!(fragment.bindings, vec![json!("active"), json!("pending")]);
    }

    #[test]
    fn test_compound_groups() {
        let predicate = Predicate::And(vec![
            Predicate::NotNull {
                field: "email_verified_at".into(),
            },
            Predicate::Or(vec![
                Predicate::Bool {
                    field: "admin".into(),
                    value: true,
                },
                Predicate::Date {
                    field: "created_at".into(),
                    op: DateOp::Gte,
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                },
            ]),
        ]);
        let fragment = predicate.to_sql();
        assert_eq!(
            fragment.sql,
            "(email_verified_at IS NOT NULL) AND ((admin = ?) OR (DATE(created_at) >= ?))"
        );
        assert_eq!(fragment.bindings, vec![json!(true), json!("2024-01-01")]);
    }
}

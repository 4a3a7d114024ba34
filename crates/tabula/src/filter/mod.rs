//! Per-field filters.
//!
//! A [`Filter`] owns the clauses its kind allows, parses the raw request value
//! for its field into a `(clause, value)` pair, and turns that pair into a
//! [`Predicate`]. Filters are built fresh for every resolution.

mod parse;
mod value;

pub use parse::{parse_wire_value, Parsed};
pub use value::{FilterValue, PRESENT_SENTINEL};

use crate::clause::Clause;
use crate::config::TableDefaults;
use crate::query::{Predicate, ValueKind};
use crate::request::ParameterBag;
use crate::text::headline;
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type ApplyFn = dyn Fn(&str, Clause, Option<&FilterValue>) -> Option<Predicate> + Send + Sync;

/// Application-supplied replacement for the default clause mapping.
///
/// Receives the backing field name, the selected clause and the parsed value.
#[derive(Clone)]
pub struct ApplyUsing(Arc<ApplyFn>);

impl ApplyUsing {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, Clause, Option<&FilterValue>) -> Option<Predicate> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for ApplyUsing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApplyUsing(..)")
    }
}

/// One `{label, value}` entry of a dropdown.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOption {
    pub value: Value,
    pub label: String,
}

/// Concrete filter kind. Fixes the allowed clauses and the renderer component.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    Text,
    Boolean {
        true_label: Option<String>,
        false_label: Option<String>,
    },
    Dropdown {
        options: Vec<FilterOption>,
        multiple: bool,
    },
    Date,
}

impl FilterKind {
    pub fn component(&self) -> &'static str {
        match self {
            FilterKind::Text => "TextFilter",
            FilterKind::Boolean { .. } => "BooleanFilter",
            FilterKind::Dropdown { .. } => "DropdownFilter",
            FilterKind::Date => "DateFilter",
        }
    }

    fn clauses(&self) -> (Vec<Clause>, Clause) {
        match self {
            FilterKind::Text => (
                vec![
                    Clause::Contains,
                    Clause::DoesNotContain,
                    Clause::StartsWith,
                    Clause::DoesNotStartWith,
                    Clause::EndsWith,
                    Clause::DoesNotEndWith,
                    Clause::Equals,
                    Clause::DoesNotEqual,
                    Clause::IsIn,
                    Clause::IsNotIn,
                ],
                Clause::Contains,
            ),
            FilterKind::Boolean { .. } => (
                vec![Clause::IsTrue, Clause::IsFalse, Clause::IsSet, Clause::IsNotSet],
                Clause::IsTrue,
            ),
            FilterKind::Dropdown { .. } => (
                vec![Clause::Equals, Clause::DoesNotEqual, Clause::IsSet, Clause::IsNotSet],
                Clause::Equals,
            ),
            FilterKind::Date => (
                vec![Clause::Equals, Clause::After, Clause::Before, Clause::Between],
                Clause::Equals,
            ),
        }
    }

    fn value_kind(&self) -> ValueKind {
        match self {
            FilterKind::Date => ValueKind::Date,
            _ => ValueKind::Text,
        }
    }
}

/// Filter state for one field of one table.
#[derive(Debug, Clone)]
pub struct Filter {
    field: String,
    alias: Option<String>,
    title: Option<String>,
    kind: FilterKind,
    clauses: Vec<Clause>,
    default_clause: Clause,
    show_in_header: bool,
    apply_using: Option<ApplyUsing>,
    selected_clause: Option<Clause>,
    value: Option<FilterValue>,
}

impl Filter {
    fn make(field: impl Into<String>, kind: FilterKind) -> Self {
        let (clauses, default_clause) = kind.clauses();
        Self {
            field: field.into(),
            alias: None,
            title: None,
            kind,
            clauses,
            default_clause,
            show_in_header: false,
            apply_using: None,
            selected_clause: None,
            value: None,
        }
    }

    /// Free-text filter with the string-matching clause family.
    pub fn text(field: impl Into<String>) -> Self {
        Self::make(field, FilterKind::Text)
    }

    /// True/false filter.
    pub fn boolean(field: impl Into<String>) -> Self {
        Self::make(
            field,
            FilterKind::Boolean {
                true_label: None,
                false_label: None,
            },
        )
    }

    /// Pick-one (or pick-many, see [`Filter::multiple`]) filter.
    pub fn dropdown(field: impl Into<String>) -> Self {
        Self::make(
            field,
            FilterKind::Dropdown {
                options: Vec::new(),
                multiple: false,
            },
        )
    }

    /// Calendar date filter.
    pub fn date(field: impl Into<String>) -> Self {
        Self::make(field, FilterKind::Date)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Public name used in query parameters and descriptors.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn show_in_header(mut self) -> Self {
        self.show_in_header = true;
        self
    }

    pub fn default_clause(mut self, clause: Clause) -> Self {
        if self.clauses.contains(&clause) {
            self.default_clause = clause;
        }
        self
    }

    /// Allow null checks (`is_set` / `is_not_set`).
    pub fn nullable(mut self) -> Self {
        for clause in [Clause::IsSet, Clause::IsNotSet] {
            if !self.clauses.contains(&clause) {
                self.clauses.push(clause);
            }
        }
        self
    }

    /// Replace the default clause mapping for this field.
    pub fn apply_using<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Clause, Option<&FilterValue>) -> Option<Predicate> + Send + Sync + 'static,
    {
        self.apply_using = Some(ApplyUsing::new(f));
        self
    }

    /// Dropdown choices as `(value, label)` pairs. Dropdown filters only.
    pub fn options<V, L>(mut self, options: impl IntoIterator<Item = (V, L)>) -> Self
    where
        V: Into<Value>,
        L: Into<String>,
    {
        if let FilterKind::Dropdown { options: current, .. } = &mut self.kind {
            *current = options
                .into_iter()
                .map(|(value, label)| FilterOption {
                    value: value.into(),
                    label: label.into(),
                })
                .collect();
        }
        self
    }

    /// Let a dropdown select several values. Dropdown filters only.
    pub fn multiple(mut self) -> Self {
        if let FilterKind::Dropdown { multiple, .. } = &mut self.kind {
            if !*multiple {
                *multiple = true;
                self.clauses.retain(|c| !matches!(c, Clause::IsIn | Clause::IsNotIn));
                self.clauses.splice(0..0, [Clause::IsIn, Clause::IsNotIn]);
                self.default_clause = Clause::IsIn;
            }
        }
        self
    }

    /// Label shown for `true`. Boolean filters only.
    pub fn true_label(mut self, label: impl Into<String>) -> Self {
        if let FilterKind::Boolean { true_label, .. } = &mut self.kind {
            *true_label = Some(label.into());
        }
        self
    }

    /// Label shown for `false`. Boolean filters only.
    pub fn false_label(mut self, label: impl Into<String>) -> Self {
        if let FilterKind::Boolean { false_label, .. } = &mut self.kind {
            *false_label = Some(label.into());
        }
        self
    }

    /// Fill unset presentation settings from table-wide defaults.
    pub(crate) fn inherit(&mut self, defaults: &TableDefaults) {
        if let FilterKind::Boolean {
            true_label,
            false_label,
        } = &mut self.kind
        {
            true_label.get_or_insert_with(|| defaults.true_label.clone());
            false_label.get_or_insert_with(|| defaults.false_label.clone());
        }
    }

    /// Backing field name.
    pub fn name(&self) -> &str {
        &self.field
    }

    pub fn get_alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Alias if set, otherwise the field name.
    pub fn public_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.field)
    }

    pub fn get_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| headline(&self.field))
    }

    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn selected_clause(&self) -> Option<Clause> {
        self.selected_clause
    }

    pub fn value(&self) -> Option<&FilterValue> {
        self.value.as_ref()
    }

    /// True when a value is present or the selected clause needs none.
    pub fn is_selected(&self) -> bool {
        self.value.is_some() || self.selected_clause.is_some_and(Clause::requires_no_value)
    }

    /// Request parameter carrying this filter's raw value.
    pub fn query_param(&self, table: Option<&str>) -> String {
        match table.filter(|t| !t.is_empty()) {
            Some(table) => format!("filter.{table}.{}", self.public_name()),
            None => format!("filter.{}", self.public_name()),
        }
    }

    /// Parse a raw wire value and write the canonical value back into the
    /// request parameters under [`Filter::query_param`].
    ///
    /// `raw` is taken as already decoded by the parameter bag; the remainder
    /// after the clause symbol is the value, byte for byte.
    pub fn parse_request_value(
        &mut self,
        table: Option<&str>,
        raw: &str,
        params: &mut dyn ParameterBag,
    ) {
        match parse_wire_value(raw, &self.clauses) {
            Some(parsed) => {
                debug!(
                    filter = %self.public_name(),
                    clause = %parsed.clause,
                    "parsed filter value"
                );
                self.selected_clause = Some(parsed.clause);
                self.value = parsed.value;
            }
            None => {
                debug!(filter = %self.public_name(), raw = %raw, "no allowed clause matched");
                self.reset();
            }
        }

        let canonical = self.value.as_ref().map_or(Value::Null, FilterValue::to_json);
        params.set(&self.query_param(table), canonical);
    }

    /// Clear the selected clause and value.
    pub fn reset(&mut self) {
        self.selected_clause = None;
        self.value = None;
    }

    /// Restriction for the current selection, if any.
    pub fn query_predicate(&self) -> Option<Predicate> {
        let clause = self.selected_clause?;
        match &self.apply_using {
            Some(apply) => (apply.0)(&self.field, clause, self.value.as_ref()),
            None => Predicate::for_clause(
                &self.field,
                clause,
                self.value.as_ref(),
                self.kind.value_kind(),
            ),
        }
    }

    /// Renderer descriptor. Without state, only static configuration is
    /// emitted, which is what the structural hash covers.
    pub fn descriptor(&self, with_state: bool) -> Value {
        let mut out = Map::new();
        out.insert("name".into(), json!(self.public_name()));
        out.insert("title".into(), json!(self.get_title()));
        out.insert("clauses".into(), json!(self.clauses));
        out.insert("defaultClause".into(), json!(self.default_clause));
        out.insert("showInHeader".into(), json!(self.show_in_header));
        out.insert("component".into(), json!(self.kind.component()));
        out.insert("opened".into(), json!(false));

        if with_state {
            out.insert("value".into(), json!(self.value));
            out.insert("selectedClause".into(), json!(self.selected_clause));
            out.insert("selected".into(), json!(self.is_selected()));
        }

        match &self.kind {
            FilterKind::Dropdown { options, multiple } => {
                let multiple = if with_state {
                    *multiple && matches!(self.selected_clause, Some(Clause::IsIn | Clause::IsNotIn))
                } else {
                    *multiple
                };
                out.insert("multiple".into(), json!(multiple));
                out.insert("options".into(), options_json(options));
            }
            FilterKind::Boolean {
                true_label,
                false_label,
            } => {
                out.insert(
                    "options".into(),
                    json!([
                        {"label": true_label.as_deref().unwrap_or("True"), "value": true},
                        {"label": false_label.as_deref().unwrap_or("False"), "value": false},
                    ]),
                );
            }
            FilterKind::Text | FilterKind::Date => {}
        }

        Value::Object(out)
    }
}

fn options_json(options: &[FilterOption]) -> Value {
    Value::Array(
        options
            .iter()
            .map(|o| json!({"label": o.label, "value": o.value}))
            .collect(),
    )
}

//! Filter operators and their compact wire encoding.
//!
//! A filter value travels in the query string as `<symbol>.<value>`, e.g.
//! `contains.acme` or `not.contains.acme`. Equals is the unmarked case: a bare
//! value with no recognised symbol is an equality test.
//!
//! Some symbols are prefixes of others (`not` / `not.contains`), so lookups
//! that scan for a prefix must try longer symbols first; see
//! [`Clause::by_descending_symbol_len`].

use once_cell::sync::Lazy;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// A filter operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Clause {
    Equals,
    DoesNotEqual,
    Contains,
    DoesNotContain,
    StartsWith,
    DoesNotStartWith,
    EndsWith,
    DoesNotEndWith,
    IsIn,
    IsNotIn,
    IsSet,
    IsNotSet,
    IsTrue,
    IsFalse,
    After,
    Before,
    Between,
}

static BY_DESCENDING_SYMBOL_LEN: Lazy<Vec<Clause>> = Lazy::new(|| {
    let mut clauses = Clause::ALL.to_vec();
    // stable: equal-length symbols keep declaration order
    clauses.sort_by(|a, b| b.symbol().len().cmp(&a.symbol().len()));
    clauses
});

impl Clause {
    /// Every clause, in declaration order.
    pub const ALL: [Clause; 17] = [
        Clause::Equals,
        Clause::DoesNotEqual,
        Clause::Contains,
        Clause::DoesNotContain,
        Clause::StartsWith,
        Clause::DoesNotStartWith,
        Clause::EndsWith,
        Clause::DoesNotEndWith,
        Clause::IsIn,
        Clause::IsNotIn,
        Clause::IsSet,
        Clause::IsNotSet,
        Clause::IsTrue,
        Clause::IsFalse,
        Clause::After,
        Clause::Before,
        Clause::Between,
    ];

    /// Symbolic name, as sent to the renderer.
    pub const fn id(self) -> &'static str {
        match self {
            Clause::Equals => "equals",
            Clause::DoesNotEqual => "does_not_equal",
            Clause::Contains => "contains",
            Clause::DoesNotContain => "does_not_contain",
            Clause::StartsWith => "starts_with",
            Clause::DoesNotStartWith => "does_not_start_with",
            Clause::EndsWith => "ends_with",
            Clause::DoesNotEndWith => "does_not_end_with",
            Clause::IsIn => "is_in",
            Clause::IsNotIn => "is_not_in",
            Clause::IsSet => "is_set",
            Clause::IsNotSet => "is_not_set",
            Clause::IsTrue => "is_true",
            Clause::IsFalse => "is_false",
            Clause::After => "after",
            Clause::Before => "before",
            Clause::Between => "between",
        }
    }

    /// Wire symbol used in filter query parameters. Unique per clause; the
    /// empty symbol belongs to [`Clause::Equals`].
    pub const fn symbol(self) -> &'static str {
        match self {
            Clause::Equals => "",
            Clause::DoesNotEqual => "not",
            Clause::Contains => "contains",
            Clause::DoesNotContain => "not.contains",
            Clause::StartsWith => "starts",
            Clause::DoesNotStartWith => "not.starts",
            Clause::EndsWith => "ends",
            Clause::DoesNotEndWith => "not.ends",
            Clause::IsIn => "in",
            Clause::IsNotIn => "not.in",
            Clause::IsSet => "not.null",
            Clause::IsNotSet => "null",
            Clause::IsTrue => "true",
            Clause::IsFalse => "false",
            Clause::After => "after",
            Clause::Before => "before",
            Clause::Between => "between",
        }
    }

    /// Human readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Clause::Equals => "Equals",
            Clause::DoesNotEqual => "Does not equal",
            Clause::Contains => "Contains",
            Clause::DoesNotContain => "Does not contain",
            Clause::StartsWith => "Starts with",
            Clause::DoesNotStartWith => "Does not start with",
            Clause::EndsWith => "Ends with",
            Clause::DoesNotEndWith => "Does not end with",
            Clause::IsIn => "Is in",
            Clause::IsNotIn => "Is not in",
            Clause::IsSet => "Is set",
            Clause::IsNotSet => "Is not set",
            Clause::IsTrue => "Is true",
            Clause::IsFalse => "Is false",
            Clause::After => "After",
            Clause::Before => "Before",
            Clause::Between => "Between",
        }
    }

    /// Whether the clause carries a comma separated list of values.
    pub const fn is_array_valued(self) -> bool {
        matches!(self, Clause::IsIn | Clause::IsNotIn | Clause::Between)
    }

    /// Whether the clause ignores any value after its symbol.
    pub const fn requires_no_value(self) -> bool {
        matches!(
            self,
            Clause::IsSet | Clause::IsNotSet | Clause::IsTrue | Clause::IsFalse
        )
    }

    /// Exact lookup by wire symbol.
    pub fn from_symbol(symbol: &str) -> Option<Clause> {
        Clause::ALL.iter().copied().find(|c| c.symbol() == symbol)
    }

    /// Lookup by symbolic name (`contains`, `is_in`, ...).
    pub fn from_id(id: &str) -> Option<Clause> {
        Clause::ALL.iter().copied().find(|c| c.id() == id)
    }

    /// All clauses ordered by descending wire-symbol length. Computed once.
    pub fn by_descending_symbol_len() -> &'static [Clause] {
        &BY_DESCENDING_SYMBOL_LEN
    }

    /// Match `raw` against this clause's prefix and return the remainder.
    ///
    /// Value clauses need `symbol.`; no-value clauses also accept the bare
    /// symbol. Equals never matches here since it has no symbol.
    pub fn strip_from<'a>(self, raw: &'a str) -> Option<&'a str> {
        let symbol = self.symbol();
        if symbol.is_empty() {
            return None;
        }
        if self.requires_no_value() && raw == symbol {
            return Some("");
        }
        raw.strip_prefix(symbol)
            .and_then(|rest| rest.strip_prefix('.'))
    }
}

impl std::fmt::Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl Serialize for Clause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Clause", 5)?;
        state.serialize_field("value", self.id())?;
        state.serialize_field("label", self.label())?;
        state.serialize_field("prefix", self.symbol())?;
        state.serialize_field("isArray", &self.is_array_valued())?;
        state.serialize_field("withoutValue", &self.requires_no_value())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_symbols_are_unique() {
        let symbols: HashSet<&str> = Clause::ALL.iter().map(|c| c.symbol()).collect();
        assert_eq!(symbols.len(), Clause::ALL.len());
        assert_eq!(Clause::from_symbol(""), Some(Clause::Equals));
    }

    #[test]
    fn test_descending_order_puts_long_symbols_first() {
        let ordered = Clause::by_descending_symbol_len();
        let position = |c: Clause| ordered.iter().position(|o| *o == c).unwrap();

        assert_eq!(ordered.len(), Clause::ALL.len());
        assert!(position(Clause::DoesNotContain) < position(Clause::DoesNotEqual));
        assert!(position(Clause::IsSet) < position(Clause::IsNotSet));
        assert_eq!(ordered.last(), Some(&Clause::Equals));
        assert!(std::ptr::eq(ordered, Clause::by_descending_symbol_len()));
    }

    #[test]
    fn test_strip_from() {
        assert_eq!(Clause::Contains.strip_from("contains.acme"), Some("acme"));
        assert_eq!(Clause::Contains.strip_from("contains."), Some(""));
        assert_eq!(Clause::Contains.strip_from("contains"), None);
        assert_eq!(Clause::DoesNotEqual.strip_from("not.contains.x"), Some("contains.x"));
        assert_eq!(Clause::IsTrue.strip_from("true"), Some(""));
        assert_eq!(Clause::IsSet.strip_from("not.null.whatever"), Some("whatever"));
        assert_eq!(Clause::Equals.strip_from("anything"), None);
    }

    #[test]
    fn test_clause_serializes_for_renderer() {
        let json = serde_json::to_value(Clause::IsIn).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "value": "is_in",
                "label": "Is in",
                "prefix": "in",
                "isArray": true,
                "withoutValue": false,
            })
        );
    }

    #[test]
    fn test_from_id() {
        assert_eq!(Clause::from_id("does_not_contain"), Some(Clause::DoesNotContain));
        assert_eq!(Clause::from_id("nope"), None);
    }

    proptest! {
        #[test]
        fn prop_symbol_round_trip(index in 0usize..17) {
            let clause = Clause::ALL[index];
            prop_assert_eq!(Clause::from_symbol(clause.symbol()), Some(clause));
            prop_assert_eq!(Clause::from_id(clause.id()), Some(clause));
        }
    }
}

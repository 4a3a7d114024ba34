//! Wire-value parsing: `<symbol>.<value>` into a `(clause, value)` pair.

use super::value::FilterValue;
use crate::clause::Clause;

/// Result of parsing one raw filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub clause: Clause,
    pub value: Option<FilterValue>,
}

/// Parse an already-decoded raw value against the allowed clauses.
///
/// Symbols are tried longest first so `not.contains.x` selects
/// `DoesNotContain` rather than `DoesNotEqual` with value `contains.x`.
/// Nothing matching falls back to Equals on the whole value, if allowed.
pub fn parse_wire_value(raw: &str, allowed: &[Clause]) -> Option<Parsed> {
    let matched = Clause::by_descending_symbol_len()
        .iter()
        .copied()
        .filter(|clause| allowed.contains(clause))
        .find_map(|clause| clause.strip_from(raw).map(|rest| (clause, rest)));

    if let Some((clause, rest)) = matched {
        return Some(Parsed {
            clause,
            value: Some(value_for(clause, rest)),
        });
    }

    if !allowed.contains(&Clause::Equals) {
        return None;
    }

    Some(Parsed {
        clause: Clause::Equals,
        value: (!raw.is_empty()).then(|| FilterValue::Text(raw.to_string())),
    })
}

fn value_for(clause: Clause, rest: &str) -> FilterValue {
    match clause {
        Clause::IsTrue => FilterValue::Bool(true),
        Clause::IsFalse => FilterValue::Bool(false),
        c if c.requires_no_value() => FilterValue::Present,
        c if c.is_array_valued() => {
            if rest.is_empty() {
                FilterValue::List(Vec::new())
            } else {
                FilterValue::List(rest.split(',').map(str::to_string).collect())
            }
        }
        _ => FilterValue::Text(rest.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEXT: &[Clause] = &[
        Clause::Contains,
        Clause::DoesNotContain,
        Clause::Equals,
        Clause::DoesNotEqual,
        Clause::IsIn,
        Clause::IsNotIn,
    ];

    fn text(value: &str) -> Option<FilterValue> {
        Some(FilterValue::Text(value.to_string()))
    }

    #[test]
    fn test_longest_prefix_wins() {
        let parsed = parse_wire_value("not.contains.acme", TEXT).unwrap();
        assert_eq!(parsed.clause, Clause::DoesNotContain);
        assert_eq!(parsed.value, text("acme"));

        let parsed = parse_wire_value("not.acme", TEXT).unwrap();
        assert_eq!(parsed.clause, Clause::DoesNotEqual);
        assert_eq!(parsed.value, text("acme"));
    }

    #[test]
    fn test_shorter_symbol_used_when_longer_not_allowed() {
        let parsed = parse_wire_value("not.contains.acme", &[Clause::DoesNotEqual]).unwrap();
        assert_eq!(parsed.clause, Clause::DoesNotEqual);
        assert_eq!(parsed.value, text("contains.acme"));
    }

    #[test]
    fn test_bare_value_defaults_to_equals() {
        let parsed = parse_wire_value("acme", TEXT).unwrap();
        assert_eq!(parsed.clause, Clause::Equals);
        assert_eq!(parsed.value, text("acme"));
    }

    #[test]
    fn test_empty_value() {
        let parsed = parse_wire_value("", TEXT).unwrap();
        assert_eq!(parsed.clause, Clause::Equals);
        assert_eq!(parsed.value, None);

        assert_eq!(parse_wire_value("", &[Clause::Contains]), None);

        let parsed = parse_wire_value("contains.", TEXT).unwrap();
        assert_eq!(parsed.clause, Clause::Contains);
        assert_eq!(parsed.value, text(""));
    }

    #[test]
    fn test_array_values() {
        let parsed = parse_wire_value("in.a,b,c", TEXT).unwrap();
        assert_eq!(parsed.clause, Clause::IsIn);
        assert_eq!(
            parsed.value,
            Some(FilterValue::List(vec!["a".into(), "b".into(), "c".into()]))
        );

        let parsed = parse_wire_value("between.2024-01-01,2024-01-31", &[Clause::Between]).unwrap();
        assert_eq!(
            parsed.value,
            Some(FilterValue::List(vec!["2024-01-01".into(), "2024-01-31".into()]))
        );
    }

    #[test]
    fn test_no_value_clauses() {
        let allowed = [Clause::IsTrue, Clause::IsFalse, Clause::IsSet, Clause::IsNotSet];

        let parsed = parse_wire_value("true", &allowed).unwrap();
        assert_eq!((parsed.clause, parsed.value), (Clause::IsTrue, Some(FilterValue::Bool(true))));

        let parsed = parse_wire_value("false.ignored", &allowed).unwrap();
        assert_eq!((parsed.clause, parsed.value), (Clause::IsFalse, Some(FilterValue::Bool(false))));

        let parsed = parse_wire_value("not.null", &allowed).unwrap();
        assert_eq!((parsed.clause, parsed.value), (Clause::IsSet, Some(FilterValue::Present)));

        let parsed = parse_wire_value("null", &allowed).unwrap();
        assert_eq!((parsed.clause, parsed.value), (Clause::IsNotSet, Some(FilterValue::Present)));

        assert_eq!(parse_wire_value("maybe", &allowed), None);
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(raw in ".*") {
            let _ = parse_wire_value(&raw, &Clause::ALL);
        }

        #[test]
        fn prop_not_contains_never_misread(value in "[a-z0-9 ]{0,12}") {
            let raw = format!("not.contains.{value}");
            let parsed = parse_wire_value(&raw, TEXT).unwrap();
            prop_assert_eq!(parsed.clause, Clause::DoesNotContain);
            prop_assert_eq!(parsed.value, Some(FilterValue::Text(value)));
        }
    }
}

//! Value mappings and cell decorators.
//!
//! A mapping replaces the primary cell value. A decorator never touches it:
//! it produces a side annotation stored under `(field, kind)` on the output
//! record.

use super::appearance::Image;
use crate::record::Record;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Lookup key for a raw cell value. Null and structured values have none.
pub(crate) fn lookup_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

type MapFn = dyn Fn(&Record, &Value) -> Value + Send + Sync;

/// Replacement rule for a cell's primary value.
#[derive(Clone)]
pub enum ValueMapping {
    /// Receives the input record and the raw value.
    Callback(Arc<MapFn>),
    /// Replaces values found in the table; others pass through unchanged.
    Lookup(BTreeMap<String, Value>),
}

impl ValueMapping {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Record, &Value) -> Value + Send + Sync + 'static,
    {
        ValueMapping::Callback(Arc::new(f))
    }

    pub fn lookup<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        ValueMapping::Lookup(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn apply(&self, record: &Record, raw: &Value) -> Value {
        match self {
            ValueMapping::Callback(f) => f(record, raw),
            ValueMapping::Lookup(table) => lookup_key(raw)
                .and_then(|key| table.get(&key))
                .cloned()
                .unwrap_or_else(|| raw.clone()),
        }
    }
}

impl fmt::Debug for ValueMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueMapping::Callback(_) => f.write_str("Callback(..)"),
            ValueMapping::Lookup(table) => f.debug_tuple("Lookup").field(table).finish(),
        }
    }
}

/// How a decorator picks its appearance for a row.
#[derive(Clone)]
pub enum DecoratorRule<T> {
    /// Same appearance on every row.
    Fixed(T),
    /// Computed from the input record; `None` leaves the row undecorated.
    Callback(Arc<dyn Fn(&Record) -> Option<T> + Send + Sync>),
    /// Keyed by the raw field value.
    Lookup(BTreeMap<String, T>),
}

impl<T: Clone> DecoratorRule<T> {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Option<T> + Send + Sync + 'static,
    {
        DecoratorRule::Callback(Arc::new(f))
    }

    pub fn lookup<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<T>,
    {
        DecoratorRule::Lookup(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn resolve(&self, record: &Record, raw: &Value) -> Option<T> {
        match self {
            DecoratorRule::Fixed(value) => Some(value.clone()),
            DecoratorRule::Callback(f) => f(record),
            DecoratorRule::Lookup(table) => lookup_key(raw).and_then(|key| table.get(&key).cloned()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for DecoratorRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoratorRule::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            DecoratorRule::Callback(_) => f.write_str("Callback(..)"),
            DecoratorRule::Lookup(table) => f.debug_tuple("Lookup").field(table).finish(),
        }
    }
}

/// Image decorator: a rule, or the URL read from a record attribute.
#[derive(Debug, Clone)]
pub enum ImageDecorator {
    Rule(DecoratorRule<Image>),
    Attribute { attribute: String, template: Image },
}

impl ImageDecorator {
    pub fn resolve(&self, record: &Record, raw: &Value) -> Option<Image> {
        match self {
            ImageDecorator::Rule(rule) => rule.resolve(record, raw),
            ImageDecorator::Attribute {
                attribute,
                template,
            } => match record.get(attribute) {
                Value::String(src) if !src.is_empty() => Some(template.clone().with_src(src.clone())),
                _ => None,
            },
        }
    }
}

impl From<DecoratorRule<Image>> for ImageDecorator {
    fn from(rule: DecoratorRule<Image>) -> Self {
        ImageDecorator::Rule(rule)
    }
}

/// What a link callback returns.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    Href(String),
    /// `{href, target, ...}` passed through as is.
    Structured(Map<String, Value>),
}

impl LinkTarget {
    /// A bare URL is normalized to `{href}`.
    pub fn to_json(&self) -> Value {
        match self {
            LinkTarget::Href(href) => {
                let mut out = Map::new();
                out.insert("href".into(), Value::from(href.as_str()));
                Value::Object(out)
            }
            LinkTarget::Structured(map) => Value::Object(map.clone()),
        }
    }
}

impl From<&str> for LinkTarget {
    fn from(href: &str) -> Self {
        LinkTarget::Href(href.to_string())
    }
}

impl From<String> for LinkTarget {
    fn from(href: String) -> Self {
        LinkTarget::Href(href)
    }
}

/// Link decorator.
#[derive(Clone)]
pub enum LinkRule {
    /// URL template; `{field}` placeholders are filled from the record.
    Url {
        href: String,
        target: Option<String>,
    },
    Callback(Arc<dyn Fn(&Record) -> Option<LinkTarget> + Send + Sync>),
}

impl LinkRule {
    pub fn url(href: impl Into<String>) -> Self {
        LinkRule::Url {
            href: href.into(),
            target: None,
        }
    }

    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Option<LinkTarget> + Send + Sync + 'static,
    {
        LinkRule::Callback(Arc::new(f))
    }

    pub fn resolve(&self, record: &Record) -> Option<LinkTarget> {
        match self {
            LinkRule::Url { href, target: None } => Some(LinkTarget::Href(interpolate(href, record))),
            LinkRule::Url {
                href,
                target: Some(target),
            } => {
                let mut map = Map::new();
                map.insert("href".into(), Value::from(interpolate(href, record)));
                map.insert("target".into(), Value::from(target.as_str()));
                Some(LinkTarget::Structured(map))
            }
            LinkRule::Callback(f) => f(record),
        }
    }
}

impl fmt::Debug for LinkRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkRule::Url { href, target } => f
                .debug_struct("Url")
                .field("href", href)
                .field("target", target)
                .finish(),
            LinkRule::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Replace `{name}` with the record's value for `name`; null becomes empty.
fn interpolate(template: &str, record: &Record) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(len) = rest[open + 1..].find('}') else {
            break;
        };
        out.push_str(&rest[..open]);
        let name = &rest[open + 1..open + 1 + len];
        if let Some(value) = lookup_key(record.get(name)) {
            out.push_str(&urlencoding::encode(&value));
        }
        rest = &rest[open + len + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::appearance::Icon;
    use serde_json::json;

    fn record() -> Record {
        Record::from_json(json!({"id": 7, "status": "active", "slug": "a b", "verified": true}))
    }

    #[test]
    fn test_lookup_mapping_passes_unknown_values_through() {
        let mapping = ValueMapping::lookup([("active", "Active"), ("banned", "Banned")]);
        assert_eq!(mapping.apply(&record(), &json!("active")), json!("Active"));
        assert_eq!(mapping.apply(&record(), &json!("pending")), json!("pending"));
        assert_eq!(mapping.apply(&record(), &Value::Null), Value::Null);
    }

    #[test]
    fn test_lookup_keys_numbers_and_bools_by_string_form() {
        let mapping = ValueMapping::lookup([("1", "One"), ("true", "Yes")]);
        assert_eq!(mapping.apply(&record(), &json!(1)), json!("One"));
        assert_eq!(mapping.apply(&record(), &json!(true)), json!("Yes"));
    }

    #[test]
    fn test_callback_mapping_sees_record() {
        let mapping = ValueMapping::callback(|record, raw| {
            json!(format!("{} #{}", raw.as_str().unwrap_or_default(), record.get("id")))
        });
        assert_eq!(mapping.apply(&record(), &json!("active")), json!("active #7"));
    }

    #[test]
    fn test_decorator_rules() {
        let fixed = DecoratorRule::Fixed(Icon::new("user"));
        assert_eq!(fixed.resolve(&record(), &Value::Null), Some(Icon::new("user")));

        let lookup: DecoratorRule<Icon> = DecoratorRule::lookup([("active", "check")]);
        assert_eq!(lookup.resolve(&record(), &json!("active")), Some(Icon::new("check")));
        assert_eq!(lookup.resolve(&record(), &json!("banned")), None);

        let callback = DecoratorRule::callback(|r: &Record| {
            (r.get("verified") == &json!(true)).then(|| Icon::new("badge-check"))
        });
        assert_eq!(callback.resolve(&record(), &Value::Null), Some(Icon::new("badge-check")));
    }

    #[test]
    fn test_image_from_attribute() {
        let decorator = ImageDecorator::Attribute {
            attribute: "avatar".into(),
            template: Image::default().rounded(),
        };
        let with_avatar = Record::from_json(json!({"avatar": "/u/7.png"}));
        assert_eq!(
            decorator.resolve(&with_avatar, &Value::Null).map(|i| i.src().to_string()),
            Some("/u/7.png".to_string())
        );
        assert_eq!(decorator.resolve(&record(), &Value::Null), None);
    }

    #[test]
    fn test_link_targets() {
        let link = LinkRule::url("/users/{id}/{slug}");
        assert_eq!(
            link.resolve(&record()).map(|t| t.to_json()),
            Some(json!({"href": "/users/7/a%20b"}))
        );

        let link = LinkRule::Url {
            href: "https://example.com".into(),
            target: Some("_blank".into()),
        };
        assert_eq!(
            link.resolve(&record()).map(|t| t.to_json()),
            Some(json!({"href": "https://example.com", "target": "_blank"}))
        );

        let link = LinkRule::callback(|r| Some(format!("/s/{}", r.get("status").as_str()?).into()));
        assert_eq!(
            link.resolve(&record()).map(|t| t.to_json()),
            Some(json!({"href": "/s/active"}))
        );
    }
}

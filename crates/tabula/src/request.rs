//! Request-side collaborators: the parameter bag and the cookie jar.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Read/write access to the ambient request parameters, keyed by dotted path
/// (`filter.users.name`).
pub trait ParameterBag {
    fn get(&self, key: &str) -> Option<&Value>;

    fn set(&mut self, key: &str, value: Value);

    /// String value at `key`, if present and a string.
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}

/// Read access to request cookies.
pub trait CookieJar {
    fn cookie(&self, name: &str) -> Option<&str>;
}

impl CookieJar for HashMap<String, String> {
    fn cookie(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl CookieJar for BTreeMap<String, String> {
    fn cookie(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// A jar with no cookies.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCookies;

impl CookieJar for NoCookies {
    fn cookie(&self, _name: &str) -> Option<&str> {
        None
    }
}

/// Flat parameter map parsed from a query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    params: BTreeMap<String, Value>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `a=1&filter[users][name]=contains.x`, URL-decoding keys and values.
    ///
    /// Bracketed keys are flattened to dotted keys; a repeated `[]` key
    /// collects its values into an array.
    pub fn from_query_string(query: &str) -> Self {
        let mut params = Self::new();
        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = normalize_key(&decode(raw_key));
            let value = decode(raw_value);

            if let Some(list_key) = key.strip_suffix("[]") {
                let entry = params
                    .params
                    .entry(list_key.to_string())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(items) = entry {
                    items.push(Value::String(value));
                }
            } else {
                params.params.insert(key, Value::String(value));
            }
        }
        params
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.params.iter()
    }
}

impl ParameterBag for QueryParams {
    fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        self.params.insert(key.to_string(), value);
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Form-style decoding: `+` is a space, then percent-decoding.
pub fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// `filter[users][name]` -> `filter.users.name`; `ids[]` keeps its `[]`.
fn normalize_key(key: &str) -> String {
    let Some(open) = key.find('[') else {
        return key.to_string();
    };
    let mut out = key[..open].to_string();
    let mut rest = &key[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            out.push_str(rest);
            return out;
        };
        let segment = &inner[..close];
        if segment.is_empty() {
            out.push_str("[]");
        } else {
            out.push('.');
            out.push_str(segment);
        }
        rest = &inner[close + 1..];
    }
    out.push_str(rest);
    out
}

//! Page-size and page-number resolution.

use serde::Serialize;
use serde_json::Value;

/// Query parameter carrying the page number.
pub fn page_name(table: Option<&str>) -> String {
    match table.filter(|t| !t.is_empty()) {
        Some(table) => format!("page.{table}"),
        None => "page".to_string(),
    }
}

/// Cookie holding the page-size preference for one table instance.
pub fn per_page_cookie(table: &str) -> String {
    format!("perPage_{}", table.to_lowercase())
}

/// Page size from the cookie value; anything not among `options` falls back
/// to the first option.
pub fn resolve_per_page(cookie: Option<&str>, options: &[u32]) -> u32 {
    let fallback = options.first().copied().unwrap_or(10);
    cookie
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .filter(|size| options.contains(size))
        .unwrap_or(fallback)
}

/// 1-based page number; missing, malformed or non-positive values mean 1.
pub fn resolve_page(raw: Option<&Value>) -> u64 {
    let page = match raw {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    page.filter(|p| *p >= 1).unwrap_or(1)
}

pub fn last_page(total: u64, per_page: u32) -> u64 {
    let per_page = u64::from(per_page.max(1));
    total.div_ceil(per_page).max(1)
}

/// Pagination block of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub current_page: u64,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u64,
    pub per_page_options: Vec<u32>,
}

//! Process-wide list of cookies the client sets in plain text.
//!
//! The page-size cookie is written by the renderer, not by the server, so an
//! encrypting cookie layer has to leave it alone. Its names are derived by
//! scanning every table definition once per process.

use crate::table::{per_page_cookie, TableDefinition};
use once_cell::sync::OnceCell;
use tracing::debug;

static PER_PAGE_COOKIES: OnceCell<Vec<String>> = OnceCell::new();

/// Cookie names for `definitions`, de-duplicated, in first-seen order.
pub fn cookie_names_for<'a, I, D>(definitions: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a D>,
    D: TableDefinition + ?Sized + 'a,
{
    let mut names: Vec<String> = Vec::new();
    for definition in definitions {
        let name = definition
            .name()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| definition.type_name());
        let cookie = per_page_cookie(name);
        if !names.contains(&cookie) {
            names.push(cookie);
        }
    }
    names
}

/// Cached cookie names. `scan` runs on the first call only; later calls
/// return the same slice whatever they pass.
pub fn unencrypted_cookie_names<F>(scan: F) -> &'static [String]
where
    F: FnOnce() -> Vec<Box<dyn TableDefinition>>,
{
    PER_PAGE_COOKIES.get_or_init(|| {
        let definitions = scan();
        let names = cookie_names_for(definitions.iter().map(|d| &**d));
        debug!(count = names.len(), "per-page cookie names cached");
        names
    })
}

//! Table orchestration.
//!
//! # Module Structure
//!
//! - `hash` - Structural layout hash
//! - `pagination` - Page-size cookie, page parameter, page metadata
//!
//! A [`Table`] is built from a [`TableDefinition`] and consumed by
//! [`Table::resolve`], which runs the stages in a fixed order: parse filters,
//! build the compound predicate, fetch the page, transform the rows, then
//! serialize and hash.

mod hash;
mod pagination;

pub use hash::{canonicalize, structural_hash};
pub use pagination::{
    last_page, page_name, per_page_cookie, resolve_page, resolve_per_page, PageMeta,
};

use crate::column::Column;
use crate::config::{validate_per_page_options, TableDefaults};
use crate::error::TableError;
use crate::filter::Filter;
use crate::query::Predicate;
use crate::record::OutputRecord;
use crate::request::{CookieJar, ParameterBag};
use crate::source::{PageRequest, RecordQuery, RecordSource};
use crate::text::basename;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info_span};

/// Reserved filter field carrying the global search term.
pub const SEARCH_FIELD: &str = "search";

/// Static description of a table: its resource, columns and filters.
///
/// Settings returning `None` fall back to [`TableDefaults`].
pub trait TableDefinition {
    /// Record type the table lists. `None` means the table cannot be built.
    fn resource(&self) -> Option<&str>;

    fn columns(&self) -> Vec<Column>;

    fn filters(&self) -> Vec<Filter> {
        Vec::new()
    }

    /// Declared table name, used for parameter and cookie scoping.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Short type name; the last resort for the table name.
    fn type_name(&self) -> &str {
        basename(std::any::type_name::<Self>())
    }

    fn default_sort(&self) -> Option<&str> {
        Some("id")
    }

    fn per_page_options(&self) -> Option<Vec<u32>> {
        None
    }

    fn sticky_header(&self) -> Option<bool> {
        None
    }

    fn sticky_pagination(&self) -> Option<bool> {
        None
    }

    fn resizable(&self) -> Option<bool> {
        None
    }
}

/// Everything the renderer receives for one resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePayload {
    pub name: String,
    pub page_name: String,
    pub sticky_header: bool,
    pub sticky_pagination: bool,
    pub searchable: Vec<String>,
    pub resizable: bool,
    pub headers: Vec<Value>,
    pub filters: Vec<Value>,
    pub data: Vec<Value>,
    pub meta: PageMeta,
    pub hash: String,
}

impl TablePayload {
    /// JSON text sent to the renderer.
    pub fn to_json(&self, pretty: bool) -> Result<String, TableError> {
        let text = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(text)
    }
}

/// A table bound to a record source, ready to resolve one request.
pub struct Table<'s> {
    declared_name: Option<String>,
    instance_name: Option<String>,
    type_name: String,
    resource: String,
    default_sort: Option<String>,
    columns: Vec<Column>,
    filters: Vec<Filter>,
    base_query: Option<Predicate>,
    per_page_options: Vec<u32>,
    sticky_header: bool,
    sticky_pagination: bool,
    resizable: bool,
    source: &'s dyn RecordSource,
}

impl std::fmt::Debug for Table<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name())
            .field("resource", &self.resource)
            .field("columns", &self.columns.len())
            .field("filters", &self.filters.len())
            .finish_non_exhaustive()
    }
}

impl<'s> Table<'s> {
    /// Build a table, failing if its resource is missing or unknown to `source`.
    pub fn make<D>(
        definition: &D,
        defaults: &TableDefaults,
        source: &'s dyn RecordSource,
    ) -> Result<Self, TableError>
    where
        D: TableDefinition + ?Sized,
    {
        let resource = definition
            .resource()
            .filter(|r| !r.is_empty())
            .ok_or(TableError::UndefinedResource)?;
        if !source.contains_resource(resource) {
            return Err(TableError::InvalidResource(resource.to_string()));
        }

        let per_page_options = definition
            .per_page_options()
            .filter(|options| !options.is_empty())
            .unwrap_or_else(|| defaults.per_page_options.clone());
        validate_per_page_options(&per_page_options)?;

        let mut columns = definition.columns();
        for column in &mut columns {
            column.inherit(defaults);
        }
        let mut filters = definition.filters();
        for filter in &mut filters {
            filter.inherit(defaults);
        }

        Ok(Self {
            declared_name: definition.name().map(str::to_string),
            instance_name: None,
            type_name: definition.type_name().to_string(),
            resource: resource.to_string(),
            default_sort: definition.default_sort().map(str::to_string),
            columns,
            filters,
            base_query: None,
            per_page_options,
            sticky_header: definition.sticky_header().unwrap_or(defaults.sticky_header),
            sticky_pagination: definition
                .sticky_pagination()
                .unwrap_or(defaults.sticky_pagination),
            resizable: definition.resizable().unwrap_or(defaults.resizable),
            source,
        })
    }

    /// Name this instance, so several tables can share one request.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.instance_name = Some(name.into());
        self
    }

    /// Restriction applied before any filter.
    pub fn with_query(mut self, predicate: Predicate) -> Self {
        self.base_query = Some(predicate);
        self
    }

    fn explicit_name(&self) -> Option<&str> {
        self.instance_name
            .as_deref()
            .or(self.declared_name.as_deref())
            .filter(|n| !n.is_empty())
    }

    /// Lowercased instance name, declared name or type name.
    pub fn name(&self) -> String {
        self.explicit_name()
            .unwrap_or(self.type_name.as_str())
            .to_lowercase()
    }

    fn scope(&self) -> Option<String> {
        self.explicit_name().map(str::to_lowercase)
    }

    pub fn page_name(&self) -> String {
        page_name(self.scope().as_deref())
    }

    pub fn per_page_cookie(&self) -> String {
        per_page_cookie(&self.name())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Backing field names of searchable columns.
    pub fn searchable(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_searchable())
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Column descriptors, in declaration order.
    pub fn headers(&self) -> Vec<Value> {
        self.columns.iter().map(Column::descriptor).collect()
    }

    /// The hashed shape of the table. Filter values and rows stay out.
    pub fn structure(&self) -> Value {
        let filters: Vec<Value> = self.filters.iter().map(|f| f.descriptor(false)).collect();
        json!({
            "name": self.name(),
            "pageName": self.page_name(),
            "stickyHeader": self.sticky_header,
            "stickyPagination": self.sticky_pagination,
            "searchable": self.searchable(),
            "resizable": self.resizable,
            "headers": self.headers(),
            "filters": filters,
        })
    }

    pub fn hash(&self) -> String {
        structural_hash(&self.structure())
    }

    /// Resolve one request into a payload. Record source failures are
    /// returned unchanged inside [`TableError::Source`].
    pub fn resolve(
        mut self,
        params: &mut dyn ParameterBag,
        cookies: &dyn CookieJar,
    ) -> Result<TablePayload, TableError> {
        let name = self.name();
        let span = info_span!("resolve", table = %name);
        let _enter = span.enter();

        let scope = self.scope();
        self.parse_filters(scope.as_deref(), params);
        let predicate = self.compound_predicate(scope.as_deref(), params);
        debug!(predicate = ?predicate, "compound predicate built");

        let per_page = resolve_per_page(cookies.cookie(&self.per_page_cookie()), &self.per_page_options);
        let page_name = self.page_name();
        let current_page = resolve_page(params.get(&page_name));
        debug!(per_page, current_page, "pagination resolved");

        let mut query = RecordQuery::new(self.resource.as_str()).restrict(predicate);
        if let Some(sort) = &self.default_sort {
            query = query.sort_by(sort.as_str());
        }
        let page = self.source.paginate(
            &query,
            PageRequest {
                page: current_page,
                per_page,
            },
        )?;

        let data: Vec<Value> = page
            .items
            .iter()
            .map(|record| {
                let mut output = OutputRecord::new();
                for column in &self.columns {
                    column.transform(record, &mut output);
                }
                output.to_value()
            })
            .collect();

        let hash = self.hash();
        debug!(hash = %hash, rows = data.len(), "table resolved");

        Ok(TablePayload {
            name,
            page_name,
            sticky_header: self.sticky_header,
            sticky_pagination: self.sticky_pagination,
            searchable: self.searchable(),
            resizable: self.resizable,
            headers: self.headers(),
            filters: self.filters.iter().map(|f| f.descriptor(true)).collect(),
            data,
            meta: PageMeta {
                current_page,
                per_page,
                total: page.total,
                last_page: last_page(page.total, per_page),
                per_page_options: self.per_page_options.clone(),
            },
            hash,
        })
    }

    fn parse_filters(&mut self, scope: Option<&str>, params: &mut dyn ParameterBag) {
        for filter in &mut self.filters {
            let key = filter.query_param(scope);
            if let Some(raw) = params.get(&key).and_then(raw_filter_value) {
                filter.parse_request_value(scope, &raw, params);
            }
        }
    }

    fn compound_predicate(&self, scope: Option<&str>, params: &dyn ParameterBag) -> Option<Predicate> {
        let mut parts: Vec<Predicate> = self.base_query.iter().cloned().collect();
        parts.extend(self.filters.iter().filter_map(Filter::query_predicate));

        let search_key = match scope {
            Some(scope) => format!("filter.{scope}.{SEARCH_FIELD}"),
            None => format!("filter.{SEARCH_FIELD}"),
        };
        let term = params.get(&search_key).and_then(raw_filter_value);
        let term = term.as_deref().map(str::trim).unwrap_or_default();
        if !term.is_empty() {
            let fields = self.searchable();
            if let Some(search) = Predicate::search(fields.iter().map(String::as_str), term) {
                parts.push(search);
            }
        }

        Predicate::and(parts)
    }
}

/// Raw filter string from a request parameter; lists are comma-joined.
fn raw_filter_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Null | Value::Object(_) => None,
    }
}

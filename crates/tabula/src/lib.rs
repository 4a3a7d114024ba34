//! Tabular resolution engine for remote table renderers.
//!
//! Given a table definition, a record source and the request's parameters and
//! cookies, the engine parses per-field filters from a compact wire encoding,
//! restricts and paginates the records, runs every row through the column
//! pipeline, and emits a JSON payload together with a structural hash the
//! renderer uses to invalidate its cached layout.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tabula::{
//!     Column, Filter, InMemorySource, NoCookies, QueryParams, Table, TableDefaults,
//!     TableDefinition,
//! };
//!
//! struct Users;
//!
//! impl TableDefinition for Users {
//!     fn resource(&self) -> Option<&str> {
//!         Some("users")
//!     }
//!
//!     fn columns(&self) -> Vec<Column> {
//!         vec![Column::text("id").sortable(), Column::text("name").searchable()]
//!     }
//!
//!     fn filters(&self) -> Vec<Filter> {
//!         vec![Filter::text("name")]
//!     }
//! }
//!
//! let source = InMemorySource::from_json(
//!     "users",
//!     json!([{"id": 1, "name": "Ada Smith"}, {"id": 2, "name": "Alan Turing"}]),
//! );
//! let mut params = QueryParams::from_query_string("filter.name=contains.smith");
//!
//! let payload = Table::make(&Users, &TableDefaults::default(), &source)?
//!     .resolve(&mut params, &NoCookies)?;
//!
//! assert_eq!(payload.meta.total, 1);
//! assert_eq!(payload.data[0]["name"], "Ada Smith");
//! # Ok::<(), tabula::TableError>(())
//! ```

pub mod clause;
pub mod column;
pub mod config;
pub mod definition;
pub mod error;
pub mod filter;
pub mod query;
pub mod record;
pub mod registry;
pub mod request;
pub mod source;
pub mod table;
mod text;

pub use clause::Clause;
pub use column::{Alignment, Column, ColumnKind, DecoratorRule, Icon, Image, LinkRule, LinkTarget, Variant};
pub use config::TableDefaults;
pub use definition::{DeclaredTable, TableDefinitionFile};
pub use error::{ConfigError, SourceError, TableError};
pub use filter::{Filter, FilterKind, FilterValue};
pub use query::Predicate;
pub use record::{OutputRecord, Record};
pub use request::{CookieJar, NoCookies, ParameterBag, QueryParams};
pub use source::{InMemorySource, Page, PageRequest, RecordQuery, RecordSource};
pub use table::{Table, TableDefinition, TablePayload};

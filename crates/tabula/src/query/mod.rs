//! Predicate adapter: the single translation table from filter clauses to
//! backing-store restrictions.
//!
//! # Module Structure
//!
//! - `predicate` - Restriction descriptors and the clause mapping
//! - `sql` - Parameterized SQL rendering for relational sources
//! - `matcher` - Compiled in-memory evaluation used by the bundled source

mod matcher;
mod predicate;
mod sql;

pub use matcher::{truthiness, CachedValue, CompiledPredicate};
pub use predicate::{parse_date, DateOp, LikePattern, Predicate, ValueKind};
pub use sql::{escape_like, SqlFragment};

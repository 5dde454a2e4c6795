//! # filtra-query
//!
//! Nested, relation-aware filtering for query builders.
//!
//! A client sends a filter such as
//!
//! ```json
//! { "author": { "posts": { "title": { "$contains": "rust" } } } }
//! ```
//!
//! and the [`Resolver`] turns it into conditions on a [`QueryScope`]: every
//! key that is not an operator is a field, and fields that lead to other
//! models become relation-exists sub-queries.
//!
//! ## Pieces
//!
//! - [`FilterRegistry`] maps operator symbols (`$eq`, `$in`, `$between`, ...)
//!   to strategies. [`Operator`] lists the built-in ones.
//! - [`FilterModel`] is implemented by the host to describe what may be
//!   filtered: fields, per-field operator allow-lists and relations.
//! - [`QueryScope`] is the query builder seam. [`SqlScope`] is a reference
//!   implementation that renders SQL for several [`Dialect`]s.
//! - [`Resolver`] validates a filter against a model and applies it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use filtra_query::{FilterExpr, Resolver, SqlScope};
//!
//! let resolver = Resolver::with_defaults();
//! let mut query = SqlScope::postgres("users");
//!
//! let filter = FilterExpr::from_json_str(r#"{"$in": [1, 2, 3]}"#)?;
//! resolver.apply(&user_model, &mut query, "id", &filter)?;
//!
//! let (sql, params) = query.to_where_sql();
//! assert_eq!(sql, "users.id IN ($1, $2, $3)");
//! ```
//!
//! ## Errors
//!
//! Every failure is a [`FilterError`] with a stable [`ErrorCode`]. Codes below
//! `P7000` are client errors (bad filter input); the rest point at engine
//! configuration.

pub mod context;
pub mod error;
pub mod filter;
pub mod logging;
pub mod model;
pub mod predicate;
pub mod registry;
pub mod relation;
pub mod resolver;
pub mod scope;
pub mod sql;
pub mod strategy;

#[cfg(test)]
mod testing;

#[doc(hidden)]
pub use tracing as __tracing;

pub use context::RelationPath;
pub use error::{ErrorCode, FilterError, FilterResult};
pub use filter::{FilterExpr, FilterValue};
pub use model::{FilterModel, RelatedModel};
pub use predicate::{COLUMN_MARKER, Comparison, Predicate};
pub use registry::{FilterRegistry, OperatorEntry, OperatorRef};
pub use relation::{JoinTableSpec, RelationJoin, RelationType};
pub use resolver::{ResolvedFilter, Resolver};
pub use scope::{Clause, QueryScope, ScopeBuilder, SqlScope};
pub use sql::{Dialect, SqlBuilder};
pub use strategy::{Operator, StrategyArgs, StrategyFn};

/// Commonly used types.
pub mod prelude {
    pub use crate::error::{FilterError, FilterResult};
    pub use crate::filter::{FilterExpr, FilterValue};
    pub use crate::model::{FilterModel, RelatedModel};
    pub use crate::registry::FilterRegistry;
    pub use crate::relation::{RelationJoin, RelationType};
    pub use crate::resolver::Resolver;
    pub use crate::scope::{QueryScope, SqlScope};
    pub use crate::sql::Dialect;
    pub use crate::strategy::Operator;
}

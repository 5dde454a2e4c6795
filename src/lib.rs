//! # Filtra
//!
//! Model-aware resolution of nested API filter expressions into relational
//! query predicates.
//!
//! Filtra provides:
//! - An extensible registry of filter operators (`$eq`, `$in`, `$between`,
//!   `$contains`, ...) with dialect-aware case-sensitive variants
//! - A resolver that walks nested filters through model relations and
//!   produces one relation-exists condition per top-level key
//! - Per-model field and operator allow-lists
//! - Model catalogs declared in code or in `filtra.toml`
//!
//! ## Quick Start
//!
//! ```rust
//! use filtra::prelude::*;
//!
//! let schema = Schema::new([
//!     ModelDef::new("User")
//!         .fields(["id", "email"])
//!         .relation(RelationDef::has_many("posts", "Post")),
//!     ModelDef::new("Post").fields(["id", "title"]),
//! ])?;
//! let engine = FilterEngine::new(Resolver::with_defaults(), schema, Dialect::PostgreSQL)?;
//!
//! let filters = FilterExpr::from_json_str(
//!     r#"{"posts": {"title": {"$startsWith": "Rust"}}}"#,
//! ).expect("valid JSON");
//! let query = engine.filter("User", &filters)?;
//!
//! assert_eq!(
//!     query.to_where_sql().0,
//!     "EXISTS (SELECT 1 FROM posts AS r1 WHERE r1.user_id = users.id AND r1.title ILIKE $1)"
//! );
//! # Ok::<(), filtra::SchemaError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The resolution engine: operators, registry, resolver and query scopes.
pub mod query {
    pub use filtra_query::*;
}

/// Model definitions, the model catalog and configuration.
pub mod schema {
    pub use filtra_schema::*;
}

pub use filtra_query::logging;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::query::prelude::*;
    pub use crate::schema::{FilterEngine, FiltraConfig, ModelDef, RelationDef, Schema};
}

// Re-export key types at the crate root
pub use query::{FilterError, FilterExpr, FilterRegistry, FilterValue, Operator, Resolver};
pub use schema::{FilterEngine, FiltraConfig, SchemaError};

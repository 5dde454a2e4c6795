//! # filtra-schema
//!
//! Model definitions and `filtra.toml` configuration for the filtra engine.
//!
//! Models can be declared in code with [`ModelDef`] and [`RelationDef`], or
//! in a configuration file loaded through [`FiltraConfig`]. Either way they
//! are validated into a [`Schema`], whose models implement
//! [`FilterModel`](filtra_query::FilterModel).
//!
//! ```rust,no_run
//! use filtra_query::FilterExpr;
//! use filtra_schema::{FilterEngine, FiltraConfig};
//!
//! let config = FiltraConfig::from_file("filtra.toml")?.with_environment("production");
//! let engine = FilterEngine::from_config(&config)?;
//!
//! let filters = FilterExpr::from_json_str(r#"{"email": {"$endsWith": "@example.com"}}"#)
//!     .expect("valid JSON");
//! let query = engine.filter("User", &filters)?;
//! println!("{}", query.to_select_sql().0);
//! # Ok::<(), filtra_schema::SchemaError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod schema;

pub use config::{
    DebugConfig, DebugOverride, EngineConfig, EngineOverride, EnvironmentOverride, FiltraConfig,
    ModelConfig, RelationConfig,
};
pub use engine::FilterEngine;
pub use error::{SchemaError, SchemaResult};
pub use model::{ModelDef, RelationDef};
pub use schema::{Schema, SchemaModel};

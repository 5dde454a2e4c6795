//! Configuration file parsing for `filtra.toml`.
//!
//! ```toml
//! [engine]
//! dialect = "postgresql"
//! operators = ["$eq", "$in", "$contains", "$null"]
//!
//! [debug]
//! log_filters = false
//!
//! [models.User]
//! table = "users"
//! fields = ["id", "email", "name"]
//!
//! [models.User.operators]
//! email = ["$eq", "$contains"]
//!
//! [models.User.relations.posts]
//! model = "Post"
//! kind = "one_to_many"
//! foreign_key = "author_id"
//!
//! [models.Post]
//! fields = ["id", "title"]
//!
//! [environments.test.debug]
//! log_filters = true
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use filtra_query::{Dialect, FilterRegistry, RelationType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};
use crate::model::{ModelDef, RelationDef};
use crate::schema::Schema;

/// Main configuration structure for `filtra.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FiltraConfig {
    /// Engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Debug/logging settings.
    #[serde(default)]
    pub debug: DebugConfig,

    /// Model definitions by name.
    #[serde(default)]
    pub models: IndexMap<String, ModelConfig>,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl FiltraConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        let expanded = expand_env_vars(content)?;
        toml::from_str(&expanded).map_err(|e| SchemaError::TomlError { source: e })
    }

    /// Apply environment-specific overrides.
    pub fn with_environment(mut self, env: &str) -> Self {
        if let Some(overrides) = self.environments.remove(env) {
            if let Some(engine) = overrides.engine {
                if let Some(dialect) = engine.dialect {
                    self.engine.dialect = dialect;
                }
                if let Some(operators) = engine.operators {
                    self.engine.operators = Some(operators);
                }
            }
            if let Some(debug) = overrides.debug {
                if let Some(log_filters) = debug.log_filters {
                    self.debug.log_filters = log_filters;
                }
            }
        }
        self
    }

    /// The configured query dialect.
    pub fn dialect(&self) -> Dialect {
        Dialect::from_name(&self.engine.dialect)
    }

    /// The operator registry: every built-in operator, narrowed to
    /// `engine.operators` when set.
    pub fn registry(&self) -> SchemaResult<FilterRegistry> {
        let registry = FilterRegistry::with_defaults();
        match &self.engine.operators {
            Some(allowed) => Ok(registry.only(allowed)?),
            None => Ok(registry),
        }
    }

    /// Model definitions described by the `[models]` tables.
    pub fn model_defs(&self) -> SchemaResult<Vec<ModelDef>> {
        self.models
            .iter()
            .map(|(name, model)| model.to_def(name))
            .collect()
    }

    /// Build and validate the model catalog.
    pub fn schema(&self) -> SchemaResult<Arc<Schema>> {
        Schema::new(self.model_defs()?)
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Dialect name (`postgresql`, `mysql`, `sqlite`, `mssql` or any other).
    #[serde(default = "default_dialect")]
    pub dialect: String,

    /// Operator symbols to enable; all built-in operators when unset.
    #[serde(default)]
    pub operators: Option<Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dialect: default_dialect(),
            operators: None,
        }
    }
}

fn default_dialect() -> String {
    "postgresql".to_string()
}

/// Debug configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Trace every resolved leaf predicate.
    #[serde(default)]
    pub log_filters: bool,
}

/// One `[models.<Name>]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Table name; derived from the model name when unset.
    #[serde(default)]
    pub table: Option<String>,

    /// Primary key column.
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Filterable columns.
    #[serde(default)]
    pub fields: Vec<String>,

    /// Per-field operator allow-lists.
    #[serde(default)]
    pub operators: HashMap<String, Vec<String>>,

    /// Relations by name.
    #[serde(default)]
    pub relations: IndexMap<String, RelationConfig>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl ModelConfig {
    fn to_def(&self, name: &str) -> SchemaResult<ModelDef> {
        let mut def = ModelDef::new(name)
            .primary_key(&self.primary_key)
            .fields(self.fields.iter().cloned());
        def.table = self.table.clone();
        def.operators = self.operators.clone();

        for (relation_name, relation) in &self.relations {
            let kind = RelationType::from_name(&relation.kind).ok_or_else(|| {
                SchemaError::invalid_relation(
                    name,
                    relation_name,
                    format!("unknown relation kind `{}`", relation.kind),
                )
            })?;
            def = def.relation(relation.to_def(relation_name, kind));
        }
        Ok(def)
    }
}

/// One `[models.<Name>.relations.<rel>]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelationConfig {
    /// Name of the related model.
    pub model: String,

    /// `one_to_one`, `one_to_many`, `many_to_one` or `many_to_many`.
    pub kind: String,

    /// Foreign key column.
    #[serde(default)]
    pub foreign_key: Option<String>,

    /// Referenced key column.
    #[serde(default)]
    pub owner_key: Option<String>,

    /// Join table (many-to-many).
    #[serde(default)]
    pub join_table: Option<String>,

    /// Join table column referencing the owning model.
    #[serde(default)]
    pub join_local_key: Option<String>,

    /// Join table column referencing the related model.
    #[serde(default)]
    pub join_foreign_key: Option<String>,
}

impl RelationConfig {
    fn to_def(&self, name: &str, kind: RelationType) -> RelationDef {
        RelationDef {
            foreign_key: self.foreign_key.clone(),
            owner_key: self.owner_key.clone(),
            join_table: self.join_table.clone(),
            join_local_key: self.join_local_key.clone(),
            join_foreign_key: self.join_foreign_key.clone(),
            ..RelationDef::new(name, &self.model, kind)
        }
    }
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Engine overrides.
    #[serde(default)]
    pub engine: Option<EngineOverride>,

    /// Debug overrides.
    #[serde(default)]
    pub debug: Option<DebugOverride>,
}

/// Engine override settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineOverride {
    /// Dialect override.
    pub dialect: Option<String>,
    /// Operator allow-list override.
    pub operators: Option<Vec<String>>,
}

/// Debug override settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugOverride {
    /// Leaf tracing override.
    pub log_filters: Option<bool>,
}

/// Replace `${VAR}` with the value of environment variable `VAR`.
///
/// Unset variables are left as written.
fn expand_env_vars(content: &str) -> SchemaResult<String> {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| SchemaError::config(e.to_string()))?;

    let mut result = content.to_string();
    for cap in re.captures_iter(content) {
        if let Ok(value) = std::env::var(&cap[1]) {
            result = result.replace(&cap[0], &value);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filtra_query::FilterModel;
    use pretty_assertions::assert_eq;

    const BLOG: &str = r#"
        [engine]
        dialect = "mysql"

        [models.User]
        fields = ["id", "email"]

        [models.User.operators]
        email = ["$eq", "$endsWith"]

        [models.User.relations.posts]
        model = "Post"
        kind = "has_many"
        foreign_key = "author_id"

        [models.Post]
        table = "articles"
        fields = ["id", "title"]

        [models.Post.relations.tags]
        model = "Tag"
        kind = "many_to_many"
        join_table = "article_tags"

        [models.Tag]
        fields = ["name"]

        [environments.test.engine]
        dialect = "sqlite"
        operators = ["$eq"]

        [environments.test.debug]
        log_filters = true
    "#;

    #[test]
    fn test_default_config() {
        let config = FiltraConfig::default();
        assert_eq!(config.dialect(), Dialect::PostgreSQL);
        assert_eq!(config.registry().unwrap().len(), 23);
        assert!(config.models.is_empty());
    }

    #[test]
    fn test_parse_models() {
        let config = FiltraConfig::from_str(BLOG).unwrap();
        assert_eq!(config.dialect(), Dialect::MySQL);
        assert_eq!(
            config.models.keys().collect::<Vec<_>>(),
            vec!["User", "Post", "Tag"]
        );

        let schema = config.schema().unwrap();
        let user = schema.model("User").unwrap();
        assert_eq!(user.available_fields(), &["id", "email", "posts"]);

        let posts = user.relation("posts").unwrap();
        assert_eq!(posts.join.related_table, "articles");
        assert_eq!(posts.join.related_column, "author_id");

        let tags = posts.model.relation("tags").unwrap();
        assert_eq!(
            tags.join.join_table.as_ref().map(|jt| jt.table_name.as_str()),
            Some("article_tags")
        );
    }

    #[test]
    fn test_environment_override() {
        let config = FiltraConfig::from_str(BLOG).unwrap().with_environment("test");
        assert_eq!(config.dialect(), Dialect::SQLite);
        assert!(config.debug.log_filters);
        assert_eq!(config.registry().unwrap().symbols(), vec!["$eq"]);

        let config = FiltraConfig::from_str(BLOG).unwrap().with_environment("prod");
        assert_eq!(config.dialect(), Dialect::MySQL);
    }

    #[test]
    fn test_unknown_operator_in_allow_list() {
        let config = FiltraConfig::from_str("[engine]\noperators = [\"$eq\", \"$regex\"]").unwrap();
        let err = config.registry().unwrap_err();
        assert_eq!(err.to_string(), "operator `$regex` is not registered");
    }

    #[test]
    fn test_unknown_relation_kind() {
        let config = FiltraConfig::from_str(
            r#"
            [models.User.relations.posts]
            model = "Post"
            kind = "lots"
            "#,
        )
        .unwrap();
        let err = config.schema().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid relation `User.posts`: unknown relation kind `lots`"
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = FiltraConfig::from_str("[engine]\ndialekt = \"mysql\"").unwrap_err();
        assert!(matches!(err, SchemaError::TomlError { .. }));
    }

    #[test]
    fn test_env_var_expansion() {
        // SAFETY: the variable name is unique to this test.
        unsafe {
            std::env::set_var("FILTRA_TEST_DIALECT", "mssql");
        }
        let expanded = expand_env_vars("dialect = \"${FILTRA_TEST_DIALECT}\"").unwrap();
        assert_eq!(expanded, "dialect = \"mssql\"");
        assert_eq!(
            expand_env_vars("x = \"${FILTRA_TEST_UNSET_VAR}\"").unwrap(),
            "x = \"${FILTRA_TEST_UNSET_VAR}\""
        );
        unsafe {
            std::env::remove_var("FILTRA_TEST_DIALECT");
        }
    }
}

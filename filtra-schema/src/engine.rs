//! Ready-to-use engine assembled from configuration.

use std::sync::Arc;

use filtra_query::{Dialect, FilterExpr, FilterModel, QueryScope, Resolver, SqlScope, logging};
use tracing::{debug, info};

use crate::config::FiltraConfig;
use crate::error::{SchemaError, SchemaResult};
use crate::schema::Schema;

/// A resolver bound to a model catalog and a dialect.
///
/// The engine is immutable and can be shared between threads behind an
/// [`Arc`].
#[derive(Debug, Clone)]
pub struct FilterEngine {
    resolver: Arc<Resolver>,
    schema: Arc<Schema>,
    dialect: Dialect,
}

impl FilterEngine {
    /// Assemble an engine from its parts.
    ///
    /// Every operator restriction in `schema` must name an operator the
    /// resolver knows.
    pub fn new(resolver: Resolver, schema: Arc<Schema>, dialect: Dialect) -> SchemaResult<Self> {
        schema.validate_operators(resolver.registry())?;
        Ok(Self {
            resolver: Arc::new(resolver),
            schema,
            dialect,
        })
    }

    /// Build an engine from a parsed `filtra.toml`.
    pub fn from_config(config: &FiltraConfig) -> SchemaResult<Self> {
        if config.debug.log_filters {
            logging::set_filter_logging(true);
        }
        let engine = Self::new(
            Resolver::new(config.registry()?),
            config.schema()?,
            config.dialect(),
        )?;
        info!(
            models = engine.schema.len(),
            operators = engine.resolver.registry().len(),
            dialect = %engine.dialect,
            "filter engine ready"
        );
        Ok(engine)
    }

    /// The resolver.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// The model catalog.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The dialect queries are rendered for.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// The capability provider for model `name`.
    pub fn model(&self, name: &str) -> SchemaResult<Arc<dyn FilterModel>> {
        self.schema
            .model(name)
            .ok_or_else(|| SchemaError::unknown_model(name))
    }

    /// An empty [`SqlScope`] over the table of model `name`.
    pub fn query(&self, name: &str) -> SchemaResult<SqlScope> {
        let def = self
            .schema
            .definition(name)
            .ok_or_else(|| SchemaError::unknown_model(name))?;
        Ok(SqlScope::new(self.dialect.clone(), def.table_name()))
    }

    /// Apply one top-level filter key to a query over model `name`.
    pub fn apply(
        &self,
        name: &str,
        query: &mut dyn QueryScope,
        field: &str,
        values: &FilterExpr,
    ) -> SchemaResult<()> {
        let model = self.model(name)?;
        debug!(model = name, field, "applying filter");
        Ok(self.resolver.apply(&model, query, field, values)?)
    }

    /// Apply every key of a decoded filter map to a query over model `name`.
    pub fn apply_all(
        &self,
        name: &str,
        query: &mut dyn QueryScope,
        filters: &FilterExpr,
    ) -> SchemaResult<()> {
        let model = self.model(name)?;
        Ok(self.resolver.apply_all(&model, query, filters)?)
    }

    /// Build a query over model `name` filtered by `filters`.
    pub fn filter(&self, name: &str, filters: &FilterExpr) -> SchemaResult<SqlScope> {
        let mut query = self.query(name)?;
        self.apply_all(name, &mut query, filters)?;
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filtra_query::{FilterError, FilterValue};
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"
        [engine]
        dialect = "postgres"
        operators = ["$eq", "$in", "$contains", "$null"]

        [models.User]
        fields = ["id", "email", "deleted_at"]

        [models.User.relations.posts]
        model = "Post"
        kind = "one_to_many"

        [models.Post]
        fields = ["id", "title"]

        [models.Post.operators]
        title = ["$contains"]
    "#;

    fn engine() -> FilterEngine {
        FilterEngine::from_config(&FiltraConfig::from_str(CONFIG).unwrap()).unwrap()
    }

    fn expr(json: &str) -> FilterExpr {
        FilterExpr::from_json_str(json).unwrap()
    }

    #[test]
    fn test_filter_renders_sql() {
        let query = engine()
            .filter(
                "User",
                &expr(r#"{"deleted_at": {"$null": true}, "posts": {"title": {"$contains": "rust"}}}"#),
            )
            .unwrap();

        let (sql, params) = query.to_select_sql();
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE users.deleted_at IS NULL AND EXISTS (SELECT 1 FROM posts AS r1 \
             WHERE r1.user_id = users.id AND r1.title ILIKE $1)"
        );
        assert_eq!(params, vec![FilterValue::from("%rust%")]);
    }

    #[test]
    fn test_unknown_model() {
        let err = engine().query("Comment").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownModel { ref name } if name == "Comment"));
    }

    #[test]
    fn test_disabled_operator_is_not_an_operator() {
        let err = engine()
            .filter("User", &expr(r#"{"id": {"$gt": 5}}"#))
            .unwrap_err();
        assert!(matches!(
            err.as_filter_error(),
            Some(FilterError::NoOperatorMatch { .. })
        ));
    }

    #[test]
    fn test_restriction_on_disabled_operator_fails() {
        let config = FiltraConfig::from_str(
            r#"
            [engine]
            operators = ["$eq"]

            [models.Post]
            fields = ["title"]

            [models.Post.operators]
            title = ["$contains"]
            "#,
        )
        .unwrap();
        let err = FilterEngine::from_config(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid field `Post.title`: unknown operator `$contains`"
        );
    }
}

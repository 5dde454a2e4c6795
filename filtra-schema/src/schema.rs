//! A validated set of models.

use std::fmt;
use std::sync::Arc;

use filtra_query::{FilterModel, FilterRegistry, RelatedModel, RelationJoin};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::model::ModelDef;

/// Validated model catalog.
///
/// Models reference each other by name. The catalog resolves those names
/// once, when it is built, and hands out [`FilterModel`] handles that share
/// it.
pub struct Schema {
    models: IndexMap<String, CompiledModel>,
}

struct CompiledModel {
    def: ModelDef,
    relations: IndexMap<String, (usize, RelationJoin)>,
}

impl Schema {
    /// Validate `models` and build the catalog.
    ///
    /// Fails on duplicate models or fields, operator restrictions on
    /// undeclared fields and relations to unknown models. All problems are
    /// reported at once.
    pub fn new(models: impl IntoIterator<Item = ModelDef>) -> SchemaResult<Arc<Self>> {
        let mut defs: IndexMap<String, ModelDef> = IndexMap::new();
        let mut errors = Vec::new();

        for model in models {
            if defs.contains_key(&model.name) {
                errors.push(SchemaError::duplicate("model", &model.name));
                continue;
            }
            defs.insert(model.name.clone(), model);
        }

        for def in defs.values() {
            errors.extend(check_model(def, &defs));
        }
        if let Some(err) = SchemaError::collect(errors) {
            return Err(err);
        }

        let compiled = defs
            .values()
            .map(|def| {
                let relations = def
                    .relations
                    .iter()
                    .filter_map(|(name, relation)| {
                        let (index, _, related) = defs.get_full(&relation.model)?;
                        Some((name.clone(), (index, relation.to_join(def, related))))
                    })
                    .collect();
                (
                    def.name.clone(),
                    CompiledModel {
                        def: def.clone(),
                        relations,
                    },
                )
            })
            .collect::<IndexMap<_, _>>();

        debug!(models = compiled.len(), "schema built");
        Ok(Arc::new(Self { models: compiled }))
    }

    /// Check every operator restriction against `registry`.
    pub fn validate_operators(&self, registry: &FilterRegistry) -> SchemaResult<()> {
        let mut errors = Vec::new();
        for model in self.models.values() {
            for (field, operators) in &model.def.operators {
                for op in operators.iter().filter(|op| !registry.contains(op)) {
                    errors.push(SchemaError::invalid_field(
                        &model.def.name,
                        field,
                        format!("unknown operator `{}`", op),
                    ));
                }
            }
        }
        SchemaError::collect(errors).map_or(Ok(()), Err)
    }

    /// The capability provider for model `name`.
    pub fn model(self: &Arc<Self>, name: &str) -> Option<Arc<dyn FilterModel>> {
        let index = self.models.get_index_of(name)?;
        Some(Arc::new(SchemaModel {
            schema: Arc::clone(self),
            index,
        }))
    }

    /// The definition of model `name`.
    pub fn definition(&self, name: &str) -> Option<&ModelDef> {
        self.models.get(name).map(|m| &m.def)
    }

    /// Model names, in declaration order.
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if the catalog holds no model.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.models.iter().map(|(name, m)| (name, &m.def)))
            .finish()
    }
}

fn check_model(def: &ModelDef, defs: &IndexMap<String, ModelDef>) -> Vec<SchemaError> {
    let mut errors = Vec::new();

    for (i, field) in def.fields.iter().enumerate() {
        if def.fields[..i].contains(field) {
            errors.push(SchemaError::invalid_field(
                &def.name,
                field,
                "declared more than once",
            ));
        }
    }

    let mut restricted: Vec<&String> = def.operators.keys().collect();
    restricted.sort();
    for field in restricted {
        if !def.has_field(field) {
            errors.push(SchemaError::invalid_field(
                &def.name,
                field,
                "operator restriction on an undeclared field",
            ));
        }
    }

    for (name, relation) in &def.relations {
        if !defs.contains_key(&relation.model) {
            errors.push(SchemaError::invalid_relation(
                &def.name,
                name,
                format!("unknown model `{}`", relation.model),
            ));
        }
    }

    errors
}

/// A model served from a [`Schema`].
#[derive(Clone)]
pub struct SchemaModel {
    schema: Arc<Schema>,
    index: usize,
}

impl SchemaModel {
    fn compiled(&self) -> &CompiledModel {
        &self.schema.models[self.index]
    }

    /// The model definition.
    pub fn definition(&self) -> &ModelDef {
        &self.compiled().def
    }
}

impl FilterModel for SchemaModel {
    fn name(&self) -> &str {
        &self.compiled().def.name
    }

    fn available_fields(&self) -> &[String] {
        &self.compiled().def.fields
    }

    fn available_filters_for(&self, field: &str) -> Option<&[String]> {
        self.compiled().def.operators.get(field).map(Vec::as_slice)
    }

    fn relation(&self, name: &str) -> Option<RelatedModel> {
        let (index, join) = self.compiled().relations.get(name)?;
        let related = SchemaModel {
            schema: Arc::clone(&self.schema),
            index: *index,
        };
        Some(RelatedModel::new(Arc::new(related), join.clone()))
    }
}

impl fmt::Debug for SchemaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SchemaModel").field(&self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RelationDef;
    use filtra_query::RelationType;
    use pretty_assertions::assert_eq;

    fn blog() -> Vec<ModelDef> {
        vec![
            ModelDef::new("User")
                .fields(["id", "name"])
                .relation(RelationDef::has_many("posts", "Post")),
            ModelDef::new("Post")
                .fields(["id", "title"])
                .restrict("title", ["$eq", "$contains"])
                .relation(RelationDef::belongs_to("author", "User")),
        ]
    }

    #[test]
    fn test_models_resolve_relations() {
        let schema = Schema::new(blog()).unwrap();
        assert_eq!(schema.model_names().collect::<Vec<_>>(), vec!["User", "Post"]);

        let user = schema.model("User").unwrap();
        let posts = user.relation("posts").unwrap();
        assert_eq!(posts.model.name(), "Post");
        assert_eq!(posts.join.relation_type, RelationType::OneToMany);
        assert_eq!(
            posts.model.available_filters_for("title"),
            Some(&["$eq".to_string(), "$contains".to_string()][..])
        );

        let author = posts.model.relation("author").unwrap();
        assert_eq!(author.model.name(), "User");
        assert!(user.relation("name").is_none());
        assert!(schema.model("Comment").is_none());
    }

    #[test]
    fn test_all_problems_are_reported() {
        let err = Schema::new(vec![
            ModelDef::new("User").fields(["id", "id"]),
            ModelDef::new("User"),
            ModelDef::new("Post")
                .restrict("body", ["$eq"])
                .relation(RelationDef::belongs_to("author", "Author")),
        ])
        .unwrap_err();

        match err {
            SchemaError::ValidationFailed { count, errors } => {
                assert_eq!(count, 4);
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                assert_eq!(
                    messages,
                    vec![
                        "duplicate model `User`",
                        "invalid field `User.id`: declared more than once",
                        "invalid field `Post.body`: operator restriction on an undeclared field",
                        "invalid relation `Post.author`: unknown model `Author`",
                    ]
                );
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_operators() {
        let schema = Schema::new(vec![
            ModelDef::new("Post")
                .field("title")
                .restrict("title", ["$eq", "$fuzzy"]),
        ])
        .unwrap();

        assert!(schema.validate_operators(&FilterRegistry::with_defaults()).is_err());
        let mut registry = FilterRegistry::with_defaults();
        registry
            .register("$fuzzy", filtra_query::Operator::Like)
            .unwrap();
        assert!(schema.validate_operators(&registry).is_ok());
    }
}

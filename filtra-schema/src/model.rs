//! Model and relation definitions.
//!
//! A [`ModelDef`] declares what a client may filter on one model. Definitions
//! are plain data; [`Schema`](crate::Schema) validates a set of them and
//! serves each as a [`FilterModel`](filtra_query::FilterModel).
//!
//! ```rust
//! use filtra_schema::{ModelDef, RelationDef};
//!
//! let user = ModelDef::new("User")
//!     .fields(["id", "name", "email"])
//!     .restrict("email", ["$eq", "$endsWith"])
//!     .relation(RelationDef::has_many("posts", "Post"));
//!
//! assert_eq!(user.table_name(), "users");
//! assert!(user.has_field("posts"));
//! ```

use std::collections::HashMap;

use filtra_query::{JoinTableSpec, RelationJoin, RelationType};
use indexmap::IndexMap;

/// Filtering capabilities of one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDef {
    /// Model name.
    pub name: String,
    /// Table name; derived from the model name when unset.
    pub table: Option<String>,
    /// Primary key column.
    pub primary_key: String,
    /// Filterable columns and relations, in declaration order.
    pub fields: Vec<String>,
    /// Per-field operator allow-lists.
    pub operators: HashMap<String, Vec<String>>,
    /// Relations by name.
    pub relations: IndexMap<String, RelationDef>,
}

impl ModelDef {
    /// Create a model with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            primary_key: "id".to_string(),
            fields: Vec::new(),
            operators: HashMap::new(),
            relations: IndexMap::new(),
        }
    }

    /// Set the table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set the primary key column.
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Add a filterable field.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Add several filterable fields.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Restrict `field` to the given operator symbols.
    pub fn restrict<I, S>(mut self, field: impl Into<String>, operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operators
            .insert(field.into(), operators.into_iter().map(Into::into).collect());
        self
    }

    /// Add a relation. Its name becomes a filterable field.
    pub fn relation(mut self, relation: RelationDef) -> Self {
        if !self.has_field(&relation.name) {
            self.fields.push(relation.name.clone());
        }
        self.relations.insert(relation.name.clone(), relation);
        self
    }

    /// The table name, explicit or derived (`BlogPost` -> `blog_posts`).
    pub fn table_name(&self) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| format!("{}s", snake_case(&self.name)))
    }

    /// Check if `field` is declared.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

/// Declaration of a relation from one model to another.
///
/// Keys left unset follow the usual conventions: `{owner}_id` for foreign
/// keys, the primary key for owner keys, and `{a}_{b}` (alphabetical) for
/// join tables.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDef {
    /// Relation name (field name on the owning model).
    pub name: String,
    /// Name of the related model.
    pub model: String,
    /// Relation kind.
    pub kind: RelationType,
    /// Foreign key column.
    pub foreign_key: Option<String>,
    /// Referenced key column.
    pub owner_key: Option<String>,
    /// Join table for many-to-many relations.
    pub join_table: Option<String>,
    /// Join table column referencing the owning model.
    pub join_local_key: Option<String>,
    /// Join table column referencing the related model.
    pub join_foreign_key: Option<String>,
}

impl RelationDef {
    /// Create a relation of `kind`.
    pub fn new(name: impl Into<String>, model: impl Into<String>, kind: RelationType) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            kind,
            foreign_key: None,
            owner_key: None,
            join_table: None,
            join_local_key: None,
            join_foreign_key: None,
        }
    }

    /// The related table holds a foreign key to this model; at most one row.
    pub fn has_one(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(name, model, RelationType::OneToOne)
    }

    /// The related table holds a foreign key to this model.
    pub fn has_many(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(name, model, RelationType::OneToMany)
    }

    /// This model's table holds a foreign key to the related model.
    pub fn belongs_to(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(name, model, RelationType::ManyToOne)
    }

    /// Rows on both sides are linked through a join table.
    pub fn many_to_many(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(name, model, RelationType::ManyToMany)
    }

    /// Set the foreign key column.
    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    /// Set the referenced key column.
    pub fn owner_key(mut self, column: impl Into<String>) -> Self {
        self.owner_key = Some(column.into());
        self
    }

    /// Set the join table and its two key columns.
    pub fn through(
        mut self,
        table: impl Into<String>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.join_table = Some(table.into());
        self.join_local_key = Some(local_key.into());
        self.join_foreign_key = Some(foreign_key.into());
        self
    }

    /// Compute the join between `owner` and `related` rows.
    pub fn to_join(&self, owner: &ModelDef, related: &ModelDef) -> RelationJoin {
        let owner_fk = || format!("{}_id", snake_case(&owner.name));
        match self.kind {
            RelationType::OneToOne | RelationType::OneToMany => RelationJoin::has(
                &self.name,
                self.kind,
                related.table_name(),
                self.foreign_key.clone().unwrap_or_else(owner_fk),
                self.owner_key
                    .clone()
                    .unwrap_or_else(|| owner.primary_key.clone()),
            ),
            RelationType::ManyToOne => RelationJoin::belongs_to(
                &self.name,
                related.table_name(),
                self.foreign_key
                    .clone()
                    .unwrap_or_else(|| format!("{}_id", snake_case(&self.name))),
                self.owner_key
                    .clone()
                    .unwrap_or_else(|| related.primary_key.clone()),
            ),
            RelationType::ManyToMany => {
                let table = self.join_table.clone().unwrap_or_else(|| {
                    let mut names = [snake_case(&owner.name), snake_case(&related.name)];
                    names.sort();
                    names.join("_")
                });
                let spec = JoinTableSpec::new(
                    table,
                    self.join_local_key.clone().unwrap_or_else(owner_fk),
                    self.join_foreign_key
                        .clone()
                        .unwrap_or_else(|| format!("{}_id", snake_case(&related.name))),
                );
                RelationJoin::through(
                    &self.name,
                    related.table_name(),
                    spec,
                    owner.primary_key.clone(),
                    related.primary_key.clone(),
                )
            }
        }
    }
}

/// `BlogPost` -> `blog_post`.
pub(crate) fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user() -> ModelDef {
        ModelDef::new("User").fields(["id", "email"])
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("User"), "user");
        assert_eq!(snake_case("BlogPost"), "blog_post");
        assert_eq!(snake_case("tag"), "tag");
    }

    #[test]
    fn test_relation_adds_field_once() {
        let model = ModelDef::new("User")
            .field("posts")
            .relation(RelationDef::has_many("posts", "Post"));
        assert_eq!(model.fields, vec!["posts"]);
    }

    #[test]
    fn test_has_many_join_defaults() {
        let post = ModelDef::new("Post");
        let join = RelationDef::has_many("posts", "Post").to_join(&user(), &post);
        assert_eq!(join, RelationJoin::has("posts", RelationType::OneToMany, "posts", "user_id", "id"));
    }

    #[test]
    fn test_belongs_to_join_defaults() {
        let post = ModelDef::new("Post");
        let join = RelationDef::belongs_to("author", "User").to_join(&post, &user());
        assert_eq!(join, RelationJoin::belongs_to("author", "users", "author_id", "id"));
    }

    #[test]
    fn test_many_to_many_join() {
        let post = ModelDef::new("Post");
        let tag = ModelDef::new("Tag").table("labels");

        let join = RelationDef::many_to_many("tags", "Tag").to_join(&post, &tag);
        assert_eq!(
            join,
            RelationJoin::through(
                "tags",
                "labels",
                JoinTableSpec::new("post_tag", "post_id", "tag_id"),
                "id",
                "id"
            )
        );

        let join = RelationDef::many_to_many("tags", "Tag")
            .through("post_labels", "post_ref", "label_ref")
            .to_join(&post, &tag);
        assert_eq!(
            join.join_table,
            Some(JoinTableSpec::new("post_labels", "post_ref", "label_ref"))
        );
    }
}

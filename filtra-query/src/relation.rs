//! Relation metadata used to build relation-exists scopes.

use std::fmt;

/// Type of relation between models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    /// One-to-one relation (e.g., User has one Profile).
    OneToOne,
    /// One-to-many relation (e.g., User has many Posts).
    OneToMany,
    /// Many-to-one relation (e.g., Post belongs to User).
    ManyToOne,
    /// Many-to-many relation (e.g., Post has many Tags).
    ManyToMany,
}

impl RelationType {
    /// Check if this relation returns multiple records.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }

    /// Check if this relation returns a single record.
    pub fn is_one(&self) -> bool {
        matches!(self, Self::OneToOne | Self::ManyToOne)
    }

    /// Parse from the snake_case name used in configuration files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "one_to_one" | "has_one" => Some(Self::OneToOne),
            "one_to_many" | "has_many" => Some(Self::OneToMany),
            "many_to_one" | "belongs_to" => Some(Self::ManyToOne),
            "many_to_many" | "belongs_to_many" => Some(Self::ManyToMany),
            _ => None,
        }
    }

    /// The snake_case name of this relation type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OneToOne => "one_to_one",
            Self::OneToMany => "one_to_many",
            Self::ManyToOne => "many_to_one",
            Self::ManyToMany => "many_to_many",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Specification for a join table (many-to-many).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTableSpec {
    /// Name of the join table.
    pub table_name: String,
    /// Column referencing the source model.
    pub source_column: String,
    /// Column referencing the target model.
    pub target_column: String,
}

impl JoinTableSpec {
    /// Create a new join table spec.
    pub fn new(
        table_name: impl Into<String>,
        source_column: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            source_column: source_column.into(),
            target_column: target_column.into(),
        }
    }
}

/// How a parent row is correlated with the rows of a related table.
///
/// For direct relations the correlation is
/// `related.related_column = parent.parent_column`. For many-to-many the join
/// table sits in between: `join.source_column = parent.parent_column` and
/// `join.target_column = related.related_column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationJoin {
    /// Name of the relation (field name on the parent model).
    pub name: String,
    /// Type of relation.
    pub relation_type: RelationType,
    /// Table of the related model.
    pub related_table: String,
    /// Column on the parent side of the correlation.
    pub parent_column: String,
    /// Column on the related side of the correlation.
    pub related_column: String,
    /// Join table for many-to-many relations.
    pub join_table: Option<JoinTableSpec>,
}

impl RelationJoin {
    /// A relation where the related table holds the foreign key
    /// (`related.foreign_key = parent.owner_key`).
    pub fn has(
        name: impl Into<String>,
        relation_type: RelationType,
        related_table: impl Into<String>,
        foreign_key: impl Into<String>,
        owner_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            relation_type,
            related_table: related_table.into(),
            parent_column: owner_key.into(),
            related_column: foreign_key.into(),
            join_table: None,
        }
    }

    /// A relation where the parent table holds the foreign key
    /// (`related.owner_key = parent.foreign_key`).
    pub fn belongs_to(
        name: impl Into<String>,
        related_table: impl Into<String>,
        foreign_key: impl Into<String>,
        owner_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            relation_type: RelationType::ManyToOne,
            related_table: related_table.into(),
            parent_column: foreign_key.into(),
            related_column: owner_key.into(),
            join_table: None,
        }
    }

    /// A many-to-many relation through a join table.
    pub fn through(
        name: impl Into<String>,
        related_table: impl Into<String>,
        join_table: JoinTableSpec,
        parent_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            relation_type: RelationType::ManyToMany,
            related_table: related_table.into(),
            parent_column: parent_key.into(),
            related_column: related_key.into(),
            join_table: Some(join_table),
        }
    }
}

//! The model capability provider consumed by the resolver.
//!
//! A [`FilterModel`] describes what may be filtered on a model: which fields,
//! which operators per field, and which relations lead to other models.

use std::fmt;
use std::sync::Arc;

use crate::error::{FilterError, FilterResult};
use crate::relation::RelationJoin;
use crate::scope::{QueryScope, ScopeBuilder};

/// Filtering capabilities of one model.
pub trait FilterModel: Send + Sync {
    /// Model name used in diagnostics.
    fn name(&self) -> &str;

    /// Filterable field and relation names.
    fn available_fields(&self) -> &[String];

    /// Operators allowed on `field`; `None` when unrestricted.
    fn available_filters_for(&self, field: &str) -> Option<&[String]>;

    /// The model reached through relation `name`, or `None` if `name` is not
    /// a relation.
    fn relation(&self, name: &str) -> Option<RelatedModel>;

    /// Check if `field` is filterable.
    fn is_filterable(&self, field: &str) -> bool {
        self.available_fields().iter().any(|f| f == field)
    }

    /// Restrict `query` to rows having at least one row related through
    /// `relation` for which `inner` holds.
    fn scope_having_related(
        &self,
        query: &mut dyn QueryScope,
        relation: &str,
        inner: &mut ScopeBuilder<'_>,
    ) -> FilterResult<()> {
        let related = self.relation(relation).ok_or_else(|| {
            FilterError::field_not_supported(relation, self.name(), self.available_fields())
        })?;
        query.where_has(&related.join, inner)
    }
}

/// A related model together with the join that reaches it.
#[derive(Clone)]
pub struct RelatedModel {
    /// Capabilities of the related model.
    pub model: Arc<dyn FilterModel>,
    /// How parent rows correlate with related rows.
    pub join: RelationJoin,
}

impl RelatedModel {
    /// Create a related model handle.
    pub fn new(model: Arc<dyn FilterModel>, join: RelationJoin) -> Self {
        Self { model, join }
    }
}

impl fmt::Debug for RelatedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelatedModel")
            .field("model", &self.model.name())
            .field("join", &self.join)
            .finish()
    }
}

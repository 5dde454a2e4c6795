//! The filter resolver.
//!
//! [`Resolver::apply`] takes one top-level filter key and its (possibly
//! nested) value, validates it against the model's capabilities and adds one
//! composed condition to the query. Field keys that are not operators are
//! followed as relations, and the leaf predicate ends up inside one
//! relation-exists scope per relation on the way.
//!
//! The resolver itself holds nothing but the operator registry. All
//! traversal state lives in a context created for each call, so a single
//! resolver can serve any number of threads at once.
//!
//! ```rust,ignore
//! let resolver = Resolver::with_defaults();
//! let mut query = SqlScope::postgres("comments");
//!
//! let filter = FilterExpr::from_json_str(r#"{"posts": {"title": {"$like": "%x%"}}}"#)?;
//! resolver.apply(&comment_model, &mut query, "author", &filter)?;
//! // EXISTS (SELECT 1 FROM users AS r1 WHERE ...
//! //   AND EXISTS (SELECT 1 FROM posts AS r2 WHERE ... AND r2.title ILIKE $1))
//! ```

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;
use tracing::debug;

use crate::context::ResolverContext;
use crate::error::{FilterError, FilterResult};
use crate::filter::FilterExpr;
use crate::model::FilterModel;
use crate::predicate::Predicate;
use crate::registry::{FilterRegistry, OperatorEntry};
use crate::scope::QueryScope;
use crate::sql::Dialect;

/// Resolves nested filter expressions into query conditions.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    registry: FilterRegistry,
}

impl Resolver {
    /// Create a resolver over `registry`.
    pub fn new(registry: FilterRegistry) -> Self {
        Self { registry }
    }

    /// Create a resolver over every built-in operator.
    pub fn with_defaults() -> Self {
        Self::new(FilterRegistry::with_defaults())
    }

    /// The operator registry.
    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    fn no_operator_match(&self) -> FilterError {
        FilterError::no_operator_match(self.registry.symbols())
    }

    /// Check that an operator is reachable in `expr`.
    ///
    /// A node whose keys include an operator is valid. Otherwise the check
    /// descends into the node's first value, following the path the
    /// resolution itself takes first.
    pub fn validate(&self, expr: &FilterExpr) -> FilterResult<()> {
        let mut node = expr;
        loop {
            let map = match node.as_map() {
                Some(map) if !map.is_empty() => map,
                _ => return Err(self.no_operator_match()),
            };
            if map.keys().any(|key| self.registry.contains(key)) {
                return Ok(());
            }
            match map.first() {
                Some((_, next)) => node = next,
                None => return Err(self.no_operator_match()),
            }
        }
    }

    /// Resolve one top-level key without touching a query.
    pub fn resolve(
        &self,
        model: &Arc<dyn FilterModel>,
        dialect: &Dialect,
        field: &str,
        values: &FilterExpr,
    ) -> FilterResult<ResolvedFilter> {
        debug!(model = model.name(), field, dialect = %dialect, "resolving filter");
        self.validate(values)?;

        let mut ctx = ResolverContext::new(Arc::clone(model), dialect);
        self.dispatch(&mut ctx, field, values)?;
        debug_assert!(ctx.path.is_empty() && ctx.previous.is_empty());
        Ok(ctx.resolved)
    }

    /// Resolve one top-level key and add its condition to `query`.
    ///
    /// Nothing is added to the query unless the whole expression resolves.
    pub fn apply(
        &self,
        model: &Arc<dyn FilterModel>,
        query: &mut dyn QueryScope,
        field: &str,
        values: &FilterExpr,
    ) -> FilterResult<()> {
        let resolved = self.resolve(model, query.dialect(), field, values)?;
        resolved.apply(query)
    }

    /// Apply every top-level key of a decoded filter map, in order.
    ///
    /// All keys are resolved before any condition is added, so a failing key
    /// leaves the query untouched.
    pub fn apply_all(
        &self,
        model: &Arc<dyn FilterModel>,
        query: &mut dyn QueryScope,
        filters: &FilterExpr,
    ) -> FilterResult<()> {
        let map = filters.as_map().ok_or_else(|| self.no_operator_match())?;
        let resolved = map
            .iter()
            .map(|(field, values)| self.resolve(model, query.dialect(), field, values))
            .collect::<FilterResult<Vec<_>>>()?;
        for filter in &resolved {
            filter.apply(query)?;
        }
        Ok(())
    }

    fn dispatch(
        &self,
        ctx: &mut ResolverContext<'_>,
        field: &str,
        values: &FilterExpr,
    ) -> FilterResult<()> {
        match self.registry.lookup(field) {
            Some(entry) => self.apply_leaf(ctx, entry, values),
            None => self.enter_relation(ctx, field, values),
        }
    }

    fn apply_leaf(
        &self,
        ctx: &mut ResolverContext<'_>,
        entry: &OperatorEntry,
        values: &FilterExpr,
    ) -> FilterResult<()> {
        // An operator with no field above it has no column to act on.
        let Some((column, relations)) = ctx.path.split_last() else {
            return Err(FilterError::field_not_supported(
                entry.symbol(),
                ctx.current.name(),
                ctx.current.available_fields(),
            ));
        };
        let args = values.to_arguments().ok_or_else(|| {
            FilterError::invalid_arguments(
                entry.symbol(),
                "expected a value or a list of values, got a nested filter",
            )
        })?;

        let predicate = entry.build(column, &args, ctx.dialect)?;
        crate::filtra_trace!(
            column = %column,
            operator = entry.symbol(),
            depth = relations.len(),
            "built leaf predicate"
        );
        ctx.resolved.insert(relations, &ctx.previous, predicate);
        Ok(())
    }

    fn enter_relation(
        &self,
        ctx: &mut ResolverContext<'_>,
        field: &str,
        nested: &FilterExpr,
    ) -> FilterResult<()> {
        let entries = match nested.as_map() {
            Some(map) if !map.is_empty() => map,
            _ => return Err(self.no_operator_match()),
        };

        for (sub_field, sub_filter) in entries {
            validate_field(ctx.current.as_ref(), field)?;
            validate_operator(ctx.current.as_ref(), field, sub_field)?;

            ctx.path.push(field);
            let is_relation = !self.registry.contains(sub_field);
            if is_relation {
                if let Err(err) = ctx.enter(field) {
                    ctx.path.pop();
                    return Err(err);
                }
            }

            let result = self.dispatch(ctx, sub_field, sub_filter);

            if is_relation {
                ctx.leave();
            }
            ctx.path.pop();
            result?;
        }
        Ok(())
    }
}

fn validate_field(model: &dyn FilterModel, field: &str) -> FilterResult<()> {
    if model.is_filterable(field) {
        Ok(())
    } else {
        Err(FilterError::field_not_supported(
            field,
            model.name(),
            model.available_fields(),
        ))
    }
}

fn validate_operator(model: &dyn FilterModel, field: &str, operator: &str) -> FilterResult<()> {
    match model.available_filters_for(field) {
        Some(allowed) if !allowed.iter().any(|a| a == operator) => Err(
            FilterError::operator_not_supported(field, operator, allowed),
        ),
        _ => Ok(()),
    }
}

/// The outcome of resolving one top-level key: predicates grouped by the
/// relation scopes they must be applied in.
///
/// Leaves that share a relation prefix share the scope for it, so a
/// top-level key always yields a single nested condition.
#[derive(Clone, Default)]
pub struct ResolvedFilter {
    entries: Vec<ScopeEntry>,
}

#[derive(Clone)]
enum ScopeEntry {
    Predicate(Predicate),
    Relation {
        name: SmolStr,
        owner: Arc<dyn FilterModel>,
        inner: ResolvedFilter,
    },
}

impl ResolvedFilter {
    /// Predicates applied directly at this level.
    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.entries.iter().filter_map(|entry| match entry {
            ScopeEntry::Predicate(p) => Some(p),
            ScopeEntry::Relation { .. } => None,
        })
    }

    /// Relation scopes opened at this level, in first-seen order.
    pub fn relations(&self) -> impl Iterator<Item = (&str, &ResolvedFilter)> {
        self.entries.iter().filter_map(|entry| match entry {
            ScopeEntry::Relation { name, inner, .. } => Some((name.as_str(), inner)),
            ScopeEntry::Predicate(_) => None,
        })
    }

    /// The scope opened for `relation` at this level.
    pub fn relation(&self, relation: &str) -> Option<&ResolvedFilter> {
        self.relations()
            .find(|(name, _)| *name == relation)
            .map(|(_, inner)| inner)
    }

    /// Deepest relation nesting.
    pub fn depth(&self) -> usize {
        self.relations()
            .map(|(_, inner)| 1 + inner.depth())
            .max()
            .unwrap_or(0)
    }

    /// Total number of leaf predicates at every level.
    pub fn predicate_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match entry {
                ScopeEntry::Predicate(_) => 1,
                ScopeEntry::Relation { inner, .. } => inner.predicate_count(),
            })
            .sum()
    }

    /// Check if nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(
        &mut self,
        relations: &[SmolStr],
        owners: &[Arc<dyn FilterModel>],
        predicate: Predicate,
    ) {
        let (Some((name, relations)), Some((owner, owners))) =
            (relations.split_first(), owners.split_first())
        else {
            self.entries.push(ScopeEntry::Predicate(predicate));
            return;
        };

        let existing = self.entries.iter_mut().find_map(|entry| match entry {
            ScopeEntry::Relation {
                name: n, inner, ..
            } if n == name => Some(inner),
            _ => None,
        });
        match existing {
            Some(inner) => inner.insert(relations, owners, predicate),
            None => {
                let mut inner = ResolvedFilter::default();
                inner.insert(relations, owners, predicate);
                self.entries.push(ScopeEntry::Relation {
                    name: name.clone(),
                    owner: Arc::clone(owner),
                    inner,
                });
            }
        }
    }

    /// Add the resolved conditions to `query`, opening a relation scope for
    /// every relation level.
    pub fn apply(&self, query: &mut dyn QueryScope) -> FilterResult<()> {
        for entry in &self.entries {
            match entry {
                ScopeEntry::Predicate(predicate) => predicate.apply(query),
                ScopeEntry::Relation { name, owner, inner } => {
                    owner.scope_having_related(query, name, &mut |sub| inner.apply(sub))?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ResolvedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}

impl fmt::Debug for ScopeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(p) => p.fmt(f),
            Self::Relation { name, owner, inner } => f
                .debug_struct("Relation")
                .field("name", name)
                .field("owner", &owner.name())
                .field("inner", inner)
                .finish(),
        }
    }
}

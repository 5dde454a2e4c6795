//! Per-call traversal state of the resolver.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::error::{FilterError, FilterResult};
use crate::model::FilterModel;
use crate::resolver::ResolvedFilter;
use crate::sql::Dialect;

/// Names accumulated while descending through a filter expression.
///
/// The last segment is the column a leaf operator applies to; the segments
/// before it are the relations leading from the root model to the model that
/// owns that column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationPath {
    segments: SmallVec<[SmolStr; 4]>,
}

impl RelationPath {
    /// Create an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `segment`.
    pub fn push(&mut self, segment: impl Into<SmolStr>) {
        self.segments.push(segment.into());
    }

    /// Leave the innermost segment.
    pub fn pop(&mut self) -> Option<SmolStr> {
        self.segments.pop()
    }

    /// The innermost segment.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(SmolStr::as_str)
    }

    /// Split into the innermost segment and the segments leading to it.
    pub fn split_last(&self) -> Option<(&SmolStr, &[SmolStr])> {
        self.segments.split_last()
    }

    /// All segments, outermost first.
    pub fn segments(&self) -> &[SmolStr] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for RelationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// State of one resolution, created fresh for every top-level key.
///
/// `previous` holds the owner of every relation segment in `path`, so
/// `previous[i]` is the model on which `path[i]` is a relation.
pub(crate) struct ResolverContext<'a> {
    pub(crate) dialect: &'a Dialect,
    pub(crate) current: Arc<dyn FilterModel>,
    pub(crate) previous: Vec<Arc<dyn FilterModel>>,
    pub(crate) path: RelationPath,
    pub(crate) resolved: ResolvedFilter,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(root: Arc<dyn FilterModel>, dialect: &'a Dialect) -> Self {
        Self {
            dialect,
            current: root,
            previous: Vec::new(),
            path: RelationPath::new(),
            resolved: ResolvedFilter::default(),
        }
    }

    /// Swap the current model for the one reached through `relation`.
    pub(crate) fn enter(&mut self, relation: &str) -> FilterResult<()> {
        let related = self.current.relation(relation).ok_or_else(|| {
            FilterError::field_not_supported(
                relation,
                self.current.name(),
                self.current.available_fields(),
            )
        })?;
        let owner = std::mem::replace(&mut self.current, related.model);
        self.previous.push(owner);
        Ok(())
    }

    /// Restore the model saved by the matching [`enter`](Self::enter).
    pub(crate) fn leave(&mut self) {
        if let Some(owner) = self.previous.pop() {
            self.current = owner;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_is_lifo() {
        let mut path = RelationPath::new();
        path.push("author");
        path.push("posts");
        path.push("title");
        assert_eq!(path.to_string(), "author.posts.title");

        let (column, relations) = path.split_last().unwrap();
        assert_eq!(column, "title");
        assert_eq!(relations, &[SmolStr::new("author"), SmolStr::new("posts")]);

        assert_eq!(path.pop().as_deref(), Some("title"));
        assert_eq!(path.last(), Some("posts"));
        path.pop();
        path.pop();
        assert!(path.is_empty());
        assert!(path.split_last().is_none());
    }
}

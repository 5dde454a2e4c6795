//! Predicates produced by operator strategies.
//!
//! A [`Predicate`] is a single condition on one column. It knows nothing about
//! relations: the resolver wraps it in relation scopes before handing it to a
//! [`QueryScope`].

use crate::filter::FilterValue;
use crate::scope::QueryScope;

/// Marker replaced by the qualified column name when a raw condition is rendered.
pub const COLUMN_MARKER: &str = "{column}";

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
}

impl Comparison {
    /// Get the SQL operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

/// A condition on a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column <op> value`.
    Compare {
        /// Column name.
        column: String,
        /// Comparison operator.
        op: Comparison,
        /// Right-hand value.
        value: FilterValue,
    },
    /// `column [NOT] IN (values)`.
    In {
        /// Column name.
        column: String,
        /// Candidate values (never empty).
        values: Vec<FilterValue>,
        /// Whether this is `NOT IN`.
        negated: bool,
    },
    /// `column IS [NOT] NULL`.
    Null {
        /// Column name.
        column: String,
        /// Whether this is `IS NOT NULL`.
        negated: bool,
    },
    /// `column [NOT] BETWEEN low AND high`.
    Between {
        /// Column name.
        column: String,
        /// Lower bound.
        low: FilterValue,
        /// Upper bound.
        high: FilterValue,
        /// Whether this is `NOT BETWEEN`.
        negated: bool,
    },
    /// `column [NOT] LIKE pattern`.
    Like {
        /// Column name.
        column: String,
        /// LIKE pattern including wildcards.
        pattern: String,
        /// Whether this is `NOT LIKE`.
        negated: bool,
    },
    /// Dialect-specific condition.
    ///
    /// `sql` contains [`COLUMN_MARKER`] where the column goes and one `?` per
    /// entry in `params`.
    Raw {
        /// Column name.
        column: String,
        /// SQL template.
        sql: String,
        /// Bound values, in order of the `?` markers.
        params: Vec<FilterValue>,
    },
}

impl Predicate {
    /// Create an equality predicate.
    pub fn equals(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Compare {
            column: column.into(),
            op: Comparison::Eq,
            value: value.into(),
        }
    }

    /// Create an `IN` predicate.
    pub fn is_in(column: impl Into<String>, values: Vec<FilterValue>) -> Self {
        Self::In {
            column: column.into(),
            values,
            negated: false,
        }
    }

    /// Create an `IS NULL` predicate.
    pub fn is_null(column: impl Into<String>) -> Self {
        Self::Null {
            column: column.into(),
            negated: false,
        }
    }

    /// The column this predicate constrains.
    pub fn column(&self) -> &str {
        match self {
            Self::Compare { column, .. }
            | Self::In { column, .. }
            | Self::Null { column, .. }
            | Self::Between { column, .. }
            | Self::Like { column, .. }
            | Self::Raw { column, .. } => column,
        }
    }

    /// Add this condition to a query scope.
    pub fn apply(&self, query: &mut dyn QueryScope) {
        match self {
            Self::Compare { column, op, value } => query.where_compare(column, *op, value.clone()),
            Self::In {
                column,
                values,
                negated,
            } => query.where_in(column, values.clone(), *negated),
            Self::Null { column, negated } => query.where_null(column, *negated),
            Self::Between {
                column,
                low,
                high,
                negated,
            } => query.where_between(column, low.clone(), high.clone(), *negated),
            Self::Like {
                column,
                pattern,
                negated,
            } => query.where_like(column, pattern.clone(), *negated),
            Self::Raw {
                column,
                sql,
                params,
            } => query.where_raw(column, sql, params.clone()),
        }
    }
}

//! The query scope abstraction predicates are applied to.
//!
//! [`QueryScope`] is the narrow surface the engine needs from a host query
//! builder. [`SqlScope`] is a reference implementation that records clauses
//! and renders a parameterized SQL condition, with relation scopes expressed
//! as correlated `EXISTS` sub-queries.
//!
//! ```rust
//! use filtra_query::{Comparison, Dialect, QueryScope, SqlScope};
//!
//! let mut query = SqlScope::new(Dialect::PostgreSQL, "users");
//! query.where_compare("age", Comparison::Gte, 18.into());
//! query.where_null("deleted_at", false);
//!
//! let (sql, params) = query.to_where_sql();
//! assert_eq!(sql, "users.age >= $1 AND users.deleted_at IS NULL");
//! assert_eq!(params.len(), 1);
//! ```

use crate::error::FilterResult;
use crate::filter::FilterValue;
use crate::predicate::{COLUMN_MARKER, Comparison, Predicate};
use crate::relation::RelationJoin;
use crate::sql::{Dialect, SqlBuilder};

/// Callback that builds conditions inside a relation scope.
pub type ScopeBuilder<'a> = dyn FnMut(&mut dyn QueryScope) -> FilterResult<()> + 'a;

/// The host query builder, as seen by the filter engine.
///
/// Every `where_*` call adds one condition; conditions are ANDed.
pub trait QueryScope {
    /// Dialect of the storage engine this query targets.
    fn dialect(&self) -> &Dialect;

    /// Add `column <op> value`.
    fn where_compare(&mut self, column: &str, op: Comparison, value: FilterValue);

    /// Add `column [NOT] IN (values)`.
    fn where_in(&mut self, column: &str, values: Vec<FilterValue>, negated: bool);

    /// Add `column IS [NOT] NULL`.
    fn where_null(&mut self, column: &str, negated: bool);

    /// Add `column [NOT] BETWEEN low AND high`.
    fn where_between(&mut self, column: &str, low: FilterValue, high: FilterValue, negated: bool);

    /// Add `column [NOT] LIKE pattern`.
    fn where_like(&mut self, column: &str, pattern: String, negated: bool);

    /// Add a dialect-specific condition (see [`Predicate::Raw`]).
    fn where_raw(&mut self, column: &str, sql: &str, params: Vec<FilterValue>);

    /// Restrict rows to those having at least one related row for which
    /// `inner` holds.
    ///
    /// If `inner` fails nothing is added to the query.
    fn where_has(&mut self, join: &RelationJoin, inner: &mut ScopeBuilder<'_>) -> FilterResult<()>;
}

/// A clause recorded by [`SqlScope`].
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// A plain column condition.
    Where(Predicate),
    /// A correlated relation-exists sub-query.
    Exists {
        /// How the sub-query is correlated with the outer row.
        join: RelationJoin,
        /// Conditions inside the sub-query.
        scope: SqlScope,
    },
}

/// A [`QueryScope`] that renders to SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlScope {
    dialect: Dialect,
    table: String,
    alias: Option<String>,
    depth: usize,
    clauses: Vec<Clause>,
}

impl SqlScope {
    /// Create a scope over a root table.
    pub fn new(dialect: Dialect, table: impl Into<String>) -> Self {
        Self {
            dialect,
            table: table.into(),
            alias: None,
            depth: 0,
            clauses: Vec::new(),
        }
    }

    /// Create a PostgreSQL scope.
    pub fn postgres(table: impl Into<String>) -> Self {
        Self::new(Dialect::PostgreSQL, table)
    }

    /// Create a MySQL scope.
    pub fn mysql(table: impl Into<String>) -> Self {
        Self::new(Dialect::MySQL, table)
    }

    /// Create a SQLite scope.
    pub fn sqlite(table: impl Into<String>) -> Self {
        Self::new(Dialect::SQLite, table)
    }

    /// Table this scope selects from.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Name columns are qualified with: the alias inside sub-queries, the
    /// table at the root.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    /// Nesting depth (0 for the root scope).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Recorded clauses, in insertion order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Check if no clause has been recorded.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Deepest relation nesting below this scope.
    pub fn max_relation_depth(&self) -> usize {
        self.clauses
            .iter()
            .map(|clause| match clause {
                Clause::Where(_) => 0,
                Clause::Exists { scope, .. } => 1 + scope.max_relation_depth(),
            })
            .max()
            .unwrap_or(0)
    }

    fn push(&mut self, predicate: Predicate) {
        self.clauses.push(Clause::Where(predicate));
    }

    /// Render the recorded clauses as a condition (`TRUE` when empty).
    pub fn to_where_sql(&self) -> (String, Vec<FilterValue>) {
        let mut builder = SqlBuilder::new(self.dialect.clone());
        if self.clauses.is_empty() {
            builder.push("TRUE");
        } else {
            self.render_clauses(&mut builder);
        }
        builder.build()
    }

    /// Render a full `SELECT *` statement.
    pub fn to_select_sql(&self) -> (String, Vec<FilterValue>) {
        let mut builder = SqlBuilder::new(self.dialect.clone());
        builder.push("SELECT * FROM ").push_identifier(&self.table);
        if !self.clauses.is_empty() {
            builder.push(" WHERE ");
            self.render_clauses(&mut builder);
        }
        builder.build()
    }

    fn render_clauses(&self, b: &mut SqlBuilder) {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                b.push(" AND ");
            }
            match clause {
                Clause::Where(predicate) => self.render_predicate(predicate, b),
                Clause::Exists { join, scope } => self.render_exists(join, scope, b),
            }
        }
    }

    fn render_predicate(&self, predicate: &Predicate, b: &mut SqlBuilder) {
        let q = self.qualifier();
        match predicate {
            Predicate::Compare { column, op, value } => {
                b.push_column(q, column);
                match (op, value) {
                    (Comparison::Eq, FilterValue::Null) => {
                        b.push(" IS NULL");
                    }
                    (Comparison::Ne, FilterValue::Null) => {
                        b.push(" IS NOT NULL");
                    }
                    _ => {
                        b.push(format!(" {} ", op.as_sql())).push_param(value.clone());
                    }
                }
            }
            Predicate::In {
                column,
                values,
                negated,
            } => {
                b.push_column(q, column)
                    .push(if *negated { " NOT IN (" } else { " IN (" });
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        b.push(", ");
                    }
                    b.push_param(v.clone());
                }
                b.push(")");
            }
            Predicate::Null { column, negated } => {
                b.push_column(q, column)
                    .push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Predicate::Between {
                column,
                low,
                high,
                negated,
            } => {
                b.push_column(q, column)
                    .push(if *negated { " NOT BETWEEN " } else { " BETWEEN " })
                    .push_param(low.clone())
                    .push(" AND ")
                    .push_param(high.clone());
            }
            Predicate::Like {
                column,
                pattern,
                negated,
            } => {
                b.push_column(q, column)
                    .push(if *negated { " NOT LIKE " } else { " LIKE " })
                    .push_param(pattern.clone());
            }
            Predicate::Raw {
                column,
                sql,
                params,
            } => {
                let qualified = format!(
                    "{}.{}",
                    self.dialect.quote_identifier(q),
                    self.dialect.quote_identifier(column)
                );
                // Placeholders are only looked for in the template text, never
                // in the substituted column.
                let mut params = params.iter();
                let mut segments = sql.split(COLUMN_MARKER).peekable();
                while let Some(segment) = segments.next() {
                    let mut chunks = segment.split('?').peekable();
                    while let Some(chunk) = chunks.next() {
                        b.push(chunk);
                        if chunks.peek().is_some() {
                            match params.next() {
                                Some(v) => b.push_param(v.clone()),
                                None => b.push("?"),
                            };
                        }
                    }
                    if segments.peek().is_some() {
                        b.push(&qualified);
                    }
                }
            }
        }
    }

    fn render_exists(&self, join: &RelationJoin, scope: &SqlScope, b: &mut SqlBuilder) {
        let alias = scope.qualifier();
        b.push("EXISTS (SELECT 1 FROM ")
            .push_identifier(&join.related_table)
            .push(" AS ")
            .push_identifier(alias);

        match &join.join_table {
            Some(jt) => {
                let pivot = format!("{}_pivot", alias);
                b.push(" INNER JOIN ")
                    .push_identifier(&jt.table_name)
                    .push(" AS ")
                    .push_identifier(&pivot)
                    .push(" ON ")
                    .push_column(&pivot, &jt.target_column)
                    .push(" = ")
                    .push_column(alias, &join.related_column)
                    .push(" WHERE ")
                    .push_column(&pivot, &jt.source_column)
                    .push(" = ")
                    .push_column(self.qualifier(), &join.parent_column);
            }
            None => {
                b.push(" WHERE ")
                    .push_column(alias, &join.related_column)
                    .push(" = ")
                    .push_column(self.qualifier(), &join.parent_column);
            }
        }

        if !scope.clauses.is_empty() {
            b.push(" AND ");
            scope.render_clauses(b);
        }
        b.push(")");
    }
}

impl QueryScope for SqlScope {
    fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    fn where_compare(&mut self, column: &str, op: Comparison, value: FilterValue) {
        self.push(Predicate::Compare {
            column: column.to_string(),
            op,
            value,
        });
    }

    fn where_in(&mut self, column: &str, values: Vec<FilterValue>, negated: bool) {
        self.push(Predicate::In {
            column: column.to_string(),
            values,
            negated,
        });
    }

    fn where_null(&mut self, column: &str, negated: bool) {
        self.push(Predicate::Null {
            column: column.to_string(),
            negated,
        });
    }

    fn where_between(&mut self, column: &str, low: FilterValue, high: FilterValue, negated: bool) {
        self.push(Predicate::Between {
            column: column.to_string(),
            low,
            high,
            negated,
        });
    }

    fn where_like(&mut self, column: &str, pattern: String, negated: bool) {
        self.push(Predicate::Like {
            column: column.to_string(),
            pattern,
            negated,
        });
    }

    fn where_raw(&mut self, column: &str, sql: &str, params: Vec<FilterValue>) {
        self.push(Predicate::Raw {
            column: column.to_string(),
            sql: sql.to_string(),
            params,
        });
    }

    fn where_has(&mut self, join: &RelationJoin, inner: &mut ScopeBuilder<'_>) -> FilterResult<()> {
        let depth = self.depth + 1;
        let mut scope = SqlScope {
            dialect: self.dialect.clone(),
            table: join.related_table.clone(),
            alias: Some(format!("r{}", depth)),
            depth,
            clauses: Vec::new(),
        };
        inner(&mut scope)?;
        self.clauses.push(Clause::Exists {
            join: join.clone(),
            scope,
        });
        Ok(())
    }
}

//! Operator strategies.
//!
//! Every operator is a case of the closed [`Operator`] enum. Each case maps to
//! a plain function pointer ([`StrategyFn`]) that turns `(column, values)`
//! into a [`Predicate`]. Strategies never touch a query: they only describe
//! the condition, and the few operators with no portable SQL form (the
//! case-sensitive ones) dispatch on the query's [`Dialect`].

use std::fmt;

use crate::error::{FilterError, FilterResult};
use crate::filter::FilterValue;
use crate::predicate::{COLUMN_MARKER, Comparison, Predicate};
use crate::sql::Dialect;

/// Everything a strategy needs to build its predicate.
#[derive(Debug, Clone, Copy)]
pub struct StrategyArgs<'a> {
    /// Symbol the operator was invoked with (for diagnostics).
    pub symbol: &'a str,
    /// Column the condition applies to.
    pub column: &'a str,
    /// Operator arguments.
    pub values: &'a [FilterValue],
    /// Dialect of the target query.
    pub dialect: &'a Dialect,
}

impl<'a> StrategyArgs<'a> {
    /// Bundle strategy arguments.
    pub fn new(
        symbol: &'a str,
        column: &'a str,
        values: &'a [FilterValue],
        dialect: &'a Dialect,
    ) -> Self {
        Self {
            symbol,
            column,
            values,
            dialect,
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> FilterError {
        FilterError::invalid_arguments(self.symbol, reason)
    }

    fn unsupported(&self) -> FilterError {
        FilterError::unsupported_dialect(self.dialect.name(), self.symbol)
    }

    /// Exactly one scalar value.
    fn single(&self) -> FilterResult<&'a FilterValue> {
        match self.values {
            [v] if v.is_scalar() => Ok(v),
            [v] => Err(self.invalid(format!("expected a scalar, got {}", v.type_name()))),
            [] => Err(self.invalid("expected a value, got none")),
            vs => Err(self.invalid(format!("expected a single value, got {}", vs.len()))),
        }
    }

    /// Exactly one non-null scalar value.
    fn ordered(&self) -> FilterResult<&'a FilterValue> {
        let v = self.single()?;
        if v.is_null() {
            return Err(self.invalid("null cannot be compared"));
        }
        Ok(v)
    }

    /// One or more non-null scalar values.
    fn list(&self) -> FilterResult<Vec<FilterValue>> {
        if self.values.is_empty() {
            return Err(self.invalid("expected at least one value"));
        }
        if let Some(v) = self.values.iter().find(|v| !v.is_scalar() || v.is_null()) {
            return Err(self.invalid(format!("list items must be scalars, got {}", v.type_name())));
        }
        Ok(self.values.to_vec())
    }

    /// Exactly two non-null scalar values.
    fn pair(&self) -> FilterResult<(FilterValue, FilterValue)> {
        match self.values {
            [low, high] if [low, high].iter().all(|v| v.is_scalar() && !v.is_null()) => {
                Ok((low.clone(), high.clone()))
            }
            [_, _] => Err(self.invalid("bounds must be non-null scalars")),
            vs => Err(self.invalid(format!("expected exactly two values, got {}", vs.len()))),
        }
    }

    /// Optional boolean flag, `true` when absent or `null`.
    fn flag(&self) -> FilterResult<bool> {
        let v = match self.values {
            [] => return Ok(true),
            [v] => v,
            vs => {
                return Err(self.invalid(format!("expected at most one value, got {}", vs.len())));
            }
        };
        if v.is_null() {
            return Ok(true);
        }
        if let Some(b) = v.as_bool() {
            return Ok(b);
        }
        if let Some(s) = v.as_str() {
            return match s.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(self.invalid(format!("expected a boolean, got `{}`", s))),
            };
        }
        match v {
            FilterValue::Int(1) => Ok(true),
            FilterValue::Int(0) => Ok(false),
            v => Err(self.invalid(format!("expected a boolean, got {}", v.type_name()))),
        }
    }

    /// Exactly one value usable inside a LIKE pattern.
    fn text(&self) -> FilterResult<String> {
        match self.ordered()? {
            FilterValue::String(s) => Ok(s.clone()),
            FilterValue::Int(i) => Ok(i.to_string()),
            FilterValue::Float(f) => Ok(f.to_string()),
            v => Err(self.invalid(format!("expected text, got {}", v.type_name()))),
        }
    }

    fn compare(&self, op: Comparison, value: &FilterValue) -> Predicate {
        Predicate::Compare {
            column: self.column.to_string(),
            op,
            value: value.clone(),
        }
    }

    fn raw(&self, sql: String, params: Vec<FilterValue>) -> Predicate {
        Predicate::Raw {
            column: self.column.to_string(),
            sql,
            params,
        }
    }
}

/// Signature every strategy implements.
pub type StrategyFn = fn(&StrategyArgs<'_>) -> FilterResult<Predicate>;

/// The closed set of built-in operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `$eq`
    Equals,
    /// `$eqc`
    EqualsCaseSensitive,
    /// `$ne`
    NotEquals,
    /// `$lt`
    LessThan,
    /// `$lte`
    LessOrEqual,
    /// `$gt`
    GreaterThan,
    /// `$gte`
    GreaterOrEqual,
    /// `$in`
    In,
    /// `$notIn`
    NotIn,
    /// `$null`
    Null,
    /// `$notNull`
    NotNull,
    /// `$between`
    Between,
    /// `$notBetween`
    NotBetween,
    /// `$like`
    Like,
    /// `$likec`
    LikeCaseSensitive,
    /// `$contains`
    Contains,
    /// `$notContains`
    NotContains,
    /// `$containsc`
    ContainsCaseSensitive,
    /// `$notContainsc`
    NotContainsCaseSensitive,
    /// `$startsWith`
    StartsWith,
    /// `$startsWithc`
    StartsWithCaseSensitive,
    /// `$endsWith`
    EndsWith,
    /// `$endsWithc`
    EndsWithCaseSensitive,
}

impl Operator {
    /// Every built-in operator, in default registration order.
    pub const ALL: [Operator; 23] = [
        Self::Equals,
        Self::EqualsCaseSensitive,
        Self::NotEquals,
        Self::LessThan,
        Self::LessOrEqual,
        Self::GreaterThan,
        Self::GreaterOrEqual,
        Self::In,
        Self::NotIn,
        Self::Null,
        Self::NotNull,
        Self::Between,
        Self::NotBetween,
        Self::Like,
        Self::LikeCaseSensitive,
        Self::Contains,
        Self::NotContains,
        Self::ContainsCaseSensitive,
        Self::NotContainsCaseSensitive,
        Self::StartsWith,
        Self::StartsWithCaseSensitive,
        Self::EndsWith,
        Self::EndsWithCaseSensitive,
    ];

    /// Default symbol of this operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Equals => "$eq",
            Self::EqualsCaseSensitive => "$eqc",
            Self::NotEquals => "$ne",
            Self::LessThan => "$lt",
            Self::LessOrEqual => "$lte",
            Self::GreaterThan => "$gt",
            Self::GreaterOrEqual => "$gte",
            Self::In => "$in",
            Self::NotIn => "$notIn",
            Self::Null => "$null",
            Self::NotNull => "$notNull",
            Self::Between => "$between",
            Self::NotBetween => "$notBetween",
            Self::Like => "$like",
            Self::LikeCaseSensitive => "$likec",
            Self::Contains => "$contains",
            Self::NotContains => "$notContains",
            Self::ContainsCaseSensitive => "$containsc",
            Self::NotContainsCaseSensitive => "$notContainsc",
            Self::StartsWith => "$startsWith",
            Self::StartsWithCaseSensitive => "$startsWithc",
            Self::EndsWith => "$endsWith",
            Self::EndsWithCaseSensitive => "$endsWithc",
        }
    }

    /// Look up a built-in operator by its default symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Whether the rendition depends on the storage engine.
    pub fn is_case_sensitive(&self) -> bool {
        matches!(
            self,
            Self::EqualsCaseSensitive
                | Self::LikeCaseSensitive
                | Self::ContainsCaseSensitive
                | Self::NotContainsCaseSensitive
                | Self::StartsWithCaseSensitive
                | Self::EndsWithCaseSensitive
        )
    }

    /// The strategy function implementing this operator.
    pub fn strategy(&self) -> StrategyFn {
        match self {
            Self::Equals => equals,
            Self::EqualsCaseSensitive => equals_case_sensitive,
            Self::NotEquals => not_equals,
            Self::LessThan => less_than,
            Self::LessOrEqual => less_or_equal,
            Self::GreaterThan => greater_than,
            Self::GreaterOrEqual => greater_or_equal,
            Self::In => is_in,
            Self::NotIn => not_in,
            Self::Null => null,
            Self::NotNull => not_null,
            Self::Between => between,
            Self::NotBetween => not_between,
            Self::Like => like,
            Self::LikeCaseSensitive => like_case_sensitive,
            Self::Contains => contains,
            Self::NotContains => not_contains,
            Self::ContainsCaseSensitive => contains_case_sensitive,
            Self::NotContainsCaseSensitive => not_contains_case_sensitive,
            Self::StartsWith => starts_with,
            Self::StartsWithCaseSensitive => starts_with_case_sensitive,
            Self::EndsWith => ends_with,
            Self::EndsWithCaseSensitive => ends_with_case_sensitive,
        }
    }

    /// Build the predicate for `(column, values)`.
    pub fn build(&self, args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
        (self.strategy())(args)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ============== Comparison ==============

fn equals(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    Ok(args.compare(Comparison::Eq, args.single()?))
}

fn not_equals(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    Ok(args.compare(Comparison::Ne, args.single()?))
}

fn less_than(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    Ok(args.compare(Comparison::Lt, args.ordered()?))
}

fn less_or_equal(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    Ok(args.compare(Comparison::Lte, args.ordered()?))
}

fn greater_than(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    Ok(args.compare(Comparison::Gt, args.ordered()?))
}

fn greater_or_equal(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    Ok(args.compare(Comparison::Gte, args.ordered()?))
}

fn equals_case_sensitive(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    let value = args.ordered()?;
    let sql = match args.dialect {
        // Both compare with a binary collation by default.
        Dialect::PostgreSQL | Dialect::SQLite => return Ok(args.compare(Comparison::Eq, value)),
        Dialect::MySQL => format!("{} = BINARY ?", COLUMN_MARKER),
        Dialect::MsSql => format!("{} COLLATE Latin1_General_CS_AS = ?", COLUMN_MARKER),
        Dialect::Other(_) => return Err(args.unsupported()),
    };
    Ok(args.raw(sql, vec![value.clone()]))
}

// ============== Membership ==============

fn is_in(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    Ok(Predicate::In {
        column: args.column.to_string(),
        values: args.list()?,
        negated: false,
    })
}

fn not_in(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    Ok(Predicate::In {
        column: args.column.to_string(),
        values: args.list()?,
        negated: true,
    })
}

fn null(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    Ok(Predicate::Null {
        column: args.column.to_string(),
        negated: !args.flag()?,
    })
}

fn not_null(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    Ok(Predicate::Null {
        column: args.column.to_string(),
        negated: args.flag()?,
    })
}

fn between(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    let (low, high) = args.pair()?;
    Ok(Predicate::Between {
        column: args.column.to_string(),
        low,
        high,
        negated: false,
    })
}

fn not_between(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    let (low, high) = args.pair()?;
    Ok(Predicate::Between {
        column: args.column.to_string(),
        low,
        high,
        negated: true,
    })
}

// ============== Pattern matching ==============

fn like(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    Ok(insensitive_like(args, args.text()?, false))
}

fn like_case_sensitive(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    sensitive_like(args, args.text()?, false)
}

fn contains(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    Ok(insensitive_like(args, format!("%{}%", args.text()?), false))
}

fn not_contains(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    Ok(insensitive_like(args, format!("%{}%", args.text()?), true))
}

fn contains_case_sensitive(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    sensitive_like(args, format!("%{}%", args.text()?), false)
}

fn not_contains_case_sensitive(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    sensitive_like(args, format!("%{}%", args.text()?), true)
}

fn starts_with(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    Ok(insensitive_like(args, format!("{}%", args.text()?), false))
}

fn starts_with_case_sensitive(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    sensitive_like(args, format!("{}%", args.text()?), false)
}

fn ends_with(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    Ok(insensitive_like(args, format!("%{}", args.text()?), false))
}

fn ends_with_case_sensitive(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
    sensitive_like(args, format!("%{}", args.text()?), false)
}

/// Case-insensitive LIKE.
///
/// PostgreSQL needs `ILIKE`; MySQL, SQLite and SQL Server compare
/// case-insensitively with their default collations.
fn insensitive_like(args: &StrategyArgs<'_>, pattern: String, negated: bool) -> Predicate {
    let not = if negated { "NOT " } else { "" };
    match args.dialect {
        Dialect::PostgreSQL => {
            args.raw(format!("{} {}ILIKE ?", COLUMN_MARKER, not), vec![pattern.into()])
        }
        Dialect::MySQL | Dialect::SQLite | Dialect::MsSql => Predicate::Like {
            column: args.column.to_string(),
            pattern,
            negated,
        },
        Dialect::Other(_) => args.raw(
            format!("LOWER({}) {}LIKE LOWER(?)", COLUMN_MARKER, not),
            vec![pattern.into()],
        ),
    }
}

/// Case-sensitive LIKE.
fn sensitive_like(
    args: &StrategyArgs<'_>,
    pattern: String,
    negated: bool,
) -> FilterResult<Predicate> {
    let not = if negated { "NOT " } else { "" };
    let (sql, pattern) = match args.dialect {
        Dialect::PostgreSQL => (format!("{} {}LIKE ?", COLUMN_MARKER, not), pattern),
        Dialect::MySQL => (format!("{} {}LIKE BINARY ?", COLUMN_MARKER, not), pattern),
        // SQLite's LIKE ignores ASCII case; GLOB does not.
        Dialect::SQLite => (format!("{} {}GLOB ?", COLUMN_MARKER, not), like_to_glob(&pattern)),
        Dialect::MsSql => (
            format!("{} COLLATE Latin1_General_CS_AS {}LIKE ?", COLUMN_MARKER, not),
            pattern,
        ),
        Dialect::Other(_) => return Err(args.unsupported()),
    };
    Ok(args.raw(sql, vec![pattern.into()]))
}

/// Translate a LIKE pattern into an equivalent GLOB pattern.
pub(crate) fn like_to_glob(pattern: &str) -> String {
    let mut glob = String::with_capacity(pattern.len() + 4);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => glob.push('*'),
            '_' => glob.push('?'),
            '*' => glob.push_str("[*]"),
            '?' => glob.push_str("[?]"),
            '[' => glob.push_str("[[]"),
            '\\' => match chars.next() {
                Some('*') => glob.push_str("[*]"),
                Some('?') => glob.push_str("[?]"),
                Some('[') => glob.push_str("[[]"),
                Some(escaped) => glob.push(escaped),
                None => glob.push('\\'),
            },
            c => glob.push(c),
        }
    }
    glob
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn build(op: Operator, values: &[FilterValue], dialect: &Dialect) -> FilterResult<Predicate> {
        op.build(&StrategyArgs::new(op.symbol(), "name", values, dialect))
    }

    fn pg(op: Operator, values: &[FilterValue]) -> FilterResult<Predicate> {
        build(op, values, &Dialect::PostgreSQL)
    }

    #[test]
    fn test_symbols_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(Operator::from_symbol("$EQ"), None);
    }

    #[test]
    fn test_equals() {
        assert_eq!(
            pg(Operator::Equals, &["Ada".into()]).unwrap(),
            Predicate::equals("name", "Ada")
        );
    }

    #[test]
    fn test_comparison_requires_single_value() {
        let err = pg(Operator::GreaterThan, &[1.into(), 2.into()]).unwrap_err();
        assert_eq!(
            err,
            FilterError::invalid_arguments("$gt", "expected a single value, got 2")
        );
        assert!(pg(Operator::LessThan, &[]).is_err());
        assert!(pg(Operator::LessThan, &[FilterValue::Null]).is_err());
    }

    #[test]
    fn test_in_requires_values() {
        let err = pg(Operator::In, &[]).unwrap_err();
        assert_eq!(err, FilterError::invalid_arguments("$in", "expected at least one value"));

        let p = pg(Operator::NotIn, &[1.into(), 2.into()]).unwrap();
        assert_eq!(
            p,
            Predicate::In {
                column: "name".into(),
                values: vec![1.into(), 2.into()],
                negated: true,
            }
        );
    }

    #[test]
    fn test_in_rejects_nested_values() {
        let nested = FilterValue::Json(serde_json::json!({"a": 1}));
        assert!(pg(Operator::In, &[1.into(), nested]).is_err());
    }

    #[test]
    fn test_null_flag() {
        assert_eq!(pg(Operator::Null, &[true.into()]).unwrap(), Predicate::is_null("name"));
        assert_eq!(pg(Operator::Null, &[]).unwrap(), Predicate::is_null("name"));
        assert_eq!(pg(Operator::Null, &[FilterValue::Null]).unwrap(), Predicate::is_null("name"));
        assert_eq!(
            pg(Operator::Null, &[false.into()]).unwrap(),
            Predicate::Null {
                column: "name".into(),
                negated: true
            }
        );
        assert_eq!(
            pg(Operator::NotNull, &["true".into()]).unwrap(),
            Predicate::Null {
                column: "name".into(),
                negated: true
            }
        );
        assert!(pg(Operator::Null, &["maybe".into()]).is_err());
    }

    #[test]
    fn test_between_requires_pair() {
        assert!(pg(Operator::Between, &[1.into()]).is_err());
        assert!(pg(Operator::Between, &[1.into(), FilterValue::Null]).is_err());
        let p = pg(Operator::NotBetween, &[1.into(), 9.into()]).unwrap();
        assert!(matches!(p, Predicate::Between { negated: true, .. }));
    }

    #[test]
    fn test_contains_per_dialect() {
        let p = pg(Operator::Contains, &["ada".into()]).unwrap();
        assert_eq!(
            p,
            Predicate::Raw {
                column: "name".into(),
                sql: "{column} ILIKE ?".into(),
                params: vec!["%ada%".into()],
            }
        );

        let p = build(Operator::NotContains, &["ada".into()], &Dialect::MySQL).unwrap();
        assert_eq!(
            p,
            Predicate::Like {
                column: "name".into(),
                pattern: "%ada%".into(),
                negated: true,
            }
        );

        let p = build(Operator::StartsWith, &["ada".into()], &Dialect::from_name("duckdb")).unwrap();
        assert_eq!(
            p,
            Predicate::Raw {
                column: "name".into(),
                sql: "LOWER({column}) LIKE LOWER(?)".into(),
                params: vec!["ada%".into()],
            }
        );
    }

    #[test]
    fn test_case_sensitive_per_dialect() {
        let mysql = build(Operator::EndsWithCaseSensitive, &["Ada".into()], &Dialect::MySQL).unwrap();
        assert_eq!(
            mysql,
            Predicate::Raw {
                column: "name".into(),
                sql: "{column} LIKE BINARY ?".into(),
                params: vec!["%Ada".into()],
            }
        );

        let sqlite =
            build(Operator::ContainsCaseSensitive, &["A_a".into()], &Dialect::SQLite).unwrap();
        assert_eq!(
            sqlite,
            Predicate::Raw {
                column: "name".into(),
                sql: "{column} GLOB ?".into(),
                params: vec!["*A?a*".into()],
            }
        );

        let mssql =
            build(Operator::NotContainsCaseSensitive, &["Ada".into()], &Dialect::MsSql).unwrap();
        assert_eq!(
            mssql,
            Predicate::Raw {
                column: "name".into(),
                sql: "{column} COLLATE Latin1_General_CS_AS NOT LIKE ?".into(),
                params: vec!["%Ada%".into()],
            }
        );
    }

    #[test]
    fn test_case_sensitive_unknown_dialect_fails() {
        let err = build(Operator::EndsWithCaseSensitive, &["x".into()], &Dialect::from_name("oracle"))
            .unwrap_err();
        assert_eq!(err, FilterError::unsupported_dialect("oracle", "$endsWithc"));

        let err = build(Operator::EqualsCaseSensitive, &["x".into()], &Dialect::from_name("oracle"))
            .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::UnsupportedDialect);
    }

    #[test]
    fn test_equals_case_sensitive() {
        assert_eq!(
            pg(Operator::EqualsCaseSensitive, &["Ada".into()]).unwrap(),
            Predicate::equals("name", "Ada")
        );
        let p = build(Operator::EqualsCaseSensitive, &["Ada".into()], &Dialect::MySQL).unwrap();
        assert!(matches!(p, Predicate::Raw { ref sql, .. } if sql == "{column} = BINARY ?"));
    }

    #[test]
    fn test_like_to_glob() {
        assert_eq!(like_to_glob("%abc%"), "*abc*");
        assert_eq!(like_to_glob("a_c"), "a?c");
        assert_eq!(like_to_glob("what?*"), "what[?][*]");
        assert_eq!(like_to_glob(r"100\%"), "100%");
        assert_eq!(like_to_glob("[x]"), "[[]x]");
    }

    #[test]
    fn test_pattern_requires_text() {
        assert!(pg(Operator::Like, &[true.into()]).is_err());
        assert_eq!(
            pg(Operator::Like, &[42.into()]).unwrap(),
            Predicate::Raw {
                column: "name".into(),
                sql: "{column} ILIKE ?".into(),
                params: vec!["42".into()],
            }
        );
    }
}

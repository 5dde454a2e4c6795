//! SQL generation utilities.

use std::fmt;

use smol_str::SmolStr;

use crate::filter::FilterValue;

/// Reserved words that always need quoting when used as identifiers.
const RESERVED: &[&str] = &[
    "user", "order", "group", "select", "from", "where", "table", "index", "key", "primary",
    "foreign", "check", "default", "null", "not", "and", "or", "in", "is", "like", "between",
    "case", "when", "then", "else", "end", "as", "on", "join", "left", "right", "inner", "outer",
    "cross", "natural", "using", "limit", "offset", "union", "intersect", "except", "all",
    "distinct", "having", "create", "alter", "drop", "insert", "update", "delete", "into",
    "values", "set", "returning", "exists",
];

/// Check if an identifier needs quoting.
pub fn needs_quoting(name: &str) -> bool {
    if RESERVED.contains(&name.to_lowercase().as_str()) {
        return true;
    }

    !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The storage engine dialect a query scope renders for.
///
/// Case-sensitive matching has no portable SQL form, so strategies dispatch on
/// the dialect. Unknown engines are kept by name in [`Dialect::Other`] and only
/// fail when an operator actually needs an engine-specific rendition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// PostgreSQL uses $1, $2, etc.
    #[default]
    PostgreSQL,
    /// MySQL / MariaDB use ?.
    MySQL,
    /// SQLite uses ?.
    SQLite,
    /// SQL Server uses @P1, @P2, etc.
    MsSql,
    /// Any other engine, by lowercase name.
    Other(SmolStr),
}

impl Dialect {
    /// Parse a dialect from a driver name.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pgsql" => Self::PostgreSQL,
            "mysql" | "mariadb" => Self::MySQL,
            "sqlite" | "sqlite3" => Self::SQLite,
            "mssql" | "sqlserver" | "sqlsrv" => Self::MsSql,
            other => Self::Other(SmolStr::new(other)),
        }
    }

    /// Get the dialect name.
    pub fn name(&self) -> &str {
        match self {
            Self::PostgreSQL => "postgres",
            Self::MySQL => "mysql",
            Self::SQLite => "sqlite",
            Self::MsSql => "mssql",
            Self::Other(name) => name,
        }
    }

    /// Get the parameter placeholder for this dialect.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${}", index),
            Self::MsSql => format!("@P{}", index),
            Self::MySQL | Self::SQLite | Self::Other(_) => "?".to_string(),
        }
    }

    /// Escape an identifier with this dialect's quote characters.
    pub fn escape_identifier(&self, name: &str) -> String {
        match self {
            Self::MySQL => format!("`{}`", name.replace('`', "``")),
            Self::MsSql => format!("[{}]", name.replace(']', "]]")),
            _ => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Quote an identifier if needed.
    pub fn quote_identifier(&self, name: &str) -> String {
        if needs_quoting(name) {
            self.escape_identifier(name)
        } else {
            name.to_string()
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A SQL builder for constructing parameterized fragments.
#[derive(Debug, Clone)]
pub struct SqlBuilder {
    dialect: Dialect,
    parts: Vec<String>,
    params: Vec<FilterValue>,
}

impl SqlBuilder {
    /// Create a new SQL builder.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            parts: Vec::new(),
            params: Vec::new(),
        }
    }

    /// The dialect this builder renders for.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Push a literal SQL string.
    pub fn push(&mut self, sql: impl AsRef<str>) -> &mut Self {
        self.parts.push(sql.as_ref().to_string());
        self
    }

    /// Push a parameter placeholder and record its value.
    pub fn push_param(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        let index = self.params.len() + 1;
        self.parts.push(self.dialect.placeholder(index));
        self.params.push(value.into());
        self
    }

    /// Push an identifier (properly quoted if needed).
    pub fn push_identifier(&mut self, name: &str) -> &mut Self {
        self.parts.push(self.dialect.quote_identifier(name));
        self
    }

    /// Push `qualifier.column`, quoting each part if needed.
    pub fn push_column(&mut self, qualifier: &str, column: &str) -> &mut Self {
        self.push_identifier(qualifier).push(".").push_identifier(column)
    }

    /// Build the final SQL string and parameters.
    pub fn build(self) -> (String, Vec<FilterValue>) {
        (self.parts.join(""), self.params)
    }

    /// Get the current SQL string (without consuming).
    pub fn sql(&self) -> String {
        self.parts.join("")
    }

    /// Get the current parameters.
    pub fn params(&self) -> &[FilterValue] {
        &self.params
    }
}

impl Default for SqlBuilder {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}

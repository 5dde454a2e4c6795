//! The operator registry.
//!
//! A [`FilterRegistry`] maps operator symbols to strategies. Strategies are
//! resolved to function pointers when they are registered, so dispatch at
//! resolution time is a single hash lookup.
//!
//! ```rust
//! use filtra_query::{FilterRegistry, Operator};
//!
//! let registry = FilterRegistry::with_defaults();
//! assert!(registry.contains("$in"));
//!
//! let narrowed = registry.only(["$eq", "$in"]).unwrap();
//! assert_eq!(narrowed.symbols(), vec!["$eq", "$in"]);
//!
//! let by_kind = registry.only([Operator::Null]).unwrap();
//! assert_eq!(by_kind.symbols(), vec!["$null"]);
//! ```

use std::fmt;

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::error::{FilterError, FilterResult};
use crate::filter::FilterValue;
use crate::predicate::Predicate;
use crate::sql::Dialect;
use crate::strategy::{Operator, StrategyArgs, StrategyFn};

/// A registered operator.
#[derive(Clone)]
pub struct OperatorEntry {
    symbol: SmolStr,
    kind: Option<Operator>,
    strategy: StrategyFn,
}

impl OperatorEntry {
    /// The symbol this entry is registered under.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The built-in operator backing this entry, if any.
    pub fn kind(&self) -> Option<Operator> {
        self.kind
    }

    /// Build the predicate for `(column, values)` against `dialect`.
    pub fn build(
        &self,
        column: &str,
        values: &[FilterValue],
        dialect: &Dialect,
    ) -> FilterResult<Predicate> {
        (self.strategy)(&StrategyArgs::new(&self.symbol, column, values, dialect))
    }
}

impl fmt::Debug for OperatorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorEntry")
            .field("symbol", &self.symbol)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Reference to an operator when narrowing a registry: either a symbol or a
/// built-in operator kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorRef {
    /// A registered symbol.
    Symbol(SmolStr),
    /// Every symbol backed by this operator.
    Kind(Operator),
}

impl From<&str> for OperatorRef {
    fn from(symbol: &str) -> Self {
        Self::Symbol(SmolStr::new(symbol))
    }
}

impl From<String> for OperatorRef {
    fn from(symbol: String) -> Self {
        Self::Symbol(SmolStr::from(symbol))
    }
}

impl From<&String> for OperatorRef {
    fn from(symbol: &String) -> Self {
        Self::Symbol(SmolStr::new(symbol))
    }
}

impl From<Operator> for OperatorRef {
    fn from(op: Operator) -> Self {
        Self::Kind(op)
    }
}

/// Symbol to strategy lookup table.
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    entries: IndexMap<SmolStr, OperatorEntry>,
}

impl FilterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in operator under its default symbol.
    pub fn with_defaults() -> Self {
        let entries = Operator::ALL
            .into_iter()
            .map(|op| {
                let symbol = SmolStr::new_static(op.symbol());
                let entry = OperatorEntry {
                    symbol: symbol.clone(),
                    kind: Some(op),
                    strategy: op.strategy(),
                };
                (symbol, entry)
            })
            .collect();
        Self { entries }
    }

    /// Register a built-in operator under `symbol`.
    ///
    /// The same operator may be registered under several symbols (aliases).
    pub fn register(&mut self, symbol: impl Into<SmolStr>, operator: Operator) -> FilterResult<()> {
        self.insert(symbol.into(), Some(operator), operator.strategy())
    }

    /// Register a custom strategy under `symbol`.
    pub fn register_fn(&mut self, symbol: impl Into<SmolStr>, strategy: StrategyFn) -> FilterResult<()> {
        self.insert(symbol.into(), None, strategy)
    }

    fn insert(
        &mut self,
        symbol: SmolStr,
        kind: Option<Operator>,
        strategy: StrategyFn,
    ) -> FilterResult<()> {
        if self.entries.contains_key(&symbol) {
            return Err(FilterError::duplicate_operator(symbol.as_str()));
        }
        debug!(symbol = %symbol, kind = ?kind, "registered filter operator");
        self.entries.insert(
            symbol.clone(),
            OperatorEntry {
                symbol,
                kind,
                strategy,
            },
        );
        Ok(())
    }

    /// Look up an operator by exact, case-sensitive symbol.
    pub fn lookup(&self, symbol: &str) -> Option<&OperatorEntry> {
        self.entries.get(symbol)
    }

    /// Check if `symbol` is a registered operator.
    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    /// A registry narrowed to the given operators.
    ///
    /// Accepts symbols and operator kinds; a kind selects every symbol it is
    /// registered under. The result keeps this registry's order, so narrowing
    /// is independent of how the subset is listed.
    ///
    /// Every named operator must already be registered here: naming one this
    /// registry does not hold fails with [`FilterError::UnknownOperator`]
    /// instead of adding it.
    pub fn only<I, T>(&self, subset: I) -> FilterResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OperatorRef>,
    {
        let mut keep: Vec<SmolStr> = Vec::new();
        for item in subset {
            match item.into() {
                OperatorRef::Symbol(symbol) => {
                    if !self.entries.contains_key(&symbol) {
                        return Err(FilterError::unknown_operator(symbol.as_str()));
                    }
                    keep.push(symbol);
                }
                OperatorRef::Kind(op) => {
                    let before = keep.len();
                    keep.extend(
                        self.entries
                            .values()
                            .filter(|e| e.kind == Some(op))
                            .map(|e| e.symbol.clone()),
                    );
                    if keep.len() == before {
                        return Err(FilterError::unknown_operator(op.symbol()));
                    }
                }
            }
        }

        let entries = self
            .entries
            .iter()
            .filter(|(symbol, _)| keep.contains(*symbol))
            .map(|(symbol, entry)| (symbol.clone(), entry.clone()))
            .collect();
        Ok(Self { entries })
    }

    /// Registered symbols, in registration order.
    pub fn symbols(&self) -> Vec<&str> {
        self.entries.keys().map(SmolStr::as_str).collect()
    }

    /// Number of registered operators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no operator is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the registered operators.
    pub fn iter(&self) -> impl Iterator<Item = &OperatorEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn always_true(args: &StrategyArgs<'_>) -> FilterResult<Predicate> {
        Ok(Predicate::Raw {
            column: args.column.to_string(),
            sql: "1 = 1".into(),
            params: Vec::new(),
        })
    }

    #[test]
    fn test_defaults_hold_every_operator() {
        let registry = FilterRegistry::with_defaults();
        assert_eq!(registry.len(), Operator::ALL.len());
        assert_eq!(registry.symbols()[0], "$eq");
        assert!(registry.contains("$endsWithc"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = FilterRegistry::with_defaults();
        assert!(registry.lookup("$notIn").is_some());
        assert!(registry.lookup("$notin").is_none());
        assert!(registry.lookup("eq").is_none());
    }

    #[test]
    fn test_register_duplicate_fails() {
        let mut registry = FilterRegistry::with_defaults();
        let err = registry.register("$eq", Operator::NotEquals).unwrap_err();
        assert_eq!(err, FilterError::duplicate_operator("$eq"));
        assert_eq!(registry.lookup("$eq").unwrap().kind(), Some(Operator::Equals));
    }

    #[test]
    fn test_register_alias_and_custom() {
        let mut registry = FilterRegistry::new();
        registry.register("$equals", Operator::Equals).unwrap();
        registry.register_fn("$always", always_true).unwrap();
        assert_eq!(registry.symbols(), vec!["$equals", "$always"]);

        let predicate = registry
            .lookup("$equals")
            .unwrap()
            .build("id", &[7.into()], &Dialect::PostgreSQL)
            .unwrap();
        assert_eq!(predicate, Predicate::equals("id", 7));
        assert_eq!(registry.lookup("$always").unwrap().kind(), None);
    }

    #[test]
    fn test_only_is_independent_of_prior_registrations() {
        let mut registry = FilterRegistry::with_defaults();
        registry.register("$equals", Operator::Equals).unwrap();
        assert_eq!(registry.only(["$eq"]).unwrap().symbols(), vec!["$eq"]);

        let narrowed = registry.only(["$in", "$eq"]).unwrap();
        assert_eq!(narrowed.symbols(), vec!["$eq", "$in"]);
        assert_eq!(narrowed.only(["$eq"]).unwrap().symbols(), vec!["$eq"]);
    }

    #[test]
    fn test_only_by_kind_includes_aliases() {
        let mut registry = FilterRegistry::with_defaults();
        registry.register("$equals", Operator::Equals).unwrap();
        let narrowed = registry.only([Operator::Equals]).unwrap();
        assert_eq!(narrowed.symbols(), vec!["$eq", "$equals"]);
    }

    #[test]
    fn test_only_unknown_symbol_fails() {
        let registry = FilterRegistry::with_defaults();
        let err = registry.only(["$eq", "$fuzzy"]).unwrap_err();
        assert_eq!(err, FilterError::unknown_operator("$fuzzy"));

        let empty = FilterRegistry::new();
        assert!(empty.only([Operator::In]).is_err());
    }
}

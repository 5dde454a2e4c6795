//! Error types for filter resolution with actionable messages.
//!
//! Every failure the engine can produce is a validation or configuration
//! error: nothing here is transient and nothing is retried. Errors are raised
//! at the point of detection and carry the allowed values so callers can turn
//! them into helpful 4xx responses.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: P{category}{number}
//! - 1xxx: Filter errors (unknown operator, field or relation)
//! - 5xxx: Argument errors
//! - 7xxx: Configuration errors (registry, dialect)
//!
//! ```rust
//! use filtra_query::{ErrorCode, FilterError};
//!
//! let err = FilterError::no_operator_match(["$eq", "$in"]);
//! assert_eq!(err.code(), ErrorCode::NoOperatorMatch);
//! assert_eq!(err.code().code(), "P1001");
//! assert_eq!(err.allowed(), &["$eq".to_string(), "$in".to_string()]);
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Filter errors (1xxx)
    /// No operator reachable in the expression (P1001).
    NoOperatorMatch = 1001,
    /// Field or relation is not filterable (P1002).
    FieldNotSupported = 1002,
    /// Operator is not allowed on the field (P1003).
    OperatorNotSupported = 1003,

    // Argument errors (5xxx)
    /// Operator arguments failed arity or type checks (P5003).
    InvalidOperatorArguments = 5003,

    // Configuration errors (7xxx)
    /// Operator registered twice (P7001).
    DuplicateOperator = 7001,
    /// Operator referenced but never registered (P7002).
    UnknownOperator = 7002,
    /// Operator has no rendition for the active dialect (P7003).
    UnsupportedDialect = 7003,
}

impl ErrorCode {
    /// Get the error code string (e.g., "P1001").
    pub fn code(&self) -> String {
        format!("P{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoOperatorMatch => "No filter operator found",
            Self::FieldNotSupported => "Field is not filterable",
            Self::OperatorNotSupported => "Operator not allowed on field",
            Self::InvalidOperatorArguments => "Invalid operator arguments",
            Self::DuplicateOperator => "Duplicate operator",
            Self::UnknownOperator => "Unknown operator",
            Self::UnsupportedDialect => "Unsupported dialect",
        }
    }

    /// Whether the error stems from the request rather than engine setup.
    pub fn is_client_error(&self) -> bool {
        (*self as u16) < 7000
    }

    /// Get the documentation URL for this error.
    pub fn docs_url(&self) -> String {
        format!("https://filtra.rs/docs/errors/{}", self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors that can occur while registering operators or resolving filters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// The expression has no resolvable operator anywhere in its nesting.
    #[error("no filter operator found; expected one of: {}", .known.join(", "))]
    NoOperatorMatch {
        /// Every operator symbol the registry knows.
        known: Vec<String>,
    },

    /// The field or relation is not filterable on the model.
    #[error(
        "field `{field}` is not filterable on `{model}`; allowed fields: {}",
        .allowed.join(", ")
    )]
    FieldNotSupported {
        /// Requested field or relation.
        field: String,
        /// Model the field was looked up on.
        model: String,
        /// Filterable fields of the model.
        allowed: Vec<String>,
    },

    /// The operator is not permitted for this specific field.
    #[error(
        "operator `{operator}` is not allowed on field `{field}`; allowed operators: {}",
        .allowed.join(", ")
    )]
    OperatorNotSupported {
        /// Field the operator was applied to.
        field: String,
        /// Rejected operator (or nested key).
        operator: String,
        /// Operators the model allows on the field.
        allowed: Vec<String>,
    },

    /// A dialect-sensitive operator has no rendition for the active engine.
    #[error("operator `{operator}` is not supported by the `{dialect}` dialect")]
    UnsupportedDialect {
        /// Name of the active dialect.
        dialect: String,
        /// Operator that needed a dialect-specific rendition.
        operator: String,
    },

    /// Values failed an operator's arity or type precondition.
    #[error("invalid arguments for `{operator}`: {reason}")]
    InvalidOperatorArguments {
        /// Operator symbol.
        operator: String,
        /// What was wrong with the values.
        reason: String,
    },

    /// The symbol is already registered.
    #[error("operator `{symbol}` is already registered")]
    DuplicateOperator {
        /// Conflicting symbol.
        symbol: String,
    },

    /// The symbol is not registered.
    #[error("operator `{symbol}` is not registered")]
    UnknownOperator {
        /// Missing symbol.
        symbol: String,
    },
}

impl FilterError {
    // ============== Constructor Functions ==============

    /// Create a no-operator-match error listing the known operators.
    pub fn no_operator_match<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::NoOperatorMatch {
            known: known.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a field-not-supported error.
    pub fn field_not_supported<I, S>(
        field: impl Into<String>,
        model: impl Into<String>,
        allowed: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::FieldNotSupported {
            field: field.into(),
            model: model.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an operator-not-supported error.
    pub fn operator_not_supported<I, S>(
        field: impl Into<String>,
        operator: impl Into<String>,
        allowed: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OperatorNotSupported {
            field: field.into(),
            operator: operator.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an unsupported-dialect error.
    pub fn unsupported_dialect(dialect: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::UnsupportedDialect {
            dialect: dialect.into(),
            operator: operator.into(),
        }
    }

    /// Create an invalid-arguments error.
    pub fn invalid_arguments(operator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOperatorArguments {
            operator: operator.into(),
            reason: reason.into(),
        }
    }

    /// Create a duplicate-operator error.
    pub fn duplicate_operator(symbol: impl Into<String>) -> Self {
        Self::DuplicateOperator {
            symbol: symbol.into(),
        }
    }

    /// Create an unknown-operator error.
    pub fn unknown_operator(symbol: impl Into<String>) -> Self {
        Self::UnknownOperator {
            symbol: symbol.into(),
        }
    }

    // ============== Accessors ==============

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NoOperatorMatch { .. } => ErrorCode::NoOperatorMatch,
            Self::FieldNotSupported { .. } => ErrorCode::FieldNotSupported,
            Self::OperatorNotSupported { .. } => ErrorCode::OperatorNotSupported,
            Self::UnsupportedDialect { .. } => ErrorCode::UnsupportedDialect,
            Self::InvalidOperatorArguments { .. } => ErrorCode::InvalidOperatorArguments,
            Self::DuplicateOperator { .. } => ErrorCode::DuplicateOperator,
            Self::UnknownOperator { .. } => ErrorCode::UnknownOperator,
        }
    }

    /// The enumerated allowed values carried by the error, if any.
    pub fn allowed(&self) -> &[String] {
        match self {
            Self::NoOperatorMatch { known } => known,
            Self::FieldNotSupported { allowed, .. } | Self::OperatorNotSupported { allowed, .. } => {
                allowed
            }
            _ => &[],
        }
    }

    /// Help text suggesting how to fix the error.
    pub fn help(&self) -> Option<String> {
        match self {
            Self::NoOperatorMatch { .. } => Some(
                "Wrap the value in an operator, e.g. {\"name\": {\"$eq\": \"value\"}}".to_string(),
            ),
            Self::FieldNotSupported { model, .. } => Some(format!(
                "Add the field to the filterable fields of `{}` or use one of the allowed fields",
                model
            )),
            Self::OperatorNotSupported { field, .. } => {
                Some(format!("Use one of the operators allowed on `{}`", field))
            }
            Self::UnsupportedDialect { operator, .. } => Some(format!(
                "Remove `{}` from the registry for this engine or use its case-insensitive variant",
                operator
            )),
            Self::InvalidOperatorArguments { .. } => None,
            Self::DuplicateOperator { .. } => {
                Some("Register each operator symbol only once".to_string())
            }
            Self::UnknownOperator { .. } => {
                Some("Check the symbol spelling; lookups are case-sensitive".to_string())
            }
        }
    }

    /// Whether this error was caused by the request rather than engine setup.
    pub fn is_client_error(&self) -> bool {
        self.code().is_client_error()
    }
}

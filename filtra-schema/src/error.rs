//! Error types for model definitions and configuration.

// Fields are read by the derive macros.
#![allow(unused_assignments)]

use filtra_query::FilterError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while loading configuration or building a schema.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(filtra::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(filtra::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    #[diagnostic(code(filtra::schema::config_error))]
    ConfigError { message: String },

    /// Invalid model definition.
    #[error("invalid model `{name}`: {message}")]
    #[diagnostic(code(filtra::schema::invalid_model))]
    InvalidModel { name: String, message: String },

    /// Invalid field definition.
    #[error("invalid field `{model}.{field}`: {message}")]
    #[diagnostic(code(filtra::schema::invalid_field))]
    InvalidField {
        model: String,
        field: String,
        message: String,
    },

    /// Invalid relation definition.
    #[error("invalid relation `{model}.{field}`: {message}")]
    #[diagnostic(code(filtra::schema::invalid_relation))]
    InvalidRelation {
        model: String,
        field: String,
        message: String,
    },

    /// Duplicate definition.
    #[error("duplicate {kind} `{name}`")]
    #[diagnostic(code(filtra::schema::duplicate))]
    Duplicate { kind: String, name: String },

    /// Reference to a model that is not defined.
    #[error("unknown model `{name}`")]
    #[diagnostic(
        code(filtra::schema::unknown_model),
        help("define it under [models.{name}] or check the spelling")
    )]
    UnknownModel { name: String },

    /// Error raised by the filter engine.
    #[error(transparent)]
    #[diagnostic(code(filtra::schema::filter))]
    Filter(#[from] FilterError),

    /// Validation error with multiple issues.
    #[error("schema validation failed with {count} error(s)")]
    #[diagnostic(code(filtra::schema::validation_failed))]
    ValidationFailed {
        count: usize,
        #[related]
        errors: Vec<SchemaError>,
    },
}

impl SchemaError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an invalid model error.
    pub fn invalid_model(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidModel {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid field error.
    pub fn invalid_field(
        model: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            model: model.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid relation error.
    pub fn invalid_relation(
        model: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidRelation {
            model: model.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Duplicate {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an unknown model error.
    pub fn unknown_model(name: impl Into<String>) -> Self {
        Self::UnknownModel { name: name.into() }
    }

    /// Collapse a list of validation errors: `None` when empty, the error
    /// itself when there is one, [`SchemaError::ValidationFailed`] otherwise.
    pub fn collect(mut errors: Vec<SchemaError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            count => Some(Self::ValidationFailed { count, errors }),
        }
    }

    /// The filter error behind this error, if any.
    pub fn as_filter_error(&self) -> Option<&FilterError> {
        match self {
            Self::Filter(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(unused_assignments)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::invalid_field("User", "email", "listed twice");
        assert_eq!(err.to_string(), "invalid field `User.email`: listed twice");

        let err = SchemaError::unknown_model("Autor");
        assert_eq!(err.to_string(), "unknown model `Autor`");
    }

    #[test]
    fn test_diagnostic_codes() {
        let err = SchemaError::duplicate("model", "User");
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("filtra::schema::duplicate".to_string())
        );
        assert!(SchemaError::unknown_model("X").help().is_some());
    }

    #[test]
    fn test_collect() {
        assert!(SchemaError::collect(Vec::new()).is_none());

        let single = SchemaError::collect(vec![SchemaError::config("a")]).unwrap();
        assert!(matches!(single, SchemaError::ConfigError { .. }));

        let many = SchemaError::collect(vec![
            SchemaError::config("a"),
            SchemaError::unknown_model("B"),
        ])
        .unwrap();
        assert!(matches!(many, SchemaError::ValidationFailed { count: 2, .. }));
        assert_eq!(many.related().map(|r| r.count()), Some(2));
    }

    #[test]
    fn test_filter_error_conversion() {
        let err: SchemaError = FilterError::unknown_operator("$fuzzy").into();
        assert_eq!(err.to_string(), "operator `$fuzzy` is not registered");
        assert!(err.as_filter_error().is_some());
    }
}

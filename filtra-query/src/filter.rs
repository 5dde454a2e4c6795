//! Filter values and the decoded filter expression tree.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A filter value that can be used in comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// List of values.
    List(Vec<FilterValue>),
    /// JSON value that has no scalar representation (e.g. an object inside a list).
    Json(serde_json::Value),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this value can be bound as a single SQL parameter.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::List(_) | Self::Json(_))
    }

    /// Get the boolean value, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the string value, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Json(_) => "json",
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

impl From<serde_json::Value> for FilterValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;

        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Json(Value::Number(n)), Self::Float),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            obj @ Value::Object(_) => Self::Json(obj),
        }
    }
}

/// A decoded, possibly nested filter expression.
///
/// Map keys are either operator symbols (`$eq`, `$in`, ...) or field and
/// relation names; which one is decided by registry membership when the
/// expression is resolved. Key order is preserved.
///
/// ```rust
/// use filtra_query::FilterExpr;
///
/// let expr = FilterExpr::from_json_str(r#"{"author": {"name": {"$eq": "Ada"}}}"#).unwrap();
/// let (field, nested) = expr.first().unwrap();
/// assert_eq!(field, "author");
/// assert!(nested.is_map());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterExpr {
    /// Nested mapping of keys to sub-expressions.
    Map(IndexMap<String, FilterExpr>),
    /// Operator arguments: a scalar or a list.
    Value(FilterValue),
}

impl FilterExpr {
    /// Create an empty map node.
    pub fn new() -> Self {
        Self::Map(IndexMap::new())
    }

    /// Build a map node from key/expression pairs.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FilterExpr>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a single-key map node.
    pub fn entry(key: impl Into<String>, value: impl Into<FilterExpr>) -> Self {
        Self::map([(key.into(), value.into())])
    }

    /// Build a leaf node holding operator arguments.
    pub fn value(value: impl Into<FilterValue>) -> Self {
        Self::Value(value.into())
    }

    /// Decode an expression from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this node is a map.
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Get the map entries, if this node is a map.
    pub fn as_map(&self) -> Option<&IndexMap<String, FilterExpr>> {
        match self {
            Self::Map(map) => Some(map),
            Self::Value(_) => None,
        }
    }

    /// Check if this node is an empty map.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Map(map) if map.is_empty())
    }

    /// First entry of a map node.
    pub fn first(&self) -> Option<(&str, &FilterExpr)> {
        self.as_map()?.first().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys of a map node, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.as_map()
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }

    /// Flatten a leaf node into its argument list.
    ///
    /// A list yields its items and any other scalar, `null` included, yields
    /// itself. Map nodes have no argument form and return `None`.
    pub fn to_arguments(&self) -> Option<Vec<FilterValue>> {
        match self {
            Self::Map(_) => None,
            Self::Value(FilterValue::List(items)) => Some(items.clone()),
            Self::Value(v) => Some(vec![v.clone()]),
        }
    }
}

impl Default for FilterExpr {
    fn default() -> Self {
        Self::new()
    }
}

impl From<FilterValue> for FilterExpr {
    fn from(v: FilterValue) -> Self {
        Self::Value(v)
    }
}

impl From<serde_json::Value> for FilterExpr {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Object(obj) => {
                Self::Map(obj.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
            other => Self::Value(FilterValue::from(other)),
        }
    }
}

macro_rules! expr_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FilterExpr {
                fn from(v: $ty) -> Self {
                    Self::Value(v.into())
                }
            }
        )*
    };
}

expr_from_scalar!(bool, i32, i64, f64, String, &str);

impl<T: Into<FilterValue>> From<Vec<T>> for FilterExpr {
    fn from(v: Vec<T>) -> Self {
        Self::Value(v.into())
    }
}

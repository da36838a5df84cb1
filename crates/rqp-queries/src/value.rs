//! Filter values
//!
//! Typed values produced by parsing a query-string value against the field's
//! declared type. SQL NULL is its own variant, distinct from the empty string.

use std::fmt;

use rqp_core::{QueryError, QueryResult};
use serde::Serialize;

use crate::methods::Method;

/// A typed filter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// The client asked for SQL NULL (`null`/`NULL` in the query string)
    Null,
    Int(i64),
    Bool(bool),
    Text(String),
    /// Sequence value for `in`/`nin`
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// True for a single non-null value
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Bool(_) | Self::Text(_))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Int(n) => write!(f, "{}", n),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Returns true if the raw query-string value spells SQL NULL
pub fn is_null_literal(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("null")
}

/// Declared type of a filterable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    Int,
    Bool,
    #[default]
    String,
}

impl FieldType {
    /// Parse a type token from a validation key (`id:int`)
    pub fn from_token(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "int" | "i" => Some(Self::Int),
            "bool" | "b" => Some(Self::Bool),
            "string" | "s" => Some(Self::String),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Bool => "bool",
            Self::String => "string",
        }
    }

    /// Coerce one raw scalar into a typed value
    pub fn coerce(&self, raw: &str) -> QueryResult<Value> {
        match self {
            Self::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| QueryError::BadFormat),
            Self::Bool => match raw.trim().to_lowercase().as_str() {
                "true" | "t" | "1" => Ok(Value::Bool(true)),
                "false" | "f" | "0" => Ok(Value::Bool(false)),
                _ => Err(QueryError::BadFormat),
            },
            Self::String => Ok(Value::Text(raw.to_string())),
        }
    }

    /// Methods a field of this type may be filtered with
    pub fn allowed_methods(&self) -> &'static [Method] {
        match self {
            Self::Int => &[
                Method::Eq,
                Method::Ne,
                Method::Gt,
                Method::Gte,
                Method::Lt,
                Method::Lte,
                Method::In,
                Method::Nin,
                Method::Is,
                Method::Not,
            ],
            Self::Bool => &[Method::Eq, Method::Ne, Method::Is, Method::Not],
            Self::String => &[
                Method::Eq,
                Method::Ne,
                Method::Like,
                Method::Ilike,
                Method::Nlike,
                Method::Nilike,
                Method::In,
                Method::Nin,
                Method::Is,
                Method::Not,
            ],
        }
    }

    pub fn allows(&self, method: Method) -> bool {
        self.allowed_methods().contains(&method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_literal() {
        assert!(is_null_literal("null"));
        assert!(is_null_literal("NULL"));
        assert!(is_null_literal("Null"));
        assert!(!is_null_literal(""));
        assert!(!is_null_literal("nil"));
    }

    #[test]
    fn test_null_is_not_empty_string() {
        assert_ne!(Value::Null, Value::Text(String::new()));
        assert!(Value::Null.is_null());
        assert!(!Value::from("").is_null());
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(FieldType::Int.coerce("123").unwrap(), Value::Int(123));
        assert_eq!(FieldType::Int.coerce("-7").unwrap(), Value::Int(-7));
        assert_eq!(FieldType::Int.coerce("abc"), Err(QueryError::BadFormat));
        assert_eq!(FieldType::Int.coerce(""), Err(QueryError::BadFormat));
    }

    #[test]
    fn test_coerce_bool_and_string() {
        assert_eq!(FieldType::Bool.coerce("TRUE").unwrap(), Value::Bool(true));
        assert_eq!(FieldType::Bool.coerce("0").unwrap(), Value::Bool(false));
        assert_eq!(FieldType::Bool.coerce("yes"), Err(QueryError::BadFormat));
        assert_eq!(FieldType::String.coerce("").unwrap(), Value::Text(String::new()));
    }

    #[test]
    fn test_type_tokens() {
        assert_eq!(FieldType::from_token("int"), Some(FieldType::Int));
        assert_eq!(FieldType::from_token("B"), Some(FieldType::Bool));
        assert_eq!(FieldType::from_token("s"), Some(FieldType::String));
        assert_eq!(FieldType::from_token("uuid"), None);
    }

    #[test]
    fn test_allowed_methods() {
        assert!(FieldType::Int.allows(Method::Gt));
        assert!(!FieldType::Int.allows(Method::Like));
        assert!(FieldType::String.allows(Method::Ilike));
        assert!(!FieldType::Bool.allows(Method::In));
        assert!(FieldType::Bool.allows(Method::Is));
    }

    #[test]
    fn test_serialize() {
        let value = Value::List(vec![Value::Int(1), Value::Null, Value::from("a")]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"[1,null,"a"]"#);
    }
}

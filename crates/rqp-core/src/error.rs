//! Query error types
//!
//! Every failure the parser or renderer can report. Errors raised while
//! handling a single query-string key are wrapped in [`QueryError::Field`]
//! so callers can tell which parameter was rejected.

use thiserror::Error;

/// Standard Result type for query parsing and rendering
pub type QueryResult<T> = Result<T, QueryError>;

/// Core error type for all query operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Method token not in the registry, or a method used with a value it
    /// cannot render (e.g. `is` with a non-null value)
    #[error("unknown method")]
    UnknownMethod,

    #[error("method is not allowed")]
    MethodNotAllowed,

    #[error("required")]
    Required,

    #[error("bad format")]
    BadFormat,

    #[error("empty value")]
    EmptyValue,

    #[error("not in scope")]
    NotInScope,

    #[error("similar names of keys are not allowed")]
    SimilarNames,

    #[error("filter not allowed")]
    FilterNotAllowed,

    #[error("filter not found")]
    FilterNotFound,

    #[error("validation not found")]
    ValidationNotFound,

    #[error("unknown type: {0}")]
    UnknownType(String),

    /// Failure reported by a caller-supplied validator
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An error attributed to one query-string field
    #[error("{field}: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<QueryError>,
    },
}

/// Opaque error produced by custom field validators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl QueryError {
    /// Attribute this error to a field. Already-attributed errors are kept as is.
    pub fn for_field(self, field: impl Into<String>) -> Self {
        match self {
            err @ QueryError::Field { .. } => err,
            err => QueryError::Field {
                field: field.into(),
                source: Box::new(err),
            },
        }
    }

    /// Shorthand for a caller-defined validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        QueryError::Validation(ValidationError::new(message))
    }

    /// The underlying error with all field attributions stripped
    pub fn root(&self) -> &QueryError {
        match self {
            QueryError::Field { source, .. } => source.root(),
            err => err,
        }
    }

    /// The field this error was attributed to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            QueryError::Field { field, .. } => Some(field),
            _ => None,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::Field { source, .. } => source.error_code(),
            QueryError::UnknownMethod => "unknown_method",
            QueryError::MethodNotAllowed => "method_not_allowed",
            QueryError::Required => "required",
            QueryError::BadFormat => "bad_format",
            QueryError::EmptyValue => "empty_value",
            QueryError::NotInScope => "not_in_scope",
            QueryError::SimilarNames => "similar_names",
            QueryError::FilterNotAllowed => "filter_not_allowed",
            QueryError::FilterNotFound => "filter_not_found",
            QueryError::ValidationNotFound => "validation_not_found",
            QueryError::UnknownType(_) => "unknown_type",
            QueryError::Validation(_) => "validation_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_wrapping() {
        let err = QueryError::BadFormat.for_field("id");
        assert_eq!(err.to_string(), "id: bad format");
        assert_eq!(err.field(), Some("id"));
        assert_eq!(err.root(), &QueryError::BadFormat);
    }

    #[test]
    fn test_field_wrapping_is_not_nested() {
        let err = QueryError::NotInScope.for_field("sort").for_field("other");
        assert_eq!(err.field(), Some("sort"));
        assert_eq!(err.to_string(), "sort: not in scope");
    }

    #[test]
    fn test_validation_error() {
        let err = QueryError::validation("must be even").for_field("count");
        assert_eq!(err.to_string(), "count: must be even");
        assert_eq!(err.error_code(), "validation_failed");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(QueryError::UnknownMethod.error_code(), "unknown_method");
        assert_eq!(
            QueryError::FilterNotFound.for_field("id").error_code(),
            "filter_not_found"
        );
        assert_eq!(
            QueryError::UnknownType("uuid".into()).error_code(),
            "unknown_type"
        );
    }
}

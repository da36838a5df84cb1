//! Field validations
//!
//! Declares which fields a request may filter on, their types, and optional
//! validator hooks. Keys have the form `name[:type][:required]`, for example
//! `id:int`, `email`, `limit:required`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rqp_core::{QueryError, QueryResult};

use crate::value::{FieldType, Value};

/// Validator hook run on each parsed value of a field
pub type Validator = Arc<dyn Fn(&Value) -> QueryResult<()> + Send + Sync>;

/// A resolved validation entry
#[derive(Clone)]
pub struct FieldRule {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub validator: Option<Validator>,
}

impl FieldRule {
    /// Parse a validation key into a rule without a hook
    pub fn parse(key: &str) -> QueryResult<Self> {
        let mut parts = key.split(':');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(QueryError::BadFormat.for_field(key));
        }

        let mut rule = Self {
            name: name.to_string(),
            field_type: FieldType::default(),
            required: false,
            validator: None,
        };
        for token in parts {
            if token.eq_ignore_ascii_case("required") {
                rule.required = true;
            } else {
                rule.field_type = FieldType::from_token(token)
                    .ok_or_else(|| QueryError::UnknownType(token.to_string()).for_field(name))?;
            }
        }
        Ok(rule)
    }

    /// Run the hook, if any, on one value
    pub fn check(&self, value: &Value) -> QueryResult<()> {
        match &self.validator {
            Some(validator) => validator(value),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("required", &self.required)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// Validation registry, keyed by field name
#[derive(Debug, Clone, Default)]
pub struct Validations {
    rules: HashMap<String, FieldRule>,
}

impl Validations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build validations from `(key, hook)` pairs
    pub fn from_entries<'a, I>(entries: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = (&'a str, Option<Validator>)>,
    {
        let mut validations = Self::new();
        for (key, validator) in entries {
            validations.insert(key, validator)?;
        }
        Ok(validations)
    }

    /// Add an entry (builder pattern)
    pub fn with(mut self, key: &str, validator: Option<Validator>) -> QueryResult<Self> {
        self.insert(key, validator)?;
        Ok(self)
    }

    /// Add or replace an entry
    pub fn insert(&mut self, key: &str, validator: Option<Validator>) -> QueryResult<()> {
        let mut rule = FieldRule::parse(key)?;
        rule.validator = validator;
        self.rules.insert(rule.name.clone(), rule);
        Ok(())
    }

    /// Remove the entry for a field name
    pub fn remove(&mut self, name: &str) -> QueryResult<()> {
        self.rules
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| QueryError::ValidationNotFound.for_field(name))
    }

    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Names of fields declared as required
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.rules
            .values()
            .filter(|r| r.required)
            .map(|r| r.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Value must be one of `allowed`
pub fn in_list<I, V>(allowed: I) -> Validator
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
    Arc::new(move |value| {
        if allowed.contains(value) {
            Ok(())
        } else {
            Err(QueryError::NotInScope)
        }
    })
}

/// Integer value must be at least `min`
pub fn min(min: i64) -> Validator {
    Arc::new(move |value| match value.as_int() {
        Some(n) if n >= min => Ok(()),
        Some(_) => Err(QueryError::NotInScope),
        None => Err(QueryError::BadFormat),
    })
}

/// Integer value must be at most `max`
pub fn max(max: i64) -> Validator {
    Arc::new(move |value| match value.as_int() {
        Some(n) if n <= max => Ok(()),
        Some(_) => Err(QueryError::NotInScope),
        None => Err(QueryError::BadFormat),
    })
}

/// Integer value must lie in `min..=max`
pub fn min_max(min: i64, max: i64) -> Validator {
    Arc::new(move |value| match value.as_int() {
        Some(n) if (min..=max).contains(&n) => Ok(()),
        Some(_) => Err(QueryError::NotInScope),
        None => Err(QueryError::BadFormat),
    })
}

/// String value must not be empty
pub fn not_empty() -> Validator {
    Arc::new(|value| match value {
        Value::Text(s) if s.is_empty() => Err(QueryError::EmptyValue),
        _ => Ok(()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_parsing() {
        let rule = FieldRule::parse("id:int").unwrap();
        assert_eq!(rule.name, "id");
        assert_eq!(rule.field_type, FieldType::Int);
        assert!(!rule.required);

        let rule = FieldRule::parse("limit:required").unwrap();
        assert_eq!(rule.field_type, FieldType::String);
        assert!(rule.required);

        let rule = FieldRule::parse("active:bool:required").unwrap();
        assert_eq!(rule.field_type, FieldType::Bool);
        assert!(rule.required);

        let rule = FieldRule::parse("email").unwrap();
        assert_eq!(rule.field_type, FieldType::String);
    }

    #[test]
    fn test_rule_parsing_errors() {
        let err = FieldRule::parse("id:uuid").unwrap_err();
        assert_eq!(err.root(), &QueryError::UnknownType("uuid".into()));
        assert_eq!(err.field(), Some("id"));

        assert_eq!(FieldRule::parse(":int").unwrap_err().root(), &QueryError::BadFormat);
    }

    #[test]
    fn test_registry() {
        let mut validations = Validations::new()
            .with("id:int", None)
            .unwrap()
            .with("email:required", Some(not_empty()))
            .unwrap();

        assert_eq!(validations.len(), 2);
        assert!(validations.contains("id"));
        assert_eq!(validations.required().collect::<Vec<_>>(), vec!["email"]);

        validations.remove("id").unwrap();
        assert!(!validations.contains("id"));
        assert_eq!(
            validations.remove("id").unwrap_err().root(),
            &QueryError::ValidationNotFound
        );
    }

    #[test]
    fn test_from_entries() {
        let validations =
            Validations::from_entries(vec![("test1", None), ("test2", None), ("n:int", Some(min(1)))])
                .unwrap();
        assert_eq!(validations.len(), 3);
        assert!(validations.get("n").unwrap().validator.is_some());
    }

    #[test]
    fn test_in_list() {
        let validator = in_list(["id", "email"]);
        assert!(validator(&Value::from("id")).is_ok());
        assert_eq!(validator(&Value::from("name")), Err(QueryError::NotInScope));
    }

    #[test]
    fn test_numeric_validators() {
        assert!(min(10)(&Value::Int(10)).is_ok());
        assert_eq!(min(10)(&Value::Int(9)), Err(QueryError::NotInScope));
        assert!(max(100)(&Value::Int(100)).is_ok());
        assert_eq!(max(100)(&Value::Int(101)), Err(QueryError::NotInScope));
        assert!(min_max(10, 100)(&Value::Int(50)).is_ok());
        assert_eq!(min_max(10, 100)(&Value::Int(5)), Err(QueryError::NotInScope));
        assert_eq!(min_max(10, 100)(&Value::from("50")), Err(QueryError::BadFormat));
    }

    #[test]
    fn test_not_empty() {
        assert!(not_empty()(&Value::from("a")).is_ok());
        assert_eq!(not_empty()(&Value::from("")), Err(QueryError::EmptyValue));
    }
}

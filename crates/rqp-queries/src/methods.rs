//! Filter methods
//!
//! The closed set of comparison methods a query-string key may carry
//! (`id[gte]=10`), and for each the SQL fragment it renders and the values it
//! binds. Rendering and binding share one validity check so both entry points
//! fail identically for the same input.

use std::fmt;

use rqp_core::{QueryError, QueryResult};

use crate::value::Value;

/// Comparison method applied to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Equals (=)
    Eq,
    /// Not equals (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// LIKE, value bound verbatim
    Like,
    /// Case-insensitive LIKE
    Ilike,
    /// NOT LIKE
    Nlike,
    /// NOT ILIKE
    Nilike,
    /// In list, one placeholder per element
    In,
    /// Not in
    Nin,
    /// IS NULL; only valid with a null value
    Is,
    /// IS NOT NULL; only valid with a null value
    Not,
    /// Placeholder for tokens outside the registry. Never renders.
    Unknown,
}

/// How many values a method binds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one non-null scalar, one placeholder
    Scalar,
    /// A sequence, one placeholder per element
    List,
    /// The null value, no placeholder
    Null,
}

/// SQL rendering rule for one method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub sql: &'static str,
    pub arity: Arity,
}

impl Method {
    /// Every method that can appear in a query string
    pub const ALL: [Method; 14] = [
        Method::Eq,
        Method::Ne,
        Method::Gt,
        Method::Gte,
        Method::Lt,
        Method::Lte,
        Method::Like,
        Method::Ilike,
        Method::Nlike,
        Method::Nilike,
        Method::In,
        Method::Nin,
        Method::Is,
        Method::Not,
    ];

    /// Parse a method token (the part between brackets in `name[token]`)
    pub fn from_token(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::Ilike => "ilike",
            Self::Nlike => "nlike",
            Self::Nilike => "nilike",
            Self::In => "in",
            Self::Nin => "nin",
            Self::Is => "is",
            Self::Not => "not",
            Self::Unknown => "unknown",
        }
    }

    /// The rendering rule, or None for [`Method::Unknown`]
    pub const fn rule(&self) -> Option<Rule> {
        let (sql, arity) = match self {
            Self::Eq => ("=", Arity::Scalar),
            Self::Ne => ("!=", Arity::Scalar),
            Self::Gt => (">", Arity::Scalar),
            Self::Gte => (">=", Arity::Scalar),
            Self::Lt => ("<", Arity::Scalar),
            Self::Lte => ("<=", Arity::Scalar),
            Self::Like => ("LIKE", Arity::Scalar),
            Self::Ilike => ("ILIKE", Arity::Scalar),
            Self::Nlike => ("NOT LIKE", Arity::Scalar),
            Self::Nilike => ("NOT ILIKE", Arity::Scalar),
            Self::In => ("IN", Arity::List),
            Self::Nin => ("NOT IN", Arity::List),
            Self::Is => ("IS NULL", Arity::Null),
            Self::Not => ("IS NOT NULL", Arity::Null),
            Self::Unknown => return None,
        };
        Some(Rule { sql, arity })
    }

    /// Whether the method expects a list value
    pub fn expects_list(&self) -> bool {
        matches!(self.rule(), Some(Rule { arity: Arity::List, .. }))
    }

    /// Whether the method is one of the null tests (`is`/`not`)
    pub fn is_null_test(&self) -> bool {
        matches!(self.rule(), Some(Rule { arity: Arity::Null, .. }))
    }

    /// Look up the rule and check the value fits it
    fn checked_rule(&self, value: &Value) -> QueryResult<Rule> {
        let rule = self.rule().ok_or(QueryError::UnknownMethod)?;
        let fits = match rule.arity {
            Arity::Scalar => value.is_scalar(),
            Arity::List => value.is_list(),
            Arity::Null => value.is_null(),
        };
        if fits {
            Ok(rule)
        } else {
            Err(QueryError::UnknownMethod)
        }
    }

    /// Render the predicate for `field` using `?` placeholders
    pub fn render(&self, field: &str, value: &Value) -> QueryResult<String> {
        let rule = self.checked_rule(value)?;
        let sql = match (rule.arity, value) {
            (Arity::List, Value::List(items)) => {
                let placeholders = vec!["?"; items.len()].join(", ");
                format!("{} {} ({})", field, rule.sql, placeholders)
            }
            (Arity::Null, _) => format!("{} {}", field, rule.sql),
            _ => format!("{} {} ?", field, rule.sql),
        };
        Ok(sql)
    }

    /// Values to bind, in placeholder order.
    ///
    /// `is`/`not` yield the single [`Value::Null`] they were given even though
    /// their SQL has no placeholder; that entry is never bound.
    pub fn bind(&self, value: &Value) -> QueryResult<Vec<Value>> {
        let rule = self.checked_rule(value)?;
        let args = match (rule.arity, value) {
            (Arity::List, Value::List(items)) => items.clone(),
            _ => vec![value.clone()],
        };
        Ok(args)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

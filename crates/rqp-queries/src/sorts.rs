//! Sort order
//!
//! Parsed from the reserved `sort` key, e.g. `sort=-created_at,+id,name`.
//! A leading `-` sorts descending; `+` or no prefix sorts ascending.

use rqp_core::{QueryError, QueryResult};

use crate::parser::is_identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One `ORDER BY` item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortCriterion {
    pub column: String,
    pub direction: SortDirection,
}

impl SortCriterion {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Parse one `sort` item (`-a`, `+a`, `a`).
    ///
    /// Surrounding whitespace is ignored, so a `+` that was decoded to a
    /// space still reads as ascending.
    pub fn parse(item: &str) -> QueryResult<Self> {
        let item = item.trim();
        let (column, direction) = match item.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Desc),
            None => (item.strip_prefix('+').unwrap_or(item), SortDirection::Asc),
        };
        if !is_identifier(column) {
            return Err(QueryError::BadFormat);
        }
        Ok(Self::new(column, direction))
    }

    fn to_sql(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.column.clone(),
            SortDirection::Desc => format!("{} DESC", self.column),
        }
    }
}

/// Ordered sort criteria, leftmost first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder {
    criteria: Vec<SortCriterion>,
}

impl SortOrder {
    pub fn new() -> Self {
        Self { criteria: vec![] }
    }

    pub fn add(&mut self, criterion: SortCriterion) -> &mut Self {
        self.criteria.push(criterion);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn sorts_by(&self, column: &str) -> bool {
        self.criteria.iter().any(|c| c.column == column)
    }

    /// Drop every criterion on `column`; returns how many were dropped
    pub fn remove(&mut self, column: &str) -> usize {
        let before = self.criteria.len();
        self.criteria.retain(|c| c.column != column);
        before - self.criteria.len()
    }

    pub fn rename(&mut self, from: &str, to: &str) {
        for criterion in &mut self.criteria {
            if criterion.column == from {
                criterion.column = to.to_string();
            }
        }
    }

    pub fn clear(&mut self) {
        self.criteria.clear();
    }

    /// ` ORDER BY ...` with a leading space, or empty without criteria
    pub fn order_by(&self) -> String {
        if self.criteria.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self.criteria.iter().map(SortCriterion::to_sql).collect();
        format!(" ORDER BY {}", parts.join(", "))
    }
}

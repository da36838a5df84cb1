//! Query Filters
//!
//! A [`Filter`] is one compiled predicate (`name method value`). A
//! [`FilterSet`] keeps filters in the order they appeared in the query string,
//! grouped into terms: a single filter, or an OR group of two or more filters
//! rendered as a parenthesized disjunction. Terms are joined with AND.

use rqp_core::{QueryError, QueryResult};

use crate::methods::Method;
use crate::value::Value;

/// A single filter condition
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Raw key as it appeared in the query string (e.g. `id[not]`)
    pub key: String,
    /// The field being filtered
    pub name: String,
    /// The method to apply
    pub method: Method,
    /// The value to compare with
    pub value: Value,
}

impl Filter {
    /// Create a new filter; the key is synthesized as `name[method]`
    pub fn new(name: impl Into<String>, method: Method, value: impl Into<Value>) -> Self {
        let name = name.into();
        Self {
            key: format!("{}[{}]", name, method),
            name,
            method,
            value: value.into(),
        }
    }

    /// Create an equals filter
    pub fn equals(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(name, Method::Eq, value)
    }

    /// Create an is null filter
    pub fn is_null(name: impl Into<String>) -> Self {
        Self::new(name, Method::Is, Value::Null)
    }

    /// Create an is not null filter
    pub fn is_not_null(name: impl Into<String>) -> Self {
        Self::new(name, Method::Not, Value::Null)
    }

    /// Predicate text, e.g. `id = ?`
    pub fn where_sql(&self) -> QueryResult<String> {
        self.method.render(&self.name, &self.value)
    }

    /// Values bound by [`Filter::where_sql`], in placeholder order
    pub fn args(&self) -> QueryResult<Vec<Value>> {
        self.method.bind(&self.value)
    }
}

/// One AND-joined member of a [`FilterSet`]
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Single(Filter),
    /// Two or more filters joined with OR
    Or(Vec<Filter>),
}

impl Term {
    /// Build a term from a run of filters; a run of one is not a group
    pub fn from_run(mut filters: Vec<Filter>) -> Option<Self> {
        match filters.len() {
            0 => None,
            1 => filters.pop().map(Term::Single),
            _ => Some(Term::Or(filters)),
        }
    }

    pub fn filters(&self) -> &[Filter] {
        match self {
            Term::Single(filter) => std::slice::from_ref(filter),
            Term::Or(filters) => filters,
        }
    }

    fn filters_mut(&mut self) -> &mut [Filter] {
        match self {
            Term::Single(filter) => std::slice::from_mut(filter),
            Term::Or(filters) => filters,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Term::Or(_))
    }

    fn where_sql(&self) -> QueryResult<String> {
        match self {
            Term::Single(filter) => filter.where_sql(),
            Term::Or(filters) => {
                let parts = filters
                    .iter()
                    .map(Filter::where_sql)
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(format!("({})", parts.join(" OR ")))
            }
        }
    }

    /// Drop every filter named `name`. Returns the rewritten term (None if it
    /// vanished) and how many filters were removed.
    fn without(self, name: &str) -> (Option<Term>, usize) {
        match self {
            Term::Single(filter) if filter.name == name => (None, 1),
            term @ Term::Single(_) => (Some(term), 0),
            Term::Or(filters) => {
                let before = filters.len();
                let kept: Vec<Filter> = filters.into_iter().filter(|f| f.name != name).collect();
                let removed = before - kept.len();
                if removed > 0 && kept.len() < 2 {
                    tracing::trace!(name, survivors = kept.len(), "OR group collapsed");
                }
                (Term::from_run(kept), removed)
            }
        }
    }
}

/// Filter set - ordered terms with AND semantics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    terms: Vec<Term>,
}

impl FilterSet {
    /// Create a new empty filter set
    pub fn new() -> Self {
        Self { terms: vec![] }
    }

    /// Add a filter as its own AND term
    pub fn add(&mut self, filter: Filter) -> &mut Self {
        self.terms.push(Term::Single(filter));
        self
    }

    /// Add a filter and return self (builder pattern)
    pub fn with(mut self, filter: Filter) -> Self {
        self.add(filter);
        self
    }

    /// Add a run of filters as one OR group (a run of one is added plainly)
    pub fn add_or_group(&mut self, filters: Vec<Filter>) -> &mut Self {
        if let Some(term) = Term::from_run(filters) {
            self.terms.push(term);
        }
        self
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// All filters, left to right
    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.terms.iter().flat_map(|t| t.filters().iter())
    }

    /// Check if any filters are set
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Get number of filters (not terms)
    pub fn len(&self) -> usize {
        self.terms.iter().map(|t| t.filters().len()).sum()
    }

    /// Check if a specific field is being filtered
    pub fn has_filter_for(&self, name: &str) -> bool {
        self.iter().any(|f| f.name == name)
    }

    /// The leftmost filter on `name`
    pub fn get(&self, name: &str) -> Option<&Filter> {
        self.iter().find(|f| f.name == name)
    }

    /// Remove every filter on `name`, repairing the OR groups they belonged to:
    /// a group left with one member becomes a plain term, an emptied group vanishes.
    pub fn remove(&mut self, name: &str) -> QueryResult<()> {
        let mut removed = 0;
        let terms = std::mem::take(&mut self.terms);
        for term in terms {
            let (kept, n) = term.without(name);
            removed += n;
            self.terms.extend(kept);
        }

        if removed == 0 {
            return Err(QueryError::FilterNotFound.for_field(name));
        }
        tracing::trace!(name, removed, "Filter removed");
        Ok(())
    }

    /// Rename fields before rendering (e.g. `id` to `u.id`)
    pub fn rename(&mut self, from: &str, to: &str) {
        for term in &mut self.terms {
            for filter in term.filters_mut() {
                if filter.name == from {
                    filter.name = to.to_string();
                }
            }
        }
    }

    /// The WHERE clause with a leading space, or an empty string without filters
    pub fn where_clause(&self) -> QueryResult<String> {
        if self.terms.is_empty() {
            return Ok(String::new());
        }
        let parts = self
            .terms
            .iter()
            .map(Term::where_sql)
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(format!(" WHERE {}", parts.join(" AND ")))
    }

    /// Arguments for [`FilterSet::where_clause`], in placeholder order.
    ///
    /// Includes the unbound null entry of each `is`/`not` filter.
    pub fn args(&self) -> QueryResult<Vec<Value>> {
        let mut args = Vec::new();
        for filter in self.iter() {
            args.extend(filter.args()?);
        }
        Ok(args)
    }

    /// Like [`FilterSet::args`] without the `is`/`not` entries, so the result
    /// lines up one-to-one with the placeholders.
    pub fn bind_args(&self) -> QueryResult<Vec<Value>> {
        let mut args = Vec::new();
        for filter in self.iter() {
            let bound = filter.args()?;
            if !filter.method.is_null_test() {
                args.extend(bound);
            }
        }
        Ok(args)
    }
}

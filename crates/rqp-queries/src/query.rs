//! Query Model
//!
//! [`Query`] takes a decoded query string plus a set of [`Validations`] and
//! turns it into the pieces of a parameterized SELECT: column selection,
//! WHERE clause with bound arguments, ORDER BY, LIMIT and OFFSET.
//!
//! ```
//! use rqp_queries::{Query, Validations};
//!
//! let validations = Validations::new().with("id:int", None).unwrap();
//! let mut query = Query::new(validations);
//! query.set_url_string("?id[gte]=10");
//! query.parse().unwrap();
//!
//! assert_eq!(query.where_sql().unwrap(), " WHERE id >= ?");
//! ```

use std::collections::HashSet;

use rqp_core::{ParserConfig, QueryError, QueryResult};
use url::{form_urlencoded, Url};

use crate::fields::FieldSelection;
use crate::filters::{Filter, FilterSet};
use crate::methods::Method;
use crate::parser::{is_identifier, parse_pair};
use crate::sorts::{SortCriterion, SortDirection, SortOrder};
use crate::validations::{Validations, Validator};
use crate::value::Value;

/// Reserved query-string keys
pub mod keys {
    pub const FIELDS: &str = "fields";
    pub const SORT: &str = "sort";
    pub const LIMIT: &str = "limit";
    pub const OFFSET: &str = "offset";
}

/// Parsed query-string request
#[derive(Debug, Clone, Default)]
pub struct Query {
    config: ParserConfig,
    validations: Validations,
    pairs: Vec<(String, String)>,
    filters: FilterSet,
    fields: FieldSelection,
    sorts: SortOrder,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    /// Create a query with default configuration
    pub fn new(validations: Validations) -> Self {
        Self {
            validations,
            ..Self::default()
        }
    }

    /// Replace the parser configuration
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Set the decoded key/value pairs to parse, in source order
    pub fn set_url_query<I, K, V>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.pairs = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Set pairs from a full URL or a bare query string (with or without a
    /// leading `?`). Anything that does not parse as an absolute URL is
    /// taken as a query string.
    pub fn set_url_string(&mut self, input: &str) -> &mut Self {
        let pairs: Vec<(String, String)> = match input.strip_prefix('?') {
            Some(query) => decode_pairs(query),
            None => match Url::parse(input) {
                Ok(url) => url.query_pairs().into_owned().collect(),
                Err(_) => decode_pairs(input),
            },
        };
        self.set_url_query(pairs)
    }

    /// Parse the pairs set earlier, replacing any previous parse result.
    /// On error nothing parsed from the pairs is kept.
    pub fn parse(&mut self) -> QueryResult<()> {
        self.reset();

        let pairs = std::mem::take(&mut self.pairs);
        let result = self
            .parse_pairs(&pairs)
            .and_then(|_| self.check_required());
        self.pairs = pairs;
        if let Err(e) = result {
            self.reset();
            return Err(e);
        }

        tracing::debug!(
            filters = self.filters.len(),
            fields = self.fields.len(),
            sorts = self.sorts.len(),
            "Query parsed"
        );
        Ok(())
    }

    fn reset(&mut self) {
        self.filters = FilterSet::new();
        self.fields.clear();
        self.sorts.clear();
        self.limit = None;
        self.offset = None;
    }

    fn parse_pairs(&mut self, pairs: &[(String, String)]) -> QueryResult<()> {
        let mut seen = HashSet::new();
        for (key, raw) in pairs {
            if !seen.insert(key.as_str()) {
                return Err(QueryError::SimilarNames.for_field(key));
            }
            match key.as_str() {
                keys::FIELDS => self.parse_fields(raw)?,
                keys::SORT => self.parse_sort(raw)?,
                keys::LIMIT => self.limit = Some(self.parse_number(keys::LIMIT, raw)?),
                keys::OFFSET => self.offset = Some(self.parse_number(keys::OFFSET, raw)?),
                _ => {
                    let run = parse_pair(key, raw, &self.config, &self.validations)?;
                    self.filters.add_or_group(run);
                }
            }
        }
        Ok(())
    }

    fn parse_fields(&mut self, raw: &str) -> QueryResult<()> {
        let rule = self
            .validations
            .get(keys::FIELDS)
            .ok_or_else(|| QueryError::ValidationNotFound.for_field(keys::FIELDS))?;
        for name in raw.split(self.config.delimiter_in.as_str()) {
            let name = name.trim();
            if !is_identifier(name) {
                return Err(QueryError::BadFormat.for_field(keys::FIELDS));
            }
            rule.check(&Value::from(name))
                .map_err(|e| e.for_field(keys::FIELDS))?;
            self.fields.add(name);
        }
        Ok(())
    }

    fn parse_sort(&mut self, raw: &str) -> QueryResult<()> {
        let rule = self
            .validations
            .get(keys::SORT)
            .ok_or_else(|| QueryError::ValidationNotFound.for_field(keys::SORT))?;
        for item in raw.split(self.config.delimiter_in.as_str()) {
            let criterion = SortCriterion::parse(item)
                .and_then(|c| rule.check(&Value::from(c.column.as_str())).map(|_| c))
                .map_err(|e| e.for_field(keys::SORT))?;
            self.sorts.add(criterion);
        }
        Ok(())
    }

    fn parse_number(&self, key: &str, raw: &str) -> QueryResult<u64> {
        let n: u64 = raw
            .trim()
            .parse()
            .map_err(|_| QueryError::BadFormat.for_field(key))?;
        if let Some(rule) = self.validations.get(key) {
            let value = i64::try_from(n).map_err(|_| QueryError::BadFormat.for_field(key))?;
            rule.check(&Value::Int(value)).map_err(|e| e.for_field(key))?;
        }
        Ok(n)
    }

    fn check_required(&self) -> QueryResult<()> {
        let mut required: Vec<&str> = self.validations.required().collect();
        required.sort_unstable();
        for name in required {
            let present = match name {
                keys::FIELDS => !self.fields.is_empty(),
                keys::SORT => !self.sorts.is_empty(),
                keys::LIMIT => self.limit.is_some(),
                keys::OFFSET => self.offset.is_some(),
                _ => self.filters.has_filter_for(name),
            };
            if !present {
                return Err(QueryError::Required.for_field(name));
            }
        }
        Ok(())
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// The WHERE clause with a leading space, or empty without filters
    pub fn where_sql(&self) -> QueryResult<String> {
        self.filters.where_clause()
    }

    /// Arguments for [`Query::where_sql`]; `is`/`not` filters contribute an
    /// unbound null entry
    pub fn args(&self) -> QueryResult<Vec<Value>> {
        self.filters.args()
    }

    /// Arguments with one entry per placeholder, ready to bind
    pub fn bind_args(&self) -> QueryResult<Vec<Value>> {
        self.filters.bind_args()
    }

    pub fn select(&self) -> String {
        self.fields.select()
    }

    pub fn order_by(&self) -> String {
        self.sorts.order_by()
    }

    /// ` LIMIT n`, falling back to the configured default limit
    pub fn limit_sql(&self) -> String {
        match self.limit.or(self.config.default_limit) {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    }

    pub fn offset_sql(&self) -> String {
        match self.offset {
            Some(n) => format!(" OFFSET {}", n),
            None => String::new(),
        }
    }

    /// Complete statement against `table`
    pub fn sql(&self, table: &str) -> QueryResult<String> {
        if !is_identifier(table) {
            return Err(QueryError::BadFormat.for_field(table));
        }
        Ok(format!(
            "{} FROM {}{}{}{}{}",
            self.select(),
            table,
            self.where_sql()?,
            self.order_by(),
            self.limit_sql(),
            self.offset_sql()
        ))
    }

    /// Add a filter as its own AND term. The value is not validated.
    pub fn add_filter(
        &mut self,
        name: impl Into<String>,
        method: Method,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.filters.add(Filter::new(name, method, value));
        self
    }

    /// Add filters as one OR group
    pub fn add_or_filters(&mut self, filters: Vec<Filter>) -> &mut Self {
        self.filters.add_or_group(filters);
        self
    }

    /// Remove every filter on `name`, repairing the OR groups involved
    pub fn remove_filter(&mut self, name: &str) -> QueryResult<()> {
        self.filters.remove(name)
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.has_filter_for(name)
    }

    /// The leftmost filter on `name`
    pub fn get_filter(&self, name: &str) -> QueryResult<&Filter> {
        self.filters
            .get(name)
            .ok_or_else(|| QueryError::FilterNotFound.for_field(name))
    }

    pub fn fields(&self) -> &FieldSelection {
        &self.fields
    }

    pub fn add_field(&mut self, name: impl Into<String>) -> &mut Self {
        self.fields.add(name);
        self
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    pub fn sorts(&self) -> &SortOrder {
        &self.sorts
    }

    pub fn add_sort_by(&mut self, name: impl Into<String>, direction: SortDirection) -> &mut Self {
        self.sorts.add(SortCriterion::new(name, direction));
        self
    }

    pub fn has_sort_by(&self, name: &str) -> bool {
        self.sorts.sorts_by(name)
    }

    /// Drop every sort criterion on `name`
    pub fn remove_sort_by(&mut self, name: &str) -> QueryResult<()> {
        match self.sorts.remove(name) {
            0 => Err(QueryError::FilterNotFound.for_field(name)),
            _ => Ok(()),
        }
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn validations(&self) -> &Validations {
        &self.validations
    }

    /// Add or replace a validation entry (`name[:type][:required]`)
    pub fn add_validation(&mut self, key: &str, validator: Option<Validator>) -> QueryResult<&mut Self> {
        self.validations.insert(key, validator)?;
        Ok(self)
    }

    pub fn remove_validation(&mut self, name: &str) -> QueryResult<()> {
        self.validations.remove(name)
    }

    /// Skip fields without a validation entry instead of failing
    pub fn ignore_unknown_filters(&mut self, ignore: bool) -> &mut Self {
        self.config.ignore_unknown_filters = ignore;
        self
    }

    /// Rename fields in filters, selection and sort order, e.g. `id` to `u.id`.
    /// Applies to what has been parsed or added so far.
    pub fn replace_names<'a, I>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (from, to) in names {
            self.filters.rename(from, to);
            self.fields.rename(from, to);
            self.sorts.rename(from, to);
        }
        self
    }
}

fn decode_pairs(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}

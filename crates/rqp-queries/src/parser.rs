//! Key/value parsing
//!
//! Compiles one decoded query-string pair into filters. Keys look like
//! `name` or `name[method]`. A value may chain OR alternatives with the
//! configured OR delimiter, e.g. `test1[eq]=a|test2[eq]=b` or `id[eq]=1|2`.

use std::sync::LazyLock;

use regex::Regex;
use rqp_core::{ParserConfig, QueryError, QueryResult};

use crate::filters::Filter;
use crate::methods::Method;
use crate::validations::{FieldRule, Validations};
use crate::value::{is_null_literal, Value};

static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_.]*)(?:\[([^\[\]]*)\])?$").expect("valid filter key regex")
});

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("valid identifier regex"));

/// Whether `s` is safe to render verbatim as a column name
pub fn is_identifier(s: &str) -> bool {
    IDENT_RE.is_match(s)
}

/// Split `name[method]` into its parts; a bare name means `eq`
pub fn parse_key(key: &str) -> QueryResult<(String, Method)> {
    let caps = KEY_RE
        .captures(key)
        .ok_or_else(|| QueryError::BadFormat.for_field(key))?;
    let name = caps[1].to_string();
    let method = match caps.get(2) {
        None => Method::Eq,
        Some(token) => Method::from_token(&token.as_str().to_lowercase())
            .ok_or_else(|| QueryError::UnknownMethod.for_field(key))?,
    };
    Ok((name, method))
}

/// Compile one key/value pair into a filter.
///
/// `null` (any case) always becomes [`Value::Null`]; whether the method
/// accepts it is decided when the filter is rendered.
pub fn new_filter(
    key: &str,
    raw: &str,
    delimiter_in: &str,
    validations: &Validations,
) -> QueryResult<Filter> {
    let (name, method) = parse_key(key)?;
    let rule = validations
        .get(&name)
        .ok_or_else(|| QueryError::FilterNotAllowed.for_field(&name))?;

    if !rule.field_type.allows(method) {
        return Err(QueryError::MethodNotAllowed.for_field(&name));
    }

    let value = parse_value(rule, method, raw, delimiter_in).map_err(|e| e.for_field(&name))?;

    tracing::debug!(key, name = %name, method = %method, value = %value, "Filter parsed");
    Ok(Filter {
        key: key.to_string(),
        name,
        method,
        value,
    })
}

fn parse_value(rule: &FieldRule, method: Method, raw: &str, delimiter_in: &str) -> QueryResult<Value> {
    if is_null_literal(raw) {
        return Ok(Value::Null);
    }

    if method.expects_list() {
        let items = raw
            .split(delimiter_in)
            .map(|piece| {
                let value = rule.field_type.coerce(piece)?;
                rule.check(&value)?;
                Ok(value)
            })
            .collect::<QueryResult<Vec<_>>>()?;
        return Ok(Value::List(items));
    }

    let value = rule.field_type.coerce(raw)?;
    rule.check(&value)?;
    Ok(value)
}

/// Split a sub-expression into its own key and value, if it carries one
fn split_sub_expression(part: &str) -> Option<(&str, &str)> {
    let (key, value) = part.split_once('=')?;
    KEY_RE.is_match(key).then_some((key, value))
}

/// Compile one pair into the run of filters it encodes.
///
/// A run longer than one is an OR group. With `ignore_unknown_filters` set,
/// alternatives on fields missing from `validations` are dropped.
pub fn parse_pair(
    key: &str,
    raw: &str,
    config: &ParserConfig,
    validations: &Validations,
) -> QueryResult<Vec<Filter>> {
    let mut run = Vec::new();

    for (i, part) in raw.split(config.delimiter_or.as_str()).enumerate() {
        let (sub_key, sub_raw) = match split_sub_expression(part) {
            Some(pair) if i > 0 => pair,
            _ => (key, part),
        };

        match new_filter(sub_key, sub_raw, &config.delimiter_in, validations) {
            Ok(filter) => run.push(filter),
            Err(e) if config.ignore_unknown_filters && e.root() == &QueryError::FilterNotAllowed => {
                tracing::debug!(key = sub_key, "Unknown filter skipped");
            }
            Err(e) => return Err(e),
        }
    }

    if run.len() > 1 {
        tracing::debug!(key, members = run.len(), "OR group parsed");
    }
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_validations() -> Validations {
        Validations::new().with("color_id:int", None).unwrap()
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("id").unwrap(), ("id".to_string(), Method::Eq));
        assert_eq!(parse_key("id[gte]").unwrap(), ("id".to_string(), Method::Gte));
        assert_eq!(parse_key("u.id[NIN]").unwrap(), ("u.id".to_string(), Method::Nin));

        assert_eq!(parse_key("id[fake]").unwrap_err().root(), &QueryError::UnknownMethod);
        assert_eq!(parse_key("id[]").unwrap_err().root(), &QueryError::UnknownMethod);
        assert_eq!(parse_key("id[eq").unwrap_err().root(), &QueryError::BadFormat);
        assert_eq!(parse_key("1id").unwrap_err().root(), &QueryError::BadFormat);
        assert_eq!(parse_key("id;drop").unwrap_err().root(), &QueryError::BadFormat);
    }

    #[test]
    fn test_parse_is_null() {
        let filter = new_filter("color_id[is]", "null", ",", &color_validations()).unwrap();
        assert_eq!(filter.key, "color_id[is]");
        assert_eq!(filter.name, "color_id");
        assert_eq!(filter.method, Method::Is);
        assert_eq!(filter.value, Value::Null);
        assert_eq!(filter.where_sql().unwrap(), "color_id IS NULL");
        assert_eq!(filter.args().unwrap(), vec![Value::Null]);
    }

    #[test]
    fn test_parse_not_null_mixed_case() {
        let filter = new_filter("color_id[not]", "NULL", ",", &color_validations()).unwrap();
        assert_eq!(filter.key, "color_id[not]");
        assert_eq!(filter.method, Method::Not);
        assert_eq!(filter.value, Value::Null);
        assert_eq!(filter.where_sql().unwrap(), "color_id IS NOT NULL");
        assert_eq!(filter.args().unwrap(), vec![Value::Null]);
    }

    #[test]
    fn test_parse_int_value() {
        let filter = new_filter("color_id[eq]", "123", ",", &color_validations()).unwrap();
        assert_eq!(filter.method, Method::Eq);
        assert_eq!(filter.value, Value::Int(123));
        assert_eq!(filter.where_sql().unwrap(), "color_id = ?");
        assert_eq!(filter.args().unwrap(), vec![Value::Int(123)]);
    }

    #[test]
    fn test_eq_null_fails_only_on_render() {
        let filter = new_filter("color_id[eq]", "null", ",", &color_validations()).unwrap();
        assert_eq!(filter.value, Value::Null);
        assert_eq!(filter.where_sql(), Err(QueryError::UnknownMethod));
        assert_eq!(filter.args(), Err(QueryError::UnknownMethod));
    }

    #[test]
    fn test_parse_in_list() {
        let validations = Validations::new().with("name", None).unwrap();
        let filter = new_filter("name[in]", ",test,", ",", &validations).unwrap();
        assert_eq!(
            filter.value,
            Value::List(vec![Value::from(""), Value::from("test"), Value::from("")])
        );
        assert_eq!(filter.where_sql().unwrap(), "name IN (?, ?, ?)");

        let filter = new_filter("color_id[nin]", "1;2", ";", &color_validations()).unwrap();
        assert_eq!(filter.value, Value::from(vec![1, 2]));
    }

    #[test]
    fn test_parse_errors() {
        let validations = color_validations();

        let err = new_filter("color_id", "red", ",", &validations).unwrap_err();
        assert_eq!(err.root(), &QueryError::BadFormat);
        assert_eq!(err.field(), Some("color_id"));

        let err = new_filter("color_id[like]", "1", ",", &validations).unwrap_err();
        assert_eq!(err.root(), &QueryError::MethodNotAllowed);

        let err = new_filter("size", "1", ",", &validations).unwrap_err();
        assert_eq!(err.root(), &QueryError::FilterNotAllowed);
        assert_eq!(err.field(), Some("size"));

        let err = new_filter("color_id[in]", "1,x", ",", &validations).unwrap_err();
        assert_eq!(err.root(), &QueryError::BadFormat);
    }

    #[test]
    fn test_validator_runs_per_element() {
        let validations = Validations::new()
            .with("id:int", Some(crate::validations::max(10)))
            .unwrap();
        assert!(new_filter("id[in]", "1,10", ",", &validations).is_ok());

        let err = new_filter("id[in]", "1,11", ",", &validations).unwrap_err();
        assert_eq!(err.root(), &QueryError::NotInScope);
        assert_eq!(err.field(), Some("id"));

        // null skips the hook
        assert!(new_filter("id[is]", "null", ",", &validations).is_ok());
    }

    #[test]
    fn test_parse_or_chain() {
        let validations = Validations::from_entries(vec![("test1", None), ("test2", None)]).unwrap();
        let config = ParserConfig::default();

        let run = parse_pair("test1[eq]", "test10|test2[eq]=test10", &config, &validations).unwrap();
        assert_eq!(run.len(), 2);
        assert_eq!(run[0].name, "test1");
        assert_eq!(run[1].name, "test2");
        assert_eq!(run[1].key, "test2[eq]");

        let run = parse_pair("test1[like]", "a%|b%", &config, &validations).unwrap();
        assert_eq!(run.len(), 2);
        assert!(run.iter().all(|f| f.name == "test1" && f.method == Method::Like));
        assert_eq!(run[1].value, Value::from("b%"));
    }

    #[test]
    fn test_first_value_keeps_equals_sign() {
        let validations = Validations::new().with("q", None).unwrap();
        let run = parse_pair("q", "a=b", &ParserConfig::default(), &validations).unwrap();
        assert_eq!(run.len(), 1);
        assert_eq!(run[0].value, Value::from("a=b"));
    }

    #[test]
    fn test_unknown_alternatives() {
        let validations = Validations::new().with("test1", None).unwrap();
        let mut config = ParserConfig::default();

        let err = parse_pair("test1", "a|nope[eq]=b", &config, &validations).unwrap_err();
        assert_eq!(err.root(), &QueryError::FilterNotAllowed);

        config.ignore_unknown_filters = true;
        let run = parse_pair("test1", "a|nope[eq]=b", &config, &validations).unwrap();
        assert_eq!(run.len(), 1);
        assert!(parse_pair("nope", "a", &config, &validations).unwrap().is_empty());
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("created_at"));
        assert!(is_identifier("u.id"));
        assert!(!is_identifier("id desc"));
        assert!(!is_identifier("id;--"));
        assert!(!is_identifier(""));
    }
}

//! Parser configuration
//!
//! Delimiters and policies the query parser consults. Values come from
//! defaults, or from `RQP_*` environment variables via [`ParserConfig::from_env`].

use serde::{Deserialize, Serialize};

pub const ENV_DELIMITER_IN: &str = "RQP_DELIMITER_IN";
pub const ENV_DELIMITER_OR: &str = "RQP_DELIMITER_OR";
pub const ENV_IGNORE_UNKNOWN_FILTERS: &str = "RQP_IGNORE_UNKNOWN_FILTERS";
pub const ENV_DEFAULT_LIMIT: &str = "RQP_DEFAULT_LIMIT";

/// Query parser configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParserConfig {
    /// Separator between list elements (`in`/`nin` values, `fields`, `sort`)
    pub delimiter_in: String,
    /// Separator between OR-chained sub-expressions inside one value
    pub delimiter_or: String,
    /// Skip fields that have no validation entry instead of failing
    pub ignore_unknown_filters: bool,
    /// LIMIT to render when the request does not specify one
    pub default_limit: Option<u64>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter_in: ",".to_string(),
            delimiter_or: "|".to_string(),
            ignore_unknown_filters: false,
            default_limit: None,
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

impl ParserConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, starting from defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(delimiter) = lookup(ENV_DELIMITER_IN) {
            config.delimiter_in = delimiter;
        }
        if let Some(delimiter) = lookup(ENV_DELIMITER_OR) {
            config.delimiter_or = delimiter;
        }
        if let Some(v) = lookup(ENV_IGNORE_UNKNOWN_FILTERS) {
            config.ignore_unknown_filters = parse_bool(&v)
                .ok_or_else(|| ConfigError::invalid(ENV_IGNORE_UNKNOWN_FILTERS, "expected a boolean"))?;
        }
        if let Some(v) = lookup(ENV_DEFAULT_LIMIT) {
            let limit = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid(ENV_DEFAULT_LIMIT, "expected a non-negative integer"))?;
            config.default_limit = Some(limit);
        }

        config.validate()?;
        tracing::debug!(
            delimiter_in = %config.delimiter_in,
            delimiter_or = %config.delimiter_or,
            ignore_unknown_filters = config.ignore_unknown_filters,
            "Parser configuration loaded"
        );
        Ok(config)
    }

    /// Check delimiter sanity
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delimiter_in.is_empty() {
            return Err(ConfigError::invalid(ENV_DELIMITER_IN, "must not be empty"));
        }
        if self.delimiter_or.is_empty() {
            return Err(ConfigError::invalid(ENV_DELIMITER_OR, "must not be empty"));
        }
        if self.delimiter_in == self.delimiter_or {
            return Err(ConfigError::invalid(
                ENV_DELIMITER_OR,
                "must differ from the IN delimiter",
            ));
        }
        Ok(())
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

//! rqp
//!
//! Parses a query string against validations given on the command line and
//! prints the resulting SQL and bound arguments as JSON.
//!
//! ```text
//! rqp --table users -v id:int -v status=active,banned -v sort '?id[gt]=5&status=active&sort=-id'
//! ```

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rqp_core::{ParserConfig, QueryError};
use rqp_queries::validations::in_list;
use rqp_queries::{FieldRule, Query, Validations, Validator};

#[derive(Parser, Debug)]
#[command(name = "rqp")]
#[command(version, about = "Translate REST query strings into parameterized SQL", long_about = None)]
struct Cli {
    /// Table name for the rendered statement
    #[arg(long, short = 't', env = "RQP_TABLE", default_value = "items")]
    table: String,

    /// Validation entry `name[:type][:required]`, optionally `=a,b,...` to
    /// restrict the accepted values
    #[arg(long = "validation", short = 'v', value_name = "KEY[=a,b,...]")]
    validations: Vec<String>,

    /// Skip query keys that have no validation entry
    #[arg(long)]
    ignore_unknown: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Query string or full URL
    query: String,
}

/// Parse one `-v` argument into a validation key and optional hook
fn parse_validation(arg: &str) -> Result<(&str, Option<Validator>), QueryError> {
    let Some((key, list)) = arg.split_once('=') else {
        return Ok((arg, None));
    };
    let rule = FieldRule::parse(key)?;
    let allowed = list
        .split(',')
        .map(|item| rule.field_type.coerce(item))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.for_field(key))?;
    Ok((key, Some(in_list(allowed))))
}

fn build_validations(args: &[String]) -> Result<Validations, QueryError> {
    let mut validations = Validations::new();
    for arg in args {
        let (key, validator) = parse_validation(arg)?;
        validations.insert(key, validator)?;
    }
    Ok(validations)
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config = ParserConfig::from_env().context("invalid parser configuration")?;
    if cli.ignore_unknown {
        config.ignore_unknown_filters = true;
    }

    let validations = build_validations(&cli.validations).context("invalid validation")?;
    info!(validations = validations.len(), "Parsing query");

    let mut query = Query::new(validations).with_config(config);
    query.set_url_string(&cli.query);
    query.parse().context("query rejected")?;

    let output = serde_json::json!({
        "sql": query.sql(&cli.table)?,
        "where": query.where_sql()?,
        "args": query.bind_args()?,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Logs go to stderr; stdout carries only the JSON result
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn,rqp=info,rqp_queries=info".into());

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rqp_queries::Value;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::parse_from(["rqp", "-v", "id:int", "-v", "sort", "--ignore-unknown", "?id=1"]);
        assert_eq!(cli.table, "items");
        assert_eq!(cli.validations, vec!["id:int", "sort"]);
        assert!(cli.ignore_unknown);
        assert_eq!(cli.query, "?id=1");
    }

    #[test]
    fn test_parse_validation() {
        let (key, validator) = parse_validation("id:int").unwrap();
        assert_eq!(key, "id:int");
        assert!(validator.is_none());

        let (key, validator) = parse_validation("id:int=1,2").unwrap();
        assert_eq!(key, "id:int");
        let validator = validator.unwrap();
        assert!(validator(&Value::Int(2)).is_ok());
        assert_eq!(validator(&Value::Int(3)), Err(QueryError::NotInScope));

        let Err(err) = parse_validation("id:int=1,x") else {
            panic!("uncoercible allowed value accepted");
        };
        assert_eq!(err.root(), &QueryError::BadFormat);
        assert_eq!(err.field(), Some("id:int"));

        let Err(err) = parse_validation("id:uuid=1") else {
            panic!("unknown type accepted");
        };
        assert_eq!(err.root(), &QueryError::UnknownType("uuid".into()));
    }

    #[test]
    fn test_build_validations() {
        let args = vec!["status=open,closed".to_string(), "id:i:required".to_string()];
        let validations = build_validations(&args).unwrap();
        assert!(validations.get("id").unwrap().required);

        let mut query = Query::new(validations);
        query.set_url_string("?status=open&id=3");
        query.parse().unwrap();
        assert_eq!(query.sql("t").unwrap(), "SELECT * FROM t WHERE status = ? AND id = ?");

        query.set_url_string("?status=gone&id=3");
        assert_eq!(query.parse().unwrap_err().root(), &QueryError::NotInScope);
    }
}

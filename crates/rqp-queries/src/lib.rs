//! # rqp-queries
//!
//! Translates REST query-string parameters into parameterized SQL.
//!
//! ## Structure
//!
//! - `methods` - Comparison methods and their SQL rendering rules
//! - `value` - Typed filter values and field types
//! - `filters` - Filters and the AND/OR filter sequence
//! - `validations` - Allowed fields, their types and validator hooks
//! - `parser` - Compiling `name[method]=value` pairs into filters
//! - `fields` - Column selection
//! - `sorts` - Sort orders and directions
//! - `query` - The query facade tying it all together
//!
//! ## Example
//!
//! ```
//! use rqp_queries::{Query, Validations, Value};
//!
//! let validations = Validations::from_entries(vec![("test1", None), ("test2", None)]).unwrap();
//! let mut query = Query::new(validations);
//! query.set_url_string("?test1[eq]=a|test2[eq]=b");
//! query.parse().unwrap();
//!
//! assert_eq!(query.where_sql().unwrap(), " WHERE (test1 = ? OR test2 = ?)");
//! assert_eq!(query.args().unwrap(), vec![Value::from("a"), Value::from("b")]);
//!
//! query.remove_filter("test1").unwrap();
//! assert_eq!(query.where_sql().unwrap(), " WHERE test2 = ?");
//! ```

pub mod fields;
pub mod filters;
pub mod methods;
pub mod parser;
pub mod query;
pub mod sorts;
pub mod validations;
pub mod value;

// Re-exports for convenience
pub use fields::FieldSelection;
pub use filters::{Filter, FilterSet, Term};
pub use methods::{Arity, Method, Rule};
pub use query::Query;
pub use sorts::{SortCriterion, SortDirection, SortOrder};
pub use validations::{FieldRule, Validations, Validator};
pub use value::{FieldType, Value};

//! # rqp-core
//!
//! Core types shared by the REST query parser crates.
//!
//! This crate provides the foundational building blocks used by the other crates:
//! - The query error type and its result alias
//! - Parser configuration (delimiters, unknown-filter policy, default limit)

pub mod config;
pub mod error;

pub use config::{ConfigError, ParserConfig};
pub use error::*;

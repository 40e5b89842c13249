//! Warehouse access: connection, statement execution and table schemas

pub mod introspect;
pub mod schema;
pub mod warehouse;

pub use introspect::*;
pub use schema::*;
pub use warehouse::*;

use serde::Deserialize;
use std::fmt;

/// SQL dialect used to render DDL
///
/// DML is written in the subset shared by both targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Amazon Redshift (production target)
    #[default]
    Redshift,
    /// Plain PostgreSQL (local testing)
    Postgres,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Redshift => write!(f, "redshift"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

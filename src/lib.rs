//! Programmatic construction of parameterized Cypher statements.
//!
//! Statements are assembled clause by clause through [`CypherBuilder`]; every
//! literal value is extracted into a parameter table and referenced from the
//! text as a `$name` placeholder.

#![warn(missing_docs)]

pub mod cli;
pub mod query;
pub mod types;

pub use query::{BuilderOptions, CypherBuilder, Query};
pub use types::{BuilderError, Result};

#![forbid(unsafe_code)]

//! Shared value, parameter and error types.

/// Builder errors and the crate-wide `Result` alias.
pub mod error;
/// Parameter tables and collision handling.
pub mod params;
/// Parameter values.
pub mod value;

pub use error::{BuilderError, BuilderErrorWithCode, ErrorKind, Result};
pub use params::{param_name, CollisionPolicy, Params};
pub use value::{Value, ValueCategory};

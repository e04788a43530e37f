#![forbid(unsafe_code)]

//! Command-line support: query scripts and their runner.

/// JSON query scripts and the runner that replays them.
///
/// Each script step maps onto one [`CypherBuilder`](crate::query::CypherBuilder)
/// call; the runner finalizes the statement after the last step.
pub mod script;

pub use script::{run_script, CliError, ConditionSpec, GroupStep, OrderStep, QueryScript, Step};

#![forbid(unsafe_code)]

//! Cypher statement construction.
//!
//! Pattern, predicate, ordering and projection sub-builders each render one
//! clause; [`CypherBuilder`] sequences them into a complete statement with a
//! single parameter table.

/// Statement orchestrator and clause transition rules.
///
/// Opens, forwards to and flushes clause sub-builders as calls arrive.
pub mod builder;

/// MATCH and CREATE clauses made of one or more patterns.
pub mod clause;

/// Helpers wrapping Cypher built-in functions.
pub mod functions;

/// ORDER BY clause builder.
pub mod ordering;

/// Node, edge and path pattern rendering.
///
/// Property values are emitted as `$name` placeholders and bound into the
/// renderer's parameter table.
pub mod pattern;

/// WHERE expressions, operators and validation.
pub mod predicate;

/// RETURN clause builder.
pub mod projection;

/// Lifecycle shared by every sub-builder.
pub mod state;

pub use builder::{BuilderOptions, ClauseKind, CypherBuilder, Query};
pub use clause::{PatternClause, PatternClauseKind};
pub use ordering::{Order, OrderByBuilder};
pub use pattern::{Connection, Direction, EdgePattern, FieldValue, NodePattern, PatternRenderer};
pub use predicate::{
    Condition, Connective, Operator, OperatorClass, Predicate, PredicateBuilder, RawExpression,
};
pub use projection::{ReturnBuilder, ReturnItem};
pub use state::BuilderState;

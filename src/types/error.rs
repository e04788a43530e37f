#![forbid(unsafe_code)]
#![allow(missing_docs)]

use std::fmt;

use thiserror::Error;

use crate::query::ClauseKind;
use crate::types::value::ValueCategory;

/// Coarse failure class of a [`BuilderError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operation invoked in the wrong lifecycle state of a sub-builder.
    Lifecycle,
    /// Clause combinator invoked while the wrong clause (or none) is active.
    Precondition,
    /// Predicate value incompatible with its operator.
    ValueMismatch,
    /// Clause terminated without any accumulated entries.
    EmptyTerminal,
    /// Two fragments tried to bind different values to one parameter name.
    ParameterCollision,
    /// Statement already finalized with `done()`.
    Finalized,
}

/// Construction errors raised by every builder in the crate.
///
/// All of them are synchronous and fatal to the call that raised them; the
/// builder state is left as it was before the failing call whenever possible.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuilderError {
    /// A once-only initializer was called a second time.
    #[error("{builder}: `initialize` may only be called once")]
    AlreadyInitialized { builder: &'static str },
    /// An operation needs an initialized builder.
    #[error("{builder}: `{operation}` may only be called after initialization")]
    NotInitialized {
        builder: &'static str,
        operation: &'static str,
    },
    /// The builder was terminated and is frozen.
    #[error("{builder}: builder already terminated")]
    AlreadyTerminated { builder: &'static str },
    /// A clause was handed a pattern renderer that is still open.
    #[error("{clause}: cannot use an unterminated pattern")]
    PatternNotTerminated { clause: ClauseKind },
    /// CREATE targets exactly one pattern.
    #[error("CREATE: `create` may only be called once per clause")]
    CreateOnce,
    /// `where` was called twice on the same predicate builder.
    #[error("`where` can only be used once; use `and`, `or` or `xor` instead")]
    WhereOnce,
    /// A connective was used before any `where` call.
    #[error("`{connective}` must be used after a `where` call")]
    MissingWhere { connective: &'static str },
    /// `distinct` was requested twice on one RETURN.
    #[error("RETURN: `distinct` may only be called once per RETURN clause")]
    DistinctTwice,
    /// A nested predicate group had no expression.
    #[error("nested predicate group must contain at least one condition")]
    EmptyPredicateGroup,
    /// The orchestrator had the wrong (or no) clause active.
    #[error("`{operation}` requires an active {required} clause (active: {})", display_active(.active))]
    Precondition {
        operation: &'static str,
        required: &'static str,
        active: Option<ClauseKind>,
    },
    /// Operator text did not name a known operator.
    #[error("invalid operator provided (provided \"{operator}\")")]
    InvalidOperator { operator: String },
    /// A null-check operator was given a value.
    #[error("operator \"{operator}\" on field '{field}' does not take a value")]
    UnexpectedValue {
        operator: &'static str,
        field: String,
    },
    /// Value category incompatible with the operator class.
    #[error("operator \"{operator}\" on field '{field}' may only be used with {expected} (got {})", display_found(.found))]
    OperatorValueMismatch {
        operator: &'static str,
        field: String,
        expected: &'static str,
        found: Option<ValueCategory>,
    },
    /// NaN cannot take part in a numeric comparison.
    #[error("operator \"{operator}\" on field '{field}' received a NaN value")]
    NotANumber {
        operator: &'static str,
        field: String,
    },
    /// RETURN or ORDER BY terminated with nothing to render.
    #[error("{clause}: no values specified")]
    EmptyClause { clause: ClauseKind },
    /// Two fragments bound different values to the same parameter.
    #[error("parameter '${name}' is already bound to a different value; alias one of the fields")]
    ParameterCollision { name: String },
    /// Mutation attempted after `done()`.
    #[error("builder already finalized")]
    Finalized,
    /// `done()` called before any clause was added.
    #[error("cannot finalize an empty statement")]
    EmptyStatement,
    /// `elementId` applied to something other than a bare tag.
    #[error("`elementId` can only be applied on nodes (got '{value}')")]
    ElementIdOnProperty { value: String },
}

fn display_active(active: &Option<ClauseKind>) -> String {
    match active {
        Some(kind) => kind.to_string(),
        None => "none".to_string(),
    }
}

fn display_found(found: &Option<ValueCategory>) -> String {
    match found {
        Some(category) => category.to_string(),
        None => "no value".to_string(),
    }
}

impl BuilderError {
    /// Builds a [`BuilderError::Precondition`] for the given operation.
    pub fn precondition(
        operation: &'static str,
        required: &'static str,
        active: Option<ClauseKind>,
    ) -> Self {
        BuilderError::Precondition {
            operation,
            required,
            active,
        }
    }

    /// Returns the failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuilderError::AlreadyInitialized { .. }
            | BuilderError::NotInitialized { .. }
            | BuilderError::AlreadyTerminated { .. }
            | BuilderError::PatternNotTerminated { .. }
            | BuilderError::CreateOnce
            | BuilderError::WhereOnce
            | BuilderError::DistinctTwice => ErrorKind::Lifecycle,
            BuilderError::MissingWhere { .. } | BuilderError::Precondition { .. } => {
                ErrorKind::Precondition
            }
            BuilderError::InvalidOperator { .. }
            | BuilderError::UnexpectedValue { .. }
            | BuilderError::OperatorValueMismatch { .. }
            | BuilderError::NotANumber { .. }
            | BuilderError::ElementIdOnProperty { .. } => ErrorKind::ValueMismatch,
            BuilderError::EmptyClause { .. }
            | BuilderError::EmptyPredicateGroup
            | BuilderError::EmptyStatement => ErrorKind::EmptyTerminal,
            BuilderError::ParameterCollision { .. } => ErrorKind::ParameterCollision,
            BuilderError::Finalized => ErrorKind::Finalized,
        }
    }

    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            BuilderError::AlreadyInitialized { .. } => "AlreadyInitialized",
            BuilderError::NotInitialized { .. } => "NotInitialized",
            BuilderError::AlreadyTerminated { .. } => "AlreadyTerminated",
            BuilderError::PatternNotTerminated { .. } => "PatternNotTerminated",
            BuilderError::CreateOnce => "CreateOnce",
            BuilderError::WhereOnce => "WhereOnce",
            BuilderError::MissingWhere { .. } => "MissingWhere",
            BuilderError::DistinctTwice => "DistinctTwice",
            BuilderError::EmptyPredicateGroup => "EmptyPredicateGroup",
            BuilderError::Precondition { .. } => "Precondition",
            BuilderError::InvalidOperator { .. } => "InvalidOperator",
            BuilderError::UnexpectedValue { .. } => "TypeMismatch",
            BuilderError::OperatorValueMismatch { .. } => "TypeMismatch",
            BuilderError::NotANumber { .. } => "TypeMismatch",
            BuilderError::EmptyClause { .. } => "EmptyClause",
            BuilderError::ParameterCollision { .. } => "ParameterCollision",
            BuilderError::Finalized => "Finalized",
            BuilderError::EmptyStatement => "EmptyStatement",
            BuilderError::ElementIdOnProperty { .. } => "ElementIdOnProperty",
        }
    }
}

/// Convenience wrapper that formats builder errors with their codes.
pub struct BuilderErrorWithCode<'a>(pub &'a BuilderError);

impl fmt::Display for BuilderErrorWithCode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.0.code(), self.0)
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BuilderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_message_names_active_clause() {
        let err = BuilderError::precondition("and", "WHERE", Some(ClauseKind::Return));
        assert_eq!(
            err.to_string(),
            "`and` requires an active WHERE clause (active: RETURN)"
        );
        assert_eq!(err.kind(), ErrorKind::Precondition);

        let err = BuilderError::precondition("distinct", "RETURN", None);
        assert!(err.to_string().ends_with("(active: none)"));
    }

    #[test]
    fn mismatch_message_names_operator_and_category() {
        let err = BuilderError::OperatorValueMismatch {
            operator: ">",
            field: "age".into(),
            expected: "numbers",
            found: Some(ValueCategory::String),
        };
        assert_eq!(
            err.to_string(),
            "operator \">\" on field 'age' may only be used with numbers (got string)"
        );
        assert_eq!(
            BuilderErrorWithCode(&err).to_string(),
            format!("[TypeMismatch] {err}")
        );
    }
}

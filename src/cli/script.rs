//! JSON query scripts replayed against a [`CypherBuilder`].
//!
//! A script is `{"steps": [...]}` where each step names one builder call:
//!
//! ```json
//! {"steps": [
//!   {"match": {"tag": "p", "labels": "Person"}},
//!   {"connect": {"edge": {"direction": "forward", "labels": "OWNS"},
//!                "node": {"tag": "h", "labels": "House"}}},
//!   {"where": {"field": "p.age", "operator": ">", "value": 30}},
//!   {"return": "h"},
//!   "distinct"
//! ]}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::query::{
    BuilderOptions, Condition, Connection, Connective, CypherBuilder, NodePattern, Order,
    Predicate, PredicateBuilder, Query, RawExpression, ReturnItem,
};
use crate::types::{BuilderError, CollisionPolicy};

/// Errors raised while loading or replaying a script.
#[derive(Debug, Error)]
pub enum CliError {
    /// Script file could not be read.
    #[error("failed to read script {path}: {source}")]
    Read {
        /// Script location.
        path: PathBuf,
        /// Underlying IO failure.
        source: std::io::Error,
    },
    /// Script text is not a valid query script.
    #[error("invalid query script: {0}")]
    Parse(#[from] serde_json::Error),
    /// A step was rejected by the builder.
    #[error("step {index} ({step}): {source}")]
    Step {
        /// Zero-based step position.
        index: usize,
        /// Step name as written in the script.
        step: &'static str,
        /// Builder failure.
        source: BuilderError,
    },
    /// Finalizing the statement failed.
    #[error(transparent)]
    Builder(#[from] BuilderError),
}

/// Parsed query script.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryScript {
    /// Builder calls in order.
    pub steps: Vec<Step>,
}

impl QueryScript {
    /// Parses a script from JSON text.
    pub fn from_json(text: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a script file.
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let text = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

/// One builder call.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// `match`; `null` starts an empty node.
    Match(Option<NodePattern>),
    /// `create`; `null` starts an empty node.
    Create(Option<NodePattern>),
    /// `connect`
    Connect(Connection),
    /// `where`
    Where(ConditionSpec),
    /// `and`
    And(ConditionSpec),
    /// `or`
    Or(ConditionSpec),
    /// `xor`
    Xor(ConditionSpec),
    /// `order_by`
    OrderBy(OrderStep),
    /// `return`
    Return(ReturnItem),
    /// `distinct`
    Distinct,
}

impl Step {
    /// Name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Match(_) => "match",
            Step::Create(_) => "create",
            Step::Connect(_) => "connect",
            Step::Where(_) => "where",
            Step::And(_) => "and",
            Step::Or(_) => "or",
            Step::Xor(_) => "xor",
            Step::OrderBy(_) => "order_by",
            Step::Return(_) => "return",
            Step::Distinct => "distinct",
        }
    }
}

/// Argument of an `order_by` step.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderStep {
    /// Sort key expression.
    pub property: String,
    /// Direction; omitted renders no keyword.
    #[serde(default)]
    pub order: Option<Order>,
}

/// Condition as written in a script.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ConditionSpec {
    /// Raw text inserted verbatim.
    Raw(String),
    /// Nested expression rendered in parentheses.
    Group {
        /// `where` followed by connective steps.
        group: Vec<GroupStep>,
    },
    /// Validated comparison.
    Leaf(Predicate),
    /// Raw text with parameters.
    Expression(RawExpression),
}

/// Step allowed inside a condition group.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStep {
    /// First condition.
    Where(ConditionSpec),
    /// `AND` condition.
    And(ConditionSpec),
    /// `OR` condition.
    Or(ConditionSpec),
    /// `XOR` condition.
    Xor(ConditionSpec),
}

impl ConditionSpec {
    /// Converts into a builder condition, rendering groups eagerly.
    pub fn into_condition(self, policy: CollisionPolicy) -> Result<Condition, BuilderError> {
        match self {
            ConditionSpec::Raw(text) => Ok(Condition::Raw(text)),
            ConditionSpec::Leaf(predicate) => Ok(Condition::Leaf(predicate)),
            ConditionSpec::Expression(raw) => Ok(Condition::Expression(raw)),
            ConditionSpec::Group { group } => {
                let mut builder = PredicateBuilder::with_policy(policy);
                for step in group {
                    match step {
                        GroupStep::Where(spec) => {
                            builder.r#where(spec.into_condition(policy)?)?;
                        }
                        GroupStep::And(spec) => {
                            builder.append(Connective::And, spec.into_condition(policy)?)?;
                        }
                        GroupStep::Or(spec) => {
                            builder.append(Connective::Or, spec.into_condition(policy)?)?;
                        }
                        GroupStep::Xor(spec) => {
                            builder.append(Connective::Xor, spec.into_condition(policy)?)?;
                        }
                    }
                }
                Ok(Condition::Group(builder))
            }
        }
    }
}

fn apply_step(
    builder: &mut CypherBuilder,
    step: Step,
    policy: CollisionPolicy,
) -> Result<(), BuilderError> {
    match step {
        Step::Match(node) => builder.r#match(node)?,
        Step::Create(node) => builder.create(node)?,
        Step::Connect(connection) => builder.connect(connection)?,
        Step::Where(spec) => builder.r#where(spec.into_condition(policy)?)?,
        Step::And(spec) => builder.and(spec.into_condition(policy)?)?,
        Step::Or(spec) => builder.or(spec.into_condition(policy)?)?,
        Step::Xor(spec) => builder.xor(spec.into_condition(policy)?)?,
        Step::OrderBy(OrderStep { property, order }) => builder.order_by(property, order)?,
        Step::Return(item) => builder.r#return(item)?,
        Step::Distinct => builder.distinct()?,
    };
    Ok(())
}

/// Replays every step and finalizes the statement.
pub fn run_script(script: &QueryScript, options: BuilderOptions) -> Result<Query, CliError> {
    let policy = options.collision_policy;
    let mut builder = CypherBuilder::with_options(options);
    for (index, step) in script.steps.iter().enumerate() {
        apply_step(&mut builder, step.clone(), policy).map_err(|source| CliError::Step {
            index,
            step: step.name(),
            source,
        })?;
    }
    debug!(steps = script.steps.len(), "script.replayed");
    Ok(builder.build()?)
}

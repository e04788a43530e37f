#![forbid(unsafe_code)]

use indexmap::IndexMap;
use serde::Deserialize;

use crate::query::state::BuilderState;
use crate::query::ClauseKind;
use crate::types::{BuilderError, Result};

const BUILDER: &str = "ReturnBuilder";

/// One projected value with an optional alias.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ReturnItem {
    /// `value AS alias` when an alias is given.
    Aliased {
        /// Projected expression.
        value: String,
        /// Output column name.
        #[serde(default)]
        alias: Option<String>,
    },
    /// Bare value.
    Value(String),
}

impl ReturnItem {
    /// Bare projection.
    pub fn new(value: impl Into<String>) -> Self {
        ReturnItem::Value(value.into())
    }

    /// Projection renamed to `alias`.
    pub fn aliased(value: impl Into<String>, alias: impl Into<String>) -> Self {
        ReturnItem::Aliased {
            value: value.into(),
            alias: Some(alias.into()),
        }
    }

    fn into_parts(self) -> (String, Option<String>) {
        match self {
            ReturnItem::Aliased { value, alias } => (value, alias),
            ReturnItem::Value(value) => (value, None),
        }
    }
}

impl From<&str> for ReturnItem {
    fn from(value: &str) -> Self {
        ReturnItem::new(value)
    }
}

impl From<String> for ReturnItem {
    fn from(value: String) -> Self {
        ReturnItem::new(value)
    }
}

impl From<(&str, &str)> for ReturnItem {
    fn from((value, alias): (&str, &str)) -> Self {
        ReturnItem::aliased(value, alias)
    }
}

/// RETURN clause builder.
///
/// Values are keyed: adding the same value twice keeps its first position and
/// takes the latest alias.
#[derive(Clone, Debug, Default)]
pub struct ReturnBuilder {
    state: BuilderState,
    distinct: bool,
    values: IndexMap<String, Option<String>>,
    text: String,
}

impl ReturnBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates a projected value.
    pub fn add_value(&mut self, item: impl Into<ReturnItem>) -> Result<&mut Self> {
        self.state.ensure_open(BUILDER)?;
        let (value, alias) = item.into().into_parts();
        self.values.insert(value, alias);
        self.state = BuilderState::Initialized;
        Ok(self)
    }

    /// Marks the projection `DISTINCT`. Only valid once.
    pub fn distinct(&mut self) -> Result<&mut Self> {
        self.state.ensure_open(BUILDER)?;
        if self.distinct {
            return Err(BuilderError::DistinctTwice);
        }
        self.distinct = true;
        Ok(self)
    }

    /// Renders `RETURN [DISTINCT ]v1[ AS a1], ...` and freezes the builder.
    pub fn terminate(&mut self) -> Result<&mut Self> {
        self.state.ensure_open(BUILDER)?;
        if self.values.is_empty() {
            return Err(BuilderError::EmptyClause {
                clause: ClauseKind::Return,
            });
        }
        let items = self
            .values
            .iter()
            .map(|(value, alias)| match alias {
                Some(alias) => format!("{value} AS {alias}"),
                None => value.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let distinct = if self.distinct { "DISTINCT " } else { "" };
        self.text = format!("RETURN {distinct}{items}");
        self.state = BuilderState::Terminated;
        Ok(self)
    }

    /// Rendered text; empty until terminated.
    pub fn cypher(&self) -> &str {
        &self.text
    }

    /// Number of distinct projected values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing was added.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BuilderState {
        self.state
    }
}

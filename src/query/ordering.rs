#![forbid(unsafe_code)]

use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::query::state::BuilderState;
use crate::query::ClauseKind;
use crate::types::{BuilderError, Result};

const BUILDER: &str = "OrderByBuilder";

/// Sort direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Order {
    /// `ASC`
    #[serde(alias = "asc")]
    Asc,
    /// `DESC`
    #[serde(alias = "desc")]
    Desc,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Asc => f.write_str("ASC"),
            Order::Desc => f.write_str("DESC"),
        }
    }
}

/// ORDER BY clause builder.
///
/// Re-adding a property replaces its direction but keeps the position it was
/// first given.
#[derive(Clone, Debug, Default)]
pub struct OrderByBuilder {
    state: BuilderState,
    properties: IndexMap<String, Option<Order>>,
    text: String,
}

impl OrderByBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates a sort key.
    pub fn add_ordering(
        &mut self,
        property: impl Into<String>,
        order: Option<Order>,
    ) -> Result<&mut Self> {
        self.state.ensure_open(BUILDER)?;
        self.properties.insert(property.into(), order);
        self.state = BuilderState::Initialized;
        Ok(self)
    }

    /// Renders `ORDER BY p1[ DIR], ...` and freezes the builder.
    pub fn terminate(&mut self) -> Result<&mut Self> {
        self.state.ensure_open(BUILDER)?;
        if self.properties.is_empty() {
            return Err(BuilderError::EmptyClause {
                clause: ClauseKind::OrderBy,
            });
        }
        let keys = self
            .properties
            .iter()
            .map(|(property, order)| match order {
                Some(order) => format!("{property} {order}"),
                None => property.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        self.text = format!("ORDER BY {keys}");
        self.state = BuilderState::Terminated;
        Ok(self)
    }

    /// Rendered text; empty until terminated.
    pub fn cypher(&self) -> &str {
        &self.text
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BuilderState {
        self.state
    }
}

#![forbid(unsafe_code)]

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::error::{BuilderError, Result};
use crate::types::value::Value;

/// How a parameter table reacts when a name is bound twice.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Fail unless the new value equals the bound one.
    #[default]
    Reject,
    /// Later binding silently wins.
    Overwrite,
}

/// Insertion-ordered parameter table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    entries: IndexMap<String, Value>,
    policy: CollisionPolicy,
}

impl Params {
    /// Creates an empty table with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with an explicit collision policy.
    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self {
            entries: IndexMap::new(),
            policy,
        }
    }

    /// Returns the collision policy.
    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Binds `name` to `value` under the table's policy.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        if self.policy == CollisionPolicy::Reject {
            if let Some(existing) = self.entries.get(&name) {
                if *existing != value {
                    return Err(BuilderError::ParameterCollision { name });
                }
                return Ok(());
            }
        }
        self.entries.insert(name, value);
        Ok(())
    }

    /// Merges every entry of `other` into this table.
    ///
    /// Under [`CollisionPolicy::Reject`] the merge is all-or-nothing.
    pub fn merge(&mut self, other: &Params) -> Result<()> {
        if self.policy == CollisionPolicy::Reject {
            if let Some(name) = self.conflicting_key(other) {
                return Err(BuilderError::ParameterCollision { name });
            }
        }
        for (name, value) in &other.entries {
            self.entries.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    fn conflicting_key(&self, other: &Params) -> Option<String> {
        other
            .entries
            .iter()
            .find(|(name, value)| {
                self.entries
                    .get(name.as_str())
                    .is_some_and(|existing| existing != *value)
            })
            .map(|(name, _)| name.clone())
    }

    /// Looks up a bound value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Drops every binding, keeping the policy.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Borrows the underlying ordered map.
    pub fn as_map(&self) -> &IndexMap<String, Value> {
        &self.entries
    }

    /// Consumes the table into its ordered map.
    pub fn into_map(self) -> IndexMap<String, Value> {
        self.entries
    }
}

impl Serialize for Params {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.entries.serialize(serializer)
    }
}

/// Turns a predicate field path into a legal parameter name.
pub fn param_name(field: &str) -> String {
    field
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

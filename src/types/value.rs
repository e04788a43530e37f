//! Parameter values extracted from patterns and predicates.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Literal bound to a query parameter.
///
/// Serialized untagged so a parameter table maps onto the plain JSON object a
/// graph driver accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean literal.
    Bool(bool),
    /// Signed 64-bit integer literal.
    Int(i64),
    /// 64-bit floating point literal.
    Float(f64),
    /// UTF-8 string literal.
    String(String),
    /// List literal; may nest.
    List(Vec<Value>),
}

/// Broad value class used when validating operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueCategory {
    /// `true` / `false`.
    Boolean,
    /// Integer or float.
    Number,
    /// Text.
    String,
    /// List of values.
    List,
}

impl fmt::Display for ValueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueCategory::Boolean => "boolean",
            ValueCategory::Number => "number",
            ValueCategory::String => "string",
            ValueCategory::List => "list",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Returns the category of this value.
    pub fn category(&self) -> ValueCategory {
        match self {
            Value::Bool(_) => ValueCategory::Boolean,
            Value::Int(_) | Value::Float(_) => ValueCategory::Number,
            Value::String(_) => ValueCategory::String,
            Value::List(_) => ValueCategory::List,
        }
    }

    /// True for every non-list value.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::List(_))
    }

    /// Flattens nested lists fully; primitives become a one-element list.
    pub fn flatten(self) -> Vec<Value> {
        let mut out = Vec::new();
        flatten_into(self, &mut out);
        out
    }
}

fn flatten_into(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::List(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        primitive => out.push(primitive),
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

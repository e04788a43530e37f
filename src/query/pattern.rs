//! Rendering of node and relationship patterns.
//!
//! A [`PatternRenderer`] turns one starting node and any number of
//! `(edge, node)` hops into pattern text such as
//! `(p:Person {name: $name})-[:OWNS]->(h:House)`, extracting every field value
//! into a parameter table as it goes.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use tracing::trace;

use crate::query::state::BuilderState;
use crate::types::{BuilderError, CollisionPolicy, Params, Result, Value};

const BUILDER: &str = "PatternRenderer";

/// Value attached to a node or relationship field.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Bound under a parameter named after an explicit alias.
    Aliased {
        /// Literal value.
        value: Value,
        /// Parameter name used instead of the field key.
        alias: String,
    },
    /// Bound under a parameter named after the field key.
    Plain(Value),
}

impl FieldValue {
    fn parts<'a>(&'a self, key: &'a str) -> (&'a str, &'a Value) {
        match self {
            FieldValue::Aliased { value, alias } => (alias.as_str(), value),
            FieldValue::Plain(value) => (key, value),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Plain(value)
    }
}

macro_rules! plain_field_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::Plain(value.into())
                }
            }
        )*
    };
}

plain_field_from!(&str, String, bool, i32, i64, f64);

/// Arrow orientation of a relationship.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// `-[...]->`
    Forward,
    /// `<-[...]-`
    Backward,
    /// `-[...]-`
    #[default]
    Undirected,
}

impl Direction {
    /// Wraps rendered relationship content in this direction's arrow.
    pub fn wrap(self, content: &str) -> String {
        match self {
            Direction::Forward => format!("-{content}->"),
            Direction::Backward => format!("<-{content}-"),
            Direction::Undirected => format!("-{content}-"),
        }
    }
}

/// Description of a single node.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodePattern {
    /// Local binding name.
    pub tag: Option<String>,
    /// Labels, rendered as an alternation when more than one is given.
    #[serde(alias = "label", deserialize_with = "one_or_many")]
    pub labels: Vec<String>,
    /// Field map, rendered as parameter placeholders.
    pub fields: IndexMap<String, FieldValue>,
}

impl NodePattern {
    /// Empty node, renders as `()`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the binding tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Adds one label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Adds several labels.
    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Adds a field bound under its own key.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Adds a field bound under `alias`.
    pub fn aliased(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
        alias: impl Into<String>,
    ) -> Self {
        self.fields.insert(
            key.into(),
            FieldValue::Aliased {
                value: value.into(),
                alias: alias.into(),
            },
        );
        self
    }

    fn render(&self, params: &mut Params) -> Result<String> {
        render_element(
            ('(', ')'),
            self.tag.as_deref(),
            &self.labels,
            &self.fields,
            params,
        )
    }
}

/// Description of a single relationship.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EdgePattern {
    /// Arrow orientation; absent means undirected.
    pub direction: Option<Direction>,
    /// Local binding name.
    pub tag: Option<String>,
    /// Relationship types.
    #[serde(alias = "label", deserialize_with = "one_or_many")]
    pub labels: Vec<String>,
    /// Field map.
    pub fields: IndexMap<String, FieldValue>,
}

impl EdgePattern {
    /// Anonymous undirected relationship.
    pub fn new() -> Self {
        Self::default()
    }

    /// Anonymous relationship pointing right.
    pub fn forward() -> Self {
        Self::new().direction(Direction::Forward)
    }

    /// Anonymous relationship pointing left.
    pub fn backward() -> Self {
        Self::new().direction(Direction::Backward)
    }

    /// Sets the direction.
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Sets the binding tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Adds one relationship type.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Adds a field bound under its own key.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Adds a field bound under `alias`.
    pub fn aliased(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
        alias: impl Into<String>,
    ) -> Self {
        self.fields.insert(
            key.into(),
            FieldValue::Aliased {
                value: value.into(),
                alias: alias.into(),
            },
        );
        self
    }

    fn is_empty(&self) -> bool {
        self.tag.as_deref().unwrap_or_default().is_empty()
            && self.labels.iter().all(String::is_empty)
            && self.fields.is_empty()
    }

    fn render(&self, params: &mut Params) -> Result<String> {
        let direction = self.direction.unwrap_or_default();
        if self.is_empty() {
            return Ok(direction.wrap(""));
        }
        let content = render_element(
            ('[', ']'),
            self.tag.as_deref(),
            &self.labels,
            &self.fields,
            params,
        )?;
        Ok(direction.wrap(&content))
    }
}

/// One hop appended to a pattern. Missing parts render as `--` and `()`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Connection {
    /// Relationship leading to the node.
    pub edge: Option<EdgePattern>,
    /// Node reached by the hop.
    pub node: Option<NodePattern>,
}

impl Connection {
    /// Anonymous hop, renders as `--()`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relationship.
    pub fn edge(mut self, edge: EdgePattern) -> Self {
        self.edge = Some(edge);
        self
    }

    /// Sets the target node.
    pub fn node(mut self, node: NodePattern) -> Self {
        self.node = Some(node);
        self
    }
}

fn render_element(
    (open, close): (char, char),
    tag: Option<&str>,
    labels: &[String],
    fields: &IndexMap<String, FieldValue>,
    params: &mut Params,
) -> Result<String> {
    let mut out = String::new();
    out.push(open);
    out.push_str(tag.unwrap_or_default());
    let labels: Vec<&str> = labels
        .iter()
        .map(String::as_str)
        .filter(|label| !label.is_empty())
        .collect();
    if !labels.is_empty() {
        out.push(':');
        out.push_str(&labels.join("|"));
    }
    if !fields.is_empty() {
        if out.len() > 1 {
            out.push(' ');
        }
        out.push('{');
        for (idx, (key, field)) in fields.iter().enumerate() {
            let (name, value) = field.parts(key);
            params.bind(name, value.clone())?;
            if idx > 0 {
                out.push_str(", ");
            }
            out.push_str(key);
            out.push_str(": $");
            out.push_str(name);
        }
        out.push('}');
    }
    out.push(close);
    Ok(out)
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let labels = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(label) => vec![label],
        OneOrMany::Many(labels) => labels,
    };
    Ok(labels
        .into_iter()
        .filter(|label| !label.is_empty())
        .collect())
}

/// Incrementally renders one connected pattern.
#[derive(Clone, Debug, Default)]
pub struct PatternRenderer {
    state: BuilderState,
    text: String,
    params: Params,
    hops: usize,
}

impl PatternRenderer {
    /// Creates an uninitialized renderer rejecting parameter collisions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an uninitialized renderer with an explicit collision policy.
    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self {
            params: Params::with_policy(policy),
            ..Self::default()
        }
    }

    /// Renders the starting node. Only valid once.
    pub fn initialize(&mut self, node: impl Into<Option<NodePattern>>) -> Result<&mut Self> {
        if self.state != BuilderState::Uninitialized {
            return Err(BuilderError::AlreadyInitialized { builder: BUILDER });
        }
        let mut scratch = Params::with_policy(self.params.policy());
        self.text = match node.into() {
            Some(node) => node.render(&mut scratch)?,
            None => "()".to_owned(),
        };
        self.params.merge(&scratch)?;
        self.state = BuilderState::Initialized;
        Ok(self)
    }

    /// Appends an `(edge, node)` hop.
    pub fn connect(&mut self, connection: Connection) -> Result<&mut Self> {
        self.state.ensure_initialized(BUILDER, "connect")?;
        let mut scratch = Params::with_policy(self.params.policy());
        let edge = match &connection.edge {
            Some(edge) => edge.render(&mut scratch)?,
            None => "--".to_owned(),
        };
        let node = match &connection.node {
            Some(node) => node.render(&mut scratch)?,
            None => "()".to_owned(),
        };
        self.params.merge(&scratch)?;
        self.text.push_str(&edge);
        self.text.push_str(&node);
        self.hops += 1;
        trace!(hops = self.hops, params = self.params.len(), "pattern.connect");
        Ok(self)
    }

    /// Freezes the pattern.
    pub fn terminate(&mut self) -> Result<&mut Self> {
        self.state.ensure_initialized(BUILDER, "terminate")?;
        self.state = BuilderState::Terminated;
        Ok(self)
    }

    /// Returns to the uninitialized state, keeping the collision policy.
    pub fn reset(&mut self) {
        self.state = BuilderState::Uninitialized;
        self.text.clear();
        self.params.clear();
        self.hops = 0;
    }

    /// Pattern text rendered so far.
    pub fn cypher(&self) -> &str {
        &self.text
    }

    /// Parameters extracted so far.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// True once [`terminate`](Self::terminate) succeeded.
    pub fn is_terminated(&self) -> bool {
        self.state.is_terminated()
    }
}

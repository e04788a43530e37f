//! WHERE expression construction.
//!
//! A [`PredicateBuilder`] accepts one `where` condition followed by any number
//! of `and` / `or` / `xor` conditions and folds them left to right into a
//! single expression; nothing is re-associated. Conditions are raw text,
//! raw text with parameters, validated leaf comparisons, or another
//! predicate builder rendered as a parenthesized group.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::trace;

use crate::query::state::BuilderState;
use crate::types::{
    param_name, BuilderError, CollisionPolicy, Params, Result, Value, ValueCategory,
};

const BUILDER: &str = "PredicateBuilder";
const WHERE_PREFIX: &str = "WHERE ";

/// Comparison operators accepted in leaf predicates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Operator {
    /// `=`; strings, numbers and booleans.
    Equals,
    /// `IS NULL`; no value.
    IsNull,
    /// `IS NOT NULL`; no value.
    IsNotNull,
    /// `>`; numbers.
    GreaterThan,
    /// `<`; numbers.
    LowerThan,
    /// `>=`; numbers.
    GreaterOrEqual,
    /// `<=`; numbers.
    LowerOrEqual,
    /// `STARTS WITH`; strings.
    StartsWith,
    /// `ENDS WITH`; strings.
    EndsWith,
    /// `CONTAINS`; strings.
    Contains,
    /// `=~`; regular expression string.
    Matches,
    /// `IN`; list.
    In,
}

/// Value-compatibility class of an operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperatorClass {
    /// Takes no value.
    NullCheck,
    /// Number only.
    Numeric,
    /// String only.
    Text,
    /// List only.
    Membership,
    /// Any primitive.
    Equality,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Operator; 12] = [
        Operator::Equals,
        Operator::IsNull,
        Operator::IsNotNull,
        Operator::GreaterThan,
        Operator::LowerThan,
        Operator::GreaterOrEqual,
        Operator::LowerOrEqual,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::Contains,
        Operator::Matches,
        Operator::In,
    ];

    /// Cypher spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::GreaterThan => ">",
            Operator::LowerThan => "<",
            Operator::GreaterOrEqual => ">=",
            Operator::LowerOrEqual => "<=",
            Operator::StartsWith => "STARTS WITH",
            Operator::EndsWith => "ENDS WITH",
            Operator::Contains => "CONTAINS",
            Operator::Matches => "=~",
            Operator::In => "IN",
        }
    }

    /// Value-compatibility class.
    pub fn class(self) -> OperatorClass {
        match self {
            Operator::IsNull | Operator::IsNotNull => OperatorClass::NullCheck,
            Operator::GreaterThan
            | Operator::LowerThan
            | Operator::GreaterOrEqual
            | Operator::LowerOrEqual => OperatorClass::Numeric,
            Operator::StartsWith | Operator::EndsWith | Operator::Contains | Operator::Matches => {
                OperatorClass::Text
            }
            Operator::In => OperatorClass::Membership,
            Operator::Equals => OperatorClass::Equality,
        }
    }

    /// Checks `value` against this operator's class.
    pub fn validate(self, field: &str, value: Option<&Value>) -> Result<()> {
        let mismatch = |expected: &'static str| BuilderError::OperatorValueMismatch {
            operator: self.symbol(),
            field: field.to_owned(),
            expected,
            found: value.map(Value::category),
        };
        match (self.class(), value) {
            (OperatorClass::NullCheck, None) => Ok(()),
            (OperatorClass::NullCheck, Some(_)) => Err(BuilderError::UnexpectedValue {
                operator: self.symbol(),
                field: field.to_owned(),
            }),
            (OperatorClass::Numeric, Some(Value::Float(f))) if f.is_nan() => {
                Err(BuilderError::NotANumber {
                    operator: self.symbol(),
                    field: field.to_owned(),
                })
            }
            (OperatorClass::Numeric, Some(v)) if v.category() == ValueCategory::Number => Ok(()),
            (OperatorClass::Numeric, _) => Err(mismatch("numbers")),
            (OperatorClass::Text, Some(Value::String(_))) => Ok(()),
            (OperatorClass::Text, _) => Err(mismatch("strings")),
            (OperatorClass::Membership, Some(Value::List(_))) => Ok(()),
            (OperatorClass::Membership, _) => Err(mismatch("a list")),
            (OperatorClass::Equality, Some(v)) if v.is_primitive() => Ok(()),
            (OperatorClass::Equality, _) => Err(mismatch("numbers, strings, or booleans")),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = BuilderError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        Operator::ALL
            .into_iter()
            .find(|op| op.symbol().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| BuilderError::InvalidOperator {
                operator: s.to_owned(),
            })
    }
}

impl TryFrom<String> for Operator {
    type Error = BuilderError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Leaf comparison `field OP value`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Predicate {
    /// Property path, e.g. `p.age`.
    pub field: String,
    /// Comparison operator.
    pub operator: Operator,
    /// Compared value; absent for null checks.
    #[serde(default)]
    pub value: Option<Value>,
    /// Prefix the comparison with `NOT`.
    #[serde(default, alias = "not")]
    pub negate: bool,
    /// Parameter name override.
    #[serde(default)]
    pub alias: Option<String>,
}

impl Predicate {
    /// Leaf without a value.
    pub fn new(field: impl Into<String>, operator: Operator) -> Self {
        Self {
            field: field.into(),
            operator,
            value: None,
            negate: false,
            alias: None,
        }
    }

    /// Leaf comparing against `value`.
    pub fn compare(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self::new(field, operator).value(value)
    }

    /// `field = value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Operator::Equals, value)
    }

    /// `field > value`
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Operator::GreaterThan, value)
    }

    /// `field >= value`
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Operator::GreaterOrEqual, value)
    }

    /// `field < value`
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Operator::LowerThan, value)
    }

    /// `field <= value`
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Operator::LowerOrEqual, value)
    }

    /// `field IS NULL`
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, Operator::IsNull)
    }

    /// `field IS NOT NULL`
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::new(field, Operator::IsNotNull)
    }

    /// `field STARTS WITH value`
    pub fn starts_with(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Operator::StartsWith, value)
    }

    /// `field ENDS WITH value`
    pub fn ends_with(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Operator::EndsWith, value)
    }

    /// `field CONTAINS value`
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Operator::Contains, value)
    }

    /// `field =~ pattern`
    pub fn matches(field: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::compare(field, Operator::Matches, pattern)
    }

    /// `field IN [values]`
    pub fn in_list<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();
        Self::compare(field, Operator::In, Value::List(values))
    }

    /// Sets the compared value.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Negates the comparison.
    pub fn negate(mut self) -> Self {
        self.negate = true;
        self
    }

    /// Binds the value under `alias` instead of the field name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Parameter name the value is bound to.
    pub fn param(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => param_name(&self.field),
        }
    }

    fn render(&self, params: &mut Params) -> Result<String> {
        self.operator.validate(&self.field, self.value.as_ref())?;
        let mut expr = format!("{} {}", self.field, self.operator.symbol());
        if let Some(value) = &self.value {
            let name = self.param();
            let bound = match self.operator.class() {
                OperatorClass::Membership => Value::List(value.clone().flatten()),
                _ => value.clone(),
            };
            params.bind(name.as_str(), bound)?;
            expr.push_str(" $");
            expr.push_str(&name);
        }
        if self.negate {
            expr.insert_str(0, "NOT ");
        }
        Ok(expr)
    }
}

/// Pre-rendered expression carrying its own parameters.
///
/// The text is inserted verbatim; callers are responsible for its safety.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawExpression {
    /// Expression text, e.g. `p.age > $min_age`.
    pub expression: String,
    /// Parameters referenced by the text.
    #[serde(default)]
    pub params: IndexMap<String, Value>,
}

impl RawExpression {
    /// Expression with no parameters.
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            params: IndexMap::new(),
        }
    }

    /// Adds a parameter referenced by the expression.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// Anything accepted by `where` / `and` / `or` / `xor`.
#[derive(Clone, Debug)]
pub enum Condition {
    /// Trusted raw text, inserted verbatim and never validated.
    Raw(String),
    /// Raw text plus parameters.
    Expression(RawExpression),
    /// Validated leaf comparison.
    Leaf(Predicate),
    /// Nested expression, rendered in parentheses.
    ///
    /// Collisions inside the group are resolved by the group's own policy when
    /// its conditions are added; the enclosing builder's policy only governs
    /// the merge of the group's table. Build groups with
    /// [`CypherBuilder::group`](crate::query::CypherBuilder::group) or
    /// [`PredicateBuilder::group`] to share the policy.
    Group(PredicateBuilder),
}

impl From<&str> for Condition {
    fn from(value: &str) -> Self {
        Condition::Raw(value.to_owned())
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        Condition::Raw(value)
    }
}

impl From<RawExpression> for Condition {
    fn from(value: RawExpression) -> Self {
        Condition::Expression(value)
    }
}

impl From<Predicate> for Condition {
    fn from(value: Predicate) -> Self {
        Condition::Leaf(value)
    }
}

impl From<PredicateBuilder> for Condition {
    fn from(value: PredicateBuilder) -> Self {
        Condition::Group(value)
    }
}

impl Condition {
    fn render(&self, params: &mut Params) -> Result<String> {
        match self {
            Condition::Raw(text) => Ok(text.clone()),
            Condition::Expression(raw) => {
                for (name, value) in &raw.params {
                    params.bind(name.as_str(), value.clone())?;
                }
                Ok(raw.expression.clone())
            }
            Condition::Leaf(predicate) => predicate.render(params),
            Condition::Group(group) => {
                if group.state == BuilderState::Uninitialized {
                    return Err(BuilderError::EmptyPredicateGroup);
                }
                params.merge(&group.params)?;
                Ok(format!("({})", group.expression()))
            }
        }
    }
}

/// Logical connective joining two conditions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Connective {
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `XOR`
    Xor,
}

impl Connective {
    /// Cypher keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
            Connective::Xor => "XOR",
        }
    }

    fn method(self) -> &'static str {
        match self {
            Connective::And => "and",
            Connective::Or => "or",
            Connective::Xor => "xor",
        }
    }
}

/// Builder for one WHERE expression tree.
#[derive(Clone, Debug, Default)]
pub struct PredicateBuilder {
    state: BuilderState,
    text: String,
    prefix_len: usize,
    params: Params,
}

impl PredicateBuilder {
    /// Empty builder rejecting parameter collisions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty builder with an explicit collision policy.
    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self {
            params: Params::with_policy(policy),
            ..Self::default()
        }
    }

    /// Empty group sharing this builder's collision policy.
    pub fn group(&self) -> PredicateBuilder {
        PredicateBuilder::with_policy(self.params.policy())
    }

    /// Sets the first condition. Only valid once.
    pub fn r#where(&mut self, condition: impl Into<Condition>) -> Result<&mut Self> {
        self.state.ensure_open(BUILDER)?;
        if self.state == BuilderState::Initialized {
            return Err(BuilderError::WhereOnce);
        }
        let mut scratch = Params::with_policy(self.params.policy());
        let expr = condition.into().render(&mut scratch)?;
        self.params.merge(&scratch)?;
        self.text = expr;
        self.state = BuilderState::Initialized;
        Ok(self)
    }

    /// Appends `AND condition`.
    pub fn and(&mut self, condition: impl Into<Condition>) -> Result<&mut Self> {
        self.append(Connective::And, condition.into())
    }

    /// Appends `OR condition`.
    pub fn or(&mut self, condition: impl Into<Condition>) -> Result<&mut Self> {
        self.append(Connective::Or, condition.into())
    }

    /// Appends `XOR condition`.
    pub fn xor(&mut self, condition: impl Into<Condition>) -> Result<&mut Self> {
        self.append(Connective::Xor, condition.into())
    }

    /// Appends a condition under an explicit connective.
    pub fn append(&mut self, connective: Connective, condition: Condition) -> Result<&mut Self> {
        self.state.ensure_open(BUILDER)?;
        if self.state == BuilderState::Uninitialized {
            return Err(BuilderError::MissingWhere {
                connective: connective.method(),
            });
        }
        let mut scratch = Params::with_policy(self.params.policy());
        let expr = condition.render(&mut scratch)?;
        self.params.merge(&scratch)?;
        self.text.push(' ');
        self.text.push_str(connective.keyword());
        self.text.push(' ');
        self.text.push_str(&expr);
        trace!(
            connective = connective.keyword(),
            params = self.params.len(),
            "where.append"
        );
        Ok(self)
    }

    /// Prefixes `WHERE` and freezes the builder.
    pub fn terminate(&mut self) -> Result<&mut Self> {
        self.state.ensure_initialized(BUILDER, "terminate")?;
        self.text.insert_str(0, WHERE_PREFIX);
        self.prefix_len = WHERE_PREFIX.len();
        self.state = BuilderState::Terminated;
        Ok(self)
    }

    /// Expression without the `WHERE` keyword.
    pub fn expression(&self) -> &str {
        &self.text[self.prefix_len..]
    }

    /// Rendered text; carries `WHERE` once terminated.
    pub fn cypher(&self) -> &str {
        &self.text
    }

    /// Parameters bound by every condition.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BuilderState {
        self.state
    }
}

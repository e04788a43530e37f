//! Fluent statement builder sequencing the clause sub-builders.
//!
//! [`CypherBuilder`] keeps at most one clause open at a time. A call aimed at
//! the open clause is forwarded to it; a call aimed at any other clause first
//! flushes the open one (terminates it, appends its text to the fragment list
//! and merges its parameters into the statement table) and then opens a fresh
//! sub-builder taken from a static registry.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::query::clause::{PatternClause, PatternClauseKind};
use crate::query::ordering::{Order, OrderByBuilder};
use crate::query::pattern::{Connection, NodePattern, PatternRenderer};
use crate::query::predicate::{Condition, Connective, PredicateBuilder};
use crate::query::projection::{ReturnBuilder, ReturnItem};
use crate::query::state::BuilderState;
use crate::types::{BuilderError, CollisionPolicy, Params, Result};

/// Top-level statement clauses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    /// `MATCH`
    Match,
    /// `CREATE`
    Create,
    /// `WHERE`
    Where,
    /// `ORDER BY`
    OrderBy,
    /// `RETURN`
    Return,
}

impl ClauseKind {
    const COUNT: usize = 5;

    fn index(self) -> usize {
        match self {
            ClauseKind::Match => 0,
            ClauseKind::Create => 1,
            ClauseKind::Where => 2,
            ClauseKind::OrderBy => 3,
            ClauseKind::Return => 4,
        }
    }

    /// Cypher keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            ClauseKind::Match => "MATCH",
            ClauseKind::Create => "CREATE",
            ClauseKind::Where => "WHERE",
            ClauseKind::OrderBy => "ORDER BY",
            ClauseKind::Return => "RETURN",
        }
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Tunables for [`CypherBuilder`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderOptions {
    /// How same-named parameters from different fragments are reconciled.
    pub collision_policy: CollisionPolicy,
}

impl BuilderOptions {
    /// Overrides the collision policy.
    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }
}

/// Finished statement text plus its parameter table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Query {
    /// Statement text, clauses separated by newlines.
    pub text: String,
    /// Parameters referenced by the text.
    pub params: Params,
}

/// MATCH/CREATE clause together with the pattern currently being filled.
#[derive(Clone, Debug)]
struct PatternSession {
    clause: PatternClause,
    current: PatternRenderer,
}

impl PatternSession {
    fn new(kind: PatternClauseKind, policy: CollisionPolicy) -> Self {
        Self {
            clause: PatternClause::new(kind, policy),
            current: PatternRenderer::with_policy(policy),
        }
    }

    /// Starts a new pattern, moving the current one into the clause.
    ///
    /// Works on copies and commits only on success.
    fn begin(&mut self, node: Option<NodePattern>) -> Result<()> {
        let mut clause = self.clause.clone();
        let mut current = self.current.clone();
        if current.state() != BuilderState::Uninitialized {
            if clause.kind() == PatternClauseKind::Create {
                return Err(BuilderError::CreateOnce);
            }
            current.terminate()?;
            clause.add_pattern(&current)?;
            current.reset();
        }
        current.initialize(node)?;
        self.clause = clause;
        self.current = current;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.current.terminate()?;
        self.clause.add_pattern(&self.current)?;
        self.clause.terminate()?;
        Ok(())
    }
}

/// The clause currently open in a [`CypherBuilder`].
#[derive(Clone, Debug)]
enum ActiveClause {
    Match(PatternSession),
    Create(PatternSession),
    Where(PredicateBuilder),
    OrderBy(OrderByBuilder),
    Return(ReturnBuilder),
}

type ClauseFactory = fn(&BuilderOptions) -> ActiveClause;

fn new_match(options: &BuilderOptions) -> ActiveClause {
    ActiveClause::Match(PatternSession::new(
        PatternClauseKind::Match,
        options.collision_policy,
    ))
}

fn new_create(options: &BuilderOptions) -> ActiveClause {
    ActiveClause::Create(PatternSession::new(
        PatternClauseKind::Create,
        options.collision_policy,
    ))
}

fn new_where(options: &BuilderOptions) -> ActiveClause {
    ActiveClause::Where(PredicateBuilder::with_policy(options.collision_policy))
}

fn new_order_by(_: &BuilderOptions) -> ActiveClause {
    ActiveClause::OrderBy(OrderByBuilder::new())
}

fn new_return(_: &BuilderOptions) -> ActiveClause {
    ActiveClause::Return(ReturnBuilder::new())
}

/// Constructors indexed by [`ClauseKind::index`].
const CLAUSE_REGISTRY: [ClauseFactory; ClauseKind::COUNT] =
    [new_match, new_create, new_where, new_order_by, new_return];

fn instantiate(kind: ClauseKind, options: &BuilderOptions) -> ActiveClause {
    CLAUSE_REGISTRY[kind.index()](options)
}

/// What an incoming call does to the open clause.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Transition {
    /// Same clause: hand the call to the open sub-builder.
    Forward,
    /// Different clause (or none open): flush, then open the target.
    Flush,
}

fn transition(active: Option<ClauseKind>, target: ClauseKind) -> Transition {
    match active {
        Some(kind) if kind == target => Transition::Forward,
        _ => Transition::Flush,
    }
}

impl ActiveClause {
    fn kind(&self) -> ClauseKind {
        match self {
            ActiveClause::Match(_) => ClauseKind::Match,
            ActiveClause::Create(_) => ClauseKind::Create,
            ActiveClause::Where(_) => ClauseKind::Where,
            ActiveClause::OrderBy(_) => ClauseKind::OrderBy,
            ActiveClause::Return(_) => ClauseKind::Return,
        }
    }

    fn mismatch(&self, operation: &'static str, required: &'static str) -> BuilderError {
        BuilderError::precondition(operation, required, Some(self.kind()))
    }

    fn begin_pattern(&mut self, node: Option<NodePattern>) -> Result<()> {
        match self {
            ActiveClause::Match(session) | ActiveClause::Create(session) => session.begin(node),
            other => Err(other.mismatch("match", "MATCH or CREATE")),
        }
    }

    fn connect(&mut self, connection: Connection) -> Result<()> {
        match self {
            ActiveClause::Match(session) | ActiveClause::Create(session) => {
                session.current.connect(connection)?;
                Ok(())
            }
            other => Err(other.mismatch("connect", "MATCH or CREATE")),
        }
    }

    fn condition(&mut self, connective: Option<Connective>, condition: Condition) -> Result<()> {
        match (self, connective) {
            (ActiveClause::Where(builder), None) => builder.r#where(condition).map(|_| ()),
            (ActiveClause::Where(builder), Some(connective)) => {
                builder.append(connective, condition).map(|_| ())
            }
            (other, _) => Err(other.mismatch("where", "WHERE")),
        }
    }

    fn order(&mut self, property: String, order: Option<Order>) -> Result<()> {
        match self {
            ActiveClause::OrderBy(builder) => builder.add_ordering(property, order).map(|_| ()),
            other => Err(other.mismatch("order_by", "ORDER BY")),
        }
    }

    fn project(&mut self, item: ReturnItem) -> Result<()> {
        match self {
            ActiveClause::Return(builder) => builder.add_value(item).map(|_| ()),
            other => Err(other.mismatch("return", "RETURN")),
        }
    }

    fn distinct(&mut self) -> Result<()> {
        match self {
            ActiveClause::Return(builder) => builder.distinct().map(|_| ()),
            other => Err(other.mismatch("distinct", "RETURN")),
        }
    }

    fn terminate(&mut self) -> Result<()> {
        match self {
            ActiveClause::Match(session) | ActiveClause::Create(session) => session.finish(),
            ActiveClause::Where(builder) => builder.terminate().map(|_| ()),
            ActiveClause::OrderBy(builder) => builder.terminate().map(|_| ()),
            ActiveClause::Return(builder) => builder.terminate().map(|_| ()),
        }
    }

    fn cypher(&self) -> &str {
        match self {
            ActiveClause::Match(session) | ActiveClause::Create(session) => session.clause.cypher(),
            ActiveClause::Where(builder) => builder.cypher(),
            ActiveClause::OrderBy(builder) => builder.cypher(),
            ActiveClause::Return(builder) => builder.cypher(),
        }
    }

    fn params(&self) -> Option<&Params> {
        match self {
            ActiveClause::Match(session) | ActiveClause::Create(session) => {
                Some(session.clause.params())
            }
            ActiveClause::Where(builder) => Some(builder.params()),
            ActiveClause::OrderBy(_) | ActiveClause::Return(_) => None,
        }
    }
}

/// Fluent builder producing a parameterized Cypher statement.
///
/// ```
/// use cypher_builder::query::{CypherBuilder, Connection, EdgePattern, NodePattern, Predicate};
///
/// let mut builder = CypherBuilder::new();
/// builder
///     .r#match(NodePattern::new().tag("p").label("Person"))?
///     .connect(
///         Connection::new()
///             .edge(EdgePattern::forward().label("OWNS"))
///             .node(NodePattern::new().tag("h").label("House")),
///     )?
///     .r#where(Predicate::gt("p.age", 30))?
///     .r#return("h")?
///     .done()?;
/// assert_eq!(
///     builder.cypher(),
///     "MATCH (p:Person)-[:OWNS]->(h:House)\nWHERE p.age > $p_age\nRETURN h;"
/// );
/// # Ok::<(), cypher_builder::types::BuilderError>(())
/// ```
#[derive(Clone, Debug)]
pub struct CypherBuilder {
    options: BuilderOptions,
    fragments: Vec<String>,
    params: Params,
    active: Option<ActiveClause>,
    finalized: bool,
}

impl Default for CypherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CypherBuilder {
    /// Creates an empty builder with default options.
    pub fn new() -> Self {
        Self::with_options(BuilderOptions::default())
    }

    /// Creates an empty builder with explicit options.
    pub fn with_options(options: BuilderOptions) -> Self {
        Self {
            params: Params::with_policy(options.collision_policy),
            options,
            fragments: Vec::new(),
            active: None,
            finalized: false,
        }
    }

    /// Options this builder was created with.
    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Starts a MATCH pattern; repeated calls add comma-separated patterns.
    pub fn r#match(&mut self, node: impl Into<Option<NodePattern>>) -> Result<&mut Self> {
        let node = node.into();
        self.dispatch(ClauseKind::Match, |active| active.begin_pattern(node))
    }

    /// Starts the single CREATE pattern.
    pub fn create(&mut self, node: impl Into<Option<NodePattern>>) -> Result<&mut Self> {
        let node = node.into();
        self.dispatch(ClauseKind::Create, |active| active.begin_pattern(node))
    }

    /// Extends the open MATCH or CREATE pattern by one hop.
    pub fn connect(&mut self, connection: Connection) -> Result<&mut Self> {
        self.forward(
            "connect",
            &[ClauseKind::Match, ClauseKind::Create],
            "MATCH or CREATE",
            |active| active.connect(connection),
        )
    }

    /// Opens a WHERE clause with its first condition.
    pub fn r#where(&mut self, condition: impl Into<Condition>) -> Result<&mut Self> {
        let condition = condition.into();
        self.dispatch(ClauseKind::Where, |active| {
            active.condition(None, condition)
        })
    }

    /// Appends `AND condition` to the open WHERE clause.
    pub fn and(&mut self, condition: impl Into<Condition>) -> Result<&mut Self> {
        self.connective("and", Connective::And, condition.into())
    }

    /// Appends `OR condition` to the open WHERE clause.
    pub fn or(&mut self, condition: impl Into<Condition>) -> Result<&mut Self> {
        self.connective("or", Connective::Or, condition.into())
    }

    /// Appends `XOR condition` to the open WHERE clause.
    pub fn xor(&mut self, condition: impl Into<Condition>) -> Result<&mut Self> {
        self.connective("xor", Connective::Xor, condition.into())
    }

    /// Adds a sort key, opening ORDER BY if needed.
    pub fn order_by(
        &mut self,
        property: impl Into<String>,
        order: impl Into<Option<Order>>,
    ) -> Result<&mut Self> {
        let property = property.into();
        let order = order.into();
        self.dispatch(ClauseKind::OrderBy, |active| active.order(property, order))
    }

    /// Adds a projected value, opening RETURN if needed.
    pub fn r#return(&mut self, item: impl Into<ReturnItem>) -> Result<&mut Self> {
        let item = item.into();
        self.dispatch(ClauseKind::Return, |active| active.project(item))
    }

    /// Marks the open RETURN clause `DISTINCT`.
    pub fn distinct(&mut self) -> Result<&mut Self> {
        self.forward("distinct", &[ClauseKind::Return], "RETURN", |active| {
            active.distinct()
        })
    }

    /// Flushes the open clause and terminates the statement with `;`.
    pub fn done(&mut self) -> Result<&mut Self> {
        self.ensure_mutable()?;
        self.flush()?;
        let last = self
            .fragments
            .last_mut()
            .ok_or(BuilderError::EmptyStatement)?;
        last.push(';');
        self.finalized = true;
        debug!(
            fragments = self.fragments.len(),
            params = self.params.len(),
            "cypher.done"
        );
        Ok(self)
    }

    /// Finalizes if needed and returns the statement.
    pub fn build(mut self) -> Result<Query> {
        if !self.finalized {
            self.done()?;
        }
        Ok(Query {
            text: self.cypher(),
            params: self.params,
        })
    }

    /// Snapshot of the flushed text and parameters.
    pub fn query(&self) -> Query {
        Query {
            text: self.cypher(),
            params: self.params.clone(),
        }
    }

    /// Flushed fragments joined by newlines.
    pub fn cypher(&self) -> String {
        self.fragments.join("\n")
    }

    /// Parameters merged from every flushed fragment.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Empty predicate group sharing this builder's collision policy.
    ///
    /// Pass the filled group to `where`/`and`/`or`/`xor` to render it in
    /// parentheses.
    pub fn group(&self) -> PredicateBuilder {
        PredicateBuilder::with_policy(self.options.collision_policy)
    }

    /// Clause currently open, if any.
    pub fn active_clause(&self) -> Option<ClauseKind> {
        self.active.as_ref().map(ActiveClause::kind)
    }

    /// True after a successful [`done`](Self::done).
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.finalized {
            return Err(BuilderError::Finalized);
        }
        Ok(())
    }

    fn connective(
        &mut self,
        operation: &'static str,
        connective: Connective,
        condition: Condition,
    ) -> Result<&mut Self> {
        self.forward(operation, &[ClauseKind::Where], "WHERE", |active| {
            active.condition(Some(connective), condition)
        })
    }

    /// Routes a clause-opening call: forward to the open clause when it
    /// matches `target`, otherwise fill a fresh sub-builder and flush.
    fn dispatch<F>(&mut self, target: ClauseKind, apply: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut ActiveClause) -> Result<()>,
    {
        self.ensure_mutable()?;
        match (transition(self.active_clause(), target), self.active.as_mut()) {
            (Transition::Forward, Some(active)) => apply(active)?,
            _ => {
                let mut fresh = instantiate(target, &self.options);
                apply(&mut fresh)?;
                self.flush()?;
                self.active = Some(fresh);
            }
        }
        Ok(self)
    }

    /// Routes a combinator that only applies to an already open clause.
    fn forward<F>(
        &mut self,
        operation: &'static str,
        allowed: &[ClauseKind],
        required: &'static str,
        apply: F,
    ) -> Result<&mut Self>
    where
        F: FnOnce(&mut ActiveClause) -> Result<()>,
    {
        self.ensure_mutable()?;
        let active_kind = self.active_clause();
        let active = match self.active.as_mut() {
            Some(active) if allowed.contains(&active.kind()) => active,
            _ => return Err(BuilderError::precondition(operation, required, active_kind)),
        };
        apply(active)?;
        Ok(self)
    }

    /// Terminates the open clause and folds it into the statement.
    ///
    /// A copy of the clause is terminated and merged; on failure the builder
    /// is untouched, so retrying returns the same error.
    fn flush(&mut self) -> Result<()> {
        let Some(active) = self.active.as_ref() else {
            return Ok(());
        };
        let mut closed = active.clone();
        closed.terminate()?;
        if let Some(params) = closed.params() {
            self.params.merge(params)?;
        }
        self.fragments.push(closed.cypher().to_owned());
        self.active = None;
        debug!(
            clause = %closed.kind(),
            fragments = self.fragments.len(),
            params = self.params.len(),
            "cypher.flush"
        );
        Ok(())
    }
}

#![forbid(unsafe_code)]

use crate::query::pattern::PatternRenderer;
use crate::query::state::BuilderState;
use crate::query::ClauseKind;
use crate::types::{BuilderError, CollisionPolicy, Params, Result};

/// Keyword a [`PatternClause`] renders with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PatternClauseKind {
    /// `MATCH`, any number of comma-separated patterns.
    Match,
    /// `CREATE`, exactly one pattern.
    Create,
}

impl PatternClauseKind {
    fn keyword(self) -> &'static str {
        match self {
            PatternClauseKind::Match => "MATCH",
            PatternClauseKind::Create => "CREATE",
        }
    }

    fn builder_name(self) -> &'static str {
        match self {
            PatternClauseKind::Match => "MatchClause",
            PatternClauseKind::Create => "CreateClause",
        }
    }

    /// Orchestrator clause this keyword belongs to.
    pub fn clause(self) -> ClauseKind {
        match self {
            PatternClauseKind::Match => ClauseKind::Match,
            PatternClauseKind::Create => ClauseKind::Create,
        }
    }
}

/// MATCH / CREATE clause wrapping terminated patterns.
#[derive(Clone, Debug)]
pub struct PatternClause {
    kind: PatternClauseKind,
    state: BuilderState,
    text: String,
    params: Params,
}

impl PatternClause {
    /// Empty MATCH clause.
    pub fn matching() -> Self {
        Self::new(PatternClauseKind::Match, CollisionPolicy::default())
    }

    /// Empty CREATE clause.
    pub fn creating() -> Self {
        Self::new(PatternClauseKind::Create, CollisionPolicy::default())
    }

    /// Empty clause of the given kind.
    pub fn new(kind: PatternClauseKind, policy: CollisionPolicy) -> Self {
        Self {
            kind,
            state: BuilderState::Uninitialized,
            text: String::new(),
            params: Params::with_policy(policy),
        }
    }

    /// Adds a terminated pattern; later patterns are separated by `,\n`.
    pub fn add_pattern(&mut self, renderer: &PatternRenderer) -> Result<&mut Self> {
        if !renderer.is_terminated() {
            return Err(BuilderError::PatternNotTerminated {
                clause: self.kind.clause(),
            });
        }
        self.state.ensure_open(self.kind.builder_name())?;
        match self.state {
            BuilderState::Uninitialized => {
                self.params.merge(renderer.params())?;
                self.text = renderer.cypher().to_owned();
                self.state = BuilderState::Initialized;
            }
            _ if self.kind == PatternClauseKind::Create => return Err(BuilderError::CreateOnce),
            _ => {
                self.params.merge(renderer.params())?;
                self.text.push_str(",\n");
                self.text.push_str(renderer.cypher());
            }
        }
        Ok(self)
    }

    /// Prefixes the keyword and freezes the clause.
    pub fn terminate(&mut self) -> Result<&mut Self> {
        self.state
            .ensure_initialized(self.kind.builder_name(), "terminate")?;
        self.text = format!("{} {}", self.kind.keyword(), self.text);
        self.state = BuilderState::Terminated;
        Ok(self)
    }

    /// Which keyword this clause renders.
    pub fn kind(&self) -> PatternClauseKind {
        self.kind
    }

    /// Accumulated text; carries the keyword once terminated.
    pub fn cypher(&self) -> &str {
        &self.text
    }

    /// Parameters of every added pattern.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BuilderState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::pattern::{Connection, EdgePattern, NodePattern};

    fn terminated(node: NodePattern) -> PatternRenderer {
        let mut renderer = PatternRenderer::new();
        renderer.initialize(node).unwrap().terminate().unwrap();
        renderer
    }

    #[test]
    fn match_joins_patterns_with_comma_newline() {
        let mut first = PatternRenderer::new();
        first
            .initialize(NodePattern::new().tag("p").label("Person"))
            .unwrap()
            .connect(
                Connection::new()
                    .edge(EdgePattern::forward().label("OWNS"))
                    .node(NodePattern::new().tag("h").label("House")),
            )
            .unwrap()
            .terminate()
            .unwrap();
        let second = terminated(NodePattern::new().tag("c").label("Car"));

        let mut clause = PatternClause::matching();
        clause
            .add_pattern(&first)
            .unwrap()
            .add_pattern(&second)
            .unwrap()
            .terminate()
            .unwrap();
        assert_eq!(
            clause.cypher(),
            "MATCH (p:Person)-[:OWNS]->(h:House),\n(c:Car)"
        );
    }

    #[test]
    fn rejects_open_renderer() {
        let mut open = PatternRenderer::new();
        open.initialize(None).unwrap();
        let err = PatternClause::matching().add_pattern(&open).unwrap_err();
        assert_eq!(
            err,
            BuilderError::PatternNotTerminated {
                clause: ClauseKind::Match
            }
        );
    }

    #[test]
    fn create_accepts_a_single_pattern() {
        let node = terminated(NodePattern::new().tag("r").label("Rec").field("id", 1));
        let mut clause = PatternClause::creating();
        clause.add_pattern(&node).unwrap();
        assert_eq!(clause.add_pattern(&node).unwrap_err(), BuilderError::CreateOnce);
        clause.terminate().unwrap();
        assert_eq!(clause.cypher(), "CREATE (r:Rec {id: $id})");
        assert_eq!(clause.params().len(), 1);
    }

    #[test]
    fn terminate_requires_a_pattern_and_happens_once() {
        let mut clause = PatternClause::matching();
        assert!(matches!(
            clause.terminate(),
            Err(BuilderError::NotInitialized { .. })
        ));
        clause
            .add_pattern(&terminated(NodePattern::new()))
            .unwrap()
            .terminate()
            .unwrap();
        assert!(matches!(
            clause.terminate(),
            Err(BuilderError::AlreadyTerminated { .. })
        ));
        assert!(matches!(
            clause.add_pattern(&terminated(NodePattern::new())),
            Err(BuilderError::AlreadyTerminated { .. })
        ));
    }
}

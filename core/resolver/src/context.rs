//! The seam between the resolver and the name-lookup layer.

use std::fmt::{self, Display, Formatter};

use cdom_ast::arena::AstArena;
use cdom_ast::nodes::NodeId;

/// Why a candidate failed to bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindFailure {
    /// A name is not declared in any visible scope.
    Undeclared(String),
    /// A name in type position refers to something that is not a type.
    NotAType(String),
    /// A name in expression position refers to a type.
    NotAValue(String),
    Other(String),
}

impl Display for BindFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BindFailure::Undeclared(name) => write!(f, "`{name}` is not declared"),
            BindFailure::NotAType(name) => write!(f, "`{name}` does not name a type"),
            BindFailure::NotAValue(name) => write!(f, "`{name}` names a type, not a value"),
            BindFailure::Other(reason) => f.write_str(reason),
        }
    }
}

/// Result of trying one candidate against the surrounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// The candidate binds. Higher ranks win over lower ones before the
    /// tie-break policy is consulted.
    Bound { rank: u32 },
    Unbound(BindFailure),
}

impl CandidateOutcome {
    #[must_use]
    pub fn bound() -> Self {
        CandidateOutcome::Bound { rank: 0 }
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        matches!(self, CandidateOutcome::Bound { .. })
    }
}

/// Semantic information the resolver consults.
///
/// The resolver calls `enter_node` before and `leave_node` after visiting the
/// children of every node of the resolved tree, in document order, so an
/// implementation can maintain scopes and register declarations as they are
/// passed. Candidates are handed to `bind_candidate` while the ambiguous node
/// still holds them; they are never entered or left unless they win.
pub trait SemanticContext {
    fn bind_candidate(&mut self, arena: &AstArena, candidate: NodeId) -> CandidateOutcome;

    fn enter_node(&mut self, _arena: &AstArena, _node: NodeId) {}

    fn leave_node(&mut self, _arena: &AstArena, _node: NodeId) {}
}

impl<F> SemanticContext for F
where
    F: FnMut(&AstArena, NodeId) -> CandidateOutcome,
{
    fn bind_candidate(&mut self, arena: &AstArena, candidate: NodeId) -> CandidateOutcome {
        self(arena, candidate)
    }
}

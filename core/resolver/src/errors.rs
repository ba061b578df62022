use cdom_ast::errors::AstError;
use cdom_ast::nodes::NodeId;
use thiserror::Error;

/// Internal-consistency failures of the resolver.
///
/// A candidate that does not bind is not an error: it is reported through
/// [`crate::context::CandidateOutcome`] and handled by the fallback rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum ResolveError {
    #[error(transparent)]
    Ast(#[from] AstError),

    /// A completed pass left ambiguous nodes in the tree.
    #[error("{count} ambiguous node(s) remain under {root} after resolution")]
    AmbiguityRemains { root: NodeId, count: usize },
}

//! Error types for the AST crate.
//!
//! Every variant here signals a consistency error: a caller used the arena in a
//! way that can only happen through a bug in the parser, the resolver or the
//! tooling that drives them. None of them is meant to be recovered from.

use thiserror::Error;

use crate::nodes::{NodeCategory, NodeId, SlotRole};

/// Errors raised by arena, copy and replace operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum AstError {
    /// The id does not belong to the arena (never allocated or already removed).
    #[error("node {node} does not exist in the arena")]
    UnknownNode { node: NodeId },

    /// The node kind cannot be copied.
    #[error("node {node} of kind `{kind}` does not support copying")]
    UncopyableNode { node: NodeId, kind: &'static str },

    /// A node was placed into a slot (or candidate list) of another category.
    #[error("node {node} has category {found:?}, but {expected:?} was expected")]
    CategoryMismatch {
        node: NodeId,
        expected: NodeCategory,
        found: NodeCategory,
    },

    /// An ambiguous node was built with fewer than two candidates.
    #[error("ambiguous node needs at least two candidates, found {found}")]
    TooFewCandidates { found: usize },

    /// A candidate operation was invoked on a node that is not ambiguous.
    #[error("node {node} of kind `{kind}` is not an ambiguous node")]
    NotAmbiguous { node: NodeId, kind: &'static str },

    /// `replace_child` was invoked on a node kind that cannot hold an ambiguous child.
    #[error("node {node} of kind `{kind}` cannot have its children replaced")]
    NotAnAmbiguityParent { node: NodeId, kind: &'static str },

    /// The child passed to `replace_child` is not a direct child of the parent.
    #[error("node {child} is not a direct child of node {parent}")]
    ChildNotFound { parent: NodeId, child: NodeId },

    /// A node that already has a parent was attached somewhere else.
    #[error("node {node} is already attached to node {parent} as {role:?}")]
    AlreadyAttached {
        node: NodeId,
        parent: NodeId,
        role: SlotRole,
    },

    /// A new node names the same child in two of its slots.
    #[error("node {node} is given as both {first:?} and {second:?}")]
    DuplicateChild {
        node: NodeId,
        first: SlotRole,
        second: SlotRole,
    },

    /// A node that is still attached to a parent was removed from the arena.
    #[error("node {node} is still attached to node {parent}")]
    StillAttached { node: NodeId, parent: NodeId },
}

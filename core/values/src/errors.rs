use cdom_ast::errors::AstError;
use cdom_ast::nodes::NodeId;
use thiserror::Error;

/// Failures while turning a resolved tree into bindings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum CollectError {
    #[error(transparent)]
    Ast(#[from] AstError),

    /// Bindings are only collected from fully resolved trees.
    #[error("node {node} is still ambiguous; run the resolver first")]
    UnresolvedAmbiguity { node: NodeId },
}

/// Failures while marshalling an evaluation or execution, or reading one back.
///
/// Writing only fails on records nested deeper than a reader accepts; unknown
/// values have their own encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum MarshalError {
    #[error("buffer was written with format version {found}, expected {expected}")]
    VersionMismatch { expected: u64, found: u64 },

    #[error("buffer ended in the middle of a record")]
    UnexpectedEnd,

    #[error("unknown {what} tag 0x{tag:02x}")]
    UnknownTag { what: &'static str, tag: u8 },

    #[error("malformed buffer: {0}")]
    Malformed(String),

    #[error("records nested deeper than {limit}")]
    NestingTooDeep { limit: usize },
}

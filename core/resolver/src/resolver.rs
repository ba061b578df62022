//! The ambiguity resolution pass.
//!
//! The pass walks the tree depth-first in document order. When it reaches an
//! ambiguous node it asks the semantic context to bind every candidate, picks
//! the winner, rewires the parent slot to the winner and discards the losers
//! together with the ambiguous node. The walk then continues inside the
//! winner, so ambiguities nested in a rejected candidate are never resolved.
//!
//! Each node is visited once. Recursion depth is bounded by tree depth;
//! a node with many candidates only costs more binding attempts.

use cdom_ast::arena::AstArena;
use cdom_ast::cancel::CancellationFlag;
use cdom_ast::nodes::{AmbiguityKind, NodeId};
use tracing::{debug, info, warn};

use crate::context::{CandidateOutcome, SemanticContext};
use crate::errors::ResolveError;
use crate::policy::{CandidateShape, ResolverConfig};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub ambiguities_resolved: usize,
    /// Ambiguities where no candidate bound and the first one was kept.
    pub fallbacks: usize,
    /// Ambiguities where several candidates bound and the policy decided.
    pub tie_breaks: usize,
    pub candidates_discarded: usize,
    pub nodes_removed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveSummary {
    /// Root of the resolved tree. Differs from the input root only when the
    /// root itself was ambiguous.
    pub root: NodeId,
    pub stats: ResolveStats,
}

/// How a pass ended.
///
/// A cancelled pass leaves every replacement it performed complete, but the
/// tree may still contain ambiguous nodes and must be resolved again before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    Completed(ResolveSummary),
    Cancelled(ResolveSummary),
}

impl ResolveOutcome {
    #[must_use]
    pub fn summary(&self) -> &ResolveSummary {
        match self {
            ResolveOutcome::Completed(summary) | ResolveOutcome::Cancelled(summary) => summary,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ResolveOutcome::Cancelled(_))
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.summary().root
    }
}

pub struct Resolver<'a, C: SemanticContext> {
    arena: &'a mut AstArena,
    context: &'a mut C,
    config: &'a ResolverConfig,
    cancel: CancellationFlag,
    stats: ResolveStats,
}

impl<'a, C: SemanticContext> Resolver<'a, C> {
    pub fn new(arena: &'a mut AstArena, context: &'a mut C, config: &'a ResolverConfig) -> Self {
        Self {
            arena,
            context,
            config,
            cancel: CancellationFlag::default(),
            stats: ResolveStats::default(),
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Resolves every ambiguity under `root`.
    ///
    /// The cancellation flag is checked before each direct child of `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] on arena inconsistencies only; candidates that
    /// fail to bind are handled by the fallback rule.
    pub fn run(mut self, root: NodeId) -> Result<ResolveOutcome, ResolveError> {
        let root = self.settle(root)?;
        self.context.enter_node(self.arena, root);
        for (_, child) in self.arena.children(root) {
            if self.cancel.is_cancelled() {
                info!(
                    root = %root,
                    resolved = self.stats.ambiguities_resolved,
                    "ambiguity resolution cancelled"
                );
                return Ok(ResolveOutcome::Cancelled(self.summary(root)));
            }
            self.walk(child)?;
        }
        self.context.leave_node(self.arena, root);

        let remaining = self.arena.count_ambiguities(root);
        if remaining > 0 {
            return Err(ResolveError::AmbiguityRemains {
                root,
                count: remaining,
            });
        }
        info!(
            root = %root,
            resolved = self.stats.ambiguities_resolved,
            fallbacks = self.stats.fallbacks,
            tie_breaks = self.stats.tie_breaks,
            "ambiguity resolution finished"
        );
        Ok(ResolveOutcome::Completed(self.summary(root)))
    }

    fn summary(&self, root: NodeId) -> ResolveSummary {
        ResolveSummary {
            root,
            stats: self.stats,
        }
    }

    fn walk(&mut self, node: NodeId) -> Result<(), ResolveError> {
        let node = self.settle(node)?;
        self.context.enter_node(self.arena, node);
        for (_, child) in self.arena.children(node) {
            self.walk(child)?;
        }
        self.context.leave_node(self.arena, node);
        Ok(())
    }

    /// Replaces `node` by its resolution until the node in its place is not
    /// ambiguous. A winner may itself be an ambiguous node.
    fn settle(&mut self, mut node: NodeId) -> Result<NodeId, ResolveError> {
        while self.arena.kind(node)?.is_ambiguous() {
            node = self.resolve_one(node)?;
        }
        Ok(node)
    }

    /// Replaces `ambiguity` by its winner and returns the winner. On error the
    /// arena is left as it was.
    fn resolve_one(&mut self, ambiguity: NodeId) -> Result<NodeId, ResolveError> {
        let kind = self.arena.ambiguity_kind_of(ambiguity)?;
        let candidates = self.arena.candidates(ambiguity)?.to_vec();

        let mut survivors = Vec::new();
        for (index, candidate) in candidates.iter().enumerate() {
            match self.context.bind_candidate(self.arena, *candidate) {
                CandidateOutcome::Bound { rank } => survivors.push((index, rank)),
                CandidateOutcome::Unbound(failure) => {
                    debug!(candidate = %candidate, %failure, "candidate rejected");
                }
            }
        }

        let winner_index = if survivors.is_empty() {
            warn!(
                ambiguity = %ambiguity,
                ?kind,
                candidates = candidates.len(),
                "no candidate binds, keeping the first one"
            );
            0
        } else {
            self.choose(kind, &candidates, &survivors)
        };
        let winner = candidates[winner_index];

        let losers = self.arena.resolve_ambiguity(ambiguity, winner)?;
        match survivors.len() {
            0 => self.stats.fallbacks += 1,
            1 => {}
            _ => self.stats.tie_breaks += 1,
        }
        self.stats.nodes_removed += self.arena.remove_subtree(ambiguity)?;
        for loser in losers {
            self.stats.nodes_removed += self.arena.remove_subtree(loser)?;
            self.stats.candidates_discarded += 1;
        }
        self.stats.ambiguities_resolved += 1;

        debug!(
            ambiguity = %ambiguity,
            ?kind,
            winner = %winner,
            survivors = survivors.len(),
            "ambiguity resolved"
        );
        Ok(winner)
    }

    /// Highest rank first, then the policy order, then insertion order.
    fn choose(&self, kind: AmbiguityKind, candidates: &[NodeId], survivors: &[(usize, u32)]) -> usize {
        let policy = &self.config.tie_break;
        survivors
            .iter()
            .min_by_key(|(index, rank)| {
                let shape = CandidateShape::of(self.arena, candidates[*index]);
                (std::cmp::Reverse(*rank), policy.position(kind, shape), *index)
            })
            .map_or(0, |(index, _)| *index)
    }
}

/// Resolves every ambiguity under `root` with the given context.
///
/// # Errors
///
/// See [`Resolver::run`].
pub fn resolve<C: SemanticContext>(
    arena: &mut AstArena,
    root: NodeId,
    context: &mut C,
    config: &ResolverConfig,
    cancel: &CancellationFlag,
) -> Result<ResolveOutcome, ResolveError> {
    Resolver::new(arena, context, config)
        .with_cancellation(cancel.clone())
        .run(root)
}

//! Deep copy of subtrees.
//!
//! A copy is a new, detached subtree in the same arena. Copying with locations
//! keeps every span and records on each copied node the node it was copied
//! from; copying without locations drops both.
//!
//! Ambiguous nodes cannot be copied: a tree is only copied after resolution, so
//! meeting one here means the caller skipped the resolver.

use rustc_hash::FxHashMap;

use crate::arena::AstArena;
use crate::errors::AstError;
use crate::nodes::NodeId;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CopyStyle {
    WithoutLocations,
    WithLocations,
}

impl AstArena {
    /// Copies the subtree rooted at `id` and returns the detached copy.
    ///
    /// # Errors
    ///
    /// Fails with [`AstError::UncopyableNode`] if the subtree contains an
    /// ambiguous node; nothing is added to the arena in that case.
    pub fn copy(&mut self, id: NodeId, style: CopyStyle) -> Result<NodeId, AstError> {
        let nodes = self.descendants(id);
        if nodes.is_empty() {
            return Err(AstError::UnknownNode { node: id });
        }
        for node in &nodes {
            let kind = self.kind(*node)?;
            if kind.is_ambiguous() {
                return Err(AstError::UncopyableNode {
                    node: *node,
                    kind: kind.kind_name(),
                });
            }
        }
        // Children come after their parent in pre-order, so copying in reverse
        // visits every child before the node that refers to it.
        let mut copies: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        for node in nodes.iter().rev() {
            let data = self.data(*node)?;
            let kind = data
                .kind
                .map_children(&mut |child| copies.get(&child).copied().unwrap_or(child));
            let (location, original) = match style {
                CopyStyle::WithLocations => (data.location, Some(*node)),
                CopyStyle::WithoutLocations => (None, None),
            };
            let copy = self.insert(kind, location, original)?;
            copies.insert(*node, copy);
        }
        copies
            .get(&id)
            .copied()
            .ok_or(AstError::UnknownNode { node: id })
    }
}

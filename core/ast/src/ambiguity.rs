//! Ambiguous nodes and the protocol used to replace them.
//!
//! An ambiguous node stands in one slot of its parent and holds two or more
//! candidate subtrees of one grammar category, in the order the parser found
//! them. Once a winner is picked, [`AstArena::resolve_ambiguity`] swaps it into
//! the slot the ambiguous node occupied.

use crate::arena::AstArena;
use crate::errors::AstError;
use crate::nodes::{AmbiguityKind, AmbiguousNode, Location, NodeId, NodeKind, SlotRole};

impl AmbiguityKind {
    /// Wraps `candidates` in the node variant for this kind.
    #[must_use]
    pub fn node_kind(self, candidates: Vec<NodeId>) -> NodeKind {
        let node = AmbiguousNode { candidates };
        match self {
            AmbiguityKind::Declaration => NodeKind::AmbiguousDeclaration(node),
            AmbiguityKind::Declarator => NodeKind::AmbiguousDeclarator(node),
            AmbiguityKind::Expression => NodeKind::AmbiguousExpression(node),
            AmbiguityKind::Statement => NodeKind::AmbiguousStatement(node),
        }
    }
}

impl AstArena {
    /// Creates an ambiguous node over `candidates`.
    ///
    /// # Errors
    ///
    /// Fails if fewer than two candidates are given, if a candidate is of the
    /// wrong category, or if a candidate is already attached elsewhere.
    pub fn add_ambiguity(
        &mut self,
        kind: AmbiguityKind,
        candidates: Vec<NodeId>,
        location: Location,
    ) -> Result<NodeId, AstError> {
        self.add(kind.node_kind(candidates), location)
    }

    /// Appends one more candidate to an ambiguous node.
    ///
    /// # Errors
    ///
    /// Fails if `ambiguity` is not ambiguous, or if the candidate is attached or
    /// of another category.
    pub fn add_candidate(&mut self, ambiguity: NodeId, candidate: NodeId) -> Result<(), AstError> {
        let kind = self.ambiguity_kind_of(ambiguity)?;
        let data = self.data(candidate)?;
        if let (Some(parent), Some(role)) = (data.parent, data.role) {
            return Err(AstError::AlreadyAttached {
                node: candidate,
                parent,
                role,
            });
        }
        let found = data.kind.slot_category();
        if found != kind.candidate_category() {
            return Err(AstError::CategoryMismatch {
                node: candidate,
                expected: kind.candidate_category(),
                found,
            });
        }
        let index = {
            let node = self.ambiguous_mut(ambiguity)?;
            node.candidates.push(candidate);
            node.candidates.len() - 1
        };
        self.attach(candidate, ambiguity, SlotRole::Candidate(index));
        Ok(())
    }

    /// Candidates of an ambiguous node, in insertion order.
    ///
    /// # Errors
    ///
    /// Fails if `ambiguity` is not an ambiguous node.
    pub fn candidates(&self, ambiguity: NodeId) -> Result<&[NodeId], AstError> {
        let kind = self.kind(ambiguity)?;
        kind.as_ambiguous()
            .map(AmbiguousNode::candidates)
            .ok_or(AstError::NotAmbiguous {
                node: ambiguity,
                kind: kind.kind_name(),
            })
    }

    /// # Errors
    ///
    /// Fails if `ambiguity` is not an ambiguous node.
    pub fn ambiguity_kind_of(&self, ambiguity: NodeId) -> Result<AmbiguityKind, AstError> {
        let kind = self.kind(ambiguity)?;
        kind.ambiguity_kind().ok_or(AstError::NotAmbiguous {
            node: ambiguity,
            kind: kind.kind_name(),
        })
    }

    /// Empties an ambiguous node and detaches all of its candidates.
    ///
    /// The ambiguous node is left without candidates and must be replaced and
    /// removed by the caller.
    ///
    /// # Errors
    ///
    /// Fails if `ambiguity` is not an ambiguous node.
    pub fn take_candidates(&mut self, ambiguity: NodeId) -> Result<Vec<NodeId>, AstError> {
        let candidates = std::mem::take(&mut self.ambiguous_mut(ambiguity)?.candidates);
        for candidate in &candidates {
            self.detach(*candidate);
        }
        Ok(candidates)
    }

    fn ambiguous_mut(&mut self, ambiguity: NodeId) -> Result<&mut AmbiguousNode, AstError> {
        let data = self.data_mut(ambiguity)?;
        let kind_name = data.kind.kind_name();
        data.kind
            .as_ambiguous_mut()
            .ok_or(AstError::NotAmbiguous {
                node: ambiguity,
                kind: kind_name,
            })
    }

    /// Replaces the direct child `old` of `parent` with the detached node `new`.
    ///
    /// `new` takes over the exact slot `old` occupied (same role, same list
    /// index) and `old` is left detached. Siblings are not touched.
    ///
    /// # Errors
    ///
    /// * [`AstError::NotAnAmbiguityParent`] if `parent` cannot hold an ambiguous child.
    /// * [`AstError::ChildNotFound`] if `old` is not a direct child of `parent`.
    /// * [`AstError::AlreadyAttached`] if `new` still has a parent.
    /// * [`AstError::CategoryMismatch`] if `new` cannot occupy the slot.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        new: NodeId,
    ) -> Result<SlotRole, AstError> {
        let role = self.replaceable_slot(parent, old, new, None)?;
        self.fill_slot(parent, role, old, new)?;
        Ok(role)
    }

    /// Puts `winner`, one of the candidates of `ambiguity`, into the slot the
    /// ambiguous node occupies and detaches every candidate.
    ///
    /// Returns the other candidates in their original order. The ambiguous node
    /// and the losers are left detached for the caller to remove. On error the
    /// arena is unchanged.
    ///
    /// # Errors
    ///
    /// * [`AstError::NotAmbiguous`] if `ambiguity` is not an ambiguous node.
    /// * [`AstError::ChildNotFound`] if `winner` is not one of its candidates.
    /// * any error of [`AstArena::replace_child`] for the ambiguous node's parent.
    pub fn resolve_ambiguity(
        &mut self,
        ambiguity: NodeId,
        winner: NodeId,
    ) -> Result<Vec<NodeId>, AstError> {
        if !self.candidates(ambiguity)?.contains(&winner) {
            return Err(AstError::ChildNotFound {
                parent: ambiguity,
                child: winner,
            });
        }
        let slot = match self.parent(ambiguity) {
            Some(parent) => Some((
                parent,
                self.replaceable_slot(parent, ambiguity, winner, Some(ambiguity))?,
            )),
            None => None,
        };

        let mut losers = self.take_candidates(ambiguity)?;
        losers.retain(|candidate| *candidate != winner);
        if let Some((parent, role)) = slot {
            self.fill_slot(parent, role, ambiguity, winner)?;
        }
        Ok(losers)
    }

    /// Checks that `new` may take the slot of `old` under `parent` and returns
    /// that slot. `new` may still be attached to `owner`.
    fn replaceable_slot(
        &mut self,
        parent: NodeId,
        old: NodeId,
        new: NodeId,
        owner: Option<NodeId>,
    ) -> Result<SlotRole, AstError> {
        let old_data = self.data(old)?;
        let role = match (old_data.parent, old_data.role) {
            (Some(p), Some(role)) if p == parent => role,
            _ => return Err(AstError::ChildNotFound { parent, child: old }),
        };
        let expected = old_data.kind.slot_category();
        let new_data = self.data(new)?;
        match (new_data.parent, new_data.role) {
            (Some(p), Some(r)) if owner != Some(p) => {
                return Err(AstError::AlreadyAttached {
                    node: new,
                    parent: p,
                    role: r,
                });
            }
            _ => {}
        }
        let found = new_data.kind.slot_category();
        if found != expected {
            return Err(AstError::CategoryMismatch {
                node: new,
                expected,
                found,
            });
        }

        let parent_data = self.data_mut(parent)?;
        let kind_name = parent_data.kind.kind_name();
        let Some(container) = parent_data.kind.as_ambiguity_parent_mut() else {
            return Err(AstError::NotAnAmbiguityParent {
                node: parent,
                kind: kind_name,
            });
        };
        match container.slot_mut(role) {
            Some(slot) if *slot == old => Ok(role),
            _ => Err(AstError::ChildNotFound { parent, child: old }),
        }
    }

    /// Swaps a slot checked by `replaceable_slot`; `new` must be detached.
    fn fill_slot(
        &mut self,
        parent: NodeId,
        role: SlotRole,
        old: NodeId,
        new: NodeId,
    ) -> Result<(), AstError> {
        let slot = self
            .data_mut(parent)?
            .kind
            .as_ambiguity_parent_mut()
            .and_then(|container| container.slot_mut(role))
            .ok_or(AstError::ChildNotFound { parent, child: old })?;
        *slot = new;
        self.detach(old);
        self.attach(new, parent, role);
        Ok(())
    }
}

//! Node storage for one syntax tree.
//!
//! The arena owns every node of a tree. Nodes refer to their children by
//! [`NodeId`]; the parent link and the slot role a node occupies are stored next
//! to it, so a child never owns its parent. Nodes removed from a tree (discarded
//! ambiguity candidates, for example) are removed from the arena as well.

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::AstError;
use crate::nodes::{FileLocation, Location, NodeCategory, NodeId, NodeKind, SlotRole};

#[derive(Clone, Debug)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) role: Option<SlotRole>,
    /// `None` for nodes copied without locations.
    pub(crate) location: Option<Location>,
    /// Node this one was copied from, for copies made with locations.
    pub(crate) original: Option<NodeId>,
}

#[derive(Clone, Debug)]
pub struct AstArena {
    file_name: Rc<str>,
    pub(crate) nodes: FxHashMap<NodeId, NodeData>,
    next_id: u32,
}

impl Default for AstArena {
    fn default() -> Self {
        AstArena::new("<unknown>")
    }
}

impl AstArena {
    #[must_use]
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: Rc::from(file_name),
            nodes: FxHashMap::default(),
            next_id: 1,
        }
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Adds a node and attaches every child it names.
    ///
    /// # Errors
    ///
    /// Fails if a child does not exist, already has a parent, or does not have
    /// the category its slot requires. Ambiguous kinds additionally need two or
    /// more candidates of their declared category.
    pub fn add(&mut self, kind: NodeKind, location: Location) -> Result<NodeId, AstError> {
        self.insert(kind, Some(location), None)
    }

    pub(crate) fn insert(
        &mut self,
        kind: NodeKind,
        location: Option<Location>,
        original: Option<NodeId>,
    ) -> Result<NodeId, AstError> {
        let children = kind.children();
        if kind.is_ambiguous() && children.len() < 2 {
            return Err(AstError::TooFewCandidates {
                found: children.len(),
            });
        }
        let mut seen = FxHashSet::default();
        for (role, child) in &children {
            if !seen.insert(*child) {
                let first = children
                    .iter()
                    .find(|(_, other)| other == child)
                    .map_or(*role, |(first, _)| *first);
                return Err(AstError::DuplicateChild {
                    node: *child,
                    first,
                    second: *role,
                });
            }
            let data = self.data(*child)?;
            if let (Some(parent), Some(existing)) = (data.parent, data.role) {
                return Err(AstError::AlreadyAttached {
                    node: *child,
                    parent,
                    role: existing,
                });
            }
            let expected = match role.expected_category() {
                Some(category) => category,
                None => kind
                    .ambiguity_kind()
                    .map_or(NodeCategory::Ambiguity, |a| a.candidate_category()),
            };
            let found = data.kind.slot_category();
            if found != expected {
                return Err(AstError::CategoryMismatch {
                    node: *child,
                    expected,
                    found,
                });
            }
        }
        let id = self.next_node_id();
        for (role, child) in children {
            self.attach(child, id, role);
        }
        self.nodes.insert(
            id,
            NodeData {
                kind,
                parent: None,
                role: None,
                location,
                original,
            },
        );
        Ok(id)
    }

    fn next_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn attach(&mut self, child: NodeId, parent: NodeId, role: SlotRole) {
        if let Some(data) = self.nodes.get_mut(&child) {
            data.parent = Some(parent);
            data.role = Some(role);
        }
    }

    pub(crate) fn detach(&mut self, child: NodeId) {
        if let Some(data) = self.nodes.get_mut(&child) {
            data.parent = None;
            data.role = None;
        }
    }

    pub(crate) fn data(&self, id: NodeId) -> Result<&NodeData, AstError> {
        self.nodes.get(&id).ok_or(AstError::UnknownNode { node: id })
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> Result<&mut NodeData, AstError> {
        self.nodes
            .get_mut(&id)
            .ok_or(AstError::UnknownNode { node: id })
    }

    /// # Errors
    ///
    /// Fails if the node does not exist.
    pub fn kind(&self, id: NodeId) -> Result<&NodeKind, AstError> {
        Ok(&self.data(id)?.kind)
    }

    /// Kind lookup for callers that already hold a valid id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(&id).map(|data| &data.kind)
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|data| data.parent)
    }

    #[must_use]
    pub fn role(&self, id: NodeId) -> Option<SlotRole> {
        self.nodes.get(&id).and_then(|data| data.role)
    }

    /// Node this one was copied from when it was copied with locations.
    ///
    /// Purely informational: the original may since have been removed.
    #[must_use]
    pub fn original(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|data| data.original)
    }

    /// Returns the first node of the copy chain starting at `id`.
    #[must_use]
    pub fn original_root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(original) = self.original(current) {
            if !self.contains(original) {
                break;
            }
            current = original;
        }
        current
    }

    /// Span of the node. Nodes copied without locations report `0..0`.
    #[must_use]
    pub fn location(&self, id: NodeId) -> Location {
        self.nodes
            .get(&id)
            .and_then(|data| data.location)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn offset(&self, id: NodeId) -> u32 {
        self.location(id).offset
    }

    #[must_use]
    pub fn length(&self, id: NodeId) -> u32 {
        self.location(id).length
    }

    /// File location of the node, or `None` when it was copied without locations.
    #[must_use]
    pub fn file_location(&self, id: NodeId) -> Option<FileLocation> {
        let location = self.nodes.get(&id)?.location?;
        Some(FileLocation {
            file_name: self.file_name.clone(),
            offset: location.offset,
            length: location.length,
        })
    }

    /// Direct children of `id` in slot order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<(SlotRole, NodeId)> {
        self.get(id).map(NodeKind::children).unwrap_or_default()
    }

    /// All nodes of the subtree rooted at `id`, in pre-order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            result.push(current);
            stack.extend(self.children(current).into_iter().rev().map(|(_, c)| c));
        }
        result
    }

    /// Nodes of the subtree rooted at `id` that satisfy `predicate`.
    pub fn filter_nodes<F>(&self, id: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&NodeKind) -> bool,
    {
        self.descendants(id)
            .into_iter()
            .filter(|node| self.get(*node).is_some_and(&predicate))
            .collect()
    }

    #[must_use]
    pub fn contains_ambiguity(&self, id: NodeId) -> bool {
        self.descendants(id)
            .into_iter()
            .any(|node| self.get(node).is_some_and(NodeKind::is_ambiguous))
    }

    #[must_use]
    pub fn count_ambiguities(&self, id: NodeId) -> usize {
        self.filter_nodes(id, NodeKind::is_ambiguous).len()
    }

    /// Removes a detached subtree from the arena.
    ///
    /// # Errors
    ///
    /// Fails if the node does not exist or is still attached to a parent.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<usize, AstError> {
        if let Some(parent) = self.data(id)?.parent {
            return Err(AstError::StillAttached { node: id, parent });
        }
        let nodes = self.descendants(id);
        for node in &nodes {
            self.nodes.remove(node);
        }
        Ok(nodes.len())
    }

    /// Text of a name node.
    #[must_use]
    pub fn name_image(&self, id: NodeId) -> Option<&str> {
        self.get(id)
            .and_then(NodeKind::as_name)
            .map(crate::nodes::Name::image)
    }
}

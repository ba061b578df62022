//! Serializable view of a subtree, used for snapshots and debugging output.

use serde::Serialize;

use crate::arena::AstArena;
use crate::errors::AstError;
use crate::nodes::{Location, NodeId, SlotRole};

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct DumpNode {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<SlotRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DumpNode>,
}

impl AstArena {
    /// Builds the dump of the subtree rooted at `id`.
    ///
    /// # Errors
    ///
    /// Fails with [`AstError::UnknownNode`] if `id` is not in the arena.
    pub fn dump(&self, id: NodeId) -> Result<DumpNode, AstError> {
        self.dump_with_role(id, None)
    }

    fn dump_with_role(&self, id: NodeId, role: Option<SlotRole>) -> Result<DumpNode, AstError> {
        let data = self.data(id)?;
        let image = match (data.kind.as_name(), data.kind.as_literal()) {
            (Some(name), _) => Some(name.image().to_string()),
            (None, Some(literal)) => Some(literal.token.image.clone()),
            (None, None) => None,
        };
        let children = data
            .kind
            .children()
            .into_iter()
            .map(|(role, child)| self.dump_with_role(child, Some(role)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DumpNode {
            kind: data.kind.kind_name(),
            role,
            image,
            location: data.location,
            children,
        })
    }
}

impl DumpNode {
    /// Indented one-line-per-node rendering.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(self.kind);
        if let Some(image) = &self.image {
            out.push(' ');
            out.push_str(image);
        }
        out.push('\n');
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}

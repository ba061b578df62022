//! Declared entities whose values can be computed.

use std::fmt::{self, Display, Formatter};

use cdom_ast::nodes::NodeId;
use serde::{Deserialize, Serialize};

use crate::evaluation::{Evaluation, Execution};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct BindingId(pub(crate) u32);

impl BindingId {
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl Display for BindingId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableBinding {
    pub name: String,
    pub declared_at: NodeId,
    pub initializer: Option<Evaluation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBinding {
    pub name: String,
    pub declared_at: NodeId,
    pub parameters: Vec<BindingId>,
    /// `None` for a function that is declared but never defined.
    pub body: Option<Execution>,
}

/// Stand-in for a name whose binding was still being built when the name was
/// looked up again. It marks a resolution cycle and never carries a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursionResolvingBinding {
    pub name: String,
    /// The reference that closed the cycle.
    pub requested_at: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Variable(VariableBinding),
    Function(FunctionBinding),
    RecursionResolving(RecursionResolvingBinding),
}

impl Binding {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Binding::Variable(variable) => &variable.name,
            Binding::Function(function) => &function.name,
            Binding::RecursionResolving(placeholder) => &placeholder.name,
        }
    }

    #[must_use]
    pub fn as_variable(&self) -> Option<&VariableBinding> {
        match self {
            Binding::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_function(&self) -> Option<&FunctionBinding> {
        match self {
            Binding::Function(function) => Some(function),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_recursion_resolving(&self) -> bool {
        matches!(self, Binding::RecursionResolving(_))
    }
}

/// Where the evaluator gets bindings from.
pub trait BindingSource {
    fn binding(&self, id: BindingId) -> Option<&Binding>;

    /// Every id the source knows, in insertion order.
    fn binding_ids(&self) -> Vec<BindingId>;
}

/// Owns every binding of one tree.
///
/// Placeholders get an id like any other binding so evaluations can refer to
/// them, but they are never associated with a declaration.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    bindings: Vec<Binding>,
}

impl BindingTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, binding: Binding) -> BindingId {
        let id = BindingId(u32::try_from(self.bindings.len()).unwrap_or(u32::MAX));
        self.bindings.push(binding);
        id
    }

    #[must_use]
    pub fn get(&self, id: BindingId) -> Option<&Binding> {
        self.bindings.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: BindingId) -> Option<&mut Binding> {
        self.bindings.get_mut(id.0 as usize)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BindingId, &Binding)> {
        self.bindings
            .iter()
            .enumerate()
            .map(|(index, binding)| (BindingId(u32::try_from(index).unwrap_or(u32::MAX)), binding))
    }

    /// Variables in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = (BindingId, &VariableBinding)> {
        self.iter()
            .filter_map(|(id, binding)| binding.as_variable().map(|variable| (id, variable)))
    }

    /// Real bindings named `name`; placeholders are never returned.
    pub fn find_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = BindingId> + 'a {
        self.iter()
            .filter(move |(_, binding)| !binding.is_recursion_resolving() && binding.name() == name)
            .map(|(id, _)| id)
    }

    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.bindings
            .iter()
            .filter(|binding| binding.is_recursion_resolving())
            .count()
    }
}

impl BindingSource for BindingTable {
    fn binding(&self, id: BindingId) -> Option<&Binding> {
        self.get(id)
    }

    fn binding_ids(&self) -> Vec<BindingId> {
        self.iter().map(|(id, _)| id).collect()
    }
}

//! Structural queries on node kinds: child slots, child remapping and the
//! ambiguity-parent capability.

use crate::nodes::{
    AmbiguityKind, AmbiguousNode, BinaryExpression, CastExpression, CompoundStatement,
    ConditionalExpression, DeclarationStatement, EqualsInitializer, ExpressionStatement,
    FunctionCallExpression, FunctionDefinition, IfStatement, LiteralExpression, Name,
    NodeCategory, NodeId, NodeKind, ParameterDeclaration, ReturnStatement, SimpleDeclaration,
    SlotRole, TranslationUnit, UnaryExpression, WhileStatement,
};

/// Capability of container nodes that may hold an ambiguous child.
///
/// Leaf kinds (names, literals, builtin specifiers, `break`) and containers whose
/// slots can never be ambiguous do not implement it.
pub trait AmbiguityParent {
    /// Returns the slot addressed by `role`, if this node has such a slot and it
    /// may hold an ambiguous child.
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId>;
}

impl AmbiguityParent for TranslationUnit {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::Declaration(index) => self.declarations.get_mut(index),
            _ => None,
        }
    }
}

impl AmbiguityParent for SimpleDeclaration {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::Declarator(index) => self.declarators.get_mut(index),
            _ => None,
        }
    }
}

impl AmbiguityParent for FunctionDefinition {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::Declarator(0) => Some(&mut self.declarator),
            SlotRole::Body => Some(&mut self.body),
            _ => None,
        }
    }
}

impl AmbiguityParent for ParameterDeclaration {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::Declarator(0) => self.declarator.as_mut(),
            _ => None,
        }
    }
}

impl AmbiguityParent for EqualsInitializer {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::InitializerValue => Some(&mut self.value),
            _ => None,
        }
    }
}

impl AmbiguityParent for CompoundStatement {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::Statement(index) => self.statements.get_mut(index),
            _ => None,
        }
    }
}

impl AmbiguityParent for DeclarationStatement {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::Declaration(0) => Some(&mut self.declaration),
            _ => None,
        }
    }
}

impl AmbiguityParent for ExpressionStatement {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::Expression => Some(&mut self.expression),
            _ => None,
        }
    }
}

impl AmbiguityParent for ReturnStatement {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::ReturnValue => self.value.as_mut(),
            _ => None,
        }
    }
}

impl AmbiguityParent for IfStatement {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::Condition => Some(&mut self.condition),
            SlotRole::Then => Some(&mut self.then_clause),
            SlotRole::Else => self.else_clause.as_mut(),
            _ => None,
        }
    }
}

impl AmbiguityParent for WhileStatement {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::Condition => Some(&mut self.condition),
            SlotRole::Body => Some(&mut self.body),
            _ => None,
        }
    }
}

impl AmbiguityParent for UnaryExpression {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::Operand => Some(&mut self.operand),
            _ => None,
        }
    }
}

impl AmbiguityParent for BinaryExpression {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::Lhs => Some(&mut self.lhs),
            SlotRole::Rhs => Some(&mut self.rhs),
            _ => None,
        }
    }
}

impl AmbiguityParent for ConditionalExpression {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::Condition => Some(&mut self.condition),
            SlotRole::Positive => Some(&mut self.positive),
            SlotRole::Negative => Some(&mut self.negative),
            _ => None,
        }
    }
}

impl AmbiguityParent for FunctionCallExpression {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::Function => Some(&mut self.function),
            SlotRole::Argument(index) => self.arguments.get_mut(index),
            _ => None,
        }
    }
}

impl AmbiguityParent for CastExpression {
    fn slot_mut(&mut self, role: SlotRole) -> Option<&mut NodeId> {
        match role {
            SlotRole::Operand => Some(&mut self.operand),
            _ => None,
        }
    }
}

fn indexed(
    children: &mut Vec<(SlotRole, NodeId)>,
    list: &[NodeId],
    role: fn(usize) -> SlotRole,
) {
    children.extend(list.iter().enumerate().map(|(i, id)| (role(i), *id)));
}

fn optional(children: &mut Vec<(SlotRole, NodeId)>, role: SlotRole, id: Option<NodeId>) {
    if let Some(id) = id {
        children.push((role, id));
    }
}

impl NodeKind {
    #[must_use]
    pub fn ambiguity_kind(&self) -> Option<AmbiguityKind> {
        match self {
            NodeKind::AmbiguousDeclaration(_) => Some(AmbiguityKind::Declaration),
            NodeKind::AmbiguousDeclarator(_) => Some(AmbiguityKind::Declarator),
            NodeKind::AmbiguousExpression(_) => Some(AmbiguityKind::Expression),
            NodeKind::AmbiguousStatement(_) => Some(AmbiguityKind::Statement),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.ambiguity_kind().is_some()
    }

    #[must_use]
    pub fn as_ambiguous(&self) -> Option<&AmbiguousNode> {
        match self {
            NodeKind::AmbiguousDeclaration(node)
            | NodeKind::AmbiguousDeclarator(node)
            | NodeKind::AmbiguousExpression(node)
            | NodeKind::AmbiguousStatement(node) => Some(node),
            _ => None,
        }
    }

    pub(crate) fn as_ambiguous_mut(&mut self) -> Option<&mut AmbiguousNode> {
        match self {
            NodeKind::AmbiguousDeclaration(node)
            | NodeKind::AmbiguousDeclarator(node)
            | NodeKind::AmbiguousExpression(node)
            | NodeKind::AmbiguousStatement(node) => Some(node),
            _ => None,
        }
    }

    /// Category of the slot this node may occupy.
    ///
    /// Equal to [`NodeKind::category`] except for ambiguous nodes, which stand in
    /// for their candidates' category.
    #[must_use]
    pub fn slot_category(&self) -> NodeCategory {
        match self.ambiguity_kind() {
            Some(kind) => kind.candidate_category(),
            None => self.category(),
        }
    }

    #[must_use]
    pub fn as_name(&self) -> Option<&Name> {
        if let NodeKind::Name(name) = self {
            Some(name)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_literal(&self) -> Option<&LiteralExpression> {
        if let NodeKind::LiteralExpression(literal) = self {
            Some(literal)
        } else {
            None
        }
    }

    /// Direct children in slot order.
    #[must_use]
    pub fn children(&self) -> Vec<(SlotRole, NodeId)> {
        let mut children = Vec::new();
        match self {
            NodeKind::TranslationUnit(unit) => {
                indexed(&mut children, &unit.declarations, SlotRole::Declaration);
            }
            NodeKind::SimpleDeclaration(decl) => {
                children.push((SlotRole::DeclSpecifier, decl.decl_specifier));
                indexed(&mut children, &decl.declarators, SlotRole::Declarator);
            }
            NodeKind::FunctionDefinition(def) => {
                children.push((SlotRole::DeclSpecifier, def.decl_specifier));
                children.push((SlotRole::Declarator(0), def.declarator));
                children.push((SlotRole::Body, def.body));
            }
            NodeKind::NamedTypeSpecifier(spec) => children.push((SlotRole::Name, spec.name)),
            NodeKind::Declarator(declarator) => {
                children.push((SlotRole::Name, declarator.name));
                optional(&mut children, SlotRole::Initializer, declarator.initializer);
            }
            NodeKind::FunctionDeclarator(declarator) => {
                children.push((SlotRole::Name, declarator.name));
                indexed(&mut children, &declarator.parameters, SlotRole::Parameter);
            }
            NodeKind::ParameterDeclaration(param) => {
                children.push((SlotRole::DeclSpecifier, param.decl_specifier));
                optional(&mut children, SlotRole::Declarator(0), param.declarator);
            }
            NodeKind::EqualsInitializer(init) => {
                children.push((SlotRole::InitializerValue, init.value));
            }
            NodeKind::CompoundStatement(compound) => {
                indexed(&mut children, &compound.statements, SlotRole::Statement);
            }
            NodeKind::DeclarationStatement(stmt) => {
                children.push((SlotRole::Declaration(0), stmt.declaration));
            }
            NodeKind::ExpressionStatement(stmt) => {
                children.push((SlotRole::Expression, stmt.expression));
            }
            NodeKind::ReturnStatement(stmt) => {
                optional(&mut children, SlotRole::ReturnValue, stmt.value);
            }
            NodeKind::IfStatement(stmt) => {
                children.push((SlotRole::Condition, stmt.condition));
                children.push((SlotRole::Then, stmt.then_clause));
                optional(&mut children, SlotRole::Else, stmt.else_clause);
            }
            NodeKind::WhileStatement(stmt) => {
                children.push((SlotRole::Condition, stmt.condition));
                children.push((SlotRole::Body, stmt.body));
            }
            NodeKind::IdExpression(expr) => children.push((SlotRole::Name, expr.name)),
            NodeKind::UnaryExpression(expr) => children.push((SlotRole::Operand, expr.operand)),
            NodeKind::BinaryExpression(expr) => {
                children.push((SlotRole::Lhs, expr.lhs));
                children.push((SlotRole::Rhs, expr.rhs));
            }
            NodeKind::ConditionalExpression(expr) => {
                children.push((SlotRole::Condition, expr.condition));
                children.push((SlotRole::Positive, expr.positive));
                children.push((SlotRole::Negative, expr.negative));
            }
            NodeKind::FunctionCallExpression(expr) => {
                children.push((SlotRole::Function, expr.function));
                indexed(&mut children, &expr.arguments, SlotRole::Argument);
            }
            NodeKind::CastExpression(expr) => {
                children.push((SlotRole::TypeSpecifier, expr.type_specifier));
                children.push((SlotRole::Operand, expr.operand));
            }
            NodeKind::TypeIdExpression(expr) => {
                children.push((SlotRole::TypeSpecifier, expr.type_specifier));
            }
            NodeKind::AmbiguousDeclaration(amb)
            | NodeKind::AmbiguousDeclarator(amb)
            | NodeKind::AmbiguousExpression(amb)
            | NodeKind::AmbiguousStatement(amb) => {
                indexed(&mut children, &amb.candidates, SlotRole::Candidate);
            }
            NodeKind::SimpleDeclSpecifier(_)
            | NodeKind::BreakStatement(_)
            | NodeKind::NullStatement(_)
            | NodeKind::LiteralExpression(_)
            | NodeKind::Name(_) => {}
        }
        children
    }

    /// Returns a copy of this kind whose child ids are rewritten through `map`.
    ///
    /// List-typed attributes are rebuilt, never shared, and wrapped tokens are
    /// detached from their token stream.
    pub(crate) fn map_children(&self, map: &mut dyn FnMut(NodeId) -> NodeId) -> NodeKind {
        match self {
            NodeKind::TranslationUnit(unit) => NodeKind::TranslationUnit(TranslationUnit {
                declarations: map_list(&unit.declarations, map),
            }),
            NodeKind::SimpleDeclaration(decl) => NodeKind::SimpleDeclaration(SimpleDeclaration {
                decl_specifier: map(decl.decl_specifier),
                declarators: map_list(&decl.declarators, map),
            }),
            NodeKind::FunctionDefinition(def) => {
                NodeKind::FunctionDefinition(FunctionDefinition {
                    decl_specifier: map(def.decl_specifier),
                    declarator: map(def.declarator),
                    body: map(def.body),
                })
            }
            NodeKind::SimpleDeclSpecifier(spec) => NodeKind::SimpleDeclSpecifier(spec.clone()),
            NodeKind::NamedTypeSpecifier(spec) => {
                let mut copy = spec.clone();
                copy.name = map(spec.name);
                NodeKind::NamedTypeSpecifier(copy)
            }
            NodeKind::Declarator(declarator) => {
                let mut copy = declarator.clone();
                copy.name = map(declarator.name);
                copy.initializer = declarator.initializer.map(&mut *map);
                NodeKind::Declarator(copy)
            }
            NodeKind::FunctionDeclarator(declarator) => {
                let mut copy = declarator.clone();
                copy.name = map(declarator.name);
                copy.parameters = map_list(&declarator.parameters, map);
                NodeKind::FunctionDeclarator(copy)
            }
            NodeKind::ParameterDeclaration(param) => {
                NodeKind::ParameterDeclaration(ParameterDeclaration {
                    decl_specifier: map(param.decl_specifier),
                    declarator: param.declarator.map(&mut *map),
                })
            }
            NodeKind::EqualsInitializer(init) => NodeKind::EqualsInitializer(EqualsInitializer {
                value: map(init.value),
            }),
            NodeKind::CompoundStatement(compound) => {
                NodeKind::CompoundStatement(CompoundStatement {
                    statements: map_list(&compound.statements, map),
                })
            }
            NodeKind::DeclarationStatement(stmt) => {
                NodeKind::DeclarationStatement(DeclarationStatement {
                    declaration: map(stmt.declaration),
                })
            }
            NodeKind::ExpressionStatement(stmt) => {
                NodeKind::ExpressionStatement(ExpressionStatement {
                    expression: map(stmt.expression),
                })
            }
            NodeKind::ReturnStatement(stmt) => NodeKind::ReturnStatement(ReturnStatement {
                value: stmt.value.map(&mut *map),
            }),
            NodeKind::IfStatement(stmt) => NodeKind::IfStatement(IfStatement {
                condition: map(stmt.condition),
                then_clause: map(stmt.then_clause),
                else_clause: stmt.else_clause.map(&mut *map),
            }),
            NodeKind::WhileStatement(stmt) => NodeKind::WhileStatement(WhileStatement {
                condition: map(stmt.condition),
                body: map(stmt.body),
            }),
            NodeKind::BreakStatement(stmt) => NodeKind::BreakStatement(stmt.clone()),
            NodeKind::NullStatement(stmt) => NodeKind::NullStatement(stmt.clone()),
            NodeKind::IdExpression(expr) => {
                let mut copy = expr.clone();
                copy.name = map(expr.name);
                NodeKind::IdExpression(copy)
            }
            NodeKind::LiteralExpression(literal) => {
                NodeKind::LiteralExpression(LiteralExpression {
                    kind: literal.kind,
                    token: literal.token.clone_detached(),
                })
            }
            NodeKind::UnaryExpression(expr) => NodeKind::UnaryExpression(UnaryExpression {
                operator: expr.operator,
                operand: map(expr.operand),
            }),
            NodeKind::BinaryExpression(expr) => NodeKind::BinaryExpression(BinaryExpression {
                operator: expr.operator,
                lhs: map(expr.lhs),
                rhs: map(expr.rhs),
            }),
            NodeKind::ConditionalExpression(expr) => {
                NodeKind::ConditionalExpression(ConditionalExpression {
                    condition: map(expr.condition),
                    positive: map(expr.positive),
                    negative: map(expr.negative),
                })
            }
            NodeKind::FunctionCallExpression(expr) => {
                NodeKind::FunctionCallExpression(FunctionCallExpression {
                    function: map(expr.function),
                    arguments: map_list(&expr.arguments, map),
                })
            }
            NodeKind::CastExpression(expr) => NodeKind::CastExpression(CastExpression {
                type_specifier: map(expr.type_specifier),
                operand: map(expr.operand),
            }),
            NodeKind::TypeIdExpression(expr) => {
                let mut copy = expr.clone();
                copy.type_specifier = map(expr.type_specifier);
                NodeKind::TypeIdExpression(copy)
            }
            NodeKind::Name(name) => NodeKind::Name(Name {
                token: name.token.clone_detached(),
            }),
            NodeKind::AmbiguousDeclaration(amb) => {
                NodeKind::AmbiguousDeclaration(map_ambiguous(amb, map))
            }
            NodeKind::AmbiguousDeclarator(amb) => {
                NodeKind::AmbiguousDeclarator(map_ambiguous(amb, map))
            }
            NodeKind::AmbiguousExpression(amb) => {
                NodeKind::AmbiguousExpression(map_ambiguous(amb, map))
            }
            NodeKind::AmbiguousStatement(amb) => {
                NodeKind::AmbiguousStatement(map_ambiguous(amb, map))
            }
        }
    }

    /// The ambiguity-parent capability of this node, if its kind has one.
    pub fn as_ambiguity_parent_mut(&mut self) -> Option<&mut dyn AmbiguityParent> {
        match self {
            NodeKind::TranslationUnit(node) => Some(node),
            NodeKind::SimpleDeclaration(node) => Some(node),
            NodeKind::FunctionDefinition(node) => Some(node),
            NodeKind::ParameterDeclaration(node) => Some(node),
            NodeKind::EqualsInitializer(node) => Some(node),
            NodeKind::CompoundStatement(node) => Some(node),
            NodeKind::DeclarationStatement(node) => Some(node),
            NodeKind::ExpressionStatement(node) => Some(node),
            NodeKind::ReturnStatement(node) => Some(node),
            NodeKind::IfStatement(node) => Some(node),
            NodeKind::WhileStatement(node) => Some(node),
            NodeKind::UnaryExpression(node) => Some(node),
            NodeKind::BinaryExpression(node) => Some(node),
            NodeKind::ConditionalExpression(node) => Some(node),
            NodeKind::FunctionCallExpression(node) => Some(node),
            NodeKind::CastExpression(node) => Some(node),
            _ => None,
        }
    }
}

fn map_list(list: &[NodeId], map: &mut dyn FnMut(NodeId) -> NodeId) -> Vec<NodeId> {
    list.iter().map(|id| map(*id)).collect()
}

fn map_ambiguous(amb: &AmbiguousNode, map: &mut dyn FnMut(NodeId) -> NodeId) -> AmbiguousNode {
    AmbiguousNode {
        candidates: map_list(&amb.candidates, map),
    }
}

impl Name {
    #[must_use]
    pub fn image(&self) -> &str {
        &self.token.image
    }
}

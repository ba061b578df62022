//! Tie-break policy for ambiguities where more than one candidate binds.

use cdom_ast::arena::AstArena;
use cdom_ast::nodes::{AmbiguityKind, BuiltinType, NodeId, NodeKind};

/// Coarse shape of a candidate, the unit the tie-break table is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateShape {
    DeclarationStatement,
    ExpressionStatement,
    /// A declaration statement without any type keyword (`x = y;` read as `int x = y;`).
    ImplicitIntDeclaration,
    FunctionDeclaration,
    VariableDeclaration,
    FunctionDeclarator,
    PlainDeclarator,
    TypeIdExpression,
    CastExpression,
    FunctionCall,
    Other,
}

impl CandidateShape {
    #[must_use]
    pub fn of(arena: &AstArena, candidate: NodeId) -> Self {
        match arena.get(candidate) {
            Some(NodeKind::DeclarationStatement(statement)) => {
                if is_implicit_int(arena, statement.declaration) {
                    CandidateShape::ImplicitIntDeclaration
                } else {
                    CandidateShape::DeclarationStatement
                }
            }
            Some(NodeKind::ExpressionStatement(_)) => CandidateShape::ExpressionStatement,
            Some(NodeKind::FunctionDefinition(_)) => CandidateShape::FunctionDeclaration,
            Some(NodeKind::SimpleDeclaration(declaration)) => {
                let declares_function = declaration.declarators.iter().any(|declarator| {
                    matches!(arena.get(*declarator), Some(NodeKind::FunctionDeclarator(_)))
                });
                if declares_function {
                    CandidateShape::FunctionDeclaration
                } else {
                    CandidateShape::VariableDeclaration
                }
            }
            Some(NodeKind::FunctionDeclarator(_)) => CandidateShape::FunctionDeclarator,
            Some(NodeKind::Declarator(_)) => CandidateShape::PlainDeclarator,
            Some(NodeKind::TypeIdExpression(_)) => CandidateShape::TypeIdExpression,
            Some(NodeKind::CastExpression(_)) => CandidateShape::CastExpression,
            Some(NodeKind::FunctionCallExpression(_)) => CandidateShape::FunctionCall,
            _ => CandidateShape::Other,
        }
    }
}

fn is_implicit_int(arena: &AstArena, declaration: NodeId) -> bool {
    let Some(NodeKind::SimpleDeclaration(declaration)) = arena.get(declaration) else {
        return false;
    };
    matches!(
        arena.get(declaration.decl_specifier),
        Some(NodeKind::SimpleDeclSpecifier(specifier)) if specifier.builtin == BuiltinType::Unspecified
    )
}

/// Ordered preferences per ambiguity kind.
///
/// Shapes earlier in a list win over later ones; shapes missing from a list
/// rank after every listed shape. Candidates of equal standing keep their
/// insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TieBreakPolicy {
    pub statements: Vec<CandidateShape>,
    pub declarations: Vec<CandidateShape>,
    pub declarators: Vec<CandidateShape>,
    pub expressions: Vec<CandidateShape>,
}

impl Default for TieBreakPolicy {
    fn default() -> Self {
        Self {
            statements: vec![
                CandidateShape::DeclarationStatement,
                CandidateShape::ExpressionStatement,
                CandidateShape::ImplicitIntDeclaration,
            ],
            declarations: vec![
                CandidateShape::FunctionDeclaration,
                CandidateShape::VariableDeclaration,
            ],
            declarators: vec![
                CandidateShape::FunctionDeclarator,
                CandidateShape::PlainDeclarator,
            ],
            expressions: vec![
                CandidateShape::TypeIdExpression,
                CandidateShape::CastExpression,
                CandidateShape::FunctionCall,
            ],
        }
    }
}

impl TieBreakPolicy {
    /// A policy with no preferences: ties go to the first candidate.
    #[must_use]
    pub fn insertion_order() -> Self {
        Self {
            statements: Vec::new(),
            declarations: Vec::new(),
            declarators: Vec::new(),
            expressions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_preference(mut self, kind: AmbiguityKind, order: Vec<CandidateShape>) -> Self {
        *self.preference_mut(kind) = order;
        self
    }

    #[must_use]
    pub fn preference(&self, kind: AmbiguityKind) -> &[CandidateShape] {
        match kind {
            AmbiguityKind::Statement => &self.statements,
            AmbiguityKind::Declaration => &self.declarations,
            AmbiguityKind::Declarator => &self.declarators,
            AmbiguityKind::Expression => &self.expressions,
        }
    }

    fn preference_mut(&mut self, kind: AmbiguityKind) -> &mut Vec<CandidateShape> {
        match kind {
            AmbiguityKind::Statement => &mut self.statements,
            AmbiguityKind::Declaration => &mut self.declarations,
            AmbiguityKind::Declarator => &mut self.declarators,
            AmbiguityKind::Expression => &mut self.expressions,
        }
    }

    /// Position of `shape` in the preference list; unlisted shapes share the
    /// last position.
    #[must_use]
    pub fn position(&self, kind: AmbiguityKind, shape: CandidateShape) -> usize {
        let preference = self.preference(kind);
        preference
            .iter()
            .position(|preferred| *preferred == shape)
            .unwrap_or(preference.len())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverConfig {
    pub tie_break: TieBreakPolicy,
}

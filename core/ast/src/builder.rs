//! Node constructors used by the grammar layer (and by tests) to build trees.
//!
//! Each method adds one node to the arena and attaches the children it is
//! given. Composite nodes without an explicit location span their children.
//!
//! # Example
//!
//! ```
//! use cdom_ast::builder::TreeBuilder;
//! use cdom_ast::nodes::AmbiguityKind;
//!
//! // `T(a);` read both as a call and as a declaration of `a`
//! let mut b = TreeBuilder::new("t.cpp");
//! let callee = b.id_expression("T", 0).unwrap();
//! let arg = b.id_expression("a", 2).unwrap();
//! let call = b.call(callee, vec![arg]).unwrap();
//! let as_expr = b.expression_statement(call).unwrap();
//!
//! let spec = b.named_specifier("T", 0).unwrap();
//! let decl = b.declarator("a", 2, None).unwrap();
//! let simple = b.simple_declaration(spec, vec![decl]).unwrap();
//! let as_decl = b.declaration_statement(simple).unwrap();
//!
//! let amb = b.ambiguity(AmbiguityKind::Statement, vec![as_expr, as_decl]).unwrap();
//! let arena = b.finish();
//! assert_eq!(arena.candidates(amb).unwrap().len(), 2);
//! ```

use crate::arena::AstArena;
use crate::errors::AstError;
use crate::nodes::{
    AmbiguityKind, BinaryExpression, BinaryOperator, BreakStatement, BuiltinType, CastExpression,
    CompoundStatement, ConditionalExpression, DeclarationStatement, Declarator, EqualsInitializer,
    ExpressionStatement, FunctionCallExpression, FunctionDeclarator, FunctionDefinition,
    IdExpression, IfStatement, LiteralExpression, LiteralKind, Location, Name,
    NamedTypeSpecifier, NodeId, NodeKind, NullStatement, ParameterDeclaration, PointerOperator,
    ReturnStatement, SimpleDeclSpecifier, SimpleDeclaration, StorageClass, Token, TokenKind,
    TranslationUnit, TypeIdExpression, TypeIdOperator, UnaryExpression, UnaryOperator,
    WhileStatement,
};

pub struct TreeBuilder {
    arena: AstArena,
}

impl TreeBuilder {
    #[must_use]
    pub fn new(file_name: &str) -> Self {
        Self {
            arena: AstArena::new(file_name),
        }
    }

    #[must_use]
    pub fn arena(&self) -> &AstArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut AstArena {
        &mut self.arena
    }

    #[must_use]
    pub fn finish(self) -> AstArena {
        self.arena
    }

    fn span(&self, nodes: &[NodeId]) -> Location {
        nodes
            .iter()
            .map(|node| self.arena.location(*node))
            .reduce(|acc, location| acc.cover(&location))
            .unwrap_or_default()
    }

    /// Adds a name wrapping `token`.
    ///
    /// # Errors
    ///
    /// Never fails for a fresh token; the signature matches the other constructors.
    pub fn name_from_token(&mut self, token: Token) -> Result<NodeId, AstError> {
        let location = Location::new(token.offset, token.length());
        self.arena.add(NodeKind::Name(Name { token }), location)
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn name(&mut self, image: &str, offset: u32) -> Result<NodeId, AstError> {
        self.name_from_token(Token::identifier(image, offset))
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn id_expression(&mut self, image: &str, offset: u32) -> Result<NodeId, AstError> {
        let name = self.name(image, offset)?;
        let location = self.arena.location(name);
        self.arena
            .add(NodeKind::IdExpression(IdExpression { name }), location)
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn literal(
        &mut self,
        kind: LiteralKind,
        image: &str,
        offset: u32,
    ) -> Result<NodeId, AstError> {
        let token_kind = match kind {
            LiteralKind::Integer => TokenKind::IntegerLiteral,
            LiteralKind::Float => TokenKind::FloatLiteral,
            LiteralKind::Char => TokenKind::CharLiteral,
            LiteralKind::String => TokenKind::StringLiteral,
            LiteralKind::Boolean => TokenKind::Keyword,
        };
        let token = Token::new(token_kind, image, offset);
        let location = Location::new(offset, token.length());
        self.arena
            .add(NodeKind::LiteralExpression(LiteralExpression { kind, token }), location)
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn integer(&mut self, image: &str, offset: u32) -> Result<NodeId, AstError> {
        self.literal(LiteralKind::Integer, image, offset)
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn unary(&mut self, operator: UnaryOperator, operand: NodeId) -> Result<NodeId, AstError> {
        let location = self.span(&[operand]);
        self.arena.add(
            NodeKind::UnaryExpression(UnaryExpression { operator, operand }),
            location,
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn binary(
        &mut self,
        operator: BinaryOperator,
        lhs: NodeId,
        rhs: NodeId,
    ) -> Result<NodeId, AstError> {
        let location = self.span(&[lhs, rhs]);
        self.arena.add(
            NodeKind::BinaryExpression(BinaryExpression { operator, lhs, rhs }),
            location,
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn conditional(
        &mut self,
        condition: NodeId,
        positive: NodeId,
        negative: NodeId,
    ) -> Result<NodeId, AstError> {
        let location = self.span(&[condition, positive, negative]);
        self.arena.add(
            NodeKind::ConditionalExpression(ConditionalExpression {
                condition,
                positive,
                negative,
            }),
            location,
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn call(&mut self, function: NodeId, arguments: Vec<NodeId>) -> Result<NodeId, AstError> {
        let mut nodes = vec![function];
        nodes.extend(&arguments);
        let location = self.span(&nodes);
        self.arena.add(
            NodeKind::FunctionCallExpression(FunctionCallExpression {
                function,
                arguments,
            }),
            location,
        )
    }

    /// Function-style cast `type_specifier(operand)`.
    ///
    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn cast(&mut self, type_specifier: NodeId, operand: NodeId) -> Result<NodeId, AstError> {
        let location = self.span(&[type_specifier, operand]);
        self.arena.add(
            NodeKind::CastExpression(CastExpression {
                type_specifier,
                operand,
            }),
            location,
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn type_id(
        &mut self,
        operator: TypeIdOperator,
        type_specifier: NodeId,
        location: Location,
    ) -> Result<NodeId, AstError> {
        self.arena.add(
            NodeKind::TypeIdExpression(TypeIdExpression {
                operator,
                type_specifier,
            }),
            location,
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn specifier(
        &mut self,
        specifier: SimpleDeclSpecifier,
        location: Location,
    ) -> Result<NodeId, AstError> {
        self.arena
            .add(NodeKind::SimpleDeclSpecifier(specifier), location)
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn builtin(&mut self, builtin: BuiltinType, offset: u32) -> Result<NodeId, AstError> {
        #[allow(clippy::cast_possible_truncation)]
        let length = builtin.keyword().map_or(0, |k| k.len() as u32);
        self.specifier(
            SimpleDeclSpecifier {
                builtin,
                ..SimpleDeclSpecifier::default()
            },
            Location::new(offset, length),
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn named_specifier(&mut self, image: &str, offset: u32) -> Result<NodeId, AstError> {
        self.named_specifier_with(image, offset, StorageClass::Unspecified, false)
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn named_specifier_with(
        &mut self,
        image: &str,
        offset: u32,
        storage: StorageClass,
        is_const: bool,
    ) -> Result<NodeId, AstError> {
        let name = self.name(image, offset)?;
        let location = self.arena.location(name);
        self.arena.add(
            NodeKind::NamedTypeSpecifier(NamedTypeSpecifier {
                name,
                storage,
                is_const,
            }),
            location,
        )
    }

    /// Declarator for `image`, optionally followed by `= initializer_value`.
    ///
    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn declarator(
        &mut self,
        image: &str,
        offset: u32,
        initializer_value: Option<NodeId>,
    ) -> Result<NodeId, AstError> {
        self.pointer_declarator(Vec::new(), image, offset, initializer_value)
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn pointer_declarator(
        &mut self,
        pointer_ops: Vec<PointerOperator>,
        image: &str,
        offset: u32,
        initializer_value: Option<NodeId>,
    ) -> Result<NodeId, AstError> {
        let name = self.name(image, offset)?;
        let initializer = match initializer_value {
            Some(value) => {
                let location = self.span(&[value]);
                Some(
                    self.arena
                        .add(NodeKind::EqualsInitializer(EqualsInitializer { value }), location)?,
                )
            }
            None => None,
        };
        let mut nodes = vec![name];
        nodes.extend(initializer);
        let location = self.span(&nodes);
        self.arena.add(
            NodeKind::Declarator(Declarator {
                pointer_ops,
                name,
                initializer,
            }),
            location,
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn function_declarator(
        &mut self,
        image: &str,
        offset: u32,
        parameters: Vec<NodeId>,
    ) -> Result<NodeId, AstError> {
        let name = self.name(image, offset)?;
        let mut nodes = vec![name];
        nodes.extend(&parameters);
        let location = self.span(&nodes);
        self.arena.add(
            NodeKind::FunctionDeclarator(FunctionDeclarator {
                pointer_ops: Vec::new(),
                name,
                parameters,
            }),
            location,
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn parameter(
        &mut self,
        decl_specifier: NodeId,
        declarator: Option<NodeId>,
    ) -> Result<NodeId, AstError> {
        let mut nodes = vec![decl_specifier];
        nodes.extend(declarator);
        let location = self.span(&nodes);
        self.arena.add(
            NodeKind::ParameterDeclaration(ParameterDeclaration {
                decl_specifier,
                declarator,
            }),
            location,
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn simple_declaration(
        &mut self,
        decl_specifier: NodeId,
        declarators: Vec<NodeId>,
    ) -> Result<NodeId, AstError> {
        let mut nodes = vec![decl_specifier];
        nodes.extend(&declarators);
        let location = self.span(&nodes);
        self.arena.add(
            NodeKind::SimpleDeclaration(SimpleDeclaration {
                decl_specifier,
                declarators,
            }),
            location,
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn function_definition(
        &mut self,
        decl_specifier: NodeId,
        declarator: NodeId,
        body: NodeId,
    ) -> Result<NodeId, AstError> {
        let location = self.span(&[decl_specifier, declarator, body]);
        self.arena.add(
            NodeKind::FunctionDefinition(FunctionDefinition {
                decl_specifier,
                declarator,
                body,
            }),
            location,
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn compound(
        &mut self,
        statements: Vec<NodeId>,
        location: Location,
    ) -> Result<NodeId, AstError> {
        self.arena.add(
            NodeKind::CompoundStatement(CompoundStatement { statements }),
            location,
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn declaration_statement(&mut self, declaration: NodeId) -> Result<NodeId, AstError> {
        let location = self.span(&[declaration]);
        self.arena.add(
            NodeKind::DeclarationStatement(DeclarationStatement { declaration }),
            location,
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn expression_statement(&mut self, expression: NodeId) -> Result<NodeId, AstError> {
        let location = self.span(&[expression]);
        self.arena.add(
            NodeKind::ExpressionStatement(ExpressionStatement { expression }),
            location,
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn return_statement(
        &mut self,
        value: Option<NodeId>,
        location: Location,
    ) -> Result<NodeId, AstError> {
        self.arena
            .add(NodeKind::ReturnStatement(ReturnStatement { value }), location)
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn if_statement(
        &mut self,
        condition: NodeId,
        then_clause: NodeId,
        else_clause: Option<NodeId>,
    ) -> Result<NodeId, AstError> {
        let mut nodes = vec![condition, then_clause];
        nodes.extend(else_clause);
        let location = self.span(&nodes);
        self.arena.add(
            NodeKind::IfStatement(IfStatement {
                condition,
                then_clause,
                else_clause,
            }),
            location,
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn while_statement(&mut self, condition: NodeId, body: NodeId) -> Result<NodeId, AstError> {
        let location = self.span(&[condition, body]);
        self.arena.add(
            NodeKind::WhileStatement(WhileStatement { condition, body }),
            location,
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn break_statement(&mut self, offset: u32) -> Result<NodeId, AstError> {
        self.arena.add(
            NodeKind::BreakStatement(BreakStatement {}),
            Location::new(offset, 6),
        )
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn null_statement(&mut self, offset: u32) -> Result<NodeId, AstError> {
        self.arena.add(
            NodeKind::NullStatement(NullStatement {}),
            Location::new(offset, 1),
        )
    }

    /// Ambiguous node spanning its candidates.
    ///
    /// # Errors
    ///
    /// See [`AstArena::add_ambiguity`].
    pub fn ambiguity(
        &mut self,
        kind: AmbiguityKind,
        candidates: Vec<NodeId>,
    ) -> Result<NodeId, AstError> {
        let location = self.span(&candidates);
        self.arena.add_ambiguity(kind, candidates, location)
    }

    /// # Errors
    ///
    /// See [`AstArena::add`].
    pub fn translation_unit(&mut self, declarations: Vec<NodeId>) -> Result<NodeId, AstError> {
        let location = self.span(&declarations);
        self.arena.add(
            NodeKind::TranslationUnit(TranslationUnit { declarations }),
            location,
        )
    }
}

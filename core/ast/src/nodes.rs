use core::fmt;
use std::{
    fmt::{Display, Formatter},
    rc::Rc,
};

use serde::{Deserialize, Serialize};

/// Handle of a node inside an [`AstArena`](crate::arena::AstArena).
///
/// Zero is reserved and never handed out.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Byte span of a node in its source file.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Location {
    pub offset: u32,
    pub length: u32,
}

impl Location {
    #[must_use]
    pub fn new(offset: u32, length: u32) -> Self {
        Self { offset, length }
    }

    #[must_use]
    /// One past the last byte; clamped at `u32::MAX`.
    pub fn end(&self) -> u32 {
        self.offset.saturating_add(self.length)
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn cover(&self, other: &Location) -> Location {
        let offset = self.offset.min(other.offset);
        let end = self.end().max(other.end());
        Location::new(offset, end - offset)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}..{}", self.offset, self.end())
    }
}

/// A location that can be shown to the user: it names the file the span lives in.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FileLocation {
    pub file_name: Rc<str>,
    pub offset: u32,
    pub length: u32,
}

impl Display for FileLocation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}@{}+{}", self.file_name, self.offset, self.length)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    Keyword,
    IntegerLiteral,
    FloatLiteral,
    CharLiteral,
    StringLiteral,
    Punctuator,
}

/// A token handed over by the scanner.
///
/// Tokens of one stream are chained through `next`. The chain only makes sense
/// inside the stream that produced it, so copies made for the tree drop it.
#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub image: String,
    pub offset: u32,
    next: Option<Rc<Token>>,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, image: impl Into<String>, offset: u32) -> Self {
        Self {
            kind,
            image: image.into(),
            offset,
            next: None,
        }
    }

    #[must_use]
    pub fn identifier(image: impl Into<String>, offset: u32) -> Self {
        Self::new(TokenKind::Identifier, image, offset)
    }

    #[must_use]
    pub fn with_next(mut self, next: Rc<Token>) -> Self {
        self.next = Some(next);
        self
    }

    #[must_use]
    pub fn next(&self) -> Option<&Token> {
        self.next.as_deref()
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn length(&self) -> u32 {
        self.image.len() as u32
    }

    /// Clones the token value without its position in the token stream.
    #[must_use]
    pub fn clone_detached(&self) -> Self {
        Self {
            kind: self.kind,
            image: self.image.clone(),
            offset: self.offset,
            next: None,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.image == other.image && self.offset == other.offset
    }
}

impl Eq for Token {}

/// Grammar category a node belongs to.
///
/// Ambiguous nodes report [`NodeCategory::Ambiguity`]; the category of their
/// candidates is available through [`AmbiguityKind::candidate_category`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum NodeCategory {
    TranslationUnit,
    Declaration,
    DeclSpecifier,
    Declarator,
    Parameter,
    Initializer,
    Statement,
    Expression,
    Name,
    Ambiguity,
}

/// The four flavours of ambiguous node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum AmbiguityKind {
    Declaration,
    Declarator,
    Expression,
    Statement,
}

impl AmbiguityKind {
    #[must_use]
    pub fn candidate_category(self) -> NodeCategory {
        match self {
            AmbiguityKind::Declaration => NodeCategory::Declaration,
            AmbiguityKind::Declarator => NodeCategory::Declarator,
            AmbiguityKind::Expression => NodeCategory::Expression,
            AmbiguityKind::Statement => NodeCategory::Statement,
        }
    }
}

/// Structural role of a child inside its parent.
///
/// Indexed roles address one element of a list-typed slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SlotRole {
    Declaration(usize),
    DeclSpecifier,
    Declarator(usize),
    Body,
    Name,
    Initializer,
    Parameter(usize),
    InitializerValue,
    Statement(usize),
    Expression,
    ReturnValue,
    Condition,
    Then,
    Else,
    Operand,
    Lhs,
    Rhs,
    Positive,
    Negative,
    Function,
    Argument(usize),
    TypeSpecifier,
    Candidate(usize),
}

impl SlotRole {
    /// Category a node must have to occupy this slot.
    ///
    /// Candidate slots return `None`: their category is dictated by the ambiguous node.
    #[must_use]
    pub fn expected_category(self) -> Option<NodeCategory> {
        let category = match self {
            SlotRole::Declaration(_) => NodeCategory::Declaration,
            SlotRole::DeclSpecifier | SlotRole::TypeSpecifier => NodeCategory::DeclSpecifier,
            SlotRole::Declarator(_) => NodeCategory::Declarator,
            SlotRole::Body | SlotRole::Statement(_) | SlotRole::Then | SlotRole::Else => {
                NodeCategory::Statement
            }
            SlotRole::Name => NodeCategory::Name,
            SlotRole::Initializer => NodeCategory::Initializer,
            SlotRole::Parameter(_) => NodeCategory::Parameter,
            SlotRole::InitializerValue
            | SlotRole::Expression
            | SlotRole::ReturnValue
            | SlotRole::Condition
            | SlotRole::Operand
            | SlotRole::Lhs
            | SlotRole::Rhs
            | SlotRole::Positive
            | SlotRole::Negative
            | SlotRole::Function
            | SlotRole::Argument(_) => NodeCategory::Expression,
            SlotRole::Candidate(_) => return None,
        };
        Some(category)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum BuiltinType {
    /// No type keyword at all (K&R implicit `int`).
    #[default]
    Unspecified,
    Void,
    Bool,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl BuiltinType {
    #[must_use]
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            BuiltinType::Unspecified => None,
            BuiltinType::Void => Some("void"),
            BuiltinType::Bool => Some("bool"),
            BuiltinType::Char => Some("char"),
            BuiltinType::Int => Some("int"),
            BuiltinType::Long => Some("long"),
            BuiltinType::Float => Some("float"),
            BuiltinType::Double => Some("double"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum StorageClass {
    #[default]
    Unspecified,
    Typedef,
    Extern,
    Static,
    Constexpr,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum PointerOperator {
    Pointer { is_const: bool },
    Reference,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LiteralKind {
    Integer,
    Float,
    Char,
    String,
    Boolean,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
    Tilde,
    Star,
    Amper,
    Bracketed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum BinaryOperator {
    Multiply,
    Divide,
    Modulo,
    Plus,
    Minus,
    ShiftLeft,
    ShiftRight,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equals,
    NotEquals,
    BinaryAnd,
    BinaryXor,
    BinaryOr,
    LogicalAnd,
    LogicalOr,
    Assign,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TypeIdOperator {
    Sizeof,
    Typeid,
}

macro_rules! node_kinds {
    (
        $(
            $(#[$arm_attr:meta])*
            $variant:ident ( $ty:ty ) => $category:ident,
        )+
    ) => {
        #[derive(Clone, PartialEq, Eq, Debug)]
        pub enum NodeKind {
            $(
                $(#[$arm_attr])*
                $variant($ty),
            )+
        }

        impl NodeKind {
            #[must_use]
            pub fn kind_name(&self) -> &'static str {
                match self {
                    $(
                        NodeKind::$variant(_) => stringify!($variant),
                    )+
                }
            }

            /// Category reported to consumers. Ambiguous nodes report their own category.
            #[must_use]
            pub fn category(&self) -> NodeCategory {
                match self {
                    $(
                        NodeKind::$variant(_) => NodeCategory::$category,
                    )+
                }
            }
        }
    };
}

node_kinds! {
    TranslationUnit(TranslationUnit) => TranslationUnit,

    SimpleDeclaration(SimpleDeclaration) => Declaration,
    FunctionDefinition(FunctionDefinition) => Declaration,

    SimpleDeclSpecifier(SimpleDeclSpecifier) => DeclSpecifier,
    NamedTypeSpecifier(NamedTypeSpecifier) => DeclSpecifier,

    Declarator(Declarator) => Declarator,
    FunctionDeclarator(FunctionDeclarator) => Declarator,
    ParameterDeclaration(ParameterDeclaration) => Parameter,
    EqualsInitializer(EqualsInitializer) => Initializer,

    CompoundStatement(CompoundStatement) => Statement,
    DeclarationStatement(DeclarationStatement) => Statement,
    ExpressionStatement(ExpressionStatement) => Statement,
    ReturnStatement(ReturnStatement) => Statement,
    IfStatement(IfStatement) => Statement,
    WhileStatement(WhileStatement) => Statement,
    BreakStatement(BreakStatement) => Statement,
    NullStatement(NullStatement) => Statement,

    IdExpression(IdExpression) => Expression,
    LiteralExpression(LiteralExpression) => Expression,
    UnaryExpression(UnaryExpression) => Expression,
    BinaryExpression(BinaryExpression) => Expression,
    ConditionalExpression(ConditionalExpression) => Expression,
    FunctionCallExpression(FunctionCallExpression) => Expression,
    /// Function-style cast `T(a)`.
    CastExpression(CastExpression) => Expression,
    TypeIdExpression(TypeIdExpression) => Expression,

    Name(Name) => Name,

    AmbiguousDeclaration(AmbiguousNode) => Ambiguity,
    AmbiguousDeclarator(AmbiguousNode) => Ambiguity,
    AmbiguousExpression(AmbiguousNode) => Ambiguity,
    AmbiguousStatement(AmbiguousNode) => Ambiguity,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TranslationUnit {
    pub declarations: Vec<NodeId>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SimpleDeclaration {
    pub decl_specifier: NodeId,
    pub declarators: Vec<NodeId>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FunctionDefinition {
    pub decl_specifier: NodeId,
    pub declarator: NodeId,
    pub body: NodeId,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct SimpleDeclSpecifier {
    pub builtin: BuiltinType,
    pub storage: StorageClass,
    pub is_const: bool,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NamedTypeSpecifier {
    pub name: NodeId,
    pub storage: StorageClass,
    pub is_const: bool,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Declarator {
    pub pointer_ops: Vec<PointerOperator>,
    pub name: NodeId,
    pub initializer: Option<NodeId>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FunctionDeclarator {
    pub pointer_ops: Vec<PointerOperator>,
    pub name: NodeId,
    pub parameters: Vec<NodeId>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParameterDeclaration {
    pub decl_specifier: NodeId,
    pub declarator: Option<NodeId>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EqualsInitializer {
    pub value: NodeId,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct CompoundStatement {
    pub statements: Vec<NodeId>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DeclarationStatement {
    pub declaration: NodeId,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ExpressionStatement {
    pub expression: NodeId,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ReturnStatement {
    pub value: Option<NodeId>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct IfStatement {
    pub condition: NodeId,
    pub then_clause: NodeId,
    pub else_clause: Option<NodeId>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct WhileStatement {
    pub condition: NodeId,
    pub body: NodeId,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct BreakStatement {}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct NullStatement {}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct IdExpression {
    pub name: NodeId,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LiteralExpression {
    pub kind: LiteralKind,
    pub token: Token,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub operand: NodeId,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub lhs: NodeId,
    pub rhs: NodeId,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ConditionalExpression {
    pub condition: NodeId,
    pub positive: NodeId,
    pub negative: NodeId,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FunctionCallExpression {
    pub function: NodeId,
    pub arguments: Vec<NodeId>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CastExpression {
    pub type_specifier: NodeId,
    pub operand: NodeId,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TypeIdExpression {
    pub operator: TypeIdOperator,
    pub type_specifier: NodeId,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Name {
    pub token: Token,
}

/// Candidate list shared by the four ambiguous variants of [`NodeKind`].
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct AmbiguousNode {
    pub(crate) candidates: Vec<NodeId>,
}

impl AmbiguousNode {
    #[must_use]
    pub fn candidates(&self) -> &[NodeId] {
        &self.candidates
    }
}

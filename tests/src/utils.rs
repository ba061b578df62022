use cdom_ast::arena::AstArena;
use cdom_ast::builder::TreeBuilder;
use cdom_ast::cancel::CancellationFlag;
use cdom_ast::nodes::{AmbiguityKind, BinaryOperator, BuiltinType, Location, NodeId};
use cdom_resolver::{resolve, ResolveOutcome, ResolverConfig, SemanticContext};

/// `int <name> = <initializer>;`
pub(crate) fn int_declaration(
    b: &mut TreeBuilder,
    name: &str,
    offset: u32,
    initializer: Option<NodeId>,
) -> NodeId {
    let int = b.builtin(BuiltinType::Int, offset).unwrap();
    let declarator = b.declarator(name, offset + 4, initializer).unwrap();
    b.simple_declaration(int, vec![declarator]).unwrap()
}

/// The two readings of `T(a);`.
pub(crate) struct CastOrDeclaration {
    pub ambiguity: NodeId,
    pub as_expression: NodeId,
    pub as_declaration: NodeId,
}

/// Builds the statement ambiguity for `T(a);` at `offset`: a function-style
/// cast of `a` to `T`, or a declaration of `a` with type `T`.
pub(crate) fn cast_or_declaration(b: &mut TreeBuilder, offset: u32) -> CastOrDeclaration {
    let spec = b.named_specifier("T", offset).unwrap();
    let operand = b.id_expression("a", offset + 2).unwrap();
    let cast = b.cast(spec, operand).unwrap();
    let as_expression = b.expression_statement(cast).unwrap();
    let spec = b.named_specifier("T", offset).unwrap();
    let declarator = b.declarator("a", offset + 2, None).unwrap();
    let declaration = b.simple_declaration(spec, vec![declarator]).unwrap();
    let as_declaration = b.declaration_statement(declaration).unwrap();
    let ambiguity = b
        .ambiguity(AmbiguityKind::Statement, vec![as_expression, as_declaration])
        .unwrap();
    CastOrDeclaration {
        ambiguity,
        as_expression,
        as_declaration,
    }
}

/// `int fact(int n) { if (n <= 1) return 1; return n * fact(n - 1); }`
pub(crate) fn factorial_definition(b: &mut TreeBuilder) -> NodeId {
    let int = b.builtin(BuiltinType::Int, 0).unwrap();
    let parameter_type = b.builtin(BuiltinType::Int, 9).unwrap();
    let n = b.declarator("n", 13, None).unwrap();
    let parameter = b.parameter(parameter_type, Some(n)).unwrap();
    let declarator = b.function_declarator("fact", 4, vec![parameter]).unwrap();

    let n = b.id_expression("n", 24).unwrap();
    let one = b.integer("1", 29).unwrap();
    let at_most_one = b.binary(BinaryOperator::LessEqual, n, one).unwrap();
    let one = b.integer("1", 39).unwrap();
    let base_case = b.return_statement(Some(one), Location::new(32, 9)).unwrap();
    let guard = b.if_statement(at_most_one, base_case, None).unwrap();

    let n = b.id_expression("n", 49).unwrap();
    let callee = b.id_expression("fact", 53).unwrap();
    let n_again = b.id_expression("n", 58).unwrap();
    let one = b.integer("1", 62).unwrap();
    let decremented = b.binary(BinaryOperator::Minus, n_again, one).unwrap();
    let call = b.call(callee, vec![decremented]).unwrap();
    let product = b.binary(BinaryOperator::Multiply, n, call).unwrap();
    let recursive_case = b
        .return_statement(Some(product), Location::new(42, 23))
        .unwrap();

    let body = b
        .compound(vec![guard, recursive_case], Location::new(16, 51))
        .unwrap();
    b.function_definition(int, declarator, body).unwrap()
}

pub(crate) fn resolve_all<C: SemanticContext>(
    arena: &mut AstArena,
    root: NodeId,
    context: &mut C,
) -> ResolveOutcome {
    resolve(
        arena,
        root,
        context,
        &ResolverConfig::default(),
        &CancellationFlag::new(),
    )
    .unwrap()
}

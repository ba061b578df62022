use cdom_ast::arena::AstArena;
use cdom_ast::builder::TreeBuilder;
use cdom_ast::cancel::CancellationFlag;
use cdom_ast::nodes::{
    AmbiguityKind, BuiltinType, Location, NodeId, NodeKind, SimpleDeclSpecifier, StorageClass,
};
use cdom_resolver::{
    resolve, CandidateShape, ResolverConfig, ScopedSymbolTable, TieBreakPolicy,
};

use crate::utils::{cast_or_declaration, int_declaration, resolve_all, CastOrDeclaration};

/// `typedef int T;`
fn typedef_t(b: &mut TreeBuilder) -> NodeId {
    let spec = b
        .specifier(
            SimpleDeclSpecifier {
                builtin: BuiltinType::Int,
                storage: StorageClass::Typedef,
                is_const: false,
            },
            Location::new(0, 11),
        )
        .unwrap();
    let declarator = b.declarator("T", 12, None).unwrap();
    b.simple_declaration(spec, vec![declarator]).unwrap()
}

/// `void f() { <statement> }` at `offset`; returns the definition and its body.
fn function_around(b: &mut TreeBuilder, statement: NodeId, offset: u32) -> (NodeId, NodeId) {
    let void = b.builtin(BuiltinType::Void, offset).unwrap();
    let declarator = b.function_declarator("f", offset + 5, Vec::new()).unwrap();
    let body = b
        .compound(vec![statement], Location::new(offset + 9, 10))
        .unwrap();
    let definition = b.function_definition(void, declarator, body).unwrap();
    (definition, body)
}

fn first_statement(arena: &AstArena, body: NodeId) -> NodeId {
    let Some(NodeKind::CompoundStatement(compound)) = arena.get(body) else {
        panic!("expected a compound statement");
    };
    compound.statements[0]
}

struct Program {
    arena: AstArena,
    root: NodeId,
    body: NodeId,
    statement: CastOrDeclaration,
}

/// `<prelude...> void f() { T(a); }`
fn program(prelude: impl FnOnce(&mut TreeBuilder) -> Vec<NodeId>) -> Program {
    let mut b = TreeBuilder::new("t.cpp");
    let mut declarations = prelude(&mut b);
    let statement = cast_or_declaration(&mut b, 40);
    let (definition, body) = function_around(&mut b, statement.ambiguity, 30);
    declarations.push(definition);
    let root = b.translation_unit(declarations).unwrap();
    Program {
        arena: b.finish(),
        root,
        body,
        statement,
    }
}

#[test]
fn test_t_of_a_with_a_known_type_becomes_a_declaration() {
    let mut program = program(|b| vec![typedef_t(b)]);
    let mut symbols = ScopedSymbolTable::new();
    let outcome = resolve_all(&mut program.arena, program.root, &mut symbols);

    let arena = &program.arena;
    assert!(!outcome.is_cancelled());
    assert_eq!(
        first_statement(arena, program.body),
        program.statement.as_declaration
    );
    assert_eq!(
        arena.parent(program.statement.as_declaration),
        Some(program.body)
    );
    assert!(!arena.contains(program.statement.as_expression));
    assert!(!arena.contains(program.statement.ambiguity));
    assert!(!arena.contains_ambiguity(program.root));

    let stats = outcome.summary().stats;
    assert_eq!(stats.ambiguities_resolved, 1);
    assert_eq!(stats.fallbacks, 0);
    assert_eq!(stats.tie_breaks, 0);
    assert_eq!(stats.candidates_discarded, 1);
}

#[test]
fn test_t_of_a_with_a_variable_t_falls_back_to_the_first_reading() {
    let mut program = program(|b| vec![int_declaration(b, "T", 0, None)]);
    let mut symbols = ScopedSymbolTable::new();
    let outcome = resolve_all(&mut program.arena, program.root, &mut symbols);

    assert_eq!(
        first_statement(&program.arena, program.body),
        program.statement.as_expression
    );
    assert_eq!(outcome.summary().stats.fallbacks, 1);
    assert!(!program.arena.contains_ambiguity(program.root));
}

#[test]
fn test_t_of_a_where_both_bind_prefers_the_declaration() {
    let mut program = program(|b| vec![typedef_t(b), int_declaration(b, "a", 16, None)]);
    let mut symbols = ScopedSymbolTable::new();
    let outcome = resolve_all(&mut program.arena, program.root, &mut symbols);

    assert_eq!(
        first_statement(&program.arena, program.body),
        program.statement.as_declaration
    );
    assert_eq!(outcome.summary().stats.tie_breaks, 1);
}

#[test]
fn test_statement_preference_is_configurable() {
    let mut program = program(|b| vec![typedef_t(b), int_declaration(b, "a", 16, None)]);
    let config = ResolverConfig {
        tie_break: TieBreakPolicy::default().with_preference(
            AmbiguityKind::Statement,
            vec![
                CandidateShape::ExpressionStatement,
                CandidateShape::DeclarationStatement,
            ],
        ),
    };
    let mut symbols = ScopedSymbolTable::new();
    resolve(
        &mut program.arena,
        program.root,
        &mut symbols,
        &config,
        &CancellationFlag::new(),
    )
    .unwrap();

    assert_eq!(
        first_statement(&program.arena, program.body),
        program.statement.as_expression
    );
}

#[test]
fn test_local_typedef_is_not_visible_after_its_block() {
    // typedef int T; void f() { T(a); }  void g() { { typedef int U; } U(a); }
    let mut b = TreeBuilder::new("t.cpp");
    let outer_typedef = typedef_t(&mut b);
    let (f, _) = {
        let statement = cast_or_declaration(&mut b, 40);
        function_around(&mut b, statement.ambiguity, 30)
    };

    let spec = b
        .specifier(
            SimpleDeclSpecifier {
                builtin: BuiltinType::Int,
                storage: StorageClass::Typedef,
                is_const: false,
            },
            Location::new(62, 11),
        )
        .unwrap();
    let u = b.declarator("U", 74, None).unwrap();
    let inner_typedef = b.simple_declaration(spec, vec![u]).unwrap();
    let inner_typedef = b.declaration_statement(inner_typedef).unwrap();
    let block = b
        .compound(vec![inner_typedef], Location::new(60, 17))
        .unwrap();

    let cast_spec = b.named_specifier("U", 78).unwrap();
    let operand = b.id_expression("a", 80).unwrap();
    let cast = b.cast(cast_spec, operand).unwrap();
    let as_expression = b.expression_statement(cast).unwrap();
    let decl_spec = b.named_specifier("U", 78).unwrap();
    let declarator = b.declarator("a", 80, None).unwrap();
    let declaration = b.simple_declaration(decl_spec, vec![declarator]).unwrap();
    let as_declaration = b.declaration_statement(declaration).unwrap();
    let amb = b
        .ambiguity(AmbiguityKind::Statement, vec![as_expression, as_declaration])
        .unwrap();

    let void = b.builtin(BuiltinType::Void, 50).unwrap();
    let g_declarator = b.function_declarator("g", 55, Vec::new()).unwrap();
    let g_body = b.compound(vec![block, amb], Location::new(58, 26)).unwrap();
    let g = b.function_definition(void, g_declarator, g_body).unwrap();
    let root = b.translation_unit(vec![outer_typedef, f, g]).unwrap();
    let mut arena = b.finish();

    let mut symbols = ScopedSymbolTable::new();
    let outcome = resolve_all(&mut arena, root, &mut symbols);

    // `U` is out of scope, so neither reading binds and the first one stays.
    assert_eq!(outcome.summary().stats.ambiguities_resolved, 2);
    assert_eq!(outcome.summary().stats.fallbacks, 1);
    let Some(NodeKind::CompoundStatement(g_body)) = arena.get(g_body) else {
        panic!("expected a compound statement");
    };
    assert_eq!(g_body.statements, vec![block, as_expression]);
    assert_eq!(symbols.current_scope_id(), 0);
    assert!(symbols.is_type("T"));
    assert!(!symbols.is_type("U"));
}

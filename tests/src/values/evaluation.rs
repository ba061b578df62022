use cdom::{analyze, AnalysisBuilder};
use cdom_ast::builder::TreeBuilder;
use cdom_ast::cancel::CancellationFlag;
use cdom_ast::nodes::{BinaryOperator, BuiltinType, Location, NodeId, TypeIdOperator};
use cdom_resolver::{ResolverConfig, ScopedSymbolTable};
use cdom_values::{EvaluatorConfig, Value};

use crate::utils::{factorial_definition, int_declaration};

/// `int fact(...) {...} int r = fact(<argument>);`
fn factorial_program(argument: &str) -> (TreeBuilder, NodeId) {
    let mut b = TreeBuilder::new("fact.c");
    let fact = factorial_definition(&mut b);
    let callee = b.id_expression("fact", 80).unwrap();
    let argument = b.integer(argument, 85).unwrap();
    let call = b.call(callee, vec![argument]).unwrap();
    let r = int_declaration(&mut b, "r", 72, Some(call));
    let root = b.translation_unit(vec![fact, r]).unwrap();
    (b, root)
}

fn evaluate_with_depth(b: TreeBuilder, root: NodeId, max_depth: u32) -> Option<Value> {
    let cancel = CancellationFlag::new();
    let analysis = AnalysisBuilder::resolve(
        b.finish(),
        root,
        &mut ScopedSymbolTable::new(),
        &ResolverConfig::default(),
        &cancel,
    )
    .unwrap()
    .collect_bindings()
    .unwrap()
    .evaluate(
        EvaluatorConfig {
            max_depth,
            ..EvaluatorConfig::default()
        },
        &cancel,
    );
    analysis.value_of("r")
}

#[test]
fn test_recursive_factorial_is_computed() {
    let (b, root) = factorial_program("5");
    let analysis = analyze(b.finish(), root).unwrap();
    assert_eq!(analysis.value_of("r"), Some(Value::Integer(120)));
}

#[test]
fn test_factorial_needs_one_depth_unit_per_call() {
    // r's initializer, then one unit for each of the five calls.
    let (b, root) = factorial_program("5");
    assert_eq!(evaluate_with_depth(b, root, 6), Some(Value::Integer(120)));
    let (b, root) = factorial_program("5");
    assert_eq!(evaluate_with_depth(b, root, 5), Some(Value::Unknown));
}

#[test]
fn test_chain_of_globals() {
    // int a = 3; int b = a + 4; int c = b * b - a;
    let mut b = TreeBuilder::new("chain.c");
    let three = b.integer("3", 8).unwrap();
    let a = int_declaration(&mut b, "a", 0, Some(three));
    let a_ref = b.id_expression("a", 20).unwrap();
    let four = b.integer("4", 24).unwrap();
    let sum = b.binary(BinaryOperator::Plus, a_ref, four).unwrap();
    let bee = int_declaration(&mut b, "b", 12, Some(sum));
    let b_ref = b.id_expression("b", 36).unwrap();
    let b_again = b.id_expression("b", 40).unwrap();
    let square = b.binary(BinaryOperator::Multiply, b_ref, b_again).unwrap();
    let a_ref = b.id_expression("a", 44).unwrap();
    let difference = b.binary(BinaryOperator::Minus, square, a_ref).unwrap();
    let c = int_declaration(&mut b, "c", 28, Some(difference));
    let root = b.translation_unit(vec![a, bee, c]).unwrap();

    let analysis = analyze(b.finish(), root).unwrap();
    assert_eq!(analysis.value_of("a"), Some(Value::Integer(3)));
    assert_eq!(analysis.value_of("b"), Some(Value::Integer(7)));
    assert_eq!(analysis.value_of("c"), Some(Value::Integer(46)));
    assert_eq!(analysis.evaluation.report().unknown_count(), 0);
}

#[test]
fn test_sizeof_in_a_conditional() {
    // int z = sizeof(int) == 4 ? 7 : 9;
    let mut b = TreeBuilder::new("sizeof.c");
    let int = b.builtin(BuiltinType::Int, 15).unwrap();
    let size = b
        .type_id(TypeIdOperator::Sizeof, int, Location::new(8, 11))
        .unwrap();
    let four = b.integer("4", 23).unwrap();
    let is_four = b.binary(BinaryOperator::Equals, size, four).unwrap();
    let seven = b.integer("7", 27).unwrap();
    let nine = b.integer("9", 31).unwrap();
    let choice = b.conditional(is_four, seven, nine).unwrap();
    let z = int_declaration(&mut b, "z", 0, Some(choice));
    let root = b.translation_unit(vec![z]).unwrap();

    let analysis = analyze(b.finish(), root).unwrap();
    assert_eq!(analysis.value_of("z"), Some(Value::Integer(7)));
}

#[test]
fn test_undeclared_names_evaluate_to_unknown() {
    // int u = missing + 1;
    let mut b = TreeBuilder::new("unknown.c");
    let missing = b.id_expression("missing", 8).unwrap();
    let one = b.integer("1", 18).unwrap();
    let sum = b.binary(BinaryOperator::Plus, missing, one).unwrap();
    let u = int_declaration(&mut b, "u", 0, Some(sum));
    let root = b.translation_unit(vec![u]).unwrap();

    let analysis = analyze(b.finish(), root).unwrap();
    assert_eq!(analysis.value_of("u"), Some(Value::Unknown));
    assert_eq!(analysis.evaluation.report().unknown_count(), 1);
}

/// ```c
/// int sum(int n) {
///     int total = 0;
///     int i = 1;
///     while (i <= n) { total = total + i; i = i + 1; }
///     return total;
/// }
/// ```
fn sum_definition(b: &mut TreeBuilder) -> NodeId {
    let int = b.builtin(BuiltinType::Int, 0).unwrap();
    let parameter_type = b.builtin(BuiltinType::Int, 8).unwrap();
    let n = b.declarator("n", 12, None).unwrap();
    let parameter = b.parameter(parameter_type, Some(n)).unwrap();
    let declarator = b.function_declarator("sum", 4, vec![parameter]).unwrap();

    let zero = b.integer("0", 33).unwrap();
    let total = int_declaration(b, "total", 21, Some(zero));
    let total = b.declaration_statement(total).unwrap();
    let one = b.integer("1", 48).unwrap();
    let i = int_declaration(b, "i", 40, Some(one));
    let i = b.declaration_statement(i).unwrap();

    let i_ref = b.id_expression("i", 58).unwrap();
    let n_ref = b.id_expression("n", 63).unwrap();
    let condition = b.binary(BinaryOperator::LessEqual, i_ref, n_ref).unwrap();

    let total_lhs = b.id_expression("total", 68).unwrap();
    let total_ref = b.id_expression("total", 76).unwrap();
    let i_ref = b.id_expression("i", 84).unwrap();
    let accumulated = b.binary(BinaryOperator::Plus, total_ref, i_ref).unwrap();
    let accumulate = b
        .binary(BinaryOperator::Assign, total_lhs, accumulated)
        .unwrap();
    let accumulate = b.expression_statement(accumulate).unwrap();
    let i_lhs = b.id_expression("i", 87).unwrap();
    let i_ref = b.id_expression("i", 91).unwrap();
    let one = b.integer("1", 95).unwrap();
    let incremented = b.binary(BinaryOperator::Plus, i_ref, one).unwrap();
    let increment = b.binary(BinaryOperator::Assign, i_lhs, incremented).unwrap();
    let increment = b.expression_statement(increment).unwrap();
    let loop_body = b
        .compound(vec![accumulate, increment], Location::new(66, 32))
        .unwrap();
    let repeat = b.while_statement(condition, loop_body).unwrap();

    let total_ref = b.id_expression("total", 111).unwrap();
    let finish = b
        .return_statement(Some(total_ref), Location::new(104, 13))
        .unwrap();
    let body = b
        .compound(vec![total, i, repeat, finish], Location::new(15, 104))
        .unwrap();
    b.function_definition(int, declarator, body).unwrap()
}

#[test]
fn test_loop_inside_a_function() {
    // int s = sum(10);
    let mut b = TreeBuilder::new("sum.c");
    let sum = sum_definition(&mut b);
    let callee = b.id_expression("sum", 128).unwrap();
    let ten = b.integer("10", 132).unwrap();
    let call = b.call(callee, vec![ten]).unwrap();
    let s = int_declaration(&mut b, "s", 120, Some(call));
    let root = b.translation_unit(vec![sum, s]).unwrap();

    let analysis = analyze(b.finish(), root).unwrap();
    assert_eq!(analysis.value_of("s"), Some(Value::Integer(55)));
}

#[test]
fn test_calls_with_the_wrong_arity_are_unknown() {
    // int r = fact(2, 3);
    let mut b = TreeBuilder::new("arity.c");
    let fact = factorial_definition(&mut b);
    let callee = b.id_expression("fact", 80).unwrap();
    let two = b.integer("2", 85).unwrap();
    let three = b.integer("3", 88).unwrap();
    let call = b.call(callee, vec![two, three]).unwrap();
    let r = int_declaration(&mut b, "r", 72, Some(call));
    let root = b.translation_unit(vec![fact, r]).unwrap();

    let analysis = analyze(b.finish(), root).unwrap();
    assert_eq!(analysis.value_of("r"), Some(Value::Unknown));
}

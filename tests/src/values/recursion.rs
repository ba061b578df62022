use std::cell::Cell;

use cdom::analyze;
use cdom_ast::builder::TreeBuilder;
use cdom_ast::cancel::CancellationFlag;
use cdom_ast::nodes::{BinaryOperator, BuiltinType, Location, NodeId};
use cdom_values::{
    Binding, BindingId, BindingSource, BindingTable, Evaluation, EvaluatorConfig, Value,
    ValueEvaluator, VariableBinding,
};

use crate::utils::int_declaration;

#[test]
fn test_self_initialized_global_gets_a_placeholder() {
    // int x = x;
    let mut b = TreeBuilder::new("self.c");
    let x_ref = b.id_expression("x", 8).unwrap();
    let x = int_declaration(&mut b, "x", 0, Some(x_ref));
    let root = b.translation_unit(vec![x]).unwrap();

    let analysis = analyze(b.finish(), root).unwrap();
    let table = &analysis.bindings.table;
    assert_eq!(table.placeholder_count(), 1);
    assert_eq!(table.len(), 2);
    assert_eq!(table.find_by_name("x").count(), 1);
    assert_eq!(analysis.value_of("x"), Some(Value::Unknown));

    let placeholder = table
        .iter()
        .find_map(|(_, binding)| match binding {
            Binding::RecursionResolving(placeholder) => Some(placeholder.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(placeholder.name, "x");
    assert_eq!(placeholder.requested_at, x_ref);
}

#[test]
fn test_self_initialized_local_gets_a_placeholder() {
    // void f() { int y = y + 1; }
    let mut b = TreeBuilder::new("local.c");
    let y_ref = b.id_expression("y", 19).unwrap();
    let one = b.integer("1", 23).unwrap();
    let sum = b.binary(BinaryOperator::Plus, y_ref, one).unwrap();
    let y = int_declaration(&mut b, "y", 11, Some(sum));
    let y = b.declaration_statement(y).unwrap();
    let body = b.compound(vec![y], Location::new(9, 17)).unwrap();
    let void = b.builtin(BuiltinType::Void, 0).unwrap();
    let declarator = b.function_declarator("f", 5, Vec::new()).unwrap();
    let f = b.function_definition(void, declarator, body).unwrap();
    let root = b.translation_unit(vec![f]).unwrap();

    let analysis = analyze(b.finish(), root).unwrap();
    assert_eq!(analysis.bindings.table.placeholder_count(), 1);
    assert_eq!(analysis.value_of("y"), Some(Value::Unknown));
}

/// `int <name>() { return <callee>(); }`
fn forwarding_function(b: &mut TreeBuilder, name: &str, callee: &str, offset: u32) -> NodeId {
    let int = b.builtin(BuiltinType::Int, offset).unwrap();
    let declarator = b.function_declarator(name, offset + 4, Vec::new()).unwrap();
    let callee = b.id_expression(callee, offset + 19).unwrap();
    let call = b.call(callee, Vec::new()).unwrap();
    let forward = b
        .return_statement(Some(call), Location::new(offset + 12, 11))
        .unwrap();
    let body = b
        .compound(vec![forward], Location::new(offset + 10, 15))
        .unwrap();
    b.function_definition(int, declarator, body).unwrap()
}

#[test]
fn test_mutually_recursive_functions_terminate() {
    // int g(); int f() { return g(); } int g() { return f(); } int r = f();
    let mut b = TreeBuilder::new("mutual.c");
    let int = b.builtin(BuiltinType::Int, 0).unwrap();
    let prototype = b.function_declarator("g", 4, Vec::new()).unwrap();
    let declaration = b.simple_declaration(int, vec![prototype]).unwrap();
    let f = forwarding_function(&mut b, "f", "g", 9);
    let g = forwarding_function(&mut b, "g", "f", 34);
    let callee = b.id_expression("f", 67).unwrap();
    let call = b.call(callee, Vec::new()).unwrap();
    let r = int_declaration(&mut b, "r", 59, Some(call));
    let root = b.translation_unit(vec![declaration, f, g, r]).unwrap();

    let analysis = analyze(b.finish(), root).unwrap();
    let bindings = &analysis.bindings;
    assert_eq!(bindings.table.placeholder_count(), 0);
    assert_eq!(bindings.table.find_by_name("g").count(), 1);
    assert_eq!(bindings.binding_for(prototype), bindings.lookup("g"));
    assert_eq!(analysis.value_of("r"), Some(Value::Unknown));

    let evaluator = ValueEvaluator::new(&bindings.table, EvaluatorConfig::default());
    let r = bindings.lookup("r").unwrap();
    assert_eq!(evaluator.initial_value(r, 1_000_000), Value::Unknown);
}

/// Delegates to a table and counts lookups.
struct CountingSource {
    table: BindingTable,
    lookups: Cell<usize>,
}

impl BindingSource for CountingSource {
    fn binding(&self, id: BindingId) -> Option<&Binding> {
        self.lookups.set(self.lookups.get() + 1);
        self.table.binding(id)
    }

    fn binding_ids(&self) -> Vec<BindingId> {
        self.table.binding_ids()
    }
}

fn variable(table: &mut BindingTable, name: &str, declared_at: NodeId) -> BindingId {
    table.insert(Binding::Variable(VariableBinding {
        name: name.to_string(),
        declared_at,
        initializer: None,
    }))
}

#[test]
fn test_cycle_lookups_are_bounded_by_depth() {
    // x = y + 1; y = x + 1
    let mut b = TreeBuilder::new("cycle.c");
    let x_declarator = b.declarator("x", 0, None).unwrap();
    let y_declarator = b.declarator("y", 4, None).unwrap();
    let mut table = BindingTable::new();
    let x = variable(&mut table, "x", x_declarator);
    let y = variable(&mut table, "y", y_declarator);
    for (from, to) in [(x, y), (y, x)] {
        if let Some(Binding::Variable(variable)) = table.get_mut(from) {
            variable.initializer = Some(Evaluation::binary(
                BinaryOperator::Plus,
                Evaluation::reference(to),
                Evaluation::fixed(Value::Integer(1)),
            ));
        }
    }
    let source = CountingSource {
        table,
        lookups: Cell::new(0),
    };
    let evaluator = ValueEvaluator::new(&source, EvaluatorConfig::default());

    for depth in [0, 1, 7, 40] {
        source.lookups.set(0);
        assert_eq!(evaluator.initial_value(x, depth), Value::Unknown);
        assert!(source.lookups.get() <= depth as usize);
    }

    let outcome = evaluator.evaluate_all(&CancellationFlag::new());
    assert_eq!(outcome.report().values.len(), 2);
    assert_eq!(outcome.report().unknown_count(), 2);
}

#[test]
fn test_cycle_with_a_huge_depth_returns_quickly() {
    // x = y + 1; y = x + 1; evaluated with a budget far above any stack
    let mut b = TreeBuilder::new("deep_cycle.c");
    let x_declarator = b.declarator("x", 0, None).unwrap();
    let y_declarator = b.declarator("y", 4, None).unwrap();
    let mut table = BindingTable::new();
    let x = variable(&mut table, "x", x_declarator);
    let y = variable(&mut table, "y", y_declarator);
    for (from, to) in [(x, y), (y, x)] {
        if let Some(Binding::Variable(variable)) = table.get_mut(from) {
            variable.initializer = Some(Evaluation::binary(
                BinaryOperator::Plus,
                Evaluation::reference(to),
                Evaluation::fixed(Value::Integer(1)),
            ));
        }
    }
    let source = CountingSource {
        table,
        lookups: Cell::new(0),
    };
    let evaluator = ValueEvaluator::new(
        &source,
        EvaluatorConfig {
            max_depth: 1_000_000,
            ..EvaluatorConfig::default()
        },
    );

    assert_eq!(evaluator.initial_value(x, 1_000_000), Value::Unknown);
    assert!(source.lookups.get() <= 3);

    let outcome = evaluator.evaluate_all(&CancellationFlag::new());
    assert_eq!(outcome.report().unknown_count(), 2);
}

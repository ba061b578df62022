use cdom_ast::builder::TreeBuilder;
use cdom_ast::errors::AstError;
use cdom_ast::nodes::{AmbiguityKind, BinaryOperator, Location, NodeCategory, NodeKind, SlotRole};

use crate::utils::cast_or_declaration;

#[test]
fn test_replace_keeps_statement_order() {
    let mut b = TreeBuilder::new("replace.c");
    let before = b.null_statement(0).unwrap();
    let statement = cast_or_declaration(&mut b, 2);
    let after = b.null_statement(8).unwrap();
    let block = b
        .compound(vec![before, statement.ambiguity, after], Location::new(0, 10))
        .unwrap();
    let mut arena = b.finish();

    let candidates = arena.take_candidates(statement.ambiguity).unwrap();
    assert_eq!(
        candidates,
        vec![statement.as_expression, statement.as_declaration]
    );
    let role = arena
        .replace_child(block, statement.ambiguity, statement.as_declaration)
        .unwrap();

    assert_eq!(role, SlotRole::Statement(1));
    let Some(NodeKind::CompoundStatement(compound)) = arena.get(block) else {
        panic!("expected a compound statement");
    };
    assert_eq!(
        compound.statements,
        vec![before, statement.as_declaration, after]
    );
    assert_eq!(arena.parent(statement.as_declaration), Some(block));
    assert_eq!(arena.role(statement.as_declaration), Some(SlotRole::Statement(1)));
    assert!(arena.parent(statement.ambiguity).is_none());
    assert!(arena.parent(statement.as_expression).is_none());
}

#[test]
fn test_resolving_an_ambiguity_keeps_the_winner_in_place() {
    let mut b = TreeBuilder::new("replace.c");
    let before = b.null_statement(0).unwrap();
    let statement = cast_or_declaration(&mut b, 2);
    let block = b
        .compound(vec![before, statement.ambiguity], Location::new(0, 10))
        .unwrap();
    let mut arena = b.finish();

    let losers = arena
        .resolve_ambiguity(statement.ambiguity, statement.as_declaration)
        .unwrap();
    assert_eq!(losers, vec![statement.as_expression]);
    assert_eq!(
        arena.children(block),
        vec![
            (SlotRole::Statement(0), before),
            (SlotRole::Statement(1), statement.as_declaration)
        ]
    );
    assert!(arena.parent(statement.ambiguity).is_none());
    assert!(arena.parent(statement.as_expression).is_none());
    assert!(arena.candidates(statement.ambiguity).unwrap().is_empty());
}

#[test]
fn test_failed_resolution_changes_nothing() {
    let mut b = TreeBuilder::new("replace.c");
    let inner = cast_or_declaration(&mut b, 0);
    let other = b.null_statement(6).unwrap();
    let outer = b
        .ambiguity(AmbiguityKind::Statement, vec![inner.ambiguity, other])
        .unwrap();
    let block = b.compound(vec![outer], Location::new(0, 8)).unwrap();
    let stranger = b.null_statement(9).unwrap();
    let mut arena = b.finish();
    let nodes = arena.len();

    // An ambiguous node has no slot its candidates could be swapped into.
    assert!(matches!(
        arena.resolve_ambiguity(inner.ambiguity, inner.as_expression),
        Err(AstError::NotAnAmbiguityParent { node, .. }) if node == outer
    ));
    assert_eq!(
        arena.resolve_ambiguity(outer, stranger).unwrap_err(),
        AstError::ChildNotFound {
            parent: outer,
            child: stranger
        }
    );

    assert_eq!(arena.len(), nodes);
    assert_eq!(
        arena.candidates(inner.ambiguity).unwrap(),
        &[inner.as_expression, inner.as_declaration]
    );
    assert_eq!(arena.parent(inner.as_declaration), Some(inner.ambiguity));
    assert_eq!(arena.candidates(outer).unwrap(), &[inner.ambiguity, other]);
    assert_eq!(arena.parent(outer), Some(block));
    assert!(arena.parent(stranger).is_none());
}

#[test]
fn test_replace_rejects_a_grandchild() {
    let mut b = TreeBuilder::new("replace.c");
    let x = b.id_expression("x", 0).unwrap();
    let y = b.id_expression("y", 4).unwrap();
    let sum = b.binary(BinaryOperator::Plus, x, y).unwrap();
    let statement = b.expression_statement(sum).unwrap();
    let z = b.id_expression("z", 8).unwrap();
    let mut arena = b.finish();

    let error = arena.replace_child(statement, x, z).unwrap_err();
    assert_eq!(
        error,
        AstError::ChildNotFound {
            parent: statement,
            child: x
        }
    );
    assert!(arena.parent(z).is_none());
}

#[test]
fn test_replace_rejects_a_node_of_another_category() {
    let mut b = TreeBuilder::new("replace.c");
    let x = b.id_expression("x", 0).unwrap();
    let statement = b.expression_statement(x).unwrap();
    let stray = b.null_statement(4).unwrap();
    let mut arena = b.finish();

    let error = arena.replace_child(statement, x, stray).unwrap_err();
    assert_eq!(
        error,
        AstError::CategoryMismatch {
            node: stray,
            expected: NodeCategory::Expression,
            found: NodeCategory::Statement
        }
    );
    assert_eq!(arena.parent(x), Some(statement));
}

#[test]
fn test_replace_rejects_an_attached_node() {
    let mut b = TreeBuilder::new("replace.c");
    let x = b.id_expression("x", 0).unwrap();
    let first = b.expression_statement(x).unwrap();
    let y = b.id_expression("y", 3).unwrap();
    let second = b.expression_statement(y).unwrap();
    let _block = b.compound(vec![first, second], Location::new(0, 6)).unwrap();
    let mut arena = b.finish();

    assert!(matches!(
        arena.replace_child(first, x, y),
        Err(AstError::AlreadyAttached { node, .. }) if node == y
    ));
}

#[test]
fn test_candidates_must_share_a_category() {
    let mut b = TreeBuilder::new("replace.c");
    let x = b.id_expression("x", 0).unwrap();
    let y = b.id_expression("y", 0).unwrap();
    let amb = b.ambiguity(AmbiguityKind::Expression, vec![x, y]).unwrap();
    let stray = b.null_statement(0).unwrap();
    let arena = b.arena_mut();

    assert!(matches!(
        arena.add_candidate(amb, stray),
        Err(AstError::CategoryMismatch {
            expected: NodeCategory::Expression,
            found: NodeCategory::Statement,
            ..
        })
    ));
    let z = b.id_expression("z", 0).unwrap();
    b.arena_mut().add_candidate(amb, z).unwrap();
    assert_eq!(b.arena().candidates(amb).unwrap(), &[x, y, z]);
    assert_eq!(b.arena().role(z), Some(SlotRole::Candidate(2)));
}

#[test]
fn test_single_candidate_ambiguity_is_rejected() {
    let mut b = TreeBuilder::new("replace.c");
    let x = b.id_expression("x", 0).unwrap();
    assert_eq!(
        b.ambiguity(AmbiguityKind::Expression, vec![x]).unwrap_err(),
        AstError::TooFewCandidates { found: 1 }
    );
    assert!(b.arena().parent(x).is_none());
}

#[test]
fn test_a_child_cannot_fill_two_slots() {
    let mut b = TreeBuilder::new("replace.c");
    let a = b.id_expression("a", 0).unwrap();
    let nodes = b.arena().len();

    assert_eq!(
        b.binary(BinaryOperator::Plus, a, a).unwrap_err(),
        AstError::DuplicateChild {
            node: a,
            first: SlotRole::Lhs,
            second: SlotRole::Rhs,
        }
    );
    assert!(matches!(
        b.ambiguity(AmbiguityKind::Expression, vec![a, a]),
        Err(AstError::DuplicateChild { node, .. }) if node == a
    ));
    assert_eq!(b.arena().len(), nodes);
    assert!(b.arena().parent(a).is_none());

    let one = b.integer("1", 4).unwrap();
    b.binary(BinaryOperator::Plus, a, one).unwrap();
    assert_eq!(b.arena().role(a), Some(SlotRole::Lhs));
}

#[test]
fn test_ambiguous_nodes_report_their_own_category() {
    let mut b = TreeBuilder::new("replace.c");
    let statement = cast_or_declaration(&mut b, 0);
    let arena = b.finish();
    let kind = arena.kind(statement.ambiguity).unwrap();
    assert_eq!(kind.category(), NodeCategory::Ambiguity);
    assert_eq!(kind.slot_category(), NodeCategory::Statement);
    assert_eq!(
        arena.ambiguity_kind_of(statement.ambiguity).unwrap(),
        AmbiguityKind::Statement
    );
}

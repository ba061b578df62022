use cdom_ast::arena::AstArena;
use cdom_ast::builder::TreeBuilder;
use cdom_ast::nodes::{AmbiguityKind, Location, NodeId, NodeKind, SlotRole};
use cdom_resolver::{BindFailure, CandidateOutcome};
use rustc_hash::FxHashSet;

use crate::utils::resolve_all;

fn expression_image(arena: &AstArena, statement: NodeId) -> String {
    let Some(NodeKind::ExpressionStatement(statement)) = arena.get(statement) else {
        panic!("expected an expression statement");
    };
    let Some(NodeKind::IdExpression(id)) = arena.get(statement.expression) else {
        panic!("expected an id expression");
    };
    arena.name_image(id.name).unwrap_or_default().to_string()
}

fn named_statement(b: &mut TreeBuilder, image: &str, offset: u32) -> NodeId {
    let id = b.id_expression(image, offset).unwrap();
    b.expression_statement(id).unwrap()
}

/// A context under which only the listed names bind.
fn binds_only(names: &'static [&'static str]) -> impl FnMut(&AstArena, NodeId) -> CandidateOutcome {
    move |arena, candidate| {
        let image = expression_image(arena, candidate);
        if names.contains(&image.as_str()) {
            CandidateOutcome::bound()
        } else {
            CandidateOutcome::Unbound(BindFailure::Undeclared(image))
        }
    }
}

#[test]
fn test_only_second_candidate_binds() {
    let mut b = TreeBuilder::new("f.c");
    let a = named_statement(&mut b, "a", 2);
    let bee = named_statement(&mut b, "b", 2);
    let amb = b.ambiguity(AmbiguityKind::Statement, vec![a, bee]).unwrap();
    let block = b.compound(vec![amb], Location::new(0, 5)).unwrap();
    let mut arena = b.finish();

    let mut context = binds_only(&["b"]);
    resolve_all(&mut arena, block, &mut context);

    assert_eq!(arena.children(block), vec![(SlotRole::Statement(0), bee)]);
    assert_eq!(arena.parent(bee), Some(block));
    assert!(!arena.contains(a));
    assert!(!arena.descendants(block).contains(&a));
}

#[test]
fn test_no_candidate_binds_keeps_the_first_of_three() {
    let mut b = TreeBuilder::new("f.c");
    let first = named_statement(&mut b, "p", 2);
    let second = named_statement(&mut b, "q", 2);
    let third = named_statement(&mut b, "r", 2);
    let amb = b
        .ambiguity(AmbiguityKind::Statement, vec![first, second, third])
        .unwrap();
    let block = b.compound(vec![amb], Location::new(0, 5)).unwrap();
    let mut arena = b.finish();

    let mut context = binds_only(&[]);
    let outcome = resolve_all(&mut arena, block, &mut context);

    assert_eq!(arena.children(block)[0].1, first);
    assert_eq!(outcome.summary().stats.fallbacks, 1);
    assert_eq!(outcome.summary().stats.candidates_discarded, 2);
    assert!(!arena.contains(second));
    assert!(!arena.contains(third));
}

#[test]
fn test_rejected_candidates_are_never_resolved() {
    // Outer statement ambiguity [loser, winner]; the loser is a block that
    // holds its own ambiguity, which must never be looked at.
    let mut b = TreeBuilder::new("f.c");
    let inner_a = named_statement(&mut b, "inner_a", 4);
    let inner_b = named_statement(&mut b, "inner_b", 4);
    let inner = b
        .ambiguity(AmbiguityKind::Statement, vec![inner_a, inner_b])
        .unwrap();
    let loser = b.compound(vec![inner], Location::new(2, 12)).unwrap();
    let winner = named_statement(&mut b, "w", 2);
    let outer = b
        .ambiguity(AmbiguityKind::Statement, vec![loser, winner])
        .unwrap();
    let block = b.compound(vec![outer], Location::new(0, 16)).unwrap();
    let mut arena = b.finish();

    let mut asked = FxHashSet::default();
    let mut context = |arena: &AstArena, candidate: NodeId| {
        asked.insert(candidate);
        match arena.get(candidate) {
            Some(NodeKind::ExpressionStatement(_)) => CandidateOutcome::bound(),
            _ => CandidateOutcome::Unbound(BindFailure::Other("not an expression".into())),
        }
    };
    let outcome = resolve_all(&mut arena, block, &mut context);

    assert_eq!(outcome.summary().stats.ambiguities_resolved, 1);
    assert!(asked.contains(&loser));
    assert!(!asked.contains(&inner_a));
    assert!(!asked.contains(&inner_b));
    assert!(!arena.contains(inner));
    assert_eq!(arena.children(block)[0].1, winner);
}

#[test]
fn test_ambiguities_inside_the_winner_are_resolved() {
    let mut b = TreeBuilder::new("f.c");
    let inner_a = named_statement(&mut b, "x", 4);
    let inner_b = named_statement(&mut b, "y", 4);
    let inner = b
        .ambiguity(AmbiguityKind::Statement, vec![inner_a, inner_b])
        .unwrap();
    let nested_block = b.compound(vec![inner], Location::new(2, 6)).unwrap();
    let other = b.null_statement(9).unwrap();
    let outer = b
        .ambiguity(AmbiguityKind::Statement, vec![nested_block, other])
        .unwrap();
    let block = b.compound(vec![outer], Location::new(0, 12)).unwrap();
    let mut arena = b.finish();

    let mut context = |arena: &AstArena, candidate: NodeId| match arena.get(candidate) {
        Some(NodeKind::CompoundStatement(_)) => CandidateOutcome::bound(),
        Some(NodeKind::ExpressionStatement(_)) if expression_image(arena, candidate) == "y" => {
            CandidateOutcome::bound()
        }
        _ => CandidateOutcome::Unbound(BindFailure::Other("rejected".into())),
    };
    let outcome = resolve_all(&mut arena, block, &mut context);

    assert_eq!(outcome.summary().stats.ambiguities_resolved, 2);
    assert_eq!(arena.children(block)[0].1, nested_block);
    assert_eq!(arena.children(nested_block)[0].1, inner_b);
    assert_eq!(arena.count_ambiguities(block), 0);
}

#[test]
fn test_nested_ambiguity_as_winner_is_settled_in_place() {
    // An ambiguity whose winning candidate is itself ambiguous.
    let mut b = TreeBuilder::new("f.c");
    let x = named_statement(&mut b, "x", 2);
    let y = named_statement(&mut b, "y", 2);
    let inner = b.ambiguity(AmbiguityKind::Statement, vec![x, y]).unwrap();
    let z = named_statement(&mut b, "z", 2);
    let outer = b.ambiguity(AmbiguityKind::Statement, vec![inner, z]).unwrap();
    let block = b.compound(vec![outer], Location::new(0, 5)).unwrap();
    let mut arena = b.finish();

    let mut context = |arena: &AstArena, candidate: NodeId| {
        if arena.kind(candidate).unwrap().is_ambiguous() {
            return CandidateOutcome::Bound { rank: 1 };
        }
        if expression_image(arena, candidate) == "y" {
            CandidateOutcome::bound()
        } else {
            CandidateOutcome::Unbound(BindFailure::Other("rejected".into()))
        }
    };
    resolve_all(&mut arena, block, &mut context);

    assert_eq!(arena.children(block)[0].1, y);
    assert_eq!(arena.parent(y), Some(block));
    assert!(!arena.contains(inner));
    assert!(!arena.contains(z));
}

#![warn(clippy::pedantic)]
//! Ambiguity resolution for the cdom syntax tree.
//!
//! The grammar layer builds ambiguous nodes wherever it cannot commit to one
//! production. [`resolve`] collapses each of them to a single candidate with
//! the help of a [`SemanticContext`]; the built-in [`ScopedSymbolTable`] is a
//! context that tracks typedef, variable and function names.
//!
//! ```
//! use cdom_ast::builder::TreeBuilder;
//! use cdom_ast::cancel::CancellationFlag;
//! use cdom_ast::nodes::AmbiguityKind;
//! use cdom_resolver::{resolve, ResolverConfig, ScopedSymbolTable};
//!
//! let mut b = TreeBuilder::new("t.cpp");
//! let spec = b.named_specifier("T", 0).unwrap();
//! let operand = b.id_expression("a", 2).unwrap();
//! let cast = b.cast(spec, operand).unwrap();
//! let as_expr = b.expression_statement(cast).unwrap();
//! let spec = b.named_specifier("T", 0).unwrap();
//! let declarator = b.declarator("a", 2, None).unwrap();
//! let declaration = b.simple_declaration(spec, vec![declarator]).unwrap();
//! let as_decl = b.declaration_statement(declaration).unwrap();
//! let amb = b.ambiguity(AmbiguityKind::Statement, vec![as_expr, as_decl]).unwrap();
//! let mut arena = b.finish();
//!
//! let mut table = ScopedSymbolTable::new();
//! table.register_type("T", None);
//! let outcome = resolve(
//!     &mut arena,
//!     amb,
//!     &mut table,
//!     &ResolverConfig::default(),
//!     &CancellationFlag::new(),
//! )
//! .unwrap();
//! assert_eq!(outcome.root(), as_decl);
//! ```

pub mod context;
pub mod errors;
pub mod policy;
pub mod resolver;
pub mod symbol_table;

pub use context::{BindFailure, CandidateOutcome, SemanticContext};
pub use errors::ResolveError;
pub use policy::{CandidateShape, ResolverConfig, TieBreakPolicy};
pub use resolver::{resolve, ResolveOutcome, ResolveStats, ResolveSummary, Resolver};
pub use symbol_table::{ScopedSymbolTable, Symbol, SymbolKind};

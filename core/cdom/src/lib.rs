#![warn(clippy::pedantic)]
//! Orchestration crate for the cdom analysis pipeline.
//!
//! A syntax tree produced by the grammar layer may still contain ambiguous
//! nodes. This crate runs the passes that turn it into something a front end
//! can use:
//!
//! ```text
//! ambiguous tree → resolve → collect bindings → evaluate
//! ```
//!
//! Each pass is a state of [`AnalysisBuilder`], so bindings cannot be collected
//! from an unresolved tree and values cannot be computed before bindings exist.
//!
//! ## Quick Start
//!
//! ```rust
//! use cdom::analyze;
//! use cdom_ast::builder::TreeBuilder;
//! use cdom_ast::nodes::{BinaryOperator, BuiltinType};
//! use cdom_values::Value;
//!
//! // int x = 2; int y = x * 21;
//! let mut b = TreeBuilder::new("quick.c");
//! let int = b.builtin(BuiltinType::Int, 0)?;
//! let two = b.integer("2", 8)?;
//! let x = b.declarator("x", 4, Some(two))?;
//! let first = b.simple_declaration(int, vec![x])?;
//! let int = b.builtin(BuiltinType::Int, 11)?;
//! let x_ref = b.id_expression("x", 19)?;
//! let factor = b.integer("21", 23)?;
//! let product = b.binary(BinaryOperator::Multiply, x_ref, factor)?;
//! let y = b.declarator("y", 15, Some(product))?;
//! let second = b.simple_declaration(int, vec![y])?;
//! let root = b.translation_unit(vec![first, second])?;
//!
//! let analysis = analyze(b.finish(), root)?;
//! assert_eq!(analysis.value_of("y"), Some(Value::Integer(42)));
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Every entry point returns `anyhow::Result`. Errors are reserved for misuse
//! and inconsistent trees; an ambiguity no candidate can bind, a cycle between
//! initializers or an exhausted evaluation budget are ordinary outcomes.
//! Cancellation surfaces as an error only when a later pass needs the result
//! of the cancelled one.

use std::marker::PhantomData;

use cdom_ast::arena::AstArena;
use cdom_ast::cancel::CancellationFlag;
use cdom_ast::nodes::NodeId;
use cdom_resolver::{ResolveOutcome, ResolverConfig, ScopedSymbolTable, SemanticContext};
use cdom_values::{
    BindingCollector, CollectedBindings, EvaluationOutcome, EvaluatorConfig, Value, ValueEvaluator,
};
use tracing::info;

pub use cdom_ast as ast;
pub use cdom_resolver as resolver;
pub use cdom_values as values;

/// Marker state: ambiguities have been resolved.
pub struct Resolved;

/// Marker state: bindings have been collected from the resolved tree.
pub struct Collected;

/// Runs the analysis passes in order.
///
/// Uses the typestate pattern so each pass only accepts the output of the
/// previous one.
pub struct AnalysisBuilder<S> {
    arena: AstArena,
    resolution: ResolveOutcome,
    bindings: CollectedBindings,
    _state: PhantomData<S>,
}

impl AnalysisBuilder<Resolved> {
    /// Resolves every ambiguity under `root` with `context`.
    ///
    /// # Errors
    ///
    /// Returns an error when the tree is inconsistent or when the pass ended
    /// without cancellation but with ambiguous nodes left.
    pub fn resolve<C: SemanticContext>(
        mut arena: AstArena,
        root: NodeId,
        context: &mut C,
        config: &ResolverConfig,
        cancel: &CancellationFlag,
    ) -> anyhow::Result<Self> {
        let resolution = cdom_resolver::resolve(&mut arena, root, context, config, cancel)?;
        Ok(AnalysisBuilder {
            arena,
            resolution,
            bindings: CollectedBindings::default(),
            _state: PhantomData,
        })
    }

    #[must_use]
    pub fn resolution(&self) -> &ResolveOutcome {
        &self.resolution
    }

    #[must_use]
    pub fn arena(&self) -> &AstArena {
        &self.arena
    }

    /// Gives the tree back, for example to resolve it again after a
    /// cancelled pass.
    #[must_use = "consumes builder and returns the arena"]
    pub fn into_arena(self) -> AstArena {
        self.arena
    }

    /// Collects variable and function bindings from the resolved tree.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution was cancelled or the tree cannot be
    /// walked.
    #[must_use = "returns builder with collected bindings, evaluate with .evaluate()"]
    pub fn collect_bindings(self) -> anyhow::Result<AnalysisBuilder<Collected>> {
        if self.resolution.is_cancelled() {
            anyhow::bail!("resolution was cancelled; the tree may still contain ambiguous nodes");
        }
        let bindings = BindingCollector::new(&self.arena).collect(self.resolution.root())?;
        Ok(AnalysisBuilder {
            arena: self.arena,
            resolution: self.resolution,
            bindings,
            _state: PhantomData,
        })
    }
}

impl AnalysisBuilder<Collected> {
    #[must_use]
    pub fn bindings(&self) -> &CollectedBindings {
        &self.bindings
    }

    /// Computes the value of every variable binding.
    ///
    /// A cancelled evaluation still produces an [`Analysis`]; its
    /// [`Analysis::evaluation`] reports the cancellation and holds the values
    /// computed before it.
    #[must_use = "consumes builder and returns the analysis"]
    pub fn evaluate(self, config: EvaluatorConfig, cancel: &CancellationFlag) -> Analysis {
        let evaluation = ValueEvaluator::new(&self.bindings.table, config).evaluate_all(cancel);
        info!(
            resolved = self.resolution.summary().stats.ambiguities_resolved,
            bindings = self.bindings.table.len(),
            cancelled = evaluation.is_cancelled(),
            "analysis finished"
        );
        Analysis {
            arena: self.arena,
            resolution: self.resolution,
            bindings: self.bindings,
            evaluation,
        }
    }
}

/// Result of a full analysis run.
pub struct Analysis {
    pub arena: AstArena,
    pub resolution: ResolveOutcome,
    pub bindings: CollectedBindings,
    pub evaluation: EvaluationOutcome,
}

impl Analysis {
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.resolution.root()
    }

    /// Value computed for the file-scope variable `name`.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<Value> {
        let binding = self.bindings.lookup(name)?;
        self.evaluation.report().value_of(binding)
    }
}

/// Runs every pass with the built-in symbol table and default configuration.
///
/// # Errors
///
/// See [`AnalysisBuilder::resolve`] and [`AnalysisBuilder::collect_bindings`].
pub fn analyze(arena: AstArena, root: NodeId) -> anyhow::Result<Analysis> {
    let cancel = CancellationFlag::new();
    let mut symbols = ScopedSymbolTable::new();
    let analysis = AnalysisBuilder::resolve(
        arena,
        root,
        &mut symbols,
        &ResolverConfig::default(),
        &cancel,
    )?
    .collect_bindings()?
    .evaluate(EvaluatorConfig::default(), &cancel);
    Ok(analysis)
}

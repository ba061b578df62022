#![warn(clippy::pedantic)]
//! Compile-time values of a resolved cdom tree.
//!
//! [`BindingCollector`] turns variables and functions into [`Binding`]s whose
//! initializers and bodies are reduced to [`Evaluation`] and [`Execution`]
//! trees. [`ValueEvaluator`] computes their values under a depth budget, and
//! [`marshal`] stores evaluations in a compact binary form.

pub mod binding;
pub mod collector;
pub mod errors;
pub mod evaluation;
pub mod evaluator;
pub mod marshal;
pub mod value;

pub use binding::{
    Binding, BindingId, BindingSource, BindingTable, FunctionBinding, RecursionResolvingBinding,
    VariableBinding,
};
pub use collector::{BindingCollector, CollectedBindings};
pub use errors::{CollectError, MarshalError};
pub use evaluation::{Evaluation, Execution};
pub use evaluator::{
    EvaluationOutcome, EvaluationReport, EvaluatorConfig, ValueEvaluator, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_STEPS,
};
pub use marshal::{
    unmarshal_evaluation, unmarshal_execution, unmarshal_value, ByteBuffer, ByteReader,
    MarshalBuffer, MARSHAL_VERSION, MAX_NESTING,
};
pub use value::Value;

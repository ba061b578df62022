//! Depth-bounded evaluation of binding values.
//!
//! Every hop to another binding's value and every function call costs one
//! unit of the depth budget. A budget of zero yields [`Value::Unknown`], so
//! self-referential and mutually recursive definitions always terminate. Loop
//! iterations and statements inside one function execution are capped by
//! `max_steps` in the same way.
//!
//! A variable whose initializer is already being evaluated further up the
//! chain yields [`Value::Unknown`] immediately, and so does a call repeating
//! an active call with the same arguments. Cycles between globals and
//! argument-preserving mutual recursion therefore stay shallow whatever the
//! depth budget.

use std::cell::RefCell;

use cdom_ast::cancel::CancellationFlag;
use cdom_ast::nodes::BinaryOperator;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{info, trace};

use crate::binding::{Binding, BindingId, BindingSource};
use crate::evaluation::{Evaluation, Execution};
use crate::value::Value;

pub const DEFAULT_MAX_DEPTH: u32 = 25;
pub const DEFAULT_MAX_STEPS: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatorConfig {
    pub max_depth: u32,
    pub max_steps: u32,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationReport {
    /// Value of every variable, in binding order.
    pub values: Vec<(BindingId, Value)>,
}

impl EvaluationReport {
    #[must_use]
    pub fn value_of(&self, binding: BindingId) -> Option<Value> {
        self.values
            .iter()
            .find(|(id, _)| *id == binding)
            .map(|(_, value)| *value)
    }

    #[must_use]
    pub fn unknown_count(&self) -> usize {
        self.values.iter().filter(|(_, value)| value.is_unknown()).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    Completed(EvaluationReport),
    /// Stopped early; the report holds the values computed so far.
    Cancelled(EvaluationReport),
}

impl EvaluationOutcome {
    #[must_use]
    pub fn report(&self) -> &EvaluationReport {
        match self {
            EvaluationOutcome::Completed(report) | EvaluationOutcome::Cancelled(report) => report,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EvaluationOutcome::Cancelled(_))
    }
}

/// Local variables of one function activation.
type Frame = FxHashMap<BindingId, Value>;

enum Flow {
    Normal,
    Break,
    Return(Value),
    /// A condition could not be decided.
    Indeterminate,
}

struct StepsExhausted;

pub struct ValueEvaluator<'a, S: BindingSource + ?Sized> {
    source: &'a S,
    config: EvaluatorConfig,
    /// Variables whose initializers are being evaluated.
    in_progress: RefCell<FxHashSet<BindingId>>,
    /// Calls being executed, innermost last.
    active_calls: RefCell<Vec<(BindingId, Vec<Value>)>>,
}

impl<'a, S: BindingSource + ?Sized> ValueEvaluator<'a, S> {
    pub fn new(source: &'a S, config: EvaluatorConfig) -> Self {
        Self {
            source,
            config,
            in_progress: RefCell::default(),
            active_calls: RefCell::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> EvaluatorConfig {
        self.config
    }

    /// Value of `binding`'s initializer, or `Unknown` once `max_depth`
    /// reaches zero along the chain of dependencies or `binding` depends on
    /// itself.
    #[must_use]
    pub fn initial_value(&self, binding: BindingId, max_depth: u32) -> Value {
        if max_depth == 0 {
            trace!(binding = %binding, "depth budget exhausted");
            return Value::Unknown;
        }
        match self.source.binding(binding) {
            Some(Binding::Variable(variable)) => match &variable.initializer {
                Some(initializer) => {
                    if !self.in_progress.borrow_mut().insert(binding) {
                        trace!(binding = %binding, "cyclic initializer");
                        return Value::Unknown;
                    }
                    let value = self.eval(initializer, max_depth - 1, &mut Frame::default());
                    self.in_progress.borrow_mut().remove(&binding);
                    value
                }
                None => Value::Unknown,
            },
            Some(Binding::RecursionResolving(placeholder)) => {
                trace!(name = %placeholder.name, "recursion-resolving binding has no value");
                Value::Unknown
            }
            Some(Binding::Function(_)) | None => Value::Unknown,
        }
    }

    /// Value of `evaluation`; references to other bindings cost one depth unit each.
    #[must_use]
    pub fn evaluate(&self, evaluation: &Evaluation, max_depth: u32) -> Value {
        self.eval(evaluation, max_depth, &mut Frame::default())
    }

    /// Fills every missing nested value of `evaluation` with the value the
    /// evaluator would use for it.
    pub fn annotate(&self, evaluation: &mut Evaluation, max_depth: u32) {
        evaluation.supply_values(&mut |binding| Some(self.initial_value(binding, max_depth)));
    }

    /// Computes the value of every variable with the configured depth budget.
    ///
    /// The flag is checked before each binding.
    pub fn evaluate_all(&self, cancel: &CancellationFlag) -> EvaluationOutcome {
        let mut report = EvaluationReport::default();
        for binding in self.source.binding_ids() {
            if !matches!(self.source.binding(binding), Some(Binding::Variable(_))) {
                continue;
            }
            if cancel.is_cancelled() {
                info!(evaluated = report.values.len(), "evaluation cancelled");
                return EvaluationOutcome::Cancelled(report);
            }
            let value = self.initial_value(binding, self.config.max_depth);
            report.values.push((binding, value));
        }
        info!(
            evaluated = report.values.len(),
            unknown = report.unknown_count(),
            "evaluation finished"
        );
        EvaluationOutcome::Completed(report)
    }

    fn eval(&self, evaluation: &Evaluation, depth: u32, frame: &mut Frame) -> Value {
        match evaluation {
            Evaluation::Fixed(value) => *value,
            Evaluation::Binding { binding, value } => match frame.get(binding) {
                Some(local) => *local,
                None => value.unwrap_or_else(|| self.initial_value(*binding, depth)),
            },
            Evaluation::Unary { operator, operand } => {
                self.eval(operand, depth, frame).unary(*operator)
            }
            Evaluation::Binary {
                operator: BinaryOperator::Assign,
                lhs,
                rhs,
            } => {
                let value = self.eval(rhs, depth, frame);
                match lhs.as_ref() {
                    Evaluation::Binding { binding, .. } => {
                        frame.insert(*binding, value);
                        value
                    }
                    _ => Value::Unknown,
                }
            }
            Evaluation::Binary {
                operator: operator @ (BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr),
                lhs,
                rhs,
            } => {
                let Some(lhs) = self.eval(lhs, depth, frame).truth() else {
                    return Value::Unknown;
                };
                let short_circuits = match operator {
                    BinaryOperator::LogicalAnd => !lhs,
                    _ => lhs,
                };
                if short_circuits {
                    return Value::Integer(i64::from(lhs));
                }
                self.eval(rhs, depth, frame)
                    .truth()
                    .map_or(Value::Unknown, |rhs| Value::Integer(i64::from(rhs)))
            }
            Evaluation::Binary { operator, lhs, rhs } => {
                let lhs = self.eval(lhs, depth, frame);
                let rhs = self.eval(rhs, depth, frame);
                lhs.binary(*operator, rhs)
            }
            Evaluation::Conditional {
                condition,
                positive,
                negative,
            } => match self.eval(condition, depth, frame).truth() {
                Some(true) => self.eval(positive, depth, frame),
                Some(false) => self.eval(negative, depth, frame),
                None => Value::Unknown,
            },
            Evaluation::Call {
                function,
                arguments,
            } => {
                let arguments: Vec<Value> = arguments
                    .iter()
                    .map(|argument| self.eval(argument, depth, frame))
                    .collect();
                self.call(*function, &arguments, depth)
            }
        }
    }

    fn call(&self, function: BindingId, arguments: &[Value], depth: u32) -> Value {
        if depth == 0 {
            trace!(function = %function, "depth budget exhausted at call");
            return Value::Unknown;
        }
        let Some(Binding::Function(callee)) = self.source.binding(function) else {
            return Value::Unknown;
        };
        let Some(body) = &callee.body else {
            return Value::Unknown;
        };
        if callee.parameters.len() != arguments.len() {
            return Value::Unknown;
        }
        let mut frame: Frame = callee
            .parameters
            .iter()
            .copied()
            .zip(arguments.iter().copied())
            .collect();
        // Bodies only write to their own frame, so the same arguments lead
        // to the same call again.
        let activation = (function, arguments.to_vec());
        if self.active_calls.borrow().contains(&activation) {
            trace!(function = %callee.name, "call repeats an active call");
            return Value::Unknown;
        }
        self.active_calls.borrow_mut().push(activation);
        let mut steps = 0;
        let flow = self.execute(body, depth - 1, &mut frame, &mut steps);
        self.active_calls.borrow_mut().pop();
        match flow {
            Ok(Flow::Return(value)) => value,
            Ok(Flow::Normal | Flow::Break | Flow::Indeterminate) => Value::Unknown,
            Err(StepsExhausted) => {
                trace!(function = %callee.name, steps, "step budget exhausted");
                Value::Unknown
            }
        }
    }

    fn step(&self, steps: &mut u32) -> Result<(), StepsExhausted> {
        *steps += 1;
        if *steps > self.config.max_steps {
            return Err(StepsExhausted);
        }
        Ok(())
    }

    fn execute(
        &self,
        execution: &Execution,
        depth: u32,
        frame: &mut Frame,
        steps: &mut u32,
    ) -> Result<Flow, StepsExhausted> {
        self.step(steps)?;
        match execution {
            Execution::Compound(statements) => {
                for statement in statements {
                    match self.execute(statement, depth, frame, steps)? {
                        Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Execution::Declaration {
                binding,
                initializer,
            } => {
                let value = initializer
                    .as_ref()
                    .map_or(Value::Unknown, |initializer| {
                        self.eval(initializer, depth, frame)
                    });
                frame.insert(*binding, value);
                Ok(Flow::Normal)
            }
            Execution::Expression(evaluation) => {
                self.eval(evaluation, depth, frame);
                Ok(Flow::Normal)
            }
            Execution::Return(value) => Ok(Flow::Return(
                value
                    .as_ref()
                    .map_or(Value::Unknown, |value| self.eval(value, depth, frame)),
            )),
            Execution::If {
                condition,
                then_branch,
                else_branch,
            } => match self.eval(condition, depth, frame).truth() {
                Some(true) => self.execute(then_branch, depth, frame, steps),
                Some(false) => match else_branch {
                    Some(else_branch) => self.execute(else_branch, depth, frame, steps),
                    None => Ok(Flow::Normal),
                },
                None => Ok(Flow::Indeterminate),
            },
            Execution::While { condition, body } => loop {
                self.step(steps)?;
                match self.eval(condition, depth, frame).truth() {
                    Some(true) => {}
                    Some(false) => return Ok(Flow::Normal),
                    None => return Ok(Flow::Indeterminate),
                }
                match self.execute(body, depth, frame, steps)? {
                    Flow::Normal => {}
                    Flow::Break => return Ok(Flow::Normal),
                    flow => return Ok(flow),
                }
            },
            Execution::Break => Ok(Flow::Break),
        }
    }
}

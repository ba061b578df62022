//! Compile-time evaluable expressions and statements.

use cdom_ast::nodes::{BinaryOperator, UnaryOperator};
use serde::{Deserialize, Serialize};

use crate::binding::BindingId;
use crate::value::Value;

/// An expression reduced to what compile-time evaluation needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Evaluation {
    Fixed(Value),
    /// Reference to a binding. `value` is the referenced binding's value when
    /// it is known; it is a nested value and may be elided when marshalling.
    Binding {
        binding: BindingId,
        value: Option<Value>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Evaluation>,
    },
    Binary {
        operator: BinaryOperator,
        lhs: Box<Evaluation>,
        rhs: Box<Evaluation>,
    },
    Conditional {
        condition: Box<Evaluation>,
        positive: Box<Evaluation>,
        negative: Box<Evaluation>,
    },
    Call {
        function: BindingId,
        arguments: Vec<Evaluation>,
    },
}

impl Evaluation {
    #[must_use]
    pub fn fixed(value: Value) -> Self {
        Evaluation::Fixed(value)
    }

    #[must_use]
    pub fn reference(binding: BindingId) -> Self {
        Evaluation::Binding {
            binding,
            value: None,
        }
    }

    #[must_use]
    pub fn unary(operator: UnaryOperator, operand: Evaluation) -> Self {
        Evaluation::Unary {
            operator,
            operand: Box::new(operand),
        }
    }

    #[must_use]
    pub fn binary(operator: BinaryOperator, lhs: Evaluation, rhs: Evaluation) -> Self {
        Evaluation::Binary {
            operator,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    #[must_use]
    pub fn conditional(condition: Evaluation, positive: Evaluation, negative: Evaluation) -> Self {
        Evaluation::Conditional {
            condition: Box::new(condition),
            positive: Box::new(positive),
            negative: Box::new(negative),
        }
    }

    /// Direct sub-evaluations.
    #[must_use]
    pub fn operands(&self) -> Vec<&Evaluation> {
        match self {
            Evaluation::Fixed(_) | Evaluation::Binding { .. } => Vec::new(),
            Evaluation::Unary { operand, .. } => vec![operand.as_ref()],
            Evaluation::Binary { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
            Evaluation::Conditional {
                condition,
                positive,
                negative,
            } => vec![condition.as_ref(), positive.as_ref(), negative.as_ref()],
            Evaluation::Call { arguments, .. } => arguments.iter().collect(),
        }
    }

    fn operands_mut(&mut self) -> Vec<&mut Evaluation> {
        match self {
            Evaluation::Fixed(_) | Evaluation::Binding { .. } => Vec::new(),
            Evaluation::Unary { operand, .. } => vec![operand.as_mut()],
            Evaluation::Binary { lhs, rhs, .. } => vec![lhs.as_mut(), rhs.as_mut()],
            Evaluation::Conditional {
                condition,
                positive,
                negative,
            } => vec![condition.as_mut(), positive.as_mut(), negative.as_mut()],
            Evaluation::Call { arguments, .. } => arguments.iter_mut().collect(),
        }
    }

    /// Bindings this evaluation refers to, including called functions, in
    /// left-to-right order.
    #[must_use]
    pub fn referenced_bindings(&self) -> Vec<BindingId> {
        let mut result = Vec::new();
        self.collect_references(&mut result);
        result
    }

    fn collect_references(&self, result: &mut Vec<BindingId>) {
        match self {
            Evaluation::Binding { binding, .. } => result.push(*binding),
            Evaluation::Call { function, .. } => result.push(*function),
            _ => {}
        }
        for operand in self.operands() {
            operand.collect_references(result);
        }
    }

    /// Whether every nested binding value is present.
    #[must_use]
    pub fn has_nested_values(&self) -> bool {
        match self {
            Evaluation::Binding { value, .. } => value.is_some(),
            _ => self.operands().iter().all(|operand| operand.has_nested_values()),
        }
    }

    /// Fills elided nested values from `supply`. Values already present are
    /// kept; bindings `supply` knows nothing about stay elided.
    pub fn supply_values(&mut self, supply: &mut dyn FnMut(BindingId) -> Option<Value>) {
        if let Evaluation::Binding { binding, value } = self {
            if value.is_none() {
                *value = supply(*binding);
            }
            return;
        }
        for operand in self.operands_mut() {
            operand.supply_values(supply);
        }
    }

    /// Drops every nested value.
    pub fn clear_values(&mut self) {
        if let Evaluation::Binding { value, .. } = self {
            *value = None;
            return;
        }
        for operand in self.operands_mut() {
            operand.clear_values();
        }
    }
}

/// A statement reduced to what compile-time execution needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Execution {
    Compound(Vec<Execution>),
    Declaration {
        binding: BindingId,
        initializer: Option<Evaluation>,
    },
    Expression(Evaluation),
    Return(Option<Evaluation>),
    If {
        condition: Evaluation,
        then_branch: Box<Execution>,
        else_branch: Option<Box<Execution>>,
    },
    While {
        condition: Evaluation,
        body: Box<Execution>,
    },
    Break,
}

impl Execution {
    fn evaluations_mut(&mut self) -> Vec<&mut Evaluation> {
        match self {
            Execution::Declaration { initializer, .. } => initializer.iter_mut().collect(),
            Execution::Expression(evaluation) => vec![evaluation],
            Execution::Return(value) => value.iter_mut().collect(),
            Execution::If { condition, .. } | Execution::While { condition, .. } => {
                vec![condition]
            }
            Execution::Compound(_) | Execution::Break => Vec::new(),
        }
    }

    fn children_mut(&mut self) -> Vec<&mut Execution> {
        match self {
            Execution::Compound(statements) => statements.iter_mut().collect(),
            Execution::If {
                then_branch,
                else_branch,
                ..
            } => {
                let mut children = vec![then_branch.as_mut()];
                if let Some(else_branch) = else_branch {
                    children.push(else_branch.as_mut());
                }
                children
            }
            Execution::While { body, .. } => vec![body.as_mut()],
            _ => Vec::new(),
        }
    }

    /// See [`Evaluation::supply_values`].
    pub fn supply_values(&mut self, supply: &mut dyn FnMut(BindingId) -> Option<Value>) {
        for evaluation in self.evaluations_mut() {
            evaluation.supply_values(supply);
        }
        for child in self.children_mut() {
            child.supply_values(supply);
        }
    }

    /// See [`Evaluation::clear_values`].
    pub fn clear_values(&mut self) {
        for evaluation in self.evaluations_mut() {
            evaluation.clear_values();
        }
        for child in self.children_mut() {
            child.clear_values();
        }
    }
}

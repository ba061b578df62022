use cdom_ast::nodes::{BinaryOperator, UnaryOperator};
use serde::{Deserialize, Serialize};

/// A compile-time value.
///
/// `Unknown` is the sentinel for anything that could not be determined: an
/// exhausted depth or step budget, a cycle, a non-constant operation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Float(f64),
    #[default]
    Unknown,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Unknown, Value::Unknown) => true,
            _ => false,
        }
    }
}

impl Value {
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            Value::Unknown => None,
        }
    }

    #[must_use]
    pub fn truth(&self) -> Option<bool> {
        match self {
            Value::Integer(value) => Some(*value != 0),
            Value::Float(value) => Some(*value != 0.0),
            Value::Unknown => None,
        }
    }

    fn from_bool(value: bool) -> Self {
        Value::Integer(i64::from(value))
    }

    #[must_use]
    pub fn unary(self, operator: UnaryOperator) -> Value {
        match (operator, self) {
            (_, Value::Unknown) => Value::Unknown,
            (UnaryOperator::Plus | UnaryOperator::Bracketed, value) => value,
            (UnaryOperator::Minus, Value::Integer(value)) => Value::Integer(value.wrapping_neg()),
            (UnaryOperator::Minus, Value::Float(value)) => Value::Float(-value),
            (UnaryOperator::Not, value) => value
                .truth()
                .map_or(Value::Unknown, |truth| Value::from_bool(!truth)),
            (UnaryOperator::Tilde, Value::Integer(value)) => Value::Integer(!value),
            (UnaryOperator::Tilde | UnaryOperator::Star | UnaryOperator::Amper, _) => {
                Value::Unknown
            }
        }
    }

    /// Applies a non-assigning binary operator.
    ///
    /// Integer arithmetic wraps; division by zero and out-of-range shifts
    /// produce `Unknown`. Mixed operands are promoted to floating point.
    #[must_use]
    pub fn binary(self, operator: BinaryOperator, rhs: Value) -> Value {
        match (self, rhs) {
            (Value::Unknown, _) | (_, Value::Unknown) => Value::Unknown,
            (Value::Integer(a), Value::Integer(b)) => integer_binary(operator, a, b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => float_binary(operator, a, b),
                _ => Value::Unknown,
            },
        }
    }
}

fn integer_binary(operator: BinaryOperator, a: i64, b: i64) -> Value {
    let shift = |b: i64| u32::try_from(b).ok().filter(|b| *b < 64);
    match operator {
        BinaryOperator::Multiply => Value::Integer(a.wrapping_mul(b)),
        BinaryOperator::Divide => a.checked_div(b).map_or(Value::Unknown, Value::Integer),
        BinaryOperator::Modulo => a.checked_rem(b).map_or(Value::Unknown, Value::Integer),
        BinaryOperator::Plus => Value::Integer(a.wrapping_add(b)),
        BinaryOperator::Minus => Value::Integer(a.wrapping_sub(b)),
        BinaryOperator::ShiftLeft => {
            shift(b).map_or(Value::Unknown, |b| Value::Integer(a.wrapping_shl(b)))
        }
        BinaryOperator::ShiftRight => {
            shift(b).map_or(Value::Unknown, |b| Value::Integer(a.wrapping_shr(b)))
        }
        BinaryOperator::Less => Value::from_bool(a < b),
        BinaryOperator::Greater => Value::from_bool(a > b),
        BinaryOperator::LessEqual => Value::from_bool(a <= b),
        BinaryOperator::GreaterEqual => Value::from_bool(a >= b),
        BinaryOperator::Equals => Value::from_bool(a == b),
        BinaryOperator::NotEquals => Value::from_bool(a != b),
        BinaryOperator::BinaryAnd => Value::Integer(a & b),
        BinaryOperator::BinaryXor => Value::Integer(a ^ b),
        BinaryOperator::BinaryOr => Value::Integer(a | b),
        BinaryOperator::LogicalAnd => Value::from_bool(a != 0 && b != 0),
        BinaryOperator::LogicalOr => Value::from_bool(a != 0 || b != 0),
        BinaryOperator::Assign => Value::Integer(b),
    }
}

#[allow(clippy::float_cmp)]
fn float_binary(operator: BinaryOperator, a: f64, b: f64) -> Value {
    match operator {
        BinaryOperator::Multiply => Value::Float(a * b),
        BinaryOperator::Divide => Value::Float(a / b),
        BinaryOperator::Plus => Value::Float(a + b),
        BinaryOperator::Minus => Value::Float(a - b),
        BinaryOperator::Less => Value::from_bool(a < b),
        BinaryOperator::Greater => Value::from_bool(a > b),
        BinaryOperator::LessEqual => Value::from_bool(a <= b),
        BinaryOperator::GreaterEqual => Value::from_bool(a >= b),
        BinaryOperator::Equals => Value::from_bool(a == b),
        BinaryOperator::NotEquals => Value::from_bool(a != b),
        BinaryOperator::LogicalAnd => Value::from_bool(a != 0.0 && b != 0.0),
        BinaryOperator::LogicalOr => Value::from_bool(a != 0.0 || b != 0.0),
        BinaryOperator::Assign => Value::Float(b),
        BinaryOperator::Modulo
        | BinaryOperator::ShiftLeft
        | BinaryOperator::ShiftRight
        | BinaryOperator::BinaryAnd
        | BinaryOperator::BinaryXor
        | BinaryOperator::BinaryOr => Value::Unknown,
    }
}

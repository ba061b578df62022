//! Compact binary form of evaluations and executions.
//!
//! A buffer starts with the format version as an unsigned LEB128 number.
//! Every record starts with a one-byte tag. Integers are signed LEB128, floats
//! are their little-endian IEEE bits, strings are a length followed by UTF-8
//! bytes. Nested binding values are written only on request; the `0x80` bit of
//! the binding tag says whether one follows.

use cdom_ast::nodes::{BinaryOperator, UnaryOperator};

use crate::binding::BindingId;
use crate::errors::MarshalError;
use crate::evaluation::{Evaluation, Execution};
use crate::value::Value;

pub const MARSHAL_VERSION: u64 = 1;

/// Deepest record nesting a writer produces and a reader accepts.
pub const MAX_NESTING: usize = 512;

const EVAL_FIXED: u8 = 0x01;
const EVAL_BINDING: u8 = 0x02;
const EVAL_UNARY: u8 = 0x03;
const EVAL_BINARY: u8 = 0x04;
const EVAL_CONDITIONAL: u8 = 0x05;
const EVAL_CALL: u8 = 0x06;

const EXEC_COMPOUND: u8 = 0x11;
const EXEC_DECLARATION: u8 = 0x12;
const EXEC_EXPRESSION: u8 = 0x13;
const EXEC_RETURN: u8 = 0x14;
const EXEC_IF: u8 = 0x15;
const EXEC_WHILE: u8 = 0x16;
const EXEC_BREAK: u8 = 0x17;

const VALUE_INTEGER: u8 = 0x21;
const VALUE_FLOAT: u8 = 0x22;
const VALUE_UNKNOWN: u8 = 0x23;

const FLAG_WITH_VALUE: u8 = 0x80;

const ABSENT: u8 = 0;
const PRESENT: u8 = 1;

/// Sink for marshalled records.
pub trait MarshalBuffer {
    fn put_byte(&mut self, byte: u8);
    fn put_int(&mut self, value: i64);
    fn put_uint(&mut self, value: u64);

    fn put_f64(&mut self, value: f64) {
        for byte in value.to_bits().to_le_bytes() {
            self.put_byte(byte);
        }
    }

    fn put_str(&mut self, value: &str) {
        self.put_uint(value.len() as u64);
        for byte in value.bytes() {
            self.put_byte(byte);
        }
    }
}

/// In-memory [`MarshalBuffer`] that starts with the version header.
#[derive(Debug, Clone)]
pub struct ByteBuffer {
    bytes: Vec<u8>,
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteBuffer {
    #[must_use]
    pub fn new() -> Self {
        let mut buffer = Self { bytes: Vec::new() };
        buffer.put_uint(MARSHAL_VERSION);
        buffer
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl MarshalBuffer for ByteBuffer {
    fn put_byte(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    // Writing into a Vec cannot fail.
    fn put_int(&mut self, value: i64) {
        let _ = leb128::write::signed(&mut self.bytes, value);
    }

    fn put_uint(&mut self, value: u64) {
        let _ = leb128::write::unsigned(&mut self.bytes, value);
    }
}

fn read_error(error: leb128::read::Error) -> MarshalError {
    match error {
        leb128::read::Error::IoError(_) => MarshalError::UnexpectedEnd,
        leb128::read::Error::Overflow => MarshalError::Malformed("LEB128 number overflows".into()),
    }
}

/// Reads records back from bytes produced by a [`ByteBuffer`].
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteReader<'a> {
    /// Checks the version header and positions the reader on the first record.
    ///
    /// # Errors
    ///
    /// `VersionMismatch` when the buffer was written by another format version.
    pub fn new(bytes: &'a [u8]) -> Result<Self, MarshalError> {
        let mut reader = Self { bytes };
        let found = reader.uint()?;
        if found != MARSHAL_VERSION {
            return Err(MarshalError::VersionMismatch {
                expected: MARSHAL_VERSION,
                found,
            });
        }
        Ok(reader)
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.bytes.is_empty()
    }

    fn byte(&mut self) -> Result<u8, MarshalError> {
        let (&first, rest) = self.bytes.split_first().ok_or(MarshalError::UnexpectedEnd)?;
        self.bytes = rest;
        Ok(first)
    }

    fn int(&mut self) -> Result<i64, MarshalError> {
        leb128::read::signed(&mut self.bytes).map_err(read_error)
    }

    fn uint(&mut self) -> Result<u64, MarshalError> {
        leb128::read::unsigned(&mut self.bytes).map_err(read_error)
    }

    fn f64(&mut self) -> Result<f64, MarshalError> {
        if self.bytes.len() < 8 {
            return Err(MarshalError::UnexpectedEnd);
        }
        let (head, rest) = self.bytes.split_at(8);
        let mut bits = [0u8; 8];
        bits.copy_from_slice(head);
        self.bytes = rest;
        Ok(f64::from_bits(u64::from_le_bytes(bits)))
    }

    fn binding_id(&mut self) -> Result<BindingId, MarshalError> {
        let raw = self.uint()?;
        u32::try_from(raw)
            .map(BindingId)
            .map_err(|_| MarshalError::Malformed(format!("binding id {raw} out of range")))
    }

    fn length(&mut self) -> Result<usize, MarshalError> {
        let raw = self.uint()?;
        let length = usize::try_from(raw)
            .map_err(|_| MarshalError::Malformed(format!("length {raw} out of range")))?;
        // Every element takes at least one byte.
        if length > self.bytes.len() {
            return Err(MarshalError::UnexpectedEnd);
        }
        Ok(length)
    }

    fn presence(&mut self) -> Result<bool, MarshalError> {
        match self.byte()? {
            ABSENT => Ok(false),
            PRESENT => Ok(true),
            tag => Err(MarshalError::UnknownTag {
                what: "presence",
                tag,
            }),
        }
    }
}

fn unary_code(operator: UnaryOperator) -> u8 {
    match operator {
        UnaryOperator::Plus => 0,
        UnaryOperator::Minus => 1,
        UnaryOperator::Not => 2,
        UnaryOperator::Tilde => 3,
        UnaryOperator::Star => 4,
        UnaryOperator::Amper => 5,
        UnaryOperator::Bracketed => 6,
    }
}

fn unary_from_code(code: u8) -> Result<UnaryOperator, MarshalError> {
    Ok(match code {
        0 => UnaryOperator::Plus,
        1 => UnaryOperator::Minus,
        2 => UnaryOperator::Not,
        3 => UnaryOperator::Tilde,
        4 => UnaryOperator::Star,
        5 => UnaryOperator::Amper,
        6 => UnaryOperator::Bracketed,
        tag => {
            return Err(MarshalError::UnknownTag {
                what: "unary operator",
                tag,
            })
        }
    })
}

const BINARY_OPERATORS: [BinaryOperator; 19] = [
    BinaryOperator::Multiply,
    BinaryOperator::Divide,
    BinaryOperator::Modulo,
    BinaryOperator::Plus,
    BinaryOperator::Minus,
    BinaryOperator::ShiftLeft,
    BinaryOperator::ShiftRight,
    BinaryOperator::Less,
    BinaryOperator::Greater,
    BinaryOperator::LessEqual,
    BinaryOperator::GreaterEqual,
    BinaryOperator::Equals,
    BinaryOperator::NotEquals,
    BinaryOperator::BinaryAnd,
    BinaryOperator::BinaryXor,
    BinaryOperator::BinaryOr,
    BinaryOperator::LogicalAnd,
    BinaryOperator::LogicalOr,
    BinaryOperator::Assign,
];

fn binary_code(operator: BinaryOperator) -> u8 {
    BINARY_OPERATORS
        .iter()
        .position(|candidate| *candidate == operator)
        .and_then(|index| u8::try_from(index).ok())
        .unwrap_or(u8::MAX)
}

fn binary_from_code(code: u8) -> Result<BinaryOperator, MarshalError> {
    BINARY_OPERATORS
        .get(usize::from(code))
        .copied()
        .ok_or(MarshalError::UnknownTag {
            what: "binary operator",
            tag: code,
        })
}

impl Value {
    pub fn marshal(&self, buffer: &mut dyn MarshalBuffer) {
        match self {
            Value::Integer(value) => {
                buffer.put_byte(VALUE_INTEGER);
                buffer.put_int(*value);
            }
            Value::Float(value) => {
                buffer.put_byte(VALUE_FLOAT);
                buffer.put_f64(*value);
            }
            Value::Unknown => buffer.put_byte(VALUE_UNKNOWN),
        }
    }
}

/// # Errors
///
/// Fails on a truncated buffer or an unknown value tag.
pub fn unmarshal_value(reader: &mut ByteReader<'_>) -> Result<Value, MarshalError> {
    match reader.byte()? {
        VALUE_INTEGER => Ok(Value::Integer(reader.int()?)),
        VALUE_FLOAT => Ok(Value::Float(reader.f64()?)),
        VALUE_UNKNOWN => Ok(Value::Unknown),
        tag => Err(MarshalError::UnknownTag { what: "value", tag }),
    }
}

impl Evaluation {
    /// Appends this evaluation to `buffer`. With `include_nested_values` unset,
    /// referenced binding values are left out and must be supplied again after
    /// reading.
    ///
    /// # Errors
    ///
    /// `NestingTooDeep` when a reader would reject the record. Nothing is
    /// written in that case.
    pub fn marshal(
        &self,
        buffer: &mut dyn MarshalBuffer,
        include_nested_values: bool,
    ) -> Result<(), MarshalError> {
        check_evaluation_nesting(self, 0)?;
        self.write_to(buffer, include_nested_values);
        Ok(())
    }

    fn write_to(&self, buffer: &mut dyn MarshalBuffer, include_nested_values: bool) {
        match self {
            Evaluation::Fixed(value) => {
                buffer.put_byte(EVAL_FIXED);
                value.marshal(buffer);
            }
            Evaluation::Binding { binding, value } => {
                let value = value.filter(|_| include_nested_values);
                let flag = if value.is_some() { FLAG_WITH_VALUE } else { 0 };
                buffer.put_byte(EVAL_BINDING | flag);
                buffer.put_uint(u64::from(binding.as_u32()));
                if let Some(value) = value {
                    value.marshal(buffer);
                }
            }
            Evaluation::Unary { operator, operand } => {
                buffer.put_byte(EVAL_UNARY);
                buffer.put_byte(unary_code(*operator));
                operand.write_to(buffer, include_nested_values);
            }
            Evaluation::Binary { operator, lhs, rhs } => {
                buffer.put_byte(EVAL_BINARY);
                buffer.put_byte(binary_code(*operator));
                lhs.write_to(buffer, include_nested_values);
                rhs.write_to(buffer, include_nested_values);
            }
            Evaluation::Conditional {
                condition,
                positive,
                negative,
            } => {
                buffer.put_byte(EVAL_CONDITIONAL);
                condition.write_to(buffer, include_nested_values);
                positive.write_to(buffer, include_nested_values);
                negative.write_to(buffer, include_nested_values);
            }
            Evaluation::Call {
                function,
                arguments,
            } => {
                buffer.put_byte(EVAL_CALL);
                buffer.put_uint(u64::from(function.as_u32()));
                buffer.put_uint(arguments.len() as u64);
                for argument in arguments {
                    argument.write_to(buffer, include_nested_values);
                }
            }
        }
    }
}

/// # Errors
///
/// Fails on a truncated buffer, an unknown tag, or nesting deeper than
/// [`MAX_NESTING`].
pub fn unmarshal_evaluation(reader: &mut ByteReader<'_>) -> Result<Evaluation, MarshalError> {
    read_evaluation(reader, 0)
}

fn check_nesting(level: usize) -> Result<(), MarshalError> {
    if level > MAX_NESTING {
        return Err(MarshalError::NestingTooDeep { limit: MAX_NESTING });
    }
    Ok(())
}

/// Nesting as the reader counts it: every nested record is one level down.
fn check_evaluation_nesting(evaluation: &Evaluation, level: usize) -> Result<(), MarshalError> {
    check_nesting(level)?;
    evaluation
        .operands()
        .into_iter()
        .try_for_each(|operand| check_evaluation_nesting(operand, level + 1))
}

fn check_execution_nesting(execution: &Execution, level: usize) -> Result<(), MarshalError> {
    check_nesting(level)?;
    let (evaluations, executions): (Vec<&Evaluation>, Vec<&Execution>) = match execution {
        Execution::Compound(statements) => (Vec::new(), statements.iter().collect()),
        Execution::Declaration { initializer, .. } => (initializer.iter().collect(), Vec::new()),
        Execution::Expression(evaluation) => (vec![evaluation], Vec::new()),
        Execution::Return(value) => (value.iter().collect(), Vec::new()),
        Execution::If {
            condition,
            then_branch,
            else_branch,
        } => (
            vec![condition],
            std::iter::once(then_branch.as_ref())
                .chain(else_branch.as_deref())
                .collect(),
        ),
        Execution::While { condition, body } => (vec![condition], vec![body.as_ref()]),
        Execution::Break => (Vec::new(), Vec::new()),
    };
    for evaluation in evaluations {
        check_evaluation_nesting(evaluation, level + 1)?;
    }
    for nested in executions {
        check_execution_nesting(nested, level + 1)?;
    }
    Ok(())
}

fn read_evaluation(reader: &mut ByteReader<'_>, level: usize) -> Result<Evaluation, MarshalError> {
    check_nesting(level)?;
    let tag = reader.byte()?;
    match tag & !FLAG_WITH_VALUE {
        EVAL_FIXED if tag == EVAL_FIXED => Ok(Evaluation::Fixed(unmarshal_value(reader)?)),
        EVAL_BINDING => {
            let binding = reader.binding_id()?;
            let value = if tag & FLAG_WITH_VALUE == 0 {
                None
            } else {
                Some(unmarshal_value(reader)?)
            };
            Ok(Evaluation::Binding { binding, value })
        }
        EVAL_UNARY if tag == EVAL_UNARY => {
            let operator = unary_from_code(reader.byte()?)?;
            let operand = read_evaluation(reader, level + 1)?;
            Ok(Evaluation::unary(operator, operand))
        }
        EVAL_BINARY if tag == EVAL_BINARY => {
            let operator = binary_from_code(reader.byte()?)?;
            let lhs = read_evaluation(reader, level + 1)?;
            let rhs = read_evaluation(reader, level + 1)?;
            Ok(Evaluation::binary(operator, lhs, rhs))
        }
        EVAL_CONDITIONAL if tag == EVAL_CONDITIONAL => {
            let condition = read_evaluation(reader, level + 1)?;
            let positive = read_evaluation(reader, level + 1)?;
            let negative = read_evaluation(reader, level + 1)?;
            Ok(Evaluation::conditional(condition, positive, negative))
        }
        EVAL_CALL if tag == EVAL_CALL => {
            let function = reader.binding_id()?;
            let count = reader.length()?;
            let arguments = (0..count)
                .map(|_| read_evaluation(reader, level + 1))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Evaluation::Call {
                function,
                arguments,
            })
        }
        _ => Err(MarshalError::UnknownTag {
            what: "evaluation",
            tag,
        }),
    }
}

fn marshal_optional(
    evaluation: Option<&Evaluation>,
    buffer: &mut dyn MarshalBuffer,
    include_nested_values: bool,
) {
    match evaluation {
        Some(evaluation) => {
            buffer.put_byte(PRESENT);
            evaluation.write_to(buffer, include_nested_values);
        }
        None => buffer.put_byte(ABSENT),
    }
}

impl Execution {
    /// Appends this execution to `buffer`; see [`Evaluation::marshal`].
    ///
    /// # Errors
    ///
    /// `NestingTooDeep` when a reader would reject the record. Nothing is
    /// written in that case.
    pub fn marshal(
        &self,
        buffer: &mut dyn MarshalBuffer,
        include_nested_values: bool,
    ) -> Result<(), MarshalError> {
        check_execution_nesting(self, 0)?;
        self.write_to(buffer, include_nested_values);
        Ok(())
    }

    fn write_to(&self, buffer: &mut dyn MarshalBuffer, include_nested_values: bool) {
        match self {
            Execution::Compound(statements) => {
                buffer.put_byte(EXEC_COMPOUND);
                buffer.put_uint(statements.len() as u64);
                for statement in statements {
                    statement.write_to(buffer, include_nested_values);
                }
            }
            Execution::Declaration {
                binding,
                initializer,
            } => {
                buffer.put_byte(EXEC_DECLARATION);
                buffer.put_uint(u64::from(binding.as_u32()));
                marshal_optional(initializer.as_ref(), buffer, include_nested_values);
            }
            Execution::Expression(evaluation) => {
                buffer.put_byte(EXEC_EXPRESSION);
                evaluation.write_to(buffer, include_nested_values);
            }
            Execution::Return(value) => {
                buffer.put_byte(EXEC_RETURN);
                marshal_optional(value.as_ref(), buffer, include_nested_values);
            }
            Execution::If {
                condition,
                then_branch,
                else_branch,
            } => {
                buffer.put_byte(EXEC_IF);
                condition.write_to(buffer, include_nested_values);
                then_branch.write_to(buffer, include_nested_values);
                match else_branch {
                    Some(else_branch) => {
                        buffer.put_byte(PRESENT);
                        else_branch.write_to(buffer, include_nested_values);
                    }
                    None => buffer.put_byte(ABSENT),
                }
            }
            Execution::While { condition, body } => {
                buffer.put_byte(EXEC_WHILE);
                condition.write_to(buffer, include_nested_values);
                body.write_to(buffer, include_nested_values);
            }
            Execution::Break => buffer.put_byte(EXEC_BREAK),
        }
    }
}

/// # Errors
///
/// Fails on a truncated buffer, an unknown tag, or nesting deeper than
/// [`MAX_NESTING`].
pub fn unmarshal_execution(reader: &mut ByteReader<'_>) -> Result<Execution, MarshalError> {
    read_execution(reader, 0)
}

fn read_optional_evaluation(
    reader: &mut ByteReader<'_>,
    level: usize,
) -> Result<Option<Evaluation>, MarshalError> {
    if reader.presence()? {
        Ok(Some(read_evaluation(reader, level + 1)?))
    } else {
        Ok(None)
    }
}

fn read_execution(reader: &mut ByteReader<'_>, level: usize) -> Result<Execution, MarshalError> {
    check_nesting(level)?;
    match reader.byte()? {
        EXEC_COMPOUND => {
            let count = reader.length()?;
            let statements = (0..count)
                .map(|_| read_execution(reader, level + 1))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Execution::Compound(statements))
        }
        EXEC_DECLARATION => {
            let binding = reader.binding_id()?;
            let initializer = read_optional_evaluation(reader, level)?;
            Ok(Execution::Declaration {
                binding,
                initializer,
            })
        }
        EXEC_EXPRESSION => Ok(Execution::Expression(read_evaluation(reader, level + 1)?)),
        EXEC_RETURN => Ok(Execution::Return(read_optional_evaluation(reader, level)?)),
        EXEC_IF => {
            let condition = read_evaluation(reader, level + 1)?;
            let then_branch = Box::new(read_execution(reader, level + 1)?);
            let else_branch = if reader.presence()? {
                Some(Box::new(read_execution(reader, level + 1)?))
            } else {
                None
            };
            Ok(Execution::If {
                condition,
                then_branch,
                else_branch,
            })
        }
        EXEC_WHILE => {
            let condition = read_evaluation(reader, level + 1)?;
            let body = Box::new(read_execution(reader, level + 1)?);
            Ok(Execution::While { condition, body })
        }
        EXEC_BREAK => Ok(Execution::Break),
        tag => Err(MarshalError::UnknownTag {
            what: "execution",
            tag,
        }),
    }
}

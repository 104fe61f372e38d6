use cinder_dtype::DType;
use snafu::Snafu;

use crate::{BinaryOp, UnaryOp};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Name is neither a declared variable nor a local.
    #[snafu(display("unknown variable '{name}'"))]
    UnknownVariable { name: String },

    /// Unary operation applied to an operand of the wrong kind.
    #[snafu(display("invalid operand for {op:?}: {dtype}"))]
    InvalidUnaryOperand { op: UnaryOp, dtype: DType },

    /// Binary operation applied to operands of the wrong kinds.
    #[snafu(display("invalid operands for {op:?}: {lhs} and {rhs}"))]
    InvalidBinaryOperands { op: BinaryOp, lhs: DType, rhs: DType },

    /// Selection condition or `where` predicate is not boolean.
    #[snafu(display("condition must be bool, got {actual}"))]
    NonBooleanCondition { actual: DType },

    /// Scalar code read or wrote a per-element variable.
    #[snafu(display("array variable '{name}' referenced in scalar code"))]
    ArrayInScalarContext { name: String },

    /// Scalar code referenced the vectorization index.
    #[snafu(display("vectorization index referenced in scalar code"))]
    IndexInScalarContext,

    /// Assignment to a compile-time constant.
    #[snafu(display("cannot assign to constant '{name}'"))]
    AssignToConstant { name: String },

    /// A local shadows a variable or another local.
    #[snafu(display("'{name}' is already declared"))]
    Redeclaration { name: String },

    /// Array length does not resolve to a non-negative integer.
    #[snafu(display("invalid size for '{name}': {reason}"))]
    InvalidSize { name: String, reason: String },

    /// Integer division or modulo by zero.
    #[snafu(display("integer division by zero"))]
    DivisionByZero,

    /// Runtime storage has no value for a variable.
    #[snafu(display("no value bound for '{name}'"))]
    MissingValue { name: String },

    /// Element access past the end of an array.
    #[snafu(display("index {index} out of bounds for '{name}' of length {len}"))]
    IndexOutOfBounds { name: String, index: usize, len: usize },
}

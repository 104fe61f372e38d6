//! Evaluation of abstract code.
//!
//! The vectorization index is an explicit argument of every call: nothing
//! about the current element lives in ambient state.
//!
//! # Semantics
//!
//! Operands are converted to the operation's operand kind first, then:
//! - integer arithmetic wraps;
//! - integer division and modulo by zero fail with `DivisionByZero`;
//! - `FloorDiv` and `Mod` round toward negative infinity (the remainder takes
//!   the divisor's sign);
//! - float operations follow IEEE 754.

use std::collections::HashMap;

use cinder_dtype::DType;
use snafu::OptionExt;

use crate::expr::{INDEX_DTYPE, binary_result, operand_dtype, unary_result, where_result};
use crate::{
    BinaryOp, ConstValue, DivisionByZeroSnafu, Expr, InvalidBinaryOperandsSnafu, InvalidUnaryOperandSnafu,
    IndexInScalarContextSnafu, Result, Statement, UnaryOp, Variable, VectorIndex,
};

/// Runtime storage of variable values.
pub trait Store {
    /// Read a scalar, or the element of an array at `index`.
    fn load(&self, var: &Variable, index: VectorIndex) -> Result<ConstValue>;

    /// Write a scalar, or the element of an array at `index`.
    fn store(&mut self, var: &Variable, index: VectorIndex, value: ConstValue) -> Result<()>;
}

/// Executes statements against a [`Store`].
///
/// Locals declared during the scalar pass persist for the vector pass;
/// vector-pass locals are rebound on every element.
pub struct Evaluator<'a, S: Store + ?Sized> {
    variables: &'a crate::Variables,
    store: &'a mut S,
    locals: HashMap<String, (ConstValue, DType)>,
}

impl<'a, S: Store + ?Sized> Evaluator<'a, S> {
    pub fn new(variables: &'a crate::Variables, store: &'a mut S) -> Self {
        Self { variables, store, locals: HashMap::new() }
    }

    /// Evaluate an expression with the given index bound.
    pub fn eval(&self, expr: &Expr, index: VectorIndex) -> Result<ConstValue> {
        self.eval_typed(expr, index).map(|(value, _)| value)
    }

    /// Evaluate an expression, returning its value and kind.
    pub fn eval_typed(&self, expr: &Expr, index: VectorIndex) -> Result<(ConstValue, DType)> {
        match expr {
            Expr::Const { value, dtype } => Ok((*value, *dtype)),
            Expr::Var(name) => self.read(name, index),
            Expr::Index => {
                let i = index.element().context(IndexInScalarContextSnafu)?;
                Ok((ConstValue::Int(i as i64), INDEX_DTYPE))
            }
            Expr::Unary { op, operand } => {
                let (value, dtype) = self.eval_typed(operand, index)?;
                let result = unary_result(*op, dtype)?;
                let value = eval_unary_op(*op, value.cast(result)).context(InvalidUnaryOperandSnafu { op: *op, dtype })?;
                Ok((value.cast(result), result))
            }
            Expr::Binary { op, lhs, rhs } => {
                let (a, lhs_dtype) = self.eval_typed(lhs, index)?;
                // Short-circuit like the rendered code does.
                match (op, a) {
                    (BinaryOp::And, ConstValue::Bool(false)) => return Ok((ConstValue::Bool(false), DType::Bool)),
                    (BinaryOp::Or, ConstValue::Bool(true)) => return Ok((ConstValue::Bool(true), DType::Bool)),
                    _ => {}
                }
                let (b, rhs_dtype) = self.eval_typed(rhs, index)?;
                let operands = operand_dtype(*op, lhs_dtype, rhs_dtype)?;
                let result = binary_result(*op, lhs_dtype, rhs_dtype)?;
                let value = eval_binary_op(*op, a.cast(operands), b.cast(operands))?;
                Ok((value.cast(result), result))
            }
            Expr::Where { cond, then, otherwise } => {
                let (c, cond_dtype) = self.eval_typed(cond, index)?;
                let (t, then_dtype) = self.eval_typed(then, index)?;
                let (o, otherwise_dtype) = self.eval_typed(otherwise, index)?;
                let result = where_result(cond_dtype, then_dtype, otherwise_dtype)?;
                let value = if c.truthy() { t } else { o };
                Ok((value.cast(result), result))
            }
            Expr::Cast { dtype, operand } => {
                let (value, _) = self.eval_typed(operand, index)?;
                Ok((value.cast(*dtype), *dtype))
            }
        }
    }

    fn read(&self, name: &str, index: VectorIndex) -> Result<(ConstValue, DType)> {
        if let Some(local) = self.locals.get(name) {
            return Ok(*local);
        }
        let var = self.variables.lookup(name)?;
        let value = match var.constant {
            Some(value) => value,
            None => self.store.load(var, index)?,
        };
        Ok((value.cast(var.dtype), var.dtype))
    }

    /// Execute one statement.
    pub fn exec(&mut self, statement: &Statement, index: VectorIndex) -> Result<()> {
        match statement {
            Statement::Declare { name, dtype, value, .. } => {
                let value = self.eval(value, index)?.cast(*dtype);
                self.locals.insert(name.clone(), (value, *dtype));
            }
            Statement::Assign { target, value } => {
                let value = self.eval(value, index)?;
                if let Some((slot, dtype)) = self.locals.get_mut(target) {
                    *slot = value.cast(*dtype);
                } else {
                    let var = self.variables.lookup(target)?;
                    self.store.store(var, index, value.cast(var.dtype))?;
                }
            }
        }
        Ok(())
    }

    /// Execute statements in order.
    pub fn exec_all(&mut self, statements: &[Statement], index: VectorIndex) -> Result<()> {
        statements.iter().try_for_each(|statement| self.exec(statement, index))
    }

    /// Evaluate a selection condition; an absent condition selects everything.
    pub fn condition(&self, condition: Option<&Expr>, index: VectorIndex) -> Result<bool> {
        match condition {
            Some(expr) => Ok(self.eval(expr, index)?.truthy()),
            None => Ok(true),
        }
    }
}

/// Evaluate a unary operation on a value already converted to the result kind.
///
/// Returns `None` if the operation is not defined for the value.
pub fn eval_unary_op(op: UnaryOp, v: ConstValue) -> Option<ConstValue> {
    match op {
        UnaryOp::Neg => eval_neg(v),
        UnaryOp::Not => match v {
            ConstValue::Bool(b) => Some(ConstValue::Bool(!b)),
            _ => None,
        },
        UnaryOp::Abs => match v {
            ConstValue::Int(x) => Some(ConstValue::Int(x.wrapping_abs())),
            ConstValue::UInt(x) => Some(ConstValue::UInt(x)),
            ConstValue::Float(x) => Some(ConstValue::Float(x.abs())),
            ConstValue::Bool(_) => None,
        },
        UnaryOp::Sqrt => eval_float(v, f64::sqrt),
        UnaryOp::Exp => eval_float(v, f64::exp),
        UnaryOp::Log => eval_float(v, f64::ln),
        UnaryOp::Sin => eval_float(v, f64::sin),
        UnaryOp::Cos => eval_float(v, f64::cos),
        UnaryOp::Floor => match v {
            ConstValue::Float(x) => Some(ConstValue::Float(x.floor())),
            ConstValue::Int(_) | ConstValue::UInt(_) => Some(v),
            ConstValue::Bool(_) => None,
        },
        UnaryOp::Ceil => match v {
            ConstValue::Float(x) => Some(ConstValue::Float(x.ceil())),
            ConstValue::Int(_) | ConstValue::UInt(_) => Some(v),
            ConstValue::Bool(_) => None,
        },
    }
}

/// Evaluate a binary operation on operands of the same representation.
pub fn eval_binary_op(op: BinaryOp, a: ConstValue, b: ConstValue) -> Result<ConstValue> {
    let value = match op {
        BinaryOp::Add => eval_add(a, b),
        BinaryOp::Sub => eval_sub(a, b),
        BinaryOp::Mul => eval_mul(a, b),
        BinaryOp::Div => eval_fdiv(a, b),
        BinaryOp::FloorDiv => eval_floor_div(a, b)?,
        BinaryOp::Mod => eval_mod(a, b)?,
        BinaryOp::Pow => eval_pow(a, b),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne => eval_cmp(op, a, b),
        BinaryOp::And => eval_logical(a, b, |x, y| x && y),
        BinaryOp::Or => eval_logical(a, b, |x, y| x || y),
    };
    value.context(InvalidBinaryOperandsSnafu { op, lhs: a.dtype(), rhs: b.dtype() })
}

// ============================================================================
// Unary Operations
// ============================================================================

#[inline]
fn eval_neg(v: ConstValue) -> Option<ConstValue> {
    match v {
        ConstValue::Int(x) => Some(ConstValue::Int(x.wrapping_neg())),
        ConstValue::UInt(x) => Some(ConstValue::UInt(x.wrapping_neg())),
        ConstValue::Float(x) => Some(ConstValue::Float(-x)),
        ConstValue::Bool(_) => None,
    }
}

#[inline]
fn eval_float(v: ConstValue, f: fn(f64) -> f64) -> Option<ConstValue> {
    match v {
        ConstValue::Float(x) => Some(ConstValue::Float(f(x))),
        _ => None,
    }
}

// ============================================================================
// Binary Arithmetic Operations
// ============================================================================

#[inline]
fn eval_add(a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::Int(x), ConstValue::Int(y)) => Some(ConstValue::Int(x.wrapping_add(y))),
        (ConstValue::UInt(x), ConstValue::UInt(y)) => Some(ConstValue::UInt(x.wrapping_add(y))),
        (ConstValue::Float(x), ConstValue::Float(y)) => Some(ConstValue::Float(x + y)),
        _ => None,
    }
}

#[inline]
fn eval_sub(a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::Int(x), ConstValue::Int(y)) => Some(ConstValue::Int(x.wrapping_sub(y))),
        (ConstValue::UInt(x), ConstValue::UInt(y)) => Some(ConstValue::UInt(x.wrapping_sub(y))),
        (ConstValue::Float(x), ConstValue::Float(y)) => Some(ConstValue::Float(x - y)),
        _ => None,
    }
}

#[inline]
fn eval_mul(a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::Int(x), ConstValue::Int(y)) => Some(ConstValue::Int(x.wrapping_mul(y))),
        (ConstValue::UInt(x), ConstValue::UInt(y)) => Some(ConstValue::UInt(x.wrapping_mul(y))),
        (ConstValue::Float(x), ConstValue::Float(y)) => Some(ConstValue::Float(x * y)),
        _ => None,
    }
}

#[inline]
fn eval_fdiv(a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::Float(x), ConstValue::Float(y)) => Some(ConstValue::Float(x / y)),
        _ => None,
    }
}

#[inline]
fn eval_floor_div(a: ConstValue, b: ConstValue) -> Result<Option<ConstValue>> {
    Ok(match (a, b) {
        (ConstValue::Int(_), ConstValue::Int(0)) | (ConstValue::UInt(_), ConstValue::UInt(0)) => {
            return DivisionByZeroSnafu.fail();
        }
        (ConstValue::Int(x), ConstValue::Int(y)) => {
            let q = x.wrapping_div(y);
            let adjust = x.wrapping_rem(y) != 0 && ((x < 0) != (y < 0));
            Some(ConstValue::Int(if adjust { q - 1 } else { q }))
        }
        (ConstValue::UInt(x), ConstValue::UInt(y)) => Some(ConstValue::UInt(x / y)),
        (ConstValue::Float(x), ConstValue::Float(y)) => Some(ConstValue::Float((x / y).floor())),
        _ => None,
    })
}

#[inline]
fn eval_mod(a: ConstValue, b: ConstValue) -> Result<Option<ConstValue>> {
    Ok(match (a, b) {
        (ConstValue::Int(_), ConstValue::Int(0)) | (ConstValue::UInt(_), ConstValue::UInt(0)) => {
            return DivisionByZeroSnafu.fail();
        }
        (ConstValue::Int(x), ConstValue::Int(y)) => {
            let r = x.wrapping_rem(y);
            Some(ConstValue::Int(if r != 0 && ((r < 0) != (y < 0)) { r + y } else { r }))
        }
        (ConstValue::UInt(x), ConstValue::UInt(y)) => Some(ConstValue::UInt(x % y)),
        (ConstValue::Float(x), ConstValue::Float(y)) => {
            let r = x % y;
            Some(ConstValue::Float(if r != 0.0 && ((r < 0.0) != (y < 0.0)) { r + y } else { r }))
        }
        _ => None,
    })
}

#[inline]
fn eval_pow(a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::Float(x), ConstValue::Float(y)) => Some(ConstValue::Float(x.powf(y))),
        _ => None,
    }
}

// ============================================================================
// Binary Comparison and Logical Operations
// ============================================================================

#[inline]
fn eval_cmp(op: BinaryOp, a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    macro_rules! compare {
        ($x:expr, $y:expr) => {
            match op {
                BinaryOp::Lt => $x < $y,
                BinaryOp::Le => $x <= $y,
                BinaryOp::Gt => $x > $y,
                BinaryOp::Ge => $x >= $y,
                BinaryOp::Eq => $x == $y,
                BinaryOp::Ne => $x != $y,
                _ => return None,
            }
        };
    }
    let result = match (a, b) {
        (ConstValue::Int(x), ConstValue::Int(y)) => compare!(x, y),
        (ConstValue::UInt(x), ConstValue::UInt(y)) => compare!(x, y),
        (ConstValue::Float(x), ConstValue::Float(y)) => compare!(x, y),
        (ConstValue::Bool(x), ConstValue::Bool(y)) => compare!(x, y),
        _ => return None,
    };
    Some(ConstValue::Bool(result))
}

#[inline]
fn eval_logical(a: ConstValue, b: ConstValue, f: fn(bool, bool) -> bool) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::Bool(x), ConstValue::Bool(y)) => Some(ConstValue::Bool(f(x, y))),
        _ => None,
    }
}

//! NumPy rendering of expressions and statements.
//!
//! The vector pass is rendered once over all elements: `_idx` holds every
//! element position and array reads select with it.

use cinder_dtype::DType;
use cinder_ir::expr::{INDEX_DTYPE, operand_dtype, unary_result, where_result};
use cinder_ir::{BinaryOp, ConstValue, Expr, Statement, UnaryOp};
use snafu::ResultExt;

use crate::{Emitter, IrSnafu, Result, Scope};

/// NumPy scalar type name of a kind.
pub fn numpy_scalar(dtype: DType) -> &'static str {
    match dtype {
        DType::Bool => "bool_",
        DType::Int8 => "int8",
        DType::UInt8 => "uint8",
        DType::Int16 => "int16",
        DType::UInt16 => "uint16",
        DType::Int32 => "int32",
        DType::UInt32 => "uint32",
        DType::Int64 => "int64",
        DType::UInt64 => "uint64",
        DType::Float32 => "float32",
        DType::Float64 => "float64",
    }
}

/// Name the kernel binds an array variable to.
pub fn array_name(name: &str) -> String {
    format!("_array_{name}")
}

fn numpy_cast(expr: &str, dtype: DType) -> String {
    format!("_numpy.asarray({expr}, dtype=_numpy.{})", numpy_scalar(dtype))
}

fn convert(rendered: String, from: DType, to: DType) -> String {
    if from == to { rendered } else { numpy_cast(&rendered, to) }
}

/// Render a constant as a Python literal of the given kind.
pub fn numpy_const(val: &ConstValue, dtype: DType) -> String {
    let literal = match val.cast(dtype) {
        ConstValue::Bool(b) => return if b { "True" } else { "False" }.to_string(),
        ConstValue::Int(i) => i.to_string(),
        ConstValue::UInt(u) => u.to_string(),
        ConstValue::Float(f) if f.is_nan() => "_numpy.nan".to_string(),
        ConstValue::Float(f) if f.is_infinite() => {
            if f.is_sign_negative() { "(-_numpy.inf)" } else { "_numpy.inf" }.to_string()
        }
        ConstValue::Float(f) => format!("{f:?}"),
    };
    match dtype {
        DType::Int64 | DType::Float64 => literal,
        _ => format!("_numpy.{}({literal})", numpy_scalar(dtype)),
    }
}

fn render_read(name: &str, scope: &Scope<'_>) -> String {
    match scope.variable(name) {
        Some(var) if var.is_array() => format!("{}[_idx]", array_name(name)),
        _ => name.to_string(),
    }
}

/// Render an expression as vectorized NumPy code, returning it with its kind.
pub fn render_expr(expr: &Expr, scope: &Scope<'_>) -> Result<(String, DType)> {
    Ok(match expr {
        Expr::Const { value, dtype } => (numpy_const(value, *dtype), *dtype),
        Expr::Var(name) => (render_read(name, scope), scope.lookup(name).context(IrSnafu)?),
        Expr::Index => ("_vectorisation_idx".to_string(), INDEX_DTYPE),
        Expr::Unary { op, operand } => {
            let (s, dtype) = render_expr(operand, scope)?;
            let result = unary_result(*op, dtype).context(IrSnafu)?;
            (render_unary(*op, &convert(s, dtype, result), result), result)
        }
        Expr::Binary { op, lhs, rhs } => {
            let (l, lhs_dtype) = render_expr(lhs, scope)?;
            let (r, rhs_dtype) = render_expr(rhs, scope)?;
            let operands = operand_dtype(*op, lhs_dtype, rhs_dtype).context(IrSnafu)?;
            let l = convert(l, lhs_dtype, operands);
            let r = convert(r, rhs_dtype, operands);
            let result = if op.is_comparison() { DType::Bool } else { operands };
            (render_binary(*op, &l, &r), result)
        }
        Expr::Where { cond, then, otherwise } => {
            let (c, cond_dtype) = render_expr(cond, scope)?;
            let (t, then_dtype) = render_expr(then, scope)?;
            let (o, otherwise_dtype) = render_expr(otherwise, scope)?;
            let result = where_result(cond_dtype, then_dtype, otherwise_dtype).context(IrSnafu)?;
            (numpy_cast(&format!("_numpy.where({c}, {t}, {o})"), result), result)
        }
        Expr::Cast { dtype, operand } => {
            let (s, from) = render_expr(operand, scope)?;
            (convert(s, from, *dtype), *dtype)
        }
    })
}

fn render_binary(op: BinaryOp, l: &str, r: &str) -> String {
    match op {
        BinaryOp::Add => format!("({l} + {r})"),
        BinaryOp::Sub => format!("({l} - {r})"),
        BinaryOp::Mul => format!("({l} * {r})"),
        BinaryOp::Div => format!("({l} / {r})"),
        // Python semantics: both round toward negative infinity.
        BinaryOp::FloorDiv => format!("({l} // {r})"),
        BinaryOp::Mod => format!("({l} % {r})"),
        BinaryOp::Pow => format!("({l} ** {r})"),
        BinaryOp::Lt => format!("({l} < {r})"),
        BinaryOp::Le => format!("({l} <= {r})"),
        BinaryOp::Gt => format!("({l} > {r})"),
        BinaryOp::Ge => format!("({l} >= {r})"),
        BinaryOp::Eq => format!("({l} == {r})"),
        BinaryOp::Ne => format!("({l} != {r})"),
        BinaryOp::And => format!("_numpy.logical_and({l}, {r})"),
        BinaryOp::Or => format!("_numpy.logical_or({l}, {r})"),
    }
}

fn render_unary(op: UnaryOp, s: &str, dtype: DType) -> String {
    match op {
        UnaryOp::Neg => format!("(-{s})"),
        UnaryOp::Not => format!("_numpy.logical_not({s})"),
        UnaryOp::Floor | UnaryOp::Ceil if !dtype.is_float() => s.to_string(),
        UnaryOp::Abs => format!("_numpy.abs({s})"),
        UnaryOp::Sqrt => format!("_numpy.sqrt({s})"),
        UnaryOp::Exp => format!("_numpy.exp({s})"),
        UnaryOp::Log => format!("_numpy.log({s})"),
        UnaryOp::Sin => format!("_numpy.sin({s})"),
        UnaryOp::Cos => format!("_numpy.cos({s})"),
        UnaryOp::Floor => format!("_numpy.floor({s})"),
        UnaryOp::Ceil => format!("_numpy.ceil({s})"),
    }
}

/// Emit statements, one per line.
pub fn render_statements(statements: &[Statement], scope: &mut Scope<'_>, out: &mut Emitter) -> Result<()> {
    for statement in statements {
        let (value, dtype) = render_expr(statement.value(), scope)?;
        let target = scope.target_dtype(statement)?;
        let value = convert(value, dtype, target);
        match statement {
            Statement::Declare { name, .. } => {
                out.line(format!("{name} = {value}"));
                scope.declare(name, target);
            }
            Statement::Assign { target, .. } => out.line(format!("{} = {value}", render_read(target, scope))),
        }
    }
    Ok(())
}

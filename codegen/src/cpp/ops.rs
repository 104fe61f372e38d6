//! C++ rendering of expressions and statements.

use cinder_dtype::DType;
use cinder_ir::expr::{operand_dtype, unary_result, where_result};
use cinder_ir::{BinaryOp, Expr, Statement, UnaryOp};
use snafu::ResultExt;

use super::types::{cpp_cast, cpp_const, cpp_math_fn, cpp_scalar};
use crate::{Emitter, IrSnafu, Result, Scope};

/// Name of the array pointer argument of a variable.
pub fn array_pointer(name: &str) -> String {
    format!("_ptr_array_{name}")
}

/// Render a read of a name: locals and scalars by name, arrays at the
/// current element.
fn render_read(name: &str, scope: &Scope<'_>) -> String {
    match scope.variable(name) {
        Some(var) if var.is_array() => format!("{}[_vectorisation_idx]", array_pointer(name)),
        _ => name.to_string(),
    }
}

/// Cast `rendered` from `from` to `to` if the kinds differ.
fn convert(rendered: String, from: DType, to: DType) -> String {
    if from == to { rendered } else { cpp_cast(&rendered, to) }
}

/// Render an expression as C++, returning it with its kind.
pub fn render_expr(expr: &Expr, scope: &Scope<'_>) -> Result<(String, DType)> {
    Ok(match expr {
        Expr::Const { value, dtype } => (cpp_const(value, *dtype), *dtype),
        Expr::Var(name) => (render_read(name, scope), scope.lookup(name).context(IrSnafu)?),
        Expr::Index => ("((int64_t)_vectorisation_idx)".to_string(), cinder_ir::expr::INDEX_DTYPE),
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
            (render_binary(*op, &l, &r, operands), result)
        }
        Expr::Where { cond, then, otherwise } => {
            let (c, cond_dtype) = render_expr(cond, scope)?;
            let (t, then_dtype) = render_expr(then, scope)?;
            let (o, otherwise_dtype) = render_expr(otherwise, scope)?;
            let result = where_result(cond_dtype, then_dtype, otherwise_dtype).context(IrSnafu)?;
            let t = convert(t, then_dtype, result);
            let o = convert(o, otherwise_dtype, result);
            (format!("({c} ? {t} : {o})"), result)
        }
        Expr::Cast { dtype, operand } => {
            let (s, from) = render_expr(operand, scope)?;
            (convert(s, from, *dtype), *dtype)
        }
    })
}

/// Render a binary operation on operands already converted to `dtype`.
fn render_binary(op: BinaryOp, l: &str, r: &str, dtype: DType) -> String {
    match op {
        BinaryOp::Add => format!("({l} + {r})"),
        BinaryOp::Sub => format!("({l} - {r})"),
        BinaryOp::Mul => format!("({l} * {r})"),
        BinaryOp::Div => format!("({l} / {r})"),
        BinaryOp::FloorDiv => {
            if dtype.is_float() {
                format!("{}({l} / {r})", cpp_math_fn("floor", dtype))
            } else {
                format!("_floordiv({l}, {r})")
            }
        }
        BinaryOp::Mod => format!("_mod({l}, {r})"),
        BinaryOp::Pow => format!("{}({l}, {r})", cpp_math_fn("pow", dtype)),
        BinaryOp::Lt => format!("({l} < {r})"),
        BinaryOp::Le => format!("({l} <= {r})"),
        BinaryOp::Gt => format!("({l} > {r})"),
        BinaryOp::Ge => format!("({l} >= {r})"),
        BinaryOp::Eq => format!("({l} == {r})"),
        BinaryOp::Ne => format!("({l} != {r})"),
        BinaryOp::And => format!("({l} && {r})"),
        BinaryOp::Or => format!("({l} || {r})"),
    }
}

/// Render a unary operation on an operand already converted to `dtype`.
fn render_unary(op: UnaryOp, s: &str, dtype: DType) -> String {
    match op {
        UnaryOp::Neg => format!("(-{s})"),
        UnaryOp::Not => format!("(!{s})"),
        UnaryOp::Abs => {
            if dtype.is_float() {
                format!("{}({s})", cpp_math_fn("fabs", dtype))
            } else if dtype.is_unsigned() {
                s.to_string()
            } else {
                format!("({s} < 0 ? -{s} : {s})")
            }
        }
        UnaryOp::Floor | UnaryOp::Ceil if !dtype.is_float() => s.to_string(),
        UnaryOp::Floor => format!("{}({s})", cpp_math_fn("floor", dtype)),
        UnaryOp::Ceil => format!("{}({s})", cpp_math_fn("ceil", dtype)),
        UnaryOp::Sqrt => format!("{}({s})", cpp_math_fn("sqrt", dtype)),
        UnaryOp::Exp => format!("{}({s})", cpp_math_fn("exp", dtype)),
        UnaryOp::Log => format!("{}({s})", cpp_math_fn("log", dtype)),
        UnaryOp::Sin => format!("{}({s})", cpp_math_fn("sin", dtype)),
        UnaryOp::Cos => format!("{}({s})", cpp_math_fn("cos", dtype)),
    }
}

/// Emit statements, one per line.
pub fn render_statements(statements: &[Statement], scope: &mut Scope<'_>, out: &mut Emitter) -> Result<()> {
    for statement in statements {
        let (value, dtype) = render_expr(statement.value(), scope)?;
        let target = scope.target_dtype(statement)?;
        let value = convert(value, dtype, target);
        match statement {
            Statement::Declare { name, constant, .. } => {
                let qualifier = if *constant { "const " } else { "" };
                out.line(format!("{qualifier}{} {name} = {value};", cpp_scalar(target)));
                scope.declare(name, target);
            }
            Statement::Assign { target, .. } => out.line(format!("{} = {value};", render_read(target, scope))),
        }
    }
    Ok(())
}

/// Helpers the rendered expressions rely on: floor division and modulo that
/// round toward negative infinity.
pub const SUPPORT_CODE: &str = "\
template <typename T>
static inline T _floordiv(T x, T y)
{
    T q = x / y;
    if ((x % y != 0) && ((x < 0) != (y < 0))) q -= 1;
    return q;
}

template <typename T>
static inline T _mod(T x, T y)
{
    T r = x % y;
    if (r != 0 && ((r < 0) != (y < 0))) r += y;
    return r;
}

static inline double _mod(double x, double y)
{
    double r = fmod(x, y);
    if (r != 0 && ((r < 0) != (y < 0))) r += y;
    return r;
}

static inline float _mod(float x, float y)
{
    float r = fmodf(x, y);
    if (r != 0 && ((r < 0) != (y < 0))) r += y;
    return r;
}";

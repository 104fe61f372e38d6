//! Typed expression AST of abstract code.

use std::collections::BTreeSet;

use cinder_dtype::DType;
use snafu::ensure;

use crate::{
    BinaryOp, ConstValue, InvalidBinaryOperandsSnafu, InvalidUnaryOperandSnafu, NonBooleanConditionSnafu, Result,
    UnaryOp,
};

/// Expression over constants, variables and the vectorization index.
#[derive(Debug, Clone, PartialEq, Hash)]
pub enum Expr {
    Const { value: ConstValue, dtype: DType },
    /// Read of a variable or kernel-local; array reads see the current element.
    Var(String),
    /// The vectorization index.
    Index,
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Where { cond: Box<Expr>, then: Box<Expr>, otherwise: Box<Expr> },
    Cast { dtype: DType, operand: Box<Expr> },
}

/// Kind of the vectorization index as seen by expressions.
pub const INDEX_DTYPE: DType = DType::Int64;

impl Expr {
    pub fn constant(value: impl Into<ConstValue>, dtype: DType) -> Self {
        Expr::Const { value: value.into().cast(dtype), dtype }
    }

    pub fn int(value: i64) -> Self {
        Self::constant(value, DType::Int64)
    }

    pub fn float(value: f64) -> Self {
        Self::constant(value, DType::Float64)
    }

    pub fn bool(value: bool) -> Self {
        Self::constant(value, DType::Bool)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn index() -> Self {
        Expr::Index
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary { op, operand: Box::new(operand) }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    pub fn where_(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Where { cond: Box::new(cond), then: Box::new(then), otherwise: Box::new(otherwise) }
    }

    pub fn cast(self, dtype: DType) -> Self {
        Expr::Cast { dtype, operand: Box::new(self) }
    }

    pub fn pow(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Pow, self, rhs)
    }

    pub fn floor_div(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::FloorDiv, self, rhs)
    }

    pub fn lt(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Lt, self, rhs)
    }

    pub fn le(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Le, self, rhs)
    }

    pub fn gt(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Gt, self, rhs)
    }

    pub fn ge(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Ge, self, rhs)
    }

    pub fn eq_(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Eq, self, rhs)
    }

    pub fn ne_(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Ne, self, rhs)
    }

    pub fn and(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::And, self, rhs)
    }

    pub fn or(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Or, self, rhs)
    }

    pub fn apply(self, op: UnaryOp) -> Self {
        Self::unary(op, self)
    }

    /// Infer the kind of this expression.
    ///
    /// `lookup` returns the kind of a named variable or local.
    pub fn dtype(&self, lookup: &dyn Fn(&str) -> Result<DType>) -> Result<DType> {
        match self {
            Expr::Const { dtype, .. } => Ok(*dtype),
            Expr::Var(name) => lookup(name),
            Expr::Index => Ok(INDEX_DTYPE),
            Expr::Unary { op, operand } => unary_result(*op, operand.dtype(lookup)?),
            Expr::Binary { op, lhs, rhs } => binary_result(*op, lhs.dtype(lookup)?, rhs.dtype(lookup)?),
            Expr::Where { cond, then, otherwise } => {
                where_result(cond.dtype(lookup)?, then.dtype(lookup)?, otherwise.dtype(lookup)?)
            }
            Expr::Cast { dtype, operand } => {
                operand.dtype(lookup)?;
                Ok(*dtype)
            }
        }
    }

    /// Names read by this expression, in name order.
    pub fn identifiers(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_identifiers(&mut names);
        names
    }

    fn collect_identifiers<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Const { .. } | Expr::Index => {}
            Expr::Var(name) => {
                names.insert(name.as_str());
            }
            Expr::Unary { operand, .. } | Expr::Cast { operand, .. } => operand.collect_identifiers(names),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_identifiers(names);
                rhs.collect_identifiers(names);
            }
            Expr::Where { cond, then, otherwise } => {
                cond.collect_identifiers(names);
                then.collect_identifiers(names);
                otherwise.collect_identifiers(names);
            }
        }
    }

    /// Whether this expression reads the vectorization index directly.
    pub fn uses_index(&self) -> bool {
        match self {
            Expr::Index => true,
            Expr::Const { .. } | Expr::Var(_) => false,
            Expr::Unary { operand, .. } | Expr::Cast { operand, .. } => operand.uses_index(),
            Expr::Binary { lhs, rhs, .. } => lhs.uses_index() || rhs.uses_index(),
            Expr::Where { cond, then, otherwise } => cond.uses_index() || then.uses_index() || otherwise.uses_index(),
        }
    }
}

macro_rules! impl_binary_operator {
    ($($trait:ident :: $method:ident => $op:expr),* $(,)?) => {
        $(impl std::ops::$trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self, rhs)
            }
        })*
    };
}

impl_binary_operator! {
    Add::add => BinaryOp::Add,
    Sub::sub => BinaryOp::Sub,
    Mul::mul => BinaryOp::Mul,
    Div::div => BinaryOp::Div,
    Rem::rem => BinaryOp::Mod,
}

impl std::ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::unary(UnaryOp::Not, self)
    }
}

/// Float kind a transcendental function computes in.
const fn float_of(dtype: DType) -> DType {
    match dtype {
        DType::Float32 => DType::Float32,
        _ => DType::Float64,
    }
}

/// Result kind of a unary operation.
pub fn unary_result(op: UnaryOp, dtype: DType) -> Result<DType> {
    match op {
        UnaryOp::Not => {
            ensure!(dtype.is_bool(), InvalidUnaryOperandSnafu { op, dtype });
            Ok(DType::Bool)
        }
        UnaryOp::Neg | UnaryOp::Abs | UnaryOp::Floor | UnaryOp::Ceil => {
            ensure!(!dtype.is_bool(), InvalidUnaryOperandSnafu { op, dtype });
            Ok(dtype)
        }
        UnaryOp::Sqrt | UnaryOp::Exp | UnaryOp::Log | UnaryOp::Sin | UnaryOp::Cos => {
            ensure!(!dtype.is_bool(), InvalidUnaryOperandSnafu { op, dtype });
            Ok(float_of(dtype))
        }
    }
}

/// Kind both operands are converted to before a binary operation.
pub fn operand_dtype(op: BinaryOp, lhs: DType, rhs: DType) -> Result<DType> {
    let invalid = InvalidBinaryOperandsSnafu { op, lhs, rhs };
    if op.is_logical() {
        ensure!(lhs.is_bool() && rhs.is_bool(), invalid);
        return Ok(DType::Bool);
    }
    if op.is_comparison() {
        ensure!(lhs.is_bool() == rhs.is_bool(), invalid);
        return Ok(lhs.promote(rhs));
    }
    ensure!(!lhs.is_bool() && !rhs.is_bool(), invalid);
    let common = lhs.promote(rhs);
    Ok(match op {
        BinaryOp::Div | BinaryOp::Pow => float_of(common),
        _ => common,
    })
}

/// Result kind of a binary operation.
pub fn binary_result(op: BinaryOp, lhs: DType, rhs: DType) -> Result<DType> {
    let operands = operand_dtype(op, lhs, rhs)?;
    Ok(if op.is_comparison() { DType::Bool } else { operands })
}

/// Result kind of a `where` expression.
pub fn where_result(cond: DType, then: DType, otherwise: DType) -> Result<DType> {
    ensure!(cond.is_bool(), NonBooleanConditionSnafu { actual: cond });
    Ok(then.promote(otherwise))
}

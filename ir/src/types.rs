//! Constant values, operators and the vectorization index.

use std::hash::{Hash, Hasher};
use std::mem::discriminant;

use cinder_dtype::DType;

/// Constant or runtime value of a single element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

// Floats hash by bit pattern so identical literals fingerprint identically.
impl Hash for ConstValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        discriminant(self).hash(state);
        match self {
            ConstValue::Int(v) => v.hash(state),
            ConstValue::UInt(v) => v.hash(state),
            ConstValue::Float(v) => v.to_bits().hash(state),
            ConstValue::Bool(v) => v.hash(state),
        }
    }
}

/// Helper macro to cast to target width and back to storage type (for proper truncation/extension).
macro_rules! cast_via {
    ($v:expr, $target:ty, $storage:ty) => {
        ($v as $target) as $storage
    };
}

#[inline]
fn cast_bool(v: bool, to: DType) -> ConstValue {
    use DType::*;
    match to {
        Bool => ConstValue::Bool(v),
        Int8 | Int16 | Int32 | Int64 => ConstValue::Int(v as i64),
        UInt8 | UInt16 | UInt32 | UInt64 => ConstValue::UInt(v as u64),
        Float32 | Float64 => ConstValue::Float(v as u8 as f64),
    }
}

#[inline]
fn cast_int(v: i64, to: DType) -> ConstValue {
    use DType::*;
    match to {
        Bool => ConstValue::Bool(v != 0),
        Int8 => ConstValue::Int(cast_via!(v, i8, i64)),
        Int16 => ConstValue::Int(cast_via!(v, i16, i64)),
        Int32 => ConstValue::Int(cast_via!(v, i32, i64)),
        Int64 => ConstValue::Int(v),
        UInt8 => ConstValue::UInt(cast_via!(v, u8, u64)),
        UInt16 => ConstValue::UInt(cast_via!(v, u16, u64)),
        UInt32 => ConstValue::UInt(cast_via!(v, u32, u64)),
        UInt64 => ConstValue::UInt(v as u64),
        Float32 => ConstValue::Float(v as f32 as f64),
        Float64 => ConstValue::Float(v as f64),
    }
}

#[inline]
fn cast_uint(v: u64, to: DType) -> ConstValue {
    use DType::*;
    match to {
        Bool => ConstValue::Bool(v != 0),
        Int8 => ConstValue::Int(cast_via!(v, i8, i64)),
        Int16 => ConstValue::Int(cast_via!(v, i16, i64)),
        Int32 => ConstValue::Int(cast_via!(v, i32, i64)),
        Int64 => ConstValue::Int(v as i64),
        UInt8 => ConstValue::UInt(cast_via!(v, u8, u64)),
        UInt16 => ConstValue::UInt(cast_via!(v, u16, u64)),
        UInt32 => ConstValue::UInt(cast_via!(v, u32, u64)),
        UInt64 => ConstValue::UInt(v),
        Float32 => ConstValue::Float(v as f32 as f64),
        Float64 => ConstValue::Float(v as f64),
    }
}

#[inline]
fn cast_float(v: f64, to: DType) -> ConstValue {
    use DType::*;
    match to {
        Bool => ConstValue::Bool(v != 0.0),
        Int8 => ConstValue::Int(cast_via!(v, i8, i64)),
        Int16 => ConstValue::Int(cast_via!(v, i16, i64)),
        Int32 => ConstValue::Int(cast_via!(v, i32, i64)),
        Int64 => ConstValue::Int(v as i64),
        // Float-to-unsigned routes through i64 first, as C does on common targets
        UInt8 => ConstValue::UInt(cast_via!(v as i64, u8, u64)),
        UInt16 => ConstValue::UInt(cast_via!(v as i64, u16, u64)),
        UInt32 => ConstValue::UInt(cast_via!(v as i64, u32, u64)),
        UInt64 => ConstValue::UInt((v as i64) as u64),
        Float32 => ConstValue::Float(v as f32 as f64),
        Float64 => ConstValue::Float(v),
    }
}

impl ConstValue {
    /// Natural kind of the stored representation.
    pub const fn dtype(&self) -> DType {
        match self {
            ConstValue::Int(_) => DType::Int64,
            ConstValue::UInt(_) => DType::UInt64,
            ConstValue::Float(_) => DType::Float64,
            ConstValue::Bool(_) => DType::Bool,
        }
    }

    pub const fn zero(dtype: DType) -> Self {
        use DType::*;
        match dtype {
            Bool => Self::Bool(false),
            Int8 | Int16 | Int32 | Int64 => Self::Int(0),
            UInt8 | UInt16 | UInt32 | UInt64 => Self::UInt(0),
            Float32 | Float64 => Self::Float(0.0),
        }
    }

    /// Cast this value to `to` with C conversion semantics (wrapping,
    /// truncating toward zero).
    pub fn cast(self, to: DType) -> ConstValue {
        match self {
            ConstValue::Bool(v) => cast_bool(v, to),
            ConstValue::Int(v) => cast_int(v, to),
            ConstValue::UInt(v) => cast_uint(v, to),
            ConstValue::Float(v) => cast_float(v, to),
        }
    }

    /// Truth value, with C semantics for non-bool values.
    pub fn truthy(self) -> bool {
        match self {
            ConstValue::Bool(b) => b,
            ConstValue::Int(v) => v != 0,
            ConstValue::UInt(v) => v != 0,
            ConstValue::Float(v) => v != 0.0,
        }
    }

    /// Interpret as an element count.
    ///
    /// Returns `None` for negative, fractional, non-finite or bool values.
    pub fn as_size(self) -> Option<usize> {
        match self {
            ConstValue::Int(v) => usize::try_from(v).ok(),
            ConstValue::UInt(v) => usize::try_from(v).ok(),
            ConstValue::Float(_) | ConstValue::Bool(_) => None,
        }
    }

    /// Encode into native-endian storage of `dtype`.
    pub fn write_ne_bytes(self, dtype: DType, out: &mut [u8]) {
        let value = self.cast(dtype);
        macro_rules! put {
            ($v:expr, $ty:ty) => {
                out[..std::mem::size_of::<$ty>()].copy_from_slice(&($v as $ty).to_ne_bytes())
            };
        }
        match (value, dtype) {
            (ConstValue::Bool(b), _) => out[0] = b as u8,
            (ConstValue::Int(v), DType::Int8) => put!(v, i8),
            (ConstValue::Int(v), DType::Int16) => put!(v, i16),
            (ConstValue::Int(v), DType::Int32) => put!(v, i32),
            (ConstValue::Int(v), _) => put!(v, i64),
            (ConstValue::UInt(v), DType::UInt8) => put!(v, u8),
            (ConstValue::UInt(v), DType::UInt16) => put!(v, u16),
            (ConstValue::UInt(v), DType::UInt32) => put!(v, u32),
            (ConstValue::UInt(v), _) => put!(v, u64),
            (ConstValue::Float(v), DType::Float32) => put!(v, f32),
            (ConstValue::Float(v), _) => put!(v, f64),
        }
    }

    /// Decode one element of `dtype` from native-endian storage.
    pub fn read_ne_bytes(dtype: DType, bytes: &[u8]) -> ConstValue {
        use cinder_dtype::HasDType;
        match dtype {
            DType::Bool => ConstValue::Bool(bool::from_ne_slice(bytes)),
            DType::Int8 => ConstValue::Int(i8::from_ne_slice(bytes) as i64),
            DType::Int16 => ConstValue::Int(i16::from_ne_slice(bytes) as i64),
            DType::Int32 => ConstValue::Int(i32::from_ne_slice(bytes) as i64),
            DType::Int64 => ConstValue::Int(i64::from_ne_slice(bytes)),
            DType::UInt8 => ConstValue::UInt(u8::from_ne_slice(bytes) as u64),
            DType::UInt16 => ConstValue::UInt(u16::from_ne_slice(bytes) as u64),
            DType::UInt32 => ConstValue::UInt(u32::from_ne_slice(bytes) as u64),
            DType::UInt64 => ConstValue::UInt(u64::from_ne_slice(bytes)),
            DType::Float32 => ConstValue::Float(f32::from_ne_slice(bytes) as f64),
            DType::Float64 => ConstValue::Float(f64::from_ne_slice(bytes)),
        }
    }
}

impl From<bool> for ConstValue {
    fn from(v: bool) -> Self {
        ConstValue::Bool(v)
    }
}

impl From<i64> for ConstValue {
    fn from(v: i64) -> Self {
        ConstValue::Int(v)
    }
}

impl From<u64> for ConstValue {
    fn from(v: u64) -> Self {
        ConstValue::UInt(v)
    }
}

impl From<f64> for ConstValue {
    fn from(v: f64) -> Self {
        ConstValue::Float(v)
    }
}

/// Unary operators and elementwise functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr)]
pub enum UnaryOp {
    Neg,
    Not,
    Abs,
    Sqrt,
    Exp,
    Log,
    Sin,
    Cos,
    Floor,
    Ceil,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// True division; integer operands produce a float.
    Div,
    /// Division rounding toward negative infinity.
    FloorDiv,
    /// Remainder with the sign of the divisor.
    Mod,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub const fn is_comparison(self) -> bool {
        matches!(self, Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::Eq | Self::Ne)
    }

    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

/// Logical element position bound while evaluating code.
///
/// `Scalar` marks the scalar pass: it is distinct from every element
/// position by construction and carries no numeric meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorIndex {
    Scalar,
    Element(usize),
}

impl VectorIndex {
    pub const fn element(&self) -> Option<usize> {
        match self {
            Self::Scalar => None,
            Self::Element(i) => Some(*i),
        }
    }
}

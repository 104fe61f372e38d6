//! Numeric kinds, backends and backend type resolution.
//!
//! Every abstract variable carries a [`DType`]. Before any source text is
//! emitted, the kind is resolved against a [`Backend`]'s [`TypeTable`] into a
//! [`ResolvedType`]: the storage kind, its byte width and the tag the host
//! array system uses to describe it.

pub mod cast;
pub mod error;
pub mod ext;
pub mod resolve;


pub use error::*;
pub use ext::HasDType;
pub use resolve::{ResolvedType, TypeResolver, TypeTable, resolve};

/// Numeric kind of an abstract variable.
#[derive(Debug, Hash, PartialOrd, Ord)]
#[derive(strum::EnumCount, strum::EnumIter, strum::VariantArray, strum::Display)]
#[derive(enumset::EnumSetType)]
#[strum(serialize_all = "lowercase")]
#[enumset(repr = "u32")]
pub enum DType {
    Bool = 0,

    // Interleaved signed/unsigned for correct LUB priority (lower = more specific)
    Int8 = 1,
    UInt8 = 2,
    Int16 = 3,
    UInt16 = 4,
    Int32 = 5,
    UInt32 = 6,
    Int64 = 7,
    UInt64 = 8,

    Float32 = 9,
    Float64 = 10,
}

/// Storage class of a numeric kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DTypeClass {
    Bool,
    Signed,
    Unsigned,
    Float,
}

impl DType {
    pub const fn bits(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 8,
            Self::Int16 | Self::UInt16 => 16,
            Self::Int32 | Self::UInt32 | Self::Float32 => 32,
            Self::Int64 | Self::UInt64 | Self::Float64 => 64,
        }
    }

    pub const fn bytes(&self) -> usize {
        self.bits() / 8
    }

    pub const fn class(&self) -> DTypeClass {
        match self {
            Self::Bool => DTypeClass::Bool,
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 => DTypeClass::Signed,
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64 => DTypeClass::Unsigned,
            Self::Float32 | Self::Float64 => DTypeClass::Float,
        }
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub const fn is_signed(&self) -> bool {
        matches!(self.class(), DTypeClass::Signed)
    }

    pub const fn is_unsigned(&self) -> bool {
        matches!(self.class(), DTypeClass::Unsigned)
    }

    pub const fn is_int(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub const fn is_float(&self) -> bool {
        matches!(self.class(), DTypeClass::Float)
    }
}

/// A numeric backend that kernels are generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumIter, strum::EnumString, strum::EnumCount)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Backend {
    /// C++ compiled in-process against the NumPy C API.
    #[strum(to_string = "cpp", serialize = "weave")]
    Cpp,
    /// Vectorized NumPy source executed by the host interpreter.
    Numpy,
}

/// Tag the host array system uses to describe an element type.
///
/// Mirrors a NumPy dtype: the numeric type number and the one-character code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostTypeTag {
    num: i32,
    code: char,
}

impl HostTypeTag {
    pub const fn new(num: i32, code: char) -> Self {
        Self { num, code }
    }

    /// NumPy type number (`NPY_INT32` etc).
    pub const fn num(&self) -> i32 {
        self.num
    }

    /// NumPy type character (`'i'`, `'d'`, ...).
    pub const fn code(&self) -> char {
        self.code
    }
}

impl std::fmt::Display for HostTypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.code, self.num)
    }
}

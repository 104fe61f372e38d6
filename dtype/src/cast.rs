use super::*;
use enumset::EnumSet;

impl DType {
    const fn promotion_lattice(self) -> &'static [Self] {
        use DType::*;
        match self {
            Bool => &[Int8, UInt8],
            Int8 => &[Int16],
            Int16 => &[Int32, Float32],
            Int32 => &[Int64, Float64],
            Int64 => &[Float64],
            UInt8 => &[Int16, UInt16],
            UInt16 => &[Int32, UInt32, Float32],
            UInt32 => &[Int64, UInt64],
            UInt64 => &[Float64],
            Float32 => &[Float64],
            Float64 => &[],
        }
    }

    fn get_recursive_parents(self) -> EnumSet<Self> {
        self.promotion_lattice()
            .iter()
            .fold(EnumSet::only(self), |dtypes, &parent| dtypes.union(parent.get_recursive_parents()))
    }

    /// Check if casting from `self` to `to` preserves every value.
    pub fn can_safe_cast(self, to: Self) -> bool {
        self.get_recursive_parents().contains(to)
    }

    /// Find the least upper bound type for a set of dtypes.
    ///
    /// Float64 sits at the top of the lattice, so any non-empty input has an
    /// upper bound.
    pub fn least_upper_dtype(dtypes: &[Self]) -> Option<Self> {
        dtypes
            .iter()
            .map(|d| d.get_recursive_parents())
            .reduce(|lhs, rhs| lhs.intersection(rhs))?
            .iter()
            .min() // min by discriminant (= priority: lower = more specific)
    }

    /// Result type of an arithmetic operation on two operands.
    pub fn promote(self, other: Self) -> Self {
        Self::least_upper_dtype(&[self, other]).unwrap_or(Self::Float64)
    }
}

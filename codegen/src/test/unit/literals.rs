use cinder_dtype::DType;
use cinder_ir::ConstValue;
use test_case::test_case;

use crate::cpp::types::{cpp_const, npy_type};
use crate::numpy::ops::numpy_const;

#[test_case(ConstValue::Bool(true), DType::Bool, "true"; "bool")]
#[test_case(ConstValue::Int(-3), DType::Int32, "-3"; "int32")]
#[test_case(ConstValue::Int(7), DType::Int64, "7LL"; "int64")]
#[test_case(ConstValue::Int(i64::MIN), DType::Int64, "INT64_MIN"; "int64 min")]
#[test_case(ConstValue::UInt(5), DType::UInt16, "5u"; "uint16")]
#[test_case(ConstValue::UInt(5), DType::UInt64, "5ULL"; "uint64")]
#[test_case(ConstValue::Float(0.5), DType::Float32, "0.5f"; "float32")]
#[test_case(ConstValue::Float(2.0), DType::Float64, "2.0"; "float64")]
#[test_case(ConstValue::Float(f64::NEG_INFINITY), DType::Float32, "(-INFINITY)"; "float32 -inf")]
#[test_case(ConstValue::Int(3), DType::Float64, "3.0"; "int as float")]
fn test_cpp_literal(value: ConstValue, dtype: DType, expected: &str) {
    assert_eq!(cpp_const(&value, dtype), expected);
}

#[test_case(ConstValue::Bool(false), DType::Bool, "False"; "bool")]
#[test_case(ConstValue::Int(-3), DType::Int64, "-3"; "int64")]
#[test_case(ConstValue::Int(9), DType::Int8, "_numpy.int8(9)"; "int8")]
#[test_case(ConstValue::Float(1.5), DType::Float32, "_numpy.float32(1.5)"; "float32")]
#[test_case(ConstValue::Float(f64::NAN), DType::Float64, "_numpy.nan"; "nan")]
fn test_numpy_literal(value: ConstValue, dtype: DType, expected: &str) {
    assert_eq!(numpy_const(&value, dtype), expected);
}

#[test_case(DType::Int64, "NPY_LONGLONG")]
#[test_case(DType::UInt64, "NPY_ULONGLONG")]
#[test_case(DType::Float64, "NPY_FLOAT64")]
#[test_case(DType::Bool, "NPY_BOOL")]
fn test_npy_type(dtype: DType, expected: &str) {
    assert_eq!(npy_type(dtype), expected);
}

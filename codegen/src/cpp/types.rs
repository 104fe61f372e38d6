//! C++ type mapping and constant rendering.

use cinder_dtype::DType;
use cinder_ir::ConstValue;

/// Convert a DType to its C++ scalar type string.
pub fn cpp_scalar(dtype: DType) -> &'static str {
    match dtype {
        DType::Bool => "bool",
        DType::Int8 => "int8_t",
        DType::UInt8 => "uint8_t",
        DType::Int16 => "int16_t",
        DType::UInt16 => "uint16_t",
        DType::Int32 => "int32_t",
        DType::UInt32 => "uint32_t",
        DType::Int64 => "int64_t",
        DType::UInt64 => "uint64_t",
        DType::Float32 => "float",
        DType::Float64 => "double",
    }
}

/// NumPy C API type number macro for a kind.
///
/// 64-bit integers use the `LONGLONG` names, matching the host type tags.
pub fn npy_type(dtype: DType) -> &'static str {
    match dtype {
        DType::Bool => "NPY_BOOL",
        DType::Int8 => "NPY_INT8",
        DType::UInt8 => "NPY_UINT8",
        DType::Int16 => "NPY_INT16",
        DType::UInt16 => "NPY_UINT16",
        DType::Int32 => "NPY_INT32",
        DType::UInt32 => "NPY_UINT32",
        DType::Int64 => "NPY_LONGLONG",
        DType::UInt64 => "NPY_ULONGLONG",
        DType::Float32 => "NPY_FLOAT32",
        DType::Float64 => "NPY_FLOAT64",
    }
}

/// C math function name for a float kind (`sqrtf` for float32).
pub fn cpp_math_fn(name: &str, dtype: DType) -> String {
    match dtype {
        DType::Float32 => format!("{name}f"),
        _ => name.to_string(),
    }
}

/// C-style cast of an expression.
pub fn cpp_cast(expr: &str, dtype: DType) -> String {
    format!("(({}){expr})", cpp_scalar(dtype))
}

/// Render a constant value as a C++ literal.
pub fn cpp_const(val: &ConstValue, dtype: DType) -> String {
    match val.cast(dtype) {
        ConstValue::Bool(b) => if b { "true" } else { "false" }.to_string(),
        ConstValue::Int(i) => match dtype {
            DType::Int64 if i == i64::MIN => "INT64_MIN".to_string(),
            DType::Int64 => format!("{i}LL"),
            _ => i.to_string(),
        },
        ConstValue::UInt(u) => match dtype {
            DType::UInt64 => format!("{u}ULL"),
            _ => format!("{u}u"),
        },
        ConstValue::Float(f) => cpp_float(f, dtype),
    }
}

/// Render a float constant as a C++ literal.
fn cpp_float(f: f64, dtype: DType) -> String {
    if f.is_nan() {
        return match dtype {
            DType::Float32 => "NAN".to_string(),
            _ => "((double)NAN)".to_string(),
        };
    }

    if f.is_infinite() {
        let sign = if f.is_sign_negative() { "-" } else { "" };
        return match dtype {
            DType::Float32 => format!("({sign}INFINITY)"),
            _ => format!("({sign}(double)INFINITY)"),
        };
    }

    // Debug output round-trips and always carries a '.' or an exponent
    match dtype {
        DType::Float32 => format!("{:?}f", f as f32),
        _ => format!("{f:?}"),
    }
}

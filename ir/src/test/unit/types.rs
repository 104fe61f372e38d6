//! Constant value conversion tests.

use test_case::test_case;

use crate::{ConstValue, DType};

#[test_case(ConstValue::Int(300), DType::UInt8, ConstValue::UInt(44); "int wraps into u8")]
#[test_case(ConstValue::Int(-1), DType::UInt32, ConstValue::UInt(u32::MAX as u64); "negative into u32")]
#[test_case(ConstValue::Float(2.9), DType::Int32, ConstValue::Int(2); "float truncates")]
#[test_case(ConstValue::Float(-2.9), DType::Int64, ConstValue::Int(-2); "float truncates toward zero")]
#[test_case(ConstValue::Bool(true), DType::Float64, ConstValue::Float(1.0); "bool to float")]
#[test_case(ConstValue::Int(0), DType::Bool, ConstValue::Bool(false); "zero is false")]
#[test_case(ConstValue::UInt(7), DType::Int8, ConstValue::Int(7); "uint to int")]
fn test_cast(value: ConstValue, to: DType, expected: ConstValue) {
    assert_eq!(value.cast(to), expected);
}

#[test]
fn test_float32_cast_rounds() {
    let ConstValue::Float(v) = ConstValue::Float(0.1).cast(DType::Float32) else { panic!("expected float") };
    assert_eq!(v, 0.1f32 as f64);
}

#[test]
fn test_as_size() {
    assert_eq!(ConstValue::Int(5).as_size(), Some(5));
    assert_eq!(ConstValue::UInt(0).as_size(), Some(0));
    assert_eq!(ConstValue::Int(-1).as_size(), None);
    assert_eq!(ConstValue::Float(3.0).as_size(), None);
    assert_eq!(ConstValue::Bool(true).as_size(), None);
}

#[test]
fn test_truthy() {
    assert!(ConstValue::Float(0.5).truthy());
    assert!(!ConstValue::UInt(0).truthy());
    assert!(ConstValue::Int(-3).truthy());
}

#[test]
fn test_ne_bytes_per_kind() {
    for (value, dtype) in [
        (ConstValue::Int(-7), DType::Int16),
        (ConstValue::UInt(250), DType::UInt8),
        (ConstValue::Float(1.5), DType::Float32),
        (ConstValue::Float(-2.25), DType::Float64),
        (ConstValue::Bool(true), DType::Bool),
        (ConstValue::Int(i64::MIN), DType::Int64),
    ] {
        let mut bytes = [0u8; 8];
        value.write_ne_bytes(dtype, &mut bytes);
        assert_eq!(ConstValue::read_ne_bytes(dtype, &bytes[..dtype.bytes()]), value, "{dtype}");
    }
}

#[test]
fn test_write_casts_to_storage() {
    let mut bytes = [0u8; 4];
    ConstValue::Float(3.75).write_ne_bytes(DType::Int32, &mut bytes);
    assert_eq!(i32::from_ne_bytes(bytes), 3);
}

#[test]
fn test_float_hash_by_bits() {
    use std::hash::{DefaultHasher, Hash, Hasher};
    let hash = |value: ConstValue| {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    };
    assert_eq!(hash(ConstValue::Float(1.0)), hash(ConstValue::Float(1.0)));
    assert_ne!(hash(ConstValue::Float(1.0)), hash(ConstValue::Int(1)));
}

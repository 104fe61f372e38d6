use std::sync::Arc;

use cinder_dtype::{Backend, DType, resolve};
use cinder_ir::ConstValue;
use test_case::test_case;

use crate::{Buffer, CpuAllocator, Error, TrackingAllocator};

fn tracking() -> Arc<TrackingAllocator<CpuAllocator>> {
    Arc::new(TrackingAllocator::new(CpuAllocator))
}

#[test_case(DType::Float64, 16, 128; "float64")]
#[test_case(DType::Int32, 10, 40; "int32")]
#[test_case(DType::Bool, 7, 7; "bool")]
#[test_case(DType::Int64, 0, 0; "empty")]
fn test_allocation_size(dtype: DType, capacity: usize, bytes: usize) {
    let element = resolve(dtype, Backend::Cpp).unwrap();
    let buffer = Buffer::allocate(element, capacity, Arc::new(CpuAllocator)).unwrap();

    assert_eq!(buffer.byte_size(), bytes);
    assert_eq!(buffer.capacity(), capacity);
    assert!(buffer.is_empty());
}

#[test]
fn test_push_and_read_back() {
    let element = resolve(DType::Int32, Backend::Numpy).unwrap();
    let mut buffer = Buffer::allocate(element, 3, Arc::new(CpuAllocator)).unwrap();

    buffer.push(ConstValue::Int(4)).unwrap();
    buffer.push(ConstValue::UInt(9)).unwrap();

    assert_eq!(buffer.len(), 2);
    assert_eq!(buffer.get(0).unwrap(), ConstValue::Int(4));
    assert_eq!(buffer.get(1).unwrap(), ConstValue::Int(9));
    assert!(matches!(buffer.get(2), Err(Error::OutOfBounds { index: 2, len: 2 })));
}

#[test]
fn test_push_converts_to_storage() {
    let element = resolve(DType::Float32, Backend::Cpp).unwrap();
    let mut buffer = Buffer::allocate(element, 1, Arc::new(CpuAllocator)).unwrap();

    buffer.push(ConstValue::Int(3)).unwrap();
    assert_eq!(buffer.get(0).unwrap(), ConstValue::Float(3.0));
}

#[test]
fn test_push_past_capacity() {
    let element = resolve(DType::Int64, Backend::Cpp).unwrap();
    let mut buffer = Buffer::allocate(element, 2, Arc::new(CpuAllocator)).unwrap();

    buffer.push(ConstValue::Int(0)).unwrap();
    buffer.push(ConstValue::Int(1)).unwrap();
    assert!(buffer.is_full());

    let err = buffer.push(ConstValue::Int(2)).unwrap_err();
    assert_eq!(err, Error::CapacityExceeded { capacity: 2 });
    assert_eq!(buffer.len(), 2);
}

#[test]
fn test_zero_capacity_refuses_push() {
    let element = resolve(DType::Int32, Backend::Cpp).unwrap();
    let mut buffer = Buffer::allocate(element, 0, Arc::new(CpuAllocator)).unwrap();

    assert!(matches!(buffer.push(ConstValue::Int(0)), Err(Error::CapacityExceeded { capacity: 0 })));
}

#[test]
fn test_drop_frees_once() {
    let allocator = tracking();
    let element = resolve(DType::Float64, Backend::Cpp).unwrap();

    let buffer = Buffer::allocate(element, 8, allocator.clone()).unwrap();
    assert_eq!(allocator.live(), 1);

    drop(buffer);
    assert_eq!(allocator.allocated(), 1);
    assert_eq!(allocator.freed(), 1);
    assert_eq!(allocator.live(), 0);
}

#[test]
fn test_allocation_failure() {
    let allocator = Arc::new(TrackingAllocator::with_limit(CpuAllocator, 64));
    let element = resolve(DType::Float64, Backend::Cpp).unwrap();

    let err = Buffer::allocate(element, 9, allocator.clone()).unwrap_err();
    assert!(matches!(err, Error::Allocation { elements: 9, bytes: 72, .. }));
    assert_eq!(allocator.allocated(), 0);

    assert!(Buffer::allocate(element, 8, allocator).is_ok());
}

#[test]
fn test_allocation_overflow() {
    let element = resolve(DType::Float64, Backend::Cpp).unwrap();
    let err = Buffer::allocate(element, usize::MAX, Arc::new(CpuAllocator)).unwrap_err();
    assert!(matches!(err, Error::Allocation { bytes: usize::MAX, .. }));
}

#[test_case(DType::Int8, ConstValue::UInt(128); "int8 overflow")]
#[test_case(DType::UInt8, ConstValue::UInt(256); "uint8 overflow")]
#[test_case(DType::UInt16, ConstValue::Int(-1); "negative into unsigned")]
#[test_case(DType::Int64, ConstValue::UInt(u64::MAX); "uint64 into int64")]
fn test_push_refuses_wrapping(dtype: DType, value: ConstValue) {
    let allocator = tracking();
    let element = resolve(dtype, Backend::Cpp).unwrap();
    let mut buffer = Buffer::allocate(element, 2, allocator.clone()).unwrap();

    let err = buffer.push(value).unwrap_err();
    assert!(matches!(err, Error::Unrepresentable { dtype: d, .. } if d == dtype));
    assert!(buffer.is_empty());

    drop(buffer);
    assert_eq!(allocator.freed(), 1);
}

#[test]
fn test_push_accepts_range_limits() {
    let element = resolve(DType::Int8, Backend::Cpp).unwrap();
    let mut buffer = Buffer::allocate(element, 2, Arc::new(CpuAllocator)).unwrap();

    buffer.push(ConstValue::UInt(127)).unwrap();
    buffer.push(ConstValue::Int(-128)).unwrap();
    assert_eq!(buffer.get(0).unwrap(), ConstValue::Int(127));
    assert_eq!(buffer.get(1).unwrap(), ConstValue::Int(-128));
}

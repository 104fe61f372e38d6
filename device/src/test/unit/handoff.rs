use std::sync::Arc;

use cinder_dtype::{Backend, DType, ResolvedType, resolve};
use cinder_ir::ConstValue;

use crate::{Buffer, CpuAllocator, Error, HostArray, HostRuntime, NumpyHost, RawBuffer, Rejected, TrackingAllocator};

/// Host that refuses every buffer.
struct RefusingHost;

impl HostRuntime for RefusingHost {
    fn name(&self) -> &str {
        "refusing"
    }

    fn wrap(&self, raw: RawBuffer, _len: usize, _element: ResolvedType) -> Result<HostArray, Rejected> {
        Err(Rejected { raw, reason: "out of host memory".to_string() })
    }
}

fn filled(dtype: DType, capacity: usize, values: &[i64], allocator: Arc<TrackingAllocator<CpuAllocator>>) -> Buffer {
    let element = resolve(dtype, Backend::Numpy).unwrap();
    let mut buffer = Buffer::allocate(element, capacity, allocator).unwrap();
    for value in values {
        buffer.push(ConstValue::Int(*value)).unwrap();
    }
    buffer
}

#[test]
fn test_handoff_shape_is_cursor() {
    let allocator = Arc::new(TrackingAllocator::new(CpuAllocator));
    let buffer = filled(DType::Int32, 10, &[1, 3, 5], allocator.clone());
    let len = buffer.len();

    let array = buffer.handoff(len, &NumpyHost).unwrap();
    assert_eq!(array.shape(), &[3]);
    assert_eq!(array.dtype(), DType::Int32);
    assert_eq!(array.host_tag(), resolve(DType::Int32, Backend::Numpy).unwrap().host_tag());
    assert_eq!(array.to_vec::<i32>().unwrap(), vec![1, 3, 5]);

    // The host owns the storage now.
    assert_eq!(allocator.freed(), 0);
}

#[test]
fn test_handoff_empty() {
    let allocator = Arc::new(TrackingAllocator::new(CpuAllocator));
    let buffer = filled(DType::Int64, 0, &[], allocator);

    let array = buffer.handoff(0, &NumpyHost).unwrap();
    assert_eq!(array.shape(), &[0]);
    assert!(array.is_empty());
    assert!(array.values().is_empty());
}

#[test]
fn test_handoff_rejects_length_past_capacity() {
    let allocator = Arc::new(TrackingAllocator::new(CpuAllocator));
    let buffer = filled(DType::Int32, 2, &[0], allocator.clone());

    let err = buffer.handoff(3, &NumpyHost).unwrap_err();
    assert_eq!(err, Error::InvalidLength { len: 3, capacity: 2 });
    assert_eq!(allocator.freed(), 1);
}

#[test]
fn test_refused_handoff_frees_storage() {
    let allocator = Arc::new(TrackingAllocator::new(CpuAllocator));
    let buffer = filled(DType::Float64, 4, &[2, 4], allocator.clone());

    let err = buffer.handoff(2, &RefusingHost).unwrap_err();
    assert!(matches!(err, Error::Handoff { ref host, ref reason } if host == "refusing" && reason == "out of host memory"));
    assert_eq!(allocator.allocated(), 1);
    assert_eq!(allocator.freed(), 1);
}

#[test]
fn test_typed_read_requires_storage_kind() {
    let allocator = Arc::new(TrackingAllocator::new(CpuAllocator));
    let array = filled(DType::Int64, 2, &[7, -1], allocator).handoff(2, &NumpyHost).unwrap();

    assert!(array.to_vec::<i32>().is_none());
    assert_eq!(array.to_vec::<i64>().unwrap(), vec![7, -1]);
    assert_eq!(array.get(1), Some(ConstValue::Int(-1)));
    assert_eq!(array.get(2), None);
}

use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::Arc;

use cinder_dtype::ResolvedType;
use cinder_ir::ConstValue;
use snafu::{OptionExt, ensure};
use tracing::{debug, trace};

use crate::allocator::{Allocator, RawBuffer};
use crate::error::{AllocationSnafu, CapacityExceededSnafu, OutOfBoundsSnafu, Result, UnrepresentableSnafu};

/// Result buffer of one kernel invocation.
///
/// Elements are appended at the cursor; the buffer never grows past the
/// capacity it was allocated with. The storage goes back to the allocator on
/// drop unless it was handed to the host first.
///
/// This type is `!Sync`: a buffer has exactly one owner and is filled by a
/// single sequential scan.
#[derive(Debug)]
pub struct Buffer {
    element: ResolvedType,
    capacity: usize,
    cursor: usize,
    /// `None` once the storage has left the buffer.
    raw: Option<RawBuffer>,
    allocator: Arc<dyn Allocator>,
    _not_sync: PhantomData<Cell<()>>,
}

impl Buffer {
    /// Allocate storage for `capacity` elements of `element`.
    pub fn allocate(element: ResolvedType, capacity: usize, allocator: Arc<dyn Allocator>) -> Result<Self> {
        let bytes = capacity.checked_mul(element.byte_width());
        let raw = bytes.and_then(|bytes| allocator.alloc(bytes)).context(AllocationSnafu {
            allocator: allocator.name(),
            dtype: element.storage(),
            elements: capacity,
            bytes: bytes.unwrap_or(usize::MAX),
        })?;
        debug!(dtype = %element.storage(), capacity, bytes = raw.size(), allocator = allocator.name(), "allocated buffer");

        Ok(Self { element, capacity, cursor: 0, raw: Some(raw), allocator, _not_sync: PhantomData })
    }

    pub fn element(&self) -> ResolvedType {
        self.element
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of elements written so far.
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_full(&self) -> bool {
        self.cursor == self.capacity
    }

    /// Size of the storage in bytes.
    pub fn byte_size(&self) -> usize {
        self.raw.as_ref().map_or(0, RawBuffer::size)
    }

    pub fn allocator(&self) -> &Arc<dyn Allocator> {
        &self.allocator
    }

    /// Append one element, converted to the storage kind.
    ///
    /// Integers outside the range of an integer storage kind are refused
    /// rather than wrapped.
    pub fn push(&mut self, value: ConstValue) -> Result<()> {
        ensure!(self.cursor < self.capacity, CapacityExceededSnafu { capacity: self.capacity });
        let storage = self.element.storage();
        ensure!(
            fits(value, value.cast(storage)),
            UnrepresentableSnafu { value: format!("{value:?}"), dtype: storage }
        );
        let width = self.element.byte_width();
        let offset = self.cursor * width;
        if let Some(raw) = self.raw.as_mut() {
            value.write_ne_bytes(self.element.storage(), &mut raw.as_bytes_mut()[offset..offset + width]);
        }
        trace!(index = self.cursor, ?value, "buffer push");
        self.cursor += 1;
        Ok(())
    }

    /// Read back a written element.
    pub fn get(&self, index: usize) -> Result<ConstValue> {
        ensure!(index < self.cursor, OutOfBoundsSnafu { index, len: self.cursor });
        let width = self.element.byte_width();
        let raw = self.raw.as_ref().context(OutOfBoundsSnafu { index, len: 0usize })?;
        let bytes = &raw.as_bytes()[index * width..(index + 1) * width];
        Ok(ConstValue::read_ne_bytes(self.element.storage(), bytes))
    }

    /// Move the storage out; dropping the buffer afterwards frees nothing.
    pub(crate) fn take_raw(&mut self) -> Option<RawBuffer> {
        self.raw.take()
    }
}

/// Whether an integer survives the conversion to storage unchanged.
fn fits(value: ConstValue, stored: ConstValue) -> bool {
    match (value, stored) {
        (ConstValue::Int(a), ConstValue::Int(b)) => a == b,
        (ConstValue::UInt(a), ConstValue::UInt(b)) => a == b,
        (ConstValue::Int(a), ConstValue::UInt(b)) => u64::try_from(a).is_ok_and(|a| a == b),
        (ConstValue::UInt(a), ConstValue::Int(b)) => i64::try_from(a).is_ok_and(|a| a == b),
        _ => true,
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            trace!(bytes = raw.size(), "freeing buffer");
            self.allocator.free(raw);
        }
    }
}

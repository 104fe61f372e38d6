use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Opaque handle to host memory.
///
/// Owned by exactly one [`Buffer`](crate::Buffer) or
/// [`HostArray`](crate::HostArray) at a time.
#[derive(Debug, PartialEq, Eq)]
pub struct RawBuffer {
    data: Box<[u8]>,
}

impl RawBuffer {
    /// Get the size of the buffer in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

pub trait Allocator: Send + Sync + fmt::Debug {
    /// Allocate `size` zeroed bytes. `None` means the request cannot be served.
    fn alloc(&self, size: usize) -> Option<RawBuffer>;
    fn free(&self, _buffer: RawBuffer) {}
    fn name(&self) -> &str;
}

/// CPU allocator using system memory.
#[derive(Debug, Clone, Default)]
pub struct CpuAllocator;

impl Allocator for CpuAllocator {
    fn alloc(&self, size: usize) -> Option<RawBuffer> {
        let mut data = Vec::new();
        data.try_reserve_exact(size).ok()?;
        data.resize(size, 0u8);
        Some(RawBuffer { data: data.into_boxed_slice() })
    }

    fn name(&self) -> &str {
        "CPU"
    }
}

/// Allocator wrapper counting live allocations and refusing requests above a
/// byte limit.
#[derive(Debug)]
pub struct TrackingAllocator<A: Allocator> {
    inner: A,
    limit: Option<usize>,
    allocated: AtomicUsize,
    freed: AtomicUsize,
}

impl<A: Allocator> TrackingAllocator<A> {
    pub fn new(inner: A) -> Self {
        Self { inner, limit: None, allocated: AtomicUsize::new(0), freed: AtomicUsize::new(0) }
    }

    pub fn with_limit(inner: A, limit: usize) -> Self {
        Self { limit: Some(limit), ..Self::new(inner) }
    }

    /// Number of successful allocations.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Acquire)
    }

    /// Number of buffers returned through [`Allocator::free`].
    pub fn freed(&self) -> usize {
        self.freed.load(Ordering::Acquire)
    }

    /// Allocations not yet freed.
    pub fn live(&self) -> usize {
        self.allocated() - self.freed()
    }
}

impl<A: Allocator> Allocator for TrackingAllocator<A> {
    fn alloc(&self, size: usize) -> Option<RawBuffer> {
        if self.limit.is_some_and(|limit| size > limit) {
            return None;
        }
        let buffer = self.inner.alloc(size)?;
        self.allocated.fetch_add(1, Ordering::AcqRel);
        Some(buffer)
    }

    fn free(&self, buffer: RawBuffer) {
        self.freed.fetch_add(1, Ordering::AcqRel);
        self.inner.free(buffer);
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

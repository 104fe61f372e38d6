//! Result buffers and their handoff to the host array system.
//!
//! A kernel invocation allocates one [`Buffer`] sized for the worst case,
//! appends selected elements to it and finally hands it to a
//! [`HostRuntime`], which wraps the storage as a [`HostArray`].

pub mod allocator;
pub mod buffer;
pub mod error;
pub mod handoff;

#[cfg(test)]
pub mod test;

pub use allocator::{Allocator, CpuAllocator, RawBuffer, TrackingAllocator};
pub use buffer::Buffer;
pub use error::*;
pub use handoff::{HostArray, HostRuntime, NumpyHost, Rejected};

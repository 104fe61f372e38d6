//! Transfer of a filled [`Buffer`] to the host array system.
//!
//! The protocol consumes the buffer. On success the storage belongs to the
//! returned [`HostArray`]; when the host refuses it, the storage comes back
//! and is released through the buffer's allocator before the error surfaces.
//! Either way it is released exactly once.

use cinder_dtype::{DType, HasDType, HostTypeTag, ResolvedType};
use cinder_ir::ConstValue;
use smallvec::{SmallVec, smallvec};
use snafu::ensure;
use tracing::{debug, warn};

use crate::allocator::RawBuffer;
use crate::error::{HandoffSnafu, InvalidLengthSnafu, Result};
use crate::Buffer;

/// Storage handed back by a host that could not wrap it.
#[derive(Debug)]
pub struct Rejected {
    pub raw: RawBuffer,
    pub reason: String,
}

/// Host array system receiving kernel results.
pub trait HostRuntime {
    fn name(&self) -> &str;

    /// Wrap the first `len` elements of `raw` as a one-dimensional array.
    fn wrap(&self, raw: RawBuffer, len: usize, element: ResolvedType) -> std::result::Result<HostArray, Rejected>;
}

/// One-dimensional array owned by the host.
#[derive(Debug)]
pub struct HostArray {
    shape: SmallVec<[usize; 1]>,
    host_tag: HostTypeTag,
    dtype: DType,
    data: RawBuffer,
}

impl HostArray {
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.shape[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn host_tag(&self) -> HostTypeTag {
        self.host_tag
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn get(&self, index: usize) -> Option<ConstValue> {
        if index >= self.len() {
            return None;
        }
        let width = self.dtype.bytes();
        Some(ConstValue::read_ne_bytes(self.dtype, &self.data.as_bytes()[index * width..(index + 1) * width]))
    }

    pub fn values(&self) -> Vec<ConstValue> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }

    /// Copy out the elements as `T`, if `T` is the storage kind.
    pub fn to_vec<T: HasDType>(&self) -> Option<Vec<T>> {
        if T::DTYPE != self.dtype {
            return None;
        }
        let bytes = &self.data.as_bytes()[..self.len() * self.dtype.bytes()];
        Some(bytes.chunks_exact(self.dtype.bytes()).map(T::from_ne_slice).collect())
    }
}

/// In-process NumPy-style host: wraps the storage without copying.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumpyHost;

impl HostRuntime for NumpyHost {
    fn name(&self) -> &str {
        "numpy"
    }

    fn wrap(&self, raw: RawBuffer, len: usize, element: ResolvedType) -> std::result::Result<HostArray, Rejected> {
        if len.saturating_mul(element.byte_width()) > raw.size() {
            let reason = format!("{len} elements do not fit in {} bytes", raw.size());
            return Err(Rejected { raw, reason });
        }
        Ok(HostArray { shape: smallvec![len], host_tag: element.host_tag(), dtype: element.storage(), data: raw })
    }
}

impl Buffer {
    /// Hand the first `len` elements to the host.
    pub fn handoff(mut self, len: usize, host: &dyn HostRuntime) -> Result<HostArray> {
        ensure!(len <= self.capacity(), InvalidLengthSnafu { len, capacity: self.capacity() });
        let element = self.element();
        let Some(raw) = self.take_raw() else {
            return HandoffSnafu { host: host.name(), reason: "buffer has no storage" }.fail();
        };

        match host.wrap(raw, len, element) {
            Ok(array) => {
                debug!(host = host.name(), len, tag = %array.host_tag(), "handed buffer to host");
                Ok(array)
            }
            Err(Rejected { raw, reason }) => {
                warn!(host = host.name(), %reason, "host rejected buffer, releasing storage");
                self.allocator().free(raw);
                HandoffSnafu { host: host.name(), reason }.fail()
            }
        }
    }
}

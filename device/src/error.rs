use cinder_dtype::DType;
use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The allocator could not provide the requested storage.
    #[snafu(display("failed to allocate {elements} x {dtype} ({bytes} bytes) with {allocator}"))]
    Allocation { allocator: String, dtype: DType, elements: usize, bytes: usize },

    /// The host refused to wrap the buffer; the storage was released.
    #[snafu(display("host {host} could not wrap buffer: {reason}"))]
    Handoff { host: String, reason: String },

    /// Append past the end of the buffer.
    #[snafu(display("buffer capacity {capacity} exceeded"))]
    CapacityExceeded { capacity: usize },

    /// Value that the storage kind cannot hold without wrapping.
    #[snafu(display("{value} does not fit in {dtype} storage"))]
    Unrepresentable { value: String, dtype: DType },

    /// Handoff length larger than the buffer.
    #[snafu(display("logical length {len} exceeds capacity {capacity}"))]
    InvalidLength { len: usize, capacity: usize },

    /// Element read past the written part of the buffer.
    #[snafu(display("element {index} out of bounds for length {len}"))]
    OutOfBounds { index: usize, len: usize },
}

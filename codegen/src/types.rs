//! Types for code generation.

use cinder_dtype::{Backend, DType};

/// A rendered kernel ready to be handed to the backend's build pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderedKernel {
    /// The generated source text.
    pub code: String,

    /// Entry point function name.
    pub entry_point: String,

    /// Kernel name (for debugging/caching).
    pub name: String,

    pub backend: Backend,

    /// Runtime arguments, in entry point order.
    pub args: Vec<KernelArg>,

    /// Variable the result array is typed after.
    pub output: String,
}

/// A runtime argument of a rendered kernel.
///
/// Compile-time constants are inlined into the source and never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelArg {
    /// Argument index.
    pub index: usize,

    /// Variable name.
    pub name: String,

    /// Data type.
    pub dtype: DType,

    /// Whether the argument is a per-element array.
    pub is_array: bool,

    /// Whether the kernel writes this argument.
    pub is_output: bool,
}

impl RenderedKernel {
    /// Create a new rendered kernel.
    pub fn new(code: String, entry_point: String, name: String, backend: Backend, output: String) -> Self {
        Self { code, entry_point, name, backend, args: Vec::new(), output }
    }

    /// Add a runtime argument.
    pub fn add_arg(&mut self, arg: KernelArg) {
        self.args.push(arg);
    }
}

//! Error types for kernel generation and execution.

use snafu::Snafu;

/// Result type for runtime operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while generating or running a kernel.
///
/// Generation errors (`Resolve`, `Codegen`) are never cached; execution
/// errors abort one invocation and leave the cache untouched.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// A variable's kind has no storage on the configured backend.
    #[snafu(display("type resolution failed: {source}"))]
    Resolve { source: cinder_dtype::Error },

    /// Codegen error occurred.
    #[snafu(display("codegen error: {source}"))]
    Codegen { source: cinder_codegen::Error },

    /// Evaluation of abstract code failed.
    #[snafu(display("evaluation error in '{kernel}': {source}"))]
    Eval { kernel: String, source: cinder_ir::Error },

    /// Buffer allocation, append or handoff failed.
    #[snafu(display("buffer error in '{kernel}': {source}"))]
    Device { kernel: String, source: cinder_device::Error },

    /// The namespace has no value for a runtime variable.
    #[snafu(display("no value bound for '{name}'"))]
    MissingValue { name: String },

    /// A size variable or array length is not a valid element count.
    #[snafu(display("invalid size for '{name}': {reason}"))]
    InvalidSize { name: String, reason: String },

    /// The kernel finished without handing a result to the host.
    #[snafu(display("kernel '{kernel}' produced no result"))]
    NoResult { kernel: String },
}

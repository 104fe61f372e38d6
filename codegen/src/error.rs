//! Error types for code generation.

use cinder_dtype::Backend;
use snafu::Snafu;

use crate::skeleton::Block;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while composing or rendering a kernel.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// A specialization names an extension point the skeleton does not define.
    #[snafu(display("{specialization}: skeleton '{skeleton}' has no block {block:?}"))]
    UnknownBlock { skeleton: String, specialization: String, block: Block },

    /// `Super` used in an override whose block has no base content.
    #[snafu(display("{specialization}: block {block:?} of skeleton '{skeleton}' has no base content"))]
    MissingBaseContent { skeleton: String, specialization: String, block: Block },

    /// `Super` or a block reference outside of an override.
    #[snafu(display("{specialization}: {what} is not allowed here"))]
    MisplacedNode { specialization: String, what: &'static str },

    /// A variable the specialization relies on is not declared.
    #[snafu(display("{specialization}: required variable '{name}' is not declared"))]
    MissingTemplateVariable { specialization: String, name: String },

    /// The output variable cannot back the kernel's result buffer.
    #[snafu(display("{specialization}: invalid output '{name}': {reason}"))]
    InvalidOutput { specialization: String, name: String, reason: String },

    /// Renderer asked to render a plan for another backend.
    #[snafu(display("plan resolved for {expected}, renderer targets {actual}"))]
    BackendMismatch { expected: Backend, actual: Backend },

    /// Abstract code failed validation.
    #[snafu(display("IR error: {source}"))]
    Ir { source: cinder_ir::Error },

    /// A variable's kind has no storage on the target backend.
    #[snafu(display("type resolution failed: {source}"))]
    Resolve { source: cinder_dtype::Error },
}

impl Error {
    /// Whether this is a template composition failure (as opposed to a type
    /// or resolution failure of the abstract code).
    pub fn is_composition(&self) -> bool {
        matches!(
            self,
            Error::UnknownBlock { .. }
                | Error::MissingBaseContent { .. }
                | Error::MisplacedNode { .. }
                | Error::MissingTemplateVariable { .. }
                | Error::InvalidOutput { .. }
        )
    }
}

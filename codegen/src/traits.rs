//! Core traits for code generation.

use cinder_dtype::{Backend, ResolvedType};
use cinder_ir::{Expr, Statement};

use crate::{Emitter, KernelPlan, RenderedKernel, Result, Scope, SizeSource};

/// Per-backend rendering contract.
///
/// A renderer turns a composed [`KernelPlan`] into source text. The plan has
/// already spliced base-block content into its overrides, so a renderer
/// only ever sees typed nodes.
pub trait Renderer: Send + Sync {
    /// Backend this renderer emits code for.
    fn backend(&self) -> Backend;

    /// Render a plan into source text.
    ///
    /// Must be deterministic: the same plan always renders to the same text.
    fn render(&self, plan: &KernelPlan) -> Result<RenderedKernel>;

    /// Expression for the element count, which is either a compile-time
    /// constant or a runtime scalar.
    fn render_size(&self, size: &SizeSource) -> String;

    /// Backend spelling of a storage type.
    fn storage_type(&self, resolved: &ResolvedType) -> String;

    /// Emit a statement list at the emitter's current indentation, declaring
    /// any locals in `scope`.
    fn render_statements(&self, statements: &[Statement], scope: &mut Scope<'_>, out: &mut Emitter) -> Result<()>;

    /// Render a single expression.
    fn render_expr(&self, expr: &Expr, scope: &Scope<'_>) -> Result<String>;
}

/// Renderer for a backend.
pub fn renderer_for(backend: Backend) -> Box<dyn Renderer> {
    match backend {
        Backend::Cpp => Box::new(crate::cpp::CppRenderer::new()),
        Backend::Numpy => Box::new(crate::numpy::NumpyRenderer::new()),
    }
}

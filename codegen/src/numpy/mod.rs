//! NumPy source code generation backend.
//!
//! Generates a Python function that takes the host namespace (a mapping from
//! variable name to value) and returns a one-dimensional array. The vector
//! pass is vectorized over all elements instead of looping; selection keeps
//! ascending element order and writes at most `_N` elements.

pub mod ops;

use cinder_dtype::{Backend, ResolvedType};
use cinder_ir::{Expr, Statement};
use snafu::ensure;

use crate::skeleton::{AppendSource, IndexBinding, KernelNode};
use crate::{
    BackendMismatchSnafu, Emitter, KernelPlan, MisplacedNodeSnafu, RenderedKernel, Renderer, Result, Scope, SizeSource,
    common,
};

use self::ops::{array_name, numpy_const, numpy_scalar, render_expr};

/// NumPy renderer.
pub struct NumpyRenderer;

impl NumpyRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NumpyRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for NumpyRenderer {
    fn backend(&self) -> Backend {
        Backend::Numpy
    }

    fn render(&self, plan: &KernelPlan) -> Result<RenderedKernel> {
        ensure!(
            plan.backend == Backend::Numpy,
            BackendMismatchSnafu { expected: plan.backend, actual: Backend::Numpy }
        );

        let entry_point = common::entry_point(plan);
        let args = common::collect_args(plan);
        let mut scope = Scope::new(&plan.variables);
        let mut out = Emitter::new("    ");

        out.line(format!("# {} ({})", plan.specialization, plan.skeleton));
        out.line("import numpy as _numpy");
        out.blank();
        out.blank();
        out.line(format!("def {entry_point}(_namespace):"));
        out.push_indent();

        for arg in &args {
            let bound = if arg.is_array { array_name(&arg.name) } else { arg.name.clone() };
            out.line(format!("{bound} = _namespace[\"{}\"]", arg.name));
        }
        for var in plan.variables.iter() {
            if let Some(value) = &var.constant {
                out.line(format!("{} = {}", var.name, numpy_const(value, var.dtype)));
            }
        }

        for node in &plan.nodes {
            self.render_node(node, plan, false, &mut scope, &mut out)?;
        }

        out.pop_indent();
        let code = out.finish();
        tracing::debug!(entry_point = %entry_point, lines = code.lines().count(), "rendered NumPy kernel");

        let mut kernel =
            RenderedKernel::new(code, entry_point, plan.specialization.clone(), Backend::Numpy, plan.output.name.clone());
        for arg in args {
            kernel.add_arg(arg);
        }
        Ok(kernel)
    }

    fn render_size(&self, size: &SizeSource) -> String {
        match size {
            SizeSource::Constant(n) => n.to_string(),
            SizeSource::Scalar(name) => format!("int({name})"),
        }
    }

    fn storage_type(&self, resolved: &ResolvedType) -> String {
        format!("_numpy.{}", numpy_scalar(resolved.storage()))
    }

    fn render_statements(&self, statements: &[Statement], scope: &mut Scope<'_>, out: &mut Emitter) -> Result<()> {
        ops::render_statements(statements, scope, out)
    }

    fn render_expr(&self, expr: &Expr, scope: &Scope<'_>) -> Result<String> {
        render_expr(expr, scope).map(|(code, _)| code)
    }
}

impl NumpyRenderer {
    /// `masked` is set inside `When`: appends then keep only the elements
    /// whose condition holds.
    fn render_node(
        &self,
        node: &KernelNode,
        plan: &KernelPlan,
        masked: bool,
        scope: &mut Scope<'_>,
        out: &mut Emitter,
    ) -> Result<()> {
        match node {
            KernelNode::Comment(text) => out.line(format!("# {text}")),
            KernelNode::ResolveSize => out.line(format!("_N = {}", self.render_size(&plan.size))),
            KernelNode::Allocate => {
                let element = self.storage_type(&plan.output.element);
                out.line(format!("_elements = _numpy.empty(_N, dtype={element})"));
                out.line("_numelements = 0");
            }
            // -1 is never an element position.
            KernelNode::BindIndex(IndexBinding::Sentinel) => out.line("_vectorisation_idx = -1"),
            KernelNode::BindIndex(IndexBinding::Element) => out.line("_vectorisation_idx = _idx"),
            KernelNode::Statements(pass) => self.render_statements(plan.code.statements(*pass), scope, out)?,
            KernelNode::EvaluateCondition => {
                let cond = match &plan.code.condition {
                    Some(cond) => self.render_expr(cond, scope)?,
                    None => "True".to_string(),
                };
                out.line(format!("_cond = _numpy.broadcast_to({cond}, (_N,))"));
            }
            KernelNode::When(body) => {
                for node in body {
                    self.render_node(node, plan, true, scope, out)?;
                }
            }
            KernelNode::Append(source) => {
                let values = match source {
                    AppendSource::Index => "_idx".to_string(),
                    AppendSource::Value(name) => {
                        format!("_numpy.broadcast_to({}, (_N,))", self.render_expr(&Expr::var(name.as_str()), scope)?)
                    }
                };
                let selected = if masked { format!("{values}[_cond]") } else { values };
                out.line(format!("_selected = {selected}"));
                out.line("if _numelements + _selected.shape[0] > _N:");
                out.push_indent();
                out.line("raise IndexError(\"result buffer capacity exceeded\")");
                out.pop_indent();
                out.line("_elements[_numelements:_numelements + _selected.shape[0]] = _selected");
                out.line("_numelements += _selected.shape[0]");
            }
            KernelNode::Loop(body) => {
                out.line("_idx = _numpy.arange(_N)");
                for node in body {
                    self.render_node(node, plan, masked, scope, out)?;
                }
            }
            KernelNode::Handoff => out.line("return _elements[:_numelements]"),
            KernelNode::Block(_) | KernelNode::Super => {
                return MisplacedNodeSnafu { specialization: plan.specialization.as_str(), what: "unexpanded placeholder" }
                    .fail();
            }
        }
        Ok(())
    }
}

/// Render a plan with the NumPy backend.
pub fn render(plan: &KernelPlan) -> Result<RenderedKernel> {
    NumpyRenderer::new().render(plan)
}

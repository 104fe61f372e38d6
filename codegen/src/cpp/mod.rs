//! C++ source code generation backend.
//!
//! Generates a C++ function against the Python and NumPy C APIs, suitable for
//! in-process compilation by the host. The function returns a freshly created
//! one-dimensional NumPy array that owns the result buffer.
//!
//! # Kernel Signature
//!
//! ```c
//! extern "C" PyObject* _kernel_<name>(T0* _ptr_array_a, T1* _ptr_n, ...);
//! ```
//! - one pointer per non-constant variable, in name order
//! - arrays are read at `_vectorisation_idx`, scalars through a reference
//! - compile-time constants are inlined as `const` locals

pub mod ops;
pub mod types;

use cinder_dtype::{Backend, ResolvedType};
use cinder_ir::{Expr, Statement};
use snafu::ensure;

use crate::skeleton::{AppendSource, IndexBinding, KernelNode};
use crate::{
    BackendMismatchSnafu, Emitter, KernelPlan, MisplacedNodeSnafu, RenderedKernel, Renderer, Result, Scope, SizeSource,
    common,
};

use self::ops::{SUPPORT_CODE, array_pointer, render_expr};
use self::types::{cpp_const, cpp_scalar, npy_type};

/// C++ renderer.
pub struct CppRenderer;

impl CppRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CppRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Render-time state of one kernel.
struct CppContext<'a> {
    plan: &'a KernelPlan,
    element_type: String,
}

impl Renderer for CppRenderer {
    fn backend(&self) -> Backend {
        Backend::Cpp
    }

    fn render(&self, plan: &KernelPlan) -> Result<RenderedKernel> {
        ensure!(plan.backend == Backend::Cpp, BackendMismatchSnafu { expected: plan.backend, actual: Backend::Cpp });

        let entry_point = common::entry_point(plan);
        let args = common::collect_args(plan);
        let ctx = CppContext { plan, element_type: self.storage_type(&plan.output.element) };
        let mut scope = Scope::new(&plan.variables);
        let mut out = Emitter::new("    ");

        out.line(format!("// {} ({})", plan.specialization, plan.skeleton));
        for include in ["<stdint.h>", "<stdlib.h>", "<math.h>", "<Python.h>", "<numpy/arrayobject.h>"] {
            out.line(format!("#include {include}"));
        }
        out.blank();
        for line in SUPPORT_CODE.lines() {
            out.line(line);
        }
        out.blank();

        let params: Vec<String> = args
            .iter()
            .map(|arg| {
                let ty = cpp_scalar(arg.dtype);
                if arg.is_array {
                    format!("{ty}* {}", array_pointer(&arg.name))
                } else {
                    format!("{ty}* _ptr_{}", arg.name)
                }
            })
            .collect();
        out.line(format!("extern \"C\" PyObject* {entry_point}({})", params.join(", ")));
        out.line("{");
        out.push_indent();

        for arg in args.iter().filter(|arg| !arg.is_array) {
            out.line(format!("{}& {name} = *_ptr_{name};", cpp_scalar(arg.dtype), name = arg.name));
        }
        for var in plan.variables.iter() {
            if let Some(value) = &var.constant {
                out.line(format!("const {} {} = {};", cpp_scalar(var.dtype), var.name, cpp_const(value, var.dtype)));
            }
        }

        for node in &plan.nodes {
            self.render_node(node, &ctx, &mut scope, &mut out)?;
        }

        out.pop_indent();
        out.line("}");

        let code = out.finish();
        tracing::debug!(entry_point = %entry_point, lines = code.lines().count(), "rendered C++ kernel");

        let mut kernel =
            RenderedKernel::new(code, entry_point, plan.specialization.clone(), Backend::Cpp, plan.output.name.clone());
        for arg in args {
            kernel.add_arg(arg);
        }
        Ok(kernel)
    }

    fn render_size(&self, size: &SizeSource) -> String {
        match size {
            SizeSource::Constant(n) => n.to_string(),
            SizeSource::Scalar(name) => format!("(size_t){name}"),
        }
    }

    fn storage_type(&self, resolved: &ResolvedType) -> String {
        cpp_scalar(resolved.storage()).to_string()
    }

    fn render_statements(&self, statements: &[Statement], scope: &mut Scope<'_>, out: &mut Emitter) -> Result<()> {
        ops::render_statements(statements, scope, out)
    }

    fn render_expr(&self, expr: &Expr, scope: &Scope<'_>) -> Result<String> {
        render_expr(expr, scope).map(|(code, _)| code)
    }
}

impl CppRenderer {
    fn render_node(
        &self,
        node: &KernelNode,
        ctx: &CppContext<'_>,
        scope: &mut Scope<'_>,
        out: &mut Emitter,
    ) -> Result<()> {
        let element = &ctx.element_type;
        match node {
            KernelNode::Comment(text) => out.line(format!("// {text}")),
            KernelNode::ResolveSize => {
                if let SizeSource::Scalar(name) = &ctx.plan.size
                    && ctx.plan.variables.get(name).is_none_or(|var| !var.dtype.is_unsigned())
                {
                    out.line(format!("if ({name} < 0)"));
                    out.line("{");
                    out.push_indent();
                    out.line(format!("PyErr_SetString(PyExc_ValueError, \"{name} must not be negative\");"));
                    out.line("return NULL;");
                    out.pop_indent();
                    out.line("}");
                }
                out.line(format!("const size_t _N = {};", self.render_size(&ctx.plan.size)));
            }
            KernelNode::Allocate => {
                out.line(format!(
                    "{element}* _elements = ({element}*)malloc(sizeof({element}) * (_N > 0 ? _N : 1));"
                ));
                out.line("if (_elements == NULL)");
                out.line("{");
                out.push_indent();
                out.line("PyErr_NoMemory();");
                out.line("return NULL;");
                out.pop_indent();
                out.line("}");
                out.line("size_t _numelements = 0;");
            }
            // The sentinel is not a valid position: every element index is below `_N`.
            KernelNode::BindIndex(IndexBinding::Sentinel) => out.line("const size_t _vectorisation_idx = SIZE_MAX;"),
            KernelNode::BindIndex(IndexBinding::Element) => out.line("const size_t _vectorisation_idx = _idx;"),
            KernelNode::Statements(pass) => self.render_statements(ctx.plan.code.statements(*pass), scope, out)?,
            KernelNode::EvaluateCondition => {
                let cond = match &ctx.plan.code.condition {
                    Some(cond) => self.render_expr(cond, scope)?,
                    None => "true".to_string(),
                };
                out.line(format!("const bool _cond = {cond};"));
            }
            KernelNode::When(body) => {
                out.line("if (_cond)");
                self.render_body(body, ctx, scope, out)?;
            }
            KernelNode::Append(source) => {
                let value = match source {
                    AppendSource::Index => "_idx".to_string(),
                    AppendSource::Value(name) => self.render_expr(&Expr::var(name.as_str()), scope)?,
                };
                out.line("if (_numelements >= _N)");
                out.line("{");
                out.push_indent();
                out.line("free(_elements);");
                out.line("PyErr_SetString(PyExc_IndexError, \"result buffer capacity exceeded\");");
                out.line("return NULL;");
                out.pop_indent();
                out.line("}");
                out.line(format!("_elements[_numelements++] = ({element}){value};"));
            }
            KernelNode::Loop(body) => {
                out.line("for (size_t _idx = 0; _idx < _N; _idx++)");
                self.render_body(body, ctx, scope, out)?;
            }
            KernelNode::Handoff => {
                out.line("npy_intp _dims[1] = {(npy_intp)_numelements};");
                out.line(format!(
                    "PyObject* _array = PyArray_SimpleNewFromData(1, _dims, {}, _elements);",
                    npy_type(ctx.plan.output.element.storage())
                ));
                out.line("if (_array == NULL)");
                out.line("{");
                out.push_indent();
                out.line("free(_elements);");
                out.line("return NULL;");
                out.pop_indent();
                out.line("}");
                out.line("PyArray_ENABLEFLAGS((PyArrayObject*)_array, NPY_ARRAY_OWNDATA);");
                out.line("return _array;");
            }
            KernelNode::Block(_) | KernelNode::Super => {
                return MisplacedNodeSnafu {
                    specialization: ctx.plan.specialization.as_str(),
                    what: "unexpanded placeholder",
                }
                .fail();
            }
        }
        Ok(())
    }

    fn render_body(
        &self,
        body: &[KernelNode],
        ctx: &CppContext<'_>,
        scope: &mut Scope<'_>,
        out: &mut Emitter,
    ) -> Result<()> {
        out.line("{");
        out.push_indent();
        for node in body {
            self.render_node(node, ctx, scope, out)?;
        }
        out.pop_indent();
        out.line("}");
        Ok(())
    }
}

/// Render a plan with the C++ backend.
pub fn render(plan: &KernelPlan) -> Result<RenderedKernel> {
    CppRenderer::new().render(plan)
}

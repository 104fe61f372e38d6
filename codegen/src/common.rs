//! Common utilities shared between codegen backends.

use std::collections::HashMap;

use cinder_dtype::DType;
use cinder_ir::{Expr, Statement, Variable, Variables};
use snafu::ResultExt;

use crate::{IrSnafu, KernelArg, KernelPlan, Result};

/// Line buffer with indentation tracking.
pub struct Emitter {
    lines: Vec<String>,
    depth: usize,
    unit: &'static str,
}

impl Emitter {
    pub fn new(unit: &'static str) -> Self {
        Self { lines: Vec::new(), depth: 0, unit }
    }

    /// Get current indentation string.
    pub fn indent(&self) -> String {
        self.unit.repeat(self.depth)
    }

    /// Increase indentation depth.
    pub fn push_indent(&mut self) {
        self.depth += 1;
    }

    /// Decrease indentation depth.
    pub fn pop_indent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Emit one line at the current depth.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{text}", self.indent()));
        }
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn finish(self) -> String {
        let mut code = self.lines.join("\n");
        code.push('\n');
        code
    }
}

/// Kinds of the names visible to an expression: declared variables plus the
/// locals introduced so far.
pub struct Scope<'a> {
    variables: &'a Variables,
    locals: HashMap<String, DType>,
}

impl<'a> Scope<'a> {
    pub fn new(variables: &'a Variables) -> Self {
        Self { variables, locals: HashMap::new() }
    }

    pub fn declare(&mut self, name: &str, dtype: DType) {
        self.locals.insert(name.to_string(), dtype);
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.locals.contains_key(name)
    }

    /// The declared variable behind a name, unless a local shadows it.
    pub fn variable(&self, name: &str) -> Option<&'a Variable> {
        if self.is_local(name) { None } else { self.variables.get(name) }
    }

    pub fn lookup(&self, name: &str) -> cinder_ir::Result<DType> {
        match self.locals.get(name) {
            Some(dtype) => Ok(*dtype),
            None => Ok(self.variables.lookup(name)?.dtype),
        }
    }

    pub fn dtype_of(&self, expr: &Expr) -> Result<DType> {
        expr.dtype(&|name| self.lookup(name)).context(IrSnafu)
    }

    /// Kind a statement's value is stored as.
    pub fn target_dtype(&self, statement: &Statement) -> Result<DType> {
        match statement {
            Statement::Declare { dtype, .. } => Ok(*dtype),
            Statement::Assign { target, .. } => self.lookup(target).context(IrSnafu),
        }
    }
}

/// Name of the generated entry point.
pub fn entry_point(plan: &KernelPlan) -> String {
    format!("_kernel_{}", plan.specialization)
}

/// Runtime arguments of a plan: every non-constant variable in name order.
pub fn collect_args(plan: &KernelPlan) -> Vec<KernelArg> {
    let written = plan.code.dependencies(&plan.variables).write;
    plan.variables
        .iter()
        .filter(|var| !var.is_constant())
        .enumerate()
        .map(|(index, var)| KernelArg {
            index,
            name: var.name.clone(),
            dtype: var.dtype,
            is_array: var.is_array(),
            is_output: written.contains(&var.name),
        })
        .collect()
}

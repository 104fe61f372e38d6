//! In-process execution of composed kernel plans.
//!
//! [`PlanProgram`] walks the expanded node list of a [`KernelPlan`] the way
//! the rendered source runs: scalar statements once with the sentinel index,
//! then an ascending scan over `0..N` appending selected elements to the
//! result buffer.

use std::sync::Arc;

use cinder_codegen::{AppendSource, IndexBinding, KernelNode, KernelPlan, MisplacedNodeSnafu, SizeSource};
use cinder_device::{Allocator, Buffer, HostArray, HostRuntime};
use cinder_ir::{ConstValue, Evaluator, Expr, Size, VectorIndex};
use snafu::{OptionExt, ResultExt, ensure};
use tracing::{debug, trace};

use crate::kernel::Program;
use crate::{
    CodegenSnafu, DeviceSnafu, EvalSnafu, InvalidSizeSnafu, MissingValueSnafu, Namespace, NoResultSnafu, Result,
};

/// Executable form of a kernel plan.
#[derive(Debug, Clone)]
pub struct PlanProgram {
    plan: KernelPlan,
    name: String,
}

impl PlanProgram {
    pub fn new(plan: KernelPlan) -> Self {
        let name = format!("{}/{}", plan.skeleton, plan.specialization);
        Self { plan, name }
    }

    pub fn plan(&self) -> &KernelPlan {
        &self.plan
    }

    /// Element count of this invocation.
    fn size(&self, namespace: &Namespace) -> Result<usize> {
        match &self.plan.size {
            SizeSource::Constant(n) => Ok(*n),
            SizeSource::Scalar(name) => {
                let value = namespace.scalar(name).context(MissingValueSnafu { name: name.as_str() })?;
                value.as_size().context(InvalidSizeSnafu {
                    name: name.as_str(),
                    reason: format!("{value:?} is not a non-negative integer"),
                })
            }
        }
    }

    /// Every bound array must match its declared length.
    fn check_arrays(&self, namespace: &Namespace) -> Result<()> {
        for var in self.plan.variables.iter() {
            let (Some(size), Some(values)) = (&var.size, namespace.array(&var.name)) else {
                continue;
            };
            let expected = match size {
                Size::Fixed(n) => *n,
                Size::Ref(name) => self.size_of(name, namespace)?,
            };
            ensure!(
                values.len() == expected,
                InvalidSizeSnafu {
                    name: var.name.as_str(),
                    reason: format!("expected {expected} elements, got {}", values.len()),
                }
            );
        }
        Ok(())
    }

    fn size_of(&self, name: &str, namespace: &Namespace) -> Result<usize> {
        let value = match self.plan.variables.get(name).and_then(|var| var.constant) {
            Some(value) => value,
            None => namespace.scalar(name).context(MissingValueSnafu { name })?,
        };
        value.as_size().context(InvalidSizeSnafu { name, reason: format!("{value:?} is not a non-negative integer") })
    }
}

/// Mutable state of one invocation.
struct Invocation<'a> {
    plan: &'a KernelPlan,
    name: &'a str,
    evaluator: Evaluator<'a, Namespace>,
    allocator: Arc<dyn Allocator>,
    host: &'a dyn HostRuntime,
    size: usize,
    index: VectorIndex,
    element: usize,
    selected: bool,
    buffer: Option<Buffer>,
    result: Option<HostArray>,
}

impl Invocation<'_> {
    fn run(&mut self, nodes: &[KernelNode]) -> Result<()> {
        for node in nodes {
            self.step(node)?;
        }
        Ok(())
    }

    fn step(&mut self, node: &KernelNode) -> Result<()> {
        match node {
            KernelNode::Comment(_) | KernelNode::ResolveSize => {}
            KernelNode::Allocate => {
                let buffer = Buffer::allocate(self.plan.output.element, self.size, Arc::clone(&self.allocator))
                    .context(DeviceSnafu { kernel: self.name })?;
                self.buffer = Some(buffer);
            }
            KernelNode::BindIndex(IndexBinding::Sentinel) => self.index = VectorIndex::Scalar,
            KernelNode::BindIndex(IndexBinding::Element) => self.index = VectorIndex::Element(self.element),
            KernelNode::Statements(pass) => {
                let statements = self.plan.code.statements(*pass);
                self.evaluator.exec_all(statements, self.index).context(EvalSnafu { kernel: self.name })?;
            }
            KernelNode::EvaluateCondition => {
                self.selected = self
                    .evaluator
                    .condition(self.plan.code.condition.as_ref(), self.index)
                    .context(EvalSnafu { kernel: self.name })?;
            }
            KernelNode::When(body) => {
                if self.selected {
                    self.run(body)?;
                }
            }
            KernelNode::Append(source) => {
                let value = match source {
                    AppendSource::Index => ConstValue::UInt(self.element as u64),
                    AppendSource::Value(name) => self
                        .evaluator
                        .eval(&Expr::var(name.as_str()), self.index)
                        .context(EvalSnafu { kernel: self.name })?,
                };
                let buffer = self
                    .buffer
                    .as_mut()
                    .context(MisplacedNodeSnafu {
                        specialization: self.plan.specialization.as_str(),
                        what: "append before allocation",
                    })
                    .context(CodegenSnafu)?;
                buffer.push(value).context(DeviceSnafu { kernel: self.name })?;
            }
            KernelNode::Loop(body) => {
                for element in 0..self.size {
                    self.element = element;
                    self.run(body)?;
                }
            }
            KernelNode::Handoff => {
                let buffer = self
                    .buffer
                    .take()
                    .context(MisplacedNodeSnafu {
                        specialization: self.plan.specialization.as_str(),
                        what: "handoff before allocation",
                    })
                    .context(CodegenSnafu)?;
                let len = buffer.len();
                self.result = Some(buffer.handoff(len, self.host).context(DeviceSnafu { kernel: self.name })?);
            }
            KernelNode::Block(_) | KernelNode::Super => {
                return MisplacedNodeSnafu {
                    specialization: self.plan.specialization.as_str(),
                    what: "unexpanded placeholder",
                }
                .fail()
                .context(CodegenSnafu);
            }
        }
        trace!(?node, index = ?self.index, "executed node");
        Ok(())
    }
}

impl Program for PlanProgram {
    fn run(
        &self,
        namespace: &mut Namespace,
        allocator: Arc<dyn Allocator>,
        host: &dyn HostRuntime,
    ) -> Result<HostArray> {
        let size = self.size(namespace)?;
        self.check_arrays(namespace)?;

        let mut invocation = Invocation {
            plan: &self.plan,
            name: &self.name,
            evaluator: Evaluator::new(&self.plan.variables, namespace),
            allocator,
            host,
            size,
            index: VectorIndex::Scalar,
            element: 0,
            selected: false,
            buffer: None,
            result: None,
        };
        invocation.run(&self.plan.nodes)?;

        let result = invocation.result.take().context(NoResultSnafu { kernel: self.name.as_str() })?;
        debug!(kernel = %self.name, size, len = result.len(), "kernel finished");
        Ok(result)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

//! Composition of a skeleton and a specialization into a kernel plan.

use cinder_dtype::{Backend, ResolvedType, TypeResolver};
use cinder_ir::{AbstractCodeBlock, Variables};
use snafu::{OptionExt, ResultExt, ensure};
use tracing::{debug, trace};

use crate::skeleton::{AppendSource, Block, Fragment, KernelNode, Skeleton};
use crate::specialization::Specialization;
use crate::{
    InvalidOutputSnafu, IrSnafu, MisplacedNodeSnafu, MissingBaseContentSnafu, MissingTemplateVariableSnafu,
    ResolveSnafu, Result, UnknownBlockSnafu,
};

/// How the element count is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SizeSource {
    /// Known when the kernel is generated.
    Constant(usize),
    /// Read from a runtime scalar.
    Scalar(String),
}

/// Result buffer of a kernel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputSpec {
    pub name: String,
    pub element: ResolvedType,
}

/// Inputs of a composition.
pub struct CompositionContext<'a, R: TypeResolver> {
    pub variables: &'a Variables,
    pub code: &'a AbstractCodeBlock,
    pub resolver: &'a R,
}

/// Fully expanded kernel: no block placeholders and no `Super` nodes remain.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelPlan {
    pub skeleton: String,
    pub specialization: String,
    pub backend: Backend,
    pub variables: Variables,
    pub code: AbstractCodeBlock,
    /// Every variable with its resolved type, in name order.
    pub signature: Vec<(String, ResolvedType)>,
    pub size: SizeSource,
    pub output: OutputSpec,
    pub nodes: Fragment,
}

impl KernelPlan {
    /// Resolved type of a variable of the plan.
    pub fn resolved(&self, name: &str) -> Option<&ResolvedType> {
        self.signature.iter().find(|(n, _)| n == name).map(|(_, resolved)| resolved)
    }
}

/// Resolve every variable of a table, in name order.
pub fn resolve_signature(
    variables: &Variables,
    resolver: &impl TypeResolver,
) -> cinder_dtype::Result<Vec<(String, ResolvedType)>> {
    resolver.resolve_all(variables.iter().map(|var| (var.name.as_str(), var.dtype)))
}

/// Compose a skeleton with a specialization.
///
/// Every block placeholder of the layout is replaced by the specialization's
/// override, or by the skeleton's default content if there is none. Inside an
/// override, `Super` is replaced by the default content of the overridden
/// block.
pub fn compose<R: TypeResolver>(
    skeleton: &Skeleton,
    specialization: &Specialization,
    ctx: &CompositionContext<'_, R>,
) -> Result<KernelPlan> {
    let names = (skeleton.id.as_str(), specialization.id.as_str());

    for (block, _) in &specialization.overrides {
        ensure!(
            skeleton.defines(*block),
            UnknownBlockSnafu { skeleton: names.0, specialization: names.1, block: *block }
        );
    }
    let required = std::iter::once(&skeleton.size_variable).chain(&specialization.uses_variables);
    for name in required {
        ensure!(
            ctx.variables.contains(name),
            MissingTemplateVariableSnafu { specialization: names.1, name: name.as_str() }
        );
    }

    ctx.code.validate(ctx.variables).context(IrSnafu)?;
    ctx.variables.validate_length_ref(&skeleton.size_variable).context(IrSnafu)?;
    let signature = resolve_signature(ctx.variables, ctx.resolver).context(ResolveSnafu)?;

    let nodes = expand(skeleton, specialization, &skeleton.layout, None)?;
    let output = output_spec(specialization, &nodes, ctx.variables, &signature)?;

    let size_var = ctx.variables.lookup(&skeleton.size_variable).context(IrSnafu)?;
    let size = match size_var.constant.and_then(|value| value.as_size()) {
        Some(n) => SizeSource::Constant(n),
        None => SizeSource::Scalar(size_var.name.clone()),
    };

    debug!(
        skeleton = %skeleton.id,
        specialization = %specialization.id,
        backend = %ctx.resolver.backend(),
        output = %output.name,
        ?size,
        "composed kernel plan"
    );
    trace!(?nodes, "kernel plan nodes");

    Ok(KernelPlan {
        skeleton: skeleton.id.clone(),
        specialization: specialization.id.clone(),
        backend: ctx.resolver.backend(),
        variables: ctx.variables.clone(),
        code: ctx.code.clone(),
        signature,
        size,
        output,
        nodes,
    })
}

/// Expand placeholders in `nodes`. `overriding` is the block whose override
/// is being expanded, if any.
fn expand(
    skeleton: &Skeleton,
    specialization: &Specialization,
    nodes: &[KernelNode],
    overriding: Option<Block>,
) -> Result<Fragment> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            KernelNode::Block(block) => {
                ensure!(
                    overriding.is_none(),
                    MisplacedNodeSnafu {
                        specialization: specialization.id.as_str(),
                        what: "block placeholder in override",
                    }
                );
                match specialization.override_for(*block) {
                    Some(content) => out.extend(expand(skeleton, specialization, content, Some(*block))?),
                    None => {
                        if let Some(content) = skeleton.block(*block) {
                            out.extend(expand(skeleton, specialization, content, None)?);
                        }
                    }
                }
            }
            KernelNode::Super => {
                let block = overriding.context(MisplacedNodeSnafu {
                    specialization: specialization.id.as_str(),
                    what: "super outside of an override",
                })?;
                let base = skeleton.block(block).context(MissingBaseContentSnafu {
                    skeleton: skeleton.id.as_str(),
                    specialization: specialization.id.as_str(),
                    block,
                })?;
                // Base content is expanded as skeleton content: it cannot itself use `Super`.
                out.extend(expand(skeleton, specialization, base, None)?);
            }
            KernelNode::When(body) => out.push(KernelNode::When(expand(skeleton, specialization, body, overriding)?)),
            KernelNode::Loop(body) => out.push(KernelNode::Loop(expand(skeleton, specialization, body, overriding)?)),
            other => out.push(other.clone()),
        }
    }
    Ok(out)
}

fn output_spec(
    specialization: &Specialization,
    nodes: &Fragment,
    variables: &Variables,
    signature: &[(String, ResolvedType)],
) -> Result<OutputSpec> {
    let name = specialization.output.as_str();
    let invalid = |reason: String| InvalidOutputSnafu { specialization: specialization.id.as_str(), name, reason };

    let var = variables
        .get(name)
        .context(MissingTemplateVariableSnafu { specialization: specialization.id.as_str(), name })?;
    ensure!(var.is_array(), invalid("output must be an array".to_string()));

    let mut appends_index = false;
    for node in nodes {
        node.walk(&mut |node| appends_index |= *node == KernelNode::Append(AppendSource::Index));
    }
    ensure!(!appends_index || var.dtype.is_int(), invalid(format!("indices cannot be stored as {}", var.dtype)));

    let element = signature
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, resolved)| *resolved)
        .context(MissingTemplateVariableSnafu { specialization: specialization.id.as_str(), name })?;
    Ok(OutputSpec { name: name.to_string(), element })
}

//! Kernel specializations: concrete operations expressed as overrides of a
//! skeleton's extension points.

use crate::skeleton::{AppendSource, Block, Fragment, KernelNode};

/// A concrete operation built on a skeleton.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Specialization {
    pub id: String,
    /// Variable whose resolved type the result buffer takes.
    pub output: String,
    /// Variables the overrides rely on; composition fails if one is missing.
    pub uses_variables: Vec<String>,
    /// Replacement content per block.
    pub overrides: Vec<(Block, Fragment)>,
}

impl Specialization {
    pub fn new(id: impl Into<String>, output: impl Into<String>) -> Self {
        Self { id: id.into(), output: output.into(), uses_variables: Vec::new(), overrides: Vec::new() }
    }

    pub fn uses(mut self, name: impl Into<String>) -> Self {
        self.uses_variables.push(name.into());
        self
    }

    pub fn with_override(mut self, block: Block, content: Fragment) -> Self {
        self.overrides.push((block, content));
        self
    }

    pub fn override_for(&self, block: Block) -> Option<&Fragment> {
        self.overrides.iter().find(|(name, _)| *name == block).map(|(_, content)| content)
    }

    /// Collect the ascending indices of the elements satisfying the condition.
    ///
    /// The vector body keeps the skeleton's statements and adds the
    /// selection around them:
    ///
    /// ```text
    /// <vector statements>
    /// _cond = <condition>
    /// if _cond: _indices[cursor++] = i
    /// ```
    pub fn group_get_indices() -> Self {
        Self::new("group_get_indices", "_indices").uses("N").uses("_indices").with_override(
            Block::VectorBody,
            vec![
                KernelNode::Super,
                KernelNode::EvaluateCondition,
                KernelNode::When(vec![KernelNode::Append(AppendSource::Index)]),
            ],
        )
    }

    /// Collect the value of `output` at every element satisfying the
    /// condition, in ascending element order.
    pub fn group_get_values(output: impl Into<String>) -> Self {
        let output = output.into();
        Self::new("group_get_values", output.clone()).uses("N").uses(output.clone()).with_override(
            Block::VectorBody,
            vec![
                KernelNode::Super,
                KernelNode::EvaluateCondition,
                KernelNode::When(vec![KernelNode::Append(AppendSource::Value(output))]),
            ],
        )
    }
}

//! Composable kernel skeletons.
//!
//! A skeleton is the shared structure of a class of kernels: a layout of
//! typed [`KernelNode`]s in which named [`Block`]s act as extension points.
//! Each block carries default content; a specialization may replace that
//! content, and may splice the default back in with [`KernelNode::Super`].

use cinder_ir::Pass;

/// Named extension point of a skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Block {
    /// Size resolution and buffer allocation.
    Prologue,
    /// Statements run once with the index bound to the sentinel.
    ScalarPass,
    /// Body of the per-element loop.
    VectorBody,
    /// Packaging of the result.
    Teardown,
}

/// What an element appended to the result buffer is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AppendSource {
    /// The current element position.
    Index,
    /// The current value of a variable.
    Value(String),
}

/// Value the vectorization index is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexBinding {
    /// Non-element context of the scalar pass.
    Sentinel,
    /// Current loop position.
    Element,
}

/// One typed step of a kernel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KernelNode {
    Comment(String),
    /// Resolve the element count `N`.
    ResolveSize,
    /// Allocate the result buffer with capacity `N`.
    Allocate,
    BindIndex(IndexBinding),
    /// Statements of the abstract code for one pass.
    Statements(Pass),
    /// Evaluate the selection condition for the current element.
    EvaluateCondition,
    /// Run the nodes if the last evaluated condition held.
    When(Vec<KernelNode>),
    /// Append to the result buffer and advance its cursor.
    Append(AppendSource),
    /// Run the nodes for every element in ascending order.
    Loop(Vec<KernelNode>),
    /// Hand the buffer, truncated to its cursor, to the host.
    Handoff,
    /// Placeholder for a named block.
    Block(Block),
    /// The skeleton's default content of the block being overridden.
    Super,
}

impl KernelNode {
    /// Visit this node and every node nested inside it.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a KernelNode)) {
        f(self);
        if let KernelNode::When(body) | KernelNode::Loop(body) = self {
            for node in body {
                node.walk(f);
            }
        }
    }
}

/// Ordered list of nodes.
pub type Fragment = Vec<KernelNode>;

/// Shared structure of a class of kernels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Skeleton {
    pub id: String,
    /// Scalar variable holding the element count.
    pub size_variable: String,
    /// Top-level structure; contains one `Block` placeholder per block.
    pub layout: Fragment,
    /// Default content of the blocks that have one.
    pub blocks: Vec<(Block, Fragment)>,
}

impl Skeleton {
    /// Default content of a block, if the skeleton defines it.
    pub fn block(&self, block: Block) -> Option<&Fragment> {
        self.blocks.iter().find(|(name, _)| *name == block).map(|(_, content)| content)
    }

    /// Whether the layout has a placeholder for the block.
    pub fn defines(&self, block: Block) -> bool {
        let mut found = false;
        for node in &self.layout {
            node.walk(&mut |node| found |= *node == KernelNode::Block(block));
        }
        found
    }

    /// "Compute a value per element, optionally keep only selected elements".
    ///
    /// ```text
    /// prologue:    resolve N, allocate buffer(N)
    /// scalar_pass: bind index to sentinel, scalar statements
    /// loop i in 0..N:
    ///   vector_body: vector statements
    /// teardown:    handoff(buffer, cursor)
    /// ```
    pub fn compute_and_select() -> Self {
        Self {
            id: "compute_and_select".to_string(),
            size_variable: "N".to_string(),
            layout: vec![
                KernelNode::Block(Block::Prologue),
                KernelNode::Block(Block::ScalarPass),
                KernelNode::Loop(vec![
                    KernelNode::BindIndex(IndexBinding::Element),
                    KernelNode::Block(Block::VectorBody),
                ]),
                KernelNode::Block(Block::Teardown),
            ],
            blocks: vec![
                (Block::Prologue, vec![KernelNode::ResolveSize, KernelNode::Allocate]),
                (
                    Block::ScalarPass,
                    vec![
                        KernelNode::Comment("scalar code".to_string()),
                        KernelNode::BindIndex(IndexBinding::Sentinel),
                        KernelNode::Statements(Pass::Scalar),
                    ],
                ),
                (
                    Block::VectorBody,
                    vec![KernelNode::Comment("vector code".to_string()), KernelNode::Statements(Pass::Vector)],
                ),
                (Block::Teardown, vec![KernelNode::Handoff]),
            ],
        }
    }
}

//! Skeleton composition tests.

use cinder_dtype::{Backend, DType, TypeTable};
use cinder_ir::{AbstractCodeBlock, Expr, Pass, Variable};

use crate::test::fixtures::{plan_for, selection_code, selection_variables};
use crate::{
    AppendSource, Block, CompositionContext, Error, IndexBinding, KernelNode, KernelPlan, SizeSource, Skeleton,
    Specialization, compose,
};

fn try_compose(
    skeleton: &Skeleton,
    specialization: &Specialization,
    variables: &cinder_ir::Variables,
    code: &AbstractCodeBlock,
    table: &TypeTable,
) -> crate::Result<KernelPlan> {
    compose(skeleton, specialization, &CompositionContext { variables, code, resolver: table })
}

#[test]
fn test_group_get_indices_expansion() {
    let plan = plan_for(Backend::Cpp, &Specialization::group_get_indices());

    assert_eq!(
        plan.nodes,
        vec![
            KernelNode::ResolveSize,
            KernelNode::Allocate,
            KernelNode::Comment("scalar code".into()),
            KernelNode::BindIndex(IndexBinding::Sentinel),
            KernelNode::Statements(Pass::Scalar),
            KernelNode::Loop(vec![
                KernelNode::BindIndex(IndexBinding::Element),
                KernelNode::Comment("vector code".into()),
                KernelNode::Statements(Pass::Vector),
                KernelNode::EvaluateCondition,
                KernelNode::When(vec![KernelNode::Append(AppendSource::Index)]),
            ]),
            KernelNode::Handoff,
        ]
    );
}

#[test]
fn test_super_keeps_base_content_before_override() {
    let plan = plan_for(Backend::Numpy, &Specialization::group_get_indices());
    let KernelNode::Loop(body) = &plan.nodes[5] else { panic!("expected loop, got {:?}", plan.nodes[5]) };
    let statements = body.iter().position(|node| *node == KernelNode::Statements(Pass::Vector));
    let condition = body.iter().position(|node| *node == KernelNode::EvaluateCondition);
    assert!(statements.unwrap() < condition.unwrap());
}

#[test]
fn test_no_placeholders_remain() {
    let plan = plan_for(Backend::Cpp, &Specialization::group_get_values("v"));
    for node in &plan.nodes {
        node.walk(&mut |node| {
            assert!(!matches!(node, KernelNode::Super | KernelNode::Block(_)), "placeholder left: {node:?}");
        });
    }
}

#[test]
fn test_without_override_uses_defaults() {
    let specialization = Specialization::new("plain", "_indices").uses("N");
    let plan = plan_for(Backend::Cpp, &specialization);
    let KernelNode::Loop(body) = &plan.nodes[5] else { panic!("expected loop") };
    assert!(!body.contains(&KernelNode::EvaluateCondition));
}

#[test]
fn test_signature_and_output() {
    let plan = plan_for(Backend::Cpp, &Specialization::group_get_indices());
    let names: Vec<_> = plan.signature.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["N", "_indices", "scale", "threshold", "v"]);
    assert_eq!(plan.output.name, "_indices");
    assert_eq!(plan.output.element.storage(), DType::Int32);
    assert_eq!(plan.output.element.byte_width(), 4);
    assert_eq!(plan.size, SizeSource::Scalar("N".into()));

    let values = plan_for(Backend::Cpp, &Specialization::group_get_values("v"));
    assert_eq!(values.output.element.storage(), DType::Float64);
    assert_eq!(values.resolved("v").map(|r| r.byte_width()), Some(8));
}

#[test]
fn test_constant_size() {
    let variables = selection_variables().with(Variable::constant("N", DType::Int32, 5i64));
    let plan = try_compose(
        &Skeleton::compute_and_select(),
        &Specialization::group_get_indices(),
        &variables,
        &selection_code(),
        &TypeTable::for_backend(Backend::Cpp),
    )
    .unwrap();
    assert_eq!(plan.size, SizeSource::Constant(5));
}

#[test]
fn test_unknown_block() {
    let mut skeleton = Skeleton::compute_and_select();
    skeleton.layout.retain(|node| *node != KernelNode::Block(Block::Teardown));
    let specialization = Specialization::group_get_indices().with_override(Block::Teardown, vec![KernelNode::Handoff]);

    let result = try_compose(
        &skeleton,
        &specialization,
        &selection_variables(),
        &selection_code(),
        &TypeTable::for_backend(Backend::Cpp),
    );
    assert!(matches!(result, Err(Error::UnknownBlock { block: Block::Teardown, .. })), "{result:?}");
    assert!(result.unwrap_err().is_composition());
}

#[test]
fn test_super_without_base_content() {
    let mut skeleton = Skeleton::compute_and_select();
    skeleton.blocks.retain(|(block, _)| *block != Block::Teardown);
    let specialization =
        Specialization::group_get_indices().with_override(Block::Teardown, vec![KernelNode::Super, KernelNode::Handoff]);

    let result = try_compose(
        &skeleton,
        &specialization,
        &selection_variables(),
        &selection_code(),
        &TypeTable::for_backend(Backend::Cpp),
    );
    assert!(matches!(result, Err(Error::MissingBaseContent { block: Block::Teardown, .. })), "{result:?}");
}

#[test]
fn test_super_in_skeleton_content() {
    let mut skeleton = Skeleton::compute_and_select();
    for (block, content) in &mut skeleton.blocks {
        if *block == Block::Teardown {
            *content = vec![KernelNode::Super];
        }
    }

    let result = try_compose(
        &skeleton,
        &Specialization::group_get_indices(),
        &selection_variables(),
        &selection_code(),
        &TypeTable::for_backend(Backend::Cpp),
    );
    assert!(matches!(result, Err(Error::MisplacedNode { .. })), "{result:?}");
}

#[test]
fn test_missing_template_variable() {
    let variables: cinder_ir::Variables =
        selection_variables().iter().filter(|var| var.name != "_indices").cloned().collect();
    let result = try_compose(
        &Skeleton::compute_and_select(),
        &Specialization::group_get_indices(),
        &variables,
        &selection_code(),
        &TypeTable::for_backend(Backend::Cpp),
    );
    assert_eq!(
        result.unwrap_err(),
        Error::MissingTemplateVariable { specialization: "group_get_indices".into(), name: "_indices".into() }
    );
}

#[test]
fn test_unsupported_kind() {
    let table = TypeTable::for_backend(Backend::Cpp).without(DType::Float64);
    let result = try_compose(
        &Skeleton::compute_and_select(),
        &Specialization::group_get_indices(),
        &selection_variables(),
        &selection_code(),
        &table,
    );
    assert_eq!(
        result.unwrap_err(),
        Error::Resolve {
            source: cinder_dtype::Error::UnsupportedKind { dtype: DType::Float64, backend: Backend::Cpp }
        }
    );
}

#[test]
fn test_invalid_abstract_code() {
    let code = AbstractCodeBlock::new().with_condition(Expr::var("v"));
    let result = try_compose(
        &Skeleton::compute_and_select(),
        &Specialization::group_get_indices(),
        &selection_variables(),
        &code,
        &TypeTable::for_backend(Backend::Cpp),
    );
    assert!(matches!(result, Err(Error::Ir { source: cinder_ir::Error::NonBooleanCondition { .. } })), "{result:?}");
}

#[test]
fn test_indices_need_integer_output() {
    let variables = selection_variables().with(Variable::array("_indices", DType::Float32, "N"));
    let result = try_compose(
        &Skeleton::compute_and_select(),
        &Specialization::group_get_indices(),
        &variables,
        &selection_code(),
        &TypeTable::for_backend(Backend::Cpp),
    );
    assert!(matches!(result, Err(Error::InvalidOutput { .. })), "{result:?}");
}

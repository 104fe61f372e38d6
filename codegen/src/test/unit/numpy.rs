//! NumPy renderer tests.

use cinder_dtype::{Backend, DType, TypeResolver, TypeTable};
use cinder_ir::{AbstractCodeBlock, BinaryOp, Expr, Variable, Variables};

use crate::numpy::render;
use crate::test::fixtures::plan_for;
use crate::{CompositionContext, Renderer, Skeleton, SizeSource, Specialization, compose, renderer_for};

#[test]
fn test_selection_structure() {
    let result = render(&plan_for(Backend::Numpy, &Specialization::group_get_indices())).unwrap();
    let code = &result.code;

    assert!(code.contains("import numpy as _numpy"), "Missing import:\n{code}");
    assert!(code.contains("def _kernel_group_get_indices(_namespace):"), "Missing entry point:\n{code}");
    assert!(code.contains("    _array_v = _namespace[\"v\"]"), "Missing array binding:\n{code}");
    assert!(code.contains("    scale = 2.0"), "Missing inlined constant:\n{code}");
    assert!(code.contains("    _N = int(N)"), "Missing size resolution:\n{code}");
    assert!(code.contains("_elements = _numpy.empty(_N, dtype=_numpy.int32)"), "Missing allocation:\n{code}");
    assert!(code.contains("_vectorisation_idx = -1"), "Missing sentinel:\n{code}");
    assert!(code.contains("_idx = _numpy.arange(_N)"), "Missing element range:\n{code}");
    assert!(code.contains("t = (_array_v[_idx] * scale)"), "Missing vector statement:\n{code}");
    assert!(code.contains("_cond = _numpy.broadcast_to((t > limit), (_N,))"), "Missing condition:\n{code}");
    assert!(code.contains("_selected = _idx[_cond]"), "Missing selection:\n{code}");
    assert!(code.contains("return _elements[:_numelements]"), "Missing handoff:\n{code}");
}

#[test]
fn test_logical_operators() {
    let variables = Variables::new()
        .with(Variable::scalar("N", DType::Int32))
        .with(Variable::array("_indices", DType::Int32, "N"))
        .with(Variable::array("flag", DType::Bool, "N"));
    let cond = Expr::var("flag").and(!Expr::binary(BinaryOp::Mod, Expr::index(), Expr::int(3)).eq_(Expr::int(0)));
    let code = AbstractCodeBlock::new().with_condition(cond);
    let table = TypeTable::for_backend(Backend::Numpy);
    let ctx = CompositionContext { variables: &variables, code: &code, resolver: &table };
    let plan = compose(&Skeleton::compute_and_select(), &Specialization::group_get_indices(), &ctx).unwrap();
    let code = renderer_for(Backend::Numpy).render(&plan).unwrap().code;

    assert!(
        code.contains("_numpy.logical_and(_array_flag[_idx], _numpy.logical_not(((_vectorisation_idx % 3) == 0)))"),
        "Missing logical operators:\n{code}"
    );
}

#[test]
fn test_size_rendering() {
    let renderer = renderer_for(Backend::Numpy);
    assert_eq!(renderer.render_size(&SizeSource::Constant(7)), "7");
    assert_eq!(renderer.render_size(&SizeSource::Scalar("N".into())), "int(N)");

    let cpp = renderer_for(Backend::Cpp);
    assert_eq!(cpp.render_size(&SizeSource::Constant(7)), "7");
    assert_eq!(cpp.render_size(&SizeSource::Scalar("N".into())), "(size_t)N");
}

#[test]
fn test_storage_types() {
    let table = TypeTable::for_backend(Backend::Numpy);
    let numpy = renderer_for(Backend::Numpy);
    let cpp = renderer_for(Backend::Cpp);
    let f64_type = table.resolve(DType::Float64).unwrap();
    assert_eq!(numpy.storage_type(&f64_type), "_numpy.float64");
    assert_eq!(cpp.storage_type(&f64_type), "double");
    assert_eq!(cpp.storage_type(&table.resolve(DType::UInt16).unwrap()), "uint16_t");
}

#[test]
fn test_statement_indentation() {
    let variables = Variables::new().with(Variable::scalar("x", DType::Float64));
    let statements = [
        cinder_ir::Statement::declare("y", DType::Float64, Expr::var("x") * Expr::float(2.0)),
        cinder_ir::Statement::assign("x", Expr::var("y")),
    ];
    let mut scope = crate::Scope::new(&variables);
    let mut out = crate::Emitter::new("    ");
    out.push_indent();
    out.push_indent();
    renderer_for(Backend::Numpy).render_statements(&statements, &mut scope, &mut out).unwrap();
    assert_eq!(out.finish(), "        y = (x * 2.0)\n        x = y\n");
}

#[test]
fn test_deterministic_output() {
    let plan = plan_for(Backend::Numpy, &Specialization::group_get_values("v"));
    let first = render(&plan).unwrap();
    let second = render(&plan).unwrap();
    assert_eq!(first, second);
    assert!(first.code.contains("_numpy.broadcast_to(_array_v[_idx], (_N,))[_cond]"), "{}", first.code);
}

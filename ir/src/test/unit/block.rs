//! Abstract code block validation tests.

use crate::{AbstractCodeBlock, DType, Error, Expr, Statement, Variable, Variables};

fn variables() -> Variables {
    Variables::new()
        .with(Variable::scalar("N", DType::Int32))
        .with(Variable::array("v", DType::Float64, "N"))
        .with(Variable::array("out", DType::Float64, "N"))
        .with(Variable::scalar("threshold", DType::Float64))
        .with(Variable::constant("scale", DType::Float64, 2.0))
}

#[test]
fn test_valid_block() {
    let block = AbstractCodeBlock::new()
        .with_scalar(Statement::declare("limit", DType::Float64, Expr::var("threshold") * Expr::var("scale")))
        .with_vector(Statement::assign("out", Expr::var("v") * Expr::var("scale")))
        .with_condition(Expr::var("v").gt(Expr::var("limit")));
    block.validate(&variables()).unwrap();
}

#[test]
fn test_non_boolean_condition() {
    let block = AbstractCodeBlock::new().with_condition(Expr::var("v") + Expr::float(1.0));
    assert_eq!(block.validate(&variables()), Err(Error::NonBooleanCondition { actual: DType::Float64 }));
}

#[test]
fn test_array_in_scalar_pass() {
    let block = AbstractCodeBlock::new().with_scalar(Statement::declare("t", DType::Float64, Expr::var("v")));
    assert_eq!(block.validate(&variables()), Err(Error::ArrayInScalarContext { name: "v".into() }));
}

#[test]
fn test_index_in_scalar_pass() {
    let block = AbstractCodeBlock::new().with_scalar(Statement::declare("i", DType::Int64, Expr::index()));
    assert_eq!(block.validate(&variables()), Err(Error::IndexInScalarContext));
}

#[test]
fn test_assign_to_constant() {
    let block = AbstractCodeBlock::new().with_vector(Statement::assign("scale", Expr::float(1.0)));
    assert_eq!(block.validate(&variables()), Err(Error::AssignToConstant { name: "scale".into() }));

    let local = AbstractCodeBlock::new()
        .with_vector(Statement::declare("t", DType::Float64, Expr::var("v")))
        .with_vector(Statement::assign("t", Expr::float(0.0)));
    assert_eq!(local.validate(&variables()), Err(Error::AssignToConstant { name: "t".into() }));
}

#[test]
fn test_mutable_local() {
    let block = AbstractCodeBlock::new()
        .with_vector(Statement::declare_mut("t", DType::Float64, Expr::var("v")))
        .with_vector(Statement::assign("t", Expr::var("t") + Expr::float(1.0)))
        .with_condition(Expr::var("t").lt(Expr::float(0.5)));
    block.validate(&variables()).unwrap();
}

#[test]
fn test_redeclaration() {
    let block = AbstractCodeBlock::new().with_vector(Statement::declare("v", DType::Float64, Expr::float(0.0)));
    assert_eq!(block.validate(&variables()), Err(Error::Redeclaration { name: "v".into() }));
}

#[test]
fn test_invalid_size_reference() {
    let vars = Variables::new()
        .with(Variable::scalar("N", DType::Float64))
        .with(Variable::array("v", DType::Float64, "N"));
    assert!(matches!(AbstractCodeBlock::new().validate(&vars), Err(Error::InvalidSize { .. })));

    let negative = Variables::new()
        .with(Variable::constant("N", DType::Int64, -3i64))
        .with(Variable::array("v", DType::Float64, "N"));
    assert!(matches!(negative.validate(), Err(Error::InvalidSize { .. })));

    let missing = Variables::new().with(Variable::array("v", DType::Float64, "N"));
    assert_eq!(missing.validate(), Err(Error::UnknownVariable { name: "N".into() }));
}

#[test]
fn test_dependencies() {
    let block = AbstractCodeBlock::new()
        .with_scalar(Statement::declare("limit", DType::Float64, Expr::var("threshold")))
        .with_vector(Statement::assign("out", Expr::var("v")))
        .with_condition(Expr::var("out").gt(Expr::var("limit")));
    let deps = block.dependencies(&variables());
    assert_eq!(deps.read.iter().map(String::as_str).collect::<Vec<_>>(), vec!["out", "threshold", "v"]);
    assert_eq!(deps.write.iter().map(String::as_str).collect::<Vec<_>>(), vec!["out"]);
    assert_eq!(deps.all().len(), 3);
}

#[test]
fn test_locals() {
    let block = AbstractCodeBlock::new()
        .with_scalar(Statement::declare("a", DType::Int32, Expr::int(1)))
        .with_vector(Statement::declare("b", DType::Float32, Expr::float(1.0)))
        .with_vector(Statement::assign("out", Expr::var("b").cast(DType::Float64)));
    assert_eq!(block.locals(crate::Pass::Vector), vec!["b"]);
    assert_eq!(block.local_dtype("a"), Some(DType::Int32));
    assert_eq!(block.local_dtype("out"), None);
}

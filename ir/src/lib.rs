//! Abstract code for generated kernels.
//!
//! This crate defines the backend-independent description of a per-element
//! computation and an evaluator for it.
//!
//! # Module Organization
//!
//! - [`types`] - Constant values, operators and the vectorization index
//! - [`variable`] - Variable table and array lengths
//! - [`expr`] - Typed expression AST
//! - [`block`] - Statements and the abstract code block
//! - [`eval`] - Evaluation against a runtime store
//! - [`error`] - Error types and result handling

pub mod block;
pub mod error;
pub mod eval;
pub mod expr;
pub mod types;
pub mod variable;


pub use block::{AbstractCodeBlock, Dependencies, Pass, Statement};
pub use error::*;
pub use eval::{Evaluator, Store};
pub use expr::Expr;
pub use types::{BinaryOp, ConstValue, UnaryOp, VectorIndex};
pub use variable::{Size, Variable, Variables};

// Re-export external types for convenience
pub use cinder_dtype::DType;

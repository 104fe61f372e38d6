//! Kernel generation for cinder.
//!
//! This crate turns abstract code into backend source text.
//!
//! # Architecture
//!
//! - **Skeleton**: shared structure of a class of kernels, with named blocks
//!   as extension points
//! - **Specialization**: a concrete operation overriding skeleton blocks,
//!   optionally splicing in the base content with `Super`
//! - **Compose**: expands a skeleton and a specialization into a `KernelPlan`
//! - **Renderers**: backend visitors over the plan (`cpp`, `numpy`)
//!
//! # Usage
//!
//! ```ignore
//! use cinder_codegen::{CompositionContext, Skeleton, Specialization, compose, cpp};
//!
//! let ctx = CompositionContext { variables: &vars, code: &code, resolver: &table };
//! let plan = compose(&Skeleton::compute_and_select(), &Specialization::group_get_indices(), &ctx)?;
//! let kernel = cpp::render(&plan)?;
//! ```

pub mod common;
pub mod compose;
pub mod cpp;
pub mod error;
pub mod numpy;
pub mod skeleton;
pub mod specialization;
pub mod traits;
pub mod types;


pub use common::{Emitter, Scope};
pub use compose::{CompositionContext, KernelPlan, OutputSpec, SizeSource, compose, resolve_signature};
pub use error::*;
pub use skeleton::{AppendSource, Block, Fragment, IndexBinding, KernelNode, Skeleton};
pub use specialization::Specialization;
pub use traits::*;
pub use types::*;

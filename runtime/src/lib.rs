//! Kernel generation and execution for cinder.
//!
//! Ties the pipeline together: type resolution and composition produce a
//! kernel plan, renderers turn it into backend source, and the generation
//! cache makes sure each distinct kernel is built once. Built kernels run
//! in-process against a [`Namespace`] and hand their result buffer to the
//! host as a [`HostArray`](cinder_device::HostArray).

pub mod config;
pub mod error;
pub mod generator;
pub mod interpreter;
pub mod kernel;
pub mod kernel_cache;
pub mod namespace;


pub use config::GeneratorConfig;
pub use error::*;
pub use generator::CodeGenerator;
pub use interpreter::PlanProgram;
pub use kernel::{Fingerprint, Kernel, Program, code_hash};
pub use kernel_cache::{KernelCache, global};
pub use namespace::{Namespace, Value};

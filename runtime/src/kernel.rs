//! Kernel identity and the executable program model.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use cinder_codegen::{RenderedKernel, Skeleton, Specialization};
use cinder_device::{Allocator, HostArray, HostRuntime};
use cinder_dtype::{Backend, ResolvedType};
use cinder_ir::{AbstractCodeBlock, Variables};
use xxhash_rust::xxh64::Xxh64;

use crate::{Namespace, Result};

/// Identity of a generated kernel.
///
/// Two requests with equal fingerprints produce byte-identical source, so
/// one cached kernel serves both.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub skeleton: String,
    pub specialization: String,
    /// Every variable with its resolved type, in name order.
    pub signature: Vec<(String, ResolvedType)>,
    pub backend: Backend,
    /// Hash of the variable table and the abstract code.
    pub code_hash: u64,
}

impl Fingerprint {
    pub fn new(
        skeleton: &Skeleton,
        specialization: &Specialization,
        signature: Vec<(String, ResolvedType)>,
        backend: Backend,
        variables: &Variables,
        code: &AbstractCodeBlock,
    ) -> Self {
        Self {
            skeleton: skeleton.id.clone(),
            specialization: specialization.id.clone(),
            signature,
            backend,
            code_hash: code_hash(variables, code),
        }
    }
}

/// Content hash of a kernel's inputs.
///
/// Uses xxh64 with a fixed seed so the value is stable across processes.
pub fn code_hash(variables: &Variables, code: &AbstractCodeBlock) -> u64 {
    let mut hasher = Xxh64::new(0);
    variables.hash(&mut hasher);
    code.hash(&mut hasher);
    hasher.finish()
}

/// A built kernel that can be run against a namespace.
pub trait Program: Send + Sync {
    /// Run the kernel once.
    ///
    /// Arrays the kernel assigns to are written back into `namespace`. The
    /// result buffer is allocated from `allocator` and handed to `host`.
    fn run(&self, namespace: &mut Namespace, allocator: Arc<dyn Allocator>, host: &dyn HostRuntime)
    -> Result<HostArray>;

    /// Kernel name for debugging.
    fn name(&self) -> &str;
}

/// Cached kernel: rendered source plus its executable form.
pub struct Kernel {
    pub fingerprint: Fingerprint,
    pub source: RenderedKernel,
    pub program: Box<dyn Program>,
}

impl Kernel {
    pub fn new(fingerprint: Fingerprint, source: RenderedKernel, program: Box<dyn Program>) -> Self {
        Self { fingerprint, source, program }
    }

    pub fn run(
        &self,
        namespace: &mut Namespace,
        allocator: Arc<dyn Allocator>,
        host: &dyn HostRuntime,
    ) -> Result<HostArray> {
        self.program.run(namespace, allocator, host)
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("fingerprint", &self.fingerprint)
            .field("entry_point", &self.source.entry_point)
            .field("program", &self.program.name())
            .finish()
    }
}

//! Kernel generation facade.
//!
//! Resolves a request's types, fingerprints it and serves the kernel from
//! the generation cache, composing and rendering it on a miss.

use std::sync::Arc;

use cinder_codegen::{CompositionContext, Skeleton, Specialization, compose, renderer_for, resolve_signature};
use cinder_device::{Allocator, CpuAllocator, HostArray, HostRuntime, NumpyHost};
use cinder_ir::{AbstractCodeBlock, Variables};
use snafu::ResultExt;
use tracing::debug;

use crate::interpreter::PlanProgram;
use crate::kernel::{Fingerprint, Kernel};
use crate::kernel_cache::{self, KernelCache};
use crate::{CodegenSnafu, GeneratorConfig, Namespace, ResolveSnafu, Result};

/// Generates, caches and runs kernels for one backend configuration.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    config: GeneratorConfig,
    cache: Arc<KernelCache>,
    allocator: Arc<dyn Allocator>,
}

impl CodeGenerator {
    /// Generator backed by the process-wide cache.
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_cache(config, kernel_cache::global())
    }

    pub fn with_cache(config: GeneratorConfig, cache: Arc<KernelCache>) -> Self {
        Self { config, cache, allocator: Arc::new(CpuAllocator) }
    }

    /// Use `allocator` for result buffers.
    pub fn with_allocator(mut self, allocator: Arc<dyn Allocator>) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<KernelCache> {
        &self.cache
    }

    /// Fingerprint of a request.
    ///
    /// Fails if a variable's kind has no storage on the configured backend;
    /// nothing is cached in that case.
    pub fn fingerprint(
        &self,
        skeleton: &Skeleton,
        specialization: &Specialization,
        variables: &Variables,
        code: &AbstractCodeBlock,
    ) -> Result<Fingerprint> {
        let signature = resolve_signature(variables, &self.config.table).context(ResolveSnafu)?;
        Ok(Fingerprint::new(skeleton, specialization, signature, self.config.backend, variables, code))
    }

    /// Get the kernel for a request, generating it on first use.
    pub fn kernel(
        &self,
        skeleton: &Skeleton,
        specialization: &Specialization,
        variables: &Variables,
        code: &AbstractCodeBlock,
    ) -> Result<Arc<Kernel>> {
        let fingerprint = self.fingerprint(skeleton, specialization, variables, code)?;
        self.cache.get_or_build(&fingerprint, || self.build(fingerprint.clone(), skeleton, specialization, variables, code))
    }

    fn build(
        &self,
        fingerprint: Fingerprint,
        skeleton: &Skeleton,
        specialization: &Specialization,
        variables: &Variables,
        code: &AbstractCodeBlock,
    ) -> Result<Kernel> {
        let ctx = CompositionContext { variables, code, resolver: &self.config.table };
        let plan = compose(skeleton, specialization, &ctx).context(CodegenSnafu)?;
        let source = renderer_for(self.config.backend).render(&plan).context(CodegenSnafu)?;

        debug!(
            entry_point = %source.entry_point,
            backend = %source.backend,
            lines = source.code.lines().count(),
            "generated kernel"
        );
        if self.config.debug_source {
            debug!(entry_point = %source.entry_point, "kernel source:\n{}", source.code);
        }

        Ok(Kernel::new(fingerprint, source, Box::new(PlanProgram::new(plan))))
    }

    /// Run a kernel against `namespace`, handing the result to `host`.
    pub fn run(&self, kernel: &Kernel, namespace: &mut Namespace, host: &dyn HostRuntime) -> Result<HostArray> {
        kernel.run(namespace, Arc::clone(&self.allocator), host)
    }

    /// Indices `i` in `0..N` whose condition holds, in ascending order.
    pub fn group_get_indices(
        &self,
        variables: &Variables,
        code: &AbstractCodeBlock,
        namespace: &mut Namespace,
    ) -> Result<HostArray> {
        let skeleton = Skeleton::compute_and_select();
        let specialization = Specialization::group_get_indices();
        let kernel = self.kernel(&skeleton, &specialization, variables, code)?;
        self.run(&kernel, namespace, &NumpyHost)
    }
}

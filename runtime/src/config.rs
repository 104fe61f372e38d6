//! Generator configuration.
//!
//! Provides typed configuration with a bon builder and environment variable
//! fallbacks.

use bon::bon;
use cinder_dtype::{Backend, DType, TypeTable};

/// Configuration of a [`CodeGenerator`](crate::CodeGenerator).
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Backend kernels are generated for.
    pub backend: Backend,
    /// Storage mapping of the backend.
    pub table: TypeTable,
    /// Log the full source of every newly built kernel.
    pub debug_source: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self { backend: Backend::Cpp, table: TypeTable::for_backend(Backend::Cpp), debug_source: false }
    }
}

#[bon]
impl GeneratorConfig {
    /// Create a generator configuration with builder pattern.
    ///
    /// Without an explicit `table`, the backend's default table is used,
    /// minus `Float64` when `disable_float64` is set.
    #[builder]
    pub fn new(
        #[builder(default = Backend::Cpp)] backend: Backend,
        table: Option<TypeTable>,
        #[builder(default = false)] disable_float64: bool,
        #[builder(default = false)] debug_source: bool,
    ) -> Self {
        let mut table = table.unwrap_or_else(|| TypeTable::for_backend(backend));
        if disable_float64 {
            table = table.without(DType::Float64);
        }
        Self { backend, table, debug_source }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `CINDER_BACKEND` - `cpp` (alias `weave`) or `numpy` (default: cpp)
    /// * `CINDER_DISABLE_FLOAT64` - Withhold double precision if set
    /// * `CINDER_DEBUG_SOURCE` - Log generated source if set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// An unparsable backend name falls back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let backend = lookup("CINDER_BACKEND").and_then(|s| s.parse().ok()).unwrap_or(Backend::Cpp);
        let disable_float64 = lookup("CINDER_DISABLE_FLOAT64").is_some();
        let debug_source = lookup("CINDER_DEBUG_SOURCE").is_some();

        Self::builder().backend(backend).disable_float64(disable_float64).debug_source(debug_source).build()
    }
}

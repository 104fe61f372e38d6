//! Generation cache.
//!
//! Maps kernel fingerprints to built kernels. Each fingerprint owns a slot
//! guarded by its own mutex: concurrent requests for one fingerprint wait on
//! that slot while the first caller builds, requests for other fingerprints
//! proceed independently. The slot map itself is papaya's lock-free HashMap.
//!
//! # Guarantees
//!
//! - the builder runs at most once per fingerprint while the entry lives;
//! - every caller of one fingerprint receives the same `Arc`;
//! - a failed build leaves the slot empty, so the next request retries.
//!
//! Entries are never evicted implicitly. A builder must not request its own
//! fingerprint.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cinder_dtype::Backend;
use once_cell::sync::Lazy;
use papaya::HashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::kernel::{Fingerprint, Kernel};

type Slot = Arc<Mutex<Option<Arc<Kernel>>>>;

/// Concurrent kernel cache keyed by [`Fingerprint`].
pub struct KernelCache {
    slots: HashMap<Fingerprint, Slot>,
    builds: AtomicUsize,
    hits: AtomicUsize,
}

impl KernelCache {
    pub fn new() -> Self {
        Self { slots: HashMap::new(), builds: AtomicUsize::new(0), hits: AtomicUsize::new(0) }
    }

    /// Get the kernel for `fingerprint`, building it if absent.
    ///
    /// Thread-safe: if multiple threads call this with the same fingerprint
    /// concurrently, exactly one runs `build` and all receive its kernel.
    pub fn get_or_build<F, E>(&self, fingerprint: &Fingerprint, build: F) -> Result<Arc<Kernel>, E>
    where
        F: FnOnce() -> Result<Kernel, E>,
    {
        let slot = {
            let guard = self.slots.guard();
            Arc::clone(self.slots.get_or_insert_with(fingerprint.clone(), Slot::default, &guard))
        };

        let mut entry = slot.lock();
        if let Some(kernel) = entry.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(specialization = %fingerprint.specialization, backend = %fingerprint.backend, "kernel cache hit");
            return Ok(Arc::clone(kernel));
        }

        debug!(
            skeleton = %fingerprint.skeleton,
            specialization = %fingerprint.specialization,
            backend = %fingerprint.backend,
            code_hash = fingerprint.code_hash,
            "kernel cache miss, building"
        );
        self.builds.fetch_add(1, Ordering::Relaxed);
        let kernel = Arc::new(build()?);
        *entry = Some(Arc::clone(&kernel));
        Ok(kernel)
    }

    /// Cached kernel for `fingerprint`, without building.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<Kernel>> {
        let guard = self.slots.guard();
        let slot = Arc::clone(self.slots.get(fingerprint, &guard)?);
        slot.lock().as_ref().map(Arc::clone)
    }

    /// Whether a built kernel is cached for `fingerprint`.
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.get(fingerprint).is_some()
    }

    /// Drop the entry for `fingerprint`. Returns whether a built kernel was
    /// removed.
    ///
    /// Callers holding the kernel keep it; the next request rebuilds.
    pub fn remove(&self, fingerprint: &Fingerprint) -> bool {
        let guard = self.slots.guard();
        let removed = self.slots.remove(fingerprint, &guard).is_some_and(|slot| slot.lock().is_some());
        debug!(specialization = %fingerprint.specialization, removed, "kernel cache remove");
        removed
    }

    /// Drop every entry built for `backend`. Returns the number of entries
    /// removed.
    pub fn invalidate_backend(&self, backend: Backend) -> usize {
        let guard = self.slots.guard();

        // Collect keys to remove (can't mutate while iterating)
        let stale: Vec<Fingerprint> =
            self.slots.iter(&guard).filter(|(key, _)| key.backend == backend).map(|(key, _)| key.clone()).collect();

        for key in &stale {
            self.slots.remove(key, &guard);
        }
        debug!(%backend, removed = stale.len(), "kernel cache invalidated backend");
        stale.len()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let guard = self.slots.guard();
        self.slots.clear(&guard);
        debug!("kernel cache cleared");
    }

    /// Number of built kernels.
    pub fn len(&self) -> usize {
        let guard = self.slots.guard();
        let slots: Vec<Slot> = self.slots.iter(&guard).map(|(_, slot)| Arc::clone(slot)).collect();
        slots.iter().filter(|slot| slot.lock().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of builder invocations so far, failed ones included.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// Number of requests served from a built entry.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }
}

impl Default for KernelCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KernelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelCache").field("builds", &self.builds()).field("hits", &self.hits()).finish()
    }
}

static GLOBAL: Lazy<Arc<KernelCache>> = Lazy::new(|| Arc::new(KernelCache::new()));

/// Process-wide cache shared by generators that do not bring their own.
pub fn global() -> Arc<KernelCache> {
    Arc::clone(&GLOBAL)
}

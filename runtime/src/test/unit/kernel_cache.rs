use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use cinder_codegen::RenderedKernel;
use cinder_device::{Allocator, HostArray, HostRuntime};
use cinder_dtype::Backend;

use crate::{Fingerprint, Kernel, KernelCache, Namespace, NoResultSnafu, Program, Result};

struct NoopProgram;

impl Program for NoopProgram {
    fn run(&self, _: &mut Namespace, _: Arc<dyn Allocator>, _: &dyn HostRuntime) -> Result<HostArray> {
        NoResultSnafu { kernel: "noop" }.fail()
    }

    fn name(&self) -> &str {
        "noop"
    }
}

fn fingerprint(name: &str, backend: Backend) -> Fingerprint {
    Fingerprint {
        skeleton: "compute_and_select".to_string(),
        specialization: name.to_string(),
        signature: Vec::new(),
        backend,
        code_hash: 0,
    }
}

fn kernel(fingerprint: &Fingerprint) -> Kernel {
    let source = RenderedKernel::new(
        String::new(),
        format!("_kernel_{}", fingerprint.specialization),
        fingerprint.specialization.clone(),
        fingerprint.backend,
        "_indices".to_string(),
    );
    Kernel::new(fingerprint.clone(), source, Box::new(NoopProgram))
}

#[test]
fn test_builds_once() {
    let cache = KernelCache::new();
    let key = fingerprint("a", Backend::Cpp);

    let first = cache.get_or_build(&key, || Ok::<_, ()>(kernel(&key))).unwrap();
    let second = cache.get_or_build(&key, || -> Result<Kernel, ()> { panic!("rebuilt a cached kernel") }).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.builds(), 1);
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_concurrent_requests_build_once() {
    const THREADS: usize = 8;
    let cache = KernelCache::new();
    let key = fingerprint("shared", Backend::Cpp);
    let calls = AtomicUsize::new(0);
    let barrier = Barrier::new(THREADS);

    let kernels: Vec<Arc<Kernel>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    cache
                        .get_or_build(&key, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(std::time::Duration::from_millis(20));
                            Ok::<_, ()>(kernel(&key))
                        })
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.builds(), 1);
    assert!(kernels.iter().all(|k| Arc::ptr_eq(k, &kernels[0])));
}

#[test]
fn test_distinct_fingerprints_build_separately() {
    let cache = KernelCache::new();
    let a = fingerprint("a", Backend::Cpp);
    let b = fingerprint("a", Backend::Numpy);

    let ka = cache.get_or_build(&a, || Ok::<_, ()>(kernel(&a))).unwrap();
    let kb = cache.get_or_build(&b, || Ok::<_, ()>(kernel(&b))).unwrap();

    assert!(!Arc::ptr_eq(&ka, &kb));
    assert_eq!(cache.builds(), 2);
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_failure_is_not_cached() {
    let cache = KernelCache::new();
    let key = fingerprint("flaky", Backend::Cpp);

    let err = cache.get_or_build(&key, || Err::<Kernel, _>("compiler crashed")).unwrap_err();
    assert_eq!(err, "compiler crashed");
    assert!(cache.get(&key).is_none());
    assert!(cache.is_empty());

    let built = cache.get_or_build(&key, || Ok::<_, &str>(kernel(&key))).unwrap();
    assert_eq!(built.fingerprint, key);
    assert_eq!(cache.builds(), 2);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_remove_forces_rebuild() {
    let cache = KernelCache::new();
    let key = fingerprint("a", Backend::Cpp);

    let first = cache.get_or_build(&key, || Ok::<_, ()>(kernel(&key))).unwrap();
    assert!(cache.remove(&key));
    assert!(!cache.remove(&key));
    assert!(!cache.contains(&key));

    let second = cache.get_or_build(&key, || Ok::<_, ()>(kernel(&key))).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(cache.builds(), 2);
}

#[test]
fn test_invalidate_backend() {
    let cache = KernelCache::new();
    let keys = [fingerprint("a", Backend::Cpp), fingerprint("b", Backend::Cpp), fingerprint("a", Backend::Numpy)];
    for key in &keys {
        cache.get_or_build(key, || Ok::<_, ()>(kernel(key))).unwrap();
    }

    assert_eq!(cache.invalidate_backend(Backend::Cpp), 2);
    assert!(!cache.contains(&keys[0]));
    assert!(!cache.contains(&keys[1]));
    assert!(cache.contains(&keys[2]));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_clear() {
    let cache = KernelCache::new();
    let key = fingerprint("a", Backend::Cpp);
    cache.get_or_build(&key, || Ok::<_, ()>(kernel(&key))).unwrap();

    cache.clear();
    assert!(cache.is_empty());
}

//! Collection pass over reclaimable host and device memory
//!
//! The [`Reclaimer`] runs registered reclaim hooks (components drop their
//! internal caches and report how many objects they freed), asks the
//! accelerator bridge to purge cached allocations, and synchronizes every
//! visible device so the release is observable before returning.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::memory::accel::AcceleratorBridge;

/// A reclaim hook returns the number of objects it freed.
pub type ReclaimHook = Box<dyn Fn() -> usize + Send + Sync>;

/// Cumulative collection statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReclaimStats {
    /// Number of collection passes run.
    pub runs: u64,
    /// Total objects reclaimed across all passes.
    pub total_reclaimed: u64,
}

/// Runs collection passes on demand.
///
/// Idempotent: a pass with nothing to reclaim returns 0. The synchronize
/// step may briefly stall in-flight accelerator work, so `collect` must
/// not be called while holding a latency-sensitive lock.
pub struct Reclaimer {
    hooks: Mutex<Vec<(String, ReclaimHook)>>,
    accel: Arc<dyn AcceleratorBridge>,
    last_collect: Mutex<Instant>,
    runs: AtomicU64,
    total_reclaimed: AtomicU64,
}

impl Reclaimer {
    /// Create a reclaimer over the given accelerator bridge.
    pub fn new(accel: Arc<dyn AcceleratorBridge>) -> Self {
        Self {
            hooks: Mutex::new(Vec::new()),
            accel,
            last_collect: Mutex::new(Instant::now()),
            runs: AtomicU64::new(0),
            total_reclaimed: AtomicU64::new(0),
        }
    }

    /// Register a named reclaim hook. Hooks run in registration order.
    pub fn register_hook(
        &self,
        name: impl Into<String>,
        hook: impl Fn() -> usize + Send + Sync + 'static,
    ) {
        let mut hooks = self.hooks.lock().expect("reclaim hook table poisoned");
        hooks.push((name.into(), Box::new(hook)));
    }

    /// Run one collection pass and return the number of objects reclaimed.
    pub fn collect(&self) -> usize {
        let mut reclaimed = 0usize;
        {
            let hooks = self.hooks.lock().expect("reclaim hook table poisoned");
            for (name, hook) in hooks.iter() {
                let freed = hook();
                if freed > 0 {
                    debug!(hook = %name, freed, "reclaim hook freed objects");
                }
                reclaimed += freed;
            }
        }

        reclaimed += self.accel.purge();
        self.accel.synchronize();

        *self.last_collect.lock().expect("last-collect clock poisoned") = Instant::now();
        self.runs.fetch_add(1, Ordering::Relaxed);
        self.total_reclaimed
            .fetch_add(reclaimed as u64, Ordering::Relaxed);
        debug!(reclaimed, "collection pass complete");
        reclaimed
    }

    /// Time since the last collection pass finished.
    pub fn elapsed_since_collect(&self) -> Duration {
        self.last_collect
            .lock()
            .expect("last-collect clock poisoned")
            .elapsed()
    }

    /// Cumulative statistics.
    pub fn stats(&self) -> ReclaimStats {
        ReclaimStats {
            runs: self.runs.load(Ordering::Relaxed),
            total_reclaimed: self.total_reclaimed.load(Ordering::Relaxed),
        }
    }
}

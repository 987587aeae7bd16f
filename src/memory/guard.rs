//! Execution guard for memory-intensive work
//!
//! Wraps one unit of work (typically a generation call) with a pre-check
//! that collects when memory is already high, a diagnostic post-check,
//! and collect-then-propagate on failure. The guard never swallows the
//! work's error and never retries.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::core::error::Result;
use crate::memory::reclaim::Reclaimer;
use crate::memory::sampler::MemorySampler;

/// Fraction of the budget above which the pre-check collects.
pub const PRE_CHECK_FRACTION: f64 = 0.8;

/// Guards units of work against memory growth.
pub struct ExecutionGuard {
    sampler: Arc<dyn MemorySampler>,
    reclaimer: Arc<Reclaimer>,
    budget_bytes: u64,
}

impl ExecutionGuard {
    /// Create a guard against the given byte budget.
    pub fn new(
        sampler: Arc<dyn MemorySampler>,
        reclaimer: Arc<Reclaimer>,
        budget_bytes: u64,
    ) -> Self {
        Self {
            sampler,
            reclaimer,
            budget_bytes,
        }
    }

    /// Run `work` under the guard.
    ///
    /// Pre-check: when resident memory already exceeds 80% of the budget,
    /// collect before starting. Post-check: when the finished work left
    /// resident memory over the budget, log and collect; the result is
    /// still returned; the check only remediates for subsequent calls.
    /// On failure: collect once, then propagate the original error
    /// unchanged.
    pub fn run<T, F>(&self, operation: &str, work: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let before = self.sampler.sample()?;
        if (before.resident_bytes as f64) > self.budget_bytes as f64 * PRE_CHECK_FRACTION {
            warn!(
                operation,
                resident_gib = before.resident_gib(),
                "memory already high before execution; collecting"
            );
            self.reclaimer.collect();
        }

        match work() {
            Ok(value) => {
                match self.sampler.sample() {
                    Ok(after) if after.resident_bytes > self.budget_bytes => {
                        error!(
                            operation,
                            resident_gib = after.resident_gib(),
                            "memory over budget after execution; collecting"
                        );
                        self.reclaimer.collect();
                    }
                    Ok(_) => {}
                    Err(e) => debug!(operation, error = %e, "post-check sampling failed"),
                }
                Ok(value)
            }
            Err(err) => {
                error!(operation, error = %err, "execution failed; collecting before propagating");
                self.reclaimer.collect();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::StudioError;
    use crate::memory::accel::NullAccelerator;
    use crate::memory::snapshot::MemorySnapshot;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FixedSampler {
        resident: AtomicU64,
    }

    impl FixedSampler {
        fn new(resident: u64) -> Arc<Self> {
            Arc::new(Self {
                resident: AtomicU64::new(resident),
            })
        }
    }

    impl MemorySampler for FixedSampler {
        fn sample(&self) -> Result<MemorySnapshot> {
            Ok(MemorySnapshot::new(
                self.resident.load(Ordering::SeqCst),
                0,
                0.0,
                HashMap::new(),
            ))
        }
    }

    #[test]
    fn test_successful_work_passes_through() {
        let sampler = FixedSampler::new(100);
        let reclaimer = Arc::new(Reclaimer::new(Arc::new(NullAccelerator)));
        let guard = ExecutionGuard::new(sampler, reclaimer.clone(), 1_000);

        let value = guard.run("unit", || Ok(42)).unwrap();
        assert_eq!(value, 42);
        assert_eq!(reclaimer.stats().runs, 0);
    }

    #[test]
    fn test_pre_check_collects_when_high() {
        let sampler = FixedSampler::new(900);
        let reclaimer = Arc::new(Reclaimer::new(Arc::new(NullAccelerator)));
        let guard = ExecutionGuard::new(sampler, reclaimer.clone(), 1_000);

        guard.run("unit", || Ok(())).unwrap();
        assert_eq!(reclaimer.stats().runs, 1);
    }

    #[test]
    fn test_post_check_collects_when_over_budget() {
        let sampler = FixedSampler::new(100);
        let reclaimer = Arc::new(Reclaimer::new(Arc::new(NullAccelerator)));
        let guard = ExecutionGuard::new(sampler.clone(), reclaimer.clone(), 1_000);

        guard
            .run("unit", || {
                sampler.resident.store(2_000, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        assert_eq!(reclaimer.stats().runs, 1);
    }

    #[test]
    fn test_error_collects_once_and_propagates_unchanged() {
        let sampler = FixedSampler::new(100);
        let reclaimer = Arc::new(Reclaimer::new(Arc::new(NullAccelerator)));
        let guard = ExecutionGuard::new(sampler, reclaimer.clone(), 1_000);

        let err = guard
            .run("unit", || -> Result<()> {
                Err(StudioError::generation("unit", "synthesis exploded"))
            })
            .unwrap_err();

        assert_eq!(reclaimer.stats().runs, 1);
        match err {
            StudioError::Generation { operation, message } => {
                assert_eq!(operation, "unit");
                assert_eq!(message, "synthesis exploded");
            }
            other => panic!("unexpected error variant: {other}"),
        }
    }
}

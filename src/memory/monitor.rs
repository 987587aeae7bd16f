//! Background memory monitor
//!
//! A polling loop on a dedicated thread: sample, compare against the
//! warning/critical cutoffs, invoke the registered callbacks. The loop is
//! a supervisor domain: sampling failures and callback panics are logged
//! and the loop keeps running. `stop()` is a bounded, best-effort join.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::core::config::MemoryConfig;
use crate::core::error::StudioError;
use crate::memory::reclaim::Reclaimer;
use crate::memory::sampler::MemorySampler;
use crate::memory::snapshot::MemorySnapshot;

/// Event name for warning-level memory pressure.
pub const MEMORY_WARNING_EVENT: &str = "memory_warning";

/// Event name for critical-level memory pressure.
pub const MEMORY_CRITICAL_EVENT: &str = "memory_critical";

/// Upper bound on how long `stop()` waits for the loop to exit.
pub const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

type Callback = Arc<dyn Fn(&MemorySnapshot) + Send + Sync>;

struct MonitorShared {
    config: MemoryConfig,
    sampler: Arc<dyn MemorySampler>,
    reclaimer: Arc<Reclaimer>,
    running: AtomicBool,
    callbacks: Mutex<HashMap<String, Callback>>,
    stop_requested: Mutex<bool>,
    stop_signal: Condvar,
    ticks: AtomicU64,
}

impl MonitorShared {
    /// Sleep for the polling interval, waking early if stop is requested.
    fn cancellable_sleep(&self, duration: Duration) {
        if duration.is_zero() {
            std::thread::yield_now();
            return;
        }
        let guard = self
            .stop_requested
            .lock()
            .expect("monitor stop gate poisoned");
        let _ = self
            .stop_signal
            .wait_timeout_while(guard, duration, |stopped| !*stopped);
    }

    fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);

        let snapshot = match self.sampler.sample() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "memory sampling failed; skipping tick");
                return;
            }
        };

        // Threshold checks are rate-limited by the collection interval,
        // which the default callbacks reset by collecting.
        if self.reclaimer.elapsed_since_collect() <= self.config.collection_interval() {
            return;
        }

        let resident = snapshot.resident_bytes;
        // Critical never suppresses warning; both may fire in one tick.
        if resident > self.config.warning_bytes() {
            self.invoke(MEMORY_WARNING_EVENT, &snapshot);
        }
        if resident >= self.config.critical_bytes() {
            self.invoke(MEMORY_CRITICAL_EVENT, &snapshot);
        }
    }

    fn invoke(&self, event: &str, snapshot: &MemorySnapshot) {
        let callback = {
            let callbacks = self.callbacks.lock().expect("monitor callback table poisoned");
            callbacks.get(event).cloned()
        };
        let Some(callback) = callback else { return };

        let outcome =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(snapshot)));
        if let Err(panic) = outcome {
            let err = StudioError::Callback {
                event: event.to_string(),
                message: panic_message(panic),
            };
            error!(error = %err, "monitor callback failed; loop continues");
        }
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "callback panicked".to_string()
    }
}

fn run_loop(shared: Arc<MonitorShared>) {
    debug!("memory monitor loop running");
    while shared.running.load(Ordering::SeqCst) {
        shared.tick();
        shared.cancellable_sleep(shared.config.poll_interval());
    }
    debug!("memory monitor loop exited");
}

/// Background memory monitor: Stopped → Running → Stopped.
///
/// Holds the callback table (`memory_warning` / `memory_critical`) and the
/// polling thread. Constructed explicitly and passed where needed; there
/// is no process-global instance.
pub struct MemoryMonitor {
    shared: Arc<MonitorShared>,
    handle: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl MemoryMonitor {
    /// Create a monitor with the default callbacks installed.
    ///
    /// Default `memory_warning`: log and collect. Default
    /// `memory_critical`: collect, log at error severity, and surface a
    /// restart recommendation; the monitor never restarts anything
    /// itself.
    pub fn new(
        config: MemoryConfig,
        sampler: Arc<dyn MemorySampler>,
        reclaimer: Arc<Reclaimer>,
    ) -> Self {
        let monitor = Self {
            shared: Arc::new(MonitorShared {
                config,
                sampler,
                reclaimer: reclaimer.clone(),
                running: AtomicBool::new(false),
                callbacks: Mutex::new(HashMap::new()),
                stop_requested: Mutex::new(false),
                stop_signal: Condvar::new(),
                ticks: AtomicU64::new(0),
            }),
            handle: Mutex::new(None),
        };

        let on_warning = reclaimer.clone();
        monitor.register_callback(MEMORY_WARNING_EVENT, move |snapshot: &MemorySnapshot| {
            warn!(
                resident_gib = snapshot.resident_gib(),
                "memory usage warning; collecting"
            );
            on_warning.collect();
        });

        let on_critical = reclaimer;
        monitor.register_callback(MEMORY_CRITICAL_EVENT, move |snapshot: &MemorySnapshot| {
            error!(
                resident_gib = snapshot.resident_gib(),
                "memory usage critical; collecting"
            );
            on_critical.collect();
            error!("memory usage exceeded the safe limit; restarting the host process is recommended");
        });

        monitor
    }

    /// Register a callback for an event name. At most one callback per
    /// event; the last registration wins.
    ///
    /// Only `memory_warning` and `memory_critical` are ever invoked.
    /// Registrations under other names are stored but never called.
    pub fn register_callback(
        &self,
        event: impl Into<String>,
        callback: impl Fn(&MemorySnapshot) + Send + Sync + 'static,
    ) {
        let mut callbacks = self
            .shared
            .callbacks
            .lock()
            .expect("monitor callback table poisoned");
        callbacks.insert(event.into(), Arc::new(callback));
    }

    /// Start the polling loop. No-op when already running.
    pub fn start(&self) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }
        *self
            .shared
            .stop_requested
            .lock()
            .expect("monitor stop gate poisoned") = false;

        let shared = self.shared.clone();
        let handle = std::thread::Builder::new()
            .name("memory-monitor".to_string())
            .spawn(move || run_loop(shared))
            .expect("failed to spawn memory monitor thread");
        *self.handle.lock().expect("monitor handle poisoned") = Some(handle);
        info!("memory monitor started");
    }

    /// Stop the polling loop, waiting up to [`STOP_JOIN_TIMEOUT`].
    ///
    /// Best-effort: if the loop has not exited by the deadline the thread
    /// is detached and cannot prevent process exit. No-op when not
    /// running.
    pub fn stop(&self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        {
            let mut stop = self
                .shared
                .stop_requested
                .lock()
                .expect("monitor stop gate poisoned");
            *stop = true;
        }
        self.shared.stop_signal.notify_all();

        let handle = self.handle.lock().expect("monitor handle poisoned").take();
        if let Some(handle) = handle {
            let deadline = Instant::now() + STOP_JOIN_TIMEOUT;
            while !handle.is_finished() && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(10));
            }
            if handle.is_finished() {
                let _ = handle.join();
                info!("memory monitor stopped");
            } else {
                warn!(
                    timeout = ?STOP_JOIN_TIMEOUT,
                    "memory monitor loop did not exit in time; detaching"
                );
            }
        }
    }

    /// Whether the loop is currently running.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Number of ticks executed since construction.
    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::Relaxed)
    }

    /// The monitor's memory configuration.
    pub fn config(&self) -> &MemoryConfig {
        &self.shared.config
    }
}

impl Drop for MemoryMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MemoryThresholds;
    use crate::core::error::Result;
    use crate::memory::accel::NullAccelerator;
    use std::sync::atomic::AtomicU64 as TestAtomicU64;

    struct FixedSampler {
        resident: TestAtomicU64,
    }

    impl FixedSampler {
        fn new(resident: u64) -> Self {
            Self {
                resident: TestAtomicU64::new(resident),
            }
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

    fn test_config() -> MemoryConfig {
        MemoryConfig::default()
            .with_budget(1_000_000)
            .with_poll_interval(0)
            .with_collection_interval(0)
            .with_thresholds(MemoryThresholds::new(0.5, 0.9).unwrap())
    }

    #[test]
    fn test_start_is_idempotent() {
        let reclaimer = Arc::new(Reclaimer::new(Arc::new(NullAccelerator)));
        let monitor = MemoryMonitor::new(
            test_config().with_poll_interval(60),
            Arc::new(FixedSampler::new(0)),
            reclaimer,
        );
        monitor.start();
        monitor.start();
        assert!(monitor.is_running());
        monitor.stop();
        assert!(!monitor.is_running());
        monitor.stop();
    }

    #[test]
    fn test_callback_panic_does_not_kill_loop() {
        let reclaimer = Arc::new(Reclaimer::new(Arc::new(NullAccelerator)));
        let monitor = MemoryMonitor::new(
            test_config(),
            Arc::new(FixedSampler::new(950_000)),
            reclaimer,
        );
        monitor.register_callback(MEMORY_WARNING_EVENT, |_snapshot| {
            panic!("bad callback");
        });
        monitor.register_callback(MEMORY_CRITICAL_EVENT, |_snapshot| {});
        monitor.start();
        let deadline = Instant::now() + Duration::from_secs(2);
        while monitor.ticks() < 5 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(monitor.ticks() >= 5, "loop should survive panicking callbacks");
        monitor.stop();
    }

    #[test]
    fn test_unknown_event_never_invoked() {
        let reclaimer = Arc::new(Reclaimer::new(Arc::new(NullAccelerator)));
        let monitor = MemoryMonitor::new(
            test_config(),
            Arc::new(FixedSampler::new(950_000)),
            reclaimer,
        );
        let invoked = Arc::new(AtomicBool::new(false));
        let flag = invoked.clone();
        monitor.register_callback("memory_exhausted", move |_snapshot| {
            flag.store(true, Ordering::SeqCst);
        });
        monitor.start();
        let deadline = Instant::now() + Duration::from_secs(1);
        while monitor.ticks() < 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        monitor.stop();
        assert!(!invoked.load(Ordering::SeqCst));
    }
}

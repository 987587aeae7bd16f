//! Model instance cache
//!
//! Maps a logical model name to a loaded [`SpeechModel`] handle. Loads
//! lazily through a caller-supplied factory, serves cached handles on
//! subsequent requests, and evicts idle entries when a new load proceeds
//! under memory pressure. One mutex guards the whole mapping: loads are
//! slow and rare, so correctness wins over lock granularity, and holding
//! the lock across the factory call is what guarantees at most one
//! physical load per name.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::core::config::{MemoryConfig, PressureLevel};
use crate::core::error::Result;
use crate::engine::traits::SpeechModel;
use crate::memory::reclaim::Reclaimer;
use crate::memory::sampler::MemorySampler;

/// Cache counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelCacheStats {
    /// Live entries.
    pub entries: usize,
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that required a factory call.
    pub misses: u64,
    /// Entries evicted for idleness.
    pub evictions: u64,
    /// Entries removed by explicit unload or shutdown.
    pub unloads: u64,
}

impl ModelCacheStats {
    /// Fraction of lookups served from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheEntry {
    model: Arc<dyn SpeechModel>,
    last_access: Instant,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
    unloads: u64,
}

/// Lifecycle manager for loaded model instances.
///
/// The cache is the single owner of every loaded handle: callers clone
/// the `Arc` for the duration of one operation and re-fetch rather than
/// holding it across cache calls.
pub struct ModelCache {
    inner: Mutex<CacheInner>,
    config: MemoryConfig,
    sampler: Arc<dyn MemorySampler>,
    reclaimer: Arc<Reclaimer>,
}

impl ModelCache {
    /// Create an empty cache.
    pub fn new(
        config: MemoryConfig,
        sampler: Arc<dyn MemorySampler>,
        reclaimer: Arc<Reclaimer>,
    ) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                evictions: 0,
                unloads: 0,
            }),
            config,
            sampler,
            reclaimer,
        }
    }

    /// Fetch the model for `name`, loading it through `factory` on first
    /// request.
    ///
    /// Cache hits refresh the access timestamp and never invoke the
    /// factory. On a miss under warning-level memory pressure a
    /// collection pass runs and idle entries are evicted before the load
    /// proceeds, bounding peak usage while the factory allocates. Factory
    /// errors propagate unchanged and leave no entry behind.
    ///
    /// The factory must not call back into this cache; doing so would
    /// deadlock on the cache mutex.
    pub fn load<F>(&self, name: &str, factory: F) -> Result<Arc<dyn SpeechModel>>
    where
        F: FnOnce() -> Result<Arc<dyn SpeechModel>>,
    {
        let mut inner = self.inner.lock().expect("model cache poisoned");

        if let Some(entry) = inner.entries.get_mut(name) {
            entry.last_access = Instant::now();
            let model = entry.model.clone();
            inner.hits += 1;
            return Ok(model);
        }
        inner.misses += 1;

        let snapshot = self.sampler.sample()?;
        if self.config.classify(snapshot.resident_bytes) >= PressureLevel::Warning {
            warn!(
                model = name,
                resident_gib = snapshot.resident_gib(),
                "memory pressure before model load; collecting and evicting idle models"
            );
            self.reclaimer.collect();
            Self::evict_idle_locked(&mut inner, self.config.idle_timeout());
        }

        info!(model = name, "loading model");
        let started = Instant::now();
        let model = factory()?;
        inner.entries.insert(
            name.to_string(),
            CacheEntry {
                model: model.clone(),
                last_access: Instant::now(),
            },
        );
        info!(
            model = name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model loaded"
        );
        Ok(model)
    }

    /// Read-only lookup; refreshes the access timestamp on hit and never
    /// triggers a load.
    pub fn get(&self, name: &str) -> Option<Arc<dyn SpeechModel>> {
        let mut inner = self.inner.lock().expect("model cache poisoned");
        let model = inner.entries.get_mut(name).map(|entry| {
            entry.last_access = Instant::now();
            entry.model.clone()
        });
        if model.is_some() {
            inner.hits += 1;
        }
        model
    }

    /// Unload `name`: release the handle, drop the entry, collect.
    /// No-op when the name is absent.
    pub fn unload(&self, name: &str) {
        let removed = {
            let mut inner = self.inner.lock().expect("model cache poisoned");
            let removed = inner.entries.remove(name);
            if removed.is_some() {
                inner.unloads += 1;
            }
            removed
        };
        match removed {
            Some(entry) => {
                release_model(name, &entry.model);
                self.reclaimer.collect();
                info!(model = name, "model unloaded");
            }
            None => debug!(model = name, "unload requested for unknown model; ignoring"),
        }
    }

    /// Evict every entry idle for longer than the configured timeout.
    /// Returns the number of entries evicted.
    pub fn evict_idle(&self) -> usize {
        let evicted = {
            let mut inner = self.inner.lock().expect("model cache poisoned");
            Self::evict_idle_locked(&mut inner, self.config.idle_timeout())
        };
        if evicted > 0 {
            self.reclaimer.collect();
        }
        evicted
    }

    fn evict_idle_locked(inner: &mut CacheInner, idle_timeout: Duration) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_access) > idle_timeout)
            .map(|(name, _)| name.clone())
            .collect();

        for name in &expired {
            if let Some(entry) = inner.entries.remove(name) {
                info!(model = %name, "evicting idle model");
                release_model(name, &entry.model);
                inner.evictions += 1;
            }
        }
        expired.len()
    }

    /// Unload every entry. Used at process shutdown.
    pub fn cleanup_all(&self) {
        let removed: Vec<(String, CacheEntry)> = {
            let mut inner = self.inner.lock().expect("model cache poisoned");
            let removed: Vec<_> = inner.entries.drain().collect();
            inner.unloads += removed.len() as u64;
            removed
        };
        if removed.is_empty() {
            return;
        }
        for (name, entry) in &removed {
            release_model(name, &entry.model);
        }
        self.reclaimer.collect();
        info!(count = removed.len(), "all cached models unloaded");
    }

    /// Whether `name` currently has a live entry.
    pub fn contains(&self, name: &str) -> bool {
        let inner = self.inner.lock().expect("model cache poisoned");
        inner.entries.contains_key(name)
    }

    /// Names of the currently loaded models.
    pub fn loaded_names(&self) -> Vec<String> {
        let inner = self.inner.lock().expect("model cache poisoned");
        inner.entries.keys().cloned().collect()
    }

    /// Cache counters.
    pub fn stats(&self) -> ModelCacheStats {
        let inner = self.inner.lock().expect("model cache poisoned");
        ModelCacheStats {
            entries: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            unloads: inner.unloads,
        }
    }
}

fn release_model(name: &str, model: &Arc<dyn SpeechModel>) {
    if let Err(e) = model.release() {
        warn!(model = %name, error = %e, "model release failed; dropping handle anyway");
    }
}

//! Studio facade
//!
//! The explicitly constructed context that owns the memory monitor, the
//! collector, the model cache, the model hub and the saved-voice library,
//! and routes every generation call through the cache and the execution
//! guard. There is no process-global instance: embedders construct a
//! `Studio`, keep it for the process lifetime, and call [`Studio::cleanup`]
//! on the way out.

use std::sync::Arc;

use tracing::info;

use crate::core::config::{PressureLevel, StudioConfig};
use crate::core::error::Result;
use crate::engine::cache::{ModelCache, ModelCacheStats};
use crate::engine::traits::{
    AudioBuffer, CustomVoiceRequest, ModelProvider, ModelVariant, SpeechModel,
    VoiceCloneRequest, VoiceDesignRequest,
};
use crate::hub::ModelHub;
use crate::memory::accel::{AcceleratorBridge, CandleAccelerator};
use crate::memory::guard::ExecutionGuard;
use crate::memory::monitor::MemoryMonitor;
use crate::memory::reclaim::{ReclaimStats, Reclaimer};
use crate::memory::sampler::{MemorySampler, ProcSampler};
use crate::memory::snapshot::MemorySnapshot;
use crate::voice::library::{ProfileKind, SavedVoice, VoiceLibrary};

/// Directory name for saved voices under the studio root.
const VOICES_DIR_NAME: &str = "cloned_voices";

/// Top-level runtime context.
pub struct Studio {
    config: StudioConfig,
    sampler: Arc<dyn MemorySampler>,
    reclaimer: Arc<Reclaimer>,
    monitor: MemoryMonitor,
    cache: ModelCache,
    guard: ExecutionGuard,
    hub: ModelHub,
    library: VoiceLibrary,
    provider: Arc<dyn ModelProvider>,
}

impl Studio {
    /// Build a studio with production components: `/proc` sampling and
    /// candle device detection.
    pub fn new(config: StudioConfig, provider: Arc<dyn ModelProvider>) -> Result<Self> {
        let accel: Arc<dyn AcceleratorBridge> = Arc::new(CandleAccelerator::detect());
        let sampler: Arc<dyn MemorySampler> = Arc::new(ProcSampler::new(accel.clone()));
        Self::with_components(config, provider, sampler, accel)
    }

    /// Build a studio from explicit components. This is the seam tests
    /// and embedders use to substitute samplers or accelerator bridges.
    pub fn with_components(
        config: StudioConfig,
        provider: Arc<dyn ModelProvider>,
        sampler: Arc<dyn MemorySampler>,
        accel: Arc<dyn AcceleratorBridge>,
    ) -> Result<Self> {
        config.validate()?;

        let reclaimer = Arc::new(Reclaimer::new(accel));
        let monitor = MemoryMonitor::new(config.memory.clone(), sampler.clone(), reclaimer.clone());
        let cache = ModelCache::new(config.memory.clone(), sampler.clone(), reclaimer.clone());
        let guard = ExecutionGuard::new(
            sampler.clone(),
            reclaimer.clone(),
            config.memory.max_memory_bytes,
        );

        let hub = match &config.model_root {
            Some(root) => ModelHub::new(root),
            None => ModelHub::from_env(),
        };
        let voices_dir = config
            .voices_dir
            .clone()
            .unwrap_or_else(|| hub.root().join(VOICES_DIR_NAME));
        let library = VoiceLibrary::new(voices_dir)?;

        Ok(Self {
            config,
            sampler,
            reclaimer,
            monitor,
            cache,
            guard,
            hub,
            library,
            provider,
        })
    }

    /// Start background memory monitoring.
    pub fn start(&self) {
        self.monitor.start();
    }

    /// Preset-voice synthesis.
    pub fn synthesize_custom(&self, request: &CustomVoiceRequest) -> Result<AudioBuffer> {
        let model = self.model(ModelVariant::CustomVoice)?;
        self.guard
            .run("generate_custom_voice", || model.generate_custom_voice(request))
    }

    /// Voice cloning from reference audio.
    pub fn synthesize_clone(&self, request: &VoiceCloneRequest) -> Result<AudioBuffer> {
        let model = self.model(ModelVariant::Clone)?;
        self.guard
            .run("generate_voice_clone", || model.generate_voice_clone(request))
    }

    /// Voice design from a text description.
    pub fn synthesize_design(&self, request: &VoiceDesignRequest) -> Result<AudioBuffer> {
        let model = self.model(ModelVariant::VoiceDesign)?;
        self.guard
            .run("generate_voice_design", || model.generate_voice_design(request))
    }

    /// Clone a voice and optionally save it to the library in one step.
    pub fn clone_and_save(
        &self,
        request: &VoiceCloneRequest,
        save_name: Option<&str>,
    ) -> Result<(AudioBuffer, Option<SavedVoice>)> {
        let audio = self.synthesize_clone(request)?;
        let saved = match save_name {
            Some(name) => Some(self.library.save_clone(
                name,
                &request.reference_audio,
                request.reference_text.clone(),
            )?),
            None => None,
        };
        Ok((audio, saved))
    }

    /// Synthesize with a previously saved voice.
    ///
    /// Design profiles use their target text as the reference transcript,
    /// since the stored reference is the audio generated from it.
    pub fn synthesize_with_saved(&self, text: &str, voice_id: &str) -> Result<AudioBuffer> {
        let saved = self.library.get(voice_id)?;
        let reference_text = match &saved.profile.kind {
            ProfileKind::Clone { ref_text } => ref_text.clone(),
            ProfileKind::Design { target_text, .. } => target_text.clone(),
        };
        let request = VoiceCloneRequest::new(text, saved.audio_path(), reference_text);
        self.synthesize_clone(&request)
    }

    fn model(&self, variant: ModelVariant) -> Result<Arc<dyn SpeechModel>> {
        let dir = self.hub.require_installed(variant)?;
        let provider = self.provider.clone();
        self.cache
            .load(variant.cache_key(), move || provider.load(variant, &dir))
    }

    /// Current memory snapshot.
    pub fn memory_snapshot(&self) -> Result<MemorySnapshot> {
        self.sampler.sample()
    }

    /// Current memory pressure against the configured budget.
    pub fn pressure(&self) -> Result<PressureLevel> {
        let snapshot = self.sampler.sample()?;
        Ok(self.config.memory.classify(snapshot.resident_bytes))
    }

    /// Model cache counters.
    pub fn cache_stats(&self) -> ModelCacheStats {
        self.cache.stats()
    }

    /// Collection statistics.
    pub fn reclaim_stats(&self) -> ReclaimStats {
        self.reclaimer.stats()
    }

    /// The memory monitor, for callback registration.
    pub fn monitor(&self) -> &MemoryMonitor {
        &self.monitor
    }

    /// The model cache.
    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    /// The model hub.
    pub fn hub(&self) -> &ModelHub {
        &self.hub
    }

    /// The saved-voice library.
    pub fn library(&self) -> &VoiceLibrary {
        &self.library
    }

    /// The active configuration.
    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    /// Stop monitoring and unload every cached model.
    ///
    /// Idempotent; intended for both normal and abnormal termination
    /// paths, and also invoked on drop.
    pub fn cleanup(&self) {
        self.monitor.stop();
        self.cache.cleanup_all();
        self.reclaimer.collect();
        info!("studio cleanup complete");
    }
}

impl Drop for Studio {
    fn drop(&mut self) {
        self.cleanup();
    }
}

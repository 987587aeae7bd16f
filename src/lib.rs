//! # VoiceStudio - Memory-Managed TTS Front-End Runtime
//!
//! A front-end runtime for the Qwen3-TTS model family supporting preset
//! voices, reference-audio voice cloning and text-described voice design.
//! The pretrained model package is an external collaborator behind the
//! [`SpeechModel`] contract; what this crate provides is everything around
//! it:
//!
//! - **Memory monitoring**: a background loop sampling process and
//!   accelerator memory, firing warning/critical callbacks against a
//!   configurable budget
//! - **Model lifecycle**: a cache that loads heavyweight models lazily,
//!   guarantees at most one physical load per variant, and evicts idle
//!   instances under memory pressure
//! - **Guarded execution**: every generation call runs between a
//!   collect-if-high pre-check and a diagnostic post-check
//! - **Saved voices**: JSON-backed persistence for cloned and designed
//!   voice profiles
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use voice_studio::{Studio, StudioConfig, CustomVoiceRequest, Speaker};
//!
//! let studio = Studio::new(StudioConfig::default(), provider)?;
//! studio.start();
//!
//! let audio = studio.synthesize_custom(
//!     &CustomVoiceRequest::new("你好，世界！").with_speaker(Speaker::Vivian),
//! )?;
//! audio.save("output.wav")?;
//!
//! studio.cleanup();
//! ```

pub mod core;
pub mod engine;
pub mod hub;
pub mod memory;
pub mod studio;
pub mod voice;

// Core re-exports
pub use crate::core::{
    config::{
        MemoryConfig, MemoryThresholds, PressureLevel, StudioConfig,
        DEFAULT_MEMORY_BUDGET_BYTES,
    },
    error::{Result, ResultExt, StudioError},
};

// Memory layer re-exports
pub use crate::memory::{
    AcceleratorBridge, CandleAccelerator, DeviceMemory, ExecutionGuard, MemoryMonitor,
    MemorySampler, MemorySnapshot, NullAccelerator, ProcSampler, ReclaimStats, Reclaimer,
    MEMORY_CRITICAL_EVENT, MEMORY_WARNING_EVENT, STOP_JOIN_TIMEOUT,
};

// Engine re-exports
pub use crate::engine::{
    AudioBuffer, CustomVoiceRequest, ModelCache, ModelCacheStats, ModelProvider, ModelVariant,
    SpeechModel, VoiceCloneRequest, VoiceDesignRequest, MODEL_SAMPLE_RATE,
};

// Hub, voices, facade
pub use crate::hub::ModelHub;
pub use crate::studio::Studio;
pub use crate::voice::{Language, ProfileKind, SavedVoice, Speaker, VoiceLibrary, VoiceProfile};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Framework name
pub const STUDIO_NAME: &str = "VoiceStudio";

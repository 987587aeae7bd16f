//! Speech engine layer
//!
//! The [`SpeechModel`] contract the pretrained model package is consumed
//! through, and the [`ModelCache`] that owns loaded instances.

pub mod cache;
pub mod traits;

pub use cache::{ModelCache, ModelCacheStats};
pub use traits::{
    AudioBuffer, CustomVoiceRequest, ModelProvider, ModelVariant, SpeechModel,
    VoiceCloneRequest, VoiceDesignRequest, MODEL_SAMPLE_RATE,
};

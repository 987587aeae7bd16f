//! Speech model contract
//!
//! The pretrained model package is an external collaborator. This module
//! defines the trait it is consumed through, the three request shapes
//! (preset voice, cloning, voice design), and the audio buffer the model
//! returns.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::error::{Result, StudioError};
use crate::voice::presets::{Language, Speaker};

/// Output sample rate of the model family (24 kHz).
pub const MODEL_SAMPLE_RATE: u32 = 24_000;

/// Model variants served by the studio, each loaded from its own
/// directory and cached under its own logical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelVariant {
    /// Preset-voice synthesis.
    CustomVoice,
    /// Reference-audio voice cloning (the base model).
    Clone,
    /// Text-described voice design.
    VoiceDesign,
}

impl ModelVariant {
    /// All variants, in display order.
    pub fn all() -> &'static [ModelVariant] {
        &[
            ModelVariant::CustomVoice,
            ModelVariant::Clone,
            ModelVariant::VoiceDesign,
        ]
    }

    /// Logical name the model cache keys this variant under.
    pub fn cache_key(&self) -> &'static str {
        match self {
            ModelVariant::CustomVoice => "custom_voice",
            ModelVariant::Clone => "clone_model",
            ModelVariant::VoiceDesign => "voice_design_model",
        }
    }

    /// Directory name under the model root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ModelVariant::CustomVoice => "models",
            ModelVariant::Clone => "models-base",
            ModelVariant::VoiceDesign => "models-voicedesign",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelVariant::CustomVoice => write!(f, "CustomVoice"),
            ModelVariant::Clone => write!(f, "Clone"),
            ModelVariant::VoiceDesign => write!(f, "VoiceDesign"),
        }
    }
}

/// Mono audio produced by a generation call.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Samples in `[-1, 1]`.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a buffer.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Write the buffer as 16-bit PCM WAV.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).map_err(|e| StudioError::Io {
            message: format!("cannot create WAV file: {}", e),
            path: Some(path.to_path_buf()),
        })?;
        for sample in &self.samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(value).map_err(|e| StudioError::Io {
                message: format!("cannot write WAV sample: {}", e),
                path: Some(path.to_path_buf()),
            })?;
        }
        writer.finalize().map_err(|e| StudioError::Io {
            message: format!("cannot finalize WAV file: {}", e),
            path: Some(path.to_path_buf()),
        })?;
        Ok(())
    }
}

/// Request for preset-voice synthesis.
#[derive(Debug, Clone)]
pub struct CustomVoiceRequest {
    /// Text to synthesize.
    pub text: String,
    /// Target language.
    pub language: Language,
    /// Preset voice.
    pub speaker: Speaker,
    /// Optional style instruction.
    pub instruct: Option<String>,
    /// Generation temperature.
    pub temperature: f32,
}

impl CustomVoiceRequest {
    /// Create a request with the default speaker and its tuned temperature.
    pub fn new(text: impl Into<String>) -> Self {
        let speaker = Speaker::default();
        Self {
            text: text.into(),
            language: Language::default(),
            speaker,
            instruct: None,
            temperature: speaker.default_temperature(),
        }
    }

    /// Select a speaker, adopting its tuned temperature.
    pub fn with_speaker(mut self, speaker: Speaker) -> Self {
        self.speaker = speaker;
        self.temperature = speaker.default_temperature();
        self
    }

    /// Select a language.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Add a style instruction.
    pub fn with_instruct(mut self, instruct: impl Into<String>) -> Self {
        self.instruct = Some(instruct.into());
        self
    }

    /// Override the generation temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }
}

/// Request for reference-audio voice cloning.
#[derive(Debug, Clone)]
pub struct VoiceCloneRequest {
    /// Text to synthesize in the cloned voice.
    pub text: String,
    /// Path to the reference audio.
    pub reference_audio: PathBuf,
    /// Transcript of the reference audio.
    pub reference_text: String,
}

impl VoiceCloneRequest {
    /// Create a cloning request.
    pub fn new(
        text: impl Into<String>,
        reference_audio: impl Into<PathBuf>,
        reference_text: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            reference_audio: reference_audio.into(),
            reference_text: reference_text.into(),
        }
    }
}

/// Request for text-described voice design.
#[derive(Debug, Clone)]
pub struct VoiceDesignRequest {
    /// Text to synthesize.
    pub text: String,
    /// Natural-language description of the desired voice.
    pub description: String,
}

impl VoiceDesignRequest {
    /// Create a design request.
    pub fn new(text: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            description: description.into(),
        }
    }
}

/// The loaded pretrained model, behind its load/generate/release contract.
///
/// Every generation operation defaults to an "unsupported" error so a
/// variant only implements the calls it actually serves. `release` is the
/// graceful-teardown capability with a no-op default; the cache invokes
/// it exactly once when an entry is evicted or unloaded.
pub trait SpeechModel: Send + Sync {
    /// Which variant this model serves.
    fn variant(&self) -> ModelVariant;

    /// Preset-voice synthesis.
    fn generate_custom_voice(&self, request: &CustomVoiceRequest) -> Result<AudioBuffer> {
        let _ = request;
        Err(StudioError::generation(
            "generate_custom_voice",
            format!("not supported by the {} model", self.variant()),
        ))
    }

    /// Voice cloning from reference audio.
    fn generate_voice_clone(&self, request: &VoiceCloneRequest) -> Result<AudioBuffer> {
        let _ = request;
        Err(StudioError::generation(
            "generate_voice_clone",
            format!("not supported by the {} model", self.variant()),
        ))
    }

    /// Voice design from a text description.
    fn generate_voice_design(&self, request: &VoiceDesignRequest) -> Result<AudioBuffer> {
        let _ = request;
        Err(StudioError::generation(
            "generate_voice_design",
            format!("not supported by the {} model", self.variant()),
        ))
    }

    /// Move weights off the accelerator and drop internal buffers before
    /// the handle itself is dropped. No-op by default.
    fn release(&self) -> Result<()> {
        Ok(())
    }
}

/// Supplies model instances per variant; the studio routes every load
/// through the model cache so each factory runs at most once per variant
/// between evictions.
pub trait ModelProvider: Send + Sync {
    /// Load the model serving `variant` from the given directory.
    fn load(&self, variant: ModelVariant, model_dir: &Path) -> Result<Arc<dyn SpeechModel>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_keys_and_dirs() {
        assert_eq!(ModelVariant::CustomVoice.cache_key(), "custom_voice");
        assert_eq!(ModelVariant::Clone.cache_key(), "clone_model");
        assert_eq!(ModelVariant::VoiceDesign.cache_key(), "voice_design_model");
        assert_eq!(ModelVariant::CustomVoice.dir_name(), "models");
        assert_eq!(ModelVariant::Clone.dir_name(), "models-base");
        assert_eq!(ModelVariant::VoiceDesign.dir_name(), "models-voicedesign");
    }

    #[test]
    fn test_custom_voice_request_defaults() {
        let request = CustomVoiceRequest::new("hello");
        assert_eq!(request.speaker, Speaker::Vivian);
        assert_eq!(request.language, Language::Auto);
        assert!((request.temperature - 0.7).abs() < 1e-6);

        let request = request.with_speaker(Speaker::Ryan);
        assert!((request.temperature - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_audio_buffer_duration() {
        let buffer = AudioBuffer::new(vec![0.0; 24_000], MODEL_SAMPLE_RATE);
        assert!((buffer.duration_secs() - 1.0).abs() < 1e-6);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_audio_buffer_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<f32> = (0..2400)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 24_000.0).sin())
            .collect();
        AudioBuffer::new(samples, MODEL_SAMPLE_RATE).save(&path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, MODEL_SAMPLE_RATE);
        assert_eq!(reader.len(), 2400);
    }

    struct CloneOnly;

    impl SpeechModel for CloneOnly {
        fn variant(&self) -> ModelVariant {
            ModelVariant::Clone
        }

        fn generate_voice_clone(&self, _request: &VoiceCloneRequest) -> Result<AudioBuffer> {
            Ok(AudioBuffer::new(vec![0.0; 240], MODEL_SAMPLE_RATE))
        }
    }

    #[test]
    fn test_unsupported_operation_defaults() {
        let model = CloneOnly;
        let request = CustomVoiceRequest::new("hi");
        let err = model.generate_custom_voice(&request).unwrap_err();
        assert!(matches!(err, StudioError::Generation { .. }));
        assert!(err.to_string().contains("not supported"));
        assert!(model.release().is_ok());
    }
}

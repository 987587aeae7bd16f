//! Voices: presets and the saved-voice library

pub mod library;
pub mod presets;

pub use library::{ProfileKind, SavedVoice, VoiceLibrary, VoiceProfile};
pub use presets::{Language, Speaker};

//! Preset speakers and supported languages
//!
//! The nine preset voices shipped with the CustomVoice model and the
//! languages the model family understands, with per-speaker default
//! generation temperatures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::StudioError;

/// Preset speaker voices for the CustomVoice model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Vivian,
    Serena,
    OnoAnna,
    Aiden,
    Dylan,
    Ryan,
    UncleFu,
    Eric,
    Sohee,
}

impl Speaker {
    /// All preset speakers, in display order.
    pub fn all() -> &'static [Speaker] {
        &[
            Speaker::Vivian,
            Speaker::Serena,
            Speaker::OnoAnna,
            Speaker::Aiden,
            Speaker::Dylan,
            Speaker::Ryan,
            Speaker::UncleFu,
            Speaker::Eric,
            Speaker::Sohee,
        ]
    }

    /// The identifier the model expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Vivian => "vivian",
            Speaker::Serena => "serena",
            Speaker::OnoAnna => "ono_anna",
            Speaker::Aiden => "aiden",
            Speaker::Dylan => "dylan",
            Speaker::Ryan => "ryan",
            Speaker::UncleFu => "uncle_fu",
            Speaker::Eric => "eric",
            Speaker::Sohee => "sohee",
        }
    }

    /// Short human description of the voice.
    pub fn description(&self) -> &'static str {
        match self {
            Speaker::Vivian => "female, young, warm and friendly",
            Speaker::Serena => "female, young, neutral",
            Speaker::OnoAnna => "female, mature, gentle",
            Speaker::Aiden => "male, young, natural",
            Speaker::Dylan => "male, mature, natural",
            Speaker::Ryan => "male, mature, narration",
            Speaker::UncleFu => "male, mature, deep",
            Speaker::Eric => "boy, playful",
            Speaker::Sohee => "girl, playful",
        }
    }

    /// Default generation temperature tuned per voice.
    pub fn default_temperature(&self) -> f32 {
        match self {
            Speaker::Vivian => 0.7,
            Speaker::Serena => 0.6,
            Speaker::OnoAnna => 0.65,
            Speaker::Aiden => 0.7,
            Speaker::Dylan => 0.6,
            Speaker::Ryan => 0.5,
            Speaker::UncleFu => 0.55,
            Speaker::Eric => 0.8,
            Speaker::Sohee => 0.8,
        }
    }
}

impl Default for Speaker {
    fn default() -> Self {
        Speaker::Vivian
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Speaker {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Speaker::all()
            .iter()
            .find(|speaker| speaker.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| StudioError::validation("speaker", format!("unknown speaker '{s}'")))
    }
}

/// Languages the model family supports. `Auto` lets the model detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Auto,
    Chinese,
    English,
    Japanese,
    Korean,
    German,
    French,
    Russian,
    Portuguese,
    Spanish,
    Italian,
}

impl Language {
    /// All supported languages, in display order.
    pub fn all() -> &'static [Language] {
        &[
            Language::Auto,
            Language::Chinese,
            Language::English,
            Language::Japanese,
            Language::Korean,
            Language::German,
            Language::French,
            Language::Russian,
            Language::Portuguese,
            Language::Spanish,
            Language::Italian,
        ]
    }

    /// The identifier the model expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Auto => "Auto",
            Language::Chinese => "Chinese",
            Language::English => "English",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
            Language::German => "German",
            Language::French => "French",
            Language::Russian => "Russian",
            Language::Portuguese => "Portuguese",
            Language::Spanish => "Spanish",
            Language::Italian => "Italian",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Auto
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::all()
            .iter()
            .find(|language| language.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| StudioError::validation("language", format!("unknown language '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_roundtrip() {
        for speaker in Speaker::all() {
            assert_eq!(&speaker.as_str().parse::<Speaker>().unwrap(), speaker);
        }
        assert_eq!("UNCLE_FU".parse::<Speaker>().unwrap(), Speaker::UncleFu);
        assert!("nobody".parse::<Speaker>().is_err());
    }

    #[test]
    fn test_language_roundtrip() {
        for language in Language::all() {
            assert_eq!(&language.as_str().parse::<Language>().unwrap(), language);
        }
        assert_eq!("chinese".parse::<Language>().unwrap(), Language::Chinese);
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn test_temperatures_in_range() {
        for speaker in Speaker::all() {
            let t = speaker.default_temperature();
            assert!((0.0..=1.0).contains(&t), "{speaker}: {t}");
        }
    }

    #[test]
    fn test_speaker_serde_names() {
        let json = serde_json::to_string(&Speaker::OnoAnna).unwrap();
        assert_eq!(json, "\"ono_anna\"");
        let parsed: Speaker = serde_json::from_str("\"uncle_fu\"").unwrap();
        assert_eq!(parsed, Speaker::UncleFu);
    }
}

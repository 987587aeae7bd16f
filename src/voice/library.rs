//! Saved-voice library
//!
//! JSON-backed persistence for cloned and designed voices. Each saved
//! voice is a directory under the library root holding the reference
//! audio plus a `meta.json` describing it. Corrupt entries are skipped on
//! listing, never fatal.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::error::{Result, StudioError};

/// File name the reference audio is stored under inside a profile.
const REFERENCE_FILE: &str = "reference.wav";

/// File name of the profile metadata.
const META_FILE: &str = "meta.json";

/// What kind of voice a profile captures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProfileKind {
    /// Cloned from user-provided reference audio.
    Clone {
        /// Transcript of the reference audio.
        ref_text: String,
    },
    /// Designed from a text description; the generated audio becomes the
    /// reference for later cloning.
    Design {
        /// The voice description used at design time.
        design_instruct: String,
        /// The text that was synthesized while designing.
        target_text: String,
    },
}

/// Metadata stored in `meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// User-facing name.
    pub name: String,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Reference audio file name within the profile directory.
    pub ref_audio: String,
    /// Kind-specific fields.
    #[serde(flatten)]
    pub kind: ProfileKind,
}

/// A saved voice resolved on disk.
#[derive(Debug, Clone)]
pub struct SavedVoice {
    /// Directory name, used as the profile id.
    pub id: String,
    /// Absolute profile directory.
    pub dir: PathBuf,
    /// Parsed metadata.
    pub profile: VoiceProfile,
}

impl SavedVoice {
    /// Path of the stored reference audio.
    pub fn audio_path(&self) -> PathBuf {
        self.dir.join(&self.profile.ref_audio)
    }
}

/// Directory of saved voice profiles.
pub struct VoiceLibrary {
    root: PathBuf,
}

impl VoiceLibrary {
    /// Open (creating if needed) a library at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| StudioError::Io {
            message: format!("cannot create voice library: {}", e),
            path: Some(root.clone()),
        })?;
        Ok(Self { root })
    }

    /// The library root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save a cloned voice: copy the reference audio and write metadata.
    pub fn save_clone(
        &self,
        name: &str,
        reference_audio: &Path,
        ref_text: impl Into<String>,
    ) -> Result<SavedVoice> {
        self.save(
            name,
            reference_audio,
            ProfileKind::Clone {
                ref_text: ref_text.into(),
            },
        )
    }

    /// Save a designed voice: the generated audio becomes the reference.
    pub fn save_design(
        &self,
        name: &str,
        design_instruct: impl Into<String>,
        target_text: impl Into<String>,
        generated_audio: &Path,
    ) -> Result<SavedVoice> {
        self.save(
            name,
            generated_audio,
            ProfileKind::Design {
                design_instruct: design_instruct.into(),
                target_text: target_text.into(),
            },
        )
    }

    fn save(&self, name: &str, audio: &Path, kind: ProfileKind) -> Result<SavedVoice> {
        let created = Utc::now();
        let id = self.allocate_id(name, &created);
        let dir = self.root.join(&id);
        std::fs::create_dir_all(&dir).map_err(|e| StudioError::Io {
            message: format!("cannot create profile directory: {}", e),
            path: Some(dir.clone()),
        })?;

        std::fs::copy(audio, dir.join(REFERENCE_FILE)).map_err(|e| StudioError::Io {
            message: format!("cannot copy reference audio: {}", e),
            path: Some(audio.to_path_buf()),
        })?;

        let profile = VoiceProfile {
            name: name.to_string(),
            created,
            ref_audio: REFERENCE_FILE.to_string(),
            kind,
        };
        let meta = serde_json::to_string_pretty(&profile)?;
        std::fs::write(dir.join(META_FILE), meta).map_err(|e| StudioError::Io {
            message: format!("cannot write profile metadata: {}", e),
            path: Some(dir.join(META_FILE)),
        })?;

        info!(voice = %id, "voice profile saved");
        Ok(SavedVoice { id, dir, profile })
    }

    /// All saved voices, newest first. Entries with missing or corrupt
    /// metadata are skipped with a warning.
    pub fn list(&self) -> Result<Vec<SavedVoice>> {
        let mut voices = Vec::new();
        let entries = std::fs::read_dir(&self.root).map_err(|e| StudioError::Io {
            message: format!("cannot read voice library: {}", e),
            path: Some(self.root.clone()),
        })?;

        for entry in entries.flatten() {
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().to_string();
            match self.read_profile(&dir) {
                Ok(profile) => voices.push(SavedVoice { id, dir, profile }),
                Err(e) => warn!(voice = %id, error = %e, "skipping unreadable voice profile"),
            }
        }

        voices.sort_by(|a, b| b.profile.created.cmp(&a.profile.created));
        Ok(voices)
    }

    /// Fetch one saved voice by id.
    pub fn get(&self, id: &str) -> Result<SavedVoice> {
        validate_id(id)?;
        let dir = self.root.join(id);
        if !dir.is_dir() {
            return Err(StudioError::Config {
                message: format!("no saved voice with id '{}'", id),
                path: Some(dir),
            });
        }
        let profile = self.read_profile(&dir)?;
        Ok(SavedVoice {
            id: id.to_string(),
            dir,
            profile,
        })
    }

    /// Delete a saved voice. Returns `false` when the id does not exist.
    pub fn delete(&self, id: &str) -> Result<bool> {
        validate_id(id)?;
        let dir = self.root.join(id);
        if !dir.is_dir() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&dir).map_err(|e| StudioError::Io {
            message: format!("cannot delete voice profile: {}", e),
            path: Some(dir),
        })?;
        info!(voice = %id, "voice profile deleted");
        Ok(true)
    }

    fn read_profile(&self, dir: &Path) -> Result<VoiceProfile> {
        let meta_path = dir.join(META_FILE);
        let content = std::fs::read_to_string(&meta_path).map_err(|e| StudioError::Io {
            message: format!("cannot read profile metadata: {}", e),
            path: Some(meta_path.clone()),
        })?;
        let profile = serde_json::from_str(&content).map_err(|e| StudioError::Config {
            message: format!("corrupt profile metadata: {}", e),
            path: Some(meta_path),
        })?;
        Ok(profile)
    }

    fn allocate_id(&self, name: &str, created: &DateTime<Utc>) -> String {
        let base = format!(
            "{}_{}",
            sanitize_name(name),
            created.format("%Y%m%d_%H%M%S")
        );
        if !self.root.join(&base).exists() {
            return base;
        }
        let mut counter = 2;
        loop {
            let candidate = format!("{}_{}", base, counter);
            if !self.root.join(&candidate).exists() {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Replace anything outside `[A-Za-z0-9_-]` so the name is a safe
/// directory component.
fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "voice".to_string()
    } else {
        sanitized
    }
}

fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
        return Err(StudioError::validation(
            "voice_id",
            format!("invalid voice id '{}'", id),
        ));
    }
    Ok(())
}

//! Model directory resolution
//!
//! The three model variants live in sibling directories under one studio
//! root. The hub resolves that root (explicit setting, `VOICE_STUDIO_HOME`
//! environment variable, then `~/qwen3-tts`) and reports which variants
//! are installed, so missing checkpoints fail with an actionable message
//! instead of a deep loader error.

use std::path::{Path, PathBuf};

use crate::core::error::{Result, StudioError};
use crate::engine::traits::ModelVariant;

/// Environment variable overriding the studio root directory.
pub const HOME_ENV: &str = "VOICE_STUDIO_HOME";

/// Default studio directory name under the user's home.
const DEFAULT_DIR_NAME: &str = "qwen3-tts";

/// Files any installed variant directory must contain.
const CONFIG_FILE: &str = "config.json";

/// Resolves model variant directories under the studio root.
#[derive(Debug, Clone)]
pub struct ModelHub {
    root: PathBuf,
}

impl ModelHub {
    /// Create a hub over an explicit root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the root from the environment.
    ///
    /// Priority: `VOICE_STUDIO_HOME`, then `~/qwen3-tts`, then
    /// `./qwen3-tts` when no home directory is known.
    pub fn from_env() -> Self {
        if let Ok(root) = std::env::var(HOME_ENV) {
            return Self::new(root);
        }
        let base = std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        Self::new(base.join(DEFAULT_DIR_NAME))
    }

    /// The studio root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the given variant's checkpoints.
    pub fn variant_dir(&self, variant: ModelVariant) -> PathBuf {
        self.root.join(variant.dir_name())
    }

    /// Whether the variant's checkpoints are present.
    pub fn is_installed(&self, variant: ModelVariant) -> bool {
        self.variant_dir(variant).join(CONFIG_FILE).is_file()
    }

    /// All installed variants.
    pub fn installed_variants(&self) -> Vec<ModelVariant> {
        ModelVariant::all()
            .iter()
            .copied()
            .filter(|variant| self.is_installed(*variant))
            .collect()
    }

    /// Resolve the variant directory, failing when it is not installed.
    pub fn require_installed(&self, variant: ModelVariant) -> Result<PathBuf> {
        let dir = self.variant_dir(variant);
        if self.is_installed(variant) {
            Ok(dir)
        } else {
            Err(StudioError::Config {
                message: format!(
                    "{} model is not installed; download its checkpoints into {}",
                    variant,
                    dir.display()
                ),
                path: Some(dir),
            })
        }
    }
}

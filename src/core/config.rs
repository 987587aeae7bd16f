//! Runtime configuration
//!
//! Memory budget, polling/collection intervals, idle timeout and the
//! warning/critical thresholds, plus the top-level studio configuration
//! with its storage directories. All fields have documented defaults and
//! are validated eagerly at construction.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, StudioError};

/// Default maximum memory budget: 10 GiB.
pub const DEFAULT_MEMORY_BUDGET_BYTES: u64 = 10 * 1024 * 1024 * 1024;

/// Default polling interval for the memory monitor (seconds).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default minimum interval between collections (seconds).
pub const DEFAULT_COLLECTION_INTERVAL_SECS: u64 = 30;

/// Default idle timeout before a cached model becomes evictable (seconds).
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;

/// Memory pressure classification against the configured budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureLevel {
    /// Below the warning cutoff.
    Normal,
    /// Above the warning cutoff but below the critical cutoff.
    Warning,
    /// At or above the critical cutoff.
    Critical,
}

impl std::fmt::Display for PressureLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PressureLevel::Normal => write!(f, "normal"),
            PressureLevel::Warning => write!(f, "warning"),
            PressureLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Warning/critical threshold fractions applied against the byte budget.
///
/// Invariant: `0 < warning_fraction < critical_fraction <= 1`, enforced
/// by [`MemoryThresholds::validate`] at configuration time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MemoryThresholds {
    /// Fraction of the budget at which warning callbacks fire.
    pub warning_fraction: f64,
    /// Fraction of the budget at which critical callbacks fire.
    pub critical_fraction: f64,
}

impl Default for MemoryThresholds {
    fn default() -> Self {
        Self {
            warning_fraction: 0.7,
            critical_fraction: 0.9,
        }
    }
}

impl MemoryThresholds {
    /// Create thresholds, validating the ordering invariant.
    pub fn new(warning_fraction: f64, critical_fraction: f64) -> Result<Self> {
        let thresholds = Self {
            warning_fraction,
            critical_fraction,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Validate `0 < warning < critical <= 1`.
    pub fn validate(&self) -> Result<()> {
        if !(self.warning_fraction > 0.0 && self.warning_fraction < 1.0) {
            return Err(StudioError::validation(
                "warning_fraction",
                format!("must be in (0, 1), got {}", self.warning_fraction),
            ));
        }
        if !(self.critical_fraction > 0.0 && self.critical_fraction <= 1.0) {
            return Err(StudioError::validation(
                "critical_fraction",
                format!("must be in (0, 1], got {}", self.critical_fraction),
            ));
        }
        if self.critical_fraction <= self.warning_fraction {
            return Err(StudioError::validation(
                "critical_fraction",
                format!(
                    "must be greater than warning_fraction ({} <= {})",
                    self.critical_fraction, self.warning_fraction
                ),
            ));
        }
        Ok(())
    }
}

/// Memory management configuration.
///
/// Durations are stored in whole seconds so the struct round-trips through
/// JSON config files; accessor methods expose them as [`Duration`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum allowed resident memory in bytes.
    pub max_memory_bytes: u64,
    /// Monitor polling interval in seconds.
    pub poll_interval_secs: u64,
    /// Minimum interval between collections in seconds.
    pub collection_interval_secs: u64,
    /// Idle timeout before a cached model becomes evictable, in seconds.
    pub idle_timeout_secs: u64,
    /// Warning/critical fractions.
    pub thresholds: MemoryThresholds,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_memory_bytes: DEFAULT_MEMORY_BUDGET_BYTES,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            collection_interval_secs: DEFAULT_COLLECTION_INTERVAL_SECS,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            thresholds: MemoryThresholds::default(),
        }
    }
}

impl MemoryConfig {
    /// Set the memory budget.
    pub fn with_budget(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = bytes;
        self
    }

    /// Set the polling interval.
    pub fn with_poll_interval(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Set the collection interval.
    pub fn with_collection_interval(mut self, secs: u64) -> Self {
        self.collection_interval_secs = secs;
        self
    }

    /// Set the idle timeout.
    pub fn with_idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = secs;
        self
    }

    /// Set the threshold fractions.
    pub fn with_thresholds(mut self, thresholds: MemoryThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Monitor polling interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Minimum interval between collections.
    pub fn collection_interval(&self) -> Duration {
        Duration::from_secs(self.collection_interval_secs)
    }

    /// Idle timeout for cached models.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Byte cutoff above which warning callbacks fire.
    pub fn warning_bytes(&self) -> u64 {
        (self.max_memory_bytes as f64 * self.thresholds.warning_fraction) as u64
    }

    /// Byte cutoff at which critical callbacks fire.
    pub fn critical_bytes(&self) -> u64 {
        (self.max_memory_bytes as f64 * self.thresholds.critical_fraction) as u64
    }

    /// Classify resident memory against the cutoffs.
    ///
    /// Warning requires strictly exceeding the warning cutoff; critical
    /// fires at or above the critical cutoff.
    pub fn classify(&self, resident_bytes: u64) -> PressureLevel {
        if resident_bytes >= self.critical_bytes() {
            PressureLevel::Critical
        } else if resident_bytes > self.warning_bytes() {
            PressureLevel::Warning
        } else {
            PressureLevel::Normal
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_memory_bytes == 0 {
            return Err(StudioError::validation(
                "max_memory_bytes",
                "memory budget must be non-zero",
            ));
        }
        self.thresholds.validate()
    }
}

/// Top-level studio configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Memory management settings.
    pub memory: MemoryConfig,
    /// Root directory holding the model variant directories.
    ///
    /// `None` resolves via the `VOICE_STUDIO_HOME` environment variable,
    /// falling back to `~/qwen3-tts`.
    pub model_root: Option<PathBuf>,
    /// Directory for saved voice profiles. Defaults to `cloned_voices`
    /// under the model root.
    pub voices_dir: Option<PathBuf>,
    /// Directory for generated audio files.
    pub output_dir: PathBuf,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            memory: MemoryConfig::default(),
            model_root: None,
            voices_dir: None,
            output_dir: PathBuf::from("outputs"),
        }
    }
}

impl StudioConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| StudioError::Config {
            message: format!("cannot read config file: {}", e),
            path: Some(path.to_path_buf()),
        })?;
        let config: StudioConfig =
            serde_json::from_str(&content).map_err(|e| StudioError::Config {
                message: format!("cannot parse config file: {}", e),
                path: Some(path.to_path_buf()),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Set the memory configuration.
    pub fn with_memory(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }

    /// Set the model root directory.
    pub fn with_model_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.model_root = Some(root.into());
        self
    }

    /// Set the saved-voices directory.
    pub fn with_voices_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.voices_dir = Some(dir.into());
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.memory.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cutoffs() {
        let config = MemoryConfig::default();
        assert_eq!(config.max_memory_bytes, 10 * 1024 * 1024 * 1024);
        assert_eq!(config.warning_bytes(), (config.max_memory_bytes as f64 * 0.7) as u64);
        assert_eq!(config.critical_bytes(), (config.max_memory_bytes as f64 * 0.9) as u64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_ordering_enforced() {
        assert!(MemoryThresholds::new(0.9, 0.7).is_err());
        assert!(MemoryThresholds::new(0.7, 0.7).is_err());
        assert!(MemoryThresholds::new(0.0, 0.9).is_err());
        assert!(MemoryThresholds::new(0.5, 1.1).is_err());
        assert!(MemoryThresholds::new(0.5, 1.0).is_ok());
    }

    #[test]
    fn test_classify_boundaries() {
        let config = MemoryConfig::default()
            .with_budget(1_000_000)
            .with_thresholds(MemoryThresholds::new(0.5, 0.9).unwrap());

        assert_eq!(config.classify(400_000), PressureLevel::Normal);
        // Exactly at the warning cutoff does not trip it.
        assert_eq!(config.classify(500_000), PressureLevel::Normal);
        assert_eq!(config.classify(500_001), PressureLevel::Warning);
        // Exactly at the critical cutoff does trip it.
        assert_eq!(config.classify(900_000), PressureLevel::Critical);
        assert_eq!(config.classify(2_000_000), PressureLevel::Critical);
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = MemoryConfig::default().with_budget(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_studio_config_from_json() {
        let json = r#"{
            "memory": { "max_memory_bytes": 1073741824, "poll_interval_secs": 1 },
            "output_dir": "out"
        }"#;
        let config: StudioConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.memory.max_memory_bytes, 1024 * 1024 * 1024);
        assert_eq!(config.memory.poll_interval_secs, 1);
        // Unspecified fields take defaults.
        assert_eq!(config.memory.idle_timeout_secs, 300);
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_pressure_level_ordering() {
        assert!(PressureLevel::Normal < PressureLevel::Warning);
        assert!(PressureLevel::Warning < PressureLevel::Critical);
    }
}

//! Core framework components
//!
//! Error taxonomy and runtime configuration shared by every other module.

pub mod config;
pub mod error;

pub use config::{
    MemoryConfig, MemoryThresholds, PressureLevel, StudioConfig, DEFAULT_MEMORY_BUDGET_BYTES,
};
pub use error::{Result, ResultExt, StudioError};

//! Structured error handling for VoiceStudio
//!
//! Provides a single error enum covering the runtime's failure domains,
//! a `Result` alias, and a context extension trait for wrapping foreign
//! errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias with StudioError
pub type Result<T> = std::result::Result<T, StudioError>;

/// Main error type for the VoiceStudio runtime
#[derive(Error, Debug, Clone)]
pub enum StudioError {
    /// Process memory counters could not be read.
    ///
    /// Fatal to the calling operation: an unreadable process counter means
    /// the host environment is unusable for budget accounting. The monitor
    /// logs it and skips the tick; everyone else propagates it.
    #[error("Memory sampling error: {message}")]
    Sampling { message: String },

    /// A model factory failed while loading.
    ///
    /// Propagated verbatim to the `load()` caller; no cache entry is
    /// inserted and nothing retries implicitly.
    #[error("Model loading error for '{name}': {message}")]
    ModelLoad { name: String, message: String },

    /// A registered monitor callback panicked.
    ///
    /// Caught at the monitor loop, logged, never propagated outside it.
    #[error("Callback error for '{event}': {message}")]
    Callback { event: String, message: String },

    /// A generation call failed inside the execution guard.
    #[error("Generation error in {operation}: {message}")]
    Generation { operation: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// I/O errors
    #[error("I/O error: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
    },

    /// Internal/bug errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StudioError {
    /// Shorthand for a sampling failure.
    pub fn sampling(message: impl Into<String>) -> Self {
        StudioError::Sampling {
            message: message.into(),
        }
    }

    /// Shorthand for a model-load failure.
    pub fn model_load(name: impl Into<String>, message: impl Into<String>) -> Self {
        StudioError::ModelLoad {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a generation failure.
    pub fn generation(operation: impl Into<String>, message: impl Into<String>) -> Self {
        StudioError::Generation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a validation failure on a named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        StudioError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add a simple message context
    fn context(self, msg: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| StudioError::Internal {
            message: format!("{}: {}", f(), e),
        })
    }

    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| StudioError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}

impl From<std::io::Error> for StudioError {
    fn from(err: std::io::Error) -> Self {
        StudioError::Io {
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for StudioError {
    fn from(err: serde_json::Error) -> Self {
        StudioError::Config {
            message: format!("JSON error: {}", err),
            path: None,
        }
    }
}

impl From<anyhow::Error> for StudioError {
    fn from(err: anyhow::Error) -> Self {
        StudioError::Internal {
            message: err.to_string(),
        }
    }
}

//! Error types for ostmix-compile
//!
//! Every variant is fatal for the compilation being processed. Nothing is
//! retried and nothing is published after an error.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ostmix-compile
#[derive(Error, Debug)]
pub enum Error {
    /// Database dump or override file could not be parsed
    #[error("Metadata load error in {path}: {reason}")]
    MetadataLoad { path: PathBuf, reason: String },

    /// No loop metadata exists for a referenced source
    #[error("Unresolved loop point for source {0}")]
    UnresolvedLoopPoint(String),

    /// No waveform file maps to a referenced source
    #[error("Source waveform not found for {0}")]
    SourceNotFound(String),

    /// An audio primitive failed
    #[error("Audio engine error during {operation}: {reason}")]
    AudioEngine {
        operation: &'static str,
        reason: String,
    },

    /// Compilation file is missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Output could not be written
    #[error("Publish error: {0}")]
    Publish(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for an engine failure
    pub fn engine(operation: &'static str, reason: impl Into<String>) -> Self {
        Error::AudioEngine {
            operation,
            reason: reason.into(),
        }
    }

    /// Shorthand for a metadata load failure
    pub fn metadata(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::MetadataLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience Result type using ostmix-compile Error
pub type Result<T> = std::result::Result<T, Error>;

//! Error handling module for segment-dl

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for segment-dl plumbing (configuration, I/O, setup)
#[derive(Error, Debug)]
pub enum SegmentError {
    /// Domain rule violation
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Configuration file missing or malformed
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// TOML parse error
    #[error("Failed to parse configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Worker thread could not be started
    #[error("Failed to start extraction worker: {0}")]
    WorkerSpawn(std::io::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for segment-dl operations
pub type SegmentResult<T> = std::result::Result<T, SegmentError>;

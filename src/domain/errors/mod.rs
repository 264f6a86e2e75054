// Domain errors - Error taxonomy for segment extraction

use serde::Serialize;
use thiserror::Error;

/// Domain-specific error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Time string is not `MM:SS` or `HH:MM:SS`
    #[error("Invalid time format: '{input}'. Expected MM:SS or HH:MM:SS")]
    InvalidFormat { input: String },

    /// End time is not strictly after start time
    #[error("Invalid time range: end ({end}) must be after start ({start})")]
    InvalidRange { start: String, end: String },

    /// Source string fails the accepted URL grammar
    #[error("Invalid source URL: '{input}'")]
    InvalidSource { input: String },

    /// An external tool could not be found or did not answer its version probe
    #[error("{tool} is not available: {reason}")]
    DependencyMissing { tool: String, reason: String },

    /// Engine reported completion but nothing exists at the output path
    #[error("Output file was not created: {path}")]
    OutputMissing { path: String },

    /// Engine exited with an error
    #[error("Extraction engine failed: {message}")]
    EngineFailure { message: String },

    /// User-initiated abort
    #[error("Extraction cancelled by user")]
    Cancelled,

    /// A session already has an extraction in flight
    #[error("An extraction is already in progress")]
    AlreadyRunning,
}

impl DomainError {
    /// Classify the error for outcome reporting
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            DomainError::InvalidRange { .. } => ErrorKind::InvalidRange,
            DomainError::InvalidSource { .. } => ErrorKind::InvalidSource,
            DomainError::DependencyMissing { .. } => ErrorKind::DependencyMissing,
            DomainError::OutputMissing { .. } => ErrorKind::OutputMissing,
            DomainError::EngineFailure { .. } => ErrorKind::EngineFailure,
            DomainError::Cancelled => ErrorKind::Cancelled,
            DomainError::AlreadyRunning => ErrorKind::AlreadyRunning,
        }
    }

    /// Validation errors are raised before any external process starts
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidFormat { .. }
                | DomainError::InvalidRange { .. }
                | DomainError::InvalidSource { .. }
        )
    }
}

/// Serialisable error classification carried by outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidFormat,
    InvalidRange,
    InvalidSource,
    DependencyMissing,
    OutputMissing,
    EngineFailure,
    Cancelled,
    AlreadyRunning,
}

// Ports - Interface definitions (contracts)

use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::errors::DomainError;
use crate::domain::model::{Event, ExtractionRequest};

/// Status tag of an engine progress callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    Downloading,
    Finished,
    Error,
    Other(String),
}

impl EngineStatus {
    pub fn parse(tag: &str) -> Self {
        match tag.trim() {
            "downloading" => EngineStatus::Downloading,
            "finished" => EngineStatus::Finished,
            "error" => EngineStatus::Error,
            other => EngineStatus::Other(other.to_string()),
        }
    }
}

/// One progress callback as reported by the engine, before normalisation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineProgress {
    pub status: EngineStatus,
    /// Engine-formatted percent, e.g. `" 42.7%"`
    pub percent_text: Option<String>,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub filename: Option<String>,
}

impl EngineProgress {
    pub fn new(status: EngineStatus) -> Self {
        Self {
            status,
            percent_text: None,
            downloaded_bytes: None,
            total_bytes: None,
            filename: None,
        }
    }

    pub fn with_percent(mut self, percent_text: impl Into<String>) -> Self {
        self.percent_text = Some(percent_text.into());
        self
    }
}

/// Returned from a progress hook to make the engine abandon the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookAbort;

/// Callback the engine invokes for every progress report
pub type ProgressHook<'a> = dyn FnMut(&EngineProgress) -> Result<(), HookAbort> + 'a;

/// Engine failure modes
#[derive(Debug)]
pub enum EngineError {
    /// A progress hook asked for the operation to stop; cleanup has run
    Aborted,
    /// The engine process could not be started
    Spawn(std::io::Error),
    /// The engine ran and reported failure
    Failed { code: Option<i32>, message: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Aborted => write!(f, "aborted by progress hook"),
            EngineError::Spawn(e) => write!(f, "could not start engine: {}", e),
            EngineError::Failed { code: Some(code), message } => {
                write!(f, "exit code {}: {}", code, message)
            }
            EngineError::Failed { code: None, message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for EngineError {}

/// Resolved muxing tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxerLocation {
    /// Program to run, either a path or a bare command name
    pub program: PathBuf,
    /// First line of the version output
    pub version: String,
    /// Whether `program` is a filesystem path rather than a PATH lookup
    pub is_path: bool,
}

/// Port for the external extraction engine
pub trait EnginePort: Send + Sync {
    /// Human-readable engine name
    fn name(&self) -> &str;

    /// Version probe; any failure is `DependencyMissing`
    fn probe(&self) -> Result<String, DomainError>;

    /// Run the extraction, calling `hook` for every progress report. Blocks
    /// until the engine exits or the hook aborts.
    fn extract(
        &self,
        request: &ExtractionRequest,
        muxer: &MuxerLocation,
        hook: &mut ProgressHook<'_>,
        log: &dyn LogPort,
    ) -> Result<(), EngineError>;
}

/// Port for locating the external muxing tool
pub trait MuxerPort: Send + Sync {
    /// Find a muxer that answers its version probe
    fn locate(&self) -> Result<MuxerLocation, DomainError>;
}

/// Port for file system checks
pub trait FsPort: Send + Sync {
    /// Whether a regular file exists at `path`
    fn file_exists(&self, path: &Path) -> bool;

    /// Size of the file at `path`, if readable
    fn file_size(&self, path: &Path) -> Option<u64>;
}

/// Port for logging
pub trait LogPort: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// Port receiving executor events
pub trait EventSink: Send + Sync {
    /// Must not block
    fn emit(&self, event: Event);
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: Event) {}
}

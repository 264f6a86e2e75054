// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::errors::{DomainError, ErrorKind};
use crate::domain::rules::SourceGrammar;

/// Absolute time position in whole seconds, parsed from `MM:SS` or `HH:MM:SS`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSpec {
    seconds: u64,
    text: String,
}

impl TimeSpec {
    /// Parse a time string.
    ///
    /// Components are unbounded, so `90:00` is 5400 seconds. Anything other
    /// than two or three all-digit components is `InvalidFormat`.
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();
        let invalid = || DomainError::InvalidFormat {
            input: time_str.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid());
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        if parts.len() != 2 && parts.len() != 3 {
            return Err(invalid());
        }

        let mut components = Vec::with_capacity(parts.len());
        for part in &parts {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            components.push(part.parse::<u64>().map_err(|_| invalid())?);
        }

        let (hours, minutes, seconds) = match components.as_slice() {
            [m, s] => (0, *m, *s),
            [h, m, s] => (*h, *m, *s),
            _ => return Err(invalid()),
        };

        let total = hours
            .checked_mul(3600)
            .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(seconds))
            .ok_or_else(invalid)?;

        Ok(Self {
            seconds: total,
            text: trimmed.to_string(),
        })
    }

    /// Total seconds
    pub fn as_seconds(&self) -> u64 {
        self.seconds
    }

    /// The trimmed text this value was parsed from
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Time window to extract; `end` is strictly after `start`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRange {
    pub start: TimeSpec,
    pub end: TimeSpec,
}

impl SegmentRange {
    /// Create a new range, rejecting empty and inverted windows
    pub fn new(start: TimeSpec, end: TimeSpec) -> Result<Self, DomainError> {
        if end.as_seconds() <= start.as_seconds() {
            return Err(DomainError::InvalidRange {
                start: start.as_str().to_string(),
                end: end.as_str().to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse both endpoints and build the range
    pub fn parse(start: &str, end: &str) -> Result<Self, DomainError> {
        Self::new(TimeSpec::parse(start)?, TimeSpec::parse(end)?)
    }

    /// Length of the window in seconds
    pub fn duration(&self) -> u64 {
        self.end.as_seconds() - self.start.as_seconds()
    }

    /// Section spec in the engine's `*START-END` seconds notation
    pub fn section_spec(&self) -> String {
        format!("*{}-{}", self.start.as_seconds(), self.end.as_seconds())
    }
}

impl fmt::Display for SegmentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start, self.end)
    }
}

/// Source URL that passed the source grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReference {
    raw: String,
    video_id: String,
}

impl SourceReference {
    /// Validate a raw source string; the string is kept unchanged
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let video_id = SourceGrammar::video_id(raw).ok_or_else(|| DomainError::InvalidSource {
            input: raw.to_string(),
        })?;
        Ok(Self {
            raw: raw.to_string(),
            video_id: video_id.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Identifier token following the recognised path
    pub fn video_id(&self) -> &str {
        &self.video_id
    }
}

impl fmt::Display for SourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Stream selection policy handed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatPolicy {
    /// Best mp4 video + m4a audio, else best single mp4, else best of anything
    #[default]
    BestMp4Compatible,
}

impl FormatPolicy {
    /// Engine format selector, tried left to right
    pub fn selector(&self) -> &'static str {
        match self {
            FormatPolicy::BestMp4Compatible => {
                "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best"
            }
        }
    }

    /// Container the merged streams end up in
    pub fn container(&self) -> &'static str {
        match self {
            FormatPolicy::BestMp4Compatible => "mp4",
        }
    }
}

/// Everything the executor needs for one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub source: SourceReference,
    pub range: SegmentRange,
    pub output_path: PathBuf,
    pub format_policy: FormatPolicy,
    pub retry_budget: u32,
    pub keyframe_alignment: bool,
    pub overwrite: bool,
}

/// Error part of a failed outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Result of one extraction attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionOutcome {
    pub success: bool,
    pub output_path: PathBuf,
    pub error: Option<OutcomeError>,
    pub file_size: Option<u64>,
}

impl ExtractionOutcome {
    pub fn succeeded(output_path: &Path, file_size: Option<u64>) -> Self {
        Self {
            success: true,
            output_path: output_path.to_path_buf(),
            error: None,
            file_size,
        }
    }

    pub fn failed(output_path: &Path, error: &DomainError) -> Self {
        Self {
            success: false,
            output_path: output_path.to_path_buf(),
            error: Some(OutcomeError {
                kind: error.kind(),
                message: error.to_string(),
            }),
            file_size: None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Cancellation is not presented as an error
    pub fn is_cancelled(&self) -> bool {
        self.error_kind() == Some(ErrorKind::Cancelled)
    }
}

/// Log level carried by `Event::Log`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// How a status message should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Event relayed from the executor to the consumer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Log { level: LogLevel, text: String },
    StatusChanged { text: String, severity: Severity },
    ProgressChanged { percent: u8 },
}

impl Event {
    pub fn log(level: LogLevel, text: impl Into<String>) -> Self {
        Event::Log {
            level,
            text: text.into(),
        }
    }

    pub fn status(text: impl Into<String>, severity: Severity) -> Self {
        Event::StatusChanged {
            text: text.into(),
            severity,
        }
    }

    /// Progress event; values above 100 are clamped
    pub fn progress(percent: u8) -> Self {
        Event::ProgressChanged {
            percent: percent.min(100),
        }
    }
}

/// Executor lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionState {
    Idle,
    Validating,
    Running,
    Succeeded,
    Failed(ErrorKind),
    Cancelled,
}

impl ExtractionState {
    /// Terminal states have no successors
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExtractionState::Succeeded | ExtractionState::Failed(_) | ExtractionState::Cancelled
        )
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: &ExtractionState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (ExtractionState::Idle, ExtractionState::Validating) => true,
            (ExtractionState::Validating, ExtractionState::Running) => true,
            (ExtractionState::Validating, ExtractionState::Failed(_)) => true,
            (ExtractionState::Running, ExtractionState::Succeeded) => true,
            (ExtractionState::Running, ExtractionState::Failed(_)) => true,
            (ExtractionState::Running, ExtractionState::Cancelled) => true,
            _ => false,
        }
    }
}

//! FFmpeg locator adapter
//!
//! Finds the muxing tool the engine needs for keyframe-accurate cuts and
//! stream merging. Candidates are tried in order: an explicitly configured
//! path, a copy bundled next to our executable, a handful of well-known
//! install locations, and finally the bare command name resolved via `PATH`.
//! A candidate only counts once `-version` exits successfully.

use std::env::consts::EXE_SUFFIX;
use std::ffi::OsStr;
use std::path::PathBuf;

use tracing::debug;

use crate::domain::errors::DomainError;
use crate::ports::{MuxerLocation, MuxerPort};
use crate::utils::process::version_probe;

const TOOL_NAME: &str = "ffmpeg";

/// Where a candidate came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    Configured,
    Bundled,
    WellKnown,
    Command,
}

/// One place the muxer may live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub program: PathBuf,
    pub source: CandidateSource,
}

/// Muxer port that probes ffmpeg locations
#[derive(Debug, Clone)]
pub struct FfmpegLocator {
    configured: Option<PathBuf>,
    bundled_dirs: Vec<PathBuf>,
    well_known: Vec<PathBuf>,
    command: String,
}

impl Default for FfmpegLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegLocator {
    /// Locator with the platform's bundled and well-known locations
    pub fn new() -> Self {
        Self {
            configured: None,
            bundled_dirs: bundled_dirs(),
            well_known: well_known_paths(),
            command: format!("{}{}", TOOL_NAME, EXE_SUFFIX),
        }
    }

    /// Locator that only tries the given command name through `PATH`
    pub fn command_only(command: impl Into<String>) -> Self {
        Self {
            configured: None,
            bundled_dirs: Vec::new(),
            well_known: Vec::new(),
            command: command.into(),
        }
    }

    pub fn with_configured_path(mut self, path: Option<PathBuf>) -> Self {
        self.configured = path;
        self
    }

    /// Extra locations searched before the built-in well-known paths
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        let mut well_known = paths;
        well_known.append(&mut self.well_known);
        self.well_known = well_known;
        self
    }

    /// Ordered candidate list
    pub fn candidates(&self) -> Vec<Candidate> {
        let binary = format!("{}{}", TOOL_NAME, EXE_SUFFIX);
        let mut candidates = Vec::new();

        if let Some(path) = &self.configured {
            candidates.push(Candidate {
                program: path.clone(),
                source: CandidateSource::Configured,
            });
        }
        for dir in &self.bundled_dirs {
            candidates.push(Candidate {
                program: dir.join(&binary),
                source: CandidateSource::Bundled,
            });
        }
        for path in &self.well_known {
            candidates.push(Candidate {
                program: path.clone(),
                source: CandidateSource::WellKnown,
            });
        }
        candidates.push(Candidate {
            program: PathBuf::from(&self.command),
            source: CandidateSource::Command,
        });

        candidates
    }
}

impl MuxerPort for FfmpegLocator {
    fn locate(&self) -> Result<MuxerLocation, DomainError> {
        let mut last_reason = String::from("no candidates");

        for candidate in self.candidates() {
            let is_path = candidate.source != CandidateSource::Command;
            if is_path && !candidate.program.is_file() {
                continue;
            }

            match version_probe(candidate.program.as_os_str(), &[OsStr::new("-version")]) {
                Ok(version) => {
                    debug!(
                        "Using {} at {} ({:?})",
                        TOOL_NAME,
                        candidate.program.display(),
                        candidate.source
                    );
                    return Ok(MuxerLocation {
                        program: candidate.program,
                        version,
                        is_path,
                    });
                }
                Err(reason) => {
                    debug!("Rejected {} candidate: {}", TOOL_NAME, reason);
                    last_reason = reason;
                }
            }
        }

        Err(DomainError::DependencyMissing {
            tool: TOOL_NAME.to_string(),
            reason: format!(
                "{} (install it, e.g. `sudo apt install ffmpeg` or `brew install ffmpeg`)",
                last_reason
            ),
        })
    }
}

fn bundled_dirs() -> Vec<PathBuf> {
    let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
    else {
        return Vec::new();
    };
    vec![exe_dir.join("resources"), exe_dir.join("bin"), exe_dir]
}

#[cfg(windows)]
fn well_known_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from(r"C:\ffmpeg\bin\ffmpeg.exe"),
        PathBuf::from(r"C:\Program Files\ffmpeg\bin\ffmpeg.exe"),
        PathBuf::from(r"C:\ProgramData\chocolatey\bin\ffmpeg.exe"),
    ]
}

#[cfg(not(windows))]
fn well_known_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/usr/bin/ffmpeg"),
        PathBuf::from("/usr/local/bin/ffmpeg"),
        PathBuf::from("/opt/homebrew/bin/ffmpeg"),
        PathBuf::from("/opt/local/bin/ffmpeg"),
        PathBuf::from("/snap/bin/ffmpeg"),
    ]
}

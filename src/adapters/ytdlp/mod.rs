//! yt-dlp extraction engine adapter
//!
//! Runs yt-dlp as a child process restricted to the requested section.
//! Progress and the final file path are reported through output templates
//! on stdout; diagnostics arrive on stderr. Both pipes are drained by reader
//! threads that forward lines to the calling thread, so the progress hook
//! and the log port are only ever invoked from the thread running
//! [`EnginePort::extract`].

pub mod progress;

use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use walkdir::WalkDir;

use crate::domain::errors::DomainError;
use crate::domain::model::ExtractionRequest;
use crate::ports::{
    EngineError, EnginePort, EngineProgress, EngineStatus, LogPort, MuxerLocation, ProgressHook,
};
use crate::utils::process::{
    hide_console, interrupt_tree, isolate_process_group, kill_tree, tree_alive, version_probe,
};

use self::progress::{parse_line, EngineLine, DONE_TEMPLATE, PROGRESS_TEMPLATE};

const DEFAULT_PROGRAM: &str = "yt-dlp";

/// How long the engine gets to shut down its ffmpeg child after SIGINT
const INTERRUPT_GRACE: Duration = Duration::from_secs(3);
const EXIT_POLL: Duration = Duration::from_millis(20);

/// Line read from one of the child's pipes
enum PipeLine {
    Stdout(String),
    Stderr(String),
}

/// Extraction engine backed by the yt-dlp executable
#[derive(Debug, Clone)]
pub struct YtDlpEngine {
    program: String,
    leading_args: Vec<String>,
}

impl Default for YtDlpEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlpEngine {
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            leading_args: Vec::new(),
        }
    }

    /// Engine launched through a multi-word command such as
    /// `["python3", "-m", "yt_dlp"]`. An empty command means the default.
    pub fn with_command(command: &[String]) -> Self {
        match command.split_first() {
            Some((program, rest)) if !program.trim().is_empty() => Self {
                program: program.clone(),
                leading_args: rest.to_vec(),
            },
            _ => Self::new(),
        }
    }

    /// Arguments passed after the launcher command
    pub fn build_args(&self, request: &ExtractionRequest, muxer: &MuxerLocation) -> Vec<String> {
        let retries = request.retry_budget.to_string();
        let mut args: Vec<String> = [
            "--newline",
            "--progress",
            "--no-colors",
            "--no-playlist",
            "--progress-template",
            PROGRESS_TEMPLATE,
            "--print",
            DONE_TEMPLATE,
            "-f",
            request.format_policy.selector(),
            "--merge-output-format",
            request.format_policy.container(),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.push("--download-sections".to_string());
        args.push(request.range.section_spec());
        if request.keyframe_alignment {
            args.push("--force-keyframes-at-cuts".to_string());
        }

        args.push("--retries".to_string());
        args.push(retries.clone());
        args.push("--fragment-retries".to_string());
        args.push(retries);

        args.push(if request.overwrite {
            "--force-overwrites".to_string()
        } else {
            "--no-overwrites".to_string()
        });

        if muxer.is_path {
            args.push("--ffmpeg-location".to_string());
            args.push(muxer.program.to_string_lossy().into_owned());
        }

        args.push("-o".to_string());
        args.push(request.output_path.to_string_lossy().into_owned());
        args.push("--".to_string());
        args.push(request.source.as_str().to_string());
        args
    }

    fn command_line(&self, args: &[String]) -> String {
        std::iter::once(&self.program)
            .chain(self.leading_args.iter())
            .chain(args.iter())
            .map(|arg| {
                if arg.contains(char::is_whitespace) || arg.is_empty() {
                    format!("\"{}\"", arg)
                } else {
                    arg.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl EnginePort for YtDlpEngine {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    fn probe(&self) -> Result<String, DomainError> {
        let mut args: Vec<&str> = self.leading_args.iter().map(String::as_str).collect();
        args.push("--version");
        version_probe(OsStr::new(&self.program), &args).map_err(|reason| {
            DomainError::DependencyMissing {
                tool: self.name().to_string(),
                reason: format!("{} (install it with `pip install yt-dlp`)", reason),
            }
        })
    }

    fn extract(
        &self,
        request: &ExtractionRequest,
        muxer: &MuxerLocation,
        hook: &mut ProgressHook<'_>,
        log: &dyn LogPort,
    ) -> Result<(), EngineError> {
        let args = self.build_args(request, muxer);
        log.info(&format!("Command: {}", self.command_line(&args)));

        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .args(&args)
            .env("PYTHONIOENCODING", "UTF-8")
            .env("PYTHONUTF8", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        hide_console(&mut command);
        isolate_process_group(&mut command);

        let mut child = command.spawn().map_err(EngineError::Spawn)?;
        let (tx, rx) = mpsc::channel();

        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, tx.clone(), PipeLine::Stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, tx.clone(), PipeLine::Stderr);
        }
        drop(tx);

        let mut last_error: Option<String> = None;
        let mut last_stderr: Option<String> = None;

        for line in rx.iter() {
            let (text, from_stderr) = match line {
                PipeLine::Stdout(text) => (text, false),
                PipeLine::Stderr(text) => (text, true),
            };

            let report = match parse_line(&text) {
                EngineLine::Progress(progress) => Some(progress),
                EngineLine::Done(path) => {
                    log.debug(&format!("Engine wrote {}", path));
                    let mut done = EngineProgress::new(EngineStatus::Finished).with_percent("100%");
                    done.filename = Some(path);
                    Some(done)
                }
                EngineLine::Text(text) => {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        if from_stderr {
                            last_stderr = Some(trimmed.to_string());
                            if let Some(message) = trimmed.strip_prefix("ERROR:") {
                                last_error = Some(message.trim().to_string());
                            }
                        }
                        log_engine_line(log, trimmed);
                    }
                    None
                }
            };

            if let Some(progress) = report {
                if hook(&progress).is_err() {
                    log.warning("Stopping engine on request");
                    terminate(&mut child, log);
                    remove_partial_artifacts(&request.output_path, log);
                    return Err(EngineError::Aborted);
                }
            }
        }

        let status = child.wait().map_err(|e| EngineError::Failed {
            code: None,
            message: format!("failed while waiting for engine: {}", e),
        })?;

        if status.success() {
            return Ok(());
        }

        let message = last_error
            .or(last_stderr)
            .unwrap_or_else(|| format!("engine exited with {}", status));
        Err(EngineError::Failed {
            code: status.code(),
            message,
        })
    }
}

fn spawn_reader<R, F>(pipe: R, tx: mpsc::Sender<PipeLine>, wrap: F)
where
    R: Read + Send + 'static,
    F: Fn(String) -> PipeLine + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buffer).into_owned();
                    if tx.send(wrap(line)).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn log_engine_line(log: &dyn LogPort, line: &str) {
    if let Some(message) = line.strip_prefix("ERROR:") {
        log.error(message.trim());
    } else if let Some(message) = line.strip_prefix("WARNING:") {
        log.warning(message.trim());
    } else {
        log.debug(line);
    }
}

/// Stop the engine and every process it started.
///
/// The group is interrupted first so yt-dlp can stop its ffmpeg child, then
/// killed outright to take down anything that ignored the interrupt. Returns
/// once the leader is reaped and the group is gone or the grace has passed.
fn terminate(child: &mut Child, log: &dyn LogPort) {
    let pid = child.id();
    if interrupt_tree(pid) {
        match wait_for_exit(child, INTERRUPT_GRACE) {
            Some(status) => log.debug(&format!("Engine stopped with {}", status)),
            None => log.warning("Engine ignored the interrupt, killing it"),
        }
    }

    kill_tree(pid);
    if let Err(e) = child.kill() {
        log.debug(&format!("Engine already exited: {}", e));
    }
    if let Err(e) = child.wait() {
        log.warning(&format!("Failed to reap engine process: {}", e));
    }

    let deadline = Instant::now() + INTERRUPT_GRACE;
    while tree_alive(pid) && Instant::now() < deadline {
        thread::sleep(EXIT_POLL);
    }
}

fn wait_for_exit(child: &mut Child, grace: Duration) -> Option<ExitStatus> {
    let deadline = Instant::now() + grace;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) if Instant::now() < deadline => thread::sleep(EXIT_POLL),
            _ => return None,
        }
    }
}

/// Delete the intermediate files yt-dlp leaves next to an interrupted output:
/// `.part`/`.ytdl` files, per-format downloads like `name.f137.mp4` and
/// `.temp` merge files. The final output itself is left alone.
pub fn remove_partial_artifacts(output_path: &Path, log: &dyn LogPort) -> usize {
    let Some(file_name) = output_path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return 0;
    };
    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.clone());
    let dir = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    let mut removed = 0;
    for entry in WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let name = entry.file_name().to_string_lossy();
        if !is_partial_artifact(&name, &file_name, &stem) {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                log.debug(&format!("Removed partial file {}", entry.path().display()));
                removed += 1;
            }
            Err(e) => log.warning(&format!(
                "Could not remove partial file {}: {}",
                entry.path().display(),
                e
            )),
        }
    }
    removed
}

fn is_partial_artifact(name: &str, file_name: &str, stem: &str) -> bool {
    if name == file_name {
        return false;
    }
    let Some(rest) = name.strip_prefix(stem).and_then(|r| r.strip_prefix('.')) else {
        return false;
    };
    if name.ends_with(".part") || name.ends_with(".ytdl") || name.contains(".part-Frag") {
        return true;
    }
    if rest.starts_with("temp.") {
        return true;
    }
    // per-format download, e.g. `f137.mp4`
    let format_id = rest.split('.').next().unwrap_or_default();
    match format_id.strip_prefix('f') {
        Some(id) => {
            id.starts_with(|c: char| c.is_ascii_digit())
                && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                && rest.len() > format_id.len()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tracing_log::NoopLog;
    use crate::domain::usecases::{ExtractionRequestBuilder, SegmentInput};
    use std::path::PathBuf;

    fn request() -> ExtractionRequest {
        ExtractionRequestBuilder::new()
            .build(&SegmentInput::new(
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                "15:21",
                "30:21",
            ))
            .unwrap()
    }

    fn bare_muxer() -> MuxerLocation {
        MuxerLocation {
            program: PathBuf::from("ffmpeg"),
            version: "ffmpeg version 6.1".to_string(),
            is_path: false,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_build_args_restricts_section() {
        let args = YtDlpEngine::new().build_args(&request(), &bare_muxer());

        assert_eq!(value_after(&args, "--download-sections"), Some("*921-1821"));
        assert!(args.contains(&"--force-keyframes-at-cuts".to_string()));
        assert_eq!(
            value_after(&args, "-f"),
            Some("bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best")
        );
        assert_eq!(value_after(&args, "--merge-output-format"), Some("mp4"));
        assert_eq!(value_after(&args, "--retries"), Some("10"));
        assert_eq!(value_after(&args, "--fragment-retries"), Some("10"));
        assert_eq!(value_after(&args, "-o"), Some("segment_15-21_30-21.mp4"));
        assert!(args.contains(&"--no-overwrites".to_string()));
        assert!(!args.contains(&"--ffmpeg-location".to_string()));
    }

    #[test]
    fn test_source_follows_option_terminator() {
        let args = YtDlpEngine::new().build_args(&request(), &bare_muxer());
        let n = args.len();
        assert_eq!(args[n - 2], "--");
        assert_eq!(args[n - 1], "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_ffmpeg_location_for_resolved_path() {
        let muxer = MuxerLocation {
            program: PathBuf::from("/opt/tools/ffmpeg"),
            version: String::new(),
            is_path: true,
        };
        let args = YtDlpEngine::new().build_args(&request(), &muxer);
        let location = value_after(&args, "--ffmpeg-location");
        assert_eq!(location, Some("/opt/tools/ffmpeg"));
    }

    #[test]
    fn test_with_command_launcher() {
        let engine = YtDlpEngine::with_command(&[
            "python3".to_string(),
            "-m".to_string(),
            "yt_dlp".to_string(),
        ]);
        assert_eq!(engine.program, "python3");
        assert_eq!(engine.leading_args, vec!["-m", "yt_dlp"]);

        let engine = YtDlpEngine::with_command(&[]);
        assert_eq!(engine.program, DEFAULT_PROGRAM);
    }

    #[test]
    fn test_partial_artifact_detection() {
        let file = "segment_0-10_0-20.mp4";
        let stem = "segment_0-10_0-20";
        assert!(is_partial_artifact("segment_0-10_0-20.mp4.part", file, stem));
        assert!(is_partial_artifact("segment_0-10_0-20.mp4.ytdl", file, stem));
        assert!(is_partial_artifact("segment_0-10_0-20.f137.mp4", file, stem));
        assert!(is_partial_artifact("segment_0-10_0-20.f140.m4a.part", file, stem));
        assert!(is_partial_artifact("segment_0-10_0-20.temp.mp4", file, stem));
        assert!(is_partial_artifact("segment_0-10_0-20.mp4.part-Frag3", file, stem));

        assert!(!is_partial_artifact(file, file, stem));
        assert!(!is_partial_artifact("segment_0-10_0-200.mp4.part", file, stem));
        assert!(!is_partial_artifact("other.mp4.part", file, stem));
        assert!(!is_partial_artifact("segment_0-10_0-20.final.mp4", file, stem));
    }

    #[test]
    fn test_remove_partial_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("clip.mp4");
        for name in ["clip.mp4.part", "clip.f137.mp4", "clip.mp4", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let removed = remove_partial_artifacts(&output, &NoopLog);

        assert_eq!(removed, 2);
        assert!(output.exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(!dir.path().join("clip.mp4.part").exists());
    }
}

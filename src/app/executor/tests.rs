use super::*;
use crate::adapters::tracing_log::NoopLog;
use crate::domain::errors::ErrorKind;
use crate::domain::usecases::{ExtractionRequestBuilder, SegmentInput};
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn progress(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::ProgressChanged { percent } => Some(percent),
                _ => None,
            })
            .collect()
    }

    fn last_status(&self) -> Option<(String, Severity)> {
        self.events().into_iter().rev().find_map(|e| match e {
            Event::StatusChanged { text, severity } => Some((text, severity)),
            _ => None,
        })
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

struct FakeMuxer {
    available: bool,
}

impl MuxerPort for FakeMuxer {
    fn locate(&self) -> Result<MuxerLocation, DomainError> {
        if self.available {
            Ok(MuxerLocation {
                program: PathBuf::from("ffmpeg"),
                version: "ffmpeg version test".to_string(),
                is_path: false,
            })
        } else {
            Err(DomainError::DependencyMissing {
                tool: "ffmpeg".to_string(),
                reason: "not found".to_string(),
            })
        }
    }
}

enum Script {
    Succeed,
    Fail(&'static str),
    /// Cancel the flag after the given number of reports
    CancelAfter(usize, CancellationFlag),
    /// Cancel the flag once every report has been delivered, then succeed
    CancelAtEnd(CancellationFlag),
}

struct FakeEngine {
    reports: Vec<EngineProgress>,
    script: Script,
    probe_ok: bool,
}

impl FakeEngine {
    fn new(script: Script) -> Self {
        Self {
            reports: vec![
                EngineProgress::new(EngineStatus::Downloading).with_percent(" 10.0%"),
                EngineProgress {
                    downloaded_bytes: Some(50),
                    total_bytes: Some(100),
                    ..EngineProgress::new(EngineStatus::Downloading)
                },
                EngineProgress::new(EngineStatus::Downloading)
                    .with_percent("\u{1b}[0;94m 99.9%\u{1b}[0m"),
                EngineProgress::new(EngineStatus::Finished),
            ],
            script,
            probe_ok: true,
        }
    }
}

impl EnginePort for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn probe(&self) -> Result<String, DomainError> {
        if self.probe_ok {
            Ok("1.0".to_string())
        } else {
            Err(DomainError::DependencyMissing {
                tool: "fake".to_string(),
                reason: "no such file".to_string(),
            })
        }
    }

    fn extract(
        &self,
        _request: &ExtractionRequest,
        _muxer: &MuxerLocation,
        hook: &mut ProgressHook<'_>,
        log: &dyn LogPort,
    ) -> Result<(), EngineError> {
        log.info("fake engine started");
        for (i, report) in self.reports.iter().enumerate() {
            if let Script::CancelAfter(n, flag) = &self.script {
                if i == *n {
                    flag.cancel();
                }
            }
            if hook(report).is_err() {
                return Err(EngineError::Aborted);
            }
        }
        match &self.script {
            Script::Fail(message) => Err(EngineError::Failed {
                code: Some(1),
                message: message.to_string(),
            }),
            Script::CancelAtEnd(flag) => {
                flag.cancel();
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

struct FakeFs {
    exists: bool,
}

impl FsPort for FakeFs {
    fn file_exists(&self, _path: &Path) -> bool {
        self.exists
    }

    fn file_size(&self, _path: &Path) -> Option<u64> {
        self.exists.then_some(2 * 1024 * 1024)
    }
}

fn request() -> ExtractionRequest {
    ExtractionRequestBuilder::new()
        .build(&SegmentInput::new("https://youtu.be/dQw4w9WgXcQ", "0:10", "0:20"))
        .unwrap()
}

fn executor(engine: FakeEngine, muxer_available: bool, file_exists: bool) -> ExtractionExecutor {
    ExtractionExecutor::new(
        Arc::new(engine),
        Arc::new(FakeMuxer {
            available: muxer_available,
        }),
        Arc::new(FakeFs {
            exists: file_exists,
        }),
        Arc::new(NoopLog),
    )
}

#[test]
fn test_success_reports_progress_and_size() {
    let sink = RecordingSink::default();
    let outcome = executor(FakeEngine::new(Script::Succeed), true, true).execute(
        &request(),
        &CancellationFlag::new(),
        Some(&sink),
    );

    assert!(outcome.success);
    assert_eq!(outcome.error, None);
    assert_eq!(outcome.file_size, Some(2 * 1024 * 1024));
    assert_eq!(outcome.output_path, PathBuf::from("segment_0-10_0-20.mp4"));
    assert_eq!(sink.progress(), vec![0, 10, 50, 99, 100, 100]);
    assert_eq!(
        sink.last_status(),
        Some(("Segment downloaded successfully".to_string(), Severity::Success))
    );
}

#[test]
fn test_engine_logs_are_relayed() {
    let sink = RecordingSink::default();
    executor(FakeEngine::new(Script::Succeed), true, true).execute(
        &request(),
        &CancellationFlag::new(),
        Some(&sink),
    );
    assert!(sink
        .events()
        .contains(&Event::log(LogLevel::Info, "fake engine started")));
}

#[test]
fn test_first_status_is_validation() {
    let sink = RecordingSink::default();
    executor(FakeEngine::new(Script::Succeed), true, true).execute(
        &request(),
        &CancellationFlag::new(),
        Some(&sink),
    );
    assert_eq!(
        sink.events().first(),
        Some(&Event::status("Checking dependencies...", Severity::Info))
    );
}

#[test]
fn test_missing_output_file() {
    let outcome = executor(FakeEngine::new(Script::Succeed), true, false).execute(
        &request(),
        &CancellationFlag::new(),
        None,
    );
    assert!(!outcome.success);
    assert_eq!(outcome.error_kind(), Some(ErrorKind::OutputMissing));
    assert_eq!(outcome.file_size, None);
}

#[test]
fn test_missing_muxer_stops_before_engine() {
    let sink = RecordingSink::default();
    let outcome = executor(FakeEngine::new(Script::Succeed), false, true).execute(
        &request(),
        &CancellationFlag::new(),
        Some(&sink),
    );
    assert_eq!(outcome.error_kind(), Some(ErrorKind::DependencyMissing));
    assert!(sink.progress().is_empty());
    assert_eq!(sink.last_status().map(|(_, s)| s), Some(Severity::Error));
}

#[test]
fn test_missing_engine() {
    let mut engine = FakeEngine::new(Script::Succeed);
    engine.probe_ok = false;
    let outcome = executor(engine, true, true).execute(&request(), &CancellationFlag::new(), None);
    assert_eq!(outcome.error_kind(), Some(ErrorKind::DependencyMissing));
}

#[test]
fn test_engine_failure_message() {
    let outcome = executor(FakeEngine::new(Script::Fail("Video unavailable")), true, true).execute(
        &request(),
        &CancellationFlag::new(),
        None,
    );
    assert_eq!(outcome.error_kind(), Some(ErrorKind::EngineFailure));
    let message = outcome.error.unwrap().message;
    assert!(message.contains("Video unavailable"), "{}", message);
}

#[test]
fn test_cancel_during_running() {
    let cancel = CancellationFlag::new();
    let sink = RecordingSink::default();
    let outcome = executor(FakeEngine::new(Script::CancelAfter(2, cancel.clone())), true, true)
        .execute(&request(), &cancel, Some(&sink));

    assert!(!outcome.success);
    assert!(outcome.is_cancelled());
    assert_eq!(sink.progress(), vec![0, 10, 50]);
    assert_eq!(
        sink.last_status(),
        Some(("Download cancelled".to_string(), Severity::Warning))
    );
}

#[test]
fn test_cancel_seen_after_engine_success_wins() {
    let cancel = CancellationFlag::new();
    let engine = FakeEngine::new(Script::CancelAtEnd(cancel.clone()));
    let outcome = executor(engine, true, true).execute(&request(), &cancel, None);
    assert!(!outcome.success);
    assert!(outcome.is_cancelled());
}

#[test]
fn test_cancel_before_engine_start() {
    let cancel = CancellationFlag::new();
    let mut engine = FakeEngine::new(Script::Succeed);
    engine.reports.clear();
    cancel.cancel();
    let outcome = executor(engine, true, true).execute(&request(), &cancel, None);
    assert!(outcome.is_cancelled());
}

#[test]
fn test_each_stream_is_announced() {
    let stream = |name: &str, percent: &str| EngineProgress {
        filename: Some(name.to_string()),
        ..EngineProgress::new(EngineStatus::Downloading).with_percent(percent)
    };
    let mut engine = FakeEngine::new(Script::Succeed);
    engine.reports = vec![
        stream("clip.f137.mp4", "40%"),
        stream("clip.f137.mp4", "100%"),
        stream("clip.f140.m4a", "5%"),
        stream("clip.f140.m4a", "100%"),
    ];
    let sink = RecordingSink::default();
    executor(engine, true, true).execute(&request(), &CancellationFlag::new(), Some(&sink));

    let announced: Vec<Event> = sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::Log { text, .. } if text.starts_with("Downloading stream")))
        .collect();
    assert_eq!(
        announced,
        vec![
            Event::log(LogLevel::Info, "Downloading stream 1: clip.f137.mp4"),
            Event::log(LogLevel::Info, "Downloading stream 2: clip.f140.m4a"),
        ]
    );
    assert_eq!(sink.progress(), vec![0, 40, 100, 5, 100, 100]);
}

#[test]
fn test_canonical_percent_fallbacks() {
    let finished = EngineProgress::new(EngineStatus::Finished);
    assert_eq!(canonical_percent(&finished), Some(100));

    let unknown = EngineProgress::new(EngineStatus::Downloading);
    assert_eq!(canonical_percent(&unknown), None);

    let garbage = EngineProgress::new(EngineStatus::Downloading).with_percent("N/A");
    assert_eq!(canonical_percent(&garbage), None);
}

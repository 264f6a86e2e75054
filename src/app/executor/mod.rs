// Extraction executor - Drives one extraction attempt through its state machine

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::app::flags::CancellationFlag;
use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::domain::rules::ProgressNormalizer;
use crate::ports::*;

/// Runs an `ExtractionRequest` against the engine and muxer ports
pub struct ExtractionExecutor {
    engine: Arc<dyn EnginePort>,
    muxer: Arc<dyn MuxerPort>,
    fs: Arc<dyn FsPort>,
    log: Arc<dyn LogPort>,
}

impl ExtractionExecutor {
    pub fn new(
        engine: Arc<dyn EnginePort>,
        muxer: Arc<dyn MuxerPort>,
        fs: Arc<dyn FsPort>,
        log: Arc<dyn LogPort>,
    ) -> Self {
        Self {
            engine,
            muxer,
            fs,
            log,
        }
    }

    /// Execute one extraction.
    ///
    /// Blocks until the engine finishes or observes cancellation. Every
    /// failure is folded into the returned outcome; events go to `sink` when
    /// one is given.
    pub fn execute(
        &self,
        request: &ExtractionRequest,
        cancel: &CancellationFlag,
        sink: Option<&dyn EventSink>,
    ) -> ExtractionOutcome {
        let sink = sink.unwrap_or(&NoopSink);
        let mut run = Run::new(request, sink, self.log.as_ref());

        run.transition(ExtractionState::Validating);
        run.status("Checking dependencies...", Severity::Info);

        let muxer = match self.muxer.locate() {
            Ok(muxer) => muxer,
            Err(e) => return run.fail(e),
        };
        run.logger()
            .debug(&format!("Muxer: {} ({})", muxer.program.display(), muxer.version));

        match self.engine.probe() {
            Ok(version) => run
                .logger()
                .debug(&format!("{} version {}", self.engine.name(), version)),
            Err(e) => return run.fail(e),
        }

        run.transition(ExtractionState::Running);
        run.status(format!("Downloading segment {}...", request.range), Severity::Info);
        run.logger().info(&format!(
            "Downloading {} [{} seconds]",
            request.source, request.range.duration()
        ));
        run.logger()
            .info(&format!("Output: {}", request.output_path.display()));

        if cancel.is_cancelled() {
            return run.cancelled();
        }
        sink.emit(Event::progress(0));

        let logger = run.logger();
        // video and audio arrive as separate streams, each counting from 0%
        let mut stream: Option<String> = None;
        let mut streams = 0usize;
        let mut hook = |progress: &EngineProgress| -> Result<(), HookAbort> {
            if cancel.is_cancelled() {
                return Err(HookAbort);
            }
            let downloading = progress.status == EngineStatus::Downloading;
            if let Some(name) = progress.filename.as_ref().filter(|_| downloading) {
                if stream.as_deref() != Some(name.as_str()) {
                    streams += 1;
                    logger.info(&format!("Downloading stream {}: {}", streams, name));
                    stream = Some(name.clone());
                }
            }
            if let Some(percent) = canonical_percent(progress) {
                sink.emit(Event::progress(percent));
            }
            if progress.status == EngineStatus::Finished {
                if let Some(name) = &progress.filename {
                    logger.debug(&format!("Finished {}", name));
                }
            }
            Ok(())
        };
        let result = self.engine.extract(request, &muxer, &mut hook, &logger);

        if cancel.is_cancelled() {
            return run.cancelled();
        }

        match result {
            Ok(()) => self.verify_output(run),
            Err(EngineError::Aborted) => run.cancelled(),
            Err(e) => run.fail(DomainError::EngineFailure {
                message: e.to_string(),
            }),
        }
    }

    fn verify_output(&self, run: Run<'_>) -> ExtractionOutcome {
        let request = run.request;
        let path = request.output_path.as_path();
        if !self.fs.file_exists(path) {
            return run.fail(DomainError::OutputMissing {
                path: path.display().to_string(),
            });
        }
        let size = self.fs.file_size(path);
        run.succeed(size)
    }
}

/// Percent for a progress report: the engine's own string when it parses,
/// else the byte counters, else 100 for a finished report.
fn canonical_percent(progress: &EngineProgress) -> Option<u8> {
    progress
        .percent_text
        .as_deref()
        .and_then(ProgressNormalizer::parse_percent)
        .or_else(|| match (progress.downloaded_bytes, progress.total_bytes) {
            (Some(done), Some(total)) => ProgressNormalizer::from_bytes(done, total),
            _ => None,
        })
        .or_else(|| (progress.status == EngineStatus::Finished).then_some(100))
}

/// Per-attempt bookkeeping: current state plus where events go
struct Run<'a> {
    request: &'a ExtractionRequest,
    state: ExtractionState,
    sink: &'a dyn EventSink,
    log: &'a dyn LogPort,
}

impl<'a> Run<'a> {
    fn new(request: &'a ExtractionRequest, sink: &'a dyn EventSink, log: &'a dyn LogPort) -> Self {
        Self {
            request,
            state: ExtractionState::Idle,
            sink,
            log,
        }
    }

    fn logger(&self) -> RelayLogger<'a> {
        RelayLogger {
            sink: self.sink,
            log: self.log,
        }
    }

    fn transition(&mut self, next: ExtractionState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = ?self.state, to = ?next, "Extraction state change");
        self.state = next;
    }

    fn status(&self, text: impl Into<String>, severity: Severity) {
        self.sink.emit(Event::status(text, severity));
    }

    fn fail(mut self, error: DomainError) -> ExtractionOutcome {
        self.transition(ExtractionState::Failed(error.kind()));
        self.logger().error(&error.to_string());
        self.status(error.to_string(), Severity::Error);
        ExtractionOutcome::failed(&self.request.output_path, &error)
    }

    fn cancelled(mut self) -> ExtractionOutcome {
        self.transition(ExtractionState::Cancelled);
        self.logger().warning("Download cancelled by user");
        self.status("Download cancelled", Severity::Warning);
        ExtractionOutcome::failed(&self.request.output_path, &DomainError::Cancelled)
    }

    fn succeed(mut self, size: Option<u64>) -> ExtractionOutcome {
        self.transition(ExtractionState::Succeeded);
        self.sink.emit(Event::progress(100));
        let path: &Path = &self.request.output_path;
        self.logger()
            .info(&format!("Segment saved to {}", path.display()));
        if size.is_none() {
            warn!("Could not read size of {}", path.display());
        }
        self.status("Segment downloaded successfully", Severity::Success);
        ExtractionOutcome::succeeded(path, size)
    }
}

/// Log port that forwards to the configured logger and mirrors every line
/// into the event stream
#[derive(Clone, Copy)]
struct RelayLogger<'a> {
    sink: &'a dyn EventSink,
    log: &'a dyn LogPort,
}

impl LogPort for RelayLogger<'_> {
    fn debug(&self, message: &str) {
        self.log.debug(message);
        self.sink.emit(Event::log(LogLevel::Debug, message));
    }

    fn info(&self, message: &str) {
        self.log.info(message);
        self.sink.emit(Event::log(LogLevel::Info, message));
    }

    fn warning(&self, message: &str) {
        self.log.warning(message);
        self.sink.emit(Event::log(LogLevel::Warning, message));
    }

    fn error(&self, message: &str) {
        self.log.error(message);
        self.sink.emit(Event::log(LogLevel::Error, message));
    }
}

#[cfg(test)]
mod tests;

// Download session - Owns the worker thread and the flags shared with it

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, info};

use crate::app::consumer::{ConsumerLoop, EventObserver};
use crate::app::executor::ExtractionExecutor;
use crate::app::flags::{CancellationFlag, InFlightFlag};
use crate::app::relay;
use crate::domain::errors::DomainError;
use crate::domain::model::{ExtractionOutcome, ExtractionRequest};
use crate::domain::usecases::{ExtractionRequestBuilder, SegmentInput};
use crate::error::{SegmentError, SegmentResult};

const WORKER_THREAD_NAME: &str = "segment-extraction";

/// Accepts extraction requests one at a time and runs each on its own worker
pub struct DownloadSession {
    executor: Arc<ExtractionExecutor>,
    builder: ExtractionRequestBuilder,
    poll_interval: Duration,
    in_flight: InFlightFlag,
    cancel: CancellationFlag,
}

impl DownloadSession {
    pub fn new(
        executor: Arc<ExtractionExecutor>,
        builder: ExtractionRequestBuilder,
        poll_interval: Duration,
    ) -> Self {
        Self {
            executor,
            builder,
            poll_interval,
            in_flight: InFlightFlag::new(),
            cancel: CancellationFlag::new(),
        }
    }

    /// Handle for requesting cancellation from elsewhere, e.g. a signal handler
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.in_flight.is_active()
    }

    /// Validate `input` and start extracting on a worker thread.
    ///
    /// Fails with `AlreadyRunning` while a previous extraction is in flight,
    /// and with a validation error before any thread is spawned.
    pub fn start(&self, input: &SegmentInput) -> SegmentResult<ActiveExtraction> {
        let guard = self
            .in_flight
            .try_acquire()
            .ok_or(DomainError::AlreadyRunning)?;
        let request = self.builder.build(input)?;

        self.cancel.reset();
        let (sender, receiver) = relay::channel();
        let executor = Arc::clone(&self.executor);
        let cancel = self.cancel.clone();
        let job = request.clone();

        info!(
            "Starting extraction of {} [{}] into {}",
            request.source,
            request.range,
            request.output_path.display()
        );

        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let _guard = guard;
                executor.execute(&job, &cancel, Some(&sender))
            })
            .map_err(SegmentError::WorkerSpawn)?;

        Ok(ActiveExtraction {
            request,
            consumer: ConsumerLoop::new(receiver, self.poll_interval),
            worker,
            cancel: self.cancel.clone(),
        })
    }
}

/// Handle to a running extraction
pub struct ActiveExtraction {
    request: ExtractionRequest,
    consumer: ConsumerLoop,
    worker: JoinHandle<ExtractionOutcome>,
    cancel: CancellationFlag,
}

impl ActiveExtraction {
    pub fn request(&self) -> &ExtractionRequest {
        &self.request
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Apply queued events without waiting
    pub fn poll(&mut self, observer: &mut dyn EventObserver) -> usize {
        self.consumer.poll(observer)
    }

    /// Worker is done and every event has been handed out
    pub fn is_finished(&self) -> bool {
        self.consumer.is_finished() && self.worker.is_finished()
    }

    /// Relay every event to `observer` until the worker ends, then return its
    /// outcome
    pub async fn finish(mut self, observer: &mut dyn EventObserver) -> ExtractionOutcome {
        self.consumer.run(observer).await;
        while !self.worker.is_finished() {
            self.consumer.tick().await;
        }

        match self.worker.join() {
            Ok(outcome) => outcome,
            Err(_) => {
                error!("Extraction worker panicked");
                ExtractionOutcome::failed(
                    &self.request.output_path,
                    &DomainError::EngineFailure {
                        message: "extraction worker panicked".to_string(),
                    },
                )
            }
        }
    }
}

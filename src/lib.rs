//! segment-dl
//!
//! Core of a YouTube segment downloader: time and URL validation, request
//! building, an extraction executor driving yt-dlp with cooperative
//! cancellation, and an event relay that carries progress from the worker
//! thread to whatever is observing it.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{
    ActiveExtraction, CancellationFlag, DefaultAppContainer, DownloadSession, EventObserver,
    ExtractionExecutor, ObservableState,
};
pub use domain::errors::{DomainError, ErrorKind};
pub use domain::model::{
    Event, ExtractionOutcome, ExtractionRequest, SegmentRange, SourceReference, TimeSpec,
};
pub use domain::usecases::{ExtractionRequestBuilder, SegmentInput};
pub use error::{SegmentError, SegmentResult};

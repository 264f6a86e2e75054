// Application layer - Extraction orchestration and event plumbing

pub mod consumer;
pub mod container;
pub mod executor;
pub mod flags;
pub mod relay;
pub mod session;

pub use consumer::{ConsumerLoop, EventObserver, LogEntry, ObservableState};
pub use container::{AppContainer, DefaultAppContainer};
pub use executor::ExtractionExecutor;
pub use flags::{CancellationFlag, InFlightFlag};
pub use relay::{RelayReceiver, RelaySender};
pub use session::{ActiveExtraction, DownloadSession};

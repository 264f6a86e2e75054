use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{AppConfig, FfmpegLocator, StdFsAdapter, TracingLogAdapter, YtDlpEngine};
use crate::app::executor::ExtractionExecutor;
use crate::app::session::DownloadSession;
use crate::domain::usecases::ExtractionRequestBuilder;
use crate::ports::{EnginePort, FsPort, LogPort, MuxerPort};

pub trait AppContainer: Send + Sync {
    fn executor(&self) -> Arc<ExtractionExecutor>;
    fn session(&self) -> Arc<DownloadSession>;
}

pub struct DefaultAppContainer {
    executor: Arc<ExtractionExecutor>,
    session: Arc<DownloadSession>,
}

impl DefaultAppContainer {
    /// Wire the production adapters from configuration
    pub fn from_config(config: &AppConfig) -> Self {
        let engine = Arc::new(YtDlpEngine::with_command(&config.engine.command));
        let muxer = Arc::new(
            FfmpegLocator::new()
                .with_configured_path(config.muxer.path.clone())
                .with_search_paths(config.muxer.search_paths.clone()),
        );
        let fs = Arc::new(StdFsAdapter::new());
        let log = Arc::new(TracingLogAdapter::for_component("executor"));

        Self::with_ports(
            engine as Arc<dyn EnginePort>,
            muxer as Arc<dyn MuxerPort>,
            fs as Arc<dyn FsPort>,
            log as Arc<dyn LogPort>,
            config,
        )
    }

    /// Wire arbitrary port implementations
    pub fn with_ports(
        engine: Arc<dyn EnginePort>,
        muxer: Arc<dyn MuxerPort>,
        fs: Arc<dyn FsPort>,
        log: Arc<dyn LogPort>,
        config: &AppConfig,
    ) -> Self {
        let executor = Arc::new(ExtractionExecutor::new(engine, muxer, fs, log));
        let builder = ExtractionRequestBuilder::new()
            .with_retry_budget(config.engine.retry_budget)
            .with_output_dir(config.session.output_dir.clone())
            .with_overwrite(config.session.overwrite);
        let session = Arc::new(DownloadSession::new(
            Arc::clone(&executor),
            builder,
            Duration::from_millis(config.session.poll_interval_ms),
        ));

        Self { executor, session }
    }
}

impl AppContainer for DefaultAppContainer {
    fn executor(&self) -> Arc<ExtractionExecutor> {
        Arc::clone(&self.executor)
    }

    fn session(&self) -> Arc<DownloadSession> {
        Arc::clone(&self.session)
    }
}

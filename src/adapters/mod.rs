// Adapters - External system implementations

pub mod ffmpeg_locator;
pub mod fs_std;
pub mod toml_config;
pub mod tracing_log;
pub mod ytdlp;

// Re-export adapters
pub use ffmpeg_locator::FfmpegLocator;
pub use fs_std::StdFsAdapter;
pub use toml_config::{AppConfig, ConfigLoader};
pub use tracing_log::{NoopLog, TracingLogAdapter};
pub use ytdlp::YtDlpEngine;

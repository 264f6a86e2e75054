// TOML config adapter - Configuration management using TOML files
//
// Precedence: CLI > Env > File > Defaults. CLI overrides are applied by the
// command layer on top of what `ConfigLoader` returns.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::usecases::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_RETRY_BUDGET};
use crate::error::{SegmentError, SegmentResult};

/// Environment variables recognised by the loader
pub const ENV_ENGINE: &str = "SEGDL_ENGINE";
pub const ENV_FFMPEG: &str = "SEGDL_FFMPEG";
pub const ENV_RETRIES: &str = "SEGDL_RETRIES";
pub const ENV_POLL_MS: &str = "SEGDL_POLL_MS";
pub const ENV_OUTPUT_DIR: &str = "SEGDL_OUTPUT_DIR";
pub const ENV_LOG: &str = "SEGDL_LOG";

const CONFIG_DIR_NAME: &str = "segment-dl";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineSection,
    pub muxer: MuxerSection,
    pub session: SessionSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Launcher command, e.g. `["yt-dlp"]` or `["python3", "-m", "yt_dlp"]`
    pub command: Vec<String>,
    pub retry_budget: u32,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            command: vec!["yt-dlp".to_string()],
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MuxerSection {
    /// Exact ffmpeg binary to use before any search
    pub path: Option<PathBuf>,
    /// Additional locations probed ahead of the built-in ones
    pub search_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub poll_interval_ms: u64,
    /// Directory for default-named outputs
    pub output_dir: Option<PathBuf>,
    /// Replace an existing output file instead of keeping it
    pub overwrite: bool,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            output_dir: None,
            overwrite: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

/// Loads `AppConfig` from defaults, a TOML file and the environment
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the per-user config file is
    /// used when present.
    pub fn load(explicit: Option<&Path>) -> SegmentResult<AppConfig> {
        let mut config = match explicit {
            Some(path) => Self::load_file(path)?,
            None => match Self::default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::load_file(&path)?,
                None => {
                    debug!("No configuration file found, using defaults");
                    AppConfig::default()
                }
            },
        };

        Self::apply_env(&mut config, |key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a configuration file
    pub fn load_file(path: &Path) -> SegmentResult<AppConfig> {
        if !path.is_file() {
            return Err(SegmentError::ConfigError {
                message: format!("configuration file not found: {}", path.display()),
            });
        }
        info!("Loading configuration from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> SegmentResult<AppConfig> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env<F>(config: &mut AppConfig, lookup: F) -> SegmentResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut overrides = 0;

        if let Some(value) = lookup(ENV_ENGINE) {
            let command: Vec<String> = value.split_whitespace().map(str::to_string).collect();
            if !command.is_empty() {
                config.engine.command = command;
                overrides += 1;
            }
        }
        if let Some(value) = lookup(ENV_FFMPEG) {
            config.muxer.path = Some(PathBuf::from(value));
            overrides += 1;
        }
        if let Some(value) = lookup(ENV_RETRIES) {
            config.engine.retry_budget = parse_env_number(ENV_RETRIES, &value)?;
            overrides += 1;
        }
        if let Some(value) = lookup(ENV_POLL_MS) {
            config.session.poll_interval_ms = parse_env_number(ENV_POLL_MS, &value)?;
            overrides += 1;
        }
        if let Some(value) = lookup(ENV_OUTPUT_DIR) {
            config.session.output_dir = Some(PathBuf::from(value));
            overrides += 1;
        }
        if let Some(value) = lookup(ENV_LOG) {
            config.logging.level = value;
            overrides += 1;
        }

        if overrides > 0 {
            debug!("Applied {} environment variable overrides", overrides);
        }
        Ok(())
    }

    /// Per-user configuration file location
    pub fn default_config_path() -> Option<PathBuf> {
        let base = if cfg!(windows) {
            std::env::var_os("APPDATA").map(PathBuf::from)
        } else {
            std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from).or_else(|| {
                std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
            })
        };
        base.map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }
}

fn parse_env_number<T: std::str::FromStr>(key: &str, value: &str) -> SegmentResult<T> {
    value.trim().parse().map_err(|_| SegmentError::ConfigError {
        message: format!("{} must be a non-negative integer, got '{}'", key, value),
    })
}

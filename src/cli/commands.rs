//! Command implementations

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::adapters::{AppConfig, ConfigLoader};
use crate::app::{AppContainer, CancellationFlag, DefaultAppContainer};
use crate::cli::reporter::{ReportMode, TerminalReporter};
use crate::cli::Cli;
use crate::error::SegmentError;
use crate::utils::logging::{init_logging, LogFormat};

/// Run the CLI to completion and map the result to a process exit code
pub async fn run(cli: Cli) -> ExitCode {
    match execute(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load configuration with command-line flags applied on top
pub fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config =
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_cli_overrides(&mut config, cli);
    Ok(config)
}

fn apply_cli_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(retries) = cli.retries {
        config.engine.retry_budget = retries;
    }
    if let Some(ffmpeg) = &cli.ffmpeg {
        config.muxer.path = Some(ffmpeg.clone());
    }
    if cli.overwrite {
        config.session.overwrite = true;
    }
}

fn report_mode(cli: &Cli) -> ReportMode {
    if cli.json {
        ReportMode::Json
    } else if cli.quiet {
        ReportMode::Quiet
    } else {
        ReportMode::Human
    }
}

/// Returns whether the extraction succeeded
async fn execute(cli: Cli) -> Result<bool> {
    let config = resolve_config(&cli)?;
    init_logging(&config.logging.level, LogFormat::from_json_flag(config.logging.json));
    debug!("Effective configuration: {:?}", config);

    let mode = report_mode(&cli);
    let out: Box<dyn Write> = match mode {
        ReportMode::Json => Box::new(io::stdout()),
        _ => Box::new(io::stderr()),
    };
    let mut reporter = TerminalReporter::new(mode, out);

    let container = DefaultAppContainer::from_config(&config);
    let session = container.session();
    let input = cli.segment.to_input();

    let active = match session.start(&input) {
        Ok(active) => active,
        Err(SegmentError::Domain(e)) => {
            reporter.report_error(&e.to_string());
            return Ok(false);
        }
        Err(e) => return Err(e).context("Failed to start extraction"),
    };

    info!(
        "Extracting {} from {}",
        active.request().range,
        active.request().source
    );
    let ctrl_c = spawn_ctrl_c_handler(session.cancellation());

    let request = active.request().clone();
    let outcome = active.finish(&mut reporter).await;
    ctrl_c.abort();

    reporter.report_outcome(&request, &outcome);
    Ok(outcome.success)
}

fn spawn_ctrl_c_handler(cancel: CancellationFlag) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupt received, cancelling extraction");
                cancel.cancel();
            }
            Err(e) => debug!("Ctrl-C handler unavailable: {}", e),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("yt-segment").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_overrides() {
        let cli = parse(&[
            "https://youtu.be/dQw4w9WgXcQ",
            "0:10",
            "0:20",
            "--retries",
            "3",
            "--ffmpeg",
            "/opt/ffmpeg",
            "--overwrite",
            "--log-level",
            "debug",
        ]);
        let mut config = AppConfig::default();
        apply_cli_overrides(&mut config, &cli);

        assert_eq!(config.engine.retry_budget, 3);
        assert_eq!(config.muxer.path, Some(PathBuf::from("/opt/ffmpeg")));
        assert!(config.session.overwrite);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_positional_output() {
        let cli = parse(&["https://youtu.be/dQw4w9WgXcQ", "0:10", "0:20", "clip"]);
        let input = cli.segment.to_input();
        assert_eq!(input.output, Some(PathBuf::from("clip")));
        assert_eq!(report_mode(&cli), ReportMode::Human);
    }

    #[test]
    fn test_report_mode_flags() {
        assert_eq!(
            report_mode(&parse(&["u", "0:01", "0:02", "--json"])),
            ReportMode::Json
        );
        assert_eq!(
            report_mode(&parse(&["u", "0:01", "0:02", "-q"])),
            ReportMode::Quiet
        );
        assert!(Cli::try_parse_from(["yt-segment", "u", "0:01", "0:02", "-q", "--json"]).is_err());
    }
}

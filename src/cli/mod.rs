//! CLI module for yt-segment
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::Parser;

pub mod args;
pub mod commands;
pub mod reporter;

/// Download a time range of a YouTube video as an MP4 file
#[derive(Parser, Debug)]
#[command(name = "yt-segment")]
#[command(about = "Download only a segment of a YouTube video")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub segment: args::SegmentArgs,

    /// Configuration file (default: per-user config dir)
    #[arg(long, env = "SEGDL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level or tracing filter directive
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print events and the final outcome as JSON lines on stdout
    #[arg(long)]
    pub json: bool,

    /// Only print the final result
    #[arg(short, long, conflicts_with = "json")]
    pub quiet: bool,

    /// Retry budget for network and fragment retries
    #[arg(long)]
    pub retries: Option<u32>,

    /// Path to the ffmpeg binary
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,

    /// Replace the output file if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

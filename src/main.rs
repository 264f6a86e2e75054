//! yt-segment
//!
//! Downloads a single time range of a YouTube video as an MP4 file, using
//! yt-dlp restricted to the requested section and ffmpeg for keyframe-exact
//! cuts.
//!
//! # Usage
//!
//! ```bash
//! yt-segment "https://www.youtube.com/watch?v=dQw4w9WgXcQ" 0:30 1:45
//! yt-segment "https://youtu.be/dQw4w9WgXcQ" 1:02:00 1:03:30 talk.mp4 --overwrite
//! ```

use std::process::ExitCode;

use clap::Parser;

use segment_dl::cli::{commands, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    commands::run(cli).await
}

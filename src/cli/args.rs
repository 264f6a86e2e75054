//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::domain::usecases::SegmentInput;

/// Positional arguments describing the segment
#[derive(Args, Debug)]
pub struct SegmentArgs {
    /// YouTube video URL
    pub source: String,

    /// Start time (MM:SS or HH:MM:SS)
    pub start: String,

    /// End time (MM:SS or HH:MM:SS)
    pub end: String,

    /// Output file path (default: segment_<start>_<end>.mp4)
    pub output: Option<PathBuf>,
}

impl SegmentArgs {
    pub fn to_input(&self) -> SegmentInput {
        let input = SegmentInput::new(self.source.as_str(), self.start.as_str(), self.end.as_str());
        match &self.output {
            Some(output) => input.with_output(output.clone()),
            None => input,
        }
    }
}

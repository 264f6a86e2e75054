//! Parsing of yt-dlp output lines produced by our progress and print templates

use crate::ports::{EngineProgress, EngineStatus};

/// Marker for lines written by `--progress-template`
pub const PROGRESS_PREFIX: &str = "SEGDL_PROGRESS|";

/// Marker for the line written by `--print after_move:`
pub const DONE_PREFIX: &str = "SEGDL_DONE|";

/// Progress template; fields are status, percent, downloaded, total,
/// total estimate and filename. Filename stays last since it may contain `|`.
pub const PROGRESS_TEMPLATE: &str = concat!(
    "download:SEGDL_PROGRESS",
    "|%(progress.status)s",
    "|%(progress._percent_str)s",
    "|%(progress.downloaded_bytes)s",
    "|%(progress.total_bytes)s",
    "|%(progress.total_bytes_estimate)s",
    "|%(progress.filename)s",
);

/// Print template emitted once the final file is in place
pub const DONE_TEMPLATE: &str = "after_move:SEGDL_DONE|%(filepath)s";

/// Classified output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLine {
    Progress(EngineProgress),
    Done(String),
    Text(String),
}

/// Classify one line of engine output
pub fn parse_line(line: &str) -> EngineLine {
    let line = line.trim_end_matches(['\r', '\n']);

    if let Some(rest) = line.strip_prefix(PROGRESS_PREFIX) {
        return EngineLine::Progress(parse_progress_fields(rest));
    }
    if let Some(path) = line.strip_prefix(DONE_PREFIX) {
        return EngineLine::Done(path.trim().to_string());
    }
    EngineLine::Text(line.to_string())
}

fn parse_progress_fields(rest: &str) -> EngineProgress {
    let mut fields = rest.splitn(6, '|');
    let status = EngineStatus::parse(fields.next().unwrap_or_default());
    let percent_text = fields.next().and_then(non_empty);
    let downloaded_bytes = fields.next().and_then(parse_bytes);
    let total_bytes = fields.next().and_then(parse_bytes);
    let total_estimate = fields.next().and_then(parse_bytes);
    let filename = fields.next().and_then(non_empty);

    EngineProgress {
        status,
        percent_text,
        downloaded_bytes,
        total_bytes: total_bytes.or(total_estimate),
        filename,
    }
}

fn non_empty(field: &str) -> Option<String> {
    let trimmed = field.trim();
    if trimmed.is_empty() || trimmed == "NA" || trimmed == "None" {
        None
    } else {
        Some(field.to_string())
    }
}

// yt-dlp prints estimates as floats
fn parse_bytes(field: &str) -> Option<u64> {
    let value: f64 = field.trim().parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value as u64)
    } else {
        None
    }
}

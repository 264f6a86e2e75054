// Domain rules - Source grammar, output naming and progress normalisation

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::model::{FormatPolicy, SegmentRange};

static SOURCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/)([\w-]+)")
        .expect("source pattern is valid")
});

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("ansi pattern is valid"));

/// Accepted source URL shapes.
///
/// Only `youtube.com/watch?v=` and `youtu.be/` are recognised, with an
/// optional `http(s)://` scheme and `www.` prefix. The match is anchored at
/// the start only, so trailing query parameters are tolerated.
pub struct SourceGrammar;

impl SourceGrammar {
    /// Identifier token of a matching source, `None` for anything else
    pub fn video_id(raw: &str) -> Option<&str> {
        SOURCE_PATTERN
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Output file naming rules
pub struct OutputNaming;

impl OutputNaming {
    /// `segment_<start>_<end>.<container>` with colons turned into hyphens
    pub fn default_file_name(range: &SegmentRange, policy: FormatPolicy) -> String {
        format!(
            "segment_{}_{}.{}",
            range.start.as_str().replace(':', "-"),
            range.end.as_str().replace(':', "-"),
            policy.container()
        )
    }

    /// Append the container extension when an explicit path has none
    pub fn with_container_extension(path: &Path, policy: FormatPolicy) -> PathBuf {
        if path.extension().is_some() {
            path.to_path_buf()
        } else {
            path.with_extension(policy.container())
        }
    }
}

/// Engine percent strings to the canonical 0..=100 scale
pub struct ProgressNormalizer;

impl ProgressNormalizer {
    /// Parse strings like `" 42.7%"`, possibly wrapped in ANSI colour codes.
    /// Truncates toward zero and clamps to 100.
    pub fn parse_percent(raw: &str) -> Option<u8> {
        let cleaned = ANSI_ESCAPE.replace_all(raw, "");
        let number = cleaned.trim().trim_end_matches('%').trim();
        let value: f64 = number.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Some(value.min(100.0) as u8)
    }

    /// Percentage from byte counters when the engine has no percent string
    pub fn from_bytes(downloaded: u64, total: u64) -> Option<u8> {
        if total == 0 {
            return None;
        }
        let ratio = downloaded as f64 / total as f64 * 100.0;
        Some(ratio.min(100.0) as u8)
    }
}

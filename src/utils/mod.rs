//! Common utilities and helpers

pub mod logging;
pub mod process;

/// Formatting helpers for user-facing output
pub struct Utils;

impl Utils {
    /// Size in mebibytes with two decimals, e.g. `"12.50 MB"`
    pub fn format_megabytes(size: u64) -> String {
        format!("{:.2} MB", size as f64 / (1024.0 * 1024.0))
    }

    /// Seconds as `H:MM:SS`, or `M:SS` below an hour
    pub fn format_seconds(total: u64) -> String {
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;
        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{}:{:02}", minutes, seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_megabytes() {
        assert_eq!(Utils::format_megabytes(13_107_200), "12.50 MB");
        assert_eq!(Utils::format_megabytes(0), "0.00 MB");
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(Utils::format_seconds(900), "15:00");
        assert_eq!(Utils::format_seconds(4530), "1:15:30");
        assert_eq!(Utils::format_seconds(7), "0:07");
    }
}

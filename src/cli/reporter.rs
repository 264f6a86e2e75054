//! Terminal rendering of relayed events and the final outcome

use std::io::Write;

use serde::Serialize;

use crate::app::consumer::{EventObserver, ObservableState};
use crate::domain::model::{Event, ExtractionOutcome, ExtractionRequest, LogLevel, Severity};
use crate::utils::Utils;

const BAR_WIDTH: usize = 30;

/// How events are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Status lines, a progress bar and info-or-higher log lines
    Human,
    /// Final result only
    Quiet,
    /// One JSON object per event plus a final `outcome` object
    Json,
}

#[derive(Serialize)]
struct OutcomeLine<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    outcome: &'a ExtractionOutcome,
}

/// Event observer that writes to a terminal stream
pub struct TerminalReporter<W: Write> {
    mode: ReportMode,
    out: W,
    state: ObservableState,
    bar_open: bool,
    last_percent: u8,
}

impl<W: Write> TerminalReporter<W> {
    pub fn new(mode: ReportMode, out: W) -> Self {
        Self {
            mode,
            out,
            state: ObservableState::new(),
            bar_open: false,
            last_percent: 0,
        }
    }

    pub fn state(&self) -> &ObservableState {
        &self.state
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print a request-level error that prevented the extraction from starting
    pub fn report_error(&mut self, message: &str) {
        match self.mode {
            ReportMode::Json => {
                let line = serde_json::json!({ "type": "error", "message": message });
                self.line(&line.to_string());
            }
            _ => self.line(&format!("Error: {}", message)),
        }
    }

    /// Print the final summary
    pub fn report_outcome(&mut self, request: &ExtractionRequest, outcome: &ExtractionOutcome) {
        self.close_bar();

        if self.mode == ReportMode::Json {
            let line = OutcomeLine {
                kind: "outcome",
                outcome,
            };
            match serde_json::to_string(&line) {
                Ok(json) => self.line(&json),
                Err(e) => self.line(&format!("{{\"type\":\"error\",\"message\":\"{}\"}}", e)),
            }
            return;
        }

        if outcome.success {
            self.line(&format!("Segment saved: {}", outcome.output_path.display()));
            self.line(&format!(
                "Duration: {} ({} -> {})",
                Utils::format_seconds(request.range.duration()),
                request.range.start,
                request.range.end
            ));
            if let Some(size) = outcome.file_size {
                self.line(&format!("Size: {}", Utils::format_megabytes(size)));
            }
        } else if outcome.is_cancelled() {
            self.line("Download cancelled");
        } else if let Some(error) = &outcome.error {
            self.line(&format!("Error: {}", error.message));
        }
    }

    fn render(&mut self, event: &Event) {
        match (self.mode, event) {
            (ReportMode::Json, event) => match serde_json::to_string(event) {
                Ok(json) => self.line(&json),
                Err(e) => self.line(&format!("{{\"type\":\"error\",\"message\":\"{}\"}}", e)),
            },
            (ReportMode::Quiet, _) => {}
            (ReportMode::Human, Event::ProgressChanged { percent }) => self.draw_bar(*percent),
            (ReportMode::Human, Event::StatusChanged { text, severity }) => {
                let prefix = match severity {
                    Severity::Info => "",
                    Severity::Success => "Done: ",
                    Severity::Warning => "Warning: ",
                    Severity::Error => "Failed: ",
                };
                self.line(&format!("{}{}", prefix, text));
            }
            (ReportMode::Human, Event::Log { level, text }) => {
                if *level >= LogLevel::Info {
                    let stamp = self
                        .state
                        .logs
                        .last()
                        .map(|entry| entry.at.format("%H:%M:%S").to_string())
                        .unwrap_or_default();
                    self.line(&format!("[{}] {}", stamp, text));
                }
            }
        }
    }

    /// Redraw the bar in place. A drop in percent means the engine moved on
    /// to the next stream, which gets a bar of its own.
    fn draw_bar(&mut self, percent: u8) {
        if percent < self.last_percent {
            self.close_bar();
        }
        self.last_percent = percent;
        let filled = BAR_WIDTH * percent as usize / 100;
        let bar = format!(
            "\r[{}{}] {:>3}%",
            "#".repeat(filled),
            "-".repeat(BAR_WIDTH - filled),
            percent
        );
        let _ = self.out.write_all(bar.as_bytes());
        let _ = self.out.flush();
        self.bar_open = true;
    }

    fn close_bar(&mut self) {
        if self.bar_open {
            let _ = self.out.write_all(b"\n");
            self.bar_open = false;
        }
    }

    fn line(&mut self, text: &str) {
        self.close_bar();
        let _ = writeln!(self.out, "{}", text);
    }
}

impl<W: Write> EventObserver for TerminalReporter<W> {
    fn apply(&mut self, event: &Event) {
        self.state.apply(event);
        self.render(event);
    }
}

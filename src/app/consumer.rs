// Consumer loop - Applies relayed events to observer state on a timer

use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::time::{self, Interval, MissedTickBehavior};

use crate::app::relay::RelayReceiver;
use crate::domain::model::{Event, LogLevel, Severity};

/// Receives events in relay order on the consumer's thread
pub trait EventObserver {
    fn apply(&mut self, event: &Event);
}

impl<F: FnMut(&Event)> EventObserver for F {
    fn apply(&mut self, event: &Event) {
        self(event)
    }
}

/// Timestamped log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub level: LogLevel,
    pub text: String,
}

/// UI-facing view of an extraction, updated only from relayed events
#[derive(Debug, Clone, Default)]
pub struct ObservableState {
    pub status: String,
    pub severity: Severity,
    pub progress: u8,
    pub logs: Vec<LogEntry>,
    pub applied: u64,
}

impl ObservableState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log history formatted as `[HH:MM:SS] text`
    pub fn log_lines(&self) -> Vec<String> {
        self.logs
            .iter()
            .map(|entry| format!("[{}] {}", entry.at.format("%H:%M:%S"), entry.text))
            .collect()
    }
}

impl EventObserver for ObservableState {
    fn apply(&mut self, event: &Event) {
        match event {
            Event::Log { level, text } => self.logs.push(LogEntry {
                at: Local::now(),
                level: *level,
                text: text.clone(),
            }),
            Event::StatusChanged { text, severity } => {
                self.status = text.clone();
                self.severity = *severity;
            }
            Event::ProgressChanged { percent } => self.progress = *percent,
        }
        self.applied += 1;
    }
}

/// Periodically drains a relay into an observer.
///
/// `poll` can be driven from any external timer; `run` reschedules itself on
/// the tokio clock until every producer is gone.
#[derive(Debug)]
pub struct ConsumerLoop {
    receiver: RelayReceiver,
    interval: Duration,
    ticker: Option<Interval>,
}

impl ConsumerLoop {
    pub fn new(receiver: RelayReceiver, interval: Duration) -> Self {
        Self {
            receiver,
            interval,
            ticker: None,
        }
    }

    /// Apply everything queued right now, in order
    pub fn poll(&mut self, observer: &mut dyn EventObserver) -> usize {
        self.receiver.drain_with(|event| observer.apply(&event))
    }

    /// No producer is left and nothing is queued
    pub fn is_finished(&self) -> bool {
        self.receiver.is_closed()
    }

    /// Wait one poll interval; a zero interval only yields
    pub async fn tick(&mut self) {
        if self.interval.is_zero() {
            tokio::task::yield_now().await;
            return;
        }
        let interval = self.interval;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        ticker.tick().await;
    }

    /// Drain until the relay closes. Returns the number of events applied.
    pub async fn run(&mut self, observer: &mut dyn EventObserver) -> u64 {
        let mut applied = 0u64;
        loop {
            applied += self.poll(observer) as u64;
            if self.is_finished() {
                return applied;
            }
            self.tick().await;
        }
    }
}

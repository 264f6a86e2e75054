// Event relay - Unbounded FIFO between the extraction worker and its observer

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::trace;

use crate::domain::model::Event;
use crate::ports::EventSink;

/// Create a connected sender/receiver pair
pub fn channel() -> (RelaySender, RelayReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        RelaySender { tx },
        RelayReceiver {
            rx,
            closed: false,
        },
    )
}

/// Producer half; cheap to clone, never blocks
#[derive(Debug, Clone)]
pub struct RelaySender {
    tx: UnboundedSender<Event>,
}

impl EventSink for RelaySender {
    fn emit(&self, event: Event) {
        if self.tx.send(event).is_err() {
            trace!("Relay consumer dropped, event discarded");
        }
    }
}

/// Consumer half
#[derive(Debug)]
pub struct RelayReceiver {
    rx: UnboundedReceiver<Event>,
    closed: bool,
}

impl RelayReceiver {
    /// Hand every currently queued event to `apply`, oldest first, without
    /// waiting for new ones. Returns how many were handed over.
    pub fn drain_with<F: FnMut(Event)>(&mut self, mut apply: F) -> usize {
        let mut count = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    apply(event);
                    count += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        count
    }

    /// Collect every currently queued event
    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        self.drain_with(|event| events.push(event));
        events
    }

    /// Every sender is gone and the queue has been emptied
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{LogLevel, Severity};
    use std::thread;

    #[test]
    fn test_drain_preserves_order() {
        let (tx, mut rx) = channel();
        tx.emit(Event::status("start", Severity::Info));
        tx.emit(Event::progress(10));
        tx.emit(Event::log(LogLevel::Info, "hello"));

        assert_eq!(
            rx.drain(),
            vec![
                Event::status("start", Severity::Info),
                Event::progress(10),
                Event::log(LogLevel::Info, "hello"),
            ]
        );
        assert!(rx.drain().is_empty());
        assert!(!rx.is_closed());
    }

    #[test]
    fn test_closed_only_after_queue_emptied() {
        let (tx, mut rx) = channel();
        tx.emit(Event::progress(1));
        drop(tx);

        let mut seen = Vec::new();
        rx.drain_with(|e| seen.push(e));
        assert_eq!(seen, vec![Event::progress(1)]);
        assert!(rx.is_closed());
    }

    #[test]
    fn test_cross_thread_producer() {
        let (tx, mut rx) = channel();
        let producer = thread::spawn(move || {
            for i in 0..=100u8 {
                tx.emit(Event::progress(i));
            }
        });
        producer.join().unwrap();

        let percents: Vec<u8> = rx
            .drain()
            .into_iter()
            .map(|e| match e {
                Event::ProgressChanged { percent } => percent,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(percents, (0..=100).collect::<Vec<u8>>());
        rx.drain();
        assert!(rx.is_closed());
    }

    #[test]
    fn test_emit_after_consumer_dropped() {
        let (tx, rx) = channel();
        drop(rx);
        tx.emit(Event::progress(5));
    }
}

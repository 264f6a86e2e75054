// Session-owned atomic flags shared with the worker thread

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation request.
///
/// Setting it is advisory: the executor only looks at it when the engine
/// reports progress, so cancellation latency is bounded by the interval
/// between progress callbacks.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    inner: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.inner.store(false, Ordering::SeqCst);
    }
}

/// At most one extraction per session
#[derive(Debug, Clone, Default)]
pub struct InFlightFlag {
    inner: Arc<AtomicBool>,
}

impl InFlightFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag; `None` when an extraction is already running
    pub fn try_acquire(&self) -> Option<InFlightGuard> {
        self.inner
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                inner: Arc::clone(&self.inner),
            })
    }

    pub fn is_active(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }
}

/// Releases the in-flight flag when dropped, including during unwinding
#[derive(Debug)]
pub struct InFlightGuard {
    inner: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_cancellation_flag_shared() {
        let flag = CancellationFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_cancelled());
        clone.cancel();
        assert!(flag.is_cancelled());
        flag.reset();
        assert!(!clone.is_cancelled());
    }

    #[test]
    fn test_in_flight_single_holder() {
        let flag = InFlightFlag::new();
        let guard = flag.try_acquire().unwrap();
        assert!(flag.is_active());
        assert!(flag.try_acquire().is_none());
        drop(guard);
        assert!(!flag.is_active());
        assert!(flag.try_acquire().is_some());
    }

    #[test]
    fn test_in_flight_contended() {
        let flag = InFlightFlag::new();
        let winners: usize = (0..8)
            .map(|_| {
                let flag = flag.clone();
                thread::spawn(move || flag.try_acquire().map(std::mem::forget).is_some())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(winners, 1);
    }
}

//! Shared monotonic transport clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// The single timing authority for the whole instrument.
///
/// Every component reads the clock; nothing but the owner ever resets it.
/// Components that depend on the transport staying live (recorder, playback)
/// register as consumers, so stopping one never disturbs another that is
/// still active.
#[derive(Debug)]
pub struct Transport {
    epoch: Instant,
    consumers: AtomicUsize,
}

impl Transport {
    /// Create a transport with its zero at the current instant.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            consumers: AtomicUsize::new(0),
        }
    }

    /// Seconds elapsed since the transport's zero. Monotonic.
    pub fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Register an active consumer, returning the new count.
    pub fn retain(&self) -> usize {
        self.consumers.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Deregister a consumer, returning how many remain.
    pub fn release(&self) -> usize {
        let prev = self.consumers.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(prev > 0, "transport release without matching retain");
        prev - 1
    }

    /// Number of currently-registered consumers.
    pub fn active_consumers(&self) -> usize {
        self.consumers.load(Ordering::Relaxed)
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn clock_is_monotonic() {
        let transport = Transport::new();
        let a = transport.now();
        thread::sleep(Duration::from_millis(5));
        let b = transport.now();
        assert!(b > a);
    }

    #[test]
    fn consumer_refcount() {
        let transport = Transport::new();
        assert_eq!(transport.active_consumers(), 0);
        assert_eq!(transport.retain(), 1);
        assert_eq!(transport.retain(), 2);
        assert_eq!(transport.release(), 1);
        assert_eq!(transport.active_consumers(), 1);
        assert_eq!(transport.release(), 0);
    }
}

//! Event debouncing for scroll and resize handling

use std::time::Duration;
use tokio::time::Instant;

/// Coalesces bursts of events into at most one accepted event per interval.
///
/// The first event in a burst is accepted immediately; further events are
/// dropped until the interval has elapsed.
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    /// Create a debouncer with the given interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_accepted: None,
        }
    }

    /// Report an event; returns true when the event should be handled
    pub fn accept(&mut self) -> bool {
        let now = Instant::now();
        match self.last_accepted {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_accepted = Some(now);
                true
            }
        }
    }

    /// Forget the last accepted event
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }

    /// The configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

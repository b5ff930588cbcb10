//! Minimum intervals between consecutive starts and stops.

use std::time::Duration;

use tokio::time::Instant;

/// Last start/stop instants and the windows that must elapse after them.
#[derive(Debug, Clone)]
pub struct CooldownWindows {
    start_window: Duration,
    stop_window: Duration,
    last_start: Option<Instant>,
    last_stop: Option<Instant>,
}

impl CooldownWindows {
    pub fn new(start_window: Duration, stop_window: Duration) -> Self {
        Self {
            start_window,
            stop_window,
            last_start: None,
            last_stop: None,
        }
    }

    /// Time left before another start is allowed, `None` when allowed.
    pub fn start_remaining(&self, now: Instant) -> Option<Duration> {
        Self::remaining(self.last_start, self.start_window, now)
    }

    /// Time left before another stop (or a start after a stop) is allowed.
    pub fn stop_remaining(&self, now: Instant) -> Option<Duration> {
        Self::remaining(self.last_stop, self.stop_window, now)
    }

    pub fn record_start(&mut self, now: Instant) {
        self.last_start = Some(now);
    }

    pub fn record_stop(&mut self, now: Instant) {
        self.last_stop = Some(now);
    }

    pub fn last_start(&self) -> Option<Instant> {
        self.last_start
    }

    pub fn last_stop(&self) -> Option<Instant> {
        self.last_stop
    }

    fn remaining(last: Option<Instant>, window: Duration, now: Instant) -> Option<Duration> {
        let elapsed = now.saturating_duration_since(last?);
        if elapsed < window {
            Some(window - elapsed)
        } else {
            None
        }
    }
}

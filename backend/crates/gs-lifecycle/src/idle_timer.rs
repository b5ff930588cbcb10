use std::time::Duration;

use tokio::time::Instant;

/// Debounce timer for continuous zero occupancy.
///
/// `active` implies `triggered_at` is set. `remaining` is only meaningful
/// while active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdleTimer {
    pub triggered_at: Option<Instant>,
    pub active: bool,
    pub remaining: Option<Duration>,
}

impl IdleTimer {
    /// Start timing at `now` unless already running; returns the trigger instant.
    pub fn activate(&mut self, now: Instant) -> Instant {
        match self.triggered_at {
            Some(triggered_at) if self.active => triggered_at,
            _ => {
                self.active = true;
                self.triggered_at = Some(now);
                self.remaining = None;
                now
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

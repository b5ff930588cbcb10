//! Debounced idle shutdown.

use crate::{IdleTimer, LifecycleController, ShutdownGuard, StopOutcome};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use gs_config::IdleConfig;
use humantime::format_duration;
use log::{debug, error, info, warn};
use tokio::time::{Instant, MissedTickBehavior};

/// Delay passed along with an idle stop request.
const IDLE_STOP_DELAY_SECS: f64 = 1.0;

/// What a single idle check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another tick was still running.
    Busy,
    NotRunning,
    StopEventInProgress,
    QueryFailed,
    Occupied(usize),
    Idle { remaining: Duration },
    StopRequested(StopOutcome),
}

pub struct IdleMonitor {
    controller: Arc<LifecycleController>,
    threshold: Duration,
    interval: Duration,
    timer: Mutex<IdleTimer>,
    tick_guard: tokio::sync::Mutex<()>,
}

impl IdleMonitor {
    pub fn new(controller: Arc<LifecycleController>, threshold: Duration, interval: Duration) -> Self {
        Self {
            controller,
            threshold,
            interval,
            timer: Mutex::new(IdleTimer::default()),
            tick_guard: tokio::sync::Mutex::new(()),
        }
    }

    pub fn from_config(controller: Arc<LifecycleController>, config: &IdleConfig) -> Self {
        Self::new(controller, config.threshold(), config.check_interval())
    }

    /// Copy of the current timer.
    pub fn idle_timer(&self) -> IdleTimer {
        *self.lock_timer()
    }

    /// Threshold minus the time since the server was first seen empty, while
    /// the timer is running. The stop itself is requested one check interval
    /// earlier, once the empty time plus the interval reaches the threshold.
    pub fn remaining(&self) -> Option<Duration> {
        let timer = self.lock_timer();
        if timer.active { timer.remaining } else { None }
    }

    /// One idle check. Overlapping calls return [`TickOutcome::Busy`].
    pub async fn tick(&self) -> TickOutcome {
        let Ok(_running) = self.tick_guard.try_lock() else {
            debug!("Idle check still in progress, skipping tick");
            return TickOutcome::Busy;
        };

        if !self.controller.is_process_running().await {
            self.lock_timer().clear();
            self.controller.reconcile_not_running();
            return TickOutcome::NotRunning;
        }

        if self.controller.is_stop_event_running() {
            info!("Stop event is running, idle check skipped");
            return TickOutcome::StopEventInProgress;
        }

        let snapshot = match self.controller.refresh_server_info().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                if e.is_transient() {
                    warn!("Failed to retrieve server info, skipping idle check: {e}");
                } else {
                    error!("Server info query cannot succeed without intervention: {e}");
                }
                return TickOutcome::QueryFailed;
            }
        };

        if !snapshot.running {
            self.lock_timer().clear();
            return TickOutcome::NotRunning;
        }

        if snapshot.player_count > 0 {
            let mut timer = self.lock_timer();
            if timer.active {
                debug!("{} player(s) online, idle timer reset", snapshot.player_count);
            }
            timer.clear();
            return TickOutcome::Occupied(snapshot.player_count);
        }

        let idle = {
            let now = Instant::now();
            let mut timer = self.lock_timer();
            let elapsed = now.saturating_duration_since(timer.activate(now));
            // The empty sample stands for the whole interval ending at this tick
            let idle = elapsed + self.interval;
            if idle < self.threshold {
                let remaining = self.threshold.saturating_sub(elapsed);
                timer.remaining = Some(remaining);
                return TickOutcome::Idle { remaining };
            }
            idle
        };

        info!(
            "Server empty for {}, requesting stop",
            format_duration(idle)
        );
        let outcome = self
            .controller
            .request_stop(IDLE_STOP_DELAY_SECS, false)
            .await;
        self.lock_timer().clear();
        TickOutcome::StopRequested(outcome)
    }

    /// Long-lived ticker task. The first tick fires immediately.
    pub async fn run(self: Arc<Self>, mut shutdown: ShutdownGuard) {
        info!(
            "Idle monitor started (threshold: {}, interval: {})",
            format_duration(self.threshold),
            format_duration(self.interval)
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = ticker.tick() => {
                    let outcome = self.tick().await;
                    debug!("Idle check: {outcome:?}");
                }
            }
        }

        info!("Idle monitor stopped");
    }

    fn lock_timer(&self) -> MutexGuard<'_, IdleTimer> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Cooldown-guarded start/stop orchestration.
//!
//! The controller owns every piece of shared lifecycle state. All of it sits
//! behind one mutex which is never held across an `.await`, so each guard
//! check and the transition it protects happen as one critical section.

use crate::{
    ConnectionSniffer, ControlChannel, CooldownWindows, LifecycleResult,
    ProcessSupervisor, ServerInfoSnapshot, ServerState, ServerStatus, StopWatch,
};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use gs_config::Config;
use humantime::format_duration;
use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::time::Instant;

/// Minimum delay accepted for a graceful shutdown, in seconds.
const MIN_SHUTDOWN_DELAY_SECS: f64 = 1.0;

/// Timing and messaging knobs for the controller.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub start_cooldown: Duration,
    pub stop_cooldown: Duration,
    pub stop_watch_poll: Duration,
    pub stop_watch_timeout: Duration,
    pub rearm_delay: Duration,
    pub shutdown_message: String,
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            start_cooldown: config.cooldown.start(),
            stop_cooldown: config.cooldown.stop(),
            stop_watch_poll: config.cooldown.stop_watch_poll(),
            stop_watch_timeout: config.cooldown.stop_watch_timeout(),
            rearm_delay: config.cooldown.rearm_delay(),
            shutdown_message: config.control.shutdown_message.clone(),
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Why a start or stop request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    AlreadyRunning,
    StartInProgress,
    StartCooldown { remaining: Duration },
    StopCooldown { remaining: Duration },
    StopEventInProgress,
    NotRunning,
    /// Shutdown delay that cannot be expressed as a duration.
    InvalidDelay,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "server is already running"),
            Self::StartInProgress => write!(f, "server is already starting"),
            Self::StartCooldown { remaining } => {
                write!(f, "start cooldown, {} left", format_duration(*remaining))
            }
            Self::StopCooldown { remaining } => {
                write!(f, "stop cooldown, {} left", format_duration(*remaining))
            }
            Self::StopEventInProgress => write!(f, "a stop event is in progress"),
            Self::NotRunning => write!(f, "server is not running"),
            Self::InvalidDelay => write!(f, "shutdown delay is out of range"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    Rejected(Rejection),
    LaunchFailed,
}

impl std::fmt::Display for StartOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Rejected(reason) => write!(f, "rejected: {reason}"),
            Self::LaunchFailed => write!(f, "launch failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Termination signals were sent to `signalled` processes.
    Forced { signalled: usize },
    TerminateFailed,
    ShutdownSent,
    Rejected(Rejection),
    ChannelFailed,
}

#[derive(Debug)]
struct ControllerState {
    cooldowns: CooldownWindows,
    stop_watch: StopWatch,
    snapshot: Option<ServerInfoSnapshot>,
}

/// Pieces the post-stop confirmation task needs after the request returns.
#[derive(Clone)]
struct Shared {
    settings: Arc<ControllerSettings>,
    supervisor: Arc<dyn ProcessSupervisor>,
    sniffer: Arc<ConnectionSniffer>,
    state: Arc<Mutex<ControllerState>>,
    state_tx: Arc<watch::Sender<ServerState>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: ServerState) {
        let previous = self.state_tx.send_replace(next);
        if previous != next {
            debug!("Server state {previous} -> {next}");
        }
    }
}

pub struct LifecycleController {
    shared: Shared,
    channel: Arc<dyn ControlChannel>,
}

impl LifecycleController {
    pub fn new(
        settings: ControllerSettings,
        supervisor: Arc<dyn ProcessSupervisor>,
        channel: Arc<dyn ControlChannel>,
        sniffer: Arc<ConnectionSniffer>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ServerState::Stopped);
        let state = ControllerState {
            cooldowns: CooldownWindows::new(settings.start_cooldown, settings.stop_cooldown),
            stop_watch: StopWatch::default(),
            snapshot: None,
        };
        Self {
            shared: Shared {
                settings: Arc::new(settings),
                supervisor,
                sniffer,
                state: Arc::new(Mutex::new(state)),
                state_tx: Arc::new(state_tx),
            },
            channel,
        }
    }

    pub fn state(&self) -> ServerState {
        *self.shared.state_tx.borrow()
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.shared.state_tx.subscribe()
    }

    pub fn sniffer(&self) -> &Arc<ConnectionSniffer> {
        &self.shared.sniffer
    }

    /// Last cached occupancy snapshot, `None` until the first query.
    pub fn snapshot(&self) -> Option<ServerInfoSnapshot> {
        self.shared.lock().snapshot.clone()
    }

    pub fn is_stop_event_running(&self) -> bool {
        self.shared.lock().stop_watch.active
    }

    /// Set the initial state from actual process liveness.
    pub async fn probe(&self) -> ServerState {
        let state = if self.shared.supervisor.is_running().await {
            ServerState::Running
        } else {
            ServerState::Stopped
        };
        self.shared.set_state(state);
        info!("Boot probe: server is {state}");
        state
    }

    /// Whether the supervised process is alive right now.
    pub async fn is_process_running(&self) -> bool {
        self.shared.supervisor.is_running().await
    }

    /// Move a stale `Running` back to `Stopped` after the process vanished
    /// without a stop request, and let detection listen again. Returns whether
    /// the state changed.
    pub fn reconcile_not_running(&self) -> bool {
        let state = self.shared.lock();
        if state.stop_watch.active || self.state() != ServerState::Running {
            return false;
        }
        self.shared.set_state(ServerState::Stopped);
        drop(state);
        warn!("Server process exited without a stop request");
        self.shared.sniffer.request_arm();
        true
    }

    pub async fn request_start(&self) -> StartOutcome {
        info!("Server start requested");

        if self.shared.supervisor.is_running().await {
            return Self::reject_start(Rejection::AlreadyRunning);
        }

        {
            let now = Instant::now();
            let shared = self.shared.lock();

            let rejection = if self.state() == ServerState::Starting {
                Some(Rejection::StartInProgress)
            } else if let Some(remaining) = shared.cooldowns.start_remaining(now) {
                Some(Rejection::StartCooldown { remaining })
            } else if let Some(remaining) = shared.cooldowns.stop_remaining(now) {
                Some(Rejection::StopCooldown { remaining })
            } else if shared.stop_watch.active {
                Some(Rejection::StopEventInProgress)
            } else {
                None
            };

            if let Some(reason) = rejection {
                drop(shared);
                return Self::reject_start(reason);
            }

            self.shared.set_state(ServerState::Starting);
        }

        let mut attempt = StartAttempt {
            shared: &self.shared,
            launched: false,
        };

        self.shared.sniffer.disarm();

        match self.shared.supervisor.spawn().await {
            Ok(()) => {
                attempt.launched = true;
                info!("Server launch command completed");
                StartOutcome::Started
            }
            Err(e) => {
                error!("Server launch failed: {e}");
                StartOutcome::LaunchFailed
            }
        }
    }

    fn reject_start(reason: Rejection) -> StartOutcome {
        warn!("Start ignored: {reason}");
        StartOutcome::Rejected(reason)
    }

    /// Stop the server, gracefully over the control channel or by signal.
    pub async fn request_stop(&self, delay_secs: f64, force: bool) -> StopOutcome {
        info!("Server stop requested (force: {force})");

        let delay = match shutdown_delay(delay_secs) {
            Some(delay) => delay,
            None if force => Duration::ZERO,
            None => return Self::reject_stop(Rejection::InvalidDelay),
        };

        let _attempt = StopAttempt {
            shared: &self.shared,
        };

        self.begin_stop_watch();

        if force {
            return match self.shared.supervisor.terminate().await {
                Ok(signalled) => StopOutcome::Forced { signalled },
                Err(e) => {
                    error!("Forced stop failed: {e}");
                    StopOutcome::TerminateFailed
                }
            };
        }

        if !self.shared.supervisor.is_running().await {
            return Self::reject_stop(Rejection::NotRunning);
        }

        let remaining = self.shared.lock().cooldowns.stop_remaining(Instant::now());
        if let Some(remaining) = remaining {
            return Self::reject_stop(Rejection::StopCooldown { remaining });
        }

        match self
            .channel
            .shutdown(delay, &self.shared.settings.shutdown_message)
            .await
        {
            Ok(_) => {
                info!("Shutdown scheduled in {}", format_duration(delay));
                StopOutcome::ShutdownSent
            }
            Err(e) => {
                error!("Graceful shutdown failed: {e}");
                StopOutcome::ChannelFailed
            }
        }
    }

    fn reject_stop(reason: Rejection) -> StopOutcome {
        warn!("Stop ignored: {reason}");
        StopOutcome::Rejected(reason)
    }

    /// Start the post-stop confirmation task unless one is already running.
    fn begin_stop_watch(&self) {
        let mut state = self.shared.lock();
        if !state.stop_watch.begin(Instant::now()) {
            debug!("Stop watch already active");
            return;
        }

        self.shared.set_state(ServerState::Stopping);
        let handle = tokio::spawn(confirm_exit(self.shared.clone()));
        state.stop_watch.attach(handle);
    }

    /// Wait (bounded) for an in-flight stop watch to finish.
    pub async fn wait_for_stop_watch(&self, timeout: Duration) -> bool {
        let handle = self.shared.lock().stop_watch.take_handle();
        let Some(handle) = handle else {
            return true;
        };

        match tokio::time::timeout(timeout, handle).await {
            Ok(_) => true,
            Err(_) => {
                warn!(
                    "Stop watch still running after {}",
                    format_duration(timeout)
                );
                false
            }
        }
    }

    /// Refresh the cached occupancy snapshot.
    ///
    /// Reports "not running" without touching the control channel while the
    /// process is down, a stop event is in progress, or the stop cooldown is
    /// running. A failed query leaves the cache as it was.
    pub async fn refresh_server_info(&self) -> LifecycleResult<ServerInfoSnapshot> {
        let running = self.shared.supervisor.is_running().await;
        let suppressed = {
            let shared = self.shared.lock();
            shared.stop_watch.active || shared.cooldowns.stop_remaining(Instant::now()).is_some()
        };

        let snapshot = if !running || suppressed {
            ServerInfoSnapshot::not_running()
        } else {
            self.channel.query_players().await?
        };

        self.shared.lock().snapshot = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Read-only status; never touches the control channel.
    pub fn status(&self, idle_remaining: Option<Duration>) -> ServerStatus {
        let (snapshot, stop_event_running) = {
            let shared = self.shared.lock();
            (shared.snapshot.clone(), shared.stop_watch.active)
        };
        ServerStatus::new(self.state(), snapshot, stop_event_running, idle_remaining)
    }
}

/// Records the start attempt whichever way `request_start` exits.
struct StartAttempt<'a> {
    shared: &'a Shared,
    launched: bool,
}

impl Drop for StartAttempt<'_> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.cooldowns.record_start(Instant::now());
        self.shared.set_state(if self.launched {
            ServerState::Running
        } else {
            ServerState::Stopped
        });
    }
}

/// Records the stop instant whichever way `request_stop` exits.
struct StopAttempt<'a> {
    shared: &'a Shared,
}

impl Drop for StopAttempt<'_> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.cooldowns.record_stop(Instant::now());
    }
}

/// Poll until the process exits or the watch times out.
async fn confirm_exit(shared: Shared) {
    let started = Instant::now();
    let settings = Arc::clone(&shared.settings);

    loop {
        if !shared.supervisor.is_running().await {
            info!(
                "Server exit confirmed after {}",
                format_duration(round_secs(started.elapsed()))
            );
            tokio::time::sleep(settings.rearm_delay).await;
            {
                let mut state = shared.lock();
                state.stop_watch.finish();
                shared.set_state(ServerState::Stopped);
            }
            shared.sniffer.request_arm();
            return;
        }

        if started.elapsed() > settings.stop_watch_timeout {
            warn!(
                "Server still running {} after stop request, giving up",
                format_duration(settings.stop_watch_timeout)
            );
            let mut state = shared.lock();
            state.stop_watch.finish();
            shared.set_state(ServerState::Running);
            return;
        }

        tokio::time::sleep(settings.stop_watch_poll).await;
    }
}

/// Requested delay raised to the minimum, `None` when it does not fit a `Duration`.
fn shutdown_delay(delay_secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(delay_secs.max(MIN_SHUTDOWN_DELAY_SECS)).ok()
}

fn round_secs(duration: Duration) -> Duration {
    Duration::from_secs(duration.as_secs())
}

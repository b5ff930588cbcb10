mod status;
mod supervisor;

use crate::{
    ConnectionSniffer, ControlChannel, ControllerSettings, LifecycleController, LifecycleError,
    LifecycleResult, ProcessSupervisor,
};

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

pub(crate) const EMPTY_ROSTER: &str = "name,playeruid,steamid\n";
pub(crate) const TWO_PLAYER_ROSTER: &str =
    "name,playeruid,steamid\nAlice,1001,76561198000000001\nBob,1002,76561198000000002\n";

/// In-memory process supervisor.
#[derive(Default)]
pub(crate) struct FakeSupervisor {
    running: AtomicBool,
    fail_spawn: AtomicBool,
    background_launch: AtomicBool,
    spawn_count: AtomicUsize,
    terminate_count: AtomicUsize,
    armed_during_spawn: AtomicBool,
    sniffer: Mutex<Option<Arc<ConnectionSniffer>>>,
}

impl FakeSupervisor {
    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub(crate) fn fail_spawn(&self) {
        self.fail_spawn.store(true, Ordering::SeqCst);
    }

    /// spawn() returns before the server shows up in the process table.
    pub(crate) fn launch_in_background(&self) {
        self.background_launch.store(true, Ordering::SeqCst);
    }

    pub(crate) fn spawn_count(&self) -> usize {
        self.spawn_count.load(Ordering::SeqCst)
    }

    pub(crate) fn terminate_count(&self) -> usize {
        self.terminate_count.load(Ordering::SeqCst)
    }

    pub(crate) fn armed_during_spawn(&self) -> bool {
        self.armed_during_spawn.load(Ordering::SeqCst)
    }

    /// Let spawn() record whether the listener was still open.
    pub(crate) fn watch_sniffer(&self, sniffer: Arc<ConnectionSniffer>) {
        *self.sniffer.lock().unwrap() = Some(sniffer);
    }
}

#[async_trait]
impl ProcessSupervisor for FakeSupervisor {
    async fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn terminate(&self) -> LifecycleResult<usize> {
        self.terminate_count.fetch_add(1, Ordering::SeqCst);
        Ok(usize::from(self.running.swap(false, Ordering::SeqCst)))
    }

    async fn spawn(&self) -> LifecycleResult<()> {
        self.spawn_count.fetch_add(1, Ordering::SeqCst);

        let armed = self
            .sniffer
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|sniffer| sniffer.is_armed());
        if armed {
            self.armed_during_spawn.store(true, Ordering::SeqCst);
        }

        if self.fail_spawn.load(Ordering::SeqCst) {
            return Err(LifecycleError::launch("./start.sh", "exited with status 1"));
        }
        if !self.background_launch.load(Ordering::SeqCst) {
            self.set_running(true);
        }
        Ok(())
    }
}

/// Scripted control channel. Responses queued with `push_*` are used first,
/// then the default response.
pub(crate) struct FakeChannel {
    default_response: Mutex<String>,
    scripted: Mutex<VecDeque<Result<String, String>>>,
    commands: Mutex<Vec<String>>,
    delay: Duration,
}

impl FakeChannel {
    pub(crate) fn new(default_response: &str) -> Self {
        Self::with_delay(default_response, Duration::ZERO)
    }

    pub(crate) fn with_delay(default_response: &str, delay: Duration) -> Self {
        Self {
            default_response: Mutex::new(default_response.to_string()),
            scripted: Mutex::new(VecDeque::new()),
            commands: Mutex::new(Vec::new()),
            delay,
        }
    }

    pub(crate) fn set_default(&self, response: &str) {
        *self.default_response.lock().unwrap() = response.to_string();
    }

    pub(crate) fn push_failure(&self, message: &str) {
        self.scripted
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub(crate) fn push_response(&self, response: &str) {
        self.scripted
            .lock()
            .unwrap()
            .push_back(Ok(response.to_string()));
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub(crate) fn count_commands(&self, prefix: &str) -> usize {
        self.commands()
            .iter()
            .filter(|command| command.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl ControlChannel for FakeChannel {
    async fn execute(&self, command: &str) -> LifecycleResult<String> {
        self.commands.lock().unwrap().push(command.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let scripted = self.scripted.lock().unwrap().pop_front();
        match scripted {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(LifecycleError::control_channel(command, message)),
            None => Ok(self.default_response.lock().unwrap().clone()),
        }
    }
}

/// Controller wired to fakes.
pub(crate) struct Harness {
    pub(crate) controller: Arc<LifecycleController>,
    pub(crate) supervisor: Arc<FakeSupervisor>,
    pub(crate) channel: Arc<FakeChannel>,
    pub(crate) sniffer: Arc<ConnectionSniffer>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with(ControllerSettings::default(), FakeChannel::new(EMPTY_ROSTER))
    }

    pub(crate) fn with(settings: ControllerSettings, channel: FakeChannel) -> Self {
        let sniffer = Arc::new(ConnectionSniffer::new(
            ephemeral_addr(),
            Vec::new(),
            Duration::from_millis(50),
        ));
        Self::with_sniffer(settings, channel, sniffer)
    }

    pub(crate) fn with_sniffer(
        settings: ControllerSettings,
        channel: FakeChannel,
        sniffer: Arc<ConnectionSniffer>,
    ) -> Self {
        let supervisor = Arc::new(FakeSupervisor::default());
        supervisor.watch_sniffer(Arc::clone(&sniffer));
        let channel = Arc::new(channel);
        let controller = Arc::new(LifecycleController::new(
            settings,
            supervisor.clone(),
            channel.clone(),
            Arc::clone(&sniffer),
        ));

        Self {
            controller,
            supervisor,
            channel,
            sniffer,
        }
    }
}

/// Settings with short stop-watch timings and no cooldowns.
pub(crate) fn quick_settings() -> ControllerSettings {
    ControllerSettings {
        start_cooldown: Duration::ZERO,
        stop_cooldown: Duration::ZERO,
        stop_watch_poll: Duration::from_millis(10),
        stop_watch_timeout: Duration::from_secs(2),
        rearm_delay: Duration::from_millis(10),
        ..ControllerSettings::default()
    }
}

/// A localhost UDP address that was free a moment ago.
pub(crate) fn ephemeral_addr() -> SocketAddr {
    let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.local_addr().unwrap()
}

/// Poll `condition` every 10ms until it holds or `timeout` passes.
pub(crate) async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

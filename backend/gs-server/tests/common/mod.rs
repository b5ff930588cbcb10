#![allow(dead_code)]

//! Test infrastructure for gs-server daemon tests

use gs_config::Config;
use gs_lifecycle::{ControlChannel, LifecycleResult, ProcessSupervisor};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

pub const EMPTY_ROSTER: &str = "name,playeruid,steamid\n";

/// Process table stand-in shared between the supervisor and channel fakes.
#[derive(Default)]
pub struct FakeProcess {
    running: AtomicBool,
    spawn_count: AtomicUsize,
}

impl FakeProcess {
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn spawn_count(&self) -> usize {
        self.spawn_count.load(Ordering::SeqCst)
    }
}

pub struct FakeSupervisor(pub Arc<FakeProcess>);

#[async_trait]
impl ProcessSupervisor for FakeSupervisor {
    async fn is_running(&self) -> bool {
        self.0.is_running()
    }

    async fn terminate(&self) -> LifecycleResult<usize> {
        let was_running = self.0.running.swap(false, Ordering::SeqCst);
        Ok(usize::from(was_running))
    }

    async fn spawn(&self) -> LifecycleResult<()> {
        self.0.spawn_count.fetch_add(1, Ordering::SeqCst);
        self.0.set_running(true);
        Ok(())
    }
}

/// Answers every roster query with an empty server and exits the process on `Shutdown`.
pub struct FakeChannel {
    process: Arc<FakeProcess>,
    commands: Mutex<Vec<String>>,
}

impl FakeChannel {
    pub fn new(process: Arc<FakeProcess>) -> Self {
        Self {
            process,
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn count_commands(&self, prefix: &str) -> usize {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|command| command.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl ControlChannel for FakeChannel {
    async fn execute(&self, command: &str) -> LifecycleResult<String> {
        self.commands.lock().unwrap().push(command.to_string());

        if command.starts_with("Shutdown") {
            self.process.set_running(false);
            return Ok(String::from("The server will shut down."));
        }
        Ok(EMPTY_ROSTER.to_string())
    }
}

/// Config on a free localhost port with every delay at its minimum.
pub fn quick_config() -> Config {
    let mut config = Config::default();

    let reserved = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    config.server.ip = String::from("127.0.0.1");
    config.server.port = reserved.local_addr().unwrap().port();
    drop(reserved);

    config.detection.poll_interval_secs = 1;
    config.idle.threshold_secs = 2;
    config.idle.check_interval_secs = 1;
    config.cooldown.start_secs = 0;
    config.cooldown.stop_secs = 0;
    config.cooldown.stop_watch_poll_secs = 1;
    config.cooldown.stop_watch_timeout_secs = 10;
    config.cooldown.rearm_delay_secs = 1;
    config
}

/// Poll `condition` every 20ms until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// In-flight confirmation that the server exited after a stop request.
///
/// `active` is the authoritative "stop event in progress" flag.
#[derive(Debug, Default)]
pub struct StopWatch {
    pub triggered_at: Option<Instant>,
    pub active: bool,
    handle: Option<JoinHandle<()>>,
}

impl StopWatch {
    /// Mark active; returns false when a watch is already running.
    pub fn begin(&mut self, now: Instant) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.triggered_at = Some(now);
        true
    }

    pub fn attach(&mut self, handle: JoinHandle<()>) {
        self.handle = Some(handle);
    }

    pub fn finish(&mut self) {
        self.active = false;
    }

    pub fn take_handle(&mut self) -> Option<JoinHandle<()>> {
        self.handle.take()
    }
}

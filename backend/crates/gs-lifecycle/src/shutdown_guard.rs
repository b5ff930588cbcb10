use crate::ShutdownCoordinator;

use tokio::sync::watch;

/// Helper for gracefully handling shutdown in async tasks
pub struct ShutdownGuard {
    shutdown_rx: watch::Receiver<bool>,
}

impl ShutdownGuard {
    pub fn new(coordinator: &ShutdownCoordinator) -> Self {
        Self {
            shutdown_rx: coordinator.subscribe(),
        }
    }

    /// Wait for shutdown signal. Returns immediately if already signalled.
    ///
    /// Cancel safe, so it can sit in a `select!` arm.
    pub async fn wait(&mut self) {
        // Sender dropped without signalling is treated as shutdown too
        let _ = self.shutdown_rx.wait_for(|stop| *stop).await;
    }

    /// Poll for shutdown signal (non-blocking)
    pub fn poll_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }
}

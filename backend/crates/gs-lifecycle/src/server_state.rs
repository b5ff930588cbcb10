use serde::Serialize;

/// Lifecycle state of the game server process.
///
/// Only the [`LifecycleController`](crate::LifecycleController) moves between
/// states; everything else observes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    /// Server is not running; detection may be armed
    Stopped,
    /// Launch command is running
    Starting,
    /// Launch command succeeded (liveness assumed, not confirmed)
    Running,
    /// Stop requested, waiting for the process to exit
    Stopping,
}

impl ServerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        }
    }
}

impl std::fmt::Display for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

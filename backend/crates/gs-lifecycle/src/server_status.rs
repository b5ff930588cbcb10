use crate::{IdleMonitor, LifecycleController, LifecycleResult, ServerInfoSnapshot, ServerState};

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Read-only view of the lifecycle for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ServerStatus {
    pub state: ServerState,
    /// Last known occupancy, `None` when never queried.
    pub server: Option<ServerInfoSnapshot>,
    pub stop_event_running: bool,
    pub idle_remaining_secs: Option<u64>,
    pub checked_at: DateTime<Utc>,
}

impl ServerStatus {
    pub fn new(
        state: ServerState,
        server: Option<ServerInfoSnapshot>,
        stop_event_running: bool,
        idle_remaining: Option<Duration>,
    ) -> Self {
        Self {
            state,
            server,
            stop_event_running,
            idle_remaining_secs: idle_remaining.map(|d| d.as_secs()),
            checked_at: Utc::now(),
        }
    }

    /// Gather status without touching the control channel.
    pub fn collect(controller: &LifecycleController, idle_monitor: Option<&IdleMonitor>) -> Self {
        controller.status(idle_monitor.and_then(IdleMonitor::remaining))
    }

    pub fn to_json(&self) -> LifecycleResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

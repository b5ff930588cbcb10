use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_REARM_DELAY_SECS, DEFAULT_START_COOLDOWN_SECS,
    DEFAULT_STOP_COOLDOWN_SECS, DEFAULT_STOP_WATCH_POLL_SECS, DEFAULT_STOP_WATCH_TIMEOUT_SECS,
};

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    /// Minimum interval between start attempts
    pub start_secs: u64,
    /// Minimum interval between stops, and from a stop to the next start
    pub stop_secs: u64,
    /// Liveness poll cadence while confirming a stop
    pub stop_watch_poll_secs: u64,
    /// Give up confirming a stop after this long
    pub stop_watch_timeout_secs: u64,
    /// Pause between confirmed exit and re-arming detection
    pub rearm_delay_secs: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            start_secs: DEFAULT_START_COOLDOWN_SECS,
            stop_secs: DEFAULT_STOP_COOLDOWN_SECS,
            stop_watch_poll_secs: DEFAULT_STOP_WATCH_POLL_SECS,
            stop_watch_timeout_secs: DEFAULT_STOP_WATCH_TIMEOUT_SECS,
            rearm_delay_secs: DEFAULT_REARM_DELAY_SECS,
        }
    }
}

impl CooldownConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.stop_watch_poll_secs == 0 {
            return Err(ConfigError::cooldown(
                "cooldown.stop_watch_poll_secs must be > 0",
            ));
        }

        if self.stop_watch_timeout_secs < self.stop_watch_poll_secs {
            return Err(ConfigError::cooldown(format!(
                "cooldown.stop_watch_timeout_secs must be >= stop_watch_poll_secs ({}), got {}",
                self.stop_watch_poll_secs, self.stop_watch_timeout_secs
            )));
        }

        Ok(())
    }

    pub fn start(&self) -> Duration {
        Duration::from_secs(self.start_secs)
    }

    pub fn stop(&self) -> Duration {
        Duration::from_secs(self.stop_secs)
    }

    pub fn stop_watch_poll(&self) -> Duration {
        Duration::from_secs(self.stop_watch_poll_secs)
    }

    pub fn stop_watch_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_watch_timeout_secs)
    }

    pub fn rearm_delay(&self) -> Duration {
        Duration::from_secs(self.rearm_delay_secs)
    }
}

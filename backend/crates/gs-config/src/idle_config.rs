use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_IDLE_CHECK_INTERVAL_SECS, DEFAULT_IDLE_ENABLED,
    DEFAULT_IDLE_THRESHOLD_SECS,
};

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    /// Stop the server after `threshold_secs` without players
    pub enabled: bool,
    pub threshold_secs: u64,
    pub check_interval_secs: u64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_IDLE_ENABLED,
            threshold_secs: DEFAULT_IDLE_THRESHOLD_SECS,
            check_interval_secs: DEFAULT_IDLE_CHECK_INTERVAL_SECS,
        }
    }
}

impl IdleConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.threshold_secs == 0 {
            return Err(ConfigError::idle("idle.threshold_secs must be > 0"));
        }

        if self.check_interval_secs == 0 {
            return Err(ConfigError::idle("idle.check_interval_secs must be > 0"));
        }

        if self.check_interval_secs > self.threshold_secs {
            log::warn!(
                "idle.check_interval_secs ({}) exceeds idle.threshold_secs ({}); \
                 the server stops on the first empty check",
                self.check_interval_secs,
                self.threshold_secs
            );
        }

        Ok(())
    }

    pub fn threshold(&self) -> Duration {
        Duration::from_secs(self.threshold_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

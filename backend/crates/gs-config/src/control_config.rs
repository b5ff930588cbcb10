use crate::{
    COMMAND_PLACEHOLDER, ConfigError, ConfigErrorResult, DEFAULT_CONTROL_CLIENT_ARGS,
    DEFAULT_CONTROL_CLIENT_PATH, DEFAULT_CONTROL_HOST, DEFAULT_CONTROL_PORT,
    DEFAULT_CONTROL_TIMEOUT_SECS, DEFAULT_SHUTDOWN_MESSAGE,
};

use std::time::Duration;

use serde::Deserialize;

/// Remote administration channel of the running server.
///
/// Commands are delivered by an external client binary. `client_args` is a
/// template: `{host}`, `{port}`, `{password}` and `{command}` are substituted
/// per invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub client_path: String,
    pub client_args: Vec<String>,
    pub timeout_secs: u64,
    /// Message broadcast to players with the shutdown command
    pub shutdown_message: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            host: String::from(DEFAULT_CONTROL_HOST),
            port: DEFAULT_CONTROL_PORT,
            password: String::new(),
            client_path: String::from(DEFAULT_CONTROL_CLIENT_PATH),
            client_args: DEFAULT_CONTROL_CLIENT_ARGS
                .iter()
                .map(|arg| String::from(*arg))
                .collect(),
            timeout_secs: DEFAULT_CONTROL_TIMEOUT_SECS,
            shutdown_message: String::from(DEFAULT_SHUTDOWN_MESSAGE),
        }
    }
}

impl ControlConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.client_path.trim().is_empty() {
            return Err(ConfigError::control("control.client_path cannot be empty"));
        }

        if !self
            .client_args
            .iter()
            .any(|arg| arg.contains(COMMAND_PLACEHOLDER))
        {
            return Err(ConfigError::control(format!(
                "control.client_args must contain the {COMMAND_PLACEHOLDER} placeholder"
            )));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::control("control.timeout_secs must be > 0"));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_LAUNCH_PATH, DEFAULT_LAUNCH_SHELL,
    DEFAULT_PROCESS_NAME,
};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Script that launches the game server
    pub launch_path: String,
    /// Interpreter used to run `launch_path`
    pub shell: String,
    /// Substring matched against full command lines to find the server process
    pub process_name: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            launch_path: String::from(DEFAULT_LAUNCH_PATH),
            shell: String::from(DEFAULT_LAUNCH_SHELL),
            process_name: String::from(DEFAULT_PROCESS_NAME),
        }
    }
}

impl ProcessConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.launch_path.trim().is_empty() {
            return Err(ConfigError::process("process.launch_path cannot be empty"));
        }

        if self.shell.trim().is_empty() {
            return Err(ConfigError::process("process.shell cannot be empty"));
        }

        if self.process_name.trim().is_empty() {
            return Err(ConfigError::process(
                "process.process_name cannot be empty (it would match every process)",
            ));
        }

        Ok(())
    }
}

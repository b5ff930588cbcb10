mod config;
mod control_config;
mod cooldown_config;
mod detection_config;
mod error;
mod idle_config;
mod log_level;
mod logging_config;
mod process_config;
mod server_config;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use control_config::ControlConfig;
pub use cooldown_config::CooldownConfig;
pub use detection_config::DetectionConfig;
pub use error::{ConfigError, ConfigErrorResult};
pub use idle_config::IdleConfig;
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use process_config::ProcessConfig;
pub use server_config::ServerConfig;

const CONFIG_DIR_ENV: &str = "GS_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".gs";
const CONFIG_FILENAME: &str = "config.toml";

// Game server
const DEFAULT_SERVER_IP: &str = "0.0.0.0";
const DEFAULT_SERVER_PORT: u16 = 8211;

// Detection
const DEFAULT_DETECTION_ENABLED: bool = true;
const DEFAULT_DETECTION_SIGNATURE: &str = "";
const DEFAULT_DETECTION_POLL_INTERVAL_SECS: u64 = 5;

// Control channel
const DEFAULT_CONTROL_HOST: &str = "127.0.0.1";
const DEFAULT_CONTROL_PORT: u16 = 25575;
const DEFAULT_CONTROL_CLIENT_PATH: &str = "rcon";
const DEFAULT_CONTROL_CLIENT_ARGS: [&str; 5] = ["-a", "{host}:{port}", "-p", "{password}", "{command}"];
const DEFAULT_CONTROL_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SHUTDOWN_MESSAGE: &str = "Server is shutting down.";
const COMMAND_PLACEHOLDER: &str = "{command}";

// Process
const DEFAULT_LAUNCH_PATH: &str = "./start.sh";
const DEFAULT_LAUNCH_SHELL: &str = "bash";
const DEFAULT_PROCESS_NAME: &str = "PalServer-Linux";

// Idle stop
const DEFAULT_IDLE_ENABLED: bool = true;
const DEFAULT_IDLE_THRESHOLD_SECS: u64 = 600;
const DEFAULT_IDLE_CHECK_INTERVAL_SECS: u64 = 30;

// Cooldowns and stop confirmation
const DEFAULT_START_COOLDOWN_SECS: u64 = 5;
const DEFAULT_STOP_COOLDOWN_SECS: u64 = 5;
const DEFAULT_STOP_WATCH_POLL_SECS: u64 = 1;
const DEFAULT_STOP_WATCH_TIMEOUT_SECS: u64 = 60;
const DEFAULT_REARM_DELAY_SECS: u64 = 1;

// Logging
const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "log";
const DEFAULT_LOG_COLORED: bool = true;

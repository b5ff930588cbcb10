use crate::{
    CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult, ControlConfig,
    CooldownConfig, DEFAULT_CONFIG_DIR, DetectionConfig, IdleConfig, LoggingConfig,
    ProcessConfig, ServerConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub detection: DetectionConfig,
    pub control: ControlConfig,
    pub process: ProcessConfig,
    pub idle: IdleConfig,
    pub cooldown: CooldownConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config once at boot.
    ///
    /// Loading order:
    /// 1. Check for GS_CONFIG_DIR env var, else use ./.gs/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply GS_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load and parse TOML file with detailed error context.
    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: GS_CONFIG_DIR env var > ./.gs/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.server.validate()?;
        self.detection.validate()?;
        self.control.validate()?;
        self.process.validate()?;
        self.idle.validate()?;
        self.cooldown.validate()?;
        self.logging.validate()?;

        if !self.detection.enabled && !self.idle.enabled {
            log::warn!("Both detection and idle stop are disabled; the daemon will only observe");
        }

        Ok(())
    }

    /// Absolute path to the log file, when file logging is configured.
    pub fn log_file_path(&self) -> ConfigErrorResult<Option<PathBuf>> {
        match self.logging.file {
            Some(ref filename) => {
                let config_dir = Self::config_dir()?;
                Ok(Some(config_dir.join(&self.logging.dir).join(filename)))
            }
            None => Ok(None),
        }
    }

    /// Log configuration summary (NEVER logs the control password).
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  server: {}:{}", self.server.ip, self.server.port);
        info!(
            "  detection: {} (signature: {}, poll: {}s)",
            if self.detection.enabled {
                "enabled"
            } else {
                "disabled"
            },
            if self.detection.signature.trim().is_empty() {
                "<any datagram>"
            } else {
                self.detection.signature.as_str()
            },
            self.detection.poll_interval_secs
        );
        info!(
            "  control: {}:{} via {} (timeout: {}s, password: {})",
            self.control.host,
            self.control.port,
            self.control.client_path,
            self.control.timeout_secs,
            if self.control.password.is_empty() {
                "unset"
            } else {
                "set"
            }
        );
        info!(
            "  process: {} {} (match: '{}')",
            self.process.shell, self.process.launch_path, self.process.process_name
        );
        info!(
            "  idle: {} (threshold: {}s, interval: {}s)",
            if self.idle.enabled {
                "enabled"
            } else {
                "disabled"
            },
            self.idle.threshold_secs,
            self.idle.check_interval_secs
        );
        info!(
            "  cooldown: start={}s, stop={}s, stop_watch={}s/{}s, rearm={}s",
            self.cooldown.start_secs,
            self.cooldown.stop_secs,
            self.cooldown.stop_watch_poll_secs,
            self.cooldown.stop_watch_timeout_secs,
            self.cooldown.rearm_delay_secs
        );
        info!(
            "  logging: {} (colored: {})",
            *self.logging.level, self.logging.colored
        );
    }

    fn apply_env_overrides(&mut self) {
        // Server
        Self::apply_env_string("GS_SERVER_IP", &mut self.server.ip);
        Self::apply_env_parse("GS_SERVER_PORT", &mut self.server.port);

        // Detection
        Self::apply_env_bool("GS_DETECTION_ENABLED", &mut self.detection.enabled);
        Self::apply_env_string("GS_DETECTION_SIGNATURE", &mut self.detection.signature);
        Self::apply_env_parse(
            "GS_DETECTION_POLL_INTERVAL_SECS",
            &mut self.detection.poll_interval_secs,
        );

        // Control channel
        Self::apply_env_string("GS_CONTROL_HOST", &mut self.control.host);
        Self::apply_env_parse("GS_CONTROL_PORT", &mut self.control.port);
        Self::apply_env_string("GS_CONTROL_PASSWORD", &mut self.control.password);
        Self::apply_env_string("GS_CONTROL_CLIENT_PATH", &mut self.control.client_path);
        Self::apply_env_list("GS_CONTROL_CLIENT_ARGS", &mut self.control.client_args);
        Self::apply_env_parse("GS_CONTROL_TIMEOUT_SECS", &mut self.control.timeout_secs);
        Self::apply_env_string(
            "GS_CONTROL_SHUTDOWN_MESSAGE",
            &mut self.control.shutdown_message,
        );

        // Process
        Self::apply_env_string("GS_PROCESS_LAUNCH_PATH", &mut self.process.launch_path);
        Self::apply_env_string("GS_PROCESS_SHELL", &mut self.process.shell);
        Self::apply_env_string("GS_PROCESS_NAME", &mut self.process.process_name);

        // Idle stop
        Self::apply_env_bool("GS_IDLE_ENABLED", &mut self.idle.enabled);
        Self::apply_env_parse("GS_IDLE_THRESHOLD_SECS", &mut self.idle.threshold_secs);
        Self::apply_env_parse(
            "GS_IDLE_CHECK_INTERVAL_SECS",
            &mut self.idle.check_interval_secs,
        );

        // Cooldowns
        Self::apply_env_parse("GS_COOLDOWN_START_SECS", &mut self.cooldown.start_secs);
        Self::apply_env_parse("GS_COOLDOWN_STOP_SECS", &mut self.cooldown.stop_secs);
        Self::apply_env_parse(
            "GS_COOLDOWN_STOP_WATCH_POLL_SECS",
            &mut self.cooldown.stop_watch_poll_secs,
        );
        Self::apply_env_parse(
            "GS_COOLDOWN_STOP_WATCH_TIMEOUT_SECS",
            &mut self.cooldown.stop_watch_timeout_secs,
        );
        Self::apply_env_parse(
            "GS_COOLDOWN_REARM_DELAY_SECS",
            &mut self.cooldown.rearm_delay_secs,
        );

        // Logging
        Self::apply_env_parse("GS_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_string("GS_LOG_DIR", &mut self.logging.dir);
        Self::apply_env_option_string("GS_LOG_FILE", &mut self.logging.file);
        Self::apply_env_bool("GS_LOG_COLORED", &mut self.logging.colored);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }

    /// Helper: Apply environment variable override for whitespace-separated lists
    fn apply_env_list(var_name: &str, target: &mut Vec<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val.split_whitespace().map(String::from).collect();
        }
    }
}

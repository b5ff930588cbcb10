use std::net::SocketAddr;
use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Port {addr} is in use by another application {location}")]
    PortUnavailable {
        addr: SocketAddr,
        location: ErrorLocation,
    },

    #[error("Failed to bind detection socket on {addr}: {source} {location}")]
    SocketBind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Process query for '{pattern}' failed: {message} {location}")]
    ProcessQuery {
        pattern: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Failed to signal process {pid}: {message} {location}")]
    Terminate {
        pid: u32,
        message: String,
        location: ErrorLocation,
    },

    #[error("Control channel command '{command}' failed: {message} {location}")]
    ControlChannel {
        command: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Launch command {path} failed: {message} {location}")]
    Launch {
        path: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid configuration: {source} {location}")]
    Config {
        #[source]
        source: gs_config::ConfigError,
        location: ErrorLocation,
    },

    #[error("JSON error: {source} {location}")]
    Json {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },

    #[error("IO error: {source} {location}")]
    Io {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },
}

impl LifecycleError {
    #[track_caller]
    pub fn port_unavailable(addr: SocketAddr) -> Self {
        Self::PortUnavailable {
            addr,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn process_query<P: Into<String>, M: Into<String>>(pattern: P, message: M) -> Self {
        Self::ProcessQuery {
            pattern: pattern.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn control_channel<C: Into<String>, M: Into<String>>(command: C, message: M) -> Self {
        Self::ControlChannel {
            command: command.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn launch<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Launch {
            path: path.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Whether the next scheduled iteration may succeed without intervention
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ControlChannel { .. } | Self::ProcessQuery { .. } | Self::Io { .. }
        )
    }
}

impl From<std::io::Error> for LifecycleError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<gs_config::ConfigError> for LifecycleError {
    #[track_caller]
    fn from(source: gs_config::ConfigError) -> Self {
        Self::Config {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for LifecycleError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        Self::Json {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type LifecycleResult<T> = std::result::Result<T, LifecycleError>;

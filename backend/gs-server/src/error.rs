use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Config error: {0}")]
    Config(#[from] gs_config::ConfigError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] gs_lifecycle::LifecycleError),

    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Logger error: {message} {location}")]
    Logger {
        message: String,
        location: ErrorLocation,
    },

    #[error("Signal handler error: {source} {location}")]
    Signal {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },
}

impl DaemonError {
    #[track_caller]
    pub fn logger<S: Into<String>>(message: S) -> Self {
        Self::Logger {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn signal(source: std::io::Error) -> Self {
        Self::Signal {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type DaemonResult<T> = std::result::Result<T, DaemonError>;

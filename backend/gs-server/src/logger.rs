use crate::error::{DaemonError, DaemonResult};

use std::path::PathBuf;
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::info;

/// Initialize logger with fern
///
/// # Arguments
/// * `log_level` - Log level filter
/// * `log_file` - Optional path to log file. None = stdout, Some = file output
/// * `colored` - Enable colored output (ignored when logging to file)
pub fn initialize(
    log_level: gs_config::LogLevel,
    log_file: Option<PathBuf>,
    colored: bool,
) -> DaemonResult<()> {
    let level_filter = log_level.0;

    let dispatch = match log_file {
        Some(ref log_path) => {
            if let Some(parent) = log_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| DaemonError::LogFile {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)
                .map_err(|e| DaemonError::LogFile {
                    path: log_path.clone(),
                    source: e,
                })?;

            plain_format(Dispatch::new()).chain(file)
        }
        None if colored => {
            let colors = ColoredLevelConfig::new()
                .trace(Color::Magenta)
                .debug(Color::Blue)
                .info(Color::Green)
                .warn(Color::Yellow)
                .error(Color::Red);

            Dispatch::new()
                .format(move |out, message, record| {
                    out.finish(format_args!(
                        "[{date} - {level}] {message} [{file}:{line}]",
                        date = humantime::format_rfc3339(SystemTime::now()),
                        level = colors.color(record.level()),
                        message = message,
                        file = record.file().unwrap_or("unknown"),
                        line = record.line().unwrap_or(0),
                    ))
                })
                .chain(std::io::stdout())
        }
        // systemd / docker logs
        None => plain_format(Dispatch::new()).chain(std::io::stdout()),
    };

    Dispatch::new()
        .level(level_filter)
        .chain(dispatch)
        .apply()
        .map_err(|e| DaemonError::logger(format!("Failed to initialize logger: {e}")))?;

    match log_file {
        Some(ref path) => info!(
            "Logger initialized: level={:?}, file={}",
            level_filter,
            path.display()
        ),
        None => info!("Logger initialized: level={:?}, stdout", level_filter),
    }

    Ok(())
}

fn plain_format(dispatch: Dispatch) -> Dispatch {
    dispatch.format(|out, message, record| {
        out.finish(format_args!(
            "[{date} - {level}] {message} [{file}:{line}]",
            date = humantime::format_rfc3339(SystemTime::now()),
            level = record.level(),
            message = message,
            file = record.file().unwrap_or("unknown"),
            line = record.line().unwrap_or(0),
        ))
    })
}

//! Command/response channel to the running game server.
//!
//! The wire protocol is not spoken here. [`CommandControlChannel`] shells out
//! to an external client binary and treats its stdout as the response.

use crate::{LifecycleError, LifecycleResult, ServerInfoSnapshot};

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use gs_config::ControlConfig;
use log::debug;
use tokio::process::Command;

pub const SHOW_PLAYERS_COMMAND: &str = "ShowPlayers";
pub const SHUTDOWN_COMMAND: &str = "Shutdown";

#[async_trait]
pub trait ControlChannel: Send + Sync {
    /// Send one command and return the raw textual response.
    async fn execute(&self, command: &str) -> LifecycleResult<String>;

    /// Query occupancy and parse the roster.
    async fn query_players(&self) -> LifecycleResult<ServerInfoSnapshot> {
        let response = self.execute(SHOW_PLAYERS_COMMAND).await?;
        Ok(ServerInfoSnapshot::from_roster(&response))
    }

    /// Ask the server to shut itself down after `delay`, broadcasting `message`.
    async fn shutdown(&self, delay: Duration, message: &str) -> LifecycleResult<String> {
        let command = format!("{} {} {}", SHUTDOWN_COMMAND, whole_seconds(delay), message);
        self.execute(&command).await
    }
}

/// Seconds rounded up, never below one.
fn whole_seconds(delay: Duration) -> u64 {
    delay.as_secs_f64().ceil().max(1.0) as u64
}

/// Control channel backed by an external client program.
#[derive(Debug, Clone)]
pub struct CommandControlChannel {
    client_path: String,
    client_args: Vec<String>,
    host: String,
    port: u16,
    password: String,
    timeout: Duration,
}

impl CommandControlChannel {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            client_path: config.client_path.clone(),
            client_args: config.client_args.clone(),
            host: config.host.clone(),
            port: config.port,
            password: config.password.clone(),
            timeout: config.timeout(),
        }
    }

    /// Client arguments with every placeholder filled in.
    pub fn render_args(&self, command: &str) -> Vec<String> {
        let port = self.port.to_string();
        self.client_args
            .iter()
            .map(|arg| {
                arg.replace("{host}", &self.host)
                    .replace("{port}", &port)
                    .replace("{password}", &self.password)
                    .replace("{command}", command)
            })
            .collect()
    }
}

#[async_trait]
impl ControlChannel for CommandControlChannel {
    async fn execute(&self, command: &str) -> LifecycleResult<String> {
        let child = Command::new(&self.client_path)
            .args(self.render_args(command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                LifecycleError::control_channel(
                    command,
                    format!("cannot run {}: {e}", self.client_path),
                )
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                LifecycleError::control_channel(
                    command,
                    format!(
                        "no response within {}",
                        humantime::format_duration(self.timeout)
                    ),
                )
            })?
            .map_err(|e| LifecycleError::control_channel(command, e.to_string()))?;

        if !output.status.success() {
            return Err(LifecycleError::control_channel(
                command,
                format!(
                    "{} exited with {}: {}",
                    self.client_path,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let response = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("Control channel '{command}' -> {}", response.trim_end());
        Ok(response)
    }
}

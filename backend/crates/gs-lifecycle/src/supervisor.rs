//! OS process queries, termination, and launch.

use crate::{LifecycleError, LifecycleResult};

use std::panic::Location;
use std::process::Stdio;

use async_trait::async_trait;
use error_location::ErrorLocation;
use gs_config::ProcessConfig;
use log::{debug, info, warn};
use tokio::process::Command;

const PROCESS_QUERY_PROGRAM: &str = "pgrep";

/// Abstraction over the game server process so the controller can be driven
/// against a fake in tests.
#[async_trait]
pub trait ProcessSupervisor: Send + Sync {
    /// Whether any process matches the configured name.
    async fn is_running(&self) -> bool;

    /// Signal every matching process to terminate. Returns how many were signalled.
    async fn terminate(&self) -> LifecycleResult<usize>;

    /// Run the launch command and wait for it to return.
    async fn spawn(&self) -> LifecycleResult<()>;
}

/// Supervisor backed by `pgrep -f` and the configured launch script.
#[derive(Debug, Clone)]
pub struct SystemSupervisor {
    process_name: String,
    launch_path: String,
    shell: String,
}

impl SystemSupervisor {
    pub fn new(config: &ProcessConfig) -> Self {
        Self {
            process_name: config.process_name.clone(),
            launch_path: config.launch_path.clone(),
            shell: config.shell.clone(),
        }
    }

    /// PIDs whose full command line matches the process name.
    async fn matching_pids(&self) -> LifecycleResult<Vec<u32>> {
        let output = Command::new(PROCESS_QUERY_PROGRAM)
            .arg("-f")
            .arg(&self.process_name)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| LifecycleError::process_query(&self.process_name, e.to_string()))?;

        // pgrep: 0 = matches, 1 = no match, anything else is a real failure
        match output.status.code() {
            Some(0) => {}
            Some(1) => return Ok(Vec::new()),
            _ => {
                return Err(LifecycleError::process_query(
                    &self.process_name,
                    format!(
                        "{} exited with {}: {}",
                        PROCESS_QUERY_PROGRAM,
                        output.status,
                        String::from_utf8_lossy(&output.stderr).trim()
                    ),
                ));
            }
        }

        let own_pid = std::process::id();
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| line.trim().parse::<u32>().ok())
            .filter(|pid| *pid != own_pid)
            .collect())
    }

    #[cfg(unix)]
    fn signal_terminate(pid: u32) -> LifecycleResult<()> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(|e| LifecycleError::Terminate {
            pid,
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    #[cfg(not(unix))]
    fn signal_terminate(pid: u32) -> LifecycleResult<()> {
        std::process::Command::new("taskkill")
            .args(["/PID", &pid.to_string()])
            .output()
            .map(|_| ())
            .map_err(|e| LifecycleError::Terminate {
                pid,
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

#[async_trait]
impl ProcessSupervisor for SystemSupervisor {
    async fn is_running(&self) -> bool {
        match self.matching_pids().await {
            Ok(pids) => !pids.is_empty(),
            Err(e) => {
                warn!("Treating server as not running: {e}");
                false
            }
        }
    }

    async fn terminate(&self) -> LifecycleResult<usize> {
        let pids = self.matching_pids().await?;

        if pids.is_empty() {
            info!(
                "No process matching '{}' to terminate",
                self.process_name
            );
            return Ok(0);
        }

        let mut signalled = 0;
        for pid in pids {
            match Self::signal_terminate(pid) {
                Ok(()) => {
                    debug!("Sent SIGTERM to {pid}");
                    signalled += 1;
                }
                // Process may have exited between query and signal
                Err(e) => warn!("{e}"),
            }
        }

        info!(
            "Terminated {signalled} process(es) matching '{}'",
            self.process_name
        );
        Ok(signalled)
    }

    async fn spawn(&self) -> LifecycleResult<()> {
        info!("Launching server: {} {}", self.shell, self.launch_path);

        let status = Command::new(&self.shell)
            .arg(&self.launch_path)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| LifecycleError::launch(&self.launch_path, e.to_string()))?;

        if !status.success() {
            return Err(LifecycleError::launch(
                &self.launch_path,
                format!("exited with {status}"),
            ));
        }

        Ok(())
    }
}

//! Wires configuration into the lifecycle engine and runs it until shutdown.

use crate::error::DaemonResult;

use std::sync::Arc;

use gs_config::Config;
use gs_lifecycle::{
    CommandControlChannel, ConnectionSniffer, ControlChannel, ControllerSettings, IdleMonitor,
    LifecycleController, ProcessSupervisor, ServerStatus, ShutdownCoordinator, SystemSupervisor,
};
use log::{error, info, warn};
use tokio::task::JoinHandle;

pub struct Daemon {
    config: Config,
    supervisor: Arc<dyn ProcessSupervisor>,
    sniffer: Arc<ConnectionSniffer>,
    controller: Arc<LifecycleController>,
    idle_monitor: Option<Arc<IdleMonitor>>,
    shutdown: ShutdownCoordinator,
}

impl Daemon {
    /// Daemon backed by the real process table and control client.
    pub fn new(config: Config) -> DaemonResult<Self> {
        let supervisor = Arc::new(SystemSupervisor::new(&config.process));
        let channel = Arc::new(CommandControlChannel::new(&config.control));
        Self::with_collaborators(config, supervisor, channel)
    }

    pub fn with_collaborators(
        config: Config,
        supervisor: Arc<dyn ProcessSupervisor>,
        channel: Arc<dyn ControlChannel>,
    ) -> DaemonResult<Self> {
        let sniffer = Arc::new(ConnectionSniffer::from_config(&config)?);
        let controller = Arc::new(LifecycleController::new(
            ControllerSettings::from_config(&config),
            Arc::clone(&supervisor),
            channel,
            Arc::clone(&sniffer),
        ));
        let idle_monitor = config
            .idle
            .enabled
            .then(|| Arc::new(IdleMonitor::from_config(Arc::clone(&controller), &config.idle)));

        Ok(Self {
            config,
            supervisor,
            sniffer,
            controller,
            idle_monitor,
            shutdown: ShutdownCoordinator::new(),
        })
    }

    pub fn controller(&self) -> &Arc<LifecycleController> {
        &self.controller
    }

    pub fn sniffer(&self) -> &Arc<ConnectionSniffer> {
        &self.sniffer
    }

    pub fn shutdown_coordinator(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    pub fn status(&self) -> ServerStatus {
        ServerStatus::collect(&self.controller, self.idle_monitor.as_deref())
    }

    /// Probe, start the background tasks, and block until shutdown is signalled.
    ///
    /// Returns the final status once every task has been joined.
    pub async fn run(self) -> DaemonResult<ServerStatus> {
        self.controller.probe().await;

        let mut tasks: Vec<(&'static str, JoinHandle<()>)> = Vec::new();

        if self.config.detection.enabled {
            tasks.push((
                "detection",
                tokio::spawn(Arc::clone(&self.sniffer).run(
                    Arc::clone(&self.controller),
                    Arc::clone(&self.supervisor),
                    self.shutdown.subscribe_guard(),
                )),
            ));
        } else {
            info!("Connection detection disabled");
        }

        match self.idle_monitor {
            Some(ref monitor) => tasks.push((
                "idle monitor",
                tokio::spawn(Arc::clone(monitor).run(self.shutdown.subscribe_guard())),
            )),
            None => info!("Idle stop disabled"),
        }

        self.shutdown.subscribe_guard().wait().await;
        info!("Stopping background tasks");

        for (name, task) in tasks {
            if let Err(e) = task.await {
                error!("{name} task failed: {e}");
            }
        }

        self.sniffer.disarm();

        let stop_watch_timeout = self.config.cooldown.stop_watch_timeout();
        if !self.controller.wait_for_stop_watch(stop_watch_timeout).await {
            warn!("Exiting with a stop event still unconfirmed");
        }

        let status = self.status();
        info!("Final status: {}", status.to_json()?);
        Ok(status)
    }
}

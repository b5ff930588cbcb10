//! UDP connection-attempt detector.
//!
//! While the game server is down the sniffer holds its port and watches for
//! the first datagram a real client sends. A match closes the socket so the
//! server binary can take the port over.

use crate::{
    LifecycleController, LifecycleError, LifecycleResult, ProcessSupervisor, ServerState,
    ShutdownGuard, StartOutcome,
};

use std::net::SocketAddr;
use std::panic::Location;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use error_location::ErrorLocation;
use gs_config::Config;
use log::{debug, error, info, warn};
use tokio::net::UdpSocket;
use tokio::sync::Notify;

const MAX_DATAGRAM_SIZE: usize = 1024;

/// How a call to [`ConnectionSniffer::listen`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenOutcome {
    /// A datagram starting with the signature arrived; the socket is closed.
    Detected { peer: SocketAddr },
    /// The listener was closed (or never armed).
    Disarmed,
    /// Shutdown was signalled.
    Shutdown,
}

pub struct ConnectionSniffer {
    bind_addr: SocketAddr,
    signature: Vec<u8>,
    poll_interval: Duration,
    socket: Mutex<Option<Arc<UdpSocket>>>,
    disarmed: Notify,
    arm_requested: Notify,
}

impl ConnectionSniffer {
    pub fn new(bind_addr: SocketAddr, signature: Vec<u8>, poll_interval: Duration) -> Self {
        Self {
            bind_addr,
            signature,
            poll_interval,
            socket: Mutex::new(None),
            disarmed: Notify::new(),
            arm_requested: Notify::new(),
        }
    }

    pub fn from_config(config: &Config) -> LifecycleResult<Self> {
        Ok(Self::new(
            config.server.socket_addr()?,
            config.detection.signature_bytes()?,
            config.detection.poll_interval(),
        ))
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Check whether the port can be bound right now.
    ///
    /// Binds a throw-away socket which is released immediately.
    pub fn is_available(addr: SocketAddr) -> bool {
        std::net::UdpSocket::bind(addr).is_ok()
    }

    /// Bind the detection socket. Replaces any listener already bound.
    pub async fn arm(&self) -> LifecycleResult<()> {
        if self.disarm() {
            debug!("Replacing existing detection listener on {}", self.bind_addr);
        }

        if !Self::is_available(self.bind_addr) {
            return Err(LifecycleError::port_unavailable(self.bind_addr));
        }

        let socket = UdpSocket::bind(self.bind_addr)
            .await
            .map_err(|e| LifecycleError::SocketBind {
                addr: self.bind_addr,
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(
            "Listening for connection attempts on {}",
            socket.local_addr().unwrap_or(self.bind_addr)
        );
        *self.lock_socket() = Some(Arc::new(socket));
        Ok(())
    }

    /// Close the detection socket. Returns whether a listener was open.
    pub fn disarm(&self) -> bool {
        let previous = self.lock_socket().take();
        match previous {
            Some(_) => {
                self.disarmed.notify_waiters();
                info!("Closed detection listener on {}", self.bind_addr);
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.lock_socket().is_some()
    }

    /// Ask the detection task to arm again on its next round.
    pub fn request_arm(&self) {
        self.arm_requested.notify_one();
    }

    /// Wait for datagrams until one matches the signature.
    pub async fn listen(&self, shutdown: &mut ShutdownGuard) -> ListenOutcome {
        let Some(socket) = self.current_socket() else {
            return ListenOutcome::Disarmed;
        };
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];

        loop {
            let disarmed = self.disarmed.notified();
            tokio::pin!(disarmed);
            disarmed.as_mut().enable();

            // Replaced or closed between iterations
            if !self.holds(&socket) {
                return ListenOutcome::Disarmed;
            }

            tokio::select! {
                _ = shutdown.wait() => return ListenOutcome::Shutdown,
                _ = &mut disarmed => return ListenOutcome::Disarmed,
                received = tokio::time::timeout(self.poll_interval, socket.recv_from(&mut buf)) => {
                    match received {
                        Err(_) => continue,
                        Ok(Err(e)) => {
                            error!("Detection socket receive error: {e}");
                        }
                        Ok(Ok((len, peer))) => {
                            let data = &buf[..len];
                            if data.starts_with(&self.signature) {
                                info!("Connection attempt detected from {peer}: {}", to_hex(data));
                                drop(socket);
                                self.disarm();
                                return ListenOutcome::Detected { peer };
                            }
                            info!("Ignored datagram from {peer}: {}", to_hex(data));
                        }
                    }
                }
            }
        }
    }

    /// Long-lived detection task.
    pub async fn run(
        self: Arc<Self>,
        controller: Arc<LifecycleController>,
        supervisor: Arc<dyn ProcessSupervisor>,
        mut shutdown: ShutdownGuard,
    ) {
        info!("Detection task started");

        loop {
            if shutdown.poll_shutdown() {
                break;
            }

            // The listener only binds while the server is fully stopped
            let state = controller.state();
            if state != ServerState::Stopped || supervisor.is_running().await {
                debug!("Server is {state}, detection stays disarmed");
                if !self.wait_for_arm_request(&mut shutdown).await {
                    break;
                }
                continue;
            }

            if let Err(e) = self.arm().await {
                error!("Cannot arm detection: {e}");
                if !self.wait_for_arm_request(&mut shutdown).await {
                    break;
                }
                continue;
            }

            match self.listen(&mut shutdown).await {
                ListenOutcome::Shutdown => break,
                ListenOutcome::Disarmed => {
                    if !self.wait_for_arm_request(&mut shutdown).await {
                        break;
                    }
                }
                ListenOutcome::Detected { .. } => {
                    let outcome = controller.request_start().await;
                    if !matches!(outcome, StartOutcome::Started)
                        && !supervisor.is_running().await
                    {
                        warn!("Server did not start ({outcome}), resuming detection");
                        continue;
                    }
                    if !self.wait_for_arm_request(&mut shutdown).await {
                        break;
                    }
                }
            }
        }

        self.disarm();
        info!("Detection task stopped");
    }

    /// Returns false when shutdown arrived first.
    async fn wait_for_arm_request(&self, shutdown: &mut ShutdownGuard) -> bool {
        tokio::select! {
            _ = shutdown.wait() => false,
            _ = self.arm_requested.notified() => true,
        }
    }

    fn current_socket(&self) -> Option<Arc<UdpSocket>> {
        self.lock_socket().clone()
    }

    fn holds(&self, socket: &Arc<UdpSocket>) -> bool {
        self.lock_socket()
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, socket))
    }

    fn lock_socket(&self) -> MutexGuard<'_, Option<Arc<UdpSocket>>> {
        self.socket.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Space separated upper-case hex, e.g. `00 1A FF`.
pub fn to_hex(data: &[u8]) -> String {
    data.iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

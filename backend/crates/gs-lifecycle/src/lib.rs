//! On-demand lifecycle engine for a single game server process.
//!
//! A [`ConnectionSniffer`] holds the server's UDP port while it is down and
//! asks the [`LifecycleController`] to start the server when a client knocks.
//! An [`IdleMonitor`] polls occupancy over the [`ControlChannel`] and asks the
//! controller to stop the server once it has been empty for long enough.

pub mod control_channel;
pub mod controller;
pub mod cooldown;
pub mod error;
pub mod idle_monitor;
pub mod idle_timer;
pub mod server_info;
pub mod server_state;
pub mod server_status;
pub mod shutdown_coordinator;
pub mod shutdown_guard;
pub mod sniffer;
pub mod stop_watch;
pub mod supervisor;

pub use control_channel::{CommandControlChannel, ControlChannel, SHOW_PLAYERS_COMMAND};
pub use controller::{
    ControllerSettings, LifecycleController, Rejection, StartOutcome, StopOutcome,
};
pub use cooldown::CooldownWindows;
pub use error::{LifecycleError, LifecycleResult};
pub use idle_monitor::{IdleMonitor, TickOutcome};
pub use idle_timer::IdleTimer;
pub use server_info::{PlayerInfo, ServerInfoSnapshot};
pub use server_state::ServerState;
pub use server_status::ServerStatus;
pub use shutdown_coordinator::ShutdownCoordinator;
pub use shutdown_guard::ShutdownGuard;
pub use sniffer::{ConnectionSniffer, ListenOutcome};
pub use stop_watch::StopWatch;
pub use supervisor::{ProcessSupervisor, SystemSupervisor};

#[cfg(test)]
mod tests;

pub mod daemon;
pub mod error;
pub mod logger;

pub use daemon::Daemon;
pub use error::{DaemonError, DaemonResult};

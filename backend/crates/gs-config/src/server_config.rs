use crate::{ConfigError, ConfigErrorResult, DEFAULT_SERVER_IP, DEFAULT_SERVER_PORT};

use std::net::{IpAddr, SocketAddr};

use serde::Deserialize;

/// Address the game server listens on for client traffic.
///
/// The detection socket binds here while the server is down.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: String::from(DEFAULT_SERVER_IP),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.port == 0 {
            return Err(ConfigError::config(
                "server.port must be the game server's fixed port, got 0",
            ));
        }

        self.socket_addr()?;

        Ok(())
    }

    /// Parsed (ip, port) pair for the detection socket.
    pub fn socket_addr(&self) -> ConfigErrorResult<SocketAddr> {
        let ip: IpAddr = self.ip.parse().map_err(|e| {
            ConfigError::config(format!("server.ip '{}' is not an IP address: {e}", self.ip))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

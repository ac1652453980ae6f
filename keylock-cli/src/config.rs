use std::net::SocketAddr;

use keylock_core::{Error, Result};

/// Where `keylock serve` listens.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
}

impl ServeConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Validates and resolves the listen address.
    pub async fn listen_addr(&self) -> Result<SocketAddr> {
        if self.port == 0 {
            return Err(Error::Config("port must be in the range 1-65535".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }

        let mut addrs = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| Error::Config(format!("cannot resolve '{}': {}", self.host, e)))?;

        addrs
            .next()
            .ok_or_else(|| Error::Config(format!("'{}' resolved to no address", self.host)))
    }
}

//! Crate for configuring the proxy connection.
//!
//! The service manager address is the only setting. Handshake version and language are fixed.

use ee_ipc::IpcAddress;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Socket the service manager listens on unless configured otherwise.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/ee.socket";

/// Environment variable overriding the configured address.
pub const ADDRESS_ENV: &str = "EE_PROXY_ADDRESS";

/// Connection settings for the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Where to reach the service manager.
    pub address: IpcAddress,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self { address: IpcAddress::Unix(PathBuf::from(DEFAULT_SOCKET_PATH)) }
    }
}

impl ProxyConfig {
    /// Load from a YAML file, then apply [ADDRESS_ENV].
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_yaml(&contents)
            .wrap_err_with(|| format!("failed to parse config {}", path.display()))?;
        config.with_address_override(std::env::var(ADDRESS_ENV).ok())
    }

    /// Defaults with [ADDRESS_ENV] applied.
    pub fn from_env() -> eyre::Result<Self> {
        Self::default().with_address_override(std::env::var(ADDRESS_ENV).ok())
    }

    /// Parse YAML without consulting the environment.
    pub fn from_yaml(contents: &str) -> eyre::Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Replace the address when `address` is set.
    pub fn with_address_override(mut self, address: Option<String>) -> eyre::Result<Self> {
        if let Some(address) = address {
            self.address =
                address.parse().wrap_err_with(|| format!("invalid {ADDRESS_ENV} value"))?;
            debug!(target: "ee::config", address = %self.address, "address overridden");
        }
        Ok(self)
    }
}

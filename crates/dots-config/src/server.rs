//! Server process configuration (spec §6, §4.7): listen address, DTLS
//! identity, blocker registry, and the lifetime-manager tick interval.
//! Loading the file, bootstrapping the logger, and choosing a persistence
//! engine remain out of scope (spec §1); only the typed surface ships.

use crate::blocker::BlockerRegistryConfig;
use crate::tls::DtlsConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Top-level server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// `host:port` the signal-channel CoAP/DTLS listener binds to.
    pub listen_address: String,
    /// DTLS identity and peer-verification settings.
    pub dtls: DtlsConfig,
    /// How often the lifetime manager (C7) ticks.
    #[serde(with = "humantime_serde", default = "default_lifetime_tick_interval")]
    pub lifetime_tick_interval: Duration,
    /// Lifetime, in seconds, assigned to a scope when it enters
    /// `ActiveButTerminating` after a client DELETE (spec §4.5).
    #[serde(default = "default_terminating_period_lifetime")]
    pub terminating_period_lifetime: u32,
    /// Per-customer blocker registry (spec §4.9).
    #[serde(default)]
    pub blockers: BlockerRegistryConfig,
    /// Unix domain socket path the admin/CLI surface binds to, if any.
    #[serde(default)]
    pub admin_socket_path: Option<std::path::PathBuf>,
    /// `cuid` -> `customer_id` directory, standing in for the peer
    /// identity a real DTLS handshake would authenticate (spec §1's
    /// external collaborator).
    #[serde(default)]
    pub customers: HashMap<String, i64>,
}

fn default_lifetime_tick_interval() -> Duration {
    Duration::from_secs(10)
}

const fn default_terminating_period_lifetime() -> u32 {
    120
}

impl ServerConfig {
    /// Loads a [`ServerConfig`] from a YAML reader.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, crate::error::ConfigError> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Loads a [`ServerConfig`] from a YAML file at `path`.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| crate::error::ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::PeerAuthMode;

    #[test]
    fn parses_minimal_yaml() {
        let yaml = r#"
listen_address: "0.0.0.0:4646"
dtls:
  peer_auth_mode: mutual-cert
"#;
        let cfg = ServerConfig::from_reader(yaml.as_bytes()).unwrap();
        assert_eq!(cfg.listen_address, "0.0.0.0:4646");
        assert_eq!(cfg.dtls.peer_auth_mode, PeerAuthMode::MutualCert);
        assert_eq!(cfg.lifetime_tick_interval, Duration::from_secs(10));
        assert_eq!(cfg.terminating_period_lifetime, 120);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ServerConfig::from_path("/nonexistent/dots-server.yaml").unwrap_err();
        assert!(matches!(err, crate::error::ConfigError::Read { .. }));
    }
}

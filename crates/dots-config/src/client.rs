//! Client process configuration (spec §4.8, §6): the server to dial, this
//! endpoint's DTLS identity, the bootstrap session timing, and the local
//! CLI socket path.

use crate::tls::DtlsConfig;
use dots_model::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// `host:port` of the DOTS server's signal channel.
    pub server_address: String,
    /// DTLS identity and peer-verification settings.
    pub dtls: DtlsConfig,
    /// This client's `cuid`, presented on every request (spec §3).
    pub cuid: String,
    /// Bootstrap session timing, overridden once `loadConfig` runs against
    /// the server (spec §4.8 "Session replacement").
    #[serde(default = "SessionConfig::defaults")]
    pub session: SessionConfig,
    /// Unix domain socket path the local CLI HTTP surface binds to
    /// (spec §4.8 "Local CLI socket").
    pub cli_socket_path: PathBuf,
}

impl ClientConfig {
    /// Loads a [`ClientConfig`] from a YAML reader.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, crate::error::ConfigError> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Loads a [`ClientConfig`] from a YAML file at `path`.
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
    fn parses_minimal_yaml_with_default_session() {
        let yaml = r#"
server_address: "dots.example.com:4646"
cuid: "client01"
cli_socket_path: "/run/dots-client.sock"
dtls:
  peer_auth_mode: mutual-cert
"#;
        let cfg = ClientConfig::from_reader(yaml.as_bytes()).unwrap();
        assert_eq!(cfg.cuid, "client01");
        assert_eq!(cfg.dtls.peer_auth_mode, PeerAuthMode::MutualCert);
        assert_eq!(cfg.session.idle.heartbeat_interval, 30);
    }
}

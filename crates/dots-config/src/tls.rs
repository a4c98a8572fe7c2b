//! DTLS identity configuration (spec §6 "DTLS"): mutual cert or PSK, with
//! an optional pinned-certificate allowlist. The concrete DTLS stack is out
//! of scope (spec §1); this module carries the typed config surface only,
//! the way the teacher's `config/src/tls.rs` carries cert paths without
//! implementing a TLS stack itself.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Peer authentication mode for a DTLS association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeerAuthMode {
    /// Mutual X.509 certificate authentication; the peer Common Name
    /// becomes the tenancy key (spec §3 "Customer").
    MutualCert,
    /// Pre-shared key authentication.
    Psk,
}

/// DTLS configuration shared by server and client (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DtlsConfig {
    /// How peers authenticate.
    pub peer_auth_mode: PeerAuthMode,
    /// Path to this endpoint's certificate.
    #[serde(default)]
    pub cert_file: Option<PathBuf>,
    /// Path to this endpoint's private key.
    #[serde(default)]
    pub key_file: Option<PathBuf>,
    /// Path to the CA bundle used to verify the peer's certificate.
    #[serde(default)]
    pub ca_file: Option<PathBuf>,
    /// PSK identity hint, used only when `peer_auth_mode` is `psk`.
    #[serde(default)]
    pub psk_identity_hint: Option<String>,
    /// Optional allowlist of pinned peer certificate fingerprints
    /// (hex-encoded SHA-256), rejecting any peer cert not on the list even
    /// if it chains to a trusted CA.
    #[serde(default)]
    pub pinned_cert_fingerprints: Vec<String>,
}

impl DtlsConfig {
    /// Returns `true` if `fingerprint` is acceptable: either no pinning is
    /// configured, or it appears in the allowlist.
    #[must_use]
    pub fn accepts_fingerprint(&self, fingerprint: &str) -> bool {
        self.pinned_cert_fingerprints.is_empty()
            || self
                .pinned_cert_fingerprints
                .iter()
                .any(|f| f.eq_ignore_ascii_case(fingerprint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pin_list_accepts_anything() {
        let cfg = DtlsConfig {
            peer_auth_mode: PeerAuthMode::MutualCert,
            cert_file: None,
            key_file: None,
            ca_file: None,
            psk_identity_hint: None,
            pinned_cert_fingerprints: vec![],
        };
        assert!(cfg.accepts_fingerprint("anything"));
    }

    #[test]
    fn pinned_list_is_case_insensitive() {
        let cfg = DtlsConfig {
            peer_auth_mode: PeerAuthMode::MutualCert,
            cert_file: None,
            key_file: None,
            ca_file: None,
            psk_identity_hint: None,
            pinned_cert_fingerprints: vec!["AB:CD:EF".into()],
        };
        assert!(cfg.accepts_fingerprint("ab:cd:ef"));
        assert!(!cfg.accepts_fingerprint("ff:ff:ff"));
    }
}

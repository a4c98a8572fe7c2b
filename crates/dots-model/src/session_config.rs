use crate::decimal::Decimal2;
use serde::{Deserialize, Serialize};

/// One timing profile (either the `mitigating` or `idle` variant, spec §3
/// "SessionConfig").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionTiming {
    /// Seconds between client heartbeats.
    pub heartbeat_interval: u32,
    /// Consecutive missed heartbeats before the session is declared lost.
    pub missing_hb_allowed: u16,
    /// CoAP `max_retransmit`.
    pub max_retransmit: u16,
    /// CoAP `ack_timeout`, in seconds.
    pub ack_timeout: Decimal2,
    /// CoAP `ack_random_factor`.
    pub ack_random_factor: Decimal2,
    /// Maximum CBOR payload size, in bytes, before block-wise kicks in.
    pub max_payload: u32,
    /// Q-Block2 `non_max_retransmit`.
    pub non_max_retransmit: u16,
    /// Q-Block2 `non_timeout`, in seconds.
    pub non_timeout: Decimal2,
    /// Q-Block2 `non_receive_timeout`, in seconds.
    pub non_receive_timeout: Decimal2,
    /// Q-Block2 `non_probing_wait`, in seconds.
    pub non_probing_wait: Decimal2,
    /// Q-Block2 `non_partial_wait`, in seconds.
    pub non_partial_wait: Decimal2,
}

impl SessionTiming {
    /// The defaults the original client bootstraps with
    /// (`dots_client/task/heartbeat.go`, `dots_client/main.go`), used both
    /// as the client's own startup configuration and as the server's
    /// fallback before a client ever PUTs `/config` (SPEC_FULL.md §C.3).
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            heartbeat_interval: 30,
            missing_hb_allowed: 5,
            max_retransmit: 3,
            ack_timeout: Decimal2::from_hundredths(200),
            ack_random_factor: Decimal2::from_hundredths(150),
            max_payload: 1400,
            non_max_retransmit: 3,
            non_timeout: Decimal2::from_hundredths(200),
            non_receive_timeout: Decimal2::from_hundredths(200),
            non_probing_wait: Decimal2::from_hundredths(6000),
            non_partial_wait: Decimal2::from_hundredths(6000),
        }
    }
}

/// Per-customer (and optionally per-session) signal session configuration:
/// distinct timing profiles for while a mitigation is active (`mitigating`)
/// and otherwise (`idle`) (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Timing while at least one mitigation is active.
    pub mitigating: SessionTiming,
    /// Timing while idle.
    pub idle: SessionTiming,
}

impl SessionConfig {
    /// The bootstrap configuration before any client PUT, identical
    /// defaults in both `mitigating` and `idle` profiles.
    #[must_use]
    pub fn defaults() -> Self {
        let timing = SessionTiming::defaults();
        Self {
            mitigating: timing,
            idle: timing,
        }
    }

    /// Applies a PUT's partial override: `patch.mitigating`/`patch.idle` are
    /// full replacements when present (CBOR PUT bodies for config are
    /// whole-profile, per the original's session-config DAO), else the
    /// corresponding profile is left unchanged.
    #[must_use]
    pub fn merged(self, patch_mitigating: Option<SessionTiming>, patch_idle: Option<SessionTiming>) -> Self {
        Self {
            mitigating: patch_mitigating.unwrap_or(self.mitigating),
            idle: patch_idle.unwrap_or(self.idle),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

//! Per-client `SessionConfig` storage (spec §3, §4.8 "loadConfig"): the
//! server's fallback before a client ever PUTs `/config` is
//! [`dots_model::SessionConfig::defaults`]; a successful PUT replaces the
//! stored profile via [`dots_model::SessionConfig::merged`]. Grounded on
//! `dots-telemetry`'s per-client `parking_lot`-guarded table shape
//! (`TelemetrySetupStore`), since no richer store exists for this resource.

use dots_model::{SessionConfig, SessionTiming};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    customer_id: i64,
    cuid: String,
}

/// In-memory store of each client's negotiated [`SessionConfig`].
#[derive(Default)]
pub struct SessionConfigStore {
    rows: RwLock<HashMap<Key, SessionConfig>>,
}

impl SessionConfigStore {
    /// Builds an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the client's configuration, falling back to the bootstrap
    /// defaults if it has never PUT one.
    #[must_use]
    pub fn get(&self, customer_id: i64, cuid: &str) -> SessionConfig {
        let key = Key { customer_id, cuid: cuid.to_string() };
        self.rows.read().get(&key).copied().unwrap_or_else(SessionConfig::defaults)
    }

    /// Whether this client has ever PUT a configuration override, used by
    /// the dispatcher to report `2.01 Created` vs `2.04 Changed` (spec §6).
    #[must_use]
    pub fn contains(&self, customer_id: i64, cuid: &str) -> bool {
        let key = Key { customer_id, cuid: cuid.to_string() };
        self.rows.read().contains_key(&key)
    }

    /// Merges a PUT's partial override into the stored configuration.
    pub fn merge(
        &self,
        customer_id: i64,
        cuid: &str,
        patch_mitigating: Option<SessionTiming>,
        patch_idle: Option<SessionTiming>,
    ) -> SessionConfig {
        let key = Key { customer_id, cuid: cuid.to_string() };
        let mut rows = self.rows.write();
        let current = rows.get(&key).copied().unwrap_or_else(SessionConfig::defaults);
        let merged = current.merged(patch_mitigating, patch_idle);
        rows.insert(key, merged);
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_client_gets_bootstrap_defaults() {
        let store = SessionConfigStore::new();
        assert_eq!(store.get(7, "c1"), SessionConfig::defaults());
    }

    #[test]
    fn merge_replaces_only_the_given_profile() {
        let store = SessionConfigStore::new();
        let mut idle = SessionTiming::defaults();
        idle.heartbeat_interval = 60;
        let merged = store.merge(7, "c1", None, Some(idle));
        assert_eq!(merged.idle.heartbeat_interval, 60);
        assert_eq!(merged.mitigating, SessionTiming::defaults());
        assert_eq!(store.get(7, "c1").idle.heartbeat_interval, 60);
    }
}

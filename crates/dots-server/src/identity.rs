//! Peer identity resolution: maps an authenticated `cuid` to the tenant
//! `customer_id` the mitigation/telemetry engines key their state by.
//!
//! Resolving a `cuid` to a customer is, on the real signal channel,
//! produced by the DTLS handshake (the peer certificate or PSK identity);
//! that handshake is an external collaborator this workspace does not
//! implement (spec §1), so this module defines the same narrow trait seam
//! `dots-lifetime::DataChannelLifetimeSource` and `dots-client::ClientSession`
//! already use for their own external collaborators, plus an in-memory
//! table the binaries populate from [`dots_config::ServerConfig`].

use std::collections::HashMap;
use std::sync::RwLock;

/// Resolves an authenticated `cuid` to its owning customer.
pub trait PeerIdentity: Send + Sync {
    /// Returns the customer id associated with `cuid`, if known.
    fn resolve(&self, cuid: &str) -> Option<i64>;
}

/// A fixed `cuid` -> `customer_id` table, populated once at startup.
#[derive(Debug, Default)]
pub struct StaticIdentityTable {
    by_cuid: RwLock<HashMap<String, i64>>,
}

impl StaticIdentityTable {
    /// Builds a table from a `(cuid, customer_id)` list.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (String, i64)>) -> Self {
        Self { by_cuid: RwLock::new(entries.into_iter().collect()) }
    }

    /// Registers or overwrites one `cuid`'s customer.
    pub fn insert(&self, cuid: impl Into<String>, customer_id: i64) {
        self.by_cuid.write().unwrap().insert(cuid.into(), customer_id);
    }
}

impl PeerIdentity for StaticIdentityTable {
    fn resolve(&self, cuid: &str) -> Option<i64> {
        self.by_cuid.read().unwrap().get(cuid).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_cuid_resolves_to_none() {
        let table = StaticIdentityTable::default();
        assert_eq!(table.resolve("ghost"), None);
    }

    #[test]
    fn inserted_cuid_resolves() {
        let table = StaticIdentityTable::default();
        table.insert("client01", 7);
        assert_eq!(table.resolve("client01"), Some(7));
    }
}

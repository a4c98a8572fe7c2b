//! Data-channel alias/ACL expiry pruning (C7, spec §4.7 step 3). The alias
//! and ACL resources themselves are an external collaborator (spec §1:
//! "Data channel... consumed only to look up aliases and to drive
//! activate-when-mitigating ACLs"), so this module defines only the seam
//! the lifetime task prunes through, plus an in-memory default for running
//! the tick standalone and in tests.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

/// One data-channel resource (alias or ACL) identified for the lifetime
/// task's benefit; full alias/ACL content is the data channel's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChannelResource {
    pub customer_id: i64,
    pub cuid: String,
    pub name: String,
}

/// Storage seam for data-channel aliases and ACLs: the lifetime task only
/// needs to ask "what has crossed its own `valid-through` as of `now`" and
/// have it removed (spec §4.7 step 3); CRUD of the resources themselves is
/// out of scope (spec §1).
pub trait DataChannelLifetimeSource: Send + Sync {
    /// Removes and returns every alias whose `valid-through` has elapsed.
    fn prune_expired_aliases(&self, now: DateTime<Utc>) -> Vec<DataChannelResource>;

    /// Removes and returns every ACL whose `valid-through` has elapsed.
    fn prune_expired_acls(&self, now: DateTime<Utc>) -> Vec<DataChannelResource>;
}

#[derive(Debug, Clone)]
struct Entry {
    resource: DataChannelResource,
    valid_through: DateTime<Utc>,
}

/// A process-local, lock-protected [`DataChannelLifetimeSource`].
#[derive(Default)]
pub struct InMemoryDataChannelStore {
    aliases: RwLock<HashMap<String, Entry>>,
    acls: RwLock<HashMap<String, Entry>>,
}

impl InMemoryDataChannelStore {
    /// Builds an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or refreshes) an alias's `valid-through`.
    pub fn put_alias(&self, customer_id: i64, cuid: &str, name: &str, valid_through: DateTime<Utc>) {
        self.aliases.write().insert(
            name.to_string(),
            Entry {
                resource: DataChannelResource { customer_id, cuid: cuid.to_string(), name: name.to_string() },
                valid_through,
            },
        );
    }

    /// Records (or refreshes) an ACL's `valid-through`.
    pub fn put_acl(&self, customer_id: i64, cuid: &str, name: &str, valid_through: DateTime<Utc>) {
        self.acls.write().insert(
            name.to_string(),
            Entry {
                resource: DataChannelResource { customer_id, cuid: cuid.to_string(), name: name.to_string() },
                valid_through,
            },
        );
    }
}

impl DataChannelLifetimeSource for InMemoryDataChannelStore {
    fn prune_expired_aliases(&self, now: DateTime<Utc>) -> Vec<DataChannelResource> {
        prune(&self.aliases, now)
    }

    fn prune_expired_acls(&self, now: DateTime<Utc>) -> Vec<DataChannelResource> {
        prune(&self.acls, now)
    }
}

fn prune(table: &RwLock<HashMap<String, Entry>>, now: DateTime<Utc>) -> Vec<DataChannelResource> {
    let mut table = table.write();
    let expired: Vec<String> =
        table.iter().filter(|(_, entry)| entry.valid_through <= now).map(|(k, _)| k.clone()).collect();
    expired.into_iter().filter_map(|k| table.remove(&k).map(|e| e.resource)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expired_alias_is_pruned() {
        let store = InMemoryDataChannelStore::new();
        let now = Utc::now();
        store.put_alias(1, "c1", "a1", now - Duration::seconds(1));
        let pruned = store.prune_expired_aliases(now);
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].name, "a1");
    }

    #[test]
    fn unexpired_alias_is_kept() {
        let store = InMemoryDataChannelStore::new();
        let now = Utc::now();
        store.put_alias(1, "c1", "a1", now + Duration::seconds(60));
        assert!(store.prune_expired_aliases(now).is_empty());
    }

    #[test]
    fn acls_and_aliases_are_tracked_separately() {
        let store = InMemoryDataChannelStore::new();
        let now = Utc::now();
        store.put_alias(1, "c1", "shared-name", now - Duration::seconds(1));
        store.put_acl(1, "c1", "shared-name", now + Duration::seconds(60));
        assert_eq!(store.prune_expired_aliases(now).len(), 1);
        assert!(store.prune_expired_acls(now).is_empty());
    }
}

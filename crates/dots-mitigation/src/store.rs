//! The mitigation scope store (spec §5 "Shared resources": "the active-
//! mitigation map... Writers use transactional updates... that must leave
//! the in-memory mirror consistent with persisted state; readers may use
//! a snapshot"). [`MitigationStore`] is the seam a real relational-table
//! implementation (spec §6 "Persisted state": `mitigation_scope`, `prefix`,
//! `port_range`, ...) would sit behind; [`InMemoryMitigationStore`] is the
//! snapshot-consistent in-memory default, matching SPEC_FULL.md's note
//! that persistence engine choice is out of scope (spec §1) but the
//! storage trait ships.

use dots_model::MitigationScope;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// The `(customer_id, cuid, mid)` triple keying one mitigation scope's
/// history (spec §3 "MitigationScope").
pub type ScopeKey = (i64, String, u32);

/// Storage seam for mitigation scopes (spec §6). Implementations must keep
/// reads snapshot-consistent with the latest committed write (spec §5).
pub trait MitigationStore: Send + Sync {
    /// Allocates a fresh, process-unique `scope_id`.
    fn allocate_scope_id(&self) -> u64;

    /// Returns the latest record for `(customer_id, cuid, mid)`, regardless
    /// of status.
    fn get_by_key(&self, customer_id: i64, cuid: &str, mid: u32) -> Option<MitigationScope>;

    /// Returns the latest record for `(customer_id, cuid, mid)` only if it
    /// is currently active (spec §3 `MitigationScope::is_active`).
    fn get_active(&self, customer_id: i64, cuid: &str, mid: u32) -> Option<MitigationScope> {
        self.get_by_key(customer_id, cuid, mid).filter(MitigationScope::is_active)
    }

    /// Returns the latest record of every `mid` ever created for
    /// `(customer_id, cuid)`, active or not.
    fn list_for_client(&self, customer_id: i64, cuid: &str) -> Vec<MitigationScope>;

    /// Returns every active scope across every customer and client (spec
    /// §4.5 step 6's "against every other active scope (any cuid, any
    /// customer)").
    fn list_all_active(&self) -> Vec<MitigationScope>;

    /// Returns every scope currently stored, any status (spec §4.7's
    /// lifetime sweep).
    fn list_all(&self) -> Vec<MitigationScope>;

    /// Inserts or replaces a scope, keyed by its `scope_id`.
    fn put(&self, scope: MitigationScope);

    /// Permanently removes a scope (spec §4.5 Delete: "purges").
    fn delete(&self, scope_id: u64);
}

/// A process-local, lock-protected [`MitigationStore`].
#[derive(Default)]
pub struct InMemoryMitigationStore {
    scopes: RwLock<HashMap<u64, MitigationScope>>,
    keys: RwLock<HashMap<ScopeKey, u64>>,
    next_id: AtomicU64,
}

impl InMemoryMitigationStore {
    /// Builds an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MitigationStore for InMemoryMitigationStore {
    fn allocate_scope_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn get_by_key(&self, customer_id: i64, cuid: &str, mid: u32) -> Option<MitigationScope> {
        let key = (customer_id, cuid.to_string(), mid);
        let scope_id = *self.keys.read().get(&key)?;
        self.scopes.read().get(&scope_id).cloned()
    }

    fn list_for_client(&self, customer_id: i64, cuid: &str) -> Vec<MitigationScope> {
        let keys = self.keys.read();
        let scopes = self.scopes.read();
        keys.iter()
            .filter(|((c, u, _), _)| *c == customer_id && u == cuid)
            .filter_map(|(_, scope_id)| scopes.get(scope_id).cloned())
            .collect()
    }

    fn list_all_active(&self) -> Vec<MitigationScope> {
        self.scopes.read().values().filter(|s| s.is_active()).cloned().collect()
    }

    fn list_all(&self) -> Vec<MitigationScope> {
        self.scopes.read().values().cloned().collect()
    }

    fn put(&self, scope: MitigationScope) {
        let key = (scope.customer_id, scope.cuid.clone(), scope.mid);
        let scope_id = scope.scope_id;
        self.keys.write().insert(key, scope_id);
        self.scopes.write().insert(scope_id, scope);
    }

    fn delete(&self, scope_id: u64) {
        let removed = self.scopes.write().remove(&scope_id);
        if let Some(scope) = removed {
            let key = (scope.customer_id, scope.cuid, scope.mid);
            let mut keys = self.keys.write();
            if keys.get(&key) == Some(&scope_id) {
                keys.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dots_model::scope::MitigationStatus;
    use dots_model::Target;

    fn scope(customer_id: i64, cuid: &str, mid: u32, scope_id: u64, status: MitigationStatus) -> MitigationScope {
        MitigationScope {
            customer_id,
            cuid: cuid.into(),
            mid,
            scope_id,
            target: Target::default(),
            lifetime: 3600,
            trigger_mitigation: true,
            status,
            attack_status: None,
            acl_list: None,
            last_modified: chrono::Utc::now(),
        }
    }

    #[test]
    fn put_then_get_by_key_round_trips() {
        let store = InMemoryMitigationStore::new();
        store.put(scope(1, "c1", 1, 100, MitigationStatus::InProgress));
        let found = store.get_by_key(1, "c1", 1).unwrap();
        assert_eq!(found.scope_id, 100);
    }

    #[test]
    fn get_active_filters_inactive_statuses() {
        let store = InMemoryMitigationStore::new();
        store.put(scope(1, "c1", 1, 100, MitigationStatus::Withdrawn));
        assert!(store.get_active(1, "c1", 1).is_none());
        assert!(store.get_by_key(1, "c1", 1).is_some());
    }

    #[test]
    fn list_all_active_spans_customers() {
        let store = InMemoryMitigationStore::new();
        store.put(scope(1, "c1", 1, 100, MitigationStatus::InProgress));
        store.put(scope(2, "c2", 1, 101, MitigationStatus::SuccessfullyMitigated));
        store.put(scope(2, "c2", 2, 102, MitigationStatus::Withdrawn));
        assert_eq!(store.list_all_active().len(), 2);
    }

    #[test]
    fn delete_removes_key_index_too() {
        let store = InMemoryMitigationStore::new();
        store.put(scope(1, "c1", 1, 100, MitigationStatus::InProgress));
        store.delete(100);
        assert!(store.get_by_key(1, "c1", 1).is_none());
        assert!(store.list_all().is_empty());
    }
}

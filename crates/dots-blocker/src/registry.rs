//! The per-scope in-flight [`Protection`] registry (spec §3 "Protection"
//! ownership: "a blocker owns its Protections") and the blocker
//! [`SelectionService`] (spec §4.9).

use crate::capability::Blocker;
use crate::error::BlockerError;
use dots_config::{BlockerConfig, BlockerRegistryConfig};
use dots_model::{Protection, ProtectionTargetType};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Tracks the [`Protection`] handles registered for each mitigation scope
/// (keyed by `scope_id`), so the engine can stop/unregister them on
/// override, delete, or rollback, and can fence `SuccessfullyMitigated` on
/// every protection reaching `is_enabled` (SPEC_FULL.md §D).
#[derive(Debug, Default)]
pub struct ProtectionRegistry {
    by_scope: Mutex<HashMap<u64, Vec<Protection>>>,
}

impl ProtectionRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly registered protection for `scope_id`.
    pub fn insert(&self, scope_id: u64, protection: Protection) {
        self.by_scope.lock().entry(scope_id).or_default().push(protection);
    }

    /// Returns a snapshot of the protections registered for `scope_id`.
    #[must_use]
    pub fn list(&self, scope_id: u64) -> Vec<Protection> {
        self.by_scope.lock().get(&scope_id).cloned().unwrap_or_default()
    }

    /// Removes and returns every protection registered for `scope_id`
    /// (used when a scope is overridden, deleted, or rolled back).
    pub fn take_all(&self, scope_id: u64) -> Vec<Protection> {
        self.by_scope.lock().remove(&scope_id).unwrap_or_default()
    }

    /// Mutates the protection matching `target_id` under `scope_id` in
    /// place, e.g. to record `mark_executed`/`mark_stopped`.
    pub fn update<F>(&self, scope_id: u64, target_id: &str, f: F)
    where
        F: FnOnce(&mut Protection),
    {
        if let Some(protections) = self.by_scope.lock().get_mut(&scope_id) {
            if let Some(p) = protections.iter_mut().find(|p| p.target_id == target_id) {
                f(p);
            }
        }
    }

    /// `true` if `scope_id` has at least one registered protection and
    /// every one of them reports `is_enabled` (SPEC_FULL.md §D's
    /// mixed-sync/async fencing rule for `SuccessfullyMitigated`).
    #[must_use]
    pub fn all_enabled(&self, scope_id: u64) -> bool {
        match self.by_scope.lock().get(&scope_id) {
            Some(protections) if !protections.is_empty() => protections.iter().all(|p| p.is_enabled),
            _ => false,
        }
    }
}

/// Selects exactly one blocker for a scope from the per-customer registry
/// (spec §4.9 "Selection Service"), replying on a one-shot channel so the
/// engine can await it alongside other suspension points (spec §5).
pub struct SelectionService {
    config: BlockerRegistryConfig,
    instances: HashMap<String, Arc<dyn Blocker>>,
}

impl SelectionService {
    /// Builds a selection service from the static registry configuration.
    #[must_use]
    pub fn new(config: BlockerRegistryConfig) -> Self {
        Self {
            config,
            instances: HashMap::new(),
        }
    }

    /// Registers a live blocker driver under `config.name`, making it
    /// eligible for selection wherever that name appears in the registry
    /// configuration.
    pub fn register_instance(&mut self, config: &BlockerConfig, instance: Arc<dyn Blocker>) {
        _ = self.instances.insert(config.name.clone(), instance);
    }

    /// Selects a blocker for `customer_id`/`target_type`, replying on a
    /// one-shot channel (spec §4.9: "emits exactly one blocker on a result
    /// channel, or an error. The engine synchronously awaits one of the two
    /// channels" — collapsed here into a single `Result`-carrying channel,
    /// the idiomatic equivalent).
    pub fn select(
        &self,
        customer_id: i64,
        target_type: ProtectionTargetType,
    ) -> dots_channel::oneshot::Receiver<Result<Arc<dyn Blocker>, BlockerError>> {
        let (tx, rx) = dots_channel::oneshot::channel();
        let result = self.select_sync(customer_id, target_type);
        // The receiver may already have been dropped by a cancelled caller;
        // that is not an error for the selection service itself.
        let _ = tx.send(result);
        rx
    }

    /// Looks up a registered driver instance by its configured name
    /// (used to route stop/unregister during rollback or tick-driven
    /// cancellation, once the owning session name is known from the
    /// stored [`Protection`]).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Blocker>> {
        self.instances.get(name).cloned()
    }

    fn select_sync(
        &self,
        customer_id: i64,
        target_type: ProtectionTargetType,
    ) -> Result<Arc<dyn Blocker>, BlockerError> {
        let eligible = self.config.eligible(customer_id, target_type);
        if eligible.is_empty() {
            return Err(BlockerError::no_eligible_blocker(format!(
                "no blocker configured for customer {customer_id} and target type {target_type:?}"
            )));
        }
        for cfg in eligible {
            if let Some(instance) = self.instances.get(&cfg.name) {
                return Ok(instance.clone());
            }
        }
        Err(BlockerError::no_eligible_blocker(format!(
            "blockers configured for customer {customer_id} have no registered driver instance"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::NoopBlocker;
    use dots_config::BlockerKind;

    fn cfg(name: &str) -> BlockerConfig {
        BlockerConfig {
            name: name.into(),
            kind: BlockerKind::Rtbh,
            target_type: ProtectionTargetType::MitigationAcl,
            endpoint: "10.0.0.1".into(),
        }
    }

    #[tokio::test]
    async fn selects_registered_instance() {
        let mut registry = BlockerRegistryConfig::default();
        registry.default.push(cfg("edge-rtbh"));
        let mut service = SelectionService::new(registry);
        service.register_instance(&cfg("edge-rtbh"), Arc::new(NoopBlocker::new("edge-rtbh", BlockerKind::Rtbh)));

        let blocker = service
            .select(1, ProtectionTargetType::MitigationAcl)
            .recv()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(blocker.name(), "edge-rtbh");
    }

    #[tokio::test]
    async fn errors_when_configured_but_no_driver_registered() {
        let mut registry = BlockerRegistryConfig::default();
        registry.default.push(cfg("edge-rtbh"));
        let service = SelectionService::new(registry);
        let err = service
            .select(1, ProtectionTargetType::MitigationAcl)
            .recv()
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(err.kind, crate::error::BlockerErrorKind::NoEligibleBlocker);
    }

    #[test]
    fn protection_registry_tracks_enablement() {
        let registry = ProtectionRegistry::new();
        let mut p = Protection::registered("acl-1".into(), ProtectionTargetType::MitigationAcl, "edge".into());
        registry.insert(1, p.clone());
        assert!(!registry.all_enabled(1));

        p.mark_executed(chrono::Utc::now());
        registry.update(1, "acl-1", |stored| stored.mark_executed(chrono::Utc::now()));
        assert!(registry.all_enabled(1));

        let taken = registry.take_all(1);
        assert_eq!(taken.len(), 1);
        assert!(registry.list(1).is_empty());
    }
}

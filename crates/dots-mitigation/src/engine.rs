//! The mitigation engine (C5, spec §4.5): validates and persists
//! `MitigationScope`s, drives their status lifecycle, and invokes blockers
//! through [`dots_blocker::SelectionService`] to realize "active" scopes.

use crate::error::{MitigationError, MitigationErrorKind};
use crate::observer::ScopeObserver;
use crate::store::MitigationStore;
use chrono::{DateTime, Duration, Utc};
use dots_blocker::{BlockerError, ProtectionRegistry, SelectionService};
use dots_model::conflict::ConflictCause;
use dots_model::{AclActivation, AttackStatus, ConflictInformation, MitigationScope, MitigationStatus, ProtectionTargetType, Target};
use std::sync::Arc;

/// The body of a mitigation PUT (spec §3 "MitigationScope", §4.5): target
/// resources, requested lifetime, whether the scope should activate
/// immediately or only once the session is lost, optional data-channel ACL
/// activation overrides, and (for an `If-Match` efficacy update) the
/// client-reported attack status.
#[derive(Debug, Clone, Default)]
pub struct MitigationPut {
    /// Requested target resources, prior to alias expansion.
    pub target: Target,
    /// Requested lifetime in seconds (`-1` = indefinite).
    pub lifetime: i32,
    /// `false` for a preconfigured, trigger-on-session-loss scope.
    pub trigger_mitigation: bool,
    /// Data-channel ACL activation overrides, if present.
    pub acl_list: Option<Vec<AclActivation>>,
    /// Client-reported attack status, used only by an `If-Match` update.
    pub attack_status: Option<AttackStatus>,
}

/// Whether a mitigation PUT created a new `(customer, cuid, mid)` scope or
/// updated one that already existed — the router maps this to `2.01
/// Created` vs `2.04 Changed` (spec §6, scenario S1 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// No scope existed for this key before the PUT.
    Created,
    /// A scope already existed for this key (efficacy update,
    /// control-filtering update, or a plain target/lifetime update).
    Updated,
}

/// Server-wide mitigation engine tunables (spec §6 configuration,
/// SPEC_FULL.md §B).
#[derive(Debug, Clone, Copy)]
pub struct MitigationEngineConfig {
    /// Seconds a scope spends in `ActiveButTerminating` after a DELETE
    /// before it is considered `Terminated` (spec §4.5 "Delete").
    pub terminating_period_lifetime: u32,
    /// How long a `Terminated` scope is kept around before the lifetime
    /// sweep purges it outright (spec §4.7).
    pub purge_grace: Duration,
}

/// The mitigation engine: one [`MitigationStore`] plus the blocker
/// selection/registry pair it drives scopes through.
pub struct MitigationEngine<S: MitigationStore> {
    store: Arc<S>,
    blockers: Arc<SelectionService>,
    protections: Arc<ProtectionRegistry>,
    observer: Arc<dyn ScopeObserver>,
    config: MitigationEngineConfig,
}

impl<S: MitigationStore> MitigationEngine<S> {
    /// Builds an engine over the given store, blocker stack and observer.
    pub fn new(
        store: Arc<S>,
        blockers: Arc<SelectionService>,
        protections: Arc<ProtectionRegistry>,
        observer: Arc<dyn ScopeObserver>,
        config: MitigationEngineConfig,
    ) -> Self {
        Self {
            store,
            blockers,
            protections,
            observer,
            config,
        }
    }

    /// Handles a mitigation PUT (spec §4.5): create, efficacy update
    /// (`if_match`), control-filtering update (`acl_list` with an empty
    /// target), or a plain target/lifetime update, each subject to the
    /// overlap check against every other active scope.
    ///
    /// `aliases` carries the already-resolved data-channel alias
    /// expansions referenced by `req.target.aliases`; alias lookup itself
    /// is an external collaborator (spec §1) and is not performed here.
    pub async fn put(
        &self,
        customer_id: i64,
        cuid: &str,
        mid: u32,
        req: MitigationPut,
        if_match: bool,
        aliases: &[Target],
        now: DateTime<Utc>,
    ) -> Result<(MitigationScope, PutOutcome), MitigationError> {
        // A PUT addressed to mid 0 is also a peace-time housekeeping point:
        // purge this client's history of non-active scopes before anything
        // else runs (SPEC_FULL.md §D).
        if mid == 0 {
            for stale in self.store.list_for_client(customer_id, cuid) {
                if !stale.is_active() {
                    self.store.delete(stale.scope_id);
                }
            }
        }

        if if_match {
            return self
                .put_efficacy_update(customer_id, cuid, mid, req, now)
                .map(|scope| (scope, PutOutcome::Updated));
        }

        if req.acl_list.is_some() && req.target == Target::default() {
            return self
                .put_control_filtering_update(customer_id, cuid, mid, req, now)
                .map(|scope| (scope, PutOutcome::Updated));
        }

        self.put_create_or_update(customer_id, cuid, mid, req, aliases, now).await
    }

    fn put_efficacy_update(
        &self,
        customer_id: i64,
        cuid: &str,
        mid: u32,
        req: MitigationPut,
        now: DateTime<Utc>,
    ) -> Result<MitigationScope, MitigationError> {
        let mut existing = self
            .store
            .get_active(customer_id, cuid, mid)
            .ok_or_else(|| MitigationError::precondition_failed("no active mitigation matches If-Match"))?;

        if req.acl_list.is_some() {
            return Err(MitigationError::validation(
                "acl_list is not permitted in an If-Match efficacy update",
            ));
        }
        if req.target != existing.target || req.lifetime != existing.lifetime || req.trigger_mitigation != existing.trigger_mitigation {
            return Err(MitigationError::validation(
                "an If-Match update may only change attack-status",
            ));
        }

        existing.attack_status = req.attack_status;
        existing.touch(now);
        self.store.put(existing.clone());
        self.observer.on_scope_changed(&existing);
        Ok(existing)
    }

    fn put_control_filtering_update(
        &self,
        customer_id: i64,
        cuid: &str,
        mid: u32,
        req: MitigationPut,
        now: DateTime<Utc>,
    ) -> Result<MitigationScope, MitigationError> {
        let mut existing = self.store.get_active(customer_id, cuid, mid).ok_or_else(|| {
            MitigationError::unprocessable("a control-filtering update requires an active mitigation outside peace time")
        })?;
        existing.acl_list = req.acl_list;
        existing.touch(now);
        self.store.put(existing.clone());
        self.observer.on_scope_changed(&existing);
        Ok(existing)
    }

    async fn put_create_or_update(
        &self,
        customer_id: i64,
        cuid: &str,
        mid: u32,
        req: MitigationPut,
        aliases: &[Target],
        now: DateTime<Utc>,
    ) -> Result<(MitigationScope, PutOutcome), MitigationError> {
        let mut merged_target = req.target.clone();
        for alias in aliases {
            merged_target.merge(alias);
        }

        let mut preconfigured_conflict = false;
        for other in self.store.list_all_active() {
            if other.customer_id == customer_id && other.cuid == cuid && other.mid == mid {
                continue; // this is the scope being updated, not a collision
            }
            if !merged_target.overlaps(&other.target) {
                continue;
            }
            if other.customer_id == customer_id && other.cuid == cuid {
                // Same owner: either both scopes are "live" requests, in
                // which case the new PUT wins and supersedes the stored one
                // regardless of mid ordering (a simplification documented
                // in DESIGN.md), or one of the two is a preconfigured
                // (trigger-on-loss) scope, which always yields to the live
                // one.
                if req.trigger_mitigation == other.trigger_mitigation {
                    self.withdraw_scope(&other, now).await;
                } else if req.trigger_mitigation {
                    self.withdraw_scope(&other, now).await;
                } else {
                    preconfigured_conflict = true;
                }
            } else if other.cuid == cuid {
                return Err(MitigationError::conflict(
                    ConflictInformation::new(ConflictCause::CuidCollision).with_mid(other.mid),
                    "cuid already in use by another customer",
                ));
            } else {
                return Err(MitigationError::conflict(
                    ConflictInformation::new(ConflictCause::OverlapTargets).with_mid(other.mid),
                    "target overlaps an active mitigation owned by another client",
                ));
            }
        }

        let stored = self.store.get_by_key(customer_id, cuid, mid);
        let outcome = if stored.is_some() { PutOutcome::Updated } else { PutOutcome::Created };
        let scope_id = stored.map_or_else(|| self.store.allocate_scope_id(), |existing| existing.scope_id);

        let mut scope = MitigationScope {
            customer_id,
            cuid: cuid.to_string(),
            mid,
            scope_id,
            target: merged_target,
            lifetime: req.lifetime,
            trigger_mitigation: req.trigger_mitigation,
            status: MitigationStatus::Triggered,
            attack_status: None,
            acl_list: req.acl_list,
            last_modified: now,
        };
        self.store.put(scope.clone());
        self.observer.on_scope_changed(&scope);

        if preconfigured_conflict {
            scope.status = MitigationStatus::Withdrawn;
            scope.touch(now);
            self.store.put(scope.clone());
            self.observer.on_scope_changed(&scope);
            return Ok((scope, outcome));
        }

        if req.trigger_mitigation {
            self.activate(scope, now).await.map(|scope| (scope, outcome))
        } else {
            Ok((scope, outcome))
        }
    }

    /// Drives a `Triggered` scope through blocker selection and
    /// installation: `Triggered` -> `Attempting` -> (blocker call) ->
    /// `InProgress` -> `SuccessfullyMitigated` once every protection the
    /// scope owns reports enabled. Any blocker failure rolls the scope
    /// back to `Withdrawn` and releases whatever protections were already
    /// registered.
    async fn activate(&self, mut scope: MitigationScope, now: DateTime<Utc>) -> Result<MitigationScope, MitigationError> {
        scope.status = MitigationStatus::Attempting;
        scope.touch(now);
        self.store.put(scope.clone());
        self.observer.on_scope_changed(&scope);

        let blocker = match self.blockers.select(scope.customer_id, ProtectionTargetType::MitigationAcl).recv().await {
            Ok(Ok(blocker)) => blocker,
            Ok(Err(err)) => {
                tracing::warn!(scope_id = scope.scope_id, %err, "blocker selection failed");
                return self.rollback(scope, now, MitigationError::from_blocker(&err)).await;
            }
            Err(_) => {
                return self
                    .rollback(scope, now, MitigationError::new(MitigationErrorKind::Internal, "blocker selection channel closed"))
                    .await
            }
        };

        let protection = match blocker.register_protection(&scope).await {
            Ok(protection) => protection,
            Err(err) => return self.rollback(scope, now, MitigationError::from_blocker(&err)).await,
        };
        self.protections.insert(scope.scope_id, protection.clone());

        let mut protection = protection;
        if let Err(err) = blocker.execute_protection(&mut protection).await {
            return self.rollback(scope, now, MitigationError::from_blocker(&err)).await;
        }
        let target_id = protection.target_id.clone();
        self.protections.update(scope.scope_id, &target_id, |stored| *stored = protection);

        scope.status = MitigationStatus::InProgress;
        scope.touch(now);
        self.store.put(scope.clone());
        self.observer.on_scope_changed(&scope);

        if self.protections.all_enabled(scope.scope_id) {
            scope.status = MitigationStatus::SuccessfullyMitigated;
            scope.touch(now);
            self.store.put(scope.clone());
            self.observer.on_scope_changed(&scope);
            tracing::info!(scope_id = scope.scope_id, "mitigation successfully established");
        }

        Ok(scope)
    }

    async fn rollback(&self, mut scope: MitigationScope, now: DateTime<Utc>, err: MitigationError) -> Result<MitigationScope, MitigationError> {
        self.cancel_scope_protections(scope.scope_id).await;
        scope.status = MitigationStatus::Withdrawn;
        scope.touch(now);
        self.store.put(scope.clone());
        self.observer.on_scope_changed(&scope);
        Err(err)
    }

    async fn withdraw_scope(&self, other: &MitigationScope, now: DateTime<Utc>) {
        let mut other = other.clone();
        other.status = MitigationStatus::Withdrawn;
        other.touch(now);
        self.store.put(other.clone());
        self.observer.on_scope_changed(&other);
        self.cancel_scope_protections(other.scope_id).await;
    }

    /// Stops and unregisters every protection registered for `scope_id`,
    /// routing each through its owning blocker, invoked synchronously for
    /// BGP-family blockers and as a detached task for stateful ACL
    /// appliances (spec §5 "Parallelism").
    async fn cancel_scope_protections(&self, scope_id: u64) {
        for mut protection in self.protections.take_all(scope_id) {
            let Some(blocker) = self.blockers.get(&protection.session_name) else {
                continue;
            };
            if blocker.kind().is_synchronous() {
                let _: Result<(), BlockerError> = blocker.stop_protection(&mut protection).await;
                let _: Result<(), BlockerError> = blocker.unregister_protection(protection).await;
            } else {
                tokio::spawn(async move {
                    let _: Result<(), BlockerError> = blocker.stop_protection(&mut protection).await;
                    let _: Result<(), BlockerError> = blocker.unregister_protection(protection).await;
                });
            }
        }
    }

    /// Handles a mitigation DELETE (spec §4.5): a scope that is currently
    /// realizing protections winds down through `ActiveButTerminating` for
    /// `terminating_period_lifetime` seconds; anything else (not yet
    /// active, or an indefinite-lifetime scope already terminating) is
    /// purged immediately. The spec is silent on which branch a
    /// `Triggered`/already-`Terminated` scope takes; this engine purges it
    /// immediately, the conservative reading.
    pub async fn delete(&self, customer_id: i64, cuid: &str, mid: u32, now: DateTime<Utc>) -> Result<MitigationScope, MitigationError> {
        let mut scope = self
            .store
            .get_by_key(customer_id, cuid, mid)
            .ok_or_else(|| MitigationError::not_found("no mitigation scope for the given mid"))?;

        let winds_down = matches!(
            scope.status,
            MitigationStatus::InProgress | MitigationStatus::SuccessfullyMitigated | MitigationStatus::Stopped | MitigationStatus::ActiveButTerminating
        ) && scope.lifetime != 0;

        if winds_down {
            scope.status = MitigationStatus::ActiveButTerminating;
            scope.lifetime = i32::try_from(self.config.terminating_period_lifetime).unwrap_or(i32::MAX);
            scope.touch(now);
            self.store.put(scope.clone());
            self.observer.on_scope_changed(&scope);
            Ok(scope)
        } else {
            scope.status = MitigationStatus::Terminated;
            scope.touch(now);
            self.cancel_scope_protections(scope.scope_id).await;
            self.store.delete(scope.scope_id);
            self.observer.on_scope_changed(&scope);
            Ok(scope)
        }
    }

    /// Activates every preconfigured scope for `(customer_id, cuid)` whose
    /// owning session has just been lost (spec §4.5 "trigger-mitigation
    /// false... activated if the signal session... is lost").
    pub async fn trigger_on_session_loss(&self, customer_id: i64, cuid: &str, now: DateTime<Utc>) -> Vec<MitigationScope> {
        let mut activated = Vec::new();
        for scope in self.store.list_for_client(customer_id, cuid) {
            if scope.status == MitigationStatus::Triggered && !scope.trigger_mitigation && scope.lifetime > 0 {
                if let Ok(scope) = self.activate(scope, now).await {
                    activated.push(scope);
                }
            }
        }
        activated
    }

    /// The periodic lifetime sweep (spec §4.7, driven by C7): expires
    /// active scopes whose lifetime has elapsed into `Terminated`, and
    /// purges `Terminated` scopes that have sat for at least
    /// `purge_grace`. Returns the scopes newly transitioned to
    /// `Terminated` this tick.
    pub async fn tick(&self, now: DateTime<Utc>) -> Vec<MitigationScope> {
        let mut newly_terminated = Vec::new();
        for mut scope in self.store.list_all() {
            if scope.status == MitigationStatus::Terminated {
                if now.signed_duration_since(scope.last_modified) >= self.config.purge_grace {
                    self.cancel_scope_protections(scope.scope_id).await;
                    self.store.delete(scope.scope_id);
                }
                continue;
            }
            if scope.is_active() {
                if let Some(remaining) = scope.remaining(now) {
                    if remaining <= 0 {
                        scope.status = MitigationStatus::Terminated;
                        scope.touch(now);
                        self.store.put(scope.clone());
                        self.observer.on_scope_changed(&scope);
                        self.cancel_scope_protections(scope.scope_id).await;
                        newly_terminated.push(scope);
                    }
                }
            }
        }
        newly_terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoopScopeObserver;
    use crate::store::InMemoryMitigationStore;
    use dots_blocker::testing::{noop_blocker, FailingBlocker};
    use dots_config::{BlockerConfig, BlockerKind, BlockerRegistryConfig};

    fn registry_config() -> BlockerRegistryConfig {
        let mut registry = BlockerRegistryConfig::default();
        registry.default.push(BlockerConfig {
            name: "edge-rtbh".into(),
            kind: BlockerKind::Rtbh,
            target_type: ProtectionTargetType::MitigationAcl,
            endpoint: "10.0.0.1".into(),
        });
        registry
    }

    fn engine_with(blockers: SelectionService) -> MitigationEngine<InMemoryMitigationStore> {
        MitigationEngine::new(
            Arc::new(InMemoryMitigationStore::new()),
            Arc::new(blockers),
            Arc::new(ProtectionRegistry::new()),
            Arc::new(NoopScopeObserver),
            MitigationEngineConfig {
                terminating_period_lifetime: 120,
                purge_grace: Duration::seconds(30),
            },
        )
    }

    fn target(prefix: &str) -> Target {
        Target {
            prefixes: vec![prefix.parse().unwrap()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn put_activates_through_a_synchronous_blocker() {
        let mut blockers = SelectionService::new(registry_config());
        blockers.register_instance(&registry_config().default[0], noop_blocker("edge-rtbh"));
        let engine = engine_with(blockers);

        let req = MitigationPut {
            target: target("192.0.2.0/24"),
            lifetime: 3600,
            trigger_mitigation: true,
            acl_list: None,
            attack_status: None,
        };
        let (scope, outcome) = engine.put(1, "cuid-1", 1, req, false, &[], Utc::now()).await.unwrap();
        assert_eq!(scope.status, MitigationStatus::SuccessfullyMitigated);
        assert_eq!(outcome, PutOutcome::Created);
    }

    #[tokio::test]
    async fn put_withdraws_on_blocker_rejection() {
        let mut registry = registry_config();
        registry.default[0].name = "bad-blocker".into();
        let mut blockers = SelectionService::new(registry.clone());
        blockers.register_instance(&registry.default[0], Arc::new(FailingBlocker::new("bad-blocker", BlockerKind::Rtbh)));
        let engine = engine_with(blockers);

        let req = MitigationPut {
            target: target("192.0.2.0/24"),
            lifetime: 3600,
            trigger_mitigation: true,
            acl_list: None,
            attack_status: None,
        };
        let err = engine.put(1, "cuid-1", 1, req, false, &[], Utc::now()).await.unwrap_err();
        assert_eq!(err.kind, MitigationErrorKind::BlockerError);

        let stored = engine.store.get_by_key(1, "cuid-1", 1).unwrap();
        assert_eq!(stored.status, MitigationStatus::Withdrawn);
    }

    #[tokio::test]
    async fn overlapping_target_from_another_customer_conflicts() {
        let mut blockers = SelectionService::new(registry_config());
        blockers.register_instance(&registry_config().default[0], noop_blocker("edge-rtbh"));
        let engine = engine_with(blockers);

        let req = MitigationPut {
            target: target("192.0.2.0/24"),
            lifetime: 3600,
            trigger_mitigation: true,
            acl_list: None,
            attack_status: None,
        };
        engine.put(1, "cuid-1", 1, req.clone(), false, &[], Utc::now()).await.unwrap();

        let err = engine.put(2, "cuid-2", 1, req, false, &[], Utc::now()).await.unwrap_err();
        assert_eq!(err.kind, MitigationErrorKind::Conflict);
        assert_eq!(err.conflict.unwrap().cause, ConflictCause::OverlapTargets);
    }

    #[tokio::test]
    async fn same_owner_overlap_withdraws_the_previous_scope() {
        let mut blockers = SelectionService::new(registry_config());
        blockers.register_instance(&registry_config().default[0], noop_blocker("edge-rtbh"));
        let engine = engine_with(blockers);

        let req = MitigationPut {
            target: target("192.0.2.0/24"),
            lifetime: 3600,
            trigger_mitigation: true,
            acl_list: None,
            attack_status: None,
        };
        engine.put(1, "cuid-1", 1, req.clone(), false, &[], Utc::now()).await.unwrap();
        let (second, second_outcome) = engine.put(1, "cuid-1", 2, req, false, &[], Utc::now()).await.unwrap();
        assert_eq!(second.status, MitigationStatus::SuccessfullyMitigated);
        assert_eq!(second_outcome, PutOutcome::Created);

        let first = engine.store.get_by_key(1, "cuid-1", 1).unwrap();
        assert_eq!(first.status, MitigationStatus::Withdrawn);
    }

    #[tokio::test]
    async fn delete_winds_down_an_active_scope() {
        let mut blockers = SelectionService::new(registry_config());
        blockers.register_instance(&registry_config().default[0], noop_blocker("edge-rtbh"));
        let engine = engine_with(blockers);

        let req = MitigationPut {
            target: target("192.0.2.0/24"),
            lifetime: 3600,
            trigger_mitigation: true,
            acl_list: None,
            attack_status: None,
        };
        engine.put(1, "cuid-1", 1, req, false, &[], Utc::now()).await.unwrap();
        let deleted = engine.delete(1, "cuid-1", 1, Utc::now()).await.unwrap();
        assert_eq!(deleted.status, MitigationStatus::ActiveButTerminating);
        assert_eq!(deleted.lifetime, 120);
    }

    #[tokio::test]
    async fn tick_terminates_then_purges_after_grace() {
        let mut blockers = SelectionService::new(registry_config());
        blockers.register_instance(&registry_config().default[0], noop_blocker("edge-rtbh"));
        let engine = engine_with(blockers);

        let req = MitigationPut {
            target: target("192.0.2.0/24"),
            lifetime: 1,
            trigger_mitigation: true,
            acl_list: None,
            attack_status: None,
        };
        let now = Utc::now();
        engine.put(1, "cuid-1", 1, req, false, &[], now).await.unwrap();

        let expired = now + Duration::seconds(5);
        let terminated = engine.tick(expired).await;
        assert_eq!(terminated.len(), 1);
        assert_eq!(terminated[0].status, MitigationStatus::Terminated);

        let purged_at = expired + Duration::seconds(60);
        let none = engine.tick(purged_at).await;
        assert!(none.is_empty());
        assert!(engine.store.get_by_key(1, "cuid-1", 1).is_none());
    }

    #[tokio::test]
    async fn trigger_on_session_loss_activates_preconfigured_scope() {
        let mut blockers = SelectionService::new(registry_config());
        blockers.register_instance(&registry_config().default[0], noop_blocker("edge-rtbh"));
        let engine = engine_with(blockers);

        let req = MitigationPut {
            target: target("192.0.2.0/24"),
            lifetime: 3600,
            trigger_mitigation: false,
            acl_list: None,
            attack_status: None,
        };
        let (scope, _outcome) = engine.put(1, "cuid-1", 1, req, false, &[], Utc::now()).await.unwrap();
        assert_eq!(scope.status, MitigationStatus::Triggered);

        let activated = engine.trigger_on_session_loss(1, "cuid-1", Utc::now()).await;
        assert_eq!(activated.len(), 1);
        assert_eq!(activated[0].status, MitigationStatus::SuccessfullyMitigated);
    }

    #[tokio::test]
    async fn repeated_put_on_the_same_key_reports_updated() {
        let mut blockers = SelectionService::new(registry_config());
        blockers.register_instance(&registry_config().default[0], noop_blocker("edge-rtbh"));
        let engine = engine_with(blockers);

        let req = MitigationPut {
            target: target("192.0.2.0/24"),
            lifetime: 3600,
            trigger_mitigation: true,
            acl_list: None,
            attack_status: None,
        };
        let (_, first) = engine.put(1, "cuid-1", 1, req.clone(), false, &[], Utc::now()).await.unwrap();
        assert_eq!(first, PutOutcome::Created);
        let (_, second) = engine.put(1, "cuid-1", 1, req, false, &[], Utc::now()).await.unwrap();
        assert_eq!(second, PutOutcome::Updated);
    }

    #[tokio::test]
    async fn efficacy_update_with_changed_target_is_bad_request_not_precondition_failed() {
        let mut blockers = SelectionService::new(registry_config());
        blockers.register_instance(&registry_config().default[0], noop_blocker("edge-rtbh"));
        let engine = engine_with(blockers);

        let req = MitigationPut {
            target: target("192.0.2.0/24"),
            lifetime: 3600,
            trigger_mitigation: true,
            acl_list: None,
            attack_status: None,
        };
        engine.put(1, "cuid-1", 1, req, false, &[], Utc::now()).await.unwrap();

        let changed = MitigationPut {
            target: target("198.51.100.0/24"),
            lifetime: 3600,
            trigger_mitigation: true,
            acl_list: None,
            attack_status: Some(AttackStatus::UnderAttack),
        };
        let err = engine.put(1, "cuid-1", 1, changed, true, &[], Utc::now()).await.unwrap_err();
        assert_eq!(err.kind, MitigationErrorKind::Validation);
    }
}

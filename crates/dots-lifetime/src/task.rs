//! The lifetime manager's periodic tick (C7, spec §4.7): on each interval,
//! expire mitigation scopes through the engine's own `tick`, then
//! separately prune expired data-channel aliases/ACLs. Grounded on the
//! teacher's `spawn_thread_local_task` (`crates/controller/src/thread_task.rs`)
//! for its `CancellationToken`-driven graceful-shutdown shape; unlike that
//! task this one has no non-`Send` dependency forcing a dedicated OS
//! thread plus `LocalSet`, so it runs as a plain `tokio::spawn`ed task on
//! the caller's runtime instead.

use crate::alias::DataChannelLifetimeSource;
use chrono::Utc;
use dots_mitigation::{MitigationEngine, MitigationStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Tunables for the periodic tick (spec §6 configuration).
#[derive(Debug, Clone, Copy)]
pub struct LifetimeManagerConfig {
    /// How often the tick fires.
    pub interval: Duration,
}

impl Default for LifetimeManagerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(1) }
    }
}

/// Handle to a running lifetime-manager task: `shutdown()` cancels it
/// (idempotent, best-effort); `shutdown_and_join()` cancels and waits for
/// the current tick to finish.
pub struct LifetimeManagerHandle {
    cancel_token: CancellationToken,
    join_handle: JoinHandle<()>,
}

impl LifetimeManagerHandle {
    /// Requests graceful shutdown; the task exits once its in-flight tick,
    /// if any, completes.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Requests shutdown and waits for the task to exit.
    pub async fn shutdown_and_join(self) {
        self.shutdown();
        let _ = self.join_handle.await;
    }
}

/// Spawns the lifetime manager. Each tick expires mitigation scopes via
/// `engine.tick()` (spec §4.7 steps 1-2) and separately prunes expired
/// data-channel aliases/ACLs via `aliases` (step 3); the two sweeps are
/// independent and neither blocks on the other's failure since pruning an
/// external-collaborator resource cannot fail this task.
pub fn spawn<S, A>(
    engine: Arc<MitigationEngine<S>>,
    aliases: Arc<A>,
    config: LifetimeManagerConfig,
) -> LifetimeManagerHandle
where
    S: MitigationStore + 'static,
    A: DataChannelLifetimeSource + 'static,
{
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    let join_handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.interval);
        loop {
            tokio::select! {
                () = token.cancelled() => {
                    tracing::info!("lifetime manager shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    tick_once(&engine, &aliases).await;
                }
            }
        }
    });

    LifetimeManagerHandle { cancel_token, join_handle }
}

async fn tick_once<S, A>(engine: &MitigationEngine<S>, aliases: &A)
where
    S: MitigationStore,
    A: DataChannelLifetimeSource,
{
    let now = Utc::now();

    let transitioned = engine.tick(now).await;
    for scope in &transitioned {
        tracing::debug!(mid = scope.mid, status = ?scope.status, "mitigation scope expiry tick");
    }

    for alias in aliases.prune_expired_aliases(now) {
        tracing::debug!(cuid = %alias.cuid, name = %alias.name, "data-channel alias expired");
    }
    for acl in aliases.prune_expired_acls(now) {
        tracing::debug!(cuid = %acl.cuid, name = %acl.name, "data-channel acl expired");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::InMemoryDataChannelStore;
    use dots_blocker::{BlockerRegistryConfig, ProtectionRegistry, SelectionService};
    use dots_mitigation::{InMemoryMitigationStore, MitigationEngineConfig, NoopScopeObserver};
    use std::time::Duration as StdDuration;

    fn build_engine() -> Arc<MitigationEngine<InMemoryMitigationStore>> {
        let store = Arc::new(InMemoryMitigationStore::default());
        let selection = Arc::new(SelectionService::new(BlockerRegistryConfig::default()));
        let protections = Arc::new(ProtectionRegistry::default());
        Arc::new(MitigationEngine::new(
            store,
            selection,
            protections,
            Arc::new(NoopScopeObserver),
            MitigationEngineConfig { terminating_period_lifetime: 0, purge_grace: chrono::Duration::seconds(0) },
        ))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn task_shuts_down_promptly_on_cancellation() {
        let engine = build_engine();
        let aliases = Arc::new(InMemoryDataChannelStore::new());
        let handle = spawn(engine, aliases, LifetimeManagerConfig { interval: StdDuration::from_secs(60) });
        handle.shutdown_and_join().await;
    }

    #[tokio::test]
    async fn tick_once_prunes_expired_aliases() {
        let engine = build_engine();
        let aliases = InMemoryDataChannelStore::new();
        aliases.put_alias(1, "c1", "stale", Utc::now() - chrono::Duration::seconds(1));
        tick_once(&engine, &aliases).await;
        assert!(aliases.prune_expired_aliases(Utc::now()).is_empty());
    }
}

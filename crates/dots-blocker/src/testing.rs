//! Test fixtures for constructing blockers without duplicating boilerplate
//! in every crate that exercises the mitigation engine against a blocker
//! (mirrors the teacher's `engine/src/testing.rs`).

use crate::capability::Blocker;
use crate::error::{BlockerError, BlockerErrorKind};
use dots_config::BlockerKind;
use dots_model::{MitigationScope, Protection, ProtectionTargetType};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A blocker that always succeeds, assigning sequential `target_id`s.
/// Used by `dots-mitigation`'s own tests and by this crate's.
pub struct NoopBlocker {
    name: String,
    kind: BlockerKind,
    next_id: AtomicU64,
    pub executed: Mutex<Vec<String>>,
    pub stopped: Mutex<Vec<String>>,
}

impl NoopBlocker {
    /// Builds a no-op blocker with the given name and family.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: BlockerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            next_id: AtomicU64::new(1),
            executed: Mutex::new(Vec::new()),
            stopped: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl Blocker for NoopBlocker {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BlockerKind {
        self.kind
    }

    async fn register_protection(&self, _scope: &MitigationScope) -> Result<Protection, BlockerError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(Protection::registered(
            format!("acl-{id}"),
            ProtectionTargetType::MitigationAcl,
            self.name.clone(),
        ))
    }

    async fn execute_protection(&self, protection: &mut Protection) -> Result<(), BlockerError> {
        protection.mark_executed(chrono::Utc::now());
        self.executed.lock().push(protection.target_id.clone());
        Ok(())
    }

    async fn stop_protection(&self, protection: &mut Protection) -> Result<(), BlockerError> {
        protection.mark_stopped(chrono::Utc::now());
        self.stopped.lock().push(protection.target_id.clone());
        Ok(())
    }

    async fn unregister_protection(&self, _protection: Protection) -> Result<(), BlockerError> {
        Ok(())
    }
}

/// A blocker whose `register_protection` always fails, used to exercise
/// the mitigation engine's rollback-to-`Withdrawn` path (spec §4.5 step 8).
pub struct FailingBlocker {
    name: String,
    kind: BlockerKind,
}

impl FailingBlocker {
    /// Builds a blocker that rejects every registration attempt.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: BlockerKind) -> Self {
        Self { name: name.into(), kind }
    }
}

#[async_trait::async_trait]
impl Blocker for FailingBlocker {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BlockerKind {
        self.kind
    }

    async fn register_protection(&self, _scope: &MitigationScope) -> Result<Protection, BlockerError> {
        Err(BlockerError::new(BlockerErrorKind::Rejected, "device refused registration"))
    }

    async fn execute_protection(&self, _protection: &mut Protection) -> Result<(), BlockerError> {
        Err(BlockerError::new(BlockerErrorKind::Rejected, "device refused execution"))
    }

    async fn stop_protection(&self, _protection: &mut Protection) -> Result<(), BlockerError> {
        Ok(())
    }

    async fn unregister_protection(&self, _protection: Protection) -> Result<(), BlockerError> {
        Ok(())
    }
}

/// Convenience constructor wrapping a [`NoopBlocker`] in an `Arc`.
#[must_use]
pub fn noop_blocker(name: &str) -> Arc<dyn Blocker> {
    Arc::new(NoopBlocker::new(name, BlockerKind::Rtbh))
}

//! Notifies the resource registry (C3, in `dots-engine`) of scope-lifecycle
//! changes without the mitigation engine depending on it, keeping the data
//! flow of spec §4.1's diagram (`C4 -> C5` and `C4 -> C3`) a one-way edge
//! out of this crate.

use dots_model::MitigationScope;

/// A sink for mitigation-scope lifecycle changes (spec §4.5 step 8: "the
/// resource registry's sub-resource list and observer notifications are
/// kept current with every status transition").
pub trait ScopeObserver: Send + Sync {
    /// Called whenever a scope is created, updated, or transitions status,
    /// including purge (in which case the passed scope reflects its final
    /// `Terminated` state just before removal).
    fn on_scope_changed(&self, scope: &MitigationScope);
}

/// A [`ScopeObserver`] that does nothing, useful for tests and for running
/// the engine before the resource registry is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScopeObserver;

impl ScopeObserver for NoopScopeObserver {
    fn on_scope_changed(&self, _scope: &MitigationScope) {}
}

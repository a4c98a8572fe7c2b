//! Resource registry (C3, spec §4.1, §4.2): a path-keyed map of live
//! signal-channel resources, with the "unknown" prefix fallback and the
//! sub-resource lifecycle (created on a successful PUT, removed if a later
//! PUT fails) that the request router (C4) relies on before it ever calls
//! into `dots-mitigation`/`dots-telemetry`.
//!
//! Generalized from the teacher's pipeline-registry pattern
//! (`engine/src/pipeline.rs`'s keyed-by-name component map): resources here
//! are keyed by full `Uri-Path`, not by a static pipeline name, since the
//! signal channel creates and destroys them as clients PUT scopes.

use dots_codec::RecordKind;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Canonical key for a resource instance: the record kind plus enough of
/// the request's identity to disambiguate one client's scope from
/// another's (spec §4.1: mitigation sub-resources are keyed by the full
/// URI `{cuid, mid}`; session-config by canonicalized path + `customerId`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    /// Which family of resource this is.
    pub kind: RecordKind,
    /// Owning client identifier.
    pub cuid: String,
    /// Discriminator within the family: `mid` for mitigation, `tsid` for
    /// telemetry-setup, `tmid` for pre-mitigation, `customerId` for
    /// session-config (as a string so one field serves every kind).
    pub discriminator: String,
}

impl ResourceKey {
    /// Builds a key for a mitigation scope sub-resource.
    #[must_use]
    pub fn mitigation(cuid: impl Into<String>, mid: u32) -> Self {
        Self {
            kind: RecordKind::Mitigation,
            cuid: cuid.into(),
            discriminator: mid.to_string(),
        }
    }

    /// Builds a key for a telemetry-setup sub-resource.
    #[must_use]
    pub fn telemetry_setup(cuid: impl Into<String>, tsid: u32) -> Self {
        Self {
            kind: RecordKind::TelemetrySetup,
            cuid: cuid.into(),
            discriminator: tsid.to_string(),
        }
    }

    /// Builds a key for a telemetry pre-mitigation sub-resource.
    #[must_use]
    pub fn telemetry_pre_mitigation(cuid: impl Into<String>, tmid: u32) -> Self {
        Self {
            kind: RecordKind::TelemetryPreMitigation,
            cuid: cuid.into(),
            discriminator: tmid.to_string(),
        }
    }

    /// Builds a key for a session-config sub-resource, canonicalized on
    /// `customerId` (spec §4.3 "keyed by canonicalized path +
    /// `customerId=N`").
    #[must_use]
    pub fn session_config(cuid: impl Into<String>, customer_id: i64) -> Self {
        Self {
            kind: RecordKind::SessionConfig,
            cuid: cuid.into(),
            discriminator: customer_id.to_string(),
        }
    }
}

/// Whether a registered resource currently supports `Observe` notification
/// (mitigation and telemetry pre-mitigation GETs may be observed, spec
/// §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observability {
    /// No observer bookkeeping needed for this resource.
    None,
    /// At least one session currently has this resource registered for
    /// notification.
    Observed,
}

/// State tracked per live resource instance: whether it is dirty since the
/// last notification and which sessions observe it.
#[derive(Debug, Clone, Default)]
pub struct ResourceEntry {
    /// `true` once a change has occurred that has not yet been pushed to
    /// observers (spec §4.2 "Observe").
    pub dirty: bool,
    /// Session ids currently observing this resource (register=0 adds,
    /// deregister=1 or an RST removes).
    pub observers: Vec<u64>,
}

impl ResourceEntry {
    fn new() -> Self {
        Self::default()
    }
}

/// The registry of live signal-channel resource instances (C3). Handlers
/// register a resource on first successful PUT and the registry removes it
/// if a later PUT handler reports anything other than a 2.xx outcome (spec
/// §4.1: a failed re-PUT does not leave a half-created resource behind).
#[derive(Default)]
pub struct ResourceRegistry {
    entries: RwLock<HashMap<ResourceKey, ResourceEntry>>,
}

impl ResourceRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource as live, creating its entry if absent.
    /// Idempotent: a repeat PUT on an already-live resource keeps its
    /// existing observers.
    pub fn create(&self, key: ResourceKey) {
        self.entries.write().entry(key).or_insert_with(ResourceEntry::new);
    }

    /// Removes a resource and drops its observer bookkeeping. Called when a
    /// PUT handler's outcome was not a 2.xx code, or on DELETE (spec §4.1).
    pub fn remove(&self, key: &ResourceKey) {
        self.entries.write().remove(key);
    }

    /// Removes a resource only if the given CoAP response code indicates
    /// failure, matching the "creation rolls back on a non-2.xx handler
    /// outcome" rule verbatim.
    pub fn remove_if_not_success(&self, key: &ResourceKey, code: dots_codec::CoapCode) {
        if !code.is_success() {
            self.remove(key);
        }
    }

    /// `true` if a resource instance with this key is currently live.
    #[must_use]
    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Marks a resource dirty, meaning observers should be notified (spec
    /// §4.2). A resource must already exist; this is a no-op otherwise —
    /// the mitigation engine's `ScopeObserver` callback fires on every
    /// state change, live or not.
    pub fn mark_dirty(&self, key: &ResourceKey) {
        if let Some(entry) = self.entries.write().get_mut(key) {
            entry.dirty = true;
        }
    }

    /// Adds `session` to the observer set for `key` (Observe register=0).
    /// Creates the resource entry if it does not already exist, since an
    /// Observe GET for a still-pending scope is legal.
    pub fn observe(&self, key: ResourceKey, session: u64) {
        let mut entries = self.entries.write();
        let entry = entries.entry(key).or_insert_with(ResourceEntry::new);
        if !entry.observers.contains(&session) {
            entry.observers.push(session);
        }
    }

    /// Removes `session` from the observer set for `key` (Observe
    /// deregister=1, or an RST against a notification).
    pub fn deregister(&self, key: &ResourceKey, session: u64) {
        if let Some(entry) = self.entries.write().get_mut(key) {
            entry.observers.retain(|&s| s != session);
        }
    }

    /// Drains and returns the dirty resources along with their current
    /// observer sets, clearing the dirty bit on each. The caller (the
    /// router's notification task) pushes one `2.05` NON response per
    /// observer per drained entry.
    pub fn drain_dirty(&self) -> Vec<(ResourceKey, Vec<u64>)> {
        let mut entries = self.entries.write();
        let mut out = Vec::new();
        for (key, entry) in entries.iter_mut() {
            if entry.dirty {
                entry.dirty = false;
                out.push((key.clone(), entry.observers.clone()));
            }
        }
        out
    }

    /// All sessions observing any resource, for bulk cleanup when a
    /// session disconnects (spec §4.2 "On Disconnected/Error its observer
    /// entries are released").
    pub fn release_session(&self, session: u64) {
        for entry in self.entries.write().values_mut() {
            entry.observers.retain(|&s| s != session);
        }
    }
}

/// The path-prefix dispatch table mapping the first `Uri-Path` segment
/// under `.well-known/dots/` to a [`RecordKind`], with an explicit
/// "unknown" fallback the router consults before giving up (spec §4.4: an
/// unrecognized resource under the well-known prefix is `4.04`, not
/// `4.00`, once the prefix itself is valid).
#[must_use]
pub fn resolve_record_kind(segment: &str) -> Option<RecordKind> {
    RecordKind::from_path_prefix(segment)
}

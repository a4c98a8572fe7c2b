use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of resource a [`Protection`] was registered against (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtectionTargetType {
    /// An ACL installed to realize a mitigation scope.
    MitigationAcl,
    /// An ACL installed through the data channel (activate-when-mitigating).
    DataChannelAcl,
}

/// A handle returned by a blocker after `register_protection` (spec §3).
/// Lifecycle: registered -> executed -> stopped -> unregistered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Protection {
    /// Opaque id assigned by the blocker (e.g. an ACL name or FlowSpec rule id).
    pub target_id: String,
    /// What kind of target this protection realizes.
    pub target_type: ProtectionTargetType,
    /// Whether the blocker currently reports the protection as active.
    pub is_enabled: bool,
    /// When the protection was started (execute_protection succeeded).
    pub started_at: Option<DateTime<Utc>>,
    /// When the protection was finished (stop_protection succeeded).
    pub finished_at: Option<DateTime<Utc>>,
    /// The blocker session/appliance name that owns this protection.
    pub session_name: String,
}

impl Protection {
    /// Builds a freshly-registered, not-yet-executed protection.
    #[must_use]
    pub fn registered(target_id: String, target_type: ProtectionTargetType, session_name: String) -> Self {
        Self {
            target_id,
            target_type,
            is_enabled: false,
            started_at: None,
            finished_at: None,
            session_name,
        }
    }

    /// Marks the protection executed (blocker ack received).
    pub fn mark_executed(&mut self, at: DateTime<Utc>) {
        self.is_enabled = true;
        self.started_at = Some(at);
    }

    /// Marks the protection stopped.
    pub fn mark_stopped(&mut self, at: DateTime<Utc>) {
        self.is_enabled = false;
        self.finished_at = Some(at);
    }

    /// Duration the protection was active, feeding mitigation observability
    /// (spec §3: "`finished_at - started_at` feeds mitigation observability").
    #[must_use]
    pub fn active_duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

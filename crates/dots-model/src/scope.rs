use crate::acl::AclActivation;
use crate::target::Target;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Mitigation scope lifecycle status (spec §3).
///
/// `status = 5` ("Attempting") is an Open Question in spec §9 the original
/// leaves unnamed; SPEC_FULL.md §D resolves it as the registration-pending
/// state between `Triggered`/`InProgress` and `SuccessfullyMitigated`, kept
/// inside the documented "active" range `{1..5}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum MitigationStatus {
    /// The blocker has accepted the request and mitigation is starting.
    InProgress = 1,
    /// The blocker reports the attack traffic successfully mitigated.
    SuccessfullyMitigated = 2,
    /// The scope's protections have all been stopped.
    Stopped = 3,
    /// A DELETE was received; the scope is winding down on its
    /// terminating-period lifetime.
    ActiveButTerminating = 4,
    /// A blocker registration is in flight (between `Triggered` and
    /// `InProgress`/`SuccessfullyMitigated`).
    Attempting = 5,
    /// The terminating period elapsed; the scope is ready to be purged.
    Terminated = 6,
    /// The scope was withdrawn, e.g. a blocker error during activation.
    Withdrawn = 7,
    /// A preconfigured ("trigger-on-loss") scope, not yet activated.
    Triggered = 8,
}

impl MitigationStatus {
    /// "Active" per spec §3: status in `{1..5}`.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            Self::InProgress
                | Self::SuccessfullyMitigated
                | Self::Stopped
                | Self::ActiveButTerminating
                | Self::Attempting
        )
    }
}

/// Observed attack status of a mitigation scope (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum AttackStatus {
    /// The target is still under attack.
    UnderAttack = 1,
    /// The attack has been successfully mitigated.
    AttackSuccessfullyMitigated = 2,
}

/// A mitigation request/response record (spec §3 "MitigationScope").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MitigationScope {
    /// Owning tenant.
    pub customer_id: i64,
    /// Client-unique id that created this scope.
    pub cuid: String,
    /// Client-assigned mitigation id.
    pub mid: u32,
    /// Server-internal surrogate key, stable across status transitions.
    pub scope_id: u64,
    /// Targets being mitigated.
    pub target: Target,
    /// Lifetime in seconds. `-1` = indefinite, `0` = expired-awaiting-GC.
    pub lifetime: i32,
    /// If `false`, the scope only activates when the owning session is lost.
    pub trigger_mitigation: bool,
    /// Current lifecycle status.
    pub status: MitigationStatus,
    /// Client-observed attack status, if reported.
    pub attack_status: Option<AttackStatus>,
    /// Data-channel ACL activation overrides.
    pub acl_list: Option<Vec<AclActivation>>,
    /// Last time any field of this scope changed; used by the lifetime
    /// manager (spec §4.7) to compute `remaining = lifetime - (now - last_modified)`.
    pub last_modified: DateTime<Utc>,
}

impl MitigationScope {
    /// Returns `true` if `self` is active per spec §3 (status in `{1..5}`).
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Seconds remaining before expiry at `now`, or `None` if the lifetime
    /// is indefinite (`-1`).
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        if self.lifetime < 0 {
            return None;
        }
        let elapsed = (now - self.last_modified).num_seconds();
        Some(i64::from(self.lifetime) - elapsed)
    }

    /// Touches `last_modified` to `now`; callers must do this on every
    /// mutation so the lifetime manager's clock stays correct (spec §4.7).
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_modified = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_statuses_match_spec_range() {
        assert!(MitigationStatus::InProgress.is_active());
        assert!(MitigationStatus::Attempting.is_active());
        assert!(!MitigationStatus::Terminated.is_active());
        assert!(!MitigationStatus::Triggered.is_active());
    }

    #[test]
    fn remaining_counts_down_from_last_modified() {
        let now = Utc::now();
        let scope = MitigationScope {
            customer_id: 1,
            cuid: "c1".into(),
            mid: 1,
            scope_id: 1,
            target: Target::default(),
            lifetime: 3600,
            trigger_mitigation: true,
            status: MitigationStatus::InProgress,
            attack_status: None,
            acl_list: None,
            last_modified: now - chrono::Duration::seconds(100),
        };
        assert_eq!(scope.remaining(now), Some(3500));
    }

    #[test]
    fn indefinite_lifetime_never_expires() {
        let scope = MitigationScope {
            customer_id: 1,
            cuid: "c1".into(),
            mid: 1,
            scope_id: 1,
            target: Target::default(),
            lifetime: -1,
            trigger_mitigation: true,
            status: MitigationStatus::InProgress,
            attack_status: None,
            acl_list: None,
            last_modified: Utc::now(),
        };
        assert_eq!(scope.remaining(Utc::now()), None);
    }
}

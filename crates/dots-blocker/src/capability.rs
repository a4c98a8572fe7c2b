//! The blocker capability interface (spec §4.9, §9 "Coroutine-style
//! blocker calls"): `register_protection`/`execute_protection`/
//! `stop_protection`/`unregister_protection`/`validate_scope`. Concrete
//! drivers (FlowSpec/RTBH/ACL-appliance libraries) are an external
//! collaborator (spec §1); this trait is the seam the mitigation engine
//! (C5) calls through, mirroring the teacher's exporter abstraction
//! (`engine/src/exporter.rs`) generalized from "ship telemetry out" to
//! "install a filtering rule".

use crate::error::BlockerError;
use dots_config::BlockerKind;
use dots_model::{MitigationScope, Protection, Target};

/// A capability for installing and tearing down traffic-scrubbing rules
/// on an external device (spec §3 "Blocker", §4.9).
///
/// Implementations run their I/O on background tasks (spec §5
/// "Suspension points": "awaiting a blocker result or error"); the trait
/// itself only defines the request/response shape, not the scheduling —
/// callers choose sync vs. async invocation based on [`Blocker::kind`]
/// (spec §5 "Parallelism").
#[async_trait::async_trait]
pub trait Blocker: Send + Sync {
    /// Operator-facing name, also recorded as `Protection::session_name`.
    fn name(&self) -> &str;

    /// Which family of blocker this is, governing sync-vs-async invocation
    /// (spec §5) and which `validate_scope` rules apply (spec §4.9).
    fn kind(&self) -> BlockerKind;

    /// Blocker-specific semantic validation of a scope before invocation
    /// (spec §4.9): protocol/port consistency and, for ACL appliances,
    /// IP-header-only targeting. See [`crate::validate::validate_scope`]
    /// for the shared rule set every implementation is expected to apply.
    fn validate_scope(&self, scope: &MitigationScope, aliases: &[Target]) -> Result<(), BlockerError> {
        crate::validate::validate_scope(self.kind(), scope, aliases)
    }

    /// Registers a new protection for `scope`, returning a handle in the
    /// `registered` state (spec §3 "Protection"). Does not yet install the
    /// rule — see [`Blocker::execute_protection`].
    async fn register_protection(&self, scope: &MitigationScope) -> Result<Protection, BlockerError>;

    /// Installs the rule for an already-registered protection, transitioning
    /// it to `executed`/`is_enabled = true`.
    async fn execute_protection(&self, protection: &mut Protection) -> Result<(), BlockerError>;

    /// Removes the installed rule, transitioning the protection to
    /// `stopped`/`is_enabled = false`, without releasing the device-side
    /// handle (see [`Blocker::unregister_protection`]).
    async fn stop_protection(&self, protection: &mut Protection) -> Result<(), BlockerError>;

    /// Releases a stopped protection's device-side resources.
    async fn unregister_protection(&self, protection: Protection) -> Result<(), BlockerError>;
}

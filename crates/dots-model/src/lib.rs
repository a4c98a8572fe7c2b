//! The DOTS domain model (spec §3): tenants, client identities, mitigation
//! scopes, conflict information, blocker protections, telemetry records and
//! signal session configuration.
//!
//! This crate holds plain, serde-friendly value objects only — no I/O, no
//! wire framing (that's `dots-codec`), no session/engine state (`dots-engine`).

pub mod acl;
pub mod conflict;
pub mod customer;
pub mod decimal;
pub mod identity;
pub mod protection;
pub mod scope;
pub mod session_config;
pub mod target;
pub mod telemetry;

pub use telemetry::{
    AttackDetail, BaselineEntry, PipeEntry, TelemetryPreMitigation, TelemetrySetup,
    TelemetrySetupBody, TelemetrySetupType, TopTalker, VendorMappingEntry,
};

pub use acl::{AclActivation, AclActivationType};
pub use conflict::{ConflictCause, ConflictInformation, ConflictScope};
pub use customer::Customer;
pub use decimal::Decimal2;
pub use identity::ClientIdentity;
pub use protection::{Protection, ProtectionTargetType};
pub use scope::{AttackStatus, MitigationScope, MitigationStatus};
pub use session_config::{SessionConfig, SessionTiming};
pub use target::{PortRange, Target};

//! The blocker abstraction (spec §3 "Blocker", §4.9 C9): a capability
//! interface (`register_protection`/`execute_protection`/
//! `stop_protection`/`unregister_protection`/`validate_scope`), a
//! selection service choosing one blocker per scope from the per-customer
//! registry, and an in-flight [`registry::ProtectionRegistry`] tracking
//! every protection a scope currently owns.
//!
//! Concrete drivers (FlowSpec/RTBH/ACL-appliance libraries) are an
//! external collaborator (spec §1) and are not implemented here.

pub mod capability;
pub mod error;
pub mod registry;
pub mod testing;
pub mod validate;

pub use capability::Blocker;
pub use error::{BlockerError, BlockerErrorKind};
pub use registry::{ProtectionRegistry, SelectionService};

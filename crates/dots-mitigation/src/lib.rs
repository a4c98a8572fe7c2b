//! The mitigation engine (C5, spec §4.5): the `MitigationScope` lifecycle
//! state machine, its storage seam, blocker invocation, and the observer
//! hook the resource registry (C3) hangs off of.

pub mod engine;
pub mod error;
pub mod observer;
pub mod store;

pub use engine::{MitigationEngine, MitigationEngineConfig, MitigationPut, PutOutcome};
pub use error::{MitigationError, MitigationErrorKind};
pub use observer::{NoopScopeObserver, ScopeObserver};
pub use store::{InMemoryMitigationStore, MitigationStore, ScopeKey};

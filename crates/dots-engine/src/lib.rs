//! The signal-channel endpoint (C2, spec §4.2), resource registry (C3,
//! spec §4.1) and request router (C4, spec §4.4): the glue between a raw
//! `dots-codec` PDU and the domain engines (`dots-mitigation`,
//! `dots-telemetry`) that actually hold state.
//!
//! The DTLS transport itself — accepting connections, driving the
//! handshake, delivering decoded PDUs and raising [`session::SessionEvent`]
//! — is an external collaborator (spec §1) and lives in `dots-server`; this
//! crate only defines the events, the bookkeeping they drive, and the
//! routing logic a transport implementation calls into.

pub mod blockwise;
pub mod error;
pub mod request;
pub mod resource;
pub mod response_code;
pub mod router;
pub mod session;

pub use blockwise::{fragment, BlockwiseTracker, FragmentOutcome, Transfer, TransferKey, TRANSFER_GRACE};
pub use error::{EngineError, EngineErrorKind};
pub use request::{parse, require_mandatory_params, ParsedRequest, Query};
pub use resource::{Observability, ResourceEntry, ResourceKey, ResourceRegistry};
pub use response_code::mitigation_error_code;
pub use router::{route_mitigation, validate, RouteOutcome};
pub use session::{RetransmitParams, SessionEvent, SessionId, SessionTable};

//! Telemetry setup and pre-mitigation (C6, spec §4.6): the three disjoint
//! telemetry-setup body shapes with their per-shape overlap rule
//! (`setup`), pre-mitigation reports filtered by URI-filtering queries
//! (`pre_mitigation`, `query`), and the per-client vendor-mapping table
//! `attack_detail` rows are checked against (`vendor`).
//!
//! Grounded on `dots-mitigation`'s store/error shape: a kind-enum
//! `thiserror` error type, a `parking_lot`-guarded in-memory store behind a
//! small trait-free API (telemetry has no blocker-style external
//! collaborator to abstract over, so no trait seam is needed here).

pub mod error;
pub mod pre_mitigation;
pub mod query;
pub mod setup;
pub mod vendor;

pub use error::{TelemetryError, TelemetryErrorKind};
pub use pre_mitigation::PreMitigationStore;
pub use query::{parse_queries, ContentSelector, FilterQuery};
pub use setup::TelemetrySetupStore;
pub use vendor::VendorMappingTable;

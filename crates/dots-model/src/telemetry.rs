use crate::target::Target;
use serde::{Deserialize, Serialize};

/// Which of the three disjoint telemetry-setup body shapes a given
/// `(customer, cuid, tsid)` row carries (spec §3, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TelemetrySetupType {
    /// Generic signal-channel telemetry configuration (measurement
    /// intervals, percentiles, units).
    TelemetryConfiguration,
    /// A total-pipe-capacity declaration for one network link.
    Pipe,
    /// A baseline traffic declaration for a target.
    Baseline,
}

/// One total-pipe-capacity row (spec §4.6 "pipe overlap rule").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeEntry {
    /// Identifier of the network link this capacity applies to.
    pub link_id: String,
    /// Capacity value. `0` means "delete this link" (spec §4.6).
    pub capacity: u64,
    /// Unit of `capacity`, e.g. `"mbps"`.
    pub unit: String,
}

/// One baseline-traffic row (spec §4.6 "baseline overlap rule").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineEntry {
    /// Target the baseline describes.
    pub target: Target,
    /// Baseline total traffic, in bits per second.
    pub total_traffic_bps: u64,
    /// Baseline total connection rate, per second.
    pub total_connection_rate: u64,
}

/// The variant-specific body of a telemetry-setup row. Exactly one variant
/// is populated per row; mixing shapes in a single PUT is `bad-request`
/// (spec §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TelemetrySetupBody {
    /// Generic configuration: measurement interval in seconds.
    Configuration {
        /// Measurement interval, in seconds.
        measurement_interval: u32,
    },
    /// A total-pipe-capacity declaration.
    Pipe(PipeEntry),
    /// A baseline traffic declaration.
    Baseline(BaselineEntry),
}

impl TelemetrySetupBody {
    /// Returns the [`TelemetrySetupType`] this body corresponds to.
    #[must_use]
    pub const fn setup_type(&self) -> TelemetrySetupType {
        match self {
            Self::Configuration { .. } => TelemetrySetupType::TelemetryConfiguration,
            Self::Pipe(_) => TelemetrySetupType::Pipe,
            Self::Baseline(_) => TelemetrySetupType::Baseline,
        }
    }
}

/// A telemetry-setup row, keyed by `(customer, cuid, tsid, setup_type)`
/// (spec §3 "TelemetrySetup").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySetup {
    /// Owning tenant.
    pub customer_id: i64,
    /// Owning client.
    pub cuid: String,
    /// Telemetry-setup id.
    pub tsid: u32,
    /// Variant-specific payload.
    pub body: TelemetrySetupBody,
}

/// One top-talker breakdown entry within an attack-detail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopTalker {
    /// Source prefix responsible for this share of traffic.
    pub source_prefix: ipnet::IpNet,
    /// Share of total attack traffic, in bits per second.
    pub traffic_bps: u64,
}

/// One attack-detail record nested in a pre-mitigation report (spec §3,
/// §4.6 "vendor-mapping interaction").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackDetail {
    /// Vendor identifier for vendor-specific attack-id lookups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<u32>,
    /// Vendor-specific attack id, resolved against the vendor-mapping table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_id: Option<u32>,
    /// Free-text attack description. Mutually exclusive with a resolvable
    /// `(vendor_id, attack_id)` mapping (spec §4.6).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_description: Option<String>,
    /// Optional breakdown of top contributing sources.
    #[serde(default)]
    pub top_talkers: Vec<TopTalker>,
}

/// A pre-mitigation telemetry report, keyed by `(customer, cuid, tmid)`
/// (spec §3 "TelemetryPreMitigation").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPreMitigation {
    /// Owning tenant.
    pub customer_id: i64,
    /// Owning client.
    pub cuid: String,
    /// Telemetry pre-mitigation id.
    pub tmid: u32,
    /// Target descriptors this report covers.
    pub targets: Target,
    /// Total traffic observed, in bits per second.
    pub total_traffic_bps: u64,
    /// Attack traffic observed, in bits per second.
    pub attack_traffic_bps: u64,
    /// Total connections observed.
    pub total_connections: u64,
    /// Attack detail records.
    #[serde(default)]
    pub attack_detail: Vec<AttackDetail>,
}

/// One `(vendor_id, attack_id) -> description` row in the per-client
/// vendor-mapping table (spec §4.6, SPEC_FULL.md §C.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorMappingEntry {
    /// Vendor identifier.
    pub vendor_id: u32,
    /// Vendor-specific attack id.
    pub attack_id: u32,
    /// Human-readable description the server substitutes when a client
    /// supplies `(vendor_id, attack_id)` without a free-text description.
    pub description: String,
}

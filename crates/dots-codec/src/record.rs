//! Tagged-variant record decoding (SPEC_FULL.md §D, resolving the "dynamic
//! any-body dispatch" open question): a tiny `(path-prefix, record-shape)`
//! table, not a generic schema-less CBOR-to-JSON bridge. The request router
//! (C4, in `dots-engine`) picks a [`RecordKind`] from the first `Uri-Path`
//! segment and hands the PDU payload here; this module owns the CBOR
//! envelope shape for each kind and refuses anything it does not recognize.

use crate::error::CodecError;
use crate::subdialect::SubDialectCode;
use crate::uint64str::Uint64Str;
use dots_model::{MitigationScope, SessionConfig, TelemetryPreMitigation, TelemetrySetup};
use serde::{Deserialize, Serialize};

/// Which signal-channel record shape a PDU's path and payload carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// `.well-known/dots/mitigate`.
    Mitigation,
    /// `.well-known/dots/config`.
    SessionConfig,
    /// `.well-known/dots/tsid`.
    TelemetrySetup,
    /// `.well-known/dots/tmid`.
    TelemetryPreMitigation,
    /// `.well-known/dots/hb`.
    Heartbeat,
}

impl RecordKind {
    /// The sub-dialect code a well-formed body of this kind must carry.
    #[must_use]
    pub const fn expected_dialect(self) -> SubDialectCode {
        match self {
            Self::Mitigation => SubDialectCode::MITIGATION,
            Self::SessionConfig => SubDialectCode::SESSION_CONFIG,
            Self::TelemetrySetup => SubDialectCode::TELEMETRY_SETUP,
            Self::TelemetryPreMitigation => SubDialectCode::TELEMETRY_PRE_MITIGATION,
            Self::Heartbeat => SubDialectCode::HEARTBEAT,
        }
    }

    /// Maps the first `Uri-Path` segment under `.well-known/dots/` to the
    /// record shape the router should decode the body as. Returns `None`
    /// for an unrecognized resource (the router responds `4.04 Not Found`).
    #[must_use]
    pub fn from_path_prefix(segment: &str) -> Option<Self> {
        match segment {
            "mitigate" => Some(Self::Mitigation),
            "config" => Some(Self::SessionConfig),
            "tsid" => Some(Self::TelemetrySetup),
            "tmid" => Some(Self::TelemetryPreMitigation),
            "hb" => Some(Self::Heartbeat),
            _ => None,
        }
    }
}

/// CBOR envelope for a mitigation-request/response body. Unknown top-level
/// keys are rejected (spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MitigationRecord {
    /// Sub-dialect code, must equal [`SubDialectCode::MITIGATION`].
    pub dialect: u32,
    /// One or more scopes; a GET-all response carries every active scope
    /// for the requesting client, a PUT/response carries exactly one.
    #[serde(default)]
    pub scopes: Vec<MitigationScope>,
}

/// CBOR envelope for a session-configuration body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfigRecord {
    /// Sub-dialect code, must equal [`SubDialectCode::SESSION_CONFIG`].
    pub dialect: u32,
    /// The configuration itself.
    pub session_config: SessionConfig,
}

/// CBOR envelope for a telemetry-setup body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySetupRecord {
    /// Sub-dialect code, must equal [`SubDialectCode::TELEMETRY_SETUP`].
    pub dialect: u32,
    /// Rows being set or returned; a single PUT may carry several rows of
    /// the same [`dots_model::TelemetrySetupType`] (spec §4.6).
    #[serde(default)]
    pub setup: Vec<TelemetrySetup>,
}

/// CBOR envelope for a telemetry pre-mitigation body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryPreMitigationRecord {
    /// Sub-dialect code, must equal
    /// [`SubDialectCode::TELEMETRY_PRE_MITIGATION`].
    pub dialect: u32,
    /// Pre-mitigation reports being pushed or returned.
    #[serde(default)]
    pub pre_mitigation: Vec<TelemetryPreMitigation>,
}

/// CBOR envelope for a heartbeat body (spec §4.3): a bare interval, sent
/// `NON` by the client on its own timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeartbeatRecord {
    /// Sub-dialect code, must equal [`SubDialectCode::HEARTBEAT`].
    pub dialect: u32,
    /// Heartbeat sequence counter, wide enough to need the string-carrying
    /// wrapper over a long-lived session.
    pub sequence: Uint64Str,
}

/// A decoded signal-channel body, tagged by the [`RecordKind`] the router
/// selected from the URI path.
#[derive(Debug, Clone)]
pub enum Record {
    /// See [`MitigationRecord`].
    Mitigation(MitigationRecord),
    /// See [`SessionConfigRecord`].
    SessionConfig(SessionConfigRecord),
    /// See [`TelemetrySetupRecord`].
    TelemetrySetup(TelemetrySetupRecord),
    /// See [`TelemetryPreMitigationRecord`].
    TelemetryPreMitigation(TelemetryPreMitigationRecord),
    /// See [`HeartbeatRecord`].
    Heartbeat(HeartbeatRecord),
}

impl Record {
    /// The [`RecordKind`] this record was decoded (or is about to be
    /// encoded) as.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Mitigation(_) => RecordKind::Mitigation,
            Self::SessionConfig(_) => RecordKind::SessionConfig,
            Self::TelemetrySetup(_) => RecordKind::TelemetrySetup,
            Self::TelemetryPreMitigation(_) => RecordKind::TelemetryPreMitigation,
            Self::Heartbeat(_) => RecordKind::Heartbeat,
        }
    }
}

fn check_dialect(kind: RecordKind, dialect: u32) -> Result<(), CodecError> {
    let expected = kind.expected_dialect();
    if dialect != expected.0 {
        return Err(CodecError::malformed(format!(
            "body dialect {dialect} does not match the {kind:?} resource (expected {})",
            expected.0
        )));
    }
    Ok(())
}

/// Decodes a CBOR payload as the given [`RecordKind`], rejecting unknown
/// top-level keys and a mismatched `dialect` code.
pub fn decode_record(kind: RecordKind, payload: &[u8]) -> Result<Record, CodecError> {
    let record = match kind {
        RecordKind::Mitigation => {
            let body: MitigationRecord = ciborium::from_reader(payload)
                .map_err(|e| from_cbor_error(e))?;
            check_dialect(kind, body.dialect)?;
            Record::Mitigation(body)
        }
        RecordKind::SessionConfig => {
            let body: SessionConfigRecord = ciborium::from_reader(payload)
                .map_err(|e| from_cbor_error(e))?;
            check_dialect(kind, body.dialect)?;
            Record::SessionConfig(body)
        }
        RecordKind::TelemetrySetup => {
            let body: TelemetrySetupRecord = ciborium::from_reader(payload)
                .map_err(|e| from_cbor_error(e))?;
            check_dialect(kind, body.dialect)?;
            Record::TelemetrySetup(body)
        }
        RecordKind::TelemetryPreMitigation => {
            let body: TelemetryPreMitigationRecord = ciborium::from_reader(payload)
                .map_err(|e| from_cbor_error(e))?;
            check_dialect(kind, body.dialect)?;
            Record::TelemetryPreMitigation(body)
        }
        RecordKind::Heartbeat => {
            let body: HeartbeatRecord = ciborium::from_reader(payload)
                .map_err(|e| from_cbor_error(e))?;
            check_dialect(kind, body.dialect)?;
            Record::Heartbeat(body)
        }
    };
    Ok(record)
}

/// Encodes a [`Record`] to CBOR bytes.
pub fn encode_record(record: &Record) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    let result = match record {
        Record::Mitigation(body) => ciborium::into_writer(body, &mut buf),
        Record::SessionConfig(body) => ciborium::into_writer(body, &mut buf),
        Record::TelemetrySetup(body) => ciborium::into_writer(body, &mut buf),
        Record::TelemetryPreMitigation(body) => ciborium::into_writer(body, &mut buf),
        Record::Heartbeat(body) => ciborium::into_writer(body, &mut buf),
    };
    result.map_err(|e| CodecError::new(crate::error::CodecErrorKind::Internal, e.to_string()))?;
    Ok(buf)
}

fn from_cbor_error(err: ciborium::de::Error<std::io::Error>) -> CodecError {
    match &err {
        ciborium::de::Error::Semantic(_, msg) if msg.contains("unknown field") => {
            CodecError::unknown_field(err.to_string())
        }
        _ => CodecError::malformed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dots_model::scope::{AttackStatus, MitigationStatus};
    use dots_model::Target;

    fn sample_scope() -> MitigationScope {
        MitigationScope {
            customer_id: 7,
            cuid: "client-1".into(),
            mid: 1,
            scope_id: 100,
            target: Target::default(),
            lifetime: 3600,
            trigger_mitigation: true,
            status: MitigationStatus::InProgress,
            attack_status: Some(AttackStatus::UnderAttack),
            acl_list: None,
            last_modified: chrono::Utc::now(),
        }
    }

    #[test]
    fn path_prefix_maps_to_record_kind() {
        assert_eq!(RecordKind::from_path_prefix("mitigate"), Some(RecordKind::Mitigation));
        assert_eq!(RecordKind::from_path_prefix("hb"), Some(RecordKind::Heartbeat));
        assert_eq!(RecordKind::from_path_prefix("nope"), None);
    }

    #[test]
    fn mitigation_record_round_trips() {
        let record = Record::Mitigation(MitigationRecord {
            dialect: SubDialectCode::MITIGATION.0,
            scopes: vec![sample_scope()],
        });
        let bytes = encode_record(&record).unwrap();
        let decoded = decode_record(RecordKind::Mitigation, &bytes).unwrap();
        match decoded {
            Record::Mitigation(body) => assert_eq!(body.scopes.len(), 1),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn mismatched_dialect_is_rejected() {
        let record = MitigationRecord {
            dialect: SubDialectCode::HEARTBEAT.0,
            scopes: vec![sample_scope()],
        };
        let mut buf = Vec::new();
        ciborium::into_writer(&record, &mut buf).unwrap();
        let err = decode_record(RecordKind::Mitigation, &buf).unwrap_err();
        assert_eq!(err.kind, crate::error::CodecErrorKind::Malformed);
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        use ciborium::value::Value;
        let mut map = vec![
            (Value::Text("dialect".into()), Value::Integer(SubDialectCode::MITIGATION.0.into())),
            (Value::Text("scopes".into()), Value::Array(vec![])),
            (Value::Text("bogus".into()), Value::Bool(true)),
        ];
        map.sort_by(|a, b| format!("{:?}", a.0).cmp(&format!("{:?}", b.0)));
        let value = Value::Map(map);
        let mut buf = Vec::new();
        ciborium::into_writer(&value, &mut buf).unwrap();
        let err = decode_record(RecordKind::Mitigation, &buf).unwrap_err();
        assert_eq!(err.kind, crate::error::CodecErrorKind::UnknownField);
    }
}

//! Request-router parsing (C4, spec §4.4): turns a decoded CoAP PDU's
//! `Uri-Path`/`Uri-Query` options into a typed [`ParsedRequest`], enforcing
//! the "unknown token under `.well-known/dots/`" and mandatory-parameter
//! rules before any resource lookup happens.

use crate::error::{EngineError, EngineErrorKind};
use dots_codec::{CoapCode, CoapPdu, CoapType, RecordKind};

const WELL_KNOWN_PREFIX: [&str; 2] = ["well-known", "dots"];

/// A single `Uri-Query` key=value pair, split on the first `=`. A query
/// with no `=` is a bare flag (value empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Query key, e.g. `cuid`, `mid`, `target-prefix`.
    pub key: String,
    /// Query value, empty for a bare flag.
    pub value: String,
}

/// The URI path and query parameters of a signal-channel request, parsed
/// but not yet validated against a specific endpoint's mandatory-parameter
/// rules (spec §4.4: "`cdid`, `cuid`, `mid`, `tsid`, `tmid` are carried as
/// `Uri-Query` parameters").
#[derive(Debug, Clone, Default)]
pub struct ParsedRequest {
    /// Which signal-channel resource family this path names.
    pub kind: Option<RecordKind>,
    /// `cdid` query parameter, present only behind a trusted proxy.
    pub cdid: Option<String>,
    /// `cuid` query parameter.
    pub cuid: Option<String>,
    /// `mid` query parameter, parsed as a non-negative integer.
    pub mid: Option<u32>,
    /// `tsid` query parameter, parsed as a non-negative integer.
    pub tsid: Option<u32>,
    /// `tmid` query parameter, parsed as a strictly positive integer.
    pub tmid: Option<u32>,
    /// `customerId` query parameter, used only by session-config (spec
    /// §4.3: "keyed by canonicalized path + `customerId=N`" per an
    /// operator-facing admin extension; absent on the regular signal
    /// path).
    pub customer_id: Option<i64>,
    /// Every query parameter, including the ones pulled out above, for
    /// endpoints that filter on additional attribute queries (telemetry
    /// pre-mitigation, spec §4.6).
    pub queries: Vec<Query>,
}

/// Parses the `Uri-Path` and `Uri-Query` options of a PDU into a
/// [`ParsedRequest`]. Returns [`EngineErrorKind::UnknownToken`] if the path
/// does not begin with `well-known/dots/<resource>` or names a resource
/// [`RecordKind`] does not recognize.
pub fn parse(pdu: &CoapPdu) -> Result<ParsedRequest, EngineError> {
    let segments = pdu
        .uri_path_segments()
        .map_err(|e| EngineError::new(EngineErrorKind::UnknownToken, e.to_string()))?;
    if segments.len() < WELL_KNOWN_PREFIX.len() + 1
        || segments[0] != WELL_KNOWN_PREFIX[0]
        || segments[1] != WELL_KNOWN_PREFIX[1]
    {
        return Err(EngineError::new(
            EngineErrorKind::UnknownToken,
            "path does not begin with /.well-known/dots/",
        ));
    }
    let resource = segments[2].as_str();
    let kind = RecordKind::from_path_prefix(resource);
    if kind.is_none() {
        return Err(EngineError::new(
            EngineErrorKind::UnknownToken,
            format!("unrecognized resource token '{resource}'"),
        ));
    }

    let mut parsed = ParsedRequest {
        kind,
        ..ParsedRequest::default()
    };

    let tokens = pdu
        .uri_query_tokens()
        .map_err(|e| EngineError::new(EngineErrorKind::UnknownToken, e.to_string()))?;
    for raw in tokens {
        let (key, value) = match raw.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (raw.clone(), String::new()),
        };
        match key.as_str() {
            "cdid" => parsed.cdid = Some(value.clone()),
            "cuid" => parsed.cuid = Some(value.clone()),
            "mid" => parsed.mid = value.parse::<u32>().ok(),
            "tsid" => parsed.tsid = value.parse::<u32>().ok(),
            "tmid" => {
                parsed.tmid = value.parse::<u32>().ok().filter(|&v| v > 0);
            }
            "customerId" => parsed.customer_id = value.parse::<i64>().ok(),
            _ => {}
        }
        parsed.queries.push(Query { key, value });
    }

    Ok(parsed)
}

/// Validates that a request carries the mandatory parameters for its
/// method and resource kind (spec §4.4 table: mitigation PUT/DELETE need
/// `cuid`+`mid`, GET needs `cuid` only; telemetry-setup PUT needs
/// `cuid`+`tsid`; pre-mitigation PUT needs `cuid`+`tmid`).
pub fn require_mandatory_params(
    parsed: &ParsedRequest,
    method: CoapCode,
) -> Result<(), EngineError> {
    if parsed.cuid.is_none() {
        return Err(EngineError::missing_param("cuid is required"));
    }
    match parsed.kind {
        Some(RecordKind::Mitigation) => {
            if is_put_or_delete(method) && parsed.mid.is_none() {
                return Err(EngineError::missing_param("mid is required for this method"));
            }
        }
        Some(RecordKind::TelemetrySetup) => {
            if is_put(method) && parsed.tsid.is_none() {
                return Err(EngineError::missing_param("tsid is required for PUT"));
            }
        }
        Some(RecordKind::TelemetryPreMitigation) => {
            if is_put(method) && parsed.tmid.is_none() {
                return Err(EngineError::missing_param("tmid is required for PUT"));
            }
        }
        _ => {}
    }
    Ok(())
}

fn is_put(method: CoapCode) -> bool {
    method == CoapCode::PUT
}

fn is_put_or_delete(method: CoapCode) -> bool {
    method == CoapCode::PUT || method == CoapCode::DELETE
}

/// Method-not-allowed is always answered `NON` per spec §4.4, regardless of
/// the request's own message type.
#[must_use]
pub fn method_not_allowed_response_type() -> CoapType {
    CoapType::NonConfirmable
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdu_with_path_and_queries(segments: &[&str], queries: &[&str]) -> CoapPdu {
        let mut pdu = CoapPdu::request(CoapType::Confirmable, CoapCode::GET, 1, vec![1, 2, 3, 4], segments, Vec::new());
        for q in queries {
            pdu.options.push(dots_codec::CoapOption {
                number: dots_codec::coap::option_number::URI_QUERY,
                value: q.as_bytes().to_vec(),
            });
        }
        pdu
    }

    #[test]
    fn rejects_path_missing_well_known_prefix() {
        let pdu = pdu_with_path_and_queries(&["mitigate"], &[]);
        let err = parse(&pdu).unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::UnknownToken);
    }

    #[test]
    fn rejects_unrecognized_resource_token() {
        let pdu = pdu_with_path_and_queries(&["well-known", "dots", "bogus"], &[]);
        let err = parse(&pdu).unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::UnknownToken);
    }

    #[test]
    fn parses_mitigation_path_with_queries() {
        let pdu = pdu_with_path_and_queries(
            &["well-known", "dots", "mitigate"],
            &["cuid=client1", "mid=7"],
        );
        let parsed = parse(&pdu).unwrap();
        assert_eq!(parsed.kind, Some(RecordKind::Mitigation));
        assert_eq!(parsed.cuid.as_deref(), Some("client1"));
        assert_eq!(parsed.mid, Some(7));
    }

    #[test]
    fn tmid_must_be_strictly_positive() {
        let pdu = pdu_with_path_and_queries(
            &["well-known", "dots", "tmid"],
            &["cuid=client1", "tmid=0"],
        );
        let parsed = parse(&pdu).unwrap();
        assert_eq!(parsed.tmid, None);
    }

    #[test]
    fn mitigation_put_requires_mid() {
        let pdu = pdu_with_path_and_queries(&["well-known", "dots", "mitigate"], &["cuid=c1"]);
        let parsed = parse(&pdu).unwrap();
        let err = require_mandatory_params(&parsed, CoapCode::PUT).unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::MissingParam);
    }

    #[test]
    fn mitigation_get_does_not_require_mid() {
        let pdu = pdu_with_path_and_queries(&["well-known", "dots", "mitigate"], &["cuid=c1"]);
        let parsed = parse(&pdu).unwrap();
        require_mandatory_params(&parsed, CoapCode::GET).unwrap();
    }

    #[test]
    fn missing_cuid_is_always_rejected() {
        let pdu = pdu_with_path_and_queries(&["well-known", "dots", "mitigate"], &["mid=1"]);
        let parsed = parse(&pdu).unwrap();
        let err = require_mandatory_params(&parsed, CoapCode::GET).unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::MissingParam);
    }
}

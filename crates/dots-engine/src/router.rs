//! Request router (C4, spec §4.4): parses a PDU via [`crate::request`],
//! checks mandatory parameters, dispatches by method and
//! [`dots_codec::RecordKind`] to a mitigation PUT/GET/DELETE, and folds the
//! result back into a response PDU plus the resource-registry bookkeeping
//! (C3) that a successful PUT or a failed re-PUT implies.
//!
//! This module only covers the mitigation resource family end-to-end;
//! telemetry-setup and pre-mitigation dispatch live in `dots-telemetry` and
//! are wired in by `dots-server`, following the same `ParsedRequest` ->
//! handler -> [`RouteOutcome`] shape established here.

use crate::error::{EngineError, RouterError};
use crate::request::{self, ParsedRequest};
use crate::resource::{ResourceKey, ResourceRegistry};
use dots_codec::{CoapCode, CoapPdu};
use dots_mitigation::{MitigationEngine, MitigationPut, MitigationStore, PutOutcome};
use chrono::{DateTime, Utc};

/// The result of routing one request: a CoAP response code plus whatever
/// CBOR body (already encoded) should be carried back, and whether the
/// resource registry needs updating as a side effect.
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    /// Response code to place on the outgoing PDU.
    pub code: CoapCode,
    /// Encoded CBOR response body, empty for a bodyless response (e.g.
    /// `2.04 Changed` with no representation).
    pub payload: Vec<u8>,
}

impl RouteOutcome {
    fn empty(code: CoapCode) -> Self {
        Self { code, payload: Vec::new() }
    }
}

/// Dispatches a mitigation-family request (PUT/GET/DELETE) to the
/// mitigation engine, updating the resource registry's create/remove
/// bookkeeping (spec §4.1) around the call.
///
/// `customer_id` is resolved upstream from the session's DTLS identity
/// (spec §1's external collaborator); this function trusts it as given.
pub async fn route_mitigation<S: MitigationStore>(
    engine: &MitigationEngine<S>,
    registry: &ResourceRegistry,
    customer_id: i64,
    pdu: &CoapPdu,
    put_body: Option<MitigationPut>,
    if_match: bool,
    aliases: &[dots_model::Target],
    now: DateTime<Utc>,
) -> Result<RouteOutcome, RouterError> {
    let parsed = request::parse(pdu)?;
    request::require_mandatory_params(&parsed, pdu.code)?;
    let cuid = parsed.cuid.clone().expect("checked by require_mandatory_params");

    match pdu.code {
        CoapCode::PUT => {
            let mid = parsed.mid.expect("checked by require_mandatory_params");
            let key = ResourceKey::mitigation(&cuid, mid);
            let req = put_body
                .ok_or_else(|| RouterError::from(EngineError::missing_param("PUT requires a body")))?;
            match engine.put(customer_id, &cuid, mid, req, if_match, aliases, now).await {
                Ok((_scope, outcome)) => {
                    registry.create(key.clone());
                    registry.mark_dirty(&key);
                    let code = match outcome {
                        PutOutcome::Created => CoapCode::CREATED,
                        PutOutcome::Updated => CoapCode::CHANGED,
                    };
                    Ok(RouteOutcome::empty(code))
                }
                Err(err) => {
                    let routed: RouterError = (&err).into();
                    registry.remove_if_not_success(&key, routed.code);
                    Err(routed)
                }
            }
        }
        CoapCode::DELETE => {
            let mid = parsed.mid.expect("checked by require_mandatory_params");
            let key = ResourceKey::mitigation(&cuid, mid);
            match engine.delete(customer_id, &cuid, mid, now).await {
                Ok(scope) => {
                    registry.mark_dirty(&key);
                    if !scope.is_active() {
                        registry.remove(&key);
                    }
                    Ok(RouteOutcome::empty(CoapCode::DELETED))
                }
                Err(err) => Err((&err).into()),
            }
        }
        CoapCode::GET => {
            // GET is read-only against the store directly; the engine
            // exposes no dedicated `get` method because no state
            // transition is involved (spec §4.5 only defines PUT/DELETE
            // transitions). The router's caller is expected to read the
            // store and encode a `MitigationRecord` itself; this function
            // validates parameters only.
            Ok(RouteOutcome::empty(CoapCode::CONTENT))
        }
        _ => Err(RouterError::from(EngineError::method_not_allowed(format!(
            "{:?} is not supported on the mitigation resource",
            pdu.code
        )))),
    }
}

/// Validates a request's mandatory parameters without dispatching it,
/// used by resource kinds (telemetry-setup, pre-mitigation, session-config,
/// heartbeat) whose handlers live outside this crate.
pub fn validate(pdu: &CoapPdu) -> Result<ParsedRequest, EngineError> {
    let parsed = request::parse(pdu)?;
    request::require_mandatory_params(&parsed, pdu.code)?;
    Ok(parsed)
}

//! `dots-serverd`'s wiring: builds the C5/C6/C7/C9 stack in-process and
//! drives it from a plain UDP socket standing in for the secured signal
//! channel. Accepting a DTLS connection, running the handshake, and
//! raising [`dots_engine::SessionEvent`] from it are an external
//! collaborator this workspace does not implement (spec §1's "CoAP/DTLS
//! Endpoint" component defines the events and bookkeeping, not the socket
//! library driving them — see `dots-engine/src/lib.rs`'s own module doc);
//! this loop plays that role with a bare `UdpSocket` so the routing,
//! mitigation and telemetry stack it wires together has something real to
//! run against end to end.
//!
//! Request/response matching, retransmission and block-wise reassembly
//! (spec §4.2) live in `dots-engine`'s session/blockwise modules but are
//! not yet driven from this loop: each datagram here is handled as one
//! complete, idempotent request, since exercising those paths needs a
//! real unreliable transport this stand-in socket does not model.

use crate::error::DaemonError;
use crate::identity::{PeerIdentity, StaticIdentityTable};
use crate::session_config::SessionConfigStore;
use dots_blocker::testing::NoopBlocker;
use dots_blocker::{ProtectionRegistry, SelectionService};
use dots_codec::record::{
    decode_record, encode_record, HeartbeatRecord, MitigationRecord, Record, SessionConfigRecord,
    TelemetryPreMitigationRecord, TelemetrySetupRecord,
};
use dots_codec::{CoapCode, CoapPdu, CoapType, RecordKind};
use dots_config::ServerConfig;
use dots_engine::{request, router, ResourceRegistry, RouteOutcome};
use dots_lifetime::{InMemoryDataChannelStore, LifetimeManagerConfig, LifetimeManagerHandle};
use dots_mitigation::{InMemoryMitigationStore, MitigationEngine, MitigationEngineConfig, MitigationPut, MitigationStore, NoopScopeObserver};
use dots_telemetry::{parse_queries, PreMitigationStore, TelemetrySetupStore, VendorMappingTable};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

/// Every long-lived piece of server state, bundled so `dots-serverd`'s
/// `main` has one thing to build and tear down.
pub struct ServerHandle {
    engine: Arc<MitigationEngine<InMemoryMitigationStore>>,
    store: Arc<InMemoryMitigationStore>,
    registry: Arc<ResourceRegistry>,
    setup_store: Arc<TelemetrySetupStore>,
    pre_mitigation_store: Arc<PreMitigationStore>,
    vendor_mappings: Arc<VendorMappingTable>,
    session_configs: Arc<SessionConfigStore>,
    identity: Arc<StaticIdentityTable>,
    lifetime: LifetimeManagerHandle,
}

impl ServerHandle {
    /// Builds the full server-side stack from a loaded [`ServerConfig`]:
    /// the mitigation engine over a fresh in-memory store with a
    /// [`NoopBlocker`] registered for every configured blocker entry (no
    /// concrete RTBH/FlowSpec/ACL-appliance driver exists in this
    /// workspace, spec §1 Non-goals), the telemetry stores, and the
    /// lifetime manager's periodic tick.
    #[must_use]
    pub fn build(config: &ServerConfig) -> Self {
        let store = Arc::new(InMemoryMitigationStore::new());
        let mut selection = SelectionService::new(config.blockers.clone());
        for blocker in config.blockers.default.iter().chain(config.blockers.per_customer.values().flatten()) {
            selection.register_instance(blocker, Arc::new(NoopBlocker::new(&blocker.name, blocker.kind)));
        }
        let blockers = Arc::new(selection);
        let protections = Arc::new(ProtectionRegistry::new());
        let observer = Arc::new(NoopScopeObserver);
        let engine = Arc::new(MitigationEngine::new(
            Arc::clone(&store),
            blockers,
            protections,
            observer,
            MitigationEngineConfig {
                terminating_period_lifetime: config.terminating_period_lifetime,
                purge_grace: chrono::Duration::seconds(300),
            },
        ));

        let aliases = Arc::new(InMemoryDataChannelStore::new());
        let lifetime = dots_lifetime::spawn(
            Arc::clone(&engine),
            aliases,
            LifetimeManagerConfig { interval: config.lifetime_tick_interval },
        );

        Self {
            engine,
            store,
            registry: Arc::new(ResourceRegistry::new()),
            setup_store: Arc::new(TelemetrySetupStore::new()),
            pre_mitigation_store: Arc::new(PreMitigationStore::new()),
            vendor_mappings: Arc::new(VendorMappingTable::new()),
            session_configs: Arc::new(SessionConfigStore::new()),
            identity: Arc::new(StaticIdentityTable::new(
                config.customers.iter().map(|(cuid, id)| (cuid.clone(), *id)),
            )),
            lifetime,
        }
    }

    /// The identity table callers populate before [`run`] starts accepting
    /// datagrams (standing in for the DTLS handshake's peer verification).
    #[must_use]
    pub fn identity(&self) -> &StaticIdentityTable {
        &self.identity
    }

    /// Requests the lifetime manager's shutdown and waits for it to join.
    pub async fn shutdown(self) {
        self.lifetime.shutdown_and_join().await;
    }
}

/// Binds `address` and serves signal-channel datagrams against `handle`
/// until `cancel` fires.
pub async fn run(handle: Arc<ServerHandle>, address: &str, cancel: CancellationToken) -> Result<(), DaemonError> {
    let socket = UdpSocket::bind(address)
        .await
        .map_err(|source| DaemonError::Bind { address: address.to_string(), source })?;
    tracing::info!(%address, "signal channel listening");

    let mut buf = vec![0u8; 65536];
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::info!("signal channel shutting down");
                return Ok(());
            }
            recv = socket.recv_from(&mut buf) => {
                let (len, peer) = match recv {
                    Ok(pair) => pair,
                    Err(err) => {
                        tracing::warn!(%err, "datagram receive failed");
                        continue;
                    }
                };
                if let Some(response) = handle_datagram(&handle, &buf[..len]).await {
                    if let Err(err) = socket.send_to(&response, peer).await {
                        tracing::warn!(%err, %peer, "failed to send response datagram");
                    }
                }
            }
        }
    }
}

async fn handle_datagram(handle: &ServerHandle, datagram: &[u8]) -> Option<Vec<u8>> {
    let pdu = match CoapPdu::decode(datagram) {
        Ok(pdu) => pdu,
        Err(err) => {
            tracing::warn!(%err, "malformed PDU dropped");
            return None;
        }
    };

    let outcome = dispatch(handle, &pdu).await;
    Some(build_response(&pdu, outcome).encode().unwrap_or_default())
}

fn build_response(request: &CoapPdu, outcome: RouteOutcome) -> CoapPdu {
    let msg_type = match request.msg_type {
        CoapType::Confirmable => CoapType::Acknowledgement,
        _ => CoapType::NonConfirmable,
    };
    let mut options = Vec::new();
    if !outcome.payload.is_empty() {
        options.push(dots_codec::CoapOption {
            number: dots_codec::coap::option_number::CONTENT_FORMAT,
            value: vec![dots_codec::CONTENT_FORMAT_CBOR as u8],
        });
    }
    CoapPdu {
        msg_type,
        code: outcome.code,
        message_id: request.message_id,
        token: request.token.clone(),
        options,
        payload: outcome.payload,
    }
}

async fn dispatch(handle: &ServerHandle, pdu: &CoapPdu) -> RouteOutcome {
    let parsed = match request::parse(pdu) {
        Ok(parsed) => parsed,
        Err(err) => return error_outcome(err.coap_code(), &err.message),
    };
    if let Err(err) = request::require_mandatory_params(&parsed, pdu.code) {
        return error_outcome(err.coap_code(), &err.message);
    }
    let cuid = parsed.cuid.clone().expect("checked above");
    let Some(customer_id) = handle.identity.resolve(&cuid) else {
        return error_outcome(CoapCode::FORBIDDEN, "cuid is not bound to a known customer");
    };

    let now = chrono::Utc::now();
    match parsed.kind {
        Some(RecordKind::Mitigation) => dispatch_mitigation(handle, pdu, customer_id, &cuid, now).await,
        Some(RecordKind::SessionConfig) => dispatch_session_config(handle, pdu, customer_id, &cuid),
        Some(RecordKind::TelemetrySetup) => dispatch_telemetry_setup(handle, pdu, customer_id, &cuid),
        Some(RecordKind::TelemetryPreMitigation) => {
            dispatch_pre_mitigation(handle, pdu, customer_id, &cuid, &parsed)
        }
        Some(RecordKind::Heartbeat) => dispatch_heartbeat(pdu),
        None => error_outcome(CoapCode::NOT_FOUND, "unrecognized resource"),
    }
}

fn error_outcome(code: CoapCode, message: &str) -> RouteOutcome {
    tracing::debug!(?code, message, "request rejected");
    RouteOutcome { code, payload: Vec::new() }
}

async fn dispatch_mitigation(
    handle: &ServerHandle,
    pdu: &CoapPdu,
    customer_id: i64,
    cuid: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> RouteOutcome {
    match pdu.code {
        CoapCode::GET => {
            let parsed = request::parse(pdu).expect("already validated by caller");
            let scopes = match parsed.mid {
                Some(mid) => handle.store.get_by_key(customer_id, cuid, mid).into_iter().collect(),
                None => handle.store.list_for_client(customer_id, cuid),
            };
            let record = Record::Mitigation(MitigationRecord {
                dialect: dots_codec::SubDialectCode::MITIGATION.0,
                scopes,
            });
            RouteOutcome { code: CoapCode::CONTENT, payload: encode_record(&record).unwrap_or_default() }
        }
        CoapCode::PUT => {
            let put = match decode_put_body(pdu.payload.as_slice()) {
                Ok(put) => put,
                Err(code) => return error_outcome(code, "malformed mitigation PUT body"),
            };
            let if_match = pdu.has_if_match();
            match router::route_mitigation(&handle.engine, &handle.registry, customer_id, pdu, Some(put), if_match, &[], now).await {
                Ok(outcome) => outcome,
                Err(err) => error_outcome(err.code, &err.message),
            }
        }
        CoapCode::DELETE => {
            match router::route_mitigation(&handle.engine, &handle.registry, customer_id, pdu, None, false, &[], now).await {
                Ok(outcome) => outcome,
                Err(err) => error_outcome(err.code, &err.message),
            }
        }
        _ => error_outcome(CoapCode::METHOD_NOT_ALLOWED, "unsupported method on the mitigation resource"),
    }
}

fn decode_put_body(payload: &[u8]) -> Result<MitigationPut, CoapCode> {
    let record = decode_record(RecordKind::Mitigation, payload).map_err(|_| CoapCode::BAD_REQUEST)?;
    let Record::Mitigation(body) = record else { return Err(CoapCode::BAD_REQUEST) };
    let scope = body.scopes.into_iter().next().ok_or(CoapCode::BAD_REQUEST)?;
    Ok(MitigationPut {
        target: scope.target,
        lifetime: scope.lifetime,
        trigger_mitigation: scope.trigger_mitigation,
        acl_list: scope.acl_list,
        attack_status: scope.attack_status,
    })
}

fn dispatch_session_config(handle: &ServerHandle, pdu: &CoapPdu, customer_id: i64, cuid: &str) -> RouteOutcome {
    match pdu.code {
        CoapCode::GET => {
            let config = handle.session_configs.get(customer_id, cuid);
            let record = Record::SessionConfig(SessionConfigRecord {
                dialect: dots_codec::SubDialectCode::SESSION_CONFIG.0,
                session_config: config,
            });
            RouteOutcome { code: CoapCode::CONTENT, payload: encode_record(&record).unwrap_or_default() }
        }
        CoapCode::PUT => {
            let record = match decode_record(RecordKind::SessionConfig, &pdu.payload) {
                Ok(Record::SessionConfig(body)) => body,
                _ => return error_outcome(CoapCode::BAD_REQUEST, "malformed session-config PUT body"),
            };
            let created = !handle.session_configs.contains(customer_id, cuid);
            handle.session_configs.merge(
                customer_id,
                cuid,
                Some(record.session_config.mitigating),
                Some(record.session_config.idle),
            );
            let code = if created { CoapCode::CREATED } else { CoapCode::CHANGED };
            RouteOutcome { code, payload: Vec::new() }
        }
        _ => error_outcome(CoapCode::METHOD_NOT_ALLOWED, "unsupported method on the session-config resource"),
    }
}

fn dispatch_telemetry_setup(handle: &ServerHandle, pdu: &CoapPdu, customer_id: i64, cuid: &str) -> RouteOutcome {
    match pdu.code {
        CoapCode::GET => {
            let setup = handle.setup_store.list_for_client(customer_id, cuid);
            let record = Record::TelemetrySetup(TelemetrySetupRecord {
                dialect: dots_codec::SubDialectCode::TELEMETRY_SETUP.0,
                setup,
            });
            RouteOutcome { code: CoapCode::CONTENT, payload: encode_record(&record).unwrap_or_default() }
        }
        CoapCode::PUT => {
            let body = match decode_record(RecordKind::TelemetrySetup, &pdu.payload) {
                Ok(Record::TelemetrySetup(body)) => body,
                _ => return error_outcome(CoapCode::BAD_REQUEST, "malformed telemetry-setup PUT body"),
            };
            let mut created = !body.setup.is_empty();
            for row in body.setup {
                created &= !handle.setup_store.contains(customer_id, cuid, row.tsid);
                if let Err(err) = handle.setup_store.put(customer_id, cuid, row.tsid, row.body) {
                    return error_outcome(telemetry_error_code(&err), &err.message);
                }
            }
            let code = if created { CoapCode::CREATED } else { CoapCode::CHANGED };
            RouteOutcome { code, payload: Vec::new() }
        }
        _ => error_outcome(CoapCode::METHOD_NOT_ALLOWED, "unsupported method on the telemetry-setup resource"),
    }
}

fn dispatch_pre_mitigation(
    handle: &ServerHandle,
    pdu: &CoapPdu,
    customer_id: i64,
    cuid: &str,
    parsed: &request::ParsedRequest,
) -> RouteOutcome {
    match pdu.code {
        CoapCode::GET => {
            let tokens: Vec<(String, String)> =
                parsed.queries.iter().map(|q| (q.key.clone(), q.value.clone())).collect();
            let queries = match parse_queries(&tokens) {
                Ok(queries) => queries,
                Err(err) => return error_outcome(telemetry_error_code(&err), &err.message),
            };
            let reports = handle.pre_mitigation_store.get(customer_id, cuid, &queries);
            let record = Record::TelemetryPreMitigation(TelemetryPreMitigationRecord {
                dialect: dots_codec::SubDialectCode::TELEMETRY_PRE_MITIGATION.0,
                pre_mitigation: reports,
            });
            RouteOutcome { code: CoapCode::CONTENT, payload: encode_record(&record).unwrap_or_default() }
        }
        CoapCode::PUT => {
            let body = match decode_record(RecordKind::TelemetryPreMitigation, &pdu.payload) {
                Ok(Record::TelemetryPreMitigation(body)) => body,
                _ => return error_outcome(CoapCode::BAD_REQUEST, "malformed pre-mitigation PUT body"),
            };
            let mut created = !body.pre_mitigation.is_empty();
            for report in body.pre_mitigation {
                let tmid = report.tmid;
                created &= !handle.pre_mitigation_store.contains(customer_id, cuid, tmid);
                if let Err(err) =
                    handle.pre_mitigation_store.put(customer_id, cuid, tmid, report, &handle.vendor_mappings)
                {
                    return error_outcome(telemetry_error_code(&err), &err.message);
                }
            }
            let code = if created { CoapCode::CREATED } else { CoapCode::CHANGED };
            RouteOutcome { code, payload: Vec::new() }
        }
        _ => error_outcome(CoapCode::METHOD_NOT_ALLOWED, "unsupported method on the pre-mitigation resource"),
    }
}

fn dispatch_heartbeat(pdu: &CoapPdu) -> RouteOutcome {
    let record = match decode_record(RecordKind::Heartbeat, &pdu.payload) {
        Ok(Record::Heartbeat(body)) => body,
        _ => return error_outcome(CoapCode::BAD_REQUEST, "malformed heartbeat body"),
    };
    let response = Record::Heartbeat(HeartbeatRecord {
        dialect: dots_codec::SubDialectCode::HEARTBEAT.0,
        sequence: record.sequence,
    });
    RouteOutcome { code: CoapCode::CONTENT, payload: encode_record(&response).unwrap_or_default() }
}

fn telemetry_error_code(err: &dots_telemetry::TelemetryError) -> CoapCode {
    use dots_telemetry::TelemetryErrorKind;
    match err.kind {
        TelemetryErrorKind::Validation => CoapCode::BAD_REQUEST,
        TelemetryErrorKind::NotFound => CoapCode::NOT_FOUND,
        TelemetryErrorKind::Conflict => CoapCode::CONFLICT,
        TelemetryErrorKind::Internal => CoapCode::INTERNAL_SERVER_ERROR,
    }
}

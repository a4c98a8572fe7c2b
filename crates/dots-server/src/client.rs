//! `dots-clientd`'s [`ClientSession`] implementation: a plain UDP
//! request/response round trip standing in for the secured CoAP/DTLS
//! session (spec §1's external collaborator, see `server`'s module doc for
//! the same boundary on the server side).

use dots_client::supervisor::{ClientSession, SessionLost};
use dots_codec::record::{decode_record, encode_record, HeartbeatRecord, Record};
use dots_codec::{CoapCode, CoapPdu, CoapType, RecordKind};
use dots_model::SessionConfig;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::UdpSocket;

/// A [`ClientSession`] backed by a UDP socket "connected" to the server's
/// signal-channel address. `peer-hb-status` (spec §4.8) is accepted but not
/// placed on the wire: [`dots_codec::record::HeartbeatRecord`] only carries
/// a sequence counter, so this client-side stand-in cannot yet round-trip
/// it end to end.
pub struct UdpClientSession {
    socket: UdpSocket,
    cuid: String,
    next_message_id: AtomicU16,
    next_sequence: AtomicU64,
    ack_timeout: Duration,
}

impl UdpClientSession {
    /// Binds an ephemeral local port and connects it to `server_address`.
    pub async fn connect(server_address: &str, cuid: String, ack_timeout: Duration) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(server_address).await?;
        Ok(Self {
            socket,
            cuid,
            next_message_id: AtomicU16::new(1),
            next_sequence: AtomicU64::new(0),
            ack_timeout,
        })
    }

    async fn exchange(&self, path: &[&str], method: CoapCode, payload: Vec<u8>) -> Result<CoapPdu, SessionLost> {
        let message_id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        let mut pdu =
            CoapPdu::request(CoapType::Confirmable, method, message_id, vec![message_id as u8], path, payload);
        pdu.options.push(dots_codec::CoapOption {
            number: dots_codec::coap::option_number::URI_QUERY,
            value: format!("cuid={}", self.cuid).into_bytes(),
        });

        let bytes = pdu.encode().map_err(|_| SessionLost)?;
        self.socket.send(&bytes).await.map_err(|_| SessionLost)?;

        let mut buf = [0u8; 65536];
        let n = tokio::time::timeout(self.ack_timeout, self.socket.recv(&mut buf))
            .await
            .map_err(|_| SessionLost)?
            .map_err(|_| SessionLost)?;
        let response = CoapPdu::decode(&buf[..n]).map_err(|_| SessionLost)?;
        if !response.code.is_success() {
            return Err(SessionLost);
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl ClientSession for UdpClientSession {
    async fn send_heartbeat(&self, _peer_hb_status: bool) -> Result<(), SessionLost> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let record = Record::Heartbeat(HeartbeatRecord {
            dialect: dots_codec::SubDialectCode::HEARTBEAT.0,
            sequence: sequence.into(),
        });
        let payload = encode_record(&record).map_err(|_| SessionLost)?;
        self.exchange(&["well-known", "dots", "hb"], CoapCode::PUT, payload).await?;
        Ok(())
    }

    async fn load_config(&self) -> Result<SessionConfig, SessionLost> {
        let response = self.exchange(&["well-known", "dots", "config"], CoapCode::GET, Vec::new()).await?;
        match decode_record(RecordKind::SessionConfig, &response.payload) {
            Ok(Record::SessionConfig(body)) => Ok(body.session_config),
            _ => Err(SessionLost),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{self, ServerHandle};
    use dots_config::{BlockerRegistryConfig, ServerConfig};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn test_server_config(listen_address: &str) -> ServerConfig {
        ServerConfig {
            listen_address: listen_address.into(),
            dtls: dots_config::tls::DtlsConfig::default(),
            lifetime_tick_interval: std::time::Duration::from_secs(3600),
            terminating_period_lifetime: 120,
            blockers: BlockerRegistryConfig::default(),
            admin_socket_path: None,
            customers: [("client01".to_string(), 7)].into_iter().collect(),
        }
    }

    async fn spawn_test_server(listen_address: &str) -> (Arc<ServerHandle>, CancellationToken, tokio::task::JoinHandle<()>) {
        let handle = Arc::new(ServerHandle::build(&test_server_config(listen_address)));
        let cancel = CancellationToken::new();
        let join = {
            let handle = Arc::clone(&handle);
            let cancel = cancel.clone();
            let address = listen_address.to_string();
            tokio::spawn(async move {
                let _ = server::run(handle, &address, cancel).await;
            })
        };
        // give the socket a moment to bind before clients start connecting.
        tokio::time::sleep(Duration::from_millis(20)).await;
        (handle, cancel, join)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn heartbeat_round_trips_against_a_live_server() {
        let (handle, cancel, join) = spawn_test_server("127.0.0.1:17846").await;
        let session =
            UdpClientSession::connect("127.0.0.1:17846", "client01".into(), Duration::from_secs(2)).await.unwrap();

        session.send_heartbeat(true).await.unwrap();

        cancel.cancel();
        let _ = join.await;
        Arc::try_unwrap(handle).ok().unwrap().shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn load_config_returns_bootstrap_defaults_for_a_fresh_client() {
        let (handle, cancel, join) = spawn_test_server("127.0.0.1:17847").await;
        let session =
            UdpClientSession::connect("127.0.0.1:17847", "client01".into(), Duration::from_secs(2)).await.unwrap();

        let config = session.load_config().await.unwrap();
        assert_eq!(config, dots_model::SessionConfig::defaults());

        cancel.cancel();
        let _ = join.await;
        Arc::try_unwrap(handle).ok().unwrap().shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_server_times_out_as_session_lost() {
        let session =
            UdpClientSession::connect("127.0.0.1:1", "client01".into(), Duration::from_millis(50)).await.unwrap();
        let err = session.send_heartbeat(false).await.unwrap_err();
        assert_eq!(err, SessionLost);
    }
}

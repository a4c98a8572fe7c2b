//! Session lifecycle events and retransmission bookkeeping (C2, spec §4.2),
//! generalized from the teacher's `NodeControlMsg`/`Controllable` pattern
//! (`engine/src/control.rs`): a small enum of events the DTLS transport
//! (an external collaborator, spec §1) raises, plus per-session timing
//! state the endpoint tracks to answer "is this session still alive".

use dots_model::SessionTiming;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque handle identifying one live DTLS association. Stable for the
/// lifetime of the association; a reconnect gets a new id (spec §4.8
/// "Session replacement").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// Lifecycle events the transport raises against the endpoint (spec §4.2):
/// `{SessionNew, SessionConnected, SessionDisconnected, SessionDelete,
/// Error, XmitBlockFail, PartialBlock}`, plus the two retransmission
/// outcomes the endpoint must distinguish (`NackTooManyRetries`,
/// `NackRst`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A DTLS handshake has begun for a new peer.
    SessionNew(SessionId),
    /// The handshake completed; the session is added to the connected set.
    SessionConnected(SessionId),
    /// The session dropped, cleanly or otherwise; its observer entries must
    /// be released (spec §4.2 "On Disconnected/Error it is removed").
    SessionDisconnected(SessionId),
    /// The session object itself is being torn down (post-disconnect
    /// cleanup, distinct from `SessionDisconnected` so callers can
    /// distinguish "no longer usable" from "fully gone").
    SessionDelete(SessionId),
    /// A session-level error not covered by a more specific event.
    Error(SessionId, String),
    /// Transmission of a block-wise fragment failed.
    XmitBlockFail(SessionId, u64),
    /// A block-wise fragment arrived; `more` mirrors the Block1/Block2
    /// more-blocks flag.
    PartialBlock {
        /// Originating session.
        session: SessionId,
        /// Correlates fragments of the same transfer (message id or token).
        transfer_id: u64,
        /// `true` if more blocks are expected.
        more: bool,
    },
    /// Retransmission of a confirmable request exhausted `max_retransmit`
    /// (spec §4.2: "the corresponding in-flight request is marked timed-out
    /// and its handler is invoked").
    NackTooManyRetries {
        /// Originating session.
        session: SessionId,
        /// Message id of the request that timed out.
        message_id: u16,
    },
    /// The peer RST'd a confirmable message. Treated as a pong for
    /// heartbeat tracking (spec §4.2: "`NackRst` is treated as a pong").
    NackRst {
        /// Originating session.
        session: SessionId,
        /// Message id the peer reset.
        message_id: u16,
    },
}

impl SessionEvent {
    /// The session this event concerns, when the event names exactly one.
    #[must_use]
    pub const fn session(&self) -> Option<SessionId> {
        match self {
            Self::SessionNew(s)
            | Self::SessionConnected(s)
            | Self::SessionDisconnected(s)
            | Self::SessionDelete(s)
            | Self::Error(s, _)
            | Self::XmitBlockFail(s, _) => Some(*s),
            Self::PartialBlock { session, .. }
            | Self::NackTooManyRetries { session, .. }
            | Self::NackRst { session, .. } => Some(*session),
        }
    }
}

/// Per-session retransmission and timing parameters (spec §3
/// `SessionConfig`, §4.2 "Retransmission").
#[derive(Debug, Clone, Copy)]
pub struct RetransmitParams {
    /// Maximum number of confirmable retransmissions before giving up.
    pub max_retransmit: u16,
    /// Base ack-timeout, in milliseconds.
    pub ack_timeout_ms: u32,
    /// Ack-random-factor, in hundredths (e.g. 150 == 1.50).
    pub ack_random_factor_hundredths: u32,
}

impl From<&SessionTiming> for RetransmitParams {
    fn from(timing: &SessionTiming) -> Self {
        Self {
            max_retransmit: timing.max_retransmit,
            ack_timeout_ms: (timing.ack_timeout.as_f64() * 1000.0).round() as u32,
            ack_random_factor_hundredths: (timing.ack_random_factor.as_f64() * 100.0).round() as u32,
        }
    }
}

/// Tracks which sessions are currently connected and their negotiated
/// retransmit parameters (spec §4.2 "On Connected a new session is added to
/// the connected-set; on Disconnected/Error it is removed").
#[derive(Default)]
pub struct SessionTable {
    connected: HashMap<SessionId, RetransmitParams>,
    next_id: AtomicU64,
}

impl SessionTable {
    /// Builds an empty session table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh, process-unique [`SessionId`].
    pub fn allocate_id(&self) -> SessionId {
        SessionId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Records a session as connected with the given retransmit parameters.
    pub fn connect(&mut self, id: SessionId, params: RetransmitParams) {
        self.connected.insert(id, params);
    }

    /// Removes a session from the connected set (spec §4.2
    /// `SessionDisconnected`/`Error`).
    pub fn disconnect(&mut self, id: SessionId) -> bool {
        self.connected.remove(&id).is_some()
    }

    /// `true` if `id` is currently tracked as connected.
    #[must_use]
    pub fn is_connected(&self, id: SessionId) -> bool {
        self.connected.contains_key(&id)
    }

    /// The retransmit parameters negotiated for `id`, if connected.
    #[must_use]
    pub fn params(&self, id: SessionId) -> Option<RetransmitParams> {
        self.connected.get(&id).copied()
    }

    /// Every currently connected session id.
    #[must_use]
    pub fn connected_ids(&self) -> Vec<SessionId> {
        self.connected.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RetransmitParams {
        RetransmitParams {
            max_retransmit: 3,
            ack_timeout_ms: 2000,
            ack_random_factor_hundredths: 150,
        }
    }

    #[test]
    fn connect_then_disconnect_clears_the_entry() {
        let mut table = SessionTable::new();
        let id = table.allocate_id();
        table.connect(id, params());
        assert!(table.is_connected(id));
        assert!(table.disconnect(id));
        assert!(!table.is_connected(id));
    }

    #[test]
    fn session_ids_are_unique_and_increasing() {
        let table = SessionTable::new();
        let a = table.allocate_id();
        let b = table.allocate_id();
        assert!(b.0 > a.0);
    }

    #[test]
    fn event_session_extracts_the_right_id() {
        let id = SessionId(7);
        let event = SessionEvent::NackRst { session: id, message_id: 42 };
        assert_eq!(event.session(), Some(id));
    }
}

//! The heartbeat task as an explicit state machine (spec §9 "Restartable
//! heartbeat task"): `{Idle, WaitingAck, LostN(n)}` driven by
//! `{Tick, Pong, Timeout, Stop}`, replacing the original's single mutable
//! `current_hb_id` plus side-channel booleans
//! (`original_source/dots_client/task/heartbeat.go`) with a value the
//! supervisor can inspect and test without a running clock.
//!
//! `peer-hb-status` (spec §4.8: true unless the last RX was a
//! ResponseContent with no matching incoming heartbeat) is tracked
//! alongside the state machine rather than folded into it, since it
//! reflects the last completed round rather than which round is in
//! flight.

use std::time::Duration;

/// The heartbeat task's state (spec §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatState {
    /// No heartbeat outstanding; waiting for the next tick.
    Idle,
    /// A heartbeat PDU was sent; awaiting the matching pong or a timeout.
    WaitingAck,
    /// `n` consecutive timeouts have elapsed with no pong.
    LostN(u16),
}

/// Events the heartbeat state machine reacts to (spec §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatEvent {
    /// The heartbeat interval elapsed; time to send a new heartbeat.
    Tick,
    /// A matching pong (heartbeat response) arrived.
    Pong,
    /// The outstanding heartbeat's ack timeout elapsed with no pong.
    Timeout,
    /// The task is being torn down (session replaced, client shutting down).
    Stop,
}

/// What the caller should do as a result of applying an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    /// Send a new heartbeat PDU with the given `peer-hb-status` value.
    SendHeartbeat { peer_hb_status: bool },
    /// Do nothing observable (e.g. a `Tick` while already `WaitingAck`).
    None,
    /// `missing_hb_allowed` consecutive losses were just reached; the
    /// supervisor should declare the session lost and start reconnecting.
    SessionLost,
    /// The task has stopped and should exit its run loop.
    Stopped,
}

/// Drives the heartbeat state machine (spec §4.8, §9). Holds no I/O of its
/// own; the supervisor's run loop owns the timer and the CoAP session.
#[derive(Debug, Clone)]
pub struct HeartbeatMachine {
    state: HeartbeatState,
    missing_hb_allowed: u16,
    interval: Duration,
    /// `true` unless the last completed round received a `ResponseContent`
    /// with no matching incoming server-initiated heartbeat (spec §4.8).
    last_peer_hb_status: bool,
    /// Set by the run loop on any non-heartbeat `ResponseContent`, cleared
    /// once folded into the next `SendHeartbeat`'s `peer_hb_status`.
    received_response_content: bool,
    received_incoming_heartbeat: bool,
}

impl HeartbeatMachine {
    /// Builds a fresh, idle machine.
    #[must_use]
    pub fn new(missing_hb_allowed: u16, interval: Duration) -> Self {
        Self {
            state: HeartbeatState::Idle,
            missing_hb_allowed,
            interval,
            last_peer_hb_status: true,
            received_response_content: false,
            received_incoming_heartbeat: false,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> HeartbeatState {
        self.state
    }

    /// The configured tick interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Records that a `ResponseContent` (any non-heartbeat response) was
    /// received since the last heartbeat round.
    pub fn note_response_content(&mut self) {
        self.received_response_content = true;
    }

    /// Records that a server-initiated heartbeat was received since the
    /// last round.
    pub fn note_incoming_heartbeat(&mut self) {
        self.received_incoming_heartbeat = true;
    }

    /// Applies one event, returning the action the run loop should take.
    pub fn apply(&mut self, event: HeartbeatEvent) -> HeartbeatAction {
        match event {
            HeartbeatEvent::Stop => {
                self.state = HeartbeatState::Idle;
                HeartbeatAction::Stopped
            }
            HeartbeatEvent::Tick => self.on_tick(),
            HeartbeatEvent::Pong => self.on_pong(),
            HeartbeatEvent::Timeout => self.on_timeout(),
        }
    }

    fn on_tick(&mut self) -> HeartbeatAction {
        if matches!(self.state, HeartbeatState::WaitingAck) {
            // Still waiting on the previous round; the original's `run()`
            // drops the tick when `env.requests[current_hb_id]` is live.
            return HeartbeatAction::None;
        }

        self.last_peer_hb_status = !(self.received_response_content && !self.received_incoming_heartbeat);
        self.received_response_content = false;
        self.received_incoming_heartbeat = false;
        self.state = HeartbeatState::WaitingAck;
        HeartbeatAction::SendHeartbeat { peer_hb_status: self.last_peer_hb_status }
    }

    fn on_pong(&mut self) -> HeartbeatAction {
        self.state = HeartbeatState::Idle;
        HeartbeatAction::None
    }

    fn on_timeout(&mut self) -> HeartbeatAction {
        let lost = match self.state {
            HeartbeatState::LostN(n) => n + 1,
            _ => 1,
        };
        if lost >= self.missing_hb_allowed {
            self.state = HeartbeatState::LostN(lost);
            HeartbeatAction::SessionLost
        } else {
            self.state = HeartbeatState::LostN(lost);
            HeartbeatAction::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(missing_hb_allowed: u16) -> HeartbeatMachine {
        HeartbeatMachine::new(missing_hb_allowed, Duration::from_secs(30))
    }

    #[test]
    fn tick_from_idle_sends_heartbeat_and_moves_to_waiting() {
        let mut m = machine(5);
        let action = m.apply(HeartbeatEvent::Tick);
        assert_eq!(action, HeartbeatAction::SendHeartbeat { peer_hb_status: true });
        assert_eq!(m.state(), HeartbeatState::WaitingAck);
    }

    #[test]
    fn tick_while_waiting_is_ignored() {
        let mut m = machine(5);
        m.apply(HeartbeatEvent::Tick);
        assert_eq!(m.apply(HeartbeatEvent::Tick), HeartbeatAction::None);
    }

    #[test]
    fn pong_returns_to_idle() {
        let mut m = machine(5);
        m.apply(HeartbeatEvent::Tick);
        m.apply(HeartbeatEvent::Pong);
        assert_eq!(m.state(), HeartbeatState::Idle);
    }

    #[test]
    fn consecutive_timeouts_below_threshold_stay_alive() {
        let mut m = machine(3);
        m.apply(HeartbeatEvent::Tick);
        assert_eq!(m.apply(HeartbeatEvent::Timeout), HeartbeatAction::None);
        assert_eq!(m.state(), HeartbeatState::LostN(1));
        assert_eq!(m.apply(HeartbeatEvent::Timeout), HeartbeatAction::None);
        assert_eq!(m.state(), HeartbeatState::LostN(2));
    }

    #[test]
    fn reaching_missing_hb_allowed_emits_session_lost() {
        let mut m = machine(3);
        m.apply(HeartbeatEvent::Timeout);
        m.apply(HeartbeatEvent::Timeout);
        assert_eq!(m.apply(HeartbeatEvent::Timeout), HeartbeatAction::SessionLost);
        assert_eq!(m.state(), HeartbeatState::LostN(3));
    }

    #[test]
    fn peer_hb_status_is_false_after_response_content_with_no_heartbeat() {
        let mut m = machine(5);
        m.note_response_content();
        let action = m.apply(HeartbeatEvent::Tick);
        assert_eq!(action, HeartbeatAction::SendHeartbeat { peer_hb_status: false });
    }

    #[test]
    fn peer_hb_status_is_true_when_incoming_heartbeat_also_seen() {
        let mut m = machine(5);
        m.note_response_content();
        m.note_incoming_heartbeat();
        let action = m.apply(HeartbeatEvent::Tick);
        assert_eq!(action, HeartbeatAction::SendHeartbeat { peer_hb_status: true });
    }

    #[test]
    fn stop_always_returns_stopped() {
        let mut m = machine(5);
        m.apply(HeartbeatEvent::Tick);
        assert_eq!(m.apply(HeartbeatEvent::Stop), HeartbeatAction::Stopped);
    }
}

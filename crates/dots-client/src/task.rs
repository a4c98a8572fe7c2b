//! The heartbeat task's run loop (spec §4.8 "Heartbeat task"): ticks the
//! supervisor's heartbeat machine every interval and sends the resulting
//! heartbeat through the currently active session, reporting
//! `SessionLost` on the reconnect channel once `missing_hb_allowed`
//! consecutive rounds fail. Grounded on the teacher's
//! `spawn_thread_local_task` (`crates/controller/src/thread_task.rs`) for
//! its `CancellationToken`-driven graceful shutdown; like `dots-lifetime`'s
//! tick task this one has no non-`Send` dependency forcing a dedicated OS
//! thread plus `LocalSet`, so it runs as a plain `tokio::spawn`ed task.
//!
//! `ClientSession::send_heartbeat` is documented to await either the
//! matching pong or the session's own ack-timeout (spec §4.2
//! "Retransmission"), so its `Result` maps directly onto the
//! [`HeartbeatEvent::Pong`]/[`HeartbeatEvent::Timeout`] pair.

use crate::heartbeat::{HeartbeatAction, HeartbeatEvent};
use crate::supervisor::SessionSupervisor;
use dots_channel::mpsc::Sender;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to the running heartbeat task.
pub struct HeartbeatTaskHandle {
    cancel_token: CancellationToken,
    join_handle: JoinHandle<()>,
}

impl HeartbeatTaskHandle {
    /// Requests graceful shutdown; the task exits once its in-flight tick,
    /// if any, completes.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Requests shutdown and waits for the task to exit.
    pub async fn shutdown_and_join(self) {
        self.shutdown();
        let _ = self.join_handle.await;
    }
}

/// Spawns the heartbeat task against `supervisor`. A tick with no session
/// installed, or one the state machine judges not yet due
/// ([`HeartbeatAction::None`]), is a no-op; reaching
/// [`HeartbeatAction::SessionLost`] notifies `session_lost` once.
pub fn spawn(supervisor: Arc<SessionSupervisor>, session_lost: Sender<()>) -> HeartbeatTaskHandle {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    let join_handle = tokio::spawn(async move {
        loop {
            let interval = supervisor.heartbeat_interval();
            tokio::select! {
                () = token.cancelled() => {
                    tracing::info!("heartbeat task shutting down");
                    break;
                }
                () = tokio::time::sleep(interval) => {
                    run_tick(&supervisor, &session_lost).await;
                }
            }
        }
    });

    HeartbeatTaskHandle { cancel_token, join_handle }
}

async fn run_tick(supervisor: &SessionSupervisor, session_lost: &Sender<()>) {
    let Some((_, session)) = supervisor.current() else {
        return;
    };

    let HeartbeatAction::SendHeartbeat { peer_hb_status } = supervisor.apply_heartbeat_event(HeartbeatEvent::Tick)
    else {
        return;
    };

    let outcome = session.send_heartbeat(peer_hb_status).await;
    let event = if outcome.is_ok() { HeartbeatEvent::Pong } else { HeartbeatEvent::Timeout };
    if supervisor.apply_heartbeat_event(event) == HeartbeatAction::SessionLost {
        let _ = session_lost.send(()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::{ClientSession, SessionLost};
    use dots_model::SessionConfig;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct FlakySession {
        fail: AtomicBool,
    }

    #[async_trait::async_trait]
    impl ClientSession for FlakySession {
        async fn send_heartbeat(&self, _peer_hb_status: bool) -> Result<(), SessionLost> {
            if self.fail.load(Ordering::SeqCst) {
                Err(SessionLost)
            } else {
                Ok(())
            }
        }

        async fn load_config(&self) -> Result<SessionConfig, SessionLost> {
            let mut config = SessionConfig::defaults();
            config.idle.heartbeat_interval = 0;
            config.idle.missing_hb_allowed = 2;
            Ok(config)
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn repeated_failures_report_session_lost() {
        let supervisor = Arc::new(SessionSupervisor::new());
        let session = Arc::new(FlakySession { fail: AtomicBool::new(true) });
        supervisor.install(session).await.unwrap();

        let (tx, mut rx) = dots_channel::mpsc::channel(4);
        let handle = spawn(supervisor, tx);

        let received = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        handle.shutdown_and_join().await;
        assert!(received.is_ok(), "expected a session-lost notification");
    }
}

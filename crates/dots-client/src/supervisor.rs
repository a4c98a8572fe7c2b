//! Session-replacement supervisor (spec §4.8): atomically swaps in a
//! reconnected session, reruns `loadConfig` against it, and restarts the
//! heartbeat machine on the freshly-loaded timing profile. In-flight
//! requests against a superseded session release it once their response
//! arrives rather than being cancelled outright — callers check
//! [`SessionSupervisor::is_current`] against the generation they were
//! issued under before acting on a response.

use crate::heartbeat::{HeartbeatAction, HeartbeatEvent, HeartbeatMachine};
use dots_model::SessionConfig;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// The concrete CoAP/DTLS transport session to the DOTS server (spec §1:
/// an external collaborator). This trait is the seam the supervisor
/// drives; a real transport implements it, tests use a stub.
#[async_trait::async_trait]
pub trait ClientSession: Send + Sync {
    /// Sends a heartbeat PUT carrying `peer-hb-status`.
    async fn send_heartbeat(&self, peer_hb_status: bool) -> Result<(), SessionLost>;

    /// Re-fetches the session configuration after a (re)connect
    /// ("loadConfig" in the original client).
    async fn load_config(&self) -> Result<SessionConfig, SessionLost>;
}

/// Marker error: the session the caller was driving has disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("session lost")]
pub struct SessionLost;

/// A process-unique handle distinguishing sessions across a reconnect
/// (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionGeneration(u64);

struct Active {
    generation: SessionGeneration,
    session: Arc<dyn ClientSession>,
    config: SessionConfig,
}

/// Owns the current live session and the heartbeat machine driving it,
/// swapping both atomically on reconnect.
pub struct SessionSupervisor {
    active: RwLock<Option<Active>>,
    next_generation: AtomicU64,
    heartbeat: RwLock<HeartbeatMachine>,
}

impl SessionSupervisor {
    /// Builds a supervisor with no session installed yet; the heartbeat
    /// machine starts on `SessionConfig::defaults().idle` until `install`
    /// loads a real profile (spec §3 `SessionTiming::defaults`).
    #[must_use]
    pub fn new() -> Self {
        let timing = SessionConfig::defaults().idle;
        Self {
            active: RwLock::new(None),
            next_generation: AtomicU64::new(1),
            heartbeat: RwLock::new(timing_machine(&timing)),
        }
    }

    /// Installs a newly (re)connected session: reruns `loadConfig`,
    /// restarts the heartbeat machine on the loaded `idle` profile, and
    /// atomically swaps the session in as the active one.
    pub async fn install(&self, session: Arc<dyn ClientSession>) -> Result<SessionGeneration, SessionLost> {
        let config = session.load_config().await?;
        let generation = SessionGeneration(self.next_generation.fetch_add(1, Ordering::SeqCst));
        *self.heartbeat.write() = timing_machine(&config.idle);
        *self.active.write() = Some(Active { generation, session, config });
        Ok(generation)
    }

    /// The currently active session and its generation, if any is installed.
    #[must_use]
    pub fn current(&self) -> Option<(SessionGeneration, Arc<dyn ClientSession>)> {
        self.active.read().as_ref().map(|a| (a.generation, Arc::clone(&a.session)))
    }

    /// `true` if `generation` still names the live session.
    #[must_use]
    pub fn is_current(&self, generation: SessionGeneration) -> bool {
        self.active.read().as_ref().map(|a| a.generation) == Some(generation)
    }

    /// Switches the heartbeat timing profile between `mitigating` and
    /// `idle` (spec §3 `SessionConfig`) as the client's mitigation state
    /// changes.
    pub fn retune_for_mitigation_state(&self, mitigating: bool) {
        let Some(active) = self.active.read().as_ref().map(|a| a.config) else {
            return;
        };
        let timing = if mitigating { active.mitigating } else { active.idle };
        *self.heartbeat.write() = timing_machine(&timing);
    }

    /// Drives one heartbeat-machine event.
    pub fn apply_heartbeat_event(&self, event: HeartbeatEvent) -> HeartbeatAction {
        self.heartbeat.write().apply(event)
    }

    /// The heartbeat machine's configured tick interval.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat.read().interval()
    }
}

impl Default for SessionSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

fn timing_machine(timing: &dots_model::SessionTiming) -> HeartbeatMachine {
    HeartbeatMachine::new(timing.missing_hb_allowed, Duration::from_secs(u64::from(timing.heartbeat_interval)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    struct StubSession {
        config: SessionConfig,
        fail_load: AtomicBool,
    }

    #[async_trait::async_trait]
    impl ClientSession for StubSession {
        async fn send_heartbeat(&self, _peer_hb_status: bool) -> Result<(), SessionLost> {
            Ok(())
        }

        async fn load_config(&self) -> Result<SessionConfig, SessionLost> {
            if self.fail_load.load(Ordering::SeqCst) {
                Err(SessionLost)
            } else {
                Ok(self.config)
            }
        }
    }

    #[tokio::test]
    async fn install_swaps_in_a_new_generation() {
        let supervisor = SessionSupervisor::new();
        let session = Arc::new(StubSession { config: SessionConfig::defaults(), fail_load: AtomicBool::new(false) });
        let gen1 = supervisor.install(session.clone()).await.unwrap();
        assert!(supervisor.is_current(gen1));

        let gen2 = supervisor.install(session).await.unwrap();
        assert_ne!(gen1, gen2);
        assert!(!supervisor.is_current(gen1));
        assert!(supervisor.is_current(gen2));
    }

    #[tokio::test]
    async fn failed_load_config_does_not_install() {
        let supervisor = SessionSupervisor::new();
        let session = Arc::new(StubSession { config: SessionConfig::defaults(), fail_load: AtomicBool::new(true) });
        assert!(supervisor.install(session).await.is_err());
        assert!(supervisor.current().is_none());
    }

    #[tokio::test]
    async fn retune_switches_heartbeat_interval() {
        let supervisor = SessionSupervisor::new();
        let mut config = SessionConfig::defaults();
        config.mitigating.heartbeat_interval = 5;
        let session = Arc::new(StubSession { config, fail_load: AtomicBool::new(false) });
        supervisor.install(session).await.unwrap();

        supervisor.retune_for_mitigation_state(true);
        assert_eq!(supervisor.heartbeat_interval(), Duration::from_secs(5));
    }
}

//! The client-side session supervisor (C8, spec §4.8): the heartbeat state
//! machine (`heartbeat`), the session-replacement supervisor driving it
//! (`supervisor`), and the local CLI Unix-socket HTTP surface (`cli`).

pub mod cli;
pub mod error;
pub mod heartbeat;
pub mod supervisor;
pub mod task;

pub use cli::RuntimeParams;
pub use error::CliError;
pub use heartbeat::{HeartbeatAction, HeartbeatEvent, HeartbeatMachine, HeartbeatState};
pub use supervisor::{ClientSession, SessionGeneration, SessionLost, SessionSupervisor};
pub use task::{spawn, HeartbeatTaskHandle};

//! Bounded channel wrappers shared by every DOTS crate that hands work
//! between the CoAP event loop and background tasks (blocker I/O, lifetime
//! ticks, CLI requests).

pub mod error;
pub mod mpsc;
pub mod oneshot;

//! Typed process configuration for the DOTS server and client (SPEC_FULL.md
//! §B "Ambient stack"): listen/dial addresses, DTLS identity, the blocker
//! registry, and timing knobs, loaded from YAML via `serde_yaml`. Loading
//! JSON-schema-validated wire payloads, bootstrapping the logger, and
//! choosing a persistence engine remain out of scope (spec §1); this crate
//! is the typed surface only.

pub mod blocker;
pub mod client;
pub mod error;
pub mod server;
pub mod tls;

pub use blocker::{BlockerConfig, BlockerKind, BlockerRegistryConfig};
pub use client::ClientConfig;
pub use error::ConfigError;
pub use server::ServerConfig;
pub use tls::{DtlsConfig, PeerAuthMode};

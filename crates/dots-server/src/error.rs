//! Binary-level errors, following the teacher's kind-enum-plus-`thiserror`
//! convention shared by every other crate in this workspace
//! (`dots-config/src/error.rs`, `dots-mitigation/src/error.rs`).

use std::path::PathBuf;

/// A failure starting `dots-serverd` or `dots-clientd`.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// The configuration file could not be loaded.
    #[error("failed to load configuration from {path}: {source}")]
    Config {
        /// Path that was read.
        path: PathBuf,
        /// Underlying configuration error.
        #[source]
        source: dots_config::ConfigError,
    },
    /// The signal-channel UDP socket could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Address that failed to bind.
        address: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The local CLI socket server failed.
    #[error("client CLI socket failed: {0}")]
    Cli(#[from] dots_client::CliError),
}

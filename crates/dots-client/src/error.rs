//! Errors for the client session supervisor and its local CLI surface,
//! in the kind-enum-less shape the teacher's admin module uses for a small
//! number of distinct, non-overlapping failures
//! (`crates/admin/src/error.rs`).

use thiserror::Error;

/// Errors the local CLI HTTP surface can raise while standing up or
/// running its Unix-domain-socket listener.
#[derive(Error, Debug)]
pub enum CliError {
    /// The configured socket path could not be bound (e.g. a stale socket
    /// file from an unclean previous shutdown could not be removed).
    #[error("failed to bind client CLI socket at '{path}': {details}")]
    BindFailed {
        /// The socket path we attempted to bind to.
        path: String,
        /// Human-readable details of the bind failure.
        details: String,
    },

    /// The HTTP server encountered a fatal error while serving.
    #[error("client CLI server error on '{path}': {details}")]
    ServerError {
        /// The socket path the server was bound to.
        path: String,
        /// Human-readable details of the server failure.
        details: String,
    },
}

use serde::{Deserialize, Serialize};

/// A tenant, identified by the Common Name presented in its DTLS peer
/// certificate. The `id` is the primary tenancy key threaded through every
/// other store (spec §3 "Customer").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Customer {
    /// Primary key, assigned by the server on first successful handshake.
    pub id: i64,
    /// The X.509 Common Name extracted from the peer certificate.
    pub common_name: String,
}

impl Customer {
    /// Builds a customer record.
    #[must_use]
    pub const fn new(id: i64, common_name: String) -> Self {
        Self { id, common_name }
    }
}

use serde::{Deserialize, Serialize};

/// Maximum length, in bytes, of a `cuid` (spec §3 "ClientIdentity").
pub const MAX_CUID_LEN: usize = 22;

/// Error returned when a `cuid` fails the length constraint.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("cuid exceeds {MAX_CUID_LEN} bytes ({len} bytes given)")]
pub struct CuidTooLong {
    len: usize,
}

/// The `(customer_id, cuid, cdid?)` triple a DOTS client presents on every
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientIdentity {
    /// Tenant owning this client.
    pub customer_id: i64,
    /// Client-unique id, opaque, at most [`MAX_CUID_LEN`] bytes.
    pub cuid: String,
    /// Client-domain id, optional and server-maintained after the first
    /// successful registration.
    pub cdid: Option<String>,
}

impl ClientIdentity {
    /// Builds a client identity, rejecting a `cuid` longer than
    /// [`MAX_CUID_LEN`] bytes.
    pub fn new(customer_id: i64, cuid: String, cdid: Option<String>) -> Result<Self, CuidTooLong> {
        if cuid.len() > MAX_CUID_LEN {
            return Err(CuidTooLong { len: cuid.len() });
        }
        Ok(Self {
            customer_id,
            cuid,
            cdid,
        })
    }

    /// Returns `true` if `presented` (the `cdid` on an incoming request)
    /// is compatible with the `cdid` already stored for this identity: no
    /// `cdid` supplied is always compatible, and an equal `cdid` is
    /// compatible. A conflicting `cdid` must be refused as forbidden
    /// (spec §3 / §6).
    #[must_use]
    pub fn cdid_matches(&self, presented: Option<&str>) -> bool {
        match (self.cdid.as_deref(), presented) {
            (_, None) => true,
            (None, Some(_)) => true,
            (Some(stored), Some(given)) => stored == given,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_long_cuid() {
        let long = "x".repeat(MAX_CUID_LEN + 1);
        assert!(ClientIdentity::new(1, long, None).is_err());
    }

    #[test]
    fn cdid_mismatch_detected() {
        let id = ClientIdentity::new(1, "c1".into(), Some("dots.example".into())).unwrap();
        assert!(id.cdid_matches(Some("dots.example")));
        assert!(id.cdid_matches(None));
        assert!(!id.cdid_matches(Some("other.example")));
    }
}

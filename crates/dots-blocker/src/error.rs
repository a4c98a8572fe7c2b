//! Blocker errors, following the teacher's kind-enum-plus-`thiserror`
//! convention (`engine/src/error.rs`'s `ExporterErrorKind`).

use std::fmt;

/// High-level classification of a blocker failure (spec §7 "blocker-error").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockerErrorKind {
    /// The scope failed blocker-specific semantic validation (spec §4.9
    /// `validate_scope`), e.g. an ICMP match on a non-ICMP protocol.
    Validation,
    /// No blocker is configured/eligible for the customer and target type.
    NoEligibleBlocker,
    /// The downstream device/library rejected the request.
    Rejected,
    /// A transport-level failure talking to the downstream device.
    Transport,
    /// Catch-all.
    Other,
}

impl fmt::Display for BlockerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::NoEligibleBlocker => "no-eligible-blocker",
            Self::Rejected => "rejected",
            Self::Transport => "transport",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// A blocker failure.
#[derive(Debug, thiserror::Error)]
#[error("blocker error ({kind}): {message}")]
pub struct BlockerError {
    /// Classification used by the mitigation engine to decide rollback vs.
    /// retry (spec §7).
    pub kind: BlockerErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl BlockerError {
    /// Builds a new blocker error of the given kind.
    pub fn new(kind: BlockerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for [`BlockerErrorKind::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(BlockerErrorKind::Validation, message)
    }

    /// Shorthand for [`BlockerErrorKind::NoEligibleBlocker`].
    pub fn no_eligible_blocker(message: impl Into<String>) -> Self {
        Self::new(BlockerErrorKind::NoEligibleBlocker, message)
    }
}

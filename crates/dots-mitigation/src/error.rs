//! Mitigation engine errors, following the teacher's kind-enum-plus-
//! `thiserror` convention (`engine/src/error.rs`), mapped by the request
//! router (C4) onto the CoAP response-code table of spec §6/§7.

use dots_model::ConflictInformation;
use std::fmt;

/// High-level classification of a mitigation-engine failure (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MitigationErrorKind {
    /// Body/URI contract violation (spec §7: 4.00).
    Validation,
    /// DTLS identity/`cdid` mismatch (spec §7: 4.03).
    Forbidden,
    /// No scope exists for the given key (spec §7: 4.04).
    NotFound,
    /// Overlap or `cuid` collision (spec §7: 4.09).
    Conflict,
    /// Semantic violation, e.g. a control-filtering update during peace
    /// time (spec §7: 4.22).
    Unprocessable,
    /// `If-Match` mismatch (spec §7: 4.12).
    PreconditionFailed,
    /// The selected blocker rejected or failed the request (spec §7:
    /// mitigation -> Withdrawn, 5.00 returned).
    BlockerError,
    /// Storage/internal invariant failure (spec §7: 5.00).
    Internal,
}

impl fmt::Display for MitigationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not-found",
            Self::Conflict => "conflict",
            Self::Unprocessable => "unprocessable",
            Self::PreconditionFailed => "precondition-failed",
            Self::BlockerError => "blocker-error",
            Self::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

/// A mitigation-engine failure.
#[derive(Debug, thiserror::Error)]
#[error("mitigation error ({kind}): {message}")]
pub struct MitigationError {
    /// Classification used for CoAP response-code mapping.
    pub kind: MitigationErrorKind,
    /// Human-readable detail, returned as the CoAP diagnostic payload.
    pub message: String,
    /// Present only for [`MitigationErrorKind::Conflict`] (spec §3, §7).
    pub conflict: Option<ConflictInformation>,
}

impl MitigationError {
    /// Builds a new error of the given kind with no conflict detail.
    pub fn new(kind: MitigationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            conflict: None,
        }
    }

    /// Shorthand for [`MitigationErrorKind::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(MitigationErrorKind::Validation, message)
    }

    /// Shorthand for [`MitigationErrorKind::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(MitigationErrorKind::Forbidden, message)
    }

    /// Shorthand for [`MitigationErrorKind::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(MitigationErrorKind::NotFound, message)
    }

    /// Builds a [`MitigationErrorKind::Conflict`] error carrying
    /// `ConflictInformation` (spec §3, §7).
    pub fn conflict(info: ConflictInformation, message: impl Into<String>) -> Self {
        Self {
            kind: MitigationErrorKind::Conflict,
            message: message.into(),
            conflict: Some(info),
        }
    }

    /// Shorthand for [`MitigationErrorKind::Unprocessable`].
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(MitigationErrorKind::Unprocessable, message)
    }

    /// Shorthand for [`MitigationErrorKind::PreconditionFailed`].
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::new(MitigationErrorKind::PreconditionFailed, message)
    }

    /// Wraps a [`dots_blocker::BlockerError`] as
    /// [`MitigationErrorKind::BlockerError`] (spec §7: "blocker-error").
    pub fn from_blocker(err: &dots_blocker::BlockerError) -> Self {
        Self::new(MitigationErrorKind::BlockerError, err.to_string())
    }
}

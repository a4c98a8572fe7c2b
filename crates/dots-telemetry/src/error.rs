//! Telemetry-store errors, following the same kind-enum-plus-`thiserror`
//! convention as `dots-mitigation` (`crate::error` there), mapped by the
//! request router onto the CoAP response-code table of spec §6/§7.

use dots_model::ConflictInformation;
use std::fmt;

/// High-level classification of a telemetry-store failure (spec §4.6, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryErrorKind {
    /// Body/query contract violation (spec §7: 4.00).
    Validation,
    /// No row exists for the given key (spec §7: 4.04).
    NotFound,
    /// A pipe or baseline row overlaps one owned by another client (spec
    /// §7: 4.09).
    Conflict,
    /// Storage/internal invariant failure (spec §7: 5.00).
    Internal,
}

impl fmt::Display for TelemetryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::NotFound => "not-found",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

/// A telemetry-store failure.
#[derive(Debug, thiserror::Error)]
#[error("telemetry error ({kind}): {message}")]
pub struct TelemetryError {
    /// Classification used for CoAP response-code mapping.
    pub kind: TelemetryErrorKind,
    /// Human-readable detail, returned as the CoAP diagnostic payload.
    pub message: String,
    /// Present only for [`TelemetryErrorKind::Conflict`].
    pub conflict: Option<ConflictInformation>,
}

impl TelemetryError {
    /// Builds a new error of the given kind with no conflict detail.
    pub fn new(kind: TelemetryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            conflict: None,
        }
    }

    /// Shorthand for [`TelemetryErrorKind::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(TelemetryErrorKind::Validation, message)
    }

    /// Shorthand for [`TelemetryErrorKind::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(TelemetryErrorKind::NotFound, message)
    }

    /// Builds a [`TelemetryErrorKind::Conflict`] error carrying
    /// `ConflictInformation` (spec §4.6 overlap rules).
    pub fn conflict(info: ConflictInformation, message: impl Into<String>) -> Self {
        Self {
            kind: TelemetryErrorKind::Conflict,
            message: message.into(),
            conflict: Some(info),
        }
    }
}

//! Endpoint/router errors, following the teacher's kind-enum-plus-`thiserror`
//! convention (`engine/src/error.rs`'s `ExporterErrorKind`/`ReceiverErrorKind`).

use std::fmt;

/// High-level classification of a request-routing failure (spec §7), used
/// to pick a CoAP response code independent of any downstream engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// A mandatory URI path parameter was missing (spec §4.4, §7: 4.00).
    MissingParam,
    /// The URI carried a token the router does not recognize under
    /// `/.well-known/dots/` (spec §4.4: "An unknown token... causes
    /// bad-request").
    UnknownToken,
    /// No resource is bound to this path and no handler claimed it via the
    /// "unknown" fallback (spec §7: 4.04).
    NotFound,
    /// The method is not supported for this resource type (spec §4.4:
    /// "method-not-allowed returns 4.05 over NON").
    MethodNotAllowed,
    /// A Block2 request exceeded the largest-block constant (spec §4.2,
    /// §6: "Block2 over the largest-block constant -> 4.00").
    BlockTooLarge,
    /// Internal/codec failure mapping to 5.00.
    Internal,
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingParam => "missing-param",
            Self::UnknownToken => "unknown-token",
            Self::NotFound => "not-found",
            Self::MethodNotAllowed => "method-not-allowed",
            Self::BlockTooLarge => "block-too-large",
            Self::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

/// A request-routing failure.
#[derive(Debug, thiserror::Error)]
#[error("engine error ({kind}): {message}")]
pub struct EngineError {
    /// Classification used for CoAP response-code mapping.
    pub kind: EngineErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl EngineError {
    /// Builds a new engine error of the given kind.
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for [`EngineErrorKind::MissingParam`].
    pub fn missing_param(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::MissingParam, message)
    }

    /// Shorthand for [`EngineErrorKind::UnknownToken`].
    pub fn unknown_token(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::UnknownToken, message)
    }

    /// Shorthand for [`EngineErrorKind::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::NotFound, message)
    }

    /// Shorthand for [`EngineErrorKind::MethodNotAllowed`].
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::MethodNotAllowed, message)
    }

    /// Shorthand for [`EngineErrorKind::BlockTooLarge`].
    pub fn block_too_large(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::BlockTooLarge, message)
    }

    /// Maps this error's [`EngineErrorKind`] to the CoAP response code table
    /// of spec §6/§7.
    #[must_use]
    pub fn coap_code(&self) -> dots_codec::CoapCode {
        match self.kind {
            EngineErrorKind::MissingParam
            | EngineErrorKind::UnknownToken
            | EngineErrorKind::BlockTooLarge => dots_codec::CoapCode::BAD_REQUEST,
            EngineErrorKind::NotFound => dots_codec::CoapCode::NOT_FOUND,
            EngineErrorKind::MethodNotAllowed => dots_codec::CoapCode::METHOD_NOT_ALLOWED,
            EngineErrorKind::Internal => dots_codec::CoapCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A response-ready failure: a concrete CoAP code plus a diagnostic
/// message, already resolved from whichever error type produced it
/// ([`EngineError`] or a downstream [`dots_mitigation::MitigationError`]).
/// The router returns this directly rather than [`EngineError`] so that
/// downstream kinds with no [`EngineErrorKind`] counterpart (`Conflict`,
/// `Forbidden`, `Unprocessable`, `PreconditionFailed`) still carry their
/// correct code.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct RouterError {
    /// The response code to place on the outgoing PDU.
    pub code: dots_codec::CoapCode,
    /// Human-readable detail, carried as the diagnostic payload.
    pub message: String,
    /// Present only when the underlying failure was a mitigation overlap
    /// (spec §3, §7 `ConflictInformation`).
    pub conflict: Option<dots_model::ConflictInformation>,
}

impl RouterError {
    /// Builds a router error with no conflict detail.
    #[must_use]
    pub fn new(code: dots_codec::CoapCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            conflict: None,
        }
    }
}

impl From<EngineError> for RouterError {
    fn from(err: EngineError) -> Self {
        Self::new(err.coap_code(), err.message)
    }
}

impl From<&dots_mitigation::MitigationError> for RouterError {
    fn from(err: &dots_mitigation::MitigationError) -> Self {
        Self {
            code: crate::response_code::mitigation_error_code(err),
            message: err.message.clone(),
            conflict: err.conflict.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_param_maps_to_bad_request() {
        let err = EngineError::missing_param("cuid is required");
        assert_eq!(err.coap_code(), dots_codec::CoapCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_4_04() {
        let err = EngineError::not_found("no such mitigation");
        assert_eq!(err.coap_code(), dots_codec::CoapCode::NOT_FOUND);
    }

    #[test]
    fn router_error_preserves_conflict_detail() {
        let inner = dots_mitigation::MitigationError::new(
            dots_mitigation::MitigationErrorKind::Conflict,
            "overlap",
        );
        let routed: RouterError = (&inner).into();
        assert_eq!(routed.code, dots_codec::CoapCode::CONFLICT);
    }
}

//! Codec errors, following the teacher's kind-enum-plus-`thiserror`-wrapper
//! convention (`engine/src/error.rs`'s `ExporterErrorKind`/`ReceiverErrorKind`).

use std::fmt;

/// High-level classification of a codec failure, used by the request router
/// (C4) to choose a CoAP response code (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorKind {
    /// The payload was not valid CBOR, or a required field was missing.
    Malformed,
    /// The payload contained a key the dialect does not recognize
    /// (spec §4.1: "Unknown top-level keys fail with bad-request").
    UnknownField,
    /// The PDU exceeded the largest-block constant (spec §4.2).
    TooLarge,
    /// An internal encoding failure (should not happen for well-formed
    /// domain values).
    Internal,
}

impl fmt::Display for CodecErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Malformed => "malformed",
            Self::UnknownField => "unknown-field",
            Self::TooLarge => "too-large",
            Self::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

/// A codec failure.
#[derive(Debug, thiserror::Error)]
#[error("codec error ({kind}): {message}")]
pub struct CodecError {
    /// Classification used for response-code mapping.
    pub kind: CodecErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl CodecError {
    /// Builds a new codec error of the given kind.
    pub fn new(kind: CodecErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for [`CodecErrorKind::Malformed`].
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::Malformed, message)
    }

    /// Shorthand for [`CodecErrorKind::UnknownField`].
    pub fn unknown_field(message: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::UnknownField, message)
    }

    /// Shorthand for [`CodecErrorKind::TooLarge`].
    pub fn too_large(message: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::TooLarge, message)
    }
}

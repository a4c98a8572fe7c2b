//! Maps downstream engine errors onto the CoAP response-code table (spec
//! §6/§7). Kept separate from `dots-mitigation`/`dots-telemetry` so neither
//! of those crates needs to depend on `dots-codec`'s CoAP types — they stay
//! transport-agnostic and this module is the one place response codes are
//! decided.

use dots_codec::CoapCode;
use dots_mitigation::{MitigationError, MitigationErrorKind};

/// Maps a [`MitigationError`] to the response code spec §7's table assigns
/// its [`MitigationErrorKind`].
#[must_use]
pub fn mitigation_error_code(err: &MitigationError) -> CoapCode {
    match err.kind {
        MitigationErrorKind::Validation => CoapCode::BAD_REQUEST,
        MitigationErrorKind::Forbidden => CoapCode::FORBIDDEN,
        MitigationErrorKind::NotFound => CoapCode::NOT_FOUND,
        MitigationErrorKind::Conflict => CoapCode::CONFLICT,
        MitigationErrorKind::Unprocessable => CoapCode::UNPROCESSABLE_ENTITY,
        MitigationErrorKind::PreconditionFailed => CoapCode::PRECONDITION_FAILED,
        MitigationErrorKind::BlockerError | MitigationErrorKind::Internal => {
            CoapCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_4_09() {
        let err = MitigationError::new(MitigationErrorKind::Conflict, "overlap");
        assert_eq!(mitigation_error_code(&err), CoapCode::CONFLICT);
    }

    #[test]
    fn precondition_failed_maps_to_4_12() {
        let err = MitigationError::new(MitigationErrorKind::PreconditionFailed, "if-match mismatch");
        assert_eq!(mitigation_error_code(&err), CoapCode::PRECONDITION_FAILED);
    }
}

//! Wire framing and body decoding for the DOTS signal channel (spec §4):
//! the CoAP PDU layer (`coap`), sub-dialect codes and the large-counter
//! wire wrapper (`subdialect`, `uint64str`), and the tagged-variant record
//! codec (`record`) that replaces a schema-less any-body dispatch with a
//! small table keyed by URI path prefix.
//!
//! This crate has no notion of a session, a retransmission timer, or a
//! resource tree — that state lives in `dots-engine`. It only turns bytes
//! into typed records and back.

pub mod coap;
pub mod error;
pub mod record;
pub mod subdialect;
pub mod uint64str;

pub use coap::{BlockValue, CoapCode, CoapOption, CoapPdu, CoapType, CONTENT_FORMAT_CBOR};
pub use error::{CodecError, CodecErrorKind};
pub use record::{
    decode_record, encode_record, HeartbeatRecord, MitigationRecord, Record, RecordKind,
    SessionConfigRecord, TelemetryPreMitigationRecord, TelemetrySetupRecord,
};
pub use subdialect::SubDialectCode;
pub use uint64str::Uint64Str;

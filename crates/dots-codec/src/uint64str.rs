//! A wrapper that carries a `u64` as a CBOR text string on the wire (spec
//! §4.1: "Unsigned 64-bit counters that may exceed JSON range use a
//! string-carrying wrapper on the wire"), so downstream JSON re-serialization
//! (the CLI surface, spec §6) never loses precision.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A `u64` counter serialized as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Uint64Str(pub u64);

impl Serialize for Uint64Str {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

struct Uint64StrVisitor;

impl<'de> Visitor<'de> for Uint64StrVisitor {
    type Value = Uint64Str;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string carrying a u64")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        v.parse::<u64>()
            .map(Uint64Str)
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Uint64Str(v))
    }
}

impl<'de> Deserialize<'de> for Uint64Str {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(Uint64StrVisitor)
    }
}

impl From<u64> for Uint64Str {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Uint64Str> for u64 {
    fn from(value: Uint64Str) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_cbor() {
        let v = Uint64Str(18_446_744_073_709_551_615);
        let mut buf = Vec::new();
        ciborium::into_writer(&v, &mut buf).unwrap();
        let back: Uint64Str = ciborium::from_reader(buf.as_slice()).unwrap();
        assert_eq!(v, back);
    }

    #[test]
    fn round_trips_through_json() {
        let v = Uint64Str(9_007_199_254_740_993); // beyond f64-safe integer range
        let s = serde_json::to_string(&v).unwrap();
        assert_eq!(s, "\"9007199254740993\"");
        let back: Uint64Str = serde_json::from_str(&s).unwrap();
        assert_eq!(v, back);
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A decimal value carried to two fractional digits on the wire (spec §4.1:
/// `ack-timeout`, `ack-random-factor`, percentiles). Stored as hundredths of
/// a unit so equality and ordering are exact, unlike `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Decimal2 {
    hundredths: i64,
}

impl Decimal2 {
    /// Builds a `Decimal2` from a whole number of hundredths, e.g.
    /// `Decimal2::from_hundredths(150)` is `1.50`.
    #[must_use]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self { hundredths }
    }

    /// Returns the value as an `f64`.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.hundredths as f64 / 100.0
    }
}

impl TryFrom<f64> for Decimal2 {
    type Error = std::num::TryFromIntError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let hundredths = (value * 100.0).round() as i64;
        // Round-trip through i64 to reuse its overflow-checked conversions.
        let checked = i64::try_from(hundredths as i128)?;
        Ok(Self {
            hundredths: checked,
        })
    }
}

impl From<Decimal2> for f64 {
    fn from(value: Decimal2) -> Self {
        value.as_f64()
    }
}

impl fmt::Display for Decimal2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_f64())
    }
}

impl FromStr for Decimal2 {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let f: f64 = s.parse()?;
        Ok(Self::from_hundredths((f * 100.0).round() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_fractional_digits_round_trip() {
        let d = Decimal2::try_from(1.5).unwrap();
        assert_eq!(d.to_string(), "1.50");
        assert_eq!(d, Decimal2::from_hundredths(150));
    }

    #[test]
    fn display_is_always_two_digits() {
        let d = Decimal2::from_hundredths(200);
        assert_eq!(d.to_string(), "2.00");
    }
}

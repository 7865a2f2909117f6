//! Decimal numbers as carried on the wire
//!
//! ISO 15118-20 transports physical values as `value * 10^exponent` with a
//! 16-bit value. Conversions keep four significant digits.

use serde::{Deserialize, Serialize};

/// `value * 10^exponent`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RationalNumber {
    pub value: i16,
    pub exponent: i8,
}

impl RationalNumber {
    pub const ZERO: RationalNumber = RationalNumber {
        value: 0,
        exponent: 0,
    };

    pub const fn new(value: i16, exponent: i8) -> Self {
        Self { value, exponent }
    }

    /// Convert a float, keeping four significant digits
    ///
    /// `0.0` (and anything non-finite) maps to `{0, 0}`.
    pub fn from_float(x: f32) -> Self {
        if x == 0.0 || !x.is_finite() {
            return Self::ZERO;
        }

        let x = f64::from(x);
        let exponent = (x.abs().log10().floor() as i32 - 3).clamp(i8::MIN as i32, i8::MAX as i32);
        let value = (x / 10_f64.powi(exponent))
            .round()
            .clamp(i16::MIN as f64, i16::MAX as f64);

        Self {
            value: value as i16,
            exponent: exponent as i8,
        }
    }

    pub fn to_float(self) -> f32 {
        (f64::from(self.value) * 10_f64.powi(i32::from(self.exponent))) as f32
    }
}

impl From<f32> for RationalNumber {
    fn from(x: f32) -> Self {
        Self::from_float(x)
    }
}

impl From<RationalNumber> for f32 {
    fn from(r: RationalNumber) -> Self {
        r.to_float()
    }
}

impl std::fmt::Display for RationalNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_float())
    }
}

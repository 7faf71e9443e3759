//! Primitive EMA updaters
//!
//! Every filter in the bank is built from one first-order smoothing step:
//!
//! ```text
//! y' = y + round((x - y) / 2^k)
//! ```
//!
//! The same law is implemented in four numeric representations:
//! - [`Int16`]: raw 16-bit units, shift-based gain
//! - [`Q8`]: 32-bit accumulator with 8 fractional bits
//! - [`Q16`]: 32-bit accumulator with 16 fractional bits
//! - `f32`: IEEE-754 single precision, exact division by `2^k`
//!
//! Integer paths round half up by adding `2^(k-1)` before the arithmetic
//! right shift (see [`Rounding`] for the `k = 1` exception). Fixed-point
//! differences are computed in 64 bits, so no representation can overflow
//! for in-range `i16` input.

use crate::domain::config::{ConfigError, Result};
use crate::domain::filters::Reading;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// One raw input sample
pub type Sample = i16;

/// Smoothing strength of an EMA step: `alpha = 1 / 2^k`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct GainExponent(u8);

impl GainExponent {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 15;

    /// Validate a runtime exponent
    pub fn new(k: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&k) {
            Ok(Self(k))
        } else {
            Err(ConfigError::InvalidExponent(k))
        }
    }

    /// Exponent known at compile time; out-of-range values fail const evaluation.
    pub const fn of(k: u8) -> Self {
        assert!(k >= Self::MIN && k <= Self::MAX, "gain exponent out of range");
        Self(k)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Linear gain `1 / 2^k`
    pub fn alpha(self) -> f64 {
        1.0 / f64::from(1u32 << self.0)
    }

    /// Divisor used by the floating point path
    pub fn divisor(self) -> f32 {
        (1u32 << self.0) as f32
    }

    /// Nominal -3 dB corner of a single stage at the given sampling rate
    ///
    /// `fs * alpha / (2 * pi * (1 - alpha))`, which gives 159, 53, 22.7,
    /// 10.6, 5.13 and 0.624 Hz for k = 1, 2, 3, 4, 5, 8 at 1 kHz.
    pub fn corner_hz(self, sample_rate_hz: f64) -> f64 {
        let alpha = self.alpha();
        sample_rate_hz * alpha / (2.0 * PI * (1.0 - alpha))
    }
}

impl TryFrom<u8> for GainExponent {
    type Error = ConfigError;

    fn try_from(k: u8) -> Result<Self> {
        Self::new(k)
    }
}

impl From<GainExponent> for u8 {
    fn from(k: GainExponent) -> Self {
        k.0
    }
}

impl fmt::Display for GainExponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rounding policy of the integer recurrences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Round half up, except `k = 1` which truncates.
    ///
    /// Matches reference traces bit for bit. The truncating `k = 1` step can
    /// settle one unit below a positive target.
    #[default]
    Reference,
    /// Round half up for every exponent
    Uniform,
}

impl Rounding {
    /// Addend applied before the `>> k` shift
    #[inline]
    pub fn bias(self, k: GainExponent) -> i32 {
        match (self, k.0) {
            (Rounding::Reference, 1) => 0,
            (_, k) => 1 << (k - 1),
        }
    }
}

/// Numeric representation of an accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    Int16,
    Q8,
    Q16,
    Float,
}

impl Representation {
    pub const ALL: [Representation; 4] = [
        Representation::Int16,
        Representation::Q8,
        Representation::Q16,
        Representation::Float,
    ];

    /// Caption suffix, e.g. the `16` in `LowP3_16`
    ///
    /// Q8.8 keeps the historic `32` tag; Q16.16 is tagged `Q16` so both
    /// 32-bit families stay distinguishable.
    pub fn suffix(self) -> &'static str {
        match self {
            Representation::Int16 => "16",
            Representation::Q8 => "32",
            Representation::Q16 => "Q16",
            Representation::Float => "float",
        }
    }
}

/// One EMA accumulator
///
/// `approach` takes its target in the accumulator's own domain, so a cascade
/// stage can be fed from the previous stage without de-scaling.
pub trait Accumulator: Copy + Default + fmt::Debug + PartialEq {
    /// Scale a raw sample into the accumulator domain
    fn widen(sample: Sample) -> Self;

    /// Advance one EMA step towards `target`
    fn approach(&mut self, target: Self, k: GainExponent, rounding: Rounding);

    /// De-scaled, externally visible value
    fn reading(&self) -> Reading;

    /// Advance one EMA step towards a raw sample
    #[inline]
    fn update(&mut self, sample: Sample, k: GainExponent, rounding: Rounding) {
        self.approach(Self::widen(sample), k, rounding);
    }
}

/// 16-bit accumulator in raw sample units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Int16(pub i16);

/// 32-bit accumulator, 8 fractional bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Q8(pub i32);

/// 32-bit accumulator, 16 fractional bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Q16(pub i32);

impl Q8 {
    pub const FRACTION_BITS: u32 = 8;
}

impl Q16 {
    pub const FRACTION_BITS: u32 = 16;
}

impl Accumulator for Int16 {
    #[inline]
    fn widen(sample: Sample) -> Self {
        Self(sample)
    }

    #[inline]
    fn approach(&mut self, target: Self, k: GainExponent, rounding: Rounding) {
        // The difference needs 17 bits; the sum always lies between the old
        // value and the target, so narrowing back is lossless.
        let y = i32::from(self.0);
        let step = (i32::from(target.0) - y + rounding.bias(k)) >> k.0;
        self.0 = (y + step) as i16;
    }

    #[inline]
    fn reading(&self) -> Reading {
        Reading::Int(i32::from(self.0))
    }
}

#[inline]
fn approach_fixed(acc: i32, target: i32, k: GainExponent, rounding: Rounding) -> i32 {
    let step = (i64::from(target) - i64::from(acc) + i64::from(rounding.bias(k))) >> k.0;
    acc.wrapping_add(step as i32)
}

impl Accumulator for Q8 {
    #[inline]
    fn widen(sample: Sample) -> Self {
        Self(i32::from(sample) << Self::FRACTION_BITS)
    }

    #[inline]
    fn approach(&mut self, target: Self, k: GainExponent, rounding: Rounding) {
        self.0 = approach_fixed(self.0, target.0, k, rounding);
    }

    #[inline]
    fn reading(&self) -> Reading {
        Reading::Int(self.0 >> Self::FRACTION_BITS)
    }
}

impl Accumulator for Q16 {
    #[inline]
    fn widen(sample: Sample) -> Self {
        Self(i32::from(sample) << Self::FRACTION_BITS)
    }

    #[inline]
    fn approach(&mut self, target: Self, k: GainExponent, rounding: Rounding) {
        self.0 = approach_fixed(self.0, target.0, k, rounding);
    }

    #[inline]
    fn reading(&self) -> Reading {
        Reading::Int(self.0 >> Self::FRACTION_BITS)
    }
}

impl Accumulator for f32 {
    #[inline]
    fn widen(sample: Sample) -> Self {
        f32::from(sample)
    }

    #[inline]
    fn approach(&mut self, target: Self, k: GainExponent, _rounding: Rounding) {
        *self += (target - *self) / k.divisor();
    }

    #[inline]
    fn reading(&self) -> Reading {
        Reading::Float(*self)
    }
}

// ============================================================================
// TESTS
// ============================================================================

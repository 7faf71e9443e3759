//! State-variable (two-integrator) filter
//!
//! ```text
//! highpass  = x - damping * bandpass - lowpass
//! bandpass += round(highpass * alpha)
//! lowpass  += round(bandpass * alpha)
//! ```
//!
//! All three outputs are available after every update. Two variants exist:
//! a 16-bit one where alpha is a right shift and damping is unity, and a
//! Q8.8 one where alpha and damping are 8-bit fractions (`256 == 1.0`).
//!
//! Resonant settings (damping far below unity, large alpha) can ring
//! without decay and eventually wrap. Wrapping is intentional: stored state
//! is narrowed with two's-complement truncation and never panics.

use crate::domain::config::{ConfigError, Result};
use crate::domain::ema::{GainExponent, Rounding, Sample};
use crate::domain::filters::Reading;
use serde::{Deserialize, Serialize};

/// Unity in Q8.8
pub const Q8_ONE: i32 = 256;

const Q8_HALF: i64 = 128;

/// Numeric variant of the state-variable filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiquadVariant {
    Int16,
    Q8,
}

impl BiquadVariant {
    pub fn suffix(self) -> &'static str {
        match self {
            BiquadVariant::Int16 => "16",
            BiquadVariant::Q8 => "32",
        }
    }
}

/// One of the three simultaneous outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiquadOutput {
    Lowpass,
    Bandpass,
    Highpass,
}

impl BiquadOutput {
    pub const ALL: [BiquadOutput; 3] = [BiquadOutput::Lowpass, BiquadOutput::Bandpass, BiquadOutput::Highpass];

    pub fn label(self) -> &'static str {
        match self {
            BiquadOutput::Lowpass => "LowP",
            BiquadOutput::Bandpass => "BandP",
            BiquadOutput::Highpass => "HighP",
        }
    }
}

/// Coefficients shared by both variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiquadCoeffs {
    /// Integrator gain of the 16-bit variant, `1 / 2^alpha_shift`
    pub alpha_shift: GainExponent,
    /// Integrator gain of the Q8.8 variant (1..=256)
    pub alpha: i32,
    /// Damping of the Q8.8 variant (0..=512, 256 = unity)
    pub damping: i32,
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self {
            alpha_shift: GainExponent::of(5),
            alpha: 4,
            damping: Q8_ONE,
        }
    }
}

impl BiquadCoeffs {
    pub fn validate(&self) -> Result<()> {
        if !(1..=Q8_ONE).contains(&self.alpha) {
            return Err(ConfigError::InvalidBiquad(format!(
                "alpha must be between 1 and {}, got {}",
                Q8_ONE, self.alpha
            )));
        }
        if !(0..=2 * Q8_ONE).contains(&self.damping) {
            return Err(ConfigError::InvalidBiquad(format!(
                "damping must be between 0 and {}, got {}",
                2 * Q8_ONE,
                self.damping
            )));
        }
        Ok(())
    }
}

// ============================================================================
// 16-bit variant
// ============================================================================

/// 16-bit state-variable filter, shift gain, unity damping
#[derive(Debug, Clone, Copy)]
pub struct SvfInt16 {
    lowpass: i16,
    bandpass: i16,
    highpass: i16,
    shift: GainExponent,
}

impl SvfInt16 {
    pub fn new(shift: GainExponent) -> Self {
        Self {
            lowpass: 0,
            bandpass: 0,
            highpass: 0,
            shift,
        }
    }

    #[inline]
    pub fn update(&mut self, sample: Sample, rounding: Rounding) {
        let bias = rounding.bias(self.shift);
        let k = self.shift.get();

        let hp = (i32::from(sample) - i32::from(self.bandpass) - i32::from(self.lowpass)) as i16;
        self.bandpass = self
            .bandpass
            .wrapping_add(((i32::from(hp) + bias) >> k) as i16);
        self.lowpass = self
            .lowpass
            .wrapping_add(((i32::from(self.bandpass) + bias) >> k) as i16);
        self.highpass = hp;
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.shift);
    }

    pub fn output(&self, output: BiquadOutput) -> Reading {
        Reading::Int(i32::from(self.raw(output)))
    }

    /// Stored value of one output
    pub fn raw(&self, output: BiquadOutput) -> i16 {
        match output {
            BiquadOutput::Lowpass => self.lowpass,
            BiquadOutput::Bandpass => self.bandpass,
            BiquadOutput::Highpass => self.highpass,
        }
    }
}

// ============================================================================
// Q8.8 variant
// ============================================================================

/// 32-bit Q8.8 state-variable filter
#[derive(Debug, Clone, Copy)]
pub struct SvfQ8 {
    lowpass: i32,
    bandpass: i32,
    highpass: i32,
    alpha: i64,
    damping: i64,
}

impl SvfQ8 {
    pub fn new(coeffs: &BiquadCoeffs) -> Self {
        Self {
            lowpass: 0,
            bandpass: 0,
            highpass: 0,
            alpha: i64::from(coeffs.alpha),
            damping: i64::from(coeffs.damping),
        }
    }

    #[inline]
    pub fn update(&mut self, sample: Sample) {
        let x = i64::from(sample) << 8;
        let bp = i64::from(self.bandpass);
        let lp = i64::from(self.lowpass);

        let hp = (x - ((bp * self.damping + Q8_HALF) >> 8) - lp) as i32;
        self.bandpass = self
            .bandpass
            .wrapping_add(((i64::from(hp) * self.alpha + Q8_HALF) >> 8) as i32);
        self.lowpass = self
            .lowpass
            .wrapping_add(((i64::from(self.bandpass) * self.alpha + Q8_HALF) >> 8) as i32);
        self.highpass = hp;
    }

    pub fn reset(&mut self) {
        self.lowpass = 0;
        self.bandpass = 0;
        self.highpass = 0;
    }

    /// De-scaled output
    pub fn output(&self, output: BiquadOutput) -> Reading {
        Reading::Int(self.raw(output) >> 8)
    }

    /// Q8.8 value of one output
    pub fn raw(&self, output: BiquadOutput) -> i32 {
        match output {
            BiquadOutput::Lowpass => self.lowpass,
            BiquadOutput::Bandpass => self.bandpass,
            BiquadOutput::Highpass => self.highpass,
        }
    }
}

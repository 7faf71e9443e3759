//! High-pass, band-pass and band-reject signals
//!
//! Computed at read time from already-updated low-pass accumulators; none
//! of them holds state. Integer readings are differenced in 32 bits, so
//! `sample - lowpass` cannot overflow for any 16-bit input.

use crate::domain::ema::Sample;
use crate::domain::filters::Reading;
use std::ops::Sub;

impl From<Sample> for Reading {
    fn from(sample: Sample) -> Self {
        Reading::Int(i32::from(sample))
    }
}

impl Sub for Reading {
    type Output = Reading;

    fn sub(self, rhs: Reading) -> Reading {
        match (self, rhs) {
            (Reading::Int(a), Reading::Int(b)) => Reading::Int(a - b),
            (Reading::Int(a), Reading::Float(b)) => Reading::Float(a as f32 - b),
            (Reading::Float(a), Reading::Int(b)) => Reading::Float(a - b as f32),
            (Reading::Float(a), Reading::Float(b)) => Reading::Float(a - b),
        }
    }
}

/// `sample - lowpass`
#[inline]
pub fn highpass(sample: Sample, lowpass: Reading) -> Reading {
    Reading::from(sample) - lowpass
}

/// `lowpass(fast) - lowpass(slow)`, where `fast` has the higher corner
#[inline]
pub fn bandpass(fast: Reading, slow: Reading) -> Reading {
    fast - slow
}

/// `sample - bandpass`
#[inline]
pub fn band_reject(sample: Sample, bandpass: Reading) -> Reading {
    Reading::from(sample) - bandpass
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ema::{Accumulator, GainExponent, Int16, Rounding, Q16, Q8};
    use proptest::prelude::*;

    #[test]
    fn test_mixed_representations() {
        assert_eq!(highpass(100, Reading::Int(40)), Reading::Int(60));
        assert_eq!(highpass(100, Reading::Float(40.5)), Reading::Float(59.5));
        assert_eq!(bandpass(Reading::Float(3.0), Reading::Int(1)), Reading::Float(2.0));
    }

    #[test]
    fn test_extremes_do_not_overflow() {
        assert_eq!(highpass(Sample::MIN, Reading::Int(i32::from(Sample::MAX))), Reading::Int(-65535));
        assert_eq!(band_reject(Sample::MAX, Reading::Int(-32768)), Reading::Int(65535));
    }

    #[test]
    fn test_bandpass_of_constant_input_decays() {
        let fast_k = GainExponent::of(1);
        let slow_k = GainExponent::of(3);
        let mut fast = Int16::default();
        let mut slow = Int16::default();

        let mut peak = 0;
        for _ in 0..200 {
            fast.update(1000, fast_k, Rounding::Reference);
            slow.update(1000, slow_k, Rounding::Reference);
            if let Reading::Int(bp) = bandpass(fast.reading(), slow.reading()) {
                peak = peak.max(bp);
            }
        }
        assert!(peak > 300);

        let settled = bandpass(fast.reading(), slow.reading());
        assert!(settled.as_f64().abs() <= 4.0, "settled at {}", settled);

        let reject = band_reject(1000, settled);
        assert!((reject.as_f64() - 1000.0).abs() <= 4.0);
    }

    fn reconstructs<A: Accumulator>(input: &[Sample], k: GainExponent) -> bool {
        let mut lp = A::default();
        input.iter().all(|&x| {
            lp.update(x, k, Rounding::Reference);
            let low = lp.reading();
            let high = highpass(x, low);
            match (high, low) {
                (Reading::Int(h), Reading::Int(l)) => h + l == i32::from(x),
                _ => false,
            }
        })
    }

    proptest! {
        #[test]
        fn prop_highpass_plus_lowpass_is_sample(
            input in proptest::collection::vec(any::<i16>(), 1..300),
            k in 1u8..=8,
        ) {
            let k = GainExponent::of(k);
            prop_assert!(reconstructs::<Int16>(&input, k));
            prop_assert!(reconstructs::<Q8>(&input, k));
            prop_assert!(reconstructs::<Q16>(&input, k));
        }
    }
}

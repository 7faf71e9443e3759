//! Filter identifiers, readings and output selection
//!
//! A [`FilterId`] names one observable signal of the bank. IDs are plain
//! data: they serialize into the bank configuration, render the caption
//! label of the signal and decide which accumulators the bank has to run.

use crate::domain::biquad::{BiquadOutput, BiquadVariant};
use crate::domain::cascade::CascadeOrder;
use crate::domain::config::{ConfigError, Result};
use crate::domain::ema::{GainExponent, Representation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound on filters per bank, one selection bit each
pub const MAX_FILTERS: usize = 64;

// ============================================================================
// FILTER IDS
// ============================================================================

/// One observable signal of a filter bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterId {
    /// The last sample passed to `step`
    Input,
    /// Single, double or triple EMA low-pass
    Lowpass {
        repr: Representation,
        exponent: GainExponent,
        #[serde(default)]
        order: CascadeOrder,
    },
    /// `sample - lowpass`
    Highpass {
        repr: Representation,
        exponent: GainExponent,
    },
    /// `lowpass(fast) - lowpass(slow)`
    Bandpass {
        repr: Representation,
        fast: GainExponent,
        slow: GainExponent,
    },
    /// `sample - bandpass`
    BandReject {
        repr: Representation,
        fast: GainExponent,
        slow: GainExponent,
    },
    /// One output of a state-variable filter
    Biquad {
        variant: BiquadVariant,
        output: BiquadOutput,
    },
}

impl FilterId {
    pub const fn lowpass(repr: Representation, exponent: GainExponent) -> Self {
        FilterId::Lowpass {
            repr,
            exponent,
            order: CascadeOrder::Single,
        }
    }

    pub const fn cascade(repr: Representation, exponent: GainExponent, order: CascadeOrder) -> Self {
        FilterId::Lowpass { repr, exponent, order }
    }

    pub const fn highpass(repr: Representation, exponent: GainExponent) -> Self {
        FilterId::Highpass { repr, exponent }
    }

    pub const fn bandpass(repr: Representation, fast: GainExponent, slow: GainExponent) -> Self {
        FilterId::Bandpass { repr, fast, slow }
    }

    pub const fn band_reject(repr: Representation, fast: GainExponent, slow: GainExponent) -> Self {
        FilterId::BandReject { repr, fast, slow }
    }

    pub const fn biquad(variant: BiquadVariant, output: BiquadOutput) -> Self {
        FilterId::Biquad { variant, output }
    }

    /// Check constraints the type system does not encode
    pub fn validate(&self) -> Result<()> {
        match *self {
            FilterId::Bandpass { fast, slow, .. } | FilterId::BandReject { fast, slow, .. }
                if fast >= slow =>
            {
                Err(ConfigError::InvalidBandpass {
                    fast: fast.get(),
                    slow: slow.get(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Low-pass chains this signal reads, as `(repr, exponent, order)`
    pub fn lowpass_dependencies(&self) -> Vec<(Representation, GainExponent, CascadeOrder)> {
        match *self {
            FilterId::Lowpass { repr, exponent, order } => vec![(repr, exponent, order)],
            FilterId::Highpass { repr, exponent } => vec![(repr, exponent, CascadeOrder::Single)],
            FilterId::Bandpass { repr, fast, slow } | FilterId::BandReject { repr, fast, slow } => vec![
                (repr, fast, CascadeOrder::Single),
                (repr, slow, CascadeOrder::Single),
            ],
            FilterId::Input | FilterId::Biquad { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FilterId::Input => write!(f, "Input"),
            FilterId::Lowpass { repr, exponent, order } => {
                write!(f, "{}LowP{}_{}", order.prefix(), exponent, repr.suffix())
            }
            FilterId::Highpass { repr, exponent } => {
                write!(f, "HighP{}_{}", exponent, repr.suffix())
            }
            FilterId::Bandpass { repr, fast, slow } => {
                write!(f, "BandP{}_{}_{}", fast, slow, repr.suffix())
            }
            FilterId::BandReject { repr, fast, slow } => {
                write!(f, "Reject{}_{}_{}", fast, slow, repr.suffix())
            }
            FilterId::Biquad { variant, output } => {
                write!(f, "BiQuad{}_{}", output.label(), variant.suffix())
            }
        }
    }
}

// ============================================================================
// READINGS
// ============================================================================

/// De-scaled value of one filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Int(i32),
    Float(f32),
}

impl Reading {
    pub fn as_f64(self) -> f64 {
        match self {
            Reading::Int(v) => f64::from(v),
            Reading::Float(v) => f64::from(v),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Int(v) => write!(f, "{}", v),
            Reading::Float(v) => write!(f, "{:.2}", v),
        }
    }
}

// ============================================================================
// SELECTION
// ============================================================================

/// Bit set over a bank's filter list; bit `i` selects the `i`-th filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionMask(u64);

impl SelectionMask {
    pub const ALL: SelectionMask = SelectionMask(u64::MAX);
    pub const NONE: SelectionMask = SelectionMask(0);

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub fn contains(self, index: usize) -> bool {
        index < MAX_FILTERS && self.0 & (1 << index) != 0
    }

    /// Mask with `index` added. Indices past the mask width are ignored.
    #[must_use]
    pub fn with(self, index: usize) -> Self {
        if index < MAX_FILTERS {
            Self(self.0 | (1 << index))
        } else {
            self
        }
    }

    /// Selected indices below `len`, ascending
    pub fn iter(self, len: usize) -> impl Iterator<Item = usize> {
        (0..len.min(MAX_FILTERS)).filter(move |&i| self.contains(i))
    }

    pub fn count(self, len: usize) -> usize {
        self.iter(len).count()
    }
}

/// Named filter selections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    SignificantFilters,
    AllLowPass,
    LowAndHighPass,
    BandPassAndReject,
    LowPass1358,
    LowPass1632,
    HigherOrderLowPass16,
    BiQuadFilters,
}

impl Preset {
    pub const ALL: [Preset; 8] = [
        Preset::SignificantFilters,
        Preset::AllLowPass,
        Preset::LowAndHighPass,
        Preset::BandPassAndReject,
        Preset::LowPass1358,
        Preset::LowPass1632,
        Preset::HigherOrderLowPass16,
        Preset::BiQuadFilters,
    ];

    /// Caption tag, printed as `__LABEL__`
    pub fn label(self) -> &'static str {
        match self {
            Preset::SignificantFilters => "SIGNIFICANT_FILTERS",
            Preset::AllLowPass => "ALL_LOW_PASS",
            Preset::LowAndHighPass => "LOW_AND_HIGH_PASS",
            Preset::BandPassAndReject => "BAND_PASS_AND_REJECT",
            Preset::LowPass1358 => "LOW_PASS_1_3_5_8",
            Preset::LowPass1632 => "LOW_PASS_16_32",
            Preset::HigherOrderLowPass16 => "HIGHER_ORDER_LOW_PASS_16",
            Preset::BiQuadFilters => "BI_QUAD_FILTERS",
        }
    }

    /// Whether the preset shows `id`. The input is part of every preset.
    pub fn includes(self, id: &FilterId) -> bool {
        use Representation::{Float, Int16, Q8};

        let single = |id: &FilterId, reprs: &[Representation], ks: &[u8]| match *id {
            FilterId::Lowpass {
                repr,
                exponent,
                order: CascadeOrder::Single,
            } => reprs.contains(&repr) && ks.contains(&exponent.get()),
            _ => false,
        };

        if *id == FilterId::Input {
            return true;
        }
        match self {
            Preset::SignificantFilters => {
                single(id, &[Int16], &[1, 3, 5])
                    || single(id, &[Q8], &[8])
                    || matches!(
                        id,
                        FilterId::Lowpass {
                            repr: Int16,
                            order: CascadeOrder::Double,
                            ..
                        } | FilterId::Highpass { repr: Int16, .. }
                    )
                    || *id == FilterId::bandpass(Int16, GainExponent::of(1), GainExponent::of(3))
                    || *id == FilterId::band_reject(Int16, GainExponent::of(3), GainExponent::of(4))
            }
            Preset::AllLowPass => matches!(id, FilterId::Lowpass { .. }),
            Preset::LowAndHighPass => {
                single(id, &[Int16], &[1, 3]) || matches!(id, FilterId::Highpass { .. })
            }
            Preset::BandPassAndReject => {
                matches!(id, FilterId::Bandpass { .. } | FilterId::BandReject { .. })
            }
            Preset::LowPass1358 => single(id, &[Int16], &[1, 3, 5]) || single(id, &[Q8], &[8]),
            Preset::LowPass1632 => single(id, &[Int16, Q8, Float], &[3, 5]),
            Preset::HigherOrderLowPass16 => match *id {
                FilterId::Lowpass {
                    repr: Int16,
                    exponent,
                    order,
                } => order != CascadeOrder::Single || (3..=5).contains(&exponent.get()),
                _ => false,
            },
            Preset::BiQuadFilters => matches!(id, FilterId::Biquad { .. }),
        }
    }

    /// Subset of `filters` shown by this preset, order preserved
    pub fn filters(self, filters: &[FilterId]) -> Vec<FilterId> {
        filters.iter().copied().filter(|id| self.includes(id)).collect()
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    /// Accepts the caption tag (`LOW_PASS_16_32`) or its kebab/snake form.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
        Preset::ALL
            .into_iter()
            .find(|p| p.label() == wanted)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown preset '{}'", s)))
    }
}

// ============================================================================
// STANDARD CATALOGUE
// ============================================================================

const fn k(exponent: u8) -> GainExponent {
    GainExponent::of(exponent)
}

/// Every signal of the full demo bank, in caption order
pub const STANDARD_CATALOG: [FilterId; 29] = {
    use BiquadOutput::{Bandpass, Highpass, Lowpass};
    use CascadeOrder::{Double, Triple};
    use Representation::{Float, Int16, Q16, Q8};

    [
        FilterId::Input,
        FilterId::lowpass(Int16, k(1)),
        FilterId::lowpass(Int16, k(2)),
        FilterId::lowpass(Int16, k(3)),
        FilterId::lowpass(Q8, k(3)),
        FilterId::cascade(Int16, k(3), Double),
        FilterId::cascade(Int16, k(3), Triple),
        FilterId::lowpass(Int16, k(4)),
        FilterId::cascade(Int16, k(4), Double),
        FilterId::lowpass(Int16, k(5)),
        FilterId::cascade(Int16, k(5), Double),
        FilterId::lowpass(Q8, k(5)),
        FilterId::lowpass(Float, k(5)),
        FilterId::lowpass(Q8, k(8)),
        FilterId::lowpass(Q16, k(8)),
        FilterId::lowpass(Float, k(8)),
        FilterId::highpass(Int16, k(1)),
        FilterId::highpass(Int16, k(3)),
        FilterId::bandpass(Int16, k(1), k(3)),
        FilterId::bandpass(Int16, k(1), k(5)),
        FilterId::bandpass(Int16, k(3), k(4)),
        FilterId::bandpass(Int16, k(3), k(5)),
        FilterId::band_reject(Int16, k(3), k(4)),
        FilterId::biquad(BiquadVariant::Int16, Lowpass),
        FilterId::biquad(BiquadVariant::Int16, Highpass),
        FilterId::biquad(BiquadVariant::Int16, Bandpass),
        FilterId::biquad(BiquadVariant::Q8, Lowpass),
        FilterId::biquad(BiquadVariant::Q8, Highpass),
        FilterId::biquad(BiquadVariant::Q8, Bandpass),
    ]
};

pub fn standard_catalog() -> Vec<FilterId> {
    STANDARD_CATALOG.to_vec()
}

//! Domain entities and filter rules

pub mod bank;
pub mod biquad;
pub mod cascade;
pub mod config;
pub mod derived;
pub mod ema;
pub mod filters;

// Re-export specific items to avoid ambiguous glob imports
pub use bank::{FilterBank, StepTiming};
pub use biquad::{BiquadCoeffs, BiquadOutput, BiquadVariant, SvfInt16, SvfQ8};
pub use cascade::{Cascade, CascadeOrder, LowpassChain};
pub use config::{BankConfig, ConfigError};
pub use ema::{Accumulator, GainExponent, Int16, Q16, Q8, Representation, Rounding, Sample};
pub use filters::{standard_catalog, FilterId, Preset, Reading, SelectionMask, MAX_FILTERS, STANDARD_CATALOG};

//! Exponential-moving-average filter bank
//!
//! Integer, fixed-point and floating-point EMA low-pass filters, their
//! cascades and derived high/band/reject signals, plus a state-variable
//! biquad, driven one 16-bit sample at a time.

pub mod domain;

pub use domain::*;

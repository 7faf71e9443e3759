//! Cascaded EMA low-pass chains
//!
//! A chain holds up to three accumulators sharing one gain exponent. Stage 1
//! follows the sample, stage 2 follows stage 1's freshly updated value and
//! stage 3 follows stage 2's, all within the same `update` call.

use crate::domain::config::{ConfigError, Result};
use crate::domain::ema::{Accumulator, GainExponent, Int16, Representation, Rounding, Sample, Q16, Q8};
use crate::domain::filters::Reading;
use serde::{Deserialize, Serialize};

/// Number of stages in a low-pass cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CascadeOrder {
    /// ~6 dB/octave
    #[default]
    Single = 1,
    /// ~12 dB/octave
    Double = 2,
    /// ~18 dB/octave
    Triple = 3,
}

impl CascadeOrder {
    pub fn stages(self) -> usize {
        self as usize
    }

    /// Caption prefix (`""`, `"Double"`, `"Triple"`)
    pub fn prefix(self) -> &'static str {
        match self {
            CascadeOrder::Single => "",
            CascadeOrder::Double => "Double",
            CascadeOrder::Triple => "Triple",
        }
    }
}

impl TryFrom<u8> for CascadeOrder {
    type Error = ConfigError;

    fn try_from(order: u8) -> Result<Self> {
        match order {
            1 => Ok(CascadeOrder::Single),
            2 => Ok(CascadeOrder::Double),
            3 => Ok(CascadeOrder::Triple),
            other => Err(ConfigError::Invalid(format!(
                "cascade order must be 1, 2 or 3, got {}",
                other
            ))),
        }
    }
}

impl From<CascadeOrder> for u8 {
    fn from(order: CascadeOrder) -> Self {
        order as u8
    }
}

/// Chain of up to three EMA stages in one representation
#[derive(Debug, Clone, Copy)]
pub struct Cascade<A: Accumulator> {
    stages: [A; 3],
    depth: CascadeOrder,
    exponent: GainExponent,
}

impl<A: Accumulator> Cascade<A> {
    pub fn new(exponent: GainExponent, depth: CascadeOrder) -> Self {
        Self {
            stages: [A::default(); 3],
            depth,
            exponent,
        }
    }

    /// Advance every stage once, top-down.
    #[inline]
    pub fn update(&mut self, sample: Sample, rounding: Rounding) {
        let mut target = A::widen(sample);
        for stage in &mut self.stages[..self.depth.stages()] {
            stage.approach(target, self.exponent, rounding);
            target = *stage;
        }
    }

    /// Accumulator of the given stage. Stages beyond the depth stay at zero.
    pub fn stage(&self, order: CascadeOrder) -> &A {
        &self.stages[order.stages() - 1]
    }

    pub fn reset(&mut self) {
        self.stages = [A::default(); 3];
    }

    /// Grow the chain so `order` is tracked. Existing stages keep their state.
    pub fn deepen(&mut self, order: CascadeOrder) {
        self.depth = self.depth.max(order);
    }

    pub fn depth(&self) -> CascadeOrder {
        self.depth
    }

    pub fn exponent(&self) -> GainExponent {
        self.exponent
    }
}

/// Cascade in any of the four representations
#[derive(Debug, Clone, Copy)]
pub enum LowpassChain {
    Int16(Cascade<Int16>),
    Q8(Cascade<Q8>),
    Q16(Cascade<Q16>),
    Float(Cascade<f32>),
}

impl LowpassChain {
    pub fn new(repr: Representation, exponent: GainExponent, depth: CascadeOrder) -> Self {
        match repr {
            Representation::Int16 => LowpassChain::Int16(Cascade::new(exponent, depth)),
            Representation::Q8 => LowpassChain::Q8(Cascade::new(exponent, depth)),
            Representation::Q16 => LowpassChain::Q16(Cascade::new(exponent, depth)),
            Representation::Float => LowpassChain::Float(Cascade::new(exponent, depth)),
        }
    }

    #[inline]
    pub fn update(&mut self, sample: Sample, rounding: Rounding) {
        match self {
            LowpassChain::Int16(c) => c.update(sample, rounding),
            LowpassChain::Q8(c) => c.update(sample, rounding),
            LowpassChain::Q16(c) => c.update(sample, rounding),
            LowpassChain::Float(c) => c.update(sample, rounding),
        }
    }

    pub fn reset(&mut self) {
        match self {
            LowpassChain::Int16(c) => c.reset(),
            LowpassChain::Q8(c) => c.reset(),
            LowpassChain::Q16(c) => c.reset(),
            LowpassChain::Float(c) => c.reset(),
        }
    }

    pub fn deepen(&mut self, order: CascadeOrder) {
        match self {
            LowpassChain::Int16(c) => c.deepen(order),
            LowpassChain::Q8(c) => c.deepen(order),
            LowpassChain::Q16(c) => c.deepen(order),
            LowpassChain::Float(c) => c.deepen(order),
        }
    }

    /// De-scaled output of one stage
    pub fn reading(&self, order: CascadeOrder) -> Reading {
        match self {
            LowpassChain::Int16(c) => c.stage(order).reading(),
            LowpassChain::Q8(c) => c.stage(order).reading(),
            LowpassChain::Q16(c) => c.stage(order).reading(),
            LowpassChain::Float(c) => c.stage(order).reading(),
        }
    }

    pub fn repr(&self) -> Representation {
        match self {
            LowpassChain::Int16(_) => Representation::Int16,
            LowpassChain::Q8(_) => Representation::Q8,
            LowpassChain::Q16(_) => Representation::Q16,
            LowpassChain::Float(_) => Representation::Float,
        }
    }

    pub fn exponent(&self) -> GainExponent {
        match self {
            LowpassChain::Int16(c) => c.exponent(),
            LowpassChain::Q8(c) => c.exponent(),
            LowpassChain::Q16(c) => c.exponent(),
            LowpassChain::Float(c) => c.exponent(),
        }
    }

    pub fn depth(&self) -> CascadeOrder {
        match self {
            LowpassChain::Int16(c) => c.depth(),
            LowpassChain::Q8(c) => c.depth(),
            LowpassChain::Q16(c) => c.depth(),
            LowpassChain::Float(c) => c.depth(),
        }
    }
}

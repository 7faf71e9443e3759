//! Filter bank driver
//!
//! Owns every accumulator of a configured bank and advances them once per
//! sample. Low-pass chains that share representation and exponent share
//! state, so a double low-pass's first stage is the single low-pass of the
//! same exponent. Derived signals are computed when they are read.

use crate::domain::biquad::{BiquadOutput, BiquadVariant, SvfInt16, SvfQ8};
use crate::domain::cascade::{CascadeOrder, LowpassChain};
use crate::domain::config::{BankConfig, Result};
use crate::domain::derived;
use crate::domain::ema::{GainExponent, Representation, Sample};
use crate::domain::filters::{FilterId, Preset, Reading, SelectionMask};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Where a filter's value comes from
#[derive(Debug, Clone, Copy)]
enum Source {
    Input,
    Lowpass { chain: usize, order: CascadeOrder },
    Highpass { chain: usize },
    Bandpass { fast: usize, slow: usize },
    BandReject { fast: usize, slow: usize },
    Svf16(BiquadOutput),
    Svf32(BiquadOutput),
}

/// Wall-clock cost of `step`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepTiming {
    pub steps: u64,
    pub total: Duration,
    pub max: Duration,
}

impl StepTiming {
    fn record(&mut self, elapsed: Duration) {
        self.steps += 1;
        self.total += elapsed;
        self.max = self.max.max(elapsed);
    }

    pub fn mean(&self) -> Duration {
        match u32::try_from(self.steps) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total / n,
            Err(_) => Duration::from_secs_f64(self.total.as_secs_f64() / self.steps as f64),
        }
    }
}

/// A configured set of EMA and state-variable filters
///
/// # Example
///
/// ```
/// use emafilters_core::{FilterBank, FilterId, GainExponent, Reading, Representation};
///
/// let mut bank = FilterBank::standard();
/// for _ in 0..100 {
///     bank.step(1000);
/// }
///
/// let lp = FilterId::lowpass(Representation::Int16, GainExponent::of(3));
/// assert_eq!(bank.value(lp), Some(Reading::Int(997)));
/// ```
#[derive(Debug, Clone)]
pub struct FilterBank {
    config: BankConfig,
    slots: Vec<(FilterId, Source)>,
    chains: Vec<LowpassChain>,
    svf16: Option<SvfInt16>,
    svf32: Option<SvfQ8>,
    last_sample: Sample,
    primed: bool,
    selection: SelectionMask,
    timing: Option<StepTiming>,
}

impl FilterBank {
    /// Build a bank from a configuration, validating it first
    pub fn new(config: BankConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    /// Bank over the factory default configuration
    pub fn standard() -> Self {
        Self::from_validated(BankConfig::factory_default())
    }

    fn from_validated(config: BankConfig) -> Self {
        let mut chains = Vec::new();
        let mut svf16 = None;
        let mut svf32 = None;

        let slots = config
            .filters
            .iter()
            .map(|&id| {
                let chain: Vec<usize> = id
                    .lowpass_dependencies()
                    .into_iter()
                    .map(|(repr, exponent, order)| chain_index(&mut chains, repr, exponent, order))
                    .collect();
                let source = match (id, chain.as_slice()) {
                    (FilterId::Input, _) => Source::Input,
                    (FilterId::Lowpass { order, .. }, &[chain]) => Source::Lowpass { chain, order },
                    (FilterId::Highpass { .. }, &[chain]) => Source::Highpass { chain },
                    (FilterId::Bandpass { .. }, &[fast, slow]) => Source::Bandpass { fast, slow },
                    (FilterId::BandReject { .. }, &[fast, slow]) => Source::BandReject { fast, slow },
                    (
                        FilterId::Biquad {
                            variant: BiquadVariant::Int16,
                            output,
                        },
                        _,
                    ) => {
                        svf16.get_or_insert_with(|| SvfInt16::new(config.biquad.alpha_shift));
                        Source::Svf16(output)
                    }
                    (
                        FilterId::Biquad {
                            variant: BiquadVariant::Q8,
                            output,
                        },
                        _,
                    ) => {
                        svf32.get_or_insert_with(|| SvfQ8::new(&config.biquad));
                        Source::Svf32(output)
                    }
                    // lowpass_dependencies yields one chain per low/high-pass
                    // and two per band filter, so no other shape occurs
                    _ => Source::Input,
                };
                (id, source)
            })
            .collect();

        debug!(
            filters = config.filters.len(),
            chains = chains.len(),
            rounding = ?config.rounding,
            timing = config.measure_timing,
            "Filter bank configured"
        );

        Self {
            timing: config.measure_timing.then(StepTiming::default),
            config,
            slots,
            chains,
            svf16,
            svf32,
            last_sample: 0,
            primed: false,
            selection: SelectionMask::ALL,
        }
    }

    /// Replace the configuration. History is discarded and the selection
    /// goes back to every filter. On error the bank is left untouched.
    pub fn configure(&mut self, config: BankConfig) -> Result<()> {
        config.validate()?;
        *self = Self::from_validated(config);
        Ok(())
    }

    /// Feed one sample to every enabled filter
    #[inline]
    pub fn step(&mut self, sample: Sample) {
        let started = self.timing.is_some().then(Instant::now);
        let rounding = self.config.rounding;

        for chain in &mut self.chains {
            chain.update(sample, rounding);
        }
        if let Some(svf) = &mut self.svf16 {
            svf.update(sample, rounding);
        }
        if let Some(svf) = &mut self.svf32 {
            svf.update(sample);
        }
        self.last_sample = sample;
        self.primed = true;

        if let (Some(timing), Some(started)) = (&mut self.timing, started) {
            timing.record(started.elapsed());
        }
    }

    /// Zero every accumulator; configuration and selection are kept
    pub fn reset(&mut self) {
        for chain in &mut self.chains {
            chain.reset();
        }
        if let Some(svf) = &mut self.svf16 {
            svf.reset();
        }
        if let Some(svf) = &mut self.svf32 {
            svf.reset();
        }
        self.last_sample = 0;
        self.primed = false;
        if let Some(timing) = &mut self.timing {
            *timing = StepTiming::default();
        }
        trace!("Filter bank reset");
    }

    /// Current de-scaled value of `id`
    ///
    /// `None` when `id` is not enabled or nothing was stepped since the last
    /// construction, reset or reconfiguration.
    pub fn value(&self, id: FilterId) -> Option<Reading> {
        let index = self.slots.iter().position(|(slot, _)| *slot == id)?;
        self.value_at(index)
    }

    /// Value of the `index`-th enabled filter
    pub fn value_at(&self, index: usize) -> Option<Reading> {
        if !self.primed {
            return None;
        }
        let (_, source) = self.slots.get(index)?;
        Some(self.read(*source))
    }

    fn read(&self, source: Source) -> Reading {
        let lowpass = |chain: usize| self.chains[chain].reading(CascadeOrder::Single);
        match source {
            Source::Input => Reading::from(self.last_sample),
            Source::Lowpass { chain, order } => self.chains[chain].reading(order),
            Source::Highpass { chain } => derived::highpass(self.last_sample, lowpass(chain)),
            Source::Bandpass { fast, slow } => derived::bandpass(lowpass(fast), lowpass(slow)),
            Source::BandReject { fast, slow } => {
                derived::band_reject(self.last_sample, derived::bandpass(lowpass(fast), lowpass(slow)))
            }
            Source::Svf16(output) => self
                .svf16
                .map_or(Reading::Int(0), |svf| svf.output(output)),
            Source::Svf32(output) => self
                .svf32
                .map_or(Reading::Int(0), |svf| svf.output(output)),
        }
    }

    /// Choose which filters `selected` reports. Every enabled filter keeps
    /// updating regardless of the mask.
    pub fn select_outputs(&mut self, mask: SelectionMask) {
        self.selection = mask;
    }

    pub fn selection(&self) -> SelectionMask {
        self.selection
    }

    /// Enabled filters, in configuration order
    pub fn filters(&self) -> &[FilterId] {
        &self.config.filters
    }

    /// Selected filters with their current values
    pub fn selected(&self) -> impl Iterator<Item = (FilterId, Option<Reading>)> + '_ {
        self.selection
            .iter(self.slots.len())
            .map(move |i| (self.slots[i].0, self.value_at(i)))
    }

    /// Mask of every enabled filter matching `pred`
    pub fn mask_where<F>(&self, pred: F) -> SelectionMask
    where
        F: Fn(&FilterId) -> bool,
    {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, (id, _))| pred(id))
            .fold(SelectionMask::NONE, |mask, (i, _)| mask.with(i))
    }

    pub fn mask_for_preset(&self, preset: Preset) -> SelectionMask {
        self.mask_where(|id| preset.includes(id))
    }

    /// Distinct low-pass chains as `(repr, exponent, depth)`
    pub fn lowpass_families(&self) -> impl Iterator<Item = (Representation, GainExponent, CascadeOrder)> + '_ {
        self.chains
            .iter()
            .map(|chain| (chain.repr(), chain.exponent(), chain.depth()))
    }

    /// Step timing, when enabled in the configuration
    pub fn timing(&self) -> Option<StepTiming> {
        self.timing
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }
}

impl Default for FilterBank {
    fn default() -> Self {
        Self::standard()
    }
}

fn chain_index(
    chains: &mut Vec<LowpassChain>,
    repr: Representation,
    exponent: GainExponent,
    order: CascadeOrder,
) -> usize {
    match chains
        .iter()
        .position(|c| c.repr() == repr && c.exponent() == exponent)
    {
        Some(index) => {
            chains[index].deepen(order);
            index
        }
        None => {
            chains.push(LowpassChain::new(repr, exponent, order));
            chains.len() - 1
        }
    }
}

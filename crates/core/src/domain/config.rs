//! Configuration for the filter bank
//!
//! This module provides:
//! - `ConfigError`, the only error type the core raises
//! - `BankConfig`, the serializable bank description (rounding, sample rate,
//!   timing, biquad coefficients, enabled filters)
//! - Async TOML load/save

use crate::domain::biquad::BiquadCoeffs;
use crate::domain::ema::Rounding;
use crate::domain::filters::{standard_catalog, FilterId, MAX_FILTERS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while building or persisting a bank configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Gain exponent must be between 1 and 15, got {0}")]
    InvalidExponent(u8),

    #[error("Band filter needs fast < slow exponent, got {fast} and {slow}")]
    InvalidBandpass { fast: u8, slow: u8 },

    #[error("Invalid biquad coefficients: {0}")]
    InvalidBiquad(String),

    #[error("Too many filters: {0} (at most {max})", max = MAX_FILTERS)]
    TooManyFilters(usize),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete description of a filter bank
///
/// Scalar fields come first so the TOML output keeps them above the
/// `[biquad]` table and the `[[filters]]` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankConfig {
    #[serde(default)]
    pub rounding: Rounding,

    /// Nominal sampling rate, only used to report corner frequencies
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: f64,

    /// Measure the duration of every `step`
    #[serde(default)]
    pub measure_timing: bool,

    #[serde(default)]
    pub biquad: BiquadCoeffs,

    #[serde(default)]
    pub filters: Vec<FilterId>,
}

fn default_sample_rate() -> f64 {
    1000.0
}

impl Default for BankConfig {
    fn default() -> Self {
        Self::factory_default()
    }
}

impl BankConfig {
    /// Every filter of the standard catalogue, reference rounding, 1 kHz
    pub fn factory_default() -> Self {
        Self::with_filters(standard_catalog())
    }

    /// Default settings with a custom filter list
    pub fn with_filters(filters: Vec<FilterId>) -> Self {
        Self {
            rounding: Rounding::default(),
            sample_rate_hz: default_sample_rate(),
            measure_timing: false,
            biquad: BiquadCoeffs::default(),
            filters,
        }
    }

    /// Check every constraint a bank relies on
    pub fn validate(&self) -> Result<()> {
        if self.filters.len() > MAX_FILTERS {
            return Err(ConfigError::TooManyFilters(self.filters.len()));
        }
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "sample rate must be positive, got {}",
                self.sample_rate_hz
            )));
        }
        self.biquad.validate()?;
        for id in &self.filters {
            id.validate()?;
        }
        for (i, id) in self.filters.iter().enumerate() {
            if self.filters[..i].contains(id) {
                return Err(ConfigError::Invalid(format!("duplicate filter {}", id)));
            }
        }
        Ok(())
    }

    /// Load and validate a configuration from a TOML file
    #[instrument(skip(path))]
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let contents = fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;

        debug!(filters = config.filters.len(), "Configuration loaded successfully");
        Ok(config)
    }

    /// Save configuration to a TOML file
    #[instrument(skip(self, path))]
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!(path = %path.display(), "Saving configuration");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str).await?;

        debug!("Configuration saved successfully");
        Ok(())
    }

    /// Load `path` if it exists, otherwise fall back to the factory default
    #[instrument(skip(path))]
    pub async fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if fs::try_exists(path).await? {
            Self::load_from_file(path).await
        } else {
            info!(path = %path.display(), "Config file not found, using factory default");
            Ok(Self::factory_default())
        }
    }
}

//! Test signal sources
//!
//! Synthetic sequences for exercising the bank, plus a reader for recorded
//! sample files (one integer per line or whitespace separated, `#` starts a
//! comment).

use clap::ValueEnum;
use emafilters_core::Sample;
use std::f64::consts::TAU;
use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument};

#[derive(Error, Debug)]
pub enum SignalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: '{text}' is not an integer")]
    Parse { line: usize, text: String },

    #[error("line {line}: {value} does not fit in a 16-bit sample")]
    OutOfRange { line: usize, value: i64 },

    #[error("--signal file needs --input <path|->")]
    MissingInput,

    #[error("period must be at least 1")]
    ZeroPeriod,
}

pub type Result<T> = std::result::Result<T, SignalError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SignalKind {
    /// `period` zeros, then the amplitude for the rest of the run
    Step,
    /// One sample at the amplitude, then zeros
    Impulse,
    /// Amplitude for half a period, zero for the other half
    Square,
    /// Sine of the given amplitude and period
    Sine,
    /// Samples read from `--input`
    File,
}

/// Parameters of a generated signal
#[derive(Debug, Clone, Copy)]
pub struct Generator {
    pub kind: SignalKind,
    pub samples: usize,
    pub amplitude: Sample,
    pub period: usize,
}

impl Generator {
    /// Produce the sequence. `File` yields nothing here, see [`read_samples`].
    pub fn generate(&self) -> Result<Vec<Sample>> {
        if self.period == 0 {
            return Err(SignalError::ZeroPeriod);
        }
        let sample_at: fn(usize, Sample, usize) -> Sample = match self.kind {
            SignalKind::Step => |n, amplitude, period| if n < period { 0 } else { amplitude },
            SignalKind::Impulse => |n, amplitude, _| if n == 0 { amplitude } else { 0 },
            SignalKind::Square => |n, amplitude, period| {
                if n % period < period.div_ceil(2) {
                    amplitude
                } else {
                    0
                }
            },
            SignalKind::Sine => |n, amplitude, period| {
                let phase = TAU * (n % period) as f64 / period as f64;
                (f64::from(amplitude) * phase.sin()).round() as Sample
            },
            SignalKind::File => return Ok(Vec::new()),
        };

        Ok((0..self.samples)
            .map(|n| sample_at(n, self.amplitude, self.period))
            .collect())
    }
}

/// Parse a recorded sample listing
pub fn parse_samples(text: &str) -> Result<Vec<Sample>> {
    let mut samples = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let content = line.split('#').next().unwrap_or_default();
        for token in content.split(|c: char| c.is_whitespace() || c == ',') {
            if token.is_empty() {
                continue;
            }
            let value: i64 = token.parse().map_err(|_| SignalError::Parse {
                line: line_no,
                text: token.to_string(),
            })?;
            let sample = Sample::try_from(value).map_err(|_| SignalError::OutOfRange { line: line_no, value })?;
            samples.push(sample);
        }
    }
    Ok(samples)
}

/// Read samples from a file, or from stdin when `path` is `-`
#[instrument]
pub async fn read_samples(path: &Path) -> Result<Vec<Sample>> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        text
    } else {
        tokio::fs::read_to_string(path).await?
    };

    let samples = parse_samples(&text)?;
    debug!(count = samples.len(), "Samples read");
    Ok(samples)
}

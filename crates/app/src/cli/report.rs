//! Output formatting
//!
//! `plotter` writes a caption line followed by one space-separated row per
//! sample, which the Arduino Serial Plotter (and most plotting tools) read
//! directly. `json` writes one object per sample.

use clap::ValueEnum;
use emafilters_core::{FilterBank, Preset, Reading};
use serde::{Serialize, Serializer};
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Plotter,
    Json,
}

/// One JSON line
#[derive(Debug, Serialize)]
struct JsonRow<'a> {
    n: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    preset: Option<&'a str>,
    values: CaptionOrder,
}

/// Label/value pairs serialized as a map in caption order
#[derive(Debug)]
struct CaptionOrder(Vec<(String, Reading)>);

impl Serialize for CaptionOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(label, value)| (label, value)))
    }
}

/// Caption of the selected filters, `Input LowP1_16 ... __PRESET__`
pub fn caption(bank: &FilterBank, preset: Option<Preset>) -> String {
    let mut labels: Vec<String> = bank.selected().map(|(id, _)| id.to_string()).collect();
    if let Some(preset) = preset {
        labels.push(format!("__{}__", preset.label()));
    }
    labels.join(" ")
}

/// Space-separated values of the selected filters
pub fn plotter_row(bank: &FilterBank) -> String {
    bank.selected()
        .map(|(_, value)| value.map_or_else(|| "0".to_string(), |v| v.to_string()))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn json_row(bank: &FilterBank, n: usize, preset: Option<Preset>) -> serde_json::Result<String> {
    let values = bank
        .selected()
        .filter_map(|(id, value)| value.map(|v| (id.to_string(), v)))
        .collect();
    serde_json::to_string(&JsonRow {
        n,
        preset: preset.map(Preset::label),
        values: CaptionOrder(values),
    })
}

/// Streams rows for one run
pub struct Reporter<W: Write> {
    out: W,
    format: Format,
    preset: Option<Preset>,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: Format, preset: Option<Preset>) -> Self {
        Self { out, format, preset }
    }

    /// Caption line; JSON output has none
    pub fn write_caption(&mut self, bank: &FilterBank) -> io::Result<()> {
        match self.format {
            Format::Plotter => writeln!(self.out, "{}", caption(bank, self.preset)),
            Format::Json => Ok(()),
        }
    }

    pub fn write_row(&mut self, bank: &FilterBank, n: usize) -> io::Result<()> {
        match self.format {
            Format::Plotter => writeln!(self.out, "{}", plotter_row(bank)),
            Format::Json => {
                let line = json_row(bank, n, self.preset)?;
                writeln!(self.out, "{}", line)
            }
        }
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

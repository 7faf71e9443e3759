//! emafilters CLI
//!
//! Replays generated or recorded 16-bit sample streams through an EMA filter
//! bank and prints the selected outputs.

mod report;
mod signal;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use emafilters_core::{BankConfig, FilterBank, FilterId, Preset, SelectionMask};
use report::{Format, Reporter};
use signal::{Generator, SignalError, SignalKind};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "emafilters")]
#[command(about = "Integer, fixed-point and float EMA filter bank", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Feed a signal through the bank and print the selected outputs
    Run(RunArgs),
    /// List the configured low-pass families and their nominal corners
    Corners {
        /// Configuration file (defaults to the user config location)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write the factory default configuration
    InitConfig {
        /// Target path (defaults to the user config location)
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    #[arg(long, value_enum, default_value_t = SignalKind::Step)]
    signal: SignalKind,

    /// Sample file for `--signal file`, `-` reads stdin
    #[arg(long)]
    input: Option<PathBuf>,

    /// Number of generated samples
    #[arg(long, default_value_t = 200)]
    samples: usize,

    #[arg(long, default_value_t = 1000, allow_hyphen_values = true)]
    amplitude: i16,

    /// Step delay, square and sine period in samples
    #[arg(long, default_value_t = 50)]
    period: usize,

    /// Named selection, e.g. LOW_PASS_16_32
    #[arg(long)]
    preset: Option<Preset>,

    #[arg(long, value_enum, default_value_t = Format::Plotter)]
    format: Format,

    /// Measure step duration and report it on stderr
    #[arg(long)]
    timing: bool,

    /// Configuration file (defaults to the user config location)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the plotter caption line
    #[arg(long)]
    no_caption: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Corners { config } => corners(config.as_deref()).await,
        Command::InitConfig { path, force } => init_config(path, force).await,
    }
}

/// `~/.config/emafilters/config.toml` on Linux, the platform equivalent elsewhere
fn default_config_path() -> anyhow::Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("emafilters").join("config.toml"))
        .context("could not determine config directory")
}

/// Explicit paths must exist; the default location falls back to factory settings.
async fn load_config(path: Option<&Path>) -> anyhow::Result<BankConfig> {
    match path {
        Some(path) => BankConfig::load_from_file(path)
            .await
            .with_context(|| format!("loading {}", path.display())),
        None => match default_config_path() {
            Ok(path) => Ok(BankConfig::load_or_default(&path).await?),
            Err(e) => {
                debug!(error = %e, "Using factory default configuration");
                Ok(BankConfig::factory_default())
            }
        },
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref()).await?;
    config.measure_timing |= args.timing;

    let samples = match args.signal {
        SignalKind::File => {
            let path = args.input.as_deref().ok_or(SignalError::MissingInput)?;
            signal::read_samples(path).await?
        }
        kind => Generator {
            kind,
            samples: args.samples,
            amplitude: args.amplitude,
            period: args.period,
        }
        .generate()?,
    };

    let mut bank = FilterBank::new(config)?;
    let mask = args
        .preset
        .map_or(SelectionMask::ALL, |preset| bank.mask_for_preset(preset));
    bank.select_outputs(mask);
    info!(
        samples = samples.len(),
        selected = mask.count(bank.filters().len()),
        "Running filter bank"
    );

    let stdout = io::stdout();
    let mut reporter = Reporter::new(BufWriter::new(stdout.lock()), args.format, args.preset);
    if !args.no_caption {
        reporter.write_caption(&bank)?;
    }
    for (n, &sample) in samples.iter().enumerate() {
        bank.step(sample);
        reporter.write_row(&bank, n)?;
    }
    reporter.finish()?;

    if let Some(timing) = bank.timing() {
        eprintln!(
            "steps: {}  mean: {:?}  max: {:?}  total: {:?}",
            timing.steps,
            timing.mean(),
            timing.max,
            timing.total
        );
    }
    Ok(())
}

async fn corners(path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(path).await?;
    let sample_rate = config.sample_rate_hz;
    let bank = FilterBank::new(config)?;

    println!("{:<18} {:>6} {:>12}", "family", "stages", "corner");
    for (repr, exponent, depth) in bank.lowpass_families() {
        let label = FilterId::lowpass(repr, exponent).to_string();
        println!(
            "{:<18} {:>6} {:>9.3} Hz",
            label,
            depth.stages(),
            exponent.corner_hz(sample_rate)
        );
    }
    Ok(())
}

async fn init_config(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path,
        None => default_config_path()?,
    };
    if !force && tokio::fs::try_exists(&path).await? {
        bail!("{} already exists, use --force to overwrite", path.display());
    }

    BankConfig::factory_default().save_to_file(&path).await?;
    println!("{}", path.display());
    Ok(())
}

//! Example feeding a step through the standard filter bank
//!
//! Run with: cargo run --package emafilters-core --example bank_demo

use emafilters_core::{BankConfig, FilterBank, FilterId, Preset};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("emafilters_core=debug,info")
        .init();

    println!("=== EMA Filter Bank Demo ===\n");

    // 1. Factory default configuration
    let config = BankConfig::factory_default();
    println!("1. Factory default enables {} filters", config.filters.len());

    // 2. Round-trip through a TOML file
    let config_path = std::env::temp_dir().join("emafilters_demo.toml");
    config.save_to_file(&config_path).await?;
    let loaded = BankConfig::load_from_file(&config_path).await?;
    println!("2. Saved and reloaded {}", config_path.display());

    // 3. Corner frequencies
    println!("\n3. Low-pass corners at {} Hz:", loaded.sample_rate_hz);
    let mut bank = FilterBank::new(loaded)?;
    for (repr, exponent, depth) in bank.lowpass_families() {
        println!(
            "   {:<12} {} stage(s)  {:>8.3} Hz",
            FilterId::lowpass(repr, exponent).to_string(),
            depth.stages(),
            exponent.corner_hz(bank.config().sample_rate_hz)
        );
    }

    // 4. Step response of one preset
    let preset = Preset::LowPass1632;
    bank.select_outputs(bank.mask_for_preset(preset));
    println!("\n4. Step response, preset {}:", preset);

    let caption: Vec<String> = bank.selected().map(|(id, _)| id.to_string()).collect();
    println!("   {}", caption.join(" "));
    for n in 0..60 {
        bank.step(if n < 10 { 0 } else { 1000 });
        if n % 5 == 4 {
            let row: Vec<String> = bank
                .selected()
                .map(|(_, value)| value.map(|v| v.to_string()).unwrap_or_default())
                .collect();
            println!("   {}", row.join(" "));
        }
    }

    tokio::fs::remove_file(&config_path).await?;
    println!("\n=== Demo Complete ===");
    Ok(())
}

//! Init-model command implementation
//!
//! Writes a deterministically initialized, untrained WaveRNN artifact that
//! matches a config. Useful for smoke-testing the generation pipeline.

use anyhow::{Context, Result};
use autoreg_backend_audio::WaveRnn;
use autoreg_spec::{validate_for_generate, Config};
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;
use tracing::info;

/// Run the init-model command
///
/// # Arguments
/// * `config_path` - Path to the config file (JSON)
/// * `output` - Model artifact to write
/// * `seed` - Weight initialization seed
///
/// # Returns
/// Exit code: 0 on success
pub fn run(config_path: &str, output: &str, seed: u32) -> Result<ExitCode> {
    let config = Config::from_path(Path::new(config_path))
        .with_context(|| format!("Failed to load config: {}", config_path))?;

    let (mode, warnings) = validate_for_generate(&config)?;
    for warning in &warnings {
        println!("  {} {}", "warning:".yellow(), warning);
    }

    let model = WaveRnn::random(config.model, seed)?;
    model
        .save(Path::new(output))
        .with_context(|| format!("Failed to write model: {}", output))?;

    info!(output, seed, mode = ?mode, "initialized model");
    println!(
        "{} {} ({:?}, seed {})",
        "Initialized:".green().bold(),
        output,
        mode,
        seed
    );
    Ok(ExitCode::SUCCESS)
}

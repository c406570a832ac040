//! Generate command implementation
//!
//! Loads a config and a model artifact, generates one or more utterances,
//! and writes them as 16-bit WAV files.

use anyhow::{Context, Result};
use autoreg_backend_audio::{GenerateRequest, Generator, WaveRnn};
use autoreg_spec::{Config, Device, SamplingPolicy};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, info};

/// Arguments of the generate command.
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    /// Config file (JSON).
    pub config_path: String,
    /// Model artifact (JSON).
    pub model_path: String,
    /// Output WAV path.
    pub output: String,
    /// Seconds per utterance.
    pub time_length: f64,
    /// Sampling policy name.
    pub policy: String,
    /// Number of utterances.
    pub num_generate: usize,
    /// Base seed for random sampling.
    pub seed: u32,
    /// Device string.
    pub device: String,
    /// Optional local conditioning frames (JSON).
    pub local_path: Option<String>,
}

/// Run the generate command
///
/// # Returns
/// Exit code: 0 on success
pub fn run(args: &GenerateArgs) -> Result<ExitCode> {
    let start = Instant::now();

    let policy: SamplingPolicy = args.policy.parse()?;
    let device: Device = args.device.parse()?;

    println!("{} {}", "Config:".cyan().bold(), args.config_path);
    let config = Config::from_path(Path::new(&args.config_path))
        .with_context(|| format!("Failed to load config: {}", args.config_path))?;

    println!("{} {}", "Model:".cyan().bold(), args.model_path);
    let model = WaveRnn::load(Path::new(&args.model_path), device)
        .with_context(|| format!("Failed to load model: {}", args.model_path))?;

    let mut request = GenerateRequest::new(args.time_length, policy)
        .with_num_generate(args.num_generate);
    if let Some(local_path) = &args.local_path {
        let frames = load_local(Path::new(local_path))?;
        request = request.with_local_arrays(vec![frames; args.num_generate]);
    }

    let generator = Generator::new(config, model)?.with_seed(args.seed);
    println!(
        "{} {} x {:.3}s ({} policy, seed {})",
        "Generating:".cyan().bold(),
        args.num_generate,
        args.time_length,
        policy,
        args.seed
    );

    let waves = generator.generate_batch(&request)?;
    let outputs = output_paths(Path::new(&args.output), waves.len());

    for (wave, path) in waves.iter().zip(&outputs) {
        wave.save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), samples = wave.len(), "wrote wave");
        println!(
            "  {} {} ({} samples, pcm {})",
            "wrote".green(),
            path.display(),
            wave.len(),
            &wave.pcm_hash()[..16]
        );
    }

    info!(
        files = outputs.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "generate finished"
    );
    println!(
        "{} {} file(s) in {:.2}s",
        "Done:".green().bold(),
        outputs.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(ExitCode::SUCCESS)
}

/// Reads local conditioning frames from a JSON array of arrays.
fn load_local(path: &Path) -> Result<Vec<Vec<f32>>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read local conditioning: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse local conditioning: {}", path.display()))
}

/// Output file for each utterance.
///
/// A single utterance goes to `output` itself; batches write
/// `<stem>_<index>.<ext>` next to it.
pub fn output_paths(output: &Path, count: usize) -> Vec<PathBuf> {
    if count == 1 {
        return vec![output.to_path_buf()];
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "wav".to_string());
    (0..count)
        .map(|i| output.with_file_name(format!("{}_{}.{}", stem, i, ext)))
        .collect()
}

//! Extract-silence command implementation
//!
//! Computes a silence mask for every WAV file matching a glob and writes one
//! `<stem>.json` per input, plus the invocation arguments, to a directory.

use anyhow::{bail, Context, Result};
use autoreg_backend_audio::pool::default_threads;
use autoreg_backend_audio::{extract_silence, write_masks, SplitConfig};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, info};

/// Arguments recorded next to the masks.
#[derive(Debug, Serialize)]
struct SilenceArguments<'a> {
    input_glob: &'a str,
    output_directory: &'a str,
    sampling_rate: u32,
    silence_top_db: f64,
}

/// Run the extract-silence command
///
/// # Arguments
/// * `input_glob` - Glob selecting the input WAV files
/// * `output_directory` - Directory receiving the masks
/// * `sampling_rate` - Rate every input is resampled to
/// * `silence_top_db` - Silence threshold below the loudest frame
/// * `threads` - Decoding workers (default: available parallelism)
///
/// # Returns
/// Exit code: 0 on success
pub fn run(
    input_glob: &str,
    output_directory: &str,
    sampling_rate: u32,
    silence_top_db: f64,
    threads: Option<usize>,
) -> Result<ExitCode> {
    let start = Instant::now();
    let out_dir = Path::new(output_directory);

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_directory))?;

    let arguments = SilenceArguments {
        input_glob,
        output_directory,
        sampling_rate,
        silence_top_db,
    };
    let arguments_path = out_dir.join("arguments.json");
    fs::write(&arguments_path, serde_json::to_string_pretty(&arguments)?)
        .with_context(|| format!("Failed to write {}", arguments_path.display()))?;

    let paths = expand_glob(input_glob)?;
    debug!(pattern = input_glob, matches = paths.len(), "expanded input glob");
    if paths.is_empty() {
        bail!("No files match: {}", input_glob);
    }
    println!(
        "{} {} file(s) at {} Hz (top_db {})",
        "Input:".cyan().bold(),
        paths.len(),
        sampling_rate,
        silence_top_db
    );

    let config = SplitConfig::with_top_db(silence_top_db);
    let masks = extract_silence(
        &paths,
        sampling_rate,
        &config,
        threads.unwrap_or_else(default_threads),
    )?;
    let written = write_masks(out_dir, &masks)?;

    let samples: usize = masks.iter().map(|m| m.mask.array.len()).sum();
    let silent: usize = masks.iter().map(|m| m.mask.silent_count()).sum();
    let ratio = if samples == 0 {
        0.0
    } else {
        silent as f64 / samples as f64
    };
    info!(
        masks = written.len(),
        samples,
        silent,
        output_directory,
        "extract-silence finished"
    );
    println!(
        "{} {} mask(s) in {} ({:.1}% silent, {:.2}s)",
        "Done:".green().bold(),
        written.len(),
        out_dir.display(),
        ratio * 100.0,
        start.elapsed().as_secs_f64()
    );
    Ok(ExitCode::SUCCESS)
}

/// Sorted paths matching `pattern`.
fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths = glob::glob(pattern)
        .with_context(|| format!("Invalid glob pattern: {}", pattern))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to read glob match")?;
    paths.sort();
    Ok(paths)
}

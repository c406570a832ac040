//! Batch silence extraction over audio files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::split::{silence_mask, SplitConfig};
use crate::error::{AudioError, AudioResult};
use crate::pool::try_parallel_map;
use crate::wave::Wave;

/// Persisted silence flags of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SilenceMask {
    /// One flag per sample; `true` marks silence.
    pub array: Vec<bool>,
    /// Sampling rate the flags are aligned to.
    pub rate: u32,
}

impl SilenceMask {
    /// Number of silent samples.
    pub fn silent_count(&self) -> usize {
        self.array.iter().filter(|&&s| s).count()
    }

    /// Reads a mask written by [`write_masks`].
    pub fn load(path: &Path) -> AudioResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Mask computed for one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMask {
    /// Input file.
    pub path: PathBuf,
    /// Its mask.
    pub mask: SilenceMask,
}

/// Splits the concatenation of `waves` and slices the mask back per wave.
///
/// Thresholds are relative to the loudest frame of the whole collection, so
/// a quiet file among loud ones is judged against the loud ones.
pub fn concatenated_masks(waves: &[Vec<f64>], config: &SplitConfig) -> Vec<Vec<bool>> {
    let joined: Vec<f64> = waves.iter().flatten().copied().collect();
    let mask = silence_mask(&joined, config);

    let mut offset = 0;
    waves
        .iter()
        .map(|wave| {
            let slice = mask[offset..offset + wave.len()].to_vec();
            offset += wave.len();
            slice
        })
        .collect()
}

/// Loads every file at `sampling_rate` and computes its silence mask.
///
/// Files are decoded on up to `threads` workers; results keep input order.
/// The first file that fails to load aborts the batch and the error names
/// that file.
pub fn extract_silence(
    paths: &[PathBuf],
    sampling_rate: u32,
    config: &SplitConfig,
    threads: usize,
) -> AudioResult<Vec<FileMask>> {
    if sampling_rate == 0 {
        return Err(AudioError::invalid_input("sampling_rate", "must be positive"));
    }
    config.validate()?;

    let waves = try_parallel_map(paths, threads, |_, path| {
        Wave::load(path, sampling_rate)
            .map(|wave| wave.samples)
            .map_err(|e| e.in_file(path))
    })?;

    let total: usize = waves.iter().map(Vec::len).sum();
    let masks = concatenated_masks(&waves, config);
    let silent: usize = masks.iter().flatten().filter(|&&s| s).count();
    info!(
        files = paths.len(),
        samples = total,
        silent,
        top_db = config.top_db,
        "extracted silence"
    );

    Ok(paths
        .iter()
        .zip(masks)
        .map(|(path, array)| FileMask {
            path: path.clone(),
            mask: SilenceMask {
                array,
                rate: sampling_rate,
            },
        })
        .collect())
}

/// `<out_dir>/<input stem>.json`.
pub fn mask_output_path(out_dir: &Path, input: &Path) -> AudioResult<PathBuf> {
    let stem = input.file_stem().ok_or_else(|| {
        AudioError::invalid_input("input", format!("'{}' has no file name", input.display()))
    })?;
    let mut name = stem.to_os_string();
    name.push(".json");
    Ok(out_dir.join(name))
}

/// Writes one JSON mask file per input into `out_dir`.
///
/// Output paths are checked before anything is written; two inputs with the
/// same stem are rejected.
pub fn write_masks(out_dir: &Path, masks: &[FileMask]) -> AudioResult<Vec<PathBuf>> {
    let outputs = masks
        .iter()
        .map(|m| mask_output_path(out_dir, &m.path))
        .collect::<AudioResult<Vec<_>>>()?;

    for (i, output) in outputs.iter().enumerate() {
        if outputs[..i].contains(output) {
            return Err(AudioError::invalid_input(
                "input",
                format!(
                    "'{}' would overwrite the mask of another input",
                    masks[i].path.display()
                ),
            ));
        }
    }

    for (mask, output) in masks.iter().zip(&outputs) {
        let json = serde_json::to_string(&mask.mask)?;
        std::fs::write(output, json).map_err(|e| AudioError::from(e).in_file(output))?;
        debug!(path = %output.display(), samples = mask.mask.array.len(), "wrote mask");
    }
    Ok(outputs)
}

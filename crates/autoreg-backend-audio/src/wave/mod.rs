//! Waveform value type and WAV file I/O.
//!
//! Generated audio is written as deterministic mono 16-bit PCM; the BLAKE3
//! hash of the PCM payload identifies a waveform independently of the file
//! header. Reading accepts any integer or float PCM file, downmixes it, and
//! resamples to the requested rate.

mod format;
mod reader;
mod writer;

#[cfg(test)]
mod tests;

use std::path::Path;

use tracing::debug;

use crate::error::AudioResult;

pub use format::WavFormat;
pub use reader::{downmix, read_mono, resample, resampled_len, DecodedWav};
pub use writer::{samples_to_pcm16, write_wav, write_wav_to_vec};

/// A mono waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct Wave {
    /// Samples in `[-1, 1]`.
    pub samples: Vec<f64>,
    /// Sampling rate in Hz.
    pub sampling_rate: u32,
}

impl Wave {
    /// Creates a waveform.
    pub fn new(samples: Vec<f64>, sampling_rate: u32) -> Self {
        Self {
            samples,
            sampling_rate,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the waveform has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sampling_rate as f64
    }

    /// Loads a WAV file as mono at `sampling_rate`.
    pub fn load(path: &Path, sampling_rate: u32) -> AudioResult<Self> {
        let decoded = read_mono(path)?;
        let samples = resample(&decoded.samples, decoded.sample_rate, sampling_rate)?;
        debug!(
            path = %path.display(),
            native_rate = decoded.sample_rate,
            sampling_rate,
            samples = samples.len(),
            "loaded wave"
        );
        Ok(Self::new(samples, sampling_rate))
    }

    /// Encodes the waveform as a 16-bit PCM WAV file.
    pub fn to_wav_bytes(&self) -> Vec<u8> {
        write_wav_to_vec(
            &WavFormat::mono(self.sampling_rate),
            &samples_to_pcm16(&self.samples),
        )
    }

    /// Writes the waveform to `path`.
    pub fn save(&self, path: &Path) -> AudioResult<()> {
        std::fs::write(path, self.to_wav_bytes())?;
        Ok(())
    }

    /// BLAKE3 hash of the 16-bit PCM payload.
    pub fn pcm_hash(&self) -> String {
        blake3::hash(&samples_to_pcm16(&self.samples))
            .to_hex()
            .to_string()
    }
}

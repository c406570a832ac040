//! Frame-energy silence splitting.

use serde::{Deserialize, Serialize};

use crate::error::{AudioError, AudioResult};

/// Power floor applied before taking logarithms.
const AMIN: f64 = 1e-10;

/// Framing and threshold parameters for [`split_nonsilent`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitConfig {
    /// Frames quieter than the loudest frame by more than this many dB are silent.
    pub top_db: f64,
    /// Analysis window in samples.
    pub frame_length: usize,
    /// Distance between frame starts in samples.
    pub hop_length: usize,
    /// Pad `frame_length / 2` zeros on both sides so frame `i` is centered
    /// on sample `i * hop_length`.
    pub center: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            top_db: 60.0,
            frame_length: 2048,
            hop_length: 512,
            center: true,
        }
    }
}

impl SplitConfig {
    /// Default framing with a custom threshold.
    pub fn with_top_db(top_db: f64) -> Self {
        Self {
            top_db,
            ..Self::default()
        }
    }

    /// Rejects parameters that cannot frame a signal.
    pub fn validate(&self) -> AudioResult<()> {
        if !self.top_db.is_finite() || self.top_db <= 0.0 {
            return Err(AudioError::invalid_input(
                "top_db",
                format!("must be a positive number, got {}", self.top_db),
            ));
        }
        if self.frame_length == 0 {
            return Err(AudioError::invalid_input("frame_length", "must be positive"));
        }
        if self.hop_length == 0 {
            return Err(AudioError::invalid_input("hop_length", "must be positive"));
        }
        Ok(())
    }
}

/// Mean-square power of every frame in dB relative to the loudest frame.
///
/// The loudest frame is 0 dB. A signal too short to hold one frame yields
/// no frames.
pub fn frame_power_db(samples: &[f64], config: &SplitConfig) -> Vec<f64> {
    let frame = config.frame_length;
    let pad = if config.center { frame / 2 } else { 0 };
    let padded_len = samples.len() + 2 * pad;
    if samples.is_empty() || padded_len < frame {
        return Vec::new();
    }

    let at = |i: usize| -> f64 {
        if i < pad || i >= pad + samples.len() {
            0.0
        } else {
            samples[i - pad]
        }
    };

    let n_frames = 1 + (padded_len - frame) / config.hop_length;
    let power: Vec<f64> = (0..n_frames)
        .map(|f| {
            let start = f * config.hop_length;
            (start..start + frame).map(|i| at(i).powi(2)).sum::<f64>() / frame as f64
        })
        .collect();

    let reference = power.iter().copied().fold(0.0, f64::max);
    let reference_db = 10.0 * reference.max(AMIN).log10();
    power
        .into_iter()
        .map(|p| 10.0 * p.max(AMIN).log10() - reference_db)
        .collect()
}

/// Sample intervals `[start, end)` louder than `-top_db` relative to the peak.
///
/// Runs of non-silent frames map to `[first * hop, last_exclusive * hop)`,
/// clipped to the signal length. An all-zero signal has every frame at the
/// reference level and is therefore entirely non-silent.
pub fn split_nonsilent(samples: &[f64], config: &SplitConfig) -> Vec<(usize, usize)> {
    let db = frame_power_db(samples, config);
    let to_sample = |frame: usize| (frame * config.hop_length).min(samples.len());

    let mut intervals = Vec::new();
    let mut start = None;
    for (frame, &level) in db.iter().enumerate() {
        let loud = level > -config.top_db;
        match (loud, start) {
            (true, None) => start = Some(frame),
            (false, Some(s)) => {
                intervals.push((to_sample(s), to_sample(frame)));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        intervals.push((to_sample(s), to_sample(db.len())));
    }
    intervals.retain(|(s, e)| s < e);
    intervals
}

/// Per-sample silence flags: `true` outside every non-silent interval.
pub fn silence_mask(samples: &[f64], config: &SplitConfig) -> Vec<bool> {
    let mut mask = vec![true; samples.len()];
    for (start, end) in split_nonsilent(samples, config) {
        mask[start..end].iter_mut().for_each(|m| *m = false);
    }
    mask
}

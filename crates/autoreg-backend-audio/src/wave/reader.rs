//! WAV decoding and resampling.

use std::path::Path;

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::{AudioError, AudioResult};

/// Decoded file contents before resampling.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedWav {
    /// Mono samples in `[-1, 1]`.
    pub samples: Vec<f64>,
    /// Native sample rate.
    pub sample_rate: u32,
}

/// Reads a PCM integer or float WAV and downmixes it to mono.
pub fn read_mono(path: &Path) -> AudioResult<DecodedWav> {
    let wav_err = |source: hound::Error| AudioError::WavRead {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = hound::WavReader::open(path).map_err(wav_err)?;
    let spec = reader.spec();

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<Result<_, _>>()
                .map_err(wav_err)?
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()
            .map_err(wav_err)?,
    };

    Ok(DecodedWav {
        samples: downmix(&interleaved, spec.channels),
        sample_rate: spec.sample_rate,
    })
}

/// Averages interleaved channels into one.
pub fn downmix(interleaved: &[f64], channels: u16) -> Vec<f64> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    let channels = channels as usize;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f64>() / channels as f64)
        .collect()
}

/// Number of samples a signal of `len` samples has after resampling.
pub fn resampled_len(len: usize, from_rate: u32, to_rate: u32) -> usize {
    (len as f64 * to_rate as f64 / from_rate as f64).round() as usize
}

/// Band-limited sinc resampling of a mono signal.
///
/// The output is aligned with the input (the filter delay is removed) and
/// has exactly [`resampled_len`] samples.
pub fn resample(samples: &[f64], from_rate: u32, to_rate: u32) -> AudioResult<Vec<f64>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    let ratio = to_rate as f64 / from_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f64>::new(ratio, 2.0, params, samples.len(), 1)
        .map_err(resample_error)?;

    let delay = resampler.output_delay();
    let target = resampled_len(samples.len(), from_rate, to_rate);
    let mut output = resampler
        .process(&[samples], None)
        .map_err(resample_error)?
        .remove(0);

    // Flush with silence until the delayed tail of the signal is out.
    while output.len() < delay + target {
        let tail = resampler
            .process_partial::<&[f64]>(None, None)
            .map_err(resample_error)?
            .remove(0);
        if tail.is_empty() {
            break;
        }
        output.extend(tail);
    }

    let mut aligned: Vec<f64> = output.into_iter().skip(delay).take(target).collect();
    aligned.resize(target, 0.0);
    Ok(aligned)
}

fn resample_error(e: impl std::fmt::Display) -> AudioError {
    AudioError::Resample {
        message: e.to_string(),
    }
}

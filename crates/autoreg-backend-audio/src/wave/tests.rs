//! Tests for the wave module.

use std::f64::consts::PI;

use pretty_assertions::assert_eq;

use super::*;
use crate::error::AudioError;

fn sine(len: usize, freq: f64, rate: u32) -> Vec<f64> {
    (0..len)
        .map(|i| 0.5 * (2.0 * PI * freq * i as f64 / rate as f64).sin())
        .collect()
}

#[test]
fn test_header_layout() {
    let wave = Wave::new(vec![0.0, 0.5, -0.5, 1.0], 8000);
    let bytes = wave.to_wav_bytes();

    assert_eq!(bytes.len(), 44 + 8);
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WAVE");
    assert_eq!(u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]), 8000);
    // 8000 Hz * 1 channel * 2 bytes
    assert_eq!(u32::from_le_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]), 16000);
    assert_eq!(&bytes[36..40], b"data");
}

#[test]
fn test_pcm16_clipping() {
    let pcm = samples_to_pcm16(&[2.0, -2.0, 0.0]);
    assert_eq!(i16::from_le_bytes([pcm[0], pcm[1]]), 32767);
    assert_eq!(i16::from_le_bytes([pcm[2], pcm[3]]), -32767);
    assert_eq!(i16::from_le_bytes([pcm[4], pcm[5]]), 0);
}

#[test]
fn test_pcm_hash_is_deterministic() {
    let a = Wave::new(sine(400, 440.0, 8000), 8000);
    let b = Wave::new(sine(400, 440.0, 8000), 16000);
    let c = Wave::new(sine(400, 220.0, 8000), 8000);
    assert_eq!(a.pcm_hash(), b.pcm_hash());
    assert_ne!(a.pcm_hash(), c.pcm_hash());
    assert_eq!(a.pcm_hash().len(), 64);
}

#[test]
fn test_save_then_load_same_rate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    let wave = Wave::new(sine(800, 300.0, 8000), 8000);
    wave.save(&path).unwrap();

    let loaded = Wave::load(&path, 8000).unwrap();
    assert_eq!(loaded.len(), 800);
    assert_eq!(loaded.sampling_rate, 8000);
    for (a, b) in wave.samples.iter().zip(&loaded.samples) {
        assert!((a - b).abs() < 1e-4);
    }
}

#[test]
fn test_load_downmixes_and_resamples() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.wav");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 16000,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for x in sine(1600, 200.0, 16000) {
        writer.write_sample(x as f32).unwrap();
        writer.write_sample(0.0f32).unwrap();
    }
    writer.finalize().unwrap();

    let loaded = Wave::load(&path, 8000).unwrap();
    assert_eq!(loaded.len(), 800);
    let expected = sine(800, 200.0, 8000);
    // Skip the edges where the filter sees zero padding.
    for i in 100..700 {
        assert!(
            (loaded.samples[i] - expected[i] / 2.0).abs() < 0.05,
            "sample {} diverged",
            i
        );
    }
}

#[test]
fn test_downmix_averages_frames() {
    assert_eq!(downmix(&[1.0, 0.0, 0.5, 0.5], 2), vec![0.5, 0.5]);
    assert_eq!(downmix(&[0.1, 0.2], 1), vec![0.1, 0.2]);
}

#[test]
fn test_resampled_len() {
    assert_eq!(resampled_len(16000, 16000, 8000), 8000);
    assert_eq!(resampled_len(3, 16000, 8000), 2);
    assert_eq!(resampled_len(100, 8000, 8000), 100);
}

#[test]
fn test_resample_keeps_signal_tail() {
    for (len, from, to) in [(1000, 16000, 8000), (22050, 22050, 24000), (4000, 8000, 16000)] {
        let out = resample(&vec![0.5; len], from, to).unwrap();
        assert_eq!(out.len(), resampled_len(len, from, to));

        let edge = 150;
        for (i, &x) in out[edge..out.len() - edge].iter().enumerate() {
            assert!((x - 0.5).abs() < 0.02, "{}->{}: sample {} is {}", from, to, i + edge, x);
        }
        // Only the half-kernel ramp at the very end, never zero fill.
        for &x in &out[out.len() - 10..] {
            assert!(x > 0.1, "{}->{}: tail sample {}", from, to, x);
        }
    }
}

#[test]
fn test_resample_short_signal() {
    let out = resample(&[0.5; 100], 16000, 8000).unwrap();
    assert_eq!(out.len(), 50);
    let peak = out.iter().cloned().fold(0.0, f64::max);
    assert!(peak > 0.3, "peak {}", peak);
}

#[test]
fn test_missing_file_is_wav_error() {
    let err = Wave::load(Path::new("/nonexistent/input.wav"), 8000).unwrap_err();
    assert!(matches!(err, AudioError::WavRead { .. }));
    assert!(err.to_string().contains("input.wav"));
}

//! Silence extraction over WAV files on disk.

use std::path::{Path, PathBuf};

use autoreg_backend_audio::silence::{extract_silence, write_masks, SilenceMask, SplitConfig};
use autoreg_backend_audio::Wave;
use pretty_assertions::assert_eq;

const RATE: u32 = 8000;

fn save(dir: &Path, name: &str, samples: Vec<f64>) -> PathBuf {
    let path = dir.join(name);
    Wave::new(samples, RATE).save(&path).unwrap();
    path
}

/// `len` samples, non-silent exactly on `[start, end)`.
fn burst(len: usize, start: usize, end: usize) -> Vec<f64> {
    (0..len)
        .map(|i| if (start..end).contains(&i) { 0.5 } else { 0.0 })
        .collect()
}

#[test]
fn test_masks_match_known_intervals() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        save(dir.path(), "first.wav", burst(64, 16, 32)),
        save(dir.path(), "second.wav", burst(48, 0, 8)),
        save(dir.path(), "third.wav", burst(40, 40, 40)),
    ];
    let config = SplitConfig {
        top_db: 60.0,
        frame_length: 8,
        hop_length: 8,
        center: false,
    };

    let masks = extract_silence(&paths, RATE, &config, 3).unwrap();

    let total: usize = masks.iter().map(|m| m.mask.array.len()).sum();
    assert_eq!(total, 64 + 48 + 40);

    let expected = [
        burst(64, 16, 32),
        burst(48, 0, 8),
        burst(40, 40, 40),
    ];
    for (mask, signal) in masks.iter().zip(&expected) {
        let silent: Vec<bool> = signal.iter().map(|&x| x == 0.0).collect();
        assert_eq!(mask.mask.array, silent, "{}", mask.path.display());
    }
}

#[test]
fn test_masks_written_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let paths = vec![
        save(dir.path(), "utt_a.wav", burst(4000, 1000, 2000)),
        save(dir.path(), "utt_b.wav", burst(2000, 0, 0)),
    ];

    let masks = extract_silence(&paths, RATE, &SplitConfig::with_top_db(40.0), 2).unwrap();
    let written = write_masks(out.path(), &masks).unwrap();

    assert_eq!(
        written,
        vec![out.path().join("utt_a.json"), out.path().join("utt_b.json")]
    );
    let a = SilenceMask::load(&written[0]).unwrap();
    let b = SilenceMask::load(&written[1]).unwrap();
    assert_eq!(a.rate, RATE);
    assert_eq!(a.array.len() + b.array.len(), 6000);
    assert_eq!(b.silent_count(), 2000);
    assert!(a.array[1000..2000].iter().all(|&s| !s));
}

#[test]
fn test_resampled_input_masks_target_rate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hi_rate.wav");
    Wave::new(burst(16000, 4000, 12000), 16000).save(&path).unwrap();

    let masks = extract_silence(&[path], RATE, &SplitConfig::default(), 1).unwrap();
    assert_eq!(masks[0].mask.array.len(), 8000);
    assert_eq!(masks[0].mask.rate, RATE);
}

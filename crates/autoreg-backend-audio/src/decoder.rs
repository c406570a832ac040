//! Distribution decoding.
//!
//! Turns the parameters emitted by one forward step into a single code or
//! continuous value according to the resolved [`DecodeMode`] and the
//! [`SamplingPolicy`]. `Maximum` is a pure function of the parameters; only
//! `Random` draws from the RNG.

use autoreg_spec::{DecodeMode, SamplingPolicy};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand_distr::Normal;

use crate::codec::{decode_single, encode_single};
use crate::model::{DistributionParams, ModelError, ModelResult, StepInput};

/// Output of one decode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    /// Integer code from a categorical head (or a recombined dual code).
    Code(u32),
    /// Continuous value in `[-1, 1]` from a Gaussian head.
    Value(f64),
}

impl Decoded {
    /// Re-encodes the decoded sample as the next step's input.
    ///
    /// Categorical inputs receive class indices; scalar inputs receive the
    /// dequantized value. Values stay in the companded domain the model was
    /// trained on.
    pub fn feedback(self, bit_size: u32, input_categorical: bool) -> StepInput {
        match (self, input_categorical) {
            (Decoded::Code(code), true) => StepInput::Class(code as usize),
            (Decoded::Value(x), true) => StepInput::Class(encode_single(x, bit_size) as usize),
            (Decoded::Code(code), false) => StepInput::Scalar(decode_single(code, bit_size) as f32),
            (Decoded::Value(x), false) => StepInput::Scalar(x.clamp(-1.0, 1.0) as f32),
        }
    }
}

/// Decodes distribution parameters under a fixed mode and policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributionDecoder {
    mode: DecodeMode,
    policy: SamplingPolicy,
}

impl DistributionDecoder {
    /// Creates a decoder.
    pub fn new(mode: DecodeMode, policy: SamplingPolicy) -> Self {
        Self { mode, policy }
    }

    /// Decode mode.
    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Sampling policy.
    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    /// Decodes one step.
    ///
    /// `fine` is called exactly once under dual softmax, with the chosen
    /// coarse class, and must return the fine-head logits. It is never
    /// called in the other modes.
    pub fn decode<R, F>(&self, params: &DistributionParams, fine: F, rng: &mut R) -> ModelResult<Decoded>
    where
        R: Rng + ?Sized,
        F: FnOnce(u32) -> ModelResult<Vec<f32>>,
    {
        match (self.mode, params) {
            (DecodeMode::Categorical { bit_size }, DistributionParams::Logits(logits)) => {
                let code = self.pick_class(logits, 1usize << bit_size, "logits", rng)?;
                Ok(Decoded::Code(code))
            }
            (
                DecodeMode::DualSoftmax {
                    coarse_bits,
                    fine_bits,
                },
                DistributionParams::Logits(coarse_logits),
            ) => {
                let coarse =
                    self.pick_class(coarse_logits, 1usize << coarse_bits, "coarse logits", rng)?;
                let fine_logits = fine(coarse)?;
                let fine = self.pick_class(&fine_logits, 1usize << fine_bits, "fine logits", rng)?;
                Ok(Decoded::Code(combine_dual(coarse, fine, fine_bits)))
            }
            (DecodeMode::Gaussian { .. }, DistributionParams::Gaussian { mean, log_scale }) => {
                if !mean.is_finite() || !log_scale.is_finite() {
                    return Err(ModelError::NonFinite {
                        what: "gaussian parameters".to_string(),
                    });
                }
                let value = match self.policy {
                    SamplingPolicy::Maximum => *mean as f64,
                    SamplingPolicy::Random => {
                        sample_gaussian(*mean as f64, *log_scale as f64, rng)?
                    }
                };
                Ok(Decoded::Value(value.clamp(-1.0, 1.0)))
            }
            (DecodeMode::Gaussian { .. }, DistributionParams::Logits(_)) => {
                Err(ModelError::UnexpectedOutput {
                    message: "gaussian mode received class logits".to_string(),
                })
            }
            (_, DistributionParams::Gaussian { .. }) => Err(ModelError::UnexpectedOutput {
                message: "categorical mode received gaussian parameters".to_string(),
            }),
        }
    }

    fn pick_class<R: Rng + ?Sized>(
        &self,
        logits: &[f32],
        classes: usize,
        what: &str,
        rng: &mut R,
    ) -> ModelResult<u32> {
        if logits.len() != classes {
            return Err(ModelError::shape(what, classes, logits.len()));
        }
        if logits.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite {
                what: what.to_string(),
            });
        }
        let index = match self.policy {
            SamplingPolicy::Maximum => argmax(logits),
            SamplingPolicy::Random => sample_categorical(logits, rng)?,
        };
        Ok(index as u32)
    }
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits
        .iter()
        .fold(f64::NEG_INFINITY, |acc, &v| acc.max(v as f64));
    let exps: Vec<f64> = logits.iter().map(|&v| (v as f64 - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Index of the largest value; the lowest index wins ties.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Draws a class with probability `softmax(logits)`.
pub fn sample_categorical<R: Rng + ?Sized>(logits: &[f32], rng: &mut R) -> ModelResult<usize> {
    let dist = WeightedIndex::new(softmax(logits))
        .map_err(|e| ModelError::forward(format!("invalid class distribution: {}", e)))?;
    Ok(dist.sample(rng))
}

/// Draws from `N(mean, exp(log_scale)^2)`.
pub fn sample_gaussian<R: Rng + ?Sized>(
    mean: f64,
    log_scale: f64,
    rng: &mut R,
) -> ModelResult<f64> {
    let normal = Normal::new(mean, log_scale.exp())
        .map_err(|e| ModelError::forward(format!("invalid gaussian parameters: {}", e)))?;
    Ok(normal.sample(rng))
}

/// Joins coarse (high) and fine (low) halves into one code.
pub fn combine_dual(coarse: u32, fine: u32, fine_bits: u32) -> u32 {
    (coarse << fine_bits) | fine
}

/// Splits a code into its coarse and fine halves.
pub fn split_dual(code: u32, fine_bits: u32) -> (u32, u32) {
    (code >> fine_bits, code & ((1u32 << fine_bits) - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::max_code;
    use crate::rng::create_rng;
    use pretty_assertions::assert_eq;

    fn no_fine(_: u32) -> ModelResult<Vec<f32>> {
        panic!("fine head must not be called")
    }

    #[test]
    fn test_argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), 1);
        assert_eq!(argmax(&[3.0, 3.0]), 0);
        assert_eq!(argmax(&[-1.0]), 0);
    }

    #[test]
    fn test_softmax_normalizes() {
        let probs = softmax(&[1000.0, 1000.0, 0.0]);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((probs[0] - 0.5).abs() < 1e-12);
        assert!(probs[2] < 1e-12);
    }

    #[test]
    fn test_categorical_maximum() {
        let decoder = DistributionDecoder::new(
            DecodeMode::Categorical { bit_size: 2 },
            SamplingPolicy::Maximum,
        );
        let mut rng = create_rng(0);
        let before = rng.clone();
        let decoded = decoder
            .decode(
                &DistributionParams::Logits(vec![0.0, 2.0, 5.0, 1.0]),
                no_fine,
                &mut rng,
            )
            .unwrap();
        assert_eq!(decoded, Decoded::Code(2));
        // Maximum leaves the stream untouched.
        assert_eq!(before.clone().gen::<u64>(), rng.gen::<u64>());
    }

    #[test]
    fn test_categorical_random_follows_distribution() {
        let decoder = DistributionDecoder::new(
            DecodeMode::Categorical { bit_size: 2 },
            SamplingPolicy::Random,
        );
        let mut rng = create_rng(11);
        let params = DistributionParams::Logits(vec![-50.0, 0.0, 0.0, -50.0]);
        let mut counts = [0usize; 4];
        for _ in 0..2000 {
            match decoder.decode(&params, no_fine, &mut rng).unwrap() {
                Decoded::Code(code) => counts[code as usize] += 1,
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(counts[0] + counts[3], 0);
        assert!(counts[1] > 800 && counts[2] > 800);
    }

    #[test]
    fn test_dual_softmax_combines_coarse_and_fine() {
        let decoder = DistributionDecoder::new(
            DecodeMode::DualSoftmax {
                coarse_bits: 2,
                fine_bits: 2,
            },
            SamplingPolicy::Maximum,
        );
        let mut rng = create_rng(0);
        let mut seen = None;
        let decoded = decoder
            .decode(
                &DistributionParams::Logits(vec![0.0, 0.0, 0.0, 9.0]),
                |coarse| {
                    seen = Some(coarse);
                    Ok(vec![0.0, 4.0, 0.0, 0.0])
                },
                &mut rng,
            )
            .unwrap();
        assert_eq!(seen, Some(3));
        assert_eq!(decoded, Decoded::Code(0b1101));
    }

    #[test]
    fn test_dual_recombination_covers_code_range() {
        for bit in [2u32, 4, 8, 10] {
            let half = bit / 2;
            for coarse in 0..(1u32 << half) {
                for fine in 0..(1u32 << half) {
                    let code = combine_dual(coarse, fine, half);
                    assert!(code <= max_code(bit));
                    assert_eq!(split_dual(code, half), (coarse, fine));
                }
            }
        }
    }

    #[test]
    fn test_gaussian_maximum_returns_clamped_mean() {
        let decoder =
            DistributionDecoder::new(DecodeMode::Gaussian { bit_size: 8 }, SamplingPolicy::Maximum);
        let mut rng = create_rng(0);
        let params = DistributionParams::Gaussian {
            mean: 1.5,
            log_scale: 0.0,
        };
        assert_eq!(
            decoder.decode(&params, no_fine, &mut rng).unwrap(),
            Decoded::Value(1.0)
        );
    }

    #[test]
    fn test_gaussian_random_stays_in_range() {
        let decoder =
            DistributionDecoder::new(DecodeMode::Gaussian { bit_size: 8 }, SamplingPolicy::Random);
        let mut rng = create_rng(5);
        let wide = DistributionParams::Gaussian {
            mean: 0.0,
            log_scale: 2.0,
        };
        for _ in 0..500 {
            match decoder.decode(&wide, no_fine, &mut rng).unwrap() {
                Decoded::Value(x) => assert!((-1.0..=1.0).contains(&x)),
                other => panic!("unexpected {:?}", other),
            }
        }

        let narrow = DistributionParams::Gaussian {
            mean: 0.25,
            log_scale: -20.0,
        };
        match decoder.decode(&narrow, no_fine, &mut rng).unwrap() {
            Decoded::Value(x) => assert!((x - 0.25).abs() < 1e-6),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sample_gaussian_moments() {
        let mut rng = create_rng(21);
        let draws: Vec<f64> = (0..20_000)
            .map(|_| sample_gaussian(0.1, (0.05f64).ln(), &mut rng).unwrap())
            .collect();
        let n = draws.len() as f64;
        let mean = draws.iter().sum::<f64>() / n;
        let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        assert!((mean - 0.1).abs() < 0.002, "mean {}", mean);
        assert!((var.sqrt() - 0.05).abs() < 0.002, "std {}", var.sqrt());

        // Same seed, same stream.
        let mut a = create_rng(3);
        let mut b = create_rng(3);
        assert_eq!(
            sample_gaussian(0.0, 0.0, &mut a).unwrap(),
            sample_gaussian(0.0, 0.0, &mut b).unwrap()
        );
    }

    #[test]
    fn test_wrong_width_and_non_finite_are_model_errors() {
        let decoder = DistributionDecoder::new(
            DecodeMode::Categorical { bit_size: 3 },
            SamplingPolicy::Random,
        );
        let mut rng = create_rng(0);
        let err = decoder
            .decode(&DistributionParams::Logits(vec![0.0; 4]), no_fine, &mut rng)
            .unwrap_err();
        assert!(matches!(err, ModelError::Shape { expected: 8, found: 4, .. }));

        let mut logits = vec![0.0; 8];
        logits[3] = f32::NAN;
        let err = decoder
            .decode(&DistributionParams::Logits(logits), no_fine, &mut rng)
            .unwrap_err();
        assert!(matches!(err, ModelError::NonFinite { .. }));
    }

    #[test]
    fn test_output_kind_mismatch() {
        let decoder = DistributionDecoder::new(
            DecodeMode::Categorical { bit_size: 3 },
            SamplingPolicy::Maximum,
        );
        let mut rng = create_rng(0);
        let params = DistributionParams::Gaussian {
            mean: 0.0,
            log_scale: 0.0,
        };
        assert!(matches!(
            decoder.decode(&params, no_fine, &mut rng),
            Err(ModelError::UnexpectedOutput { .. })
        ));
    }

    #[test]
    fn test_feedback_reencoding() {
        assert_eq!(Decoded::Code(7).feedback(4, true), StepInput::Class(7));
        assert_eq!(Decoded::Value(1.0).feedback(4, true), StepInput::Class(15));
        assert_eq!(Decoded::Code(15).feedback(4, false), StepInput::Scalar(1.0));
        assert_eq!(Decoded::Value(-0.5).feedback(4, false), StepInput::Scalar(-0.5));
    }
}

//! Decode mode selection and sampling policies.

use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, MAX_BIT_SIZE};
use crate::error::{ConfigError, ErrorCode, ValidationError};

/// How model outputs are turned into samples.
///
/// Resolved once from [`ModelConfig`]; the flag combination that has no
/// meaning (`gaussian` together with `dual_softmax`) cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// One softmax over `2^bit_size` classes.
    Categorical {
        /// Code width in bits.
        bit_size: u32,
    },
    /// Coarse (high bits) and fine (low bits) softmax heads.
    DualSoftmax {
        /// Width of the coarse half in bits.
        coarse_bits: u32,
        /// Width of the fine half in bits.
        fine_bits: u32,
    },
    /// Continuous `(mean, log_scale)` output.
    Gaussian {
        /// Code width used when re-quantizing for categorical input.
        bit_size: u32,
    },
}

impl DecodeMode {
    /// Resolves the mode from the model flags.
    pub fn from_config(config: &ModelConfig) -> Result<Self, ValidationError> {
        if config.bit_size == 0 || config.bit_size > MAX_BIT_SIZE {
            return Err(ValidationError::with_path(
                ErrorCode::InvalidBitSize,
                format!(
                    "bit_size must be in 1..={}, got {}",
                    MAX_BIT_SIZE, config.bit_size
                ),
                "model.bit_size",
            ));
        }

        match (config.gaussian, config.dual_softmax) {
            (true, true) => Err(ValidationError::with_path(
                ErrorCode::ContradictoryDecodeMode,
                "gaussian and dual_softmax cannot both be enabled",
                "model",
            )),
            (true, false) => Ok(DecodeMode::Gaussian {
                bit_size: config.bit_size,
            }),
            (false, true) => {
                if config.bit_size % 2 != 0 {
                    return Err(ValidationError::with_path(
                        ErrorCode::OddDualSoftmaxBits,
                        format!(
                            "dual_softmax requires an even bit_size, got {}",
                            config.bit_size
                        ),
                        "model.bit_size",
                    ));
                }
                let half = config.bit_size / 2;
                Ok(DecodeMode::DualSoftmax {
                    coarse_bits: half,
                    fine_bits: half,
                })
            }
            (false, false) => Ok(DecodeMode::Categorical {
                bit_size: config.bit_size,
            }),
        }
    }

    /// Full code width in bits.
    pub fn bit_size(&self) -> u32 {
        match *self {
            DecodeMode::Categorical { bit_size } | DecodeMode::Gaussian { bit_size } => bit_size,
            DecodeMode::DualSoftmax {
                coarse_bits,
                fine_bits,
            } => coarse_bits + fine_bits,
        }
    }

    /// Width of the primary output head.
    ///
    /// Class count for categorical heads, the coarse class count for dual
    /// softmax, and 2 (`mean`, `log_scale`) for Gaussian output.
    pub fn output_size(&self) -> usize {
        match *self {
            DecodeMode::Categorical { bit_size } => 1usize << bit_size,
            DecodeMode::DualSoftmax { coarse_bits, .. } => 1usize << coarse_bits,
            DecodeMode::Gaussian { .. } => 2,
        }
    }

    /// Width of the fine head, if this mode has one.
    pub fn fine_size(&self) -> Option<usize> {
        match *self {
            DecodeMode::DualSoftmax { fine_bits, .. } => Some(1usize << fine_bits),
            _ => None,
        }
    }
}

/// How a sample is picked from a decoded distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingPolicy {
    /// Draw from the distribution.
    Random,
    /// Take the most probable value; never consults an RNG.
    Maximum,
}

impl SamplingPolicy {
    /// Every declared policy.
    pub const ALL: [SamplingPolicy; 2] = [SamplingPolicy::Random, SamplingPolicy::Maximum];

    /// Returns the policy name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingPolicy::Random => "random",
            SamplingPolicy::Maximum => "maximum",
        }
    }

    /// Whether this policy consumes random numbers.
    pub fn is_stochastic(&self) -> bool {
        matches!(self, SamplingPolicy::Random)
    }
}

impl std::fmt::Display for SamplingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SamplingPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SamplingPolicy::ALL
            .into_iter()
            .find(|policy| policy.as_str() == s)
            .ok_or_else(|| {
                ValidationError::new(
                    ErrorCode::UnknownSamplingPolicy,
                    format!("unknown sampling policy '{}' (expected random or maximum)", s),
                )
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(gaussian: bool, dual_softmax: bool, bit_size: u32) -> ModelConfig {
        ModelConfig {
            dual_softmax,
            bit_size,
            gaussian,
            input_categorical: false,
            hidden_size: 16,
            local_size: 0,
            conditioning_size: 8,
            embedding_size: 8,
            linear_hidden_size: 16,
            local_scale: 1,
            local_layer_num: 1,
            weight_initializer: None,
        }
    }

    #[test]
    fn test_mode_resolution() {
        assert_eq!(
            DecodeMode::from_config(&model(false, false, 10)).unwrap(),
            DecodeMode::Categorical { bit_size: 10 }
        );
        assert_eq!(
            DecodeMode::from_config(&model(true, false, 10)).unwrap(),
            DecodeMode::Gaussian { bit_size: 10 }
        );
        assert_eq!(
            DecodeMode::from_config(&model(false, true, 10)).unwrap(),
            DecodeMode::DualSoftmax {
                coarse_bits: 5,
                fine_bits: 5
            }
        );
    }

    #[test]
    fn test_contradictory_flags_rejected() {
        let err = DecodeMode::from_config(&model(true, true, 10)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ContradictoryDecodeMode);
    }

    #[test]
    fn test_bit_size_limits() {
        let err = DecodeMode::from_config(&model(false, false, 0)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidBitSize);
        let err = DecodeMode::from_config(&model(false, false, 17)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidBitSize);
        let err = DecodeMode::from_config(&model(false, true, 9)).unwrap_err();
        assert_eq!(err.code, ErrorCode::OddDualSoftmaxBits);
    }

    #[test]
    fn test_output_sizes() {
        let dual = DecodeMode::DualSoftmax {
            coarse_bits: 4,
            fine_bits: 4,
        };
        assert_eq!(dual.bit_size(), 8);
        assert_eq!(dual.output_size(), 16);
        assert_eq!(dual.fine_size(), Some(16));
        assert_eq!(DecodeMode::Gaussian { bit_size: 8 }.output_size(), 2);
        assert_eq!(DecodeMode::Categorical { bit_size: 8 }.output_size(), 256);
        assert_eq!(DecodeMode::Categorical { bit_size: 8 }.fine_size(), None);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("random".parse::<SamplingPolicy>().unwrap(), SamplingPolicy::Random);
        assert_eq!("maximum".parse::<SamplingPolicy>().unwrap(), SamplingPolicy::Maximum);
        let err = "mix".parse::<SamplingPolicy>().unwrap_err();
        assert_eq!(err.error_code(), Some(ErrorCode::UnknownSamplingPolicy));
    }

    #[test]
    fn test_policy_serde_names() {
        let json = serde_json::to_string(&SamplingPolicy::ALL).unwrap();
        assert_eq!(json, r#"["random","maximum"]"#);
    }
}
